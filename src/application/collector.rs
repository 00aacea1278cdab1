//! Hierarchy walker: projects → scans → results
//!
//! Strictly sequential traversal in upstream listing order. A fresh token
//! is obtained before each project so long runs never hold an expired one.
//! Any fatal error aborts the run and discards everything collected so far;
//! export happens only after a complete traversal.

use crate::application::errors::ExportError;
use crate::domain::{Finding, FindingRow, Project, Scan};
use crate::infrastructure::api_client::AstApiClient;

/// Collect one denormalized row per vulnerability finding across the whole
/// tenant.
pub async fn collect_all_vulnerabilities(
    client: &AstApiClient,
) -> Result<Vec<FindingRow>, ExportError> {
    let token = client.obtain_token().await?;
    let projects = client.list_projects(&token).await?;
    tracing::info!(count = projects.len(), "projects found");

    let mut rows = Vec::new();

    for item in &projects {
        let project = Project::from_item(item);

        // Fresh token per project; see module docs.
        let token = client.obtain_token().await?;
        let scans = client.list_scans_for_project(&token, &project.id).await?;
        tracing::info!(
            project = %project.name,
            project_id = %project.id,
            scans = scans.len(),
            "scans listed"
        );

        for scan_item in &scans {
            let scan = Scan::from_item(scan_item);
            let results = client
                .get_results_for_scan(&token, &project.id, &scan.id)
                .await?;

            for result in &results {
                rows.push(FindingRow::new(&project, &scan, &Finding::from_item(result)));
            }
        }
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, ResultsRetryConfig, RetryConfig};
    use mockito::{Matcher, Server, ServerGuard};
    use serde_json::json;

    fn test_client(server: &ServerGuard) -> AstApiClient {
        let config = Config {
            tenant: "acme".to_string(),
            client_id: "svc-export".to_string(),
            client_secret: "secret".to_string(),
            api_base_url: server.url(),
            iam_base_url: server.url(),
            page_size: 2,
            retry: RetryConfig {
                max_attempts: 2,
                initial_delay_ms: 1,
                max_delay_ms: 2,
                backoff_multiplier: 2.0,
            },
            results_retry: ResultsRetryConfig {
                fixed_delay_ms: 1,
                max_attempts_per_offset: 3,
            },
            ..Config::default()
        };
        AstApiClient::new(&config).unwrap()
    }

    async fn mock_token(server: &mut ServerGuard, hits: usize) -> mockito::Mock {
        server
            .mock("POST", "/auth/realms/acme/protocol/openid-connect/token")
            .with_status(200)
            .with_body(json!({ "access_token": "tok" }).to_string())
            .expect(hits)
            .create_async()
            .await
    }

    fn with_offset(pairs: Vec<(&str, &str)>, offset: u64) -> Matcher {
        let mut matchers: Vec<Matcher> = pairs
            .into_iter()
            .map(|(k, v)| Matcher::UrlEncoded(k.into(), v.into()))
            .collect();
        matchers.push(Matcher::UrlEncoded("offset".into(), offset.to_string()));
        Matcher::AllOf(matchers)
    }

    #[tokio::test]
    async fn full_traversal_builds_denormalized_rows() {
        let mut server = Server::new_async().await;

        // One token for the project listing, one per project.
        let token = mock_token(&mut server, 2).await;

        let _projects_p0 = server
            .mock("GET", "/api/projects")
            .match_query(with_offset(vec![], 0))
            .with_body(json!({ "projects": [{ "id": "1", "name": "Alpha" }] }).to_string())
            .create_async()
            .await;
        let _projects_p1 = server
            .mock("GET", "/api/projects")
            .match_query(with_offset(vec![], 2))
            .with_body(json!({ "projects": [] }).to_string())
            .create_async()
            .await;

        let _scans_p0 = server
            .mock("GET", "/api/scans")
            .match_query(with_offset(vec![("project-id", "1")], 0))
            .with_body(
                json!({
                    "scans": [{ "id": "100", "type": "sast", "createdAt": "2024-01-01" }]
                })
                .to_string(),
            )
            .create_async()
            .await;
        let _scans_p1 = server
            .mock("GET", "/api/scans")
            .match_query(with_offset(vec![("project-id", "1")], 2))
            .with_body(json!({ "scans": [] }).to_string())
            .create_async()
            .await;

        let _results_p0 = server
            .mock("GET", "/api/results")
            .match_query(with_offset(vec![("project-id", "1"), ("scan-id", "100")], 0))
            .with_body(
                json!({
                    "results": [
                        {
                            "id": "501",
                            "severity": "HIGH",
                            "type": "SQL_Injection",
                            "firstFoundAt": "2024-01-02",
                            "foundAt": "2024-01-02"
                        },
                        {
                            "id": "502",
                            "severity": "LOW",
                            "type": "XSS",
                            "firstFoundAt": "2024-01-03",
                            "updatedAt": "2024-01-03"
                        }
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;
        let _results_p1 = server
            .mock("GET", "/api/results")
            .match_query(with_offset(vec![("project-id", "1"), ("scan-id", "100")], 2))
            .with_body(json!({ "results": [] }).to_string())
            .create_async()
            .await;

        let client = test_client(&server);
        let rows = collect_all_vulnerabilities(&client).await.unwrap();

        token.assert_async().await;
        assert_eq!(rows.len(), 2);

        assert_eq!(rows[0].project_name, "Alpha");
        assert_eq!(rows[0].project_id, "1");
        assert_eq!(rows[0].scan_id, "100");
        assert_eq!(rows[0].scan_type, "sast");
        assert_eq!(rows[0].severity, "HIGH");
        assert_eq!(rows[0].result_id, "501");
        assert_eq!(rows[0].last_found_at, "2024-01-02");
        assert_eq!(rows[0].scan_date, "2024-01-01");

        // Result 502 has no foundAt/lastFoundAt: updatedAt wins.
        assert_eq!(rows[1].result_id, "502");
        assert_eq!(rows[1].severity, "LOW");
        assert_eq!(rows[1].last_found_at, "2024-01-03");
    }

    #[tokio::test]
    async fn unauthorized_project_is_skipped_and_rest_processed() {
        let mut server = Server::new_async().await;

        let _token = mock_token(&mut server, 3).await;

        let _projects_p0 = server
            .mock("GET", "/api/projects")
            .match_query(with_offset(vec![], 0))
            .with_body(
                json!({
                    "projects": [
                        { "id": "1", "name": "Locked" },
                        { "id": "2", "name": "Open" }
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;
        let _projects_p1 = server
            .mock("GET", "/api/projects")
            .match_query(with_offset(vec![], 2))
            .with_body(json!({ "projects": [] }).to_string())
            .create_async()
            .await;

        // Project 1: service account has no access.
        let _scans_locked = server
            .mock("GET", "/api/scans")
            .match_query(Matcher::UrlEncoded("project-id".into(), "1".into()))
            .with_status(401)
            .create_async()
            .await;

        let _scans_open_p0 = server
            .mock("GET", "/api/scans")
            .match_query(with_offset(vec![("project-id", "2")], 0))
            .with_body(
                json!({
                    "scans": [{ "id": "200", "type": "sca", "createdAt": "2024-02-01" }]
                })
                .to_string(),
            )
            .create_async()
            .await;
        let _scans_open_p1 = server
            .mock("GET", "/api/scans")
            .match_query(with_offset(vec![("project-id", "2")], 2))
            .with_body(json!({ "scans": [] }).to_string())
            .create_async()
            .await;

        let _results_p0 = server
            .mock("GET", "/api/results")
            .match_query(with_offset(vec![("project-id", "2"), ("scan-id", "200")], 0))
            .with_body(
                json!({
                    "results": [{ "id": "601", "severity": "MEDIUM", "type": "CVE" }]
                })
                .to_string(),
            )
            .create_async()
            .await;
        let _results_p1 = server
            .mock("GET", "/api/results")
            .match_query(with_offset(vec![("project-id", "2"), ("scan-id", "200")], 2))
            .with_body(json!({ "results": [] }).to_string())
            .create_async()
            .await;

        let client = test_client(&server);
        let rows = collect_all_vulnerabilities(&client).await.unwrap();

        // Only project 2 contributes rows; project 1 yields zero scans.
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].project_name, "Open");
        assert_eq!(rows[0].result_id, "601");
    }

    #[tokio::test]
    async fn project_with_zero_scans_produces_zero_rows() {
        let mut server = Server::new_async().await;

        let _token = mock_token(&mut server, 2).await;

        let _projects_p0 = server
            .mock("GET", "/api/projects")
            .match_query(with_offset(vec![], 0))
            .with_body(json!({ "projects": [{ "id": "1", "name": "Idle" }] }).to_string())
            .create_async()
            .await;
        let _projects_p1 = server
            .mock("GET", "/api/projects")
            .match_query(with_offset(vec![], 2))
            .with_body(json!({ "projects": [] }).to_string())
            .create_async()
            .await;

        let _scans_empty = server
            .mock("GET", "/api/scans")
            .match_query(with_offset(vec![("project-id", "1")], 0))
            .with_body(json!({ "scans": [] }).to_string())
            .create_async()
            .await;

        let client = test_client(&server);
        let rows = collect_all_vulnerabilities(&client).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn empty_tenant_produces_no_rows() {
        let mut server = Server::new_async().await;

        let _token = mock_token(&mut server, 1).await;
        let _projects = server
            .mock("GET", "/api/projects")
            .match_query(with_offset(vec![], 0))
            .with_body(json!({ "projects": [] }).to_string())
            .create_async()
            .await;

        let client = test_client(&server);
        let rows = collect_all_vulnerabilities(&client).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn fatal_error_aborts_the_run() {
        let mut server = Server::new_async().await;

        let _token = mock_token(&mut server, 2).await;

        let _projects_p0 = server
            .mock("GET", "/api/projects")
            .match_query(with_offset(vec![], 0))
            .with_body(json!({ "projects": [{ "id": "1", "name": "Alpha" }] }).to_string())
            .create_async()
            .await;
        let _projects_p1 = server
            .mock("GET", "/api/projects")
            .match_query(with_offset(vec![], 2))
            .with_body(json!({ "projects": [] }).to_string())
            .create_async()
            .await;

        // 500 is transient at the transport layer, but once its bounded
        // retries are exhausted it is fatal for the run.
        let _scans_broken = server
            .mock("GET", "/api/scans")
            .match_query(Matcher::UrlEncoded("project-id".into(), "1".into()))
            .with_status(500)
            .create_async()
            .await;

        let client = test_client(&server);
        let err = collect_all_vulnerabilities(&client).await.unwrap_err();
        assert_eq!(err.status(), Some(500));
    }
}
