//! Checkmarx One AST API client
//!
//! One shared `reqwest::Client` (bounded connect and read timeouts) serves
//! the token exchange and all three listing endpoints. Pagination is the
//! uniform `limit`/`offset` contract; a page is fetched through the
//! transport retry policy and the loop terminates only on a truly empty
//! batch under the endpoint's response key.

use reqwest::header::ACCEPT;
use serde_json::Value;

use crate::application::errors::ExportError;
use crate::config::Config;
use crate::infrastructure::resilience::retry_with_backoff;

/// Versioned JSON media type required by the AST API.
pub const ACCEPT_JSON_V1: &str = "application/json;v=1.0";

/// Short-lived credential obtained from the client-credentials exchange.
///
/// Deliberately opaque; the raw token never appears in logs or Debug output.
#[derive(Clone)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BearerToken(***)")
    }
}

/// Client for the AST REST API and its IAM token endpoint.
pub struct AstApiClient {
    http: reqwest::Client,
    config: Config,
}

impl AstApiClient {
    pub fn new(config: &Config) -> Result<Self, ExportError> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.request_timeout())
            .user_agent(concat!("cxone-export/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            config: config.clone(),
        })
    }

    /// Exchange client credentials for a fresh bearer token.
    ///
    /// Called once before listing projects and again before each project so
    /// long traversals never run on an expired token. Any non-2xx response
    /// (after transport retries) is fatal.
    pub async fn obtain_token(&self) -> Result<BearerToken, ExportError> {
        retry_with_backoff(&self.config.retry, || self.request_token_once())
            .await
            .map_err(|e| match e {
                ExportError::Http { status, message } => ExportError::Auth { status, message },
                other => other,
            })
    }

    async fn request_token_once(&self) -> Result<BearerToken, ExportError> {
        let response = self
            .http
            .post(self.config.auth_url())
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ExportError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ExportError::UnexpectedBody(e.to_string()))?;
        let token = body
            .get("access_token")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ExportError::UnexpectedBody("token response missing access_token".to_string())
            })?;

        Ok(BearerToken(token.to_string()))
    }

    /// List every project visible to the service account.
    pub async fn list_projects(&self, token: &BearerToken) -> Result<Vec<Value>, ExportError> {
        self.fetch_all(token, &self.config.projects_url(), &[], "projects")
            .await
    }

    /// List a project's scans.
    ///
    /// A 401 here means the service account lacks access to this specific
    /// project; it is logged and treated as "no scans" so the run continues.
    pub async fn list_scans_for_project(
        &self,
        token: &BearerToken,
        project_id: &str,
    ) -> Result<Vec<Value>, ExportError> {
        let extra = [("project-id", project_id)];
        match self
            .fetch_all(token, &self.config.scans_url(), &extra, "scans")
            .await
        {
            Ok(scans) => Ok(scans),
            Err(ExportError::Http { status: 401, .. }) => {
                tracing::warn!(project_id, "no access to project, skipping");
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    /// Fetch all results of a scan.
    ///
    /// The API requires the project id even when scoped by scan. Connection
    /// faults and truncated bodies are retried at the *same* offset with a
    /// fixed delay, up to the configured per-offset cap.
    pub async fn get_results_for_scan(
        &self,
        token: &BearerToken,
        project_id: &str,
        scan_id: &str,
    ) -> Result<Vec<Value>, ExportError> {
        let url = self.config.results_url();
        let extra = [("project-id", project_id), ("scan-id", scan_id)];
        let retry = &self.config.results_retry;

        let mut acc = Vec::new();
        let mut offset: u64 = 0;

        loop {
            let mut attempts: u32 = 0;
            let page = loop {
                match retry_with_backoff(&self.config.retry, || {
                    self.get_page_once(token, &url, &extra, offset)
                })
                .await
                {
                    Ok(page) => break page,
                    Err(e) if is_transient_fetch_error(&e) => {
                        attempts += 1;
                        if attempts >= retry.max_attempts_per_offset {
                            return Err(ExportError::TransientRetriesExhausted {
                                attempts,
                                offset,
                            });
                        }
                        tracing::warn!(
                            scan_id,
                            offset,
                            attempt = attempts,
                            error = %e,
                            "retrying results page after transient fault"
                        );
                        tokio::time::sleep(retry.fixed_delay()).await;
                    }
                    Err(e) => return Err(e),
                }
            };

            let batch = items_under_key(&page, "results");
            if batch.is_empty() {
                break;
            }
            acc.extend(batch);
            offset += u64::from(self.config.page_size);
        }

        Ok(acc)
    }

    /// Fetch all pages of a named collection.
    ///
    /// Issues GETs with `limit`/`offset`, incrementing the offset by the
    /// page size, until a response yields an empty batch under `key`.
    /// Returns the concatenation of all batches in received order. The
    /// upstream contract is that an exhausted collection answers with an
    /// empty page; a short-but-nonempty page does not terminate the loop.
    async fn fetch_all(
        &self,
        token: &BearerToken,
        url: &str,
        extra: &[(&str, &str)],
        key: &str,
    ) -> Result<Vec<Value>, ExportError> {
        let mut acc = Vec::new();
        let mut offset: u64 = 0;

        loop {
            let page = retry_with_backoff(&self.config.retry, || {
                self.get_page_once(token, url, extra, offset)
            })
            .await?;

            let batch = items_under_key(&page, key);
            if batch.is_empty() {
                break;
            }
            acc.extend(batch);
            offset += u64::from(self.config.page_size);
        }

        Ok(acc)
    }

    /// Issue a single page request and parse the JSON body.
    async fn get_page_once(
        &self,
        token: &BearerToken,
        url: &str,
        extra: &[(&str, &str)],
        offset: u64,
    ) -> Result<Value, ExportError> {
        let mut request = self
            .http
            .get(url)
            .bearer_auth(token.secret())
            .header(ACCEPT, ACCEPT_JSON_V1)
            .query(&[
                ("limit", self.config.page_size.to_string()),
                ("offset", offset.to_string()),
            ]);
        for (k, v) in extra {
            request = request.query(&[(k, v)]);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ExportError::Http {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| ExportError::UnexpectedBody(e.to_string()))
    }
}

/// Extract the page's items from the named array key; a missing key is an
/// empty batch, matching the upstream "no more data" answer.
fn items_under_key(page: &Value, key: &str) -> Vec<Value> {
    page.get(key)
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

/// Connection-level faults and truncated/garbled bodies are the transient
/// class recovered by the results fetcher; HTTP statuses are not.
fn is_transient_fetch_error(error: &ExportError) -> bool {
    matches!(
        error,
        ExportError::Network(_) | ExportError::UnexpectedBody(_)
    )
}
