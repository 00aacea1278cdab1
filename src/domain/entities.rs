//! Typed records for the project → scan → result hierarchy
//!
//! The upstream API is loosely schemaed: several logical attributes can live
//! under different JSON keys depending on scan engine and API version. Each
//! record is parsed through an ordered candidate-field list; an attribute
//! whose candidates are all absent becomes the explicit [`UNKNOWN`] marker
//! instead of a propagated null.

use serde::Serialize;
use serde_json::Value;

/// Marker for attributes the API did not supply.
pub const UNKNOWN: &str = "<unknown>";

/// Resolve the first present string field among `candidates`, in order.
fn first_string(item: &Value, candidates: &[&str]) -> Option<String> {
    candidates
        .iter()
        .find_map(|key| item.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

fn first_string_or_unknown(item: &Value, candidates: &[&str]) -> String {
    first_string(item, candidates).unwrap_or_else(|| UNKNOWN.to_string())
}

/// A project as listed by the projects endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub id: String,
    pub name: String,
}

impl Project {
    pub fn from_item(item: &Value) -> Self {
        Self {
            id: first_string_or_unknown(item, &["id"]),
            name: first_string_or_unknown(item, &["name"]),
        }
    }
}

/// One scan execution belonging to a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scan {
    pub id: String,
    pub scan_type: String,
    /// Creation timestamp; candidate keys `createdAt`, then `scanDate`.
    pub scan_date: String,
}

impl Scan {
    pub fn from_item(item: &Value) -> Self {
        Self {
            id: first_string_or_unknown(item, &["id"]),
            scan_type: first_string_or_unknown(item, &["type"]),
            scan_date: first_string_or_unknown(item, &["createdAt", "scanDate"]),
        }
    }
}

/// One vulnerability finding tied to a specific scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub id: String,
    pub severity: String,
    pub kind: String,
    pub first_found_at: String,
    /// Last-seen timestamp; candidate keys `foundAt`, `lastFoundAt`,
    /// `updatedAt`, in that priority order.
    pub last_found_at: String,
}

impl Finding {
    pub fn from_item(item: &Value) -> Self {
        Self {
            id: first_string_or_unknown(item, &["id"]),
            severity: first_string_or_unknown(item, &["severity"]),
            kind: first_string_or_unknown(item, &["type"]),
            first_found_at: first_string_or_unknown(item, &["firstFoundAt"]),
            last_found_at: first_string_or_unknown(item, &["foundAt", "lastFoundAt", "updatedAt"]),
        }
    }
}

/// Denormalized export row: one finding with its inherited project and scan
/// attributes. Immutable once built; the full set is materialized in memory
/// before export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FindingRow {
    pub project_name: String,
    pub project_id: String,
    pub scan_id: String,
    pub scan_type: String,
    pub severity: String,
    pub vulnerability_type: String,
    pub result_id: String,
    pub first_found_at: String,
    pub last_found_at: String,
    pub scan_date: String,
}

impl FindingRow {
    /// Column headers, in the fixed export order.
    pub const HEADERS: [&'static str; 10] = [
        "Project Name",
        "Project Id",
        "Scan Id",
        "Scan Type",
        "Severity",
        "Vulnerability Type",
        "Result Id",
        "First Found At",
        "Last Found At",
        "Scan Date",
    ];

    pub fn new(project: &Project, scan: &Scan, finding: &Finding) -> Self {
        Self {
            project_name: project.name.clone(),
            project_id: project.id.clone(),
            scan_id: scan.id.clone(),
            scan_type: scan.scan_type.clone(),
            severity: finding.severity.clone(),
            vulnerability_type: finding.kind.clone(),
            result_id: finding.id.clone(),
            first_found_at: finding.first_found_at.clone(),
            last_found_at: finding.last_found_at.clone(),
            scan_date: scan.scan_date.clone(),
        }
    }

    /// Cell values in the same order as [`Self::HEADERS`].
    pub fn values(&self) -> [&str; 10] {
        [
            &self.project_name,
            &self.project_id,
            &self.scan_id,
            &self.scan_type,
            &self.severity,
            &self.vulnerability_type,
            &self.result_id,
            &self.first_found_at,
            &self.last_found_at,
            &self.scan_date,
        ]
    }
}
