//! cxone-export - Batch exporter for Checkmarx One vulnerability results
//!
//! Walks a tenant's project → scan → result hierarchy over the AST REST API
//! and flattens everything into one spreadsheet and one CSV file.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use application::collector::collect_all_vulnerabilities;
pub use application::errors::ExportError;
pub use config::Config;
pub use infrastructure::api_client::AstApiClient;
pub use infrastructure::export::export_report;
