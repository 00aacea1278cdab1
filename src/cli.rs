//! Command-line surface
//!
//! Every flag is an override on top of the file/environment configuration;
//! secrets are taken from env-backed args so they never appear in shell
//! history.

use std::path::PathBuf;

use clap::Parser;

use crate::config::Config;

/// Export all Checkmarx One vulnerability results to xlsx and csv
#[derive(Parser, Debug)]
#[command(
    name = "cxone-export",
    version,
    about = "Export the full vulnerability history of a Checkmarx One tenant",
    long_about = "Walks every project, scan and result visible to the service \
                  account and writes one row per finding to a timestamped \
                  .xlsx and .csv pair in the output directory."
)]
pub struct Cli {
    /// Tenant name (authentication realm)
    #[arg(long, env = "CXONE__TENANT")]
    pub tenant: Option<String>,

    /// OAuth client id
    #[arg(long, env = "CXONE__CLIENT_ID")]
    pub client_id: Option<String>,

    /// OAuth client secret
    #[arg(long, env = "CXONE__CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,

    /// AST API base URL (e.g. https://eu.ast.checkmarx.net)
    #[arg(long, env = "CXONE__API_BASE_URL")]
    pub api_base_url: Option<String>,

    /// IAM base URL (e.g. https://eu.iam.checkmarx.net)
    #[arg(long, env = "CXONE__IAM_BASE_URL")]
    pub iam_base_url: Option<String>,

    /// Pagination page size
    #[arg(long)]
    pub page_size: Option<u32>,

    /// Output file name prefix
    #[arg(long)]
    pub output_prefix: Option<String>,

    /// Directory the report files are written to
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Overlay the provided flags onto a loaded configuration.
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(v) = &self.tenant {
            config.tenant = v.clone();
        }
        if let Some(v) = &self.client_id {
            config.client_id = v.clone();
        }
        if let Some(v) = &self.client_secret {
            config.client_secret = v.clone();
        }
        if let Some(v) = &self.api_base_url {
            config.api_base_url = v.clone();
        }
        if let Some(v) = &self.iam_base_url {
            config.iam_base_url = v.clone();
        }
        if let Some(v) = self.page_size {
            config.page_size = v;
        }
        if let Some(v) = &self.output_prefix {
            config.output.prefix = v.clone();
        }
        if let Some(v) = &self.output_dir {
            config.output.directory = v.clone();
        }
    }
}
