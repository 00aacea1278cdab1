//! Infrastructure: HTTP client, retry policy, and file export

pub mod api_client;
pub mod export;
pub mod resilience;
