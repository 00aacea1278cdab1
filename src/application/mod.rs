//! Application services: traversal orchestration and error types

pub mod collector;
pub mod errors;
