//! Core domain models

pub mod entities;

pub use entities::{Finding, FindingRow, Project, Scan, UNKNOWN};
