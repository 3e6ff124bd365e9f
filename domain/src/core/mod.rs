//! Core domain concepts shared across all subdomains.
//!
//! - [`error::DomainError`]: domain-level errors
//! - [`string`]: display helpers for titles and previews

pub mod error;
pub mod string;
