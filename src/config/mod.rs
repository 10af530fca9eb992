//! Configuration subsystem.
//!
//! # Data Flow
//! ```text
//! TOML file → loader.rs (read + parse)
//!           → validation.rs (semantic checks, all errors collected)
//!           → schema.rs types injected into RateLimiter / TrustService
//! ```
//!
//! Configuration is read once at construction. Nothing in this crate
//! re-reads config per request; backend selection in particular is fixed
//! for the lifetime of the process.

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::AdmissionConfig;
