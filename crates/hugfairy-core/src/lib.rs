//! hugfairy-core - Core library for the hugfairy reply bot
//!
//! This crate provides the pieces the CLI wires together:
//!
//! - **xrpc**: typed AT Protocol client (auth, search, record creation)
//! - **session**: exported session persistence and lifecycle hooks
//! - **agent**: authenticated client handle (resume-or-login)
//! - **cursor**: processed-up-to-here marker persistence
//! - **template**: reply templates and mention facet generation
//! - **search**: paginated hashtag search with a stop marker
//! - **deliver**: the per-run delivery driver

pub mod agent;
pub mod cursor;
pub mod deliver;
pub mod error;
pub mod search;
pub mod session;
pub mod template;
pub mod xrpc;

// Re-export commonly used types
pub use agent::Agent;
pub use error::{Error, Result};
pub use session::{Session, SessionEvent, SessionStore};
