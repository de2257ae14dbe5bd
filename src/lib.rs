//! Orchestration core for turning draft real-estate listings into
//! publishable assets: lifecycle state machine with publish guards, the
//! media upload pipeline, document verification, completeness scoring, and
//! similarity recommendations.
//!
//! External systems (persistence, object storage, identity) are consumed
//! through the async ports in [`listings::ports`]; everything above the
//! ports is transport-free and runs unchanged against the in-memory
//! adapters used by the tests and the offline demo.

pub mod config;
pub mod error;
pub mod listings;
pub mod telemetry;
