//! HTTP client for the toolbench server.
//!
//! [`ApiClient`](client::ApiClient) wraps the REST endpoints;
//! [`CompressSession`](session::CompressSession) keeps a
//! [`ReconciliationStore`](toolbench_core::reconcile::ReconciliationStore)
//! in sync with batch submissions.

pub mod client;
pub mod error;
pub mod session;

pub use client::ApiClient;
pub use error::ClientError;
pub use session::CompressSession;
