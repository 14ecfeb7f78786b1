//! Toolbench core library.
//!
//! Domain types and strategies shared by the API server and the client:
//! work items and batches, the image codecs, the source compilers, result
//! envelopes and the client-side reconciliation store.

pub mod batch;
pub mod codec;
pub mod compiler;
pub mod envelope;
pub mod error;
pub mod naming;
pub mod reconcile;
pub mod strategy;
pub mod timing;
pub mod types;
pub mod work_item;
