//! Batch execution engine.
//!
//! Holds the dispatcher that fans a batch out to the image codecs and
//! gathers one outcome per item.

pub mod dispatcher;
