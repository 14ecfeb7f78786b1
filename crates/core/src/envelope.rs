//! Uniform per-item result records.
//!
//! [`ResultEnvelope::build`] is the single place strategy output is turned
//! into a result, so the naming rule applies to every strategy alike.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::codec::OutputFormat;
use crate::error::{CoreError, ItemError};
use crate::naming::output_file_name;
use crate::types::{ItemId, Sequence};

/// Normalized output of one successfully processed work item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEnvelope {
    pub identity: ItemId,
    pub output_name: String,
    /// Base64 on the wire.
    #[serde(with = "base64_bytes")]
    pub output_payload: Vec<u8>,
    pub output_size: u64,
    pub output_format: OutputFormat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<Sequence>,
    /// Time spent inside the strategy.
    #[serde(default)]
    pub elapsed_ms: f64,
}

impl ResultEnvelope {
    pub fn build(
        identity: impl Into<ItemId>,
        original_name: Option<&str>,
        output_format: OutputFormat,
        output_payload: Vec<u8>,
    ) -> Self {
        Self {
            identity: identity.into(),
            output_name: output_file_name(original_name, output_format),
            output_size: output_payload.len() as u64,
            output_payload,
            output_format,
            sequence: None,
            elapsed_ms: 0.0,
        }
    }

    pub fn with_sequence(mut self, sequence: Option<Sequence>) -> Self {
        self.sequence = sequence;
        self
    }

    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed_ms = elapsed.as_secs_f64() * 1000.0;
        self
    }
}

/// Explicit failure marker for one work item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemFailure {
    pub identity: ItemId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<Sequence>,
    pub error: ItemError,
}

/// Result of one item in a batch: an envelope or a failure marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ItemOutcome {
    Ok(ResultEnvelope),
    Failed(ItemFailure),
}

impl ItemOutcome {
    pub fn failed(identity: impl Into<ItemId>, sequence: Option<Sequence>, err: &CoreError) -> Self {
        Self::Failed(ItemFailure {
            identity: identity.into(),
            sequence,
            error: err.into(),
        })
    }

    pub fn identity(&self) -> &str {
        match self {
            Self::Ok(envelope) => &envelope.identity,
            Self::Failed(failure) => &failure.identity,
        }
    }

    pub fn sequence(&self) -> Option<Sequence> {
        match self {
            Self::Ok(envelope) => envelope.sequence,
            Self::Failed(failure) => failure.sequence,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    pub fn envelope(&self) -> Option<&ResultEnvelope> {
        match self {
            Self::Ok(envelope) => Some(envelope),
            Self::Failed(_) => None,
        }
    }
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(d)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}
