//! Structured batch envelope.
//!
//! A batch upload is a `manifest` part listing the items in order, plus one
//! file part per item. Items reference their payload by part name, so the
//! server never reconstructs the list from indexed field names.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{ItemId, Sequence};
use crate::work_item::{StrategyConfig, WorkItem};

/// Multipart field name carrying the JSON manifest.
pub const MANIFEST_FIELD: &str = "manifest";

/// Response header on archive downloads carrying the number of items
/// left out because they failed.
pub const FAILED_ITEMS_HEADER: &str = "x-failed-items";

/// Default cap on the number of items in one batch.
pub const DEFAULT_MAX_BATCH_ITEMS: usize = 64;

/// Ordered description of a batch, sent as the `manifest` part.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchManifest {
    #[serde(default)]
    pub items: Vec<ManifestItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestItem {
    pub id: ItemId,
    /// Name of the multipart part holding this item's payload.
    pub part: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<StrategyConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<Sequence>,
}

impl BatchManifest {
    pub fn parse(json: &str) -> Result<Self, CoreError> {
        serde_json::from_str(json)
            .map_err(|e| CoreError::MalformedBatch(format!("invalid manifest: {e}")))
    }
}

/// A file part received alongside the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedPart {
    pub file_name: Option<String>,
    pub bytes: Vec<u8>,
}

/// Ordered, identity-unique collection of work items.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    items: Vec<WorkItem>,
}

impl Batch {
    /// Build a batch, rejecting empty or duplicate identities.
    pub fn from_items(items: Vec<WorkItem>) -> Result<Self, CoreError> {
        let mut seen = HashSet::with_capacity(items.len());
        for item in &items {
            if item.identity.is_empty() {
                return Err(CoreError::MalformedBatch("item identity must not be empty".into()));
            }
            if !seen.insert(item.identity.as_str()) {
                return Err(CoreError::MalformedBatch(format!(
                    "duplicate identity '{}' in batch",
                    item.identity
                )));
            }
        }
        Ok(Self { items })
    }

    /// Join a manifest with the uploaded parts it references.
    ///
    /// Two items may reference the same part. Parts nobody references are
    /// ignored.
    pub fn assemble(
        manifest: BatchManifest,
        parts: &HashMap<String, UploadedPart>,
        max_items: usize,
    ) -> Result<Self, CoreError> {
        if manifest.items.len() > max_items {
            return Err(CoreError::MalformedBatch(format!(
                "batch has {} items, the limit is {max_items}",
                manifest.items.len()
            )));
        }

        let unreferenced = parts
            .keys()
            .filter(|name| !manifest.items.iter().any(|entry| &entry.part == *name))
            .count();
        if unreferenced > 0 {
            tracing::debug!(unreferenced, "Ignoring parts not referenced by the manifest");
        }

        let mut items = Vec::with_capacity(manifest.items.len());
        for entry in manifest.items {
            let part = parts.get(&entry.part).ok_or_else(|| {
                CoreError::MalformedBatch(format!(
                    "item '{}' references missing part '{}'",
                    entry.id, entry.part
                ))
            })?;

            items.push(WorkItem {
                identity: entry.id,
                name: part.file_name.clone(),
                payload: part.bytes.clone(),
                config: entry.config,
                sequence: entry.sequence,
            });
        }

        Self::from_items(items)
    }

    /// Describe this batch as a manifest plus `(part name, item)` pairs,
    /// ready to be sent as multipart.
    pub fn to_manifest(&self) -> (BatchManifest, Vec<(String, &WorkItem)>) {
        let mut manifest = BatchManifest::default();
        let mut parts = Vec::with_capacity(self.items.len());

        for (i, item) in self.items.iter().enumerate() {
            let part = format!("file-{i}");
            manifest.items.push(ManifestItem {
                id: item.identity.clone(),
                part: part.clone(),
                config: item.config.clone(),
                sequence: item.sequence,
            });
            parts.push((part, item));
        }

        (manifest, parts)
    }

    pub fn items(&self) -> &[WorkItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl IntoIterator for Batch {
    type Item = WorkItem;
    type IntoIter = std::vec::IntoIter<WorkItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn part(name: &str, bytes: &[u8]) -> (String, UploadedPart) {
        (
            name.to_string(),
            UploadedPart {
                file_name: Some(format!("{name}.png")),
                bytes: bytes.to_vec(),
            },
        )
    }

    fn entry(id: &str, part: &str) -> ManifestItem {
        ManifestItem {
            id: id.into(),
            part: part.into(),
            config: None,
            sequence: None,
        }
    }

    #[test]
    fn assembles_items_in_manifest_order() {
        let parts = HashMap::from([part("p1", b"one"), part("p2", b"two")]);
        let manifest = BatchManifest {
            items: vec![entry("b", "p2"), entry("a", "p1")],
        };

        let batch = Batch::assemble(manifest, &parts, 10).unwrap();
        let ids: Vec<_> = batch.items().iter().map(|i| i.identity.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(batch.items()[0].payload, b"two");
        assert_eq!(batch.items()[0].name.as_deref(), Some("p2.png"));
    }

    #[test]
    fn missing_part_is_malformed() {
        let manifest = BatchManifest {
            items: vec![entry("a", "nope")],
        };
        assert_matches!(
            Batch::assemble(manifest, &HashMap::new(), 10),
            Err(CoreError::MalformedBatch(_))
        );
    }

    #[test]
    fn duplicate_identity_rejects_the_batch() {
        let parts = HashMap::from([part("p1", b"one")]);
        let manifest = BatchManifest {
            items: vec![entry("a", "p1"), entry("a", "p1")],
        };
        assert_matches!(
            Batch::assemble(manifest, &parts, 10),
            Err(CoreError::MalformedBatch(msg)) if msg.contains("duplicate")
        );
    }

    #[test]
    fn empty_identity_is_malformed() {
        assert_matches!(
            Batch::from_items(vec![WorkItem::new("", vec![1])]),
            Err(CoreError::MalformedBatch(_))
        );
    }

    #[test]
    fn too_many_items_is_malformed() {
        let parts = HashMap::from([part("p1", b"one")]);
        let manifest = BatchManifest {
            items: vec![entry("a", "p1"), entry("b", "p1"), entry("c", "p1")],
        };
        assert_matches!(
            Batch::assemble(manifest, &parts, 2),
            Err(CoreError::MalformedBatch(_))
        );
    }

    #[test]
    fn shared_part_is_allowed() {
        let parts = HashMap::from([part("p1", b"one")]);
        let manifest = BatchManifest {
            items: vec![entry("a", "p1"), entry("b", "p1")],
        };
        assert_eq!(Batch::assemble(manifest, &parts, 10).unwrap().len(), 2);
    }

    #[test]
    fn manifest_parse_errors_are_malformed() {
        assert_matches!(BatchManifest::parse("{not json"), Err(CoreError::MalformedBatch(_)));
        assert!(BatchManifest::parse("{}").unwrap().items.is_empty());
    }

    #[test]
    fn to_manifest_round_trips_through_assemble() {
        let batch = Batch::from_items(vec![
            WorkItem::new("x", vec![1, 2]).with_sequence(3),
            WorkItem::new("y", vec![9]).with_name("y.jpg"),
        ])
        .unwrap();

        let (manifest, parts) = batch.to_manifest();
        let uploaded: HashMap<_, _> = parts
            .into_iter()
            .map(|(name, item)| {
                (
                    name,
                    UploadedPart {
                        file_name: item.name.clone(),
                        bytes: item.payload.clone(),
                    },
                )
            })
            .collect();

        let rebuilt = Batch::assemble(manifest, &uploaded, 10).unwrap();
        assert_eq!(rebuilt, batch);
    }
}
