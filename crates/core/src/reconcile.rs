//! Client-side reconciliation of asynchronous batch results.
//!
//! The store keeps the user's items in submission order and merges result
//! batches into them strictly by identity. Results may arrive partially, out
//! of order, for items that were since re-configured, or after the list was
//! cleared; none of those cases is an error.
//!
//! Every submission of an identity gets the next sequence number. An
//! outcome carrying a sequence older than the item's latest submission is
//! stale and ignored, so a slow response to an old configuration can never
//! overwrite the result of a newer one. Outcomes without a sequence fall
//! back to last-arrival-wins.

use serde::Serialize;

use crate::envelope::{ItemOutcome, ResultEnvelope};
use crate::error::{CoreError, ItemError};
use crate::types::{ItemId, Sequence};
use crate::work_item::{ConfigPatch, StrategyConfig, WorkItem};

/// Lifecycle of a tracked item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Pending,
    Ready,
    Failed,
}

/// Item the user wants to add.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub identity: ItemId,
    pub name: String,
    pub payload: Vec<u8>,
    pub config: StrategyConfig,
}

impl NewItem {
    /// New item with a freshly generated identity.
    pub fn new(name: impl Into<String>, payload: Vec<u8>, config: StrategyConfig) -> Self {
        Self {
            identity: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            payload,
            config,
        }
    }

    pub fn with_identity(mut self, identity: impl Into<ItemId>) -> Self {
        self.identity = identity.into();
        self
    }
}

#[derive(Debug, Clone)]
pub struct TrackedItem {
    pub identity: ItemId,
    pub name: String,
    pub payload: Vec<u8>,
    pub original_size: u64,
    pub config: StrategyConfig,
    pub status: ItemStatus,
    pub result: Option<ResultEnvelope>,
    pub error: Option<ItemError>,
    /// Sequence of the latest submission for this identity.
    pub submitted_seq: Sequence,
}

impl TrackedItem {
    /// Work item for the latest submission of this item.
    pub fn to_work_item(&self) -> WorkItem {
        WorkItem::new(self.identity.clone(), self.payload.clone())
            .with_name(self.name.clone())
            .with_config(self.config.clone())
            .with_sequence(self.submitted_seq)
    }

    /// Output size, or zero while no envelope is attached.
    pub fn output_size(&self) -> u64 {
        self.result.as_ref().map_or(0, |r| r.output_size)
    }

    /// Size reduction of this item in whole percent.
    pub fn reduction_percent(&self) -> Option<i64> {
        let result = self.result.as_ref()?;
        reduction_percent(self.original_size, result.output_size)
    }
}

/// What a [`ReconciliationStore::merge_results`] call did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub applied: usize,
    pub stale: usize,
    pub unknown: usize,
}

/// Ordered, identity-keyed list of the user's items.
#[derive(Debug, Clone, Default)]
pub struct ReconciliationStore {
    items: Vec<TrackedItem>,
}

impl ReconciliationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `new_items` as pending and return the work to submit.
    ///
    /// Identities must not already be tracked.
    pub fn add_all(
        &mut self,
        new_items: impl IntoIterator<Item = NewItem>,
    ) -> Result<Vec<WorkItem>, CoreError> {
        let new_items: Vec<NewItem> = new_items.into_iter().collect();
        for (i, item) in new_items.iter().enumerate() {
            let repeated = new_items[..i].iter().any(|n| n.identity == item.identity);
            if repeated || self.position(&item.identity).is_some() {
                return Err(CoreError::Validation(format!(
                    "identity '{}' is already tracked",
                    item.identity
                )));
            }
        }

        let mut work = Vec::with_capacity(new_items.len());
        for item in new_items {
            let tracked = TrackedItem {
                original_size: item.payload.len() as u64,
                identity: item.identity,
                name: item.name,
                payload: item.payload,
                config: item.config,
                status: ItemStatus::Pending,
                result: None,
                error: None,
                submitted_seq: 1,
            };
            work.push(tracked.to_work_item());
            self.items.push(tracked);
        }
        Ok(work)
    }

    /// Merge a result batch by identity.
    pub fn merge_results(&mut self, outcomes: impl IntoIterator<Item = ItemOutcome>) -> MergeReport {
        let mut report = MergeReport::default();

        for outcome in outcomes {
            let Some(item) = self.items.iter_mut().find(|i| i.identity == outcome.identity()) else {
                report.unknown += 1;
                continue;
            };

            if outcome.sequence().is_some_and(|seq| seq < item.submitted_seq) {
                tracing::debug!(
                    identity = %item.identity,
                    received = outcome.sequence(),
                    latest = item.submitted_seq,
                    "Ignoring stale result",
                );
                report.stale += 1;
                continue;
            }

            match outcome {
                ItemOutcome::Ok(envelope) => {
                    item.result = Some(envelope);
                    item.error = None;
                    item.status = ItemStatus::Ready;
                }
                ItemOutcome::Failed(failure) => {
                    item.result = None;
                    item.error = Some(failure.error);
                    item.status = ItemStatus::Failed;
                }
            }
            report.applied += 1;
        }

        report
    }

    /// Record a failure that never produced an outcome (e.g. the request
    /// itself failed). Returns `false` if unknown or stale.
    pub fn mark_failed(&mut self, identity: &str, sequence: Sequence, error: ItemError) -> bool {
        match self.items.iter_mut().find(|i| i.identity == identity) {
            Some(item) if sequence >= item.submitted_seq => {
                item.result = None;
                item.error = Some(error);
                item.status = ItemStatus::Failed;
                true
            }
            _ => false,
        }
    }

    /// Change one item's configuration and return the singleton work item
    /// the caller should re-submit. The store itself sends nothing.
    pub fn update_item_config(
        &mut self,
        identity: &str,
        patch: &ConfigPatch,
    ) -> Result<WorkItem, CoreError> {
        let item = self
            .items
            .iter_mut()
            .find(|i| i.identity == identity)
            .ok_or_else(|| CoreError::NotFound {
                entity: "TrackedItem",
                id: identity.to_string(),
            })?;

        item.config.apply(patch);
        item.submitted_seq += 1;
        item.status = ItemStatus::Pending;
        item.error = None;
        Ok(item.to_work_item())
    }

    /// Drop every tracked item. Results still in flight will be discarded
    /// on arrival.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn get(&self, identity: &str) -> Option<&TrackedItem> {
        self.items.iter().find(|i| i.identity == identity)
    }

    pub fn items(&self) -> &[TrackedItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn count(&self, status: ItemStatus) -> usize {
        self.items.iter().filter(|i| i.status == status).count()
    }

    /// True when there is at least one item and every item is ready.
    pub fn all_ready(&self) -> bool {
        !self.items.is_empty() && self.items.iter().all(|i| i.status == ItemStatus::Ready)
    }

    /// Envelopes of every ready item, in list order.
    ///
    /// Pending items keep their previous envelope until the new result
    /// lands; those are left out.
    pub fn ready_envelopes(&self) -> impl Iterator<Item = &ResultEnvelope> {
        self.items
            .iter()
            .filter(|i| i.status == ItemStatus::Ready)
            .filter_map(|i| i.result.as_ref())
    }

    pub fn total_original_size(&self) -> u64 {
        self.items.iter().map(|i| i.original_size).sum()
    }

    /// Items without an envelope count as zero.
    pub fn total_output_size(&self) -> u64 {
        self.items.iter().map(TrackedItem::output_size).sum()
    }

    /// Aggregate reduction in whole percent.
    ///
    /// Only meaningful once [`all_ready`](Self::all_ready) holds; before that
    /// pending items count as zero output and inflate the figure.
    pub fn reduction_percent(&self) -> Option<i64> {
        reduction_percent(self.total_original_size(), self.total_output_size())
    }

    /// [`reduction_percent`](Self::reduction_percent), or `None` until every
    /// item is ready.
    pub fn settled_reduction_percent(&self) -> Option<i64> {
        if !self.all_ready() {
            return None;
        }
        self.reduction_percent()
    }

    fn position(&self, identity: &str) -> Option<usize> {
        self.items.iter().position(|i| i.identity == identity)
    }
}

/// `floor(100 - output / original * 100)`, or `None` for an empty original.
pub fn reduction_percent(original: u64, output: u64) -> Option<i64> {
    if original == 0 {
        return None;
    }
    let ratio = output as f64 / original as f64;
    Some((100.0 - ratio * 100.0).floor() as i64)
}
