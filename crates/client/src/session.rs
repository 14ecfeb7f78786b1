//! A compression session: the user's item list kept in sync with the
//! server.
//!
//! Every submission goes through the [`ReconciliationStore`], so results
//! are merged by identity and sequence no matter how the server orders
//! them. The session sends one request at a time; callers that need
//! overlapping requests can drive [`ApiClient`] and the store directly.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use toolbench_core::batch::Batch;
use toolbench_core::error::{ItemError, ItemErrorCode};
use toolbench_core::naming::unique_name;
use toolbench_core::reconcile::{MergeReport, NewItem, ReconciliationStore};
use toolbench_core::work_item::{ConfigPatch, WorkItem};

use crate::client::ApiClient;
use crate::error::ClientError;

pub struct CompressSession {
    client: ApiClient,
    store: ReconciliationStore,
}

impl CompressSession {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            store: ReconciliationStore::new(),
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn store(&self) -> &ReconciliationStore {
        &self.store
    }

    /// Track `items` as pending and submit them as one batch.
    pub async fn add_files(&mut self, items: Vec<NewItem>) -> Result<MergeReport, ClientError> {
        let work = self.store.add_all(items)?;
        self.submit(work).await
    }

    /// Change one item's configuration and re-submit just that item.
    pub async fn update_config(
        &mut self,
        identity: &str,
        patch: &ConfigPatch,
    ) -> Result<MergeReport, ClientError> {
        let work = self.store.update_item_config(identity, patch)?;
        self.submit(vec![work]).await
    }

    /// Forget every item.
    pub fn clear(&mut self) {
        self.store.clear();
    }

    /// Write every ready result into `dir` and return the written paths.
    ///
    /// Output names that collide get a numeric suffix. Nothing is written
    /// if any name is not a plain file name.
    pub async fn save_results(&self, dir: &Path) -> Result<Vec<PathBuf>, ClientError> {
        let envelopes: Vec<_> = self.store.ready_envelopes().collect();
        if let Some(bad) = envelopes.iter().find(|e| !is_plain_file_name(&e.output_name)) {
            return Err(ClientError::Decode(format!(
                "refusing to write output name '{}' for item '{}'",
                bad.output_name, bad.identity
            )));
        }

        tokio::fs::create_dir_all(dir).await?;

        let mut used = HashSet::new();
        let mut written = Vec::new();
        for envelope in envelopes {
            let path = dir.join(unique_name(&envelope.output_name, &mut used));
            tokio::fs::write(&path, &envelope.output_payload).await?;
            written.push(path);
        }

        tracing::info!(dir = %dir.display(), files = written.len(), "Saved compressed results");
        Ok(written)
    }

    async fn submit(&mut self, work: Vec<WorkItem>) -> Result<MergeReport, ClientError> {
        let batch = Batch::from_items(work)?;

        let outcomes = match self.client.compress_batch(&batch).await {
            Ok(outcomes) => outcomes,
            Err(e) => {
                tracing::warn!(items = batch.len(), error = %e, "Batch submission failed");
                let error = ItemError {
                    code: ItemErrorCode::InternalError,
                    message: e.to_string(),
                };
                for item in batch.items() {
                    self.fail_item(item, error.clone());
                }
                return Err(e);
            }
        };

        let answered: HashSet<String> = outcomes.iter().map(|o| o.identity().to_string()).collect();
        let report = self.store.merge_results(outcomes);

        for item in batch.items().iter().filter(|i| !answered.contains(&i.identity)) {
            tracing::warn!(identity = %item.identity, "Server returned no result for item");
            self.fail_item(
                item,
                ItemError {
                    code: ItemErrorCode::InternalError,
                    message: "no result returned for this item".to_string(),
                },
            );
        }

        tracing::info!(
            applied = report.applied,
            stale = report.stale,
            unknown = report.unknown,
            "Merged batch results",
        );
        Ok(report)
    }

    fn fail_item(&mut self, item: &WorkItem, error: ItemError) {
        if let Some(sequence) = item.sequence {
            self.store.mark_failed(&item.identity, sequence, error);
        }
    }
}

/// A single normal path component: no separators, no `..`, not absolute.
fn is_plain_file_name(name: &str) -> bool {
    if name.contains(['/', '\\']) {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
