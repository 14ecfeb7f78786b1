//! Scatter/gather execution of one image batch.
//!
//! Every item is resolved, validated and compressed on its own: a bad tag,
//! a rejected option, a codec error or even a panic only turns that item
//! into a failure marker. Codec work runs on the blocking pool, bounded by
//! a semaphore shared across requests.

use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use tokio::sync::Semaphore;
use toolbench_core::batch::Batch;
use toolbench_core::codec::{CodecRegistry, CompressOptions, ImageCodec};
use toolbench_core::envelope::{ItemOutcome, ResultEnvelope};
use toolbench_core::error::CoreError;
use toolbench_core::timing::timed_result;
use toolbench_core::work_item::WorkItem;

/// Runs batches against a codec registry.
pub struct BatchDispatcher {
    codecs: Arc<CodecRegistry>,
    permits: Arc<Semaphore>,
    concurrency: usize,
}

impl BatchDispatcher {
    /// Create a dispatcher allowing `concurrency` items to run at once.
    pub fn new(codecs: Arc<CodecRegistry>, concurrency: usize) -> Self {
        let concurrency = concurrency.max(1);
        Self {
            codecs,
            permits: Arc::new(Semaphore::new(concurrency)),
            concurrency,
        }
    }

    pub fn codecs(&self) -> &CodecRegistry {
        &self.codecs
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Process every item and return one outcome per item.
    ///
    /// Outcomes are returned in submission order, but callers must match
    /// them by identity.
    pub async fn process_batch(&self, batch: Batch) -> Vec<ItemOutcome> {
        let started = Instant::now();
        let total = batch.len();

        let outcomes = join_all(batch.into_iter().map(|item| self.process_item(item))).await;

        let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
        tracing::info!(
            items = total,
            failed,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Batch processed",
        );
        outcomes
    }

    async fn process_item(&self, item: WorkItem) -> ItemOutcome {
        let identity = item.identity.clone();
        let sequence = item.sequence;

        let (codec, options) = match self.prepare(&item) {
            Ok(prepared) => prepared,
            Err(err) => {
                tracing::debug!(identity = %identity, error = %err, "Item rejected before execution");
                return ItemOutcome::failed(identity, sequence, &err);
            }
        };

        let permit = match Arc::clone(&self.permits).acquire_owned().await {
            Ok(permit) => permit,
            Err(e) => {
                let err = CoreError::Internal(format!("dispatcher semaphore closed: {e}"));
                return ItemOutcome::failed(identity, sequence, &err);
            }
        };

        let tag = codec.tag();
        let WorkItem { name, payload, .. } = item;
        let task = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            timed_result(|| codec.compress(&payload, &options))
        });

        match task.await {
            Ok(Ok(timed)) => {
                tracing::debug!(
                    identity = %identity,
                    strategy = tag,
                    output_size = timed.value.bytes.len(),
                    elapsed_ms = timed.elapsed_ms(),
                    "Item compressed",
                );
                let elapsed = timed.elapsed;
                let encoded = timed.value;
                ItemOutcome::Ok(
                    ResultEnvelope::build(identity, name.as_deref(), encoded.format, encoded.bytes)
                        .with_sequence(sequence)
                        .with_elapsed(elapsed),
                )
            }
            Ok(Err(codec_err)) => {
                tracing::warn!(identity = %identity, strategy = tag, error = %codec_err, "Strategy failed");
                ItemOutcome::failed(identity, sequence, &codec_err.into())
            }
            Err(join_err) => {
                tracing::error!(identity = %identity, strategy = tag, error = %join_err, "Strategy task aborted");
                let err = CoreError::Internal(format!("strategy task aborted: {join_err}"));
                ItemOutcome::failed(identity, sequence, &err)
            }
        }
    }

    /// Resolve the item's strategy and check its options.
    fn prepare(&self, item: &WorkItem) -> Result<(Arc<dyn ImageCodec>, CompressOptions), CoreError> {
        let config = item.effective_config();
        let codec = self.codecs.resolve(config.strategy.as_deref())?;
        let options = config.resolve_options(codec.tag(), codec.capabilities())?;
        Ok((codec, options))
    }
}
