use std::sync::Arc;

use toolbench_core::codec::{self, CodecRegistry};
use toolbench_core::compiler::{self, CompilerRegistry};

use crate::config::ServerConfig;
use crate::engine::dispatcher::BatchDispatcher;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Image strategies, shared with the dispatcher.
    pub codecs: Arc<CodecRegistry>,
    /// Source compilers.
    pub compilers: Arc<CompilerRegistry>,
    /// Batch executor for the image endpoints.
    pub dispatcher: Arc<BatchDispatcher>,
}

impl AppState {
    /// Build state with explicit registries.
    pub fn new(config: ServerConfig, codecs: CodecRegistry, compilers: CompilerRegistry) -> Self {
        let codecs = Arc::new(codecs);
        let dispatcher = BatchDispatcher::new(Arc::clone(&codecs), config.batch_concurrency);
        Self {
            config: Arc::new(config),
            codecs,
            compilers: Arc::new(compilers),
            dispatcher: Arc::new(dispatcher),
        }
    }

    /// Build state with the built-in strategies, configured from `config`.
    pub fn from_config(config: ServerConfig) -> Self {
        let codecs = codec::default_registry(config.resolution);
        let compilers = compiler::default_registry(&config.compilers, config.resolution);
        Self::new(config, codecs, compilers)
    }
}
