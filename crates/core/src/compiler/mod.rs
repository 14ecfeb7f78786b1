//! Source-transform strategies for the code playground.
//!
//! Compilers are external tools (babel, swc, esbuild) driven as
//! subprocesses: source on stdin, output on stdout. Each one declares the
//! [`Route`]s it supports so an unsupported pairing is rejected before
//! anything is spawned.

pub mod command;
pub mod route;
pub mod subprocess;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

pub use command::{CommandCompiler, CommandLine};
pub use route::{Language, Route, ROUTES};

use crate::error::CoreError;
use crate::strategy::{ResolutionMode, StrategyRegistry, Tagged};

/// Default per-compile timeout.
pub const DEFAULT_COMPILE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("Failed to run compiler: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("Compiler timed out after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },

    #[error("Compiler exited with code {exit_code}: {stderr}")]
    Failed { exit_code: i32, stderr: String },
}

impl From<CompileError> for CoreError {
    fn from(err: CompileError) -> Self {
        CoreError::StrategyExecution(err.to_string())
    }
}

#[async_trait]
pub trait Compiler: Tagged + Send + Sync {
    fn supports(&self, route: Route) -> bool;

    /// Transform `source` along `route`, returning the generated code.
    async fn compile(&self, source: &str, route: Route) -> Result<String, CompileError>;
}

pub type CompilerRegistry = StrategyRegistry<dyn Compiler>;

/// Command lines for the built-in compilers.
#[derive(Debug, Clone)]
pub struct CompilerCommands {
    pub babel: CommandLine,
    pub swc: CommandLine,
    pub esbuild: CommandLine,
    pub timeout: Duration,
}

impl Default for CompilerCommands {
    fn default() -> Self {
        Self {
            babel: CommandLine::new("npx", ["--yes", "@babel/cli"]),
            swc: CommandLine::new("npx", ["--yes", "@swc/cli"]),
            esbuild: CommandLine::new("npx", ["--yes", "esbuild"]),
            timeout: DEFAULT_COMPILE_TIMEOUT,
        }
    }
}

/// Registry with babel (default), swc and esbuild.
pub fn default_registry(commands: &CompilerCommands, mode: ResolutionMode) -> CompilerRegistry {
    StrategyRegistry::new(
        Arc::new(CommandCompiler::babel(commands.babel.clone(), commands.timeout))
            as Arc<dyn Compiler>,
        mode,
    )
    .with(Arc::new(CommandCompiler::swc(commands.swc.clone(), commands.timeout)))
    .with(Arc::new(CommandCompiler::esbuild(commands.esbuild.clone(), commands.timeout)))
}

/// Resolve `tag` and check the compiler handles `route`.
pub fn resolve_for_route(
    registry: &CompilerRegistry,
    tag: Option<&str>,
    route: Route,
) -> Result<Arc<dyn Compiler>, CoreError> {
    let compiler = registry.resolve(tag)?;
    if !compiler.supports(route) {
        return Err(CoreError::UnsupportedOption {
            strategy: compiler.tag().to_string(),
            option: "route",
        });
    }
    Ok(compiler)
}

/// Tags of the compilers that handle `route`, default first.
pub fn compilers_for(registry: &CompilerRegistry, route: Route) -> Vec<&'static str> {
    let mut tags: Vec<&'static str> = registry
        .iter()
        .filter(|c| c.supports(route))
        .map(|c| c.tag())
        .collect();
    if let Some(pos) = tags.iter().position(|t| *t == registry.default_tag()) {
        let default = tags.remove(pos);
        tags.insert(0, default);
    }
    tags
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn registry() -> CompilerRegistry {
        default_registry(&CompilerCommands::default(), ResolutionMode::Strict)
    }

    #[test]
    fn babel_is_default() {
        let reg = registry();
        assert_eq!(reg.default_tag(), "babel");
        assert_eq!(reg.tags(), vec!["babel", "esbuild", "swc"]);
    }

    #[test]
    fn esbuild_only_handles_ts_to_es6() {
        let reg = registry();
        let ts_es6 = Route::new(Language::Ts, Language::Es6);
        let ts_es5 = Route::new(Language::Ts, Language::Es5);

        assert!(resolve_for_route(&reg, Some("esbuild"), ts_es6).is_ok());
        assert_matches!(
            resolve_for_route(&reg, Some("esbuild"), ts_es5).map(|_| ()),
            Err(CoreError::UnsupportedOption { option: "route", .. })
        );
    }

    #[test]
    fn unknown_compiler_is_invalid_strategy() {
        let reg = registry();
        let route = Route::new(Language::Es6, Language::Es5);
        assert_matches!(
            resolve_for_route(&reg, Some("tsc"), route).map(|_| ()),
            Err(CoreError::InvalidStrategy(_))
        );
    }

    #[test]
    fn compilers_per_route_match_language_table() {
        let reg = registry();
        assert_eq!(
            compilers_for(&reg, Route::new(Language::Ts, Language::Es6)),
            vec!["babel", "esbuild", "swc"]
        );
        assert_eq!(
            compilers_for(&reg, Route::new(Language::Es6, Language::Es5)),
            vec!["babel", "swc"]
        );
    }

    #[test]
    fn compile_error_maps_to_strategy_execution() {
        let err: CoreError = CompileError::Failed {
            exit_code: 1,
            stderr: "Unexpected token".into(),
        }
        .into();
        assert_matches!(err, CoreError::StrategyExecution(msg) if msg.contains("Unexpected token"));
    }
}
