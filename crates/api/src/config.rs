use std::str::FromStr;
use std::time::Duration;

use axum::http::HeaderValue;
use toolbench_core::batch::DEFAULT_MAX_BATCH_ITEMS;
use toolbench_core::compiler::{CommandLine, CompilerCommands};
use toolbench_core::strategy::ResolutionMode;

/// Default request body limit (50 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// A configuration variable that is set but cannot be parsed.
#[derive(Debug, thiserror::Error)]
#[error("{var} is invalid: {message}")]
pub struct ConfigError {
    pub var: &'static str,
    pub message: String,
}

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long in-flight requests may drain after a shutdown signal (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Request body limit in bytes.
    pub max_upload_bytes: usize,
    /// Maximum number of items in one batch.
    pub max_batch_items: usize,
    /// Items processed at once within a batch.
    pub batch_concurrency: usize,
    /// What to do with an unknown strategy tag.
    pub resolution: ResolutionMode,
    /// External compiler command lines and their timeout.
    pub compilers: CompilerCommands,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                    |
    /// |-------------------------|----------------------------|
    /// | `HOST`                  | `0.0.0.0`                  |
    /// | `PORT`                  | `3000`                     |
    /// | `CORS_ORIGINS`          | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`  | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS` | `30`                       |
    /// | `MAX_UPLOAD_BYTES`      | `52428800`                 |
    /// | `MAX_BATCH_ITEMS`       | `64`                       |
    /// | `BATCH_CONCURRENCY`     | available parallelism      |
    /// | `STRATEGY_RESOLUTION`   | `strict`                   |
    /// | `BABEL_CMD`             | `npx --yes @babel/cli`     |
    /// | `SWC_CMD`               | `npx --yes @swc/cli`       |
    /// | `ESBUILD_CMD`           | `npx --yes esbuild`        |
    /// | `COMPILE_TIMEOUT_SECS`  | `30`                       |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let cors_origins: Vec<String> = env
            .string("CORS_ORIGINS", "http://localhost:5173")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if let Some(bad) = cors_origins.iter().find(|o| HeaderValue::from_str(o).is_err()) {
            return Err(ConfigError {
                var: "CORS_ORIGINS",
                message: format!("'{bad}' is not a valid origin header value"),
            });
        }

        let batch_concurrency = env.parse("BATCH_CONCURRENCY", default_concurrency())?;
        if batch_concurrency == 0 {
            return Err(ConfigError {
                var: "BATCH_CONCURRENCY",
                message: "must be at least 1".into(),
            });
        }

        let defaults = CompilerCommands::default();
        let compilers = CompilerCommands {
            babel: env.command("BABEL_CMD", defaults.babel)?,
            swc: env.command("SWC_CMD", defaults.swc)?,
            esbuild: env.command("ESBUILD_CMD", defaults.esbuild)?,
            timeout: Duration::from_secs(
                env.parse("COMPILE_TIMEOUT_SECS", defaults.timeout.as_secs())?,
            ),
        };

        Ok(Self {
            host: env.string("HOST", "0.0.0.0"),
            port: env.parse("PORT", 3000)?,
            cors_origins,
            request_timeout_secs: env.parse("REQUEST_TIMEOUT_SECS", 30)?,
            shutdown_timeout_secs: env.parse("SHUTDOWN_TIMEOUT_SECS", 30)?,
            max_upload_bytes: env.parse("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            max_batch_items: env.parse("MAX_BATCH_ITEMS", DEFAULT_MAX_BATCH_ITEMS)?,
            batch_concurrency,
            resolution: env.parse("STRATEGY_RESOLUTION", ResolutionMode::default())?,
            compilers,
        })
    }
}

/// Parallelism of the host, or 4 when it cannot be determined.
pub fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn string(&self, var: &str, default: &str) -> String {
        (self.0)(var).unwrap_or_else(|| default.to_string())
    }

    fn parse<T>(&self, var: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match (self.0)(var) {
            None => Ok(default),
            Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError {
                var,
                message: e.to_string(),
            }),
        }
    }

    fn command(&self, var: &'static str, default: CommandLine) -> Result<CommandLine, ConfigError> {
        match (self.0)(var) {
            None => Ok(default),
            Some(raw) => CommandLine::parse(&raw).map_err(|e| ConfigError {
                var,
                message: e.to_string(),
            }),
        }
    }
}
