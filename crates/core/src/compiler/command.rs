//! Compilers backed by an external command line.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use super::route::{Language, Route};
use super::subprocess::run_command;
use super::{CompileError, Compiler};
use crate::error::CoreError;
use crate::strategy::Tagged;

/// Longest stderr excerpt carried in a [`CompileError::Failed`].
const STDERR_EXCERPT_CHARS: usize = 2000;

/// Program plus leading arguments, e.g. `npx --yes @babel/cli`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandLine {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Split a whitespace-separated command string. No shell quoting.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let mut parts = raw.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| CoreError::Validation("compiler command must not be empty".into()))?;
        Ok(Self::new(program, parts))
    }

    fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// A [`Compiler`] that pipes source through a command line.
pub struct CommandCompiler {
    tag: &'static str,
    command: CommandLine,
    routes: Vec<Route>,
    args_for: fn(Route) -> Vec<String>,
    timeout: Duration,
}

impl CommandCompiler {
    pub fn new(
        tag: &'static str,
        command: CommandLine,
        routes: Vec<Route>,
        args_for: fn(Route) -> Vec<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            tag,
            command,
            routes,
            args_for,
            timeout,
        }
    }

    pub fn babel(command: CommandLine, timeout: Duration) -> Self {
        Self::new(
            "babel",
            command,
            vec![
                Route::new(Language::Es6, Language::Es5),
                Route::new(Language::Ts, Language::Es6),
                Route::new(Language::Ts, Language::Es5),
            ],
            babel_args,
            timeout,
        )
    }

    pub fn swc(command: CommandLine, timeout: Duration) -> Self {
        Self::new(
            "swc",
            command,
            vec![
                Route::new(Language::Es6, Language::Es5),
                Route::new(Language::Ts, Language::Es6),
                Route::new(Language::Ts, Language::Es5),
            ],
            swc_args,
            timeout,
        )
    }

    /// esbuild cannot lower to ES5, so it only strips types.
    pub fn esbuild(command: CommandLine, timeout: Duration) -> Self {
        Self::new(
            "esbuild",
            command,
            vec![Route::new(Language::Ts, Language::Es6)],
            esbuild_args,
            timeout,
        )
    }

    pub fn command(&self) -> &CommandLine {
        &self.command
    }
}

impl fmt::Debug for CommandCompiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandCompiler")
            .field("tag", &self.tag)
            .field("command", &self.command.to_string())
            .field("routes", &self.routes)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Tagged for CommandCompiler {
    fn tag(&self) -> &'static str {
        self.tag
    }
}

#[async_trait]
impl Compiler for CommandCompiler {
    fn supports(&self, route: Route) -> bool {
        self.routes.contains(&route)
    }

    async fn compile(&self, source: &str, route: Route) -> Result<String, CompileError> {
        let mut cmd = self.command.to_command();
        cmd.args((self.args_for)(route));

        tracing::debug!(compiler = self.tag, %route, command = %self.command, "Running compiler");

        let output = run_command(&mut cmd, source.as_bytes(), self.timeout).await?;
        if output.exit_code != 0 {
            return Err(CompileError::Failed {
                exit_code: output.exit_code,
                stderr: excerpt(&output.stderr),
            });
        }
        Ok(output.stdout)
    }
}

fn source_file_name(route: Route) -> String {
    format!("input.{}", route.origin.file_extension())
}

fn babel_args(route: Route) -> Vec<String> {
    let presets = match (route.origin, route.target) {
        (Language::Ts, Language::Es5) => "@babel/preset-typescript,@babel/preset-env",
        (Language::Ts, _) => "@babel/preset-typescript",
        _ => "@babel/preset-env",
    };
    vec![
        "--filename".into(),
        source_file_name(route),
        "--no-babelrc".into(),
        "--presets".into(),
        presets.into(),
    ]
}

fn swc_args(route: Route) -> Vec<String> {
    let syntax = match route.origin {
        Language::Ts => "typescript",
        Language::Es6 | Language::Es5 => "ecmascript",
    };
    vec![
        "--filename".into(),
        source_file_name(route),
        "-C".into(),
        format!("jsc.parser.syntax={syntax}"),
        "-C".into(),
        format!("jsc.target={}", route.ecma_target()),
    ]
}

fn esbuild_args(route: Route) -> Vec<String> {
    vec![
        format!("--loader={}", route.origin.file_extension()),
        format!("--target={}", route.ecma_target()),
    ]
}

fn excerpt(stderr: &str) -> String {
    let trimmed = stderr.trim();
    match trimmed.char_indices().nth(STDERR_EXCERPT_CHARS) {
        Some((cut, _)) => format!("{}...", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    const TS_ES6: Route = Route::new(Language::Ts, Language::Es6);

    fn identity_args(_: Route) -> Vec<String> {
        Vec::new()
    }

    #[test]
    fn parse_splits_on_whitespace() {
        let cmd = CommandLine::parse("  npx --yes   @babel/cli ").unwrap();
        assert_eq!(cmd.program, "npx");
        assert_eq!(cmd.args, vec!["--yes", "@babel/cli"]);
        assert_eq!(cmd.to_string(), "npx --yes @babel/cli");
    }

    #[test]
    fn parse_rejects_empty() {
        assert_matches!(CommandLine::parse("   "), Err(CoreError::Validation(_)));
    }

    #[test]
    fn babel_presets_follow_route() {
        let args = babel_args(Route::new(Language::Ts, Language::Es5));
        assert!(args.contains(&"input.ts".to_string()));
        assert!(args.contains(&"@babel/preset-typescript,@babel/preset-env".to_string()));

        let args = babel_args(Route::new(Language::Es6, Language::Es5));
        assert!(args.contains(&"input.js".to_string()));
        assert!(args.contains(&"@babel/preset-env".to_string()));
    }

    #[test]
    fn swc_and_esbuild_targets() {
        let args = swc_args(Route::new(Language::Ts, Language::Es5));
        assert!(args.contains(&"jsc.parser.syntax=typescript".to_string()));
        assert!(args.contains(&"jsc.target=es5".to_string()));

        assert_eq!(esbuild_args(TS_ES6), vec!["--loader=ts", "--target=es2022"]);
    }

    #[tokio::test]
    async fn compiles_through_command() {
        let compiler = CommandCompiler::new(
            "cat",
            CommandLine::new("cat", Vec::<String>::new()),
            vec![TS_ES6],
            identity_args,
            Duration::from_secs(5),
        );
        let out = compiler.compile("const a = 1;", TS_ES6).await.unwrap();
        assert_eq!(out, "const a = 1;");
    }

    #[tokio::test]
    async fn nonzero_exit_is_failure_with_stderr() {
        let compiler = CommandCompiler::new(
            "broken",
            CommandLine::new("sh", ["-c", "echo 'Unexpected token (1:4)' >&2; exit 1"]),
            vec![TS_ES6],
            identity_args,
            Duration::from_secs(5),
        );
        let err = compiler.compile("let ???", TS_ES6).await.unwrap_err();
        assert_matches!(
            err,
            CompileError::Failed { exit_code: 1, ref stderr } if stderr == "Unexpected token (1:4)"
        );
    }

    #[test]
    fn excerpt_truncates_long_stderr() {
        let long = "x".repeat(STDERR_EXCERPT_CHARS + 10);
        let cut = excerpt(&long);
        assert_eq!(cut.len(), STDERR_EXCERPT_CHARS + 3);
        assert!(cut.ends_with("..."));
    }
}
