//! `toolbench` -- command line client for the toolbench server.
//!
//! # Environment variables
//!
//! | Variable        | Default                 | Description             |
//! |-----------------|-------------------------|-------------------------|
//! | `TOOLBENCH_URL` | `http://localhost:3000` | Server base URL         |
//! | `RUST_LOG`      | `toolbench_client=info` | Log filter              |

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use toolbench_client::{ApiClient, CompressSession};
use toolbench_core::batch::Batch;
use toolbench_core::compiler::Route;
use toolbench_core::reconcile::{ItemStatus, NewItem, ReconciliationStore};
use toolbench_core::work_item::StrategyConfig;

#[derive(Parser, Debug)]
#[command(name = "toolbench", version)]
struct Cli {
    /// Server base URL.
    #[arg(long, global = true, env = "TOOLBENCH_URL", default_value = "http://localhost:3000")]
    url: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compress one or more images.
    Compress(CompressArgs),
    /// Transform a source file to another language level.
    Transform(TransformArgs),
    /// List the image compression strategies.
    Strategies,
    /// List the supported transform routes.
    Languages,
}

#[derive(Parser, Debug)]
struct CompressArgs {
    /// Images to compress.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Strategy tag; the server default when omitted.
    #[arg(long)]
    strategy: Option<String>,

    /// Explicit quality (1-100).
    #[arg(long)]
    quality: Option<u8>,

    /// Convert the output to WebP.
    #[arg(long, default_value_t = false)]
    webp: bool,

    /// Directory to write the compressed files into.
    #[arg(long, conflicts_with = "archive")]
    out: Option<PathBuf>,

    /// Download all results as a single zip instead.
    #[arg(long)]
    archive: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct TransformArgs {
    /// Source file.
    file: PathBuf,

    /// Source language (`es6`, `ts`).
    #[arg(long)]
    from: String,

    /// Target language (`es5`, `es6`).
    #[arg(long)]
    to: String,

    /// Compiler tag; the server default when omitted.
    #[arg(long)]
    compiler: Option<String>,

    /// Write the output here instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "toolbench_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let client = ApiClient::new(cli.url);

    match cli.cmd {
        Command::Compress(args) => cmd_compress(client, args).await,
        Command::Transform(args) => cmd_transform(client, args).await,
        Command::Strategies => cmd_strategies(client).await,
        Command::Languages => cmd_languages(client).await,
    }
}

async fn cmd_compress(client: ApiClient, args: CompressArgs) -> anyhow::Result<()> {
    let config = StrategyConfig {
        strategy: args.strategy,
        quality: args.quality,
        webp: args.webp,
    };

    let mut items = Vec::with_capacity(args.files.len());
    for path in &args.files {
        let payload = tokio::fs::read(path)
            .await
            .with_context(|| format!("read '{}'", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        items.push(NewItem::new(name, payload, config.clone()));
    }

    if let Some(archive_path) = args.archive {
        let original: u64 = items.iter().map(|i| i.payload.len() as u64).sum();
        let mut store = ReconciliationStore::new();
        let batch = Batch::from_items(store.add_all(items)?)?;
        let download = client.compress_archive(&batch).await?;

        tokio::fs::write(&archive_path, &download.bytes)
            .await
            .with_context(|| format!("write archive '{}'", archive_path.display()))?;
        eprintln!(
            "wrote {} ({} bytes from {original} bytes of input)",
            archive_path.display(),
            download.bytes.len(),
        );
        if download.failed_items > 0 {
            eprintln!("{} item(s) failed and are not in the archive", download.failed_items);
        }
        return Ok(());
    }

    let mut session = CompressSession::new(client);
    session.add_files(items).await?;

    for item in session.store().items() {
        match (&item.result, &item.error) {
            (Some(result), _) => println!(
                "{:<32} {:>10} -> {:>10} bytes  {:>4}%  {}",
                item.name,
                item.original_size,
                result.output_size,
                item.reduction_percent().unwrap_or(0),
                result.output_name,
            ),
            (None, Some(error)) => {
                println!("{:<32} FAILED {}: {}", item.name, error.code.as_str(), error.message)
            }
            (None, None) => println!("{:<32} pending", item.name),
        }
    }

    let store = session.store();
    match store.settled_reduction_percent() {
        Some(percent) => println!("total reduction: {percent}%"),
        None => {
            let not_ready = store.len() - store.count(ItemStatus::Ready);
            println!("total reduction unavailable: {not_ready} item(s) not ready");
        }
    }

    if let Some(dir) = args.out {
        let written = session.save_results(&dir).await?;
        eprintln!("wrote {} file(s) to {}", written.len(), dir.display());
    }
    Ok(())
}

async fn cmd_transform(client: ApiClient, args: TransformArgs) -> anyhow::Result<()> {
    let route = Route::parse(&args.from, &args.to)?;
    let source = tokio::fs::read_to_string(&args.file)
        .await
        .with_context(|| format!("read '{}'", args.file.display()))?;

    let output = client
        .transform(route, &source, args.compiler.as_deref())
        .await?;

    match args.out {
        Some(path) => {
            tokio::fs::write(&path, &output.output_code)
                .await
                .with_context(|| format!("write '{}'", path.display()))?;
            eprintln!("wrote {}", path.display());
        }
        None => println!("{}", output.output_code),
    }
    eprintln!("{} took {:.1} ms", output.compiler, output.elapsed_ms);
    Ok(())
}

async fn cmd_strategies(client: ApiClient) -> anyhow::Result<()> {
    let listing = client.strategies().await?;
    println!("resolution: {}", listing.resolution);
    for strategy in listing.strategies {
        let marker = if strategy.tag == listing.default { "*" } else { " " };
        println!(
            "{marker} {:<12} quality={:<5} webp={}",
            strategy.tag, strategy.capabilities.quality, strategy.capabilities.format_conversion,
        );
    }
    Ok(())
}

async fn cmd_languages(client: ApiClient) -> anyhow::Result<()> {
    for route in client.languages().await? {
        println!(
            "{:>4} -> {:<4} {}",
            route.origin.as_str(),
            route.target.as_str(),
            route.compilers.join(", "),
        );
    }
    Ok(())
}
