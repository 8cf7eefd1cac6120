//! Command-line front end: apply an operation batch to a page and print
//! what happened, or mint stream subscription tags.
//!
//! Logging goes to stderr and follows `RUST_LOG` (default `warn`).

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use html::Document;
use ops::{BatchOptions, Engine, EngineConfig, OperationBatch, describe_node};
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use stream_identity::StreamSigner;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser, Debug)]
#[command(name = "remote_dom")]
#[command(version, about = "Apply server-sent DOM operation batches to HTML pages")]
struct Args {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply a JSON batch to a page and print the result
    Apply {
        #[arg(long)]
        page: PathBuf,
        #[arg(long)]
        batch: PathBuf,
        /// Engine config (TOML)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Skip entries whose selector matches nothing instead of reporting them
        #[arg(long)]
        quiet_missing: bool,
    },
    /// Print the `<stream-from>` tag for a stream named by KEYS
    StreamFrom {
        /// Signing secret; read from REMOTE_DOM_STREAM_SECRET when omitted
        #[arg(long, env = "REMOTE_DOM_STREAM_SECRET", hide_env_values = true)]
        secret: String,
        keys: Vec<String>,
    },
    /// Check a signed stream identifier and print the stream name
    Verify {
        #[arg(long, env = "REMOTE_DOM_STREAM_SECRET", hide_env_values = true)]
        secret: String,
        identifier: String,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = if args.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match args.command {
        Command::Apply {
            page,
            batch,
            config,
            quiet_missing,
        } => apply(page, batch, config, quiet_missing),
        Command::StreamFrom { secret, keys } => {
            let keys: Vec<Option<&str>> = keys.iter().map(|k| Some(k.as_str())).collect();
            let tag = stream_identity::stream_from(&StreamSigner::new(secret), &keys)?;
            println!("{tag}");
            Ok(())
        }
        Command::Verify { secret, identifier } => {
            let name = StreamSigner::new(secret)
                .verify(&identifier)
                .context("identifier rejected")?;
            println!("{name}");
            Ok(())
        }
    }
}

fn apply(page: PathBuf, batch: PathBuf, config: Option<PathBuf>, quiet_missing: bool) -> Result<()> {
    let config = match &config {
        Some(path) => EngineConfig::from_path(path).with_context(|| format!("loading {}", path.display()))?,
        None => EngineConfig::default(),
    };
    let markup = std::fs::read_to_string(&page).with_context(|| format!("reading {}", page.display()))?;
    let text = std::fs::read_to_string(&batch).with_context(|| format!("reading {}", batch.display()))?;
    let batch = OperationBatch::from_json(&text).with_context(|| format!("decoding {}", batch.display()))?;

    let mut engine = Engine::in_memory(Document::parse(&markup)).with_config(config);
    let options = if quiet_missing {
        BatchOptions {
            emit_missing_element_warnings: false,
        }
    } else {
        engine.default_options()
    };

    let trace = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&trace);
    let root = engine.document().root();
    engine.events().add_wildcard_listener(root, move |event| {
        let label = describe_node(event.document(), event.target());
        sink.borrow_mut().push(format!("{} {label}", event.name()));
    });

    let report = engine.perform(&batch, options);
    log::info!(
        "applied={} canceled={} skipped={}",
        report.applied,
        report.canceled,
        report.skipped
    );

    let doc = engine.document();
    println!("{}", doc.inner_html(doc.root()));
    for line in trace.borrow().iter() {
        println!("{line}");
    }
    for diagnostic in &report.diagnostics {
        println!("{diagnostic}");
    }
    Ok(())
}
