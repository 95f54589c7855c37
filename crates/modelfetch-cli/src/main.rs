use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use modelfetch_core::{Orchestrator, SourceKind};

mod prompt;
mod session;

use session::{SessionOptions, SessionOutcome};

/// modelfetch — interactive multi-hub model downloader
#[derive(Debug, Parser)]
#[command(name = "modelfetch", version, about, long_about = None)]
struct Cli {
    /// Storage root for downloaded models. Asked interactively when omitted.
    #[arg(long, value_name = "DIR")]
    models_dir: Option<PathBuf>,

    /// Model id to download (e.g. `Qwen/Qwen2-7B-Instruct`). Asked
    /// interactively when omitted.
    #[arg(long, short = 'm')]
    model: Option<String>,

    /// Download source. Asked interactively when omitted.
    #[arg(long, short = 's', value_enum)]
    source: Option<SourceArg>,

    /// Log format: "pretty" (default) or "json".
    #[arg(long, default_value = "pretty", value_name = "FORMAT")]
    log_format: String,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SourceArg {
    Modelscope,
    HfOfficial,
    HfMirror,
    Auto,
}

impl From<SourceArg> for SourceKind {
    fn from(arg: SourceArg) -> Self {
        match arg {
            SourceArg::Modelscope => SourceKind::ModelScope,
            SourceArg::HfOfficial => SourceKind::HfOfficial,
            SourceArg::HfMirror => SourceKind::HfMirror,
            SourceArg::Auto => SourceKind::Auto,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(&cli.log_format);

    // One top-level interrupt handler: any Ctrl-C during a prompt or a
    // transfer ends the session cleanly.
    let ctrlc_result = ctrlc::set_handler(|| {
        println!("\n\nInterrupted, exiting.");
        std::process::exit(130);
    });
    if let Err(e) = ctrlc_result {
        tracing::warn!("Could not install Ctrl-C handler: {}", e);
    }

    let opts = SessionOptions {
        models_dir: cli.models_dir,
        model: cli.model,
        source: cli.source.map(SourceKind::from),
    };

    let orchestrator = Orchestrator::with_default_sources();
    let stdin = io::stdin();

    match session::run(stdin.lock(), opts, &orchestrator) {
        Ok(SessionOutcome::Success) | Ok(SessionOutcome::Cancelled) => ExitCode::SUCCESS,
        Ok(SessionOutcome::Failure) => ExitCode::FAILURE,
        Err(e) => {
            // Truly unexpected condition: report generically, never crash.
            println!("\nAn unexpected error occurred: {e}");
            tracing::debug!("Session error detail: {:?}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(log_format: &str) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let registry = tracing_subscriber::registry().with(env_filter);

    if log_format == "json" {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().pretty()).init();
    }
}
