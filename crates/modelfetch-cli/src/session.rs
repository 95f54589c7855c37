//! Interactive download session: one end-to-end run from storage-root prompt
//! to final summary.

use std::io::BufRead;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use tracing::debug;

use modelfetch_core::config::StoreConfig;
use modelfetch_core::{
    check_model_dir, dir_size, resolve_existing, ExistingChoice, IntegrityStatus, ModelReference,
    ModelStore, Orchestrator, SourceKind,
};

use crate::prompt::Console;

const GIB: f64 = 1024.0 * 1024.0 * 1024.0;
const RULE: &str = "============================================================";

/// Answers supplied up front on the command line; anything missing is asked
/// interactively.
#[derive(Debug, Default)]
pub struct SessionOptions {
    pub models_dir: Option<PathBuf>,
    pub model: Option<String>,
    pub source: Option<SourceKind>,
}

/// How the session ended. Cancellation is informational, not a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    Success,
    Failure,
    Cancelled,
}

/// Run one interactive session end to end.
///
/// Expected error paths (unusable storage root, deletion failure, failed
/// downloads) are reported here and folded into the outcome; only genuinely
/// unexpected conditions propagate as `Err`, to be reported generically by
/// the caller.
pub fn run<R: BufRead>(
    input: R,
    mut opts: SessionOptions,
    orchestrator: &Orchestrator,
) -> Result<SessionOutcome> {
    let mut console = Console::new(input);

    print_banner();

    // Storage root: set once, read-only for the rest of the session.
    let store = match acquire_store(&mut console, opts.models_dir.take())? {
        Acquired::Value(store) => store,
        Acquired::Cancelled => return cancelled(),
        Acquired::Failed => return Ok(SessionOutcome::Failure),
    };
    println!("Models will be stored under: {}\n", store.root().display());

    // Model reference: re-ask while the identifier is empty.
    let reference = match acquire_reference(&mut console, opts.model.take())? {
        Acquired::Value(reference) => reference,
        Acquired::Cancelled => return cancelled(),
        Acquired::Failed => return Ok(SessionOutcome::Failure),
    };
    println!(
        "Model '{}' will be saved to folder '{}'.",
        reference,
        reference.local_name()
    );

    let model_dir = store.model_dir(&reference);
    let status = check_model_dir(&model_dir)?;
    debug!(?status, dir = %model_dir.display(), "Pre-download integrity status");

    let needs_download = match status {
        IntegrityStatus::Absent => true,
        IntegrityStatus::Complete => {
            println!("\nModel '{}' already exists and is complete.", reference);
            let answer = match console.ask(
                "Choose:\n  1. Use existing model (default)\n  2. Delete and re-download\nSelect (1/2): ",
            )? {
                Some(a) => a,
                None => return cancelled(),
            };
            let choice = if answer == "2" {
                ExistingChoice::DeleteAndRedownload
            } else {
                ExistingChoice::UseExisting
            };
            match resolve_existing(&store, &reference, status, choice) {
                Ok(needs) => needs,
                Err(e) => {
                    println!("Could not remove the existing model: {e}");
                    return Ok(SessionOutcome::Failure);
                }
            }
        }
        IntegrityStatus::Incomplete => {
            println!("\nFound an incomplete copy of '{}'.", reference);
            let answer = match console.ask(
                "Choose:\n  1. Delete the incomplete folder and re-download (default)\n  2. Cancel\nSelect (1/2): ",
            )? {
                Some(a) => a,
                None => return cancelled(),
            };
            if answer == "2" {
                println!("Download cancelled.");
                return Ok(SessionOutcome::Cancelled);
            }
            match resolve_existing(
                &store,
                &reference,
                status,
                ExistingChoice::DeleteAndRedownload,
            ) {
                Ok(needs) => needs,
                Err(e) => {
                    println!("Could not remove the incomplete model: {e}");
                    return Ok(SessionOutcome::Failure);
                }
            }
        }
    };

    if !needs_download {
        // Keeping an existing complete model still counts as success.
        print_summary(&store, &reference, true);
        return Ok(SessionOutcome::Success);
    }

    let kind = match opts.source.take() {
        Some(kind) => kind,
        None => match select_source(&mut console)? {
            Some(kind) => kind,
            None => return cancelled(),
        },
    };

    println!("\nStarting download: {}", reference);
    println!("Saving to: {}", model_dir.display());

    let started = Instant::now();
    let mut success = orchestrator.download_single(&reference, &store, kind);

    if success {
        println!("\nVerifying download...");
        success = check_model_dir(&model_dir)? == IntegrityStatus::Complete;
        if !success {
            println!("Downloaded files are incomplete or damaged.");
        }
    }
    let elapsed = started.elapsed();

    if !success && model_dir.exists() {
        // A hub client can exit non-zero after materializing a full snapshot;
        // only non-complete state gets removed.
        if check_model_dir(&model_dir)? != IntegrityStatus::Complete {
            println!("Cleaning up partial download...");
            store.remove_model_best_effort(&reference);
        }
    }

    print_summary(&store, &reference, success);
    if success {
        println!("Download took {:.1} s", elapsed.as_secs_f64());
        Ok(SessionOutcome::Success)
    } else {
        Ok(SessionOutcome::Failure)
    }
}

enum Acquired<T> {
    Value(T),
    Cancelled,
    Failed,
}

fn acquire_store<R: BufRead>(
    console: &mut Console<R>,
    preset: Option<PathBuf>,
) -> Result<Acquired<ModelStore>> {
    let default_dir = std::env::current_dir()?.join(StoreConfig::DEFAULT_ROOT_NAME);

    let root = match preset {
        Some(dir) => dir,
        None => {
            let prompt = format!(
                "Model storage directory (Enter for default: {}): ",
                default_dir.display()
            );
            match console.ask(&prompt)? {
                Some(answer) if answer.is_empty() => default_dir,
                Some(answer) => PathBuf::from(answer),
                None => return Ok(Acquired::Cancelled),
            }
        }
    };

    match ModelStore::open(root) {
        Ok(store) => Ok(Acquired::Value(store)),
        Err(e) => {
            // Unusable storage root is fatal to the session.
            println!("{e}");
            Ok(Acquired::Failed)
        }
    }
}

fn acquire_reference<R: BufRead>(
    console: &mut Console<R>,
    preset: Option<String>,
) -> Result<Acquired<ModelReference>> {
    let mut preset = preset;
    loop {
        let line = match preset.take() {
            Some(model) => model,
            None => {
                let prompt = "\nEnter a ModelScope or Hugging Face model id\n(e.g. Qwen/Qwen2-7B-Instruct): ";
                match console.ask(prompt)? {
                    Some(line) => line,
                    None => return Ok(Acquired::Cancelled),
                }
            }
        };
        match ModelReference::parse(&line) {
            Ok(reference) => return Ok(Acquired::Value(reference)),
            Err(_) => println!("Model id must not be empty, please try again."),
        }
    }
}

/// Source menu, re-asked until a valid choice arrives. `None` on end of
/// input.
fn select_source<R: BufRead>(console: &mut Console<R>) -> Result<Option<SourceKind>> {
    println!("\nSelect a download source:");
    println!("  1. ModelScope");
    println!("  2. Hugging Face official");
    println!("  3. Hugging Face mirror (hf-mirror.com)");
    println!("  4. Auto (ModelScope first, then mirror, then official)");

    loop {
        let answer = match console.ask("\nChoose a source (1-4): ")? {
            Some(answer) => answer,
            None => return Ok(None),
        };
        match answer.as_str() {
            "1" => return Ok(Some(SourceKind::ModelScope)),
            "2" => return Ok(Some(SourceKind::HfOfficial)),
            "3" => return Ok(Some(SourceKind::HfMirror)),
            "4" => return Ok(Some(SourceKind::Auto)),
            _ => println!("Invalid choice, enter a number between 1 and 4."),
        }
    }
}

fn cancelled() -> Result<SessionOutcome> {
    println!("\nNo input, session cancelled.");
    Ok(SessionOutcome::Cancelled)
}

fn print_banner() {
    println!("\n{RULE}");
    println!("Interactive model downloader");
    println!("{RULE}");
    println!("Fetch any model from ModelScope or Hugging Face.");
    println!("{RULE}\n");
}

fn print_summary(store: &ModelStore, reference: &ModelReference, success: bool) {
    println!("\n{RULE}");
    println!("Download summary");
    println!("{RULE}");

    if success {
        let model_dir = store.model_dir(reference);
        let size = dir_size(&model_dir).unwrap_or(0);
        println!("Model id:    {}", reference);
        println!("Status:      success");
        println!("Local path:  {}", model_dir.display());
        println!("Model size:  {}", format_gib(size));
        println!("\nThe model is ready to use.");
    } else {
        println!("Model id:    {}", reference);
        println!("Status:      failed");
        println!("\nSuggestions:");
        println!("  - Check your network connection.");
        println!("  - Try another download source (e.g. the mirror if official failed).");
        println!("  - Make sure the model id exists on the chosen hub.");
        println!("  - Make sure there is enough free disk space.");
    }
    println!("{RULE}");
}

fn format_gib(bytes: u64) -> String {
    format!("{:.2} GB", bytes as f64 / GIB)
}
