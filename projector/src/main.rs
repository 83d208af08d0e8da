//! Incremental file-system projector CLI.
//!
//! Decodes generator instruction payloads into a project tree and mounts it
//! into a sandbox directory, either offline from payload files or live
//! against a generation backend.

use std::fs;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::warn;

use projector::core::parser::parse;
use projector::core::types::RoundKind;
use projector::exit_codes;
use projector::io::config::{DEFAULT_CONFIG_PATH, ProjectorConfig, load_config, write_config};
use projector::io::generation::{GenerationError, HttpGenerationService};
use projector::io::sandbox::{DirectorySandbox, MountError, Sandbox};
use projector::io::tree_store::load_tree;
use projector::logging;
use projector::orchestrator::{Orchestrator, RoundOutcome};
use projector::session::BuildSession;
use projector::tree::count_files;

#[derive(Parser)]
#[command(
    name = "projector",
    version,
    about = "Project generator instruction payloads into a mountable file tree"
)]
struct Cli {
    /// Path to the projector config file.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a default `projector.toml` if missing.
    Init {
        /// Overwrite an existing config.
        #[arg(short, long)]
        force: bool,
    },
    /// Print the operations decoded from a payload file as JSON.
    Parse {
        /// Payload file (`-` reads stdin).
        payload: PathBuf,
    },
    /// Fold payload files in order and print the mount descriptor.
    Project {
        /// Payload files, applied one round each.
        #[arg(required = true)]
        payloads: Vec<PathBuf>,
        /// Print the tree snapshot instead of the descriptor.
        #[arg(long)]
        tree: bool,
        /// Also mount the result into this directory.
        #[arg(long)]
        into: Option<PathBuf>,
    },
    /// Mount a saved tree snapshot into a directory.
    Mount {
        /// Tree snapshot (JSON).
        tree: PathBuf,
        /// Target directory.
        #[arg(long)]
        into: PathBuf,
    },
    /// Build a project from a prompt against the generation backend.
    ///
    /// Follow-up prompts are read from stdin, one per line, until EOF.
    Build {
        /// Initial prompt describing the project.
        prompt: String,
    },
}

fn main() {
    logging::init();
    if let Err(err) = run() {
        eprintln!("{:#}", err);
        std::process::exit(exit_code_for(&err));
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Init { force } => cmd_init(&cli.config, force),
        Command::Parse { payload } => cmd_parse(&payload),
        Command::Project {
            payloads,
            tree,
            into,
        } => cmd_project(&payloads, tree, into.as_deref()),
        Command::Mount { tree, into } => cmd_mount(&tree, &into),
        Command::Build { prompt } => cmd_build(&cli.config, &prompt),
    }
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    if err.downcast_ref::<GenerationError>().is_some() {
        exit_codes::GENERATION_FAILED
    } else if err.downcast_ref::<MountError>().is_some() {
        exit_codes::MOUNT_FAILED
    } else {
        exit_codes::INVALID
    }
}

fn cmd_init(config_path: &Path, force: bool) -> Result<()> {
    if !force && config_path.exists() {
        return Ok(());
    }
    write_config(config_path, &ProjectorConfig::default())
        .with_context(|| format!("write {}", config_path.display()))?;
    println!("{}", config_path.display());
    Ok(())
}

fn cmd_parse(payload_path: &Path) -> Result<()> {
    let payload = read_payload(payload_path)?;
    print_json(&parse(&payload))
}

fn cmd_project(payloads: &[PathBuf], print_tree: bool, into: Option<&Path>) -> Result<()> {
    let mut session = BuildSession::new();
    for path in payloads {
        let payload = read_payload(path)?;
        session.ingest(&payload);
        if let Some(fold) = session.sync() {
            for conflict in &fold.conflicts {
                warn!(payload = %path.display(), %conflict, "file operation skipped");
            }
        }
    }

    if let Some(dir) = into {
        DirectorySandbox::new(dir)
            .mount(&session.descriptor())
            .map_err(|source| MountError { source })?;
    }

    if print_tree {
        print_json(&session.tree())
    } else {
        print_json(&session.descriptor())
    }
}

fn cmd_mount(tree_path: &Path, into: &Path) -> Result<()> {
    let tree = load_tree(tree_path)?;
    let sandbox = DirectorySandbox::new(into);
    sandbox
        .mount(&projector::core::mount::project(&tree))
        .map_err(|source| MountError { source })?;
    println!("mounted {} files into {}", count_files(&tree), into.display());
    Ok(())
}

fn cmd_build(config_path: &Path, prompt: &str) -> Result<()> {
    let cfg = load_config(config_path)?;
    let service = HttpGenerationService::new(
        &cfg.backend_url,
        Duration::from_secs(cfg.request_timeout_secs),
    )?;
    let mut orchestrator = Orchestrator::new(service);
    if let Some(log_dir) = &cfg.log_dir {
        orchestrator = orchestrator.with_round_log(log_dir);
    }
    orchestrator.attach_sandbox(DirectorySandbox::new(&cfg.sandbox_dir))?;

    // A failed chat round is reported and the next prompt retries; anything
    // else aborts.
    let mut last_error = None;
    match orchestrator.start(prompt) {
        Ok(outcome) => {
            report_round(&outcome.template);
            report_round(&outcome.chat);
        }
        Err(err) if orchestrator.session().template_set() && is_generation(&err) => {
            eprintln!("{:#}", err);
            last_error = Some(err);
        }
        Err(err) => return Err(err),
    }

    for line in std::io::stdin().lock().lines() {
        let line = line.context("read prompt from stdin")?;
        let follow_up = line.trim();
        if follow_up.is_empty() {
            continue;
        }
        match orchestrator.submit(follow_up) {
            Ok(outcome) => {
                report_round(&outcome);
                last_error = None;
            }
            Err(err) if is_generation(&err) => {
                eprintln!("{:#}", err);
                last_error = Some(err);
            }
            Err(err) => return Err(err),
        }
    }

    match last_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn is_generation(err: &anyhow::Error) -> bool {
    err.downcast_ref::<GenerationError>().is_some()
}

fn report_round(outcome: &RoundOutcome) {
    let kind = match outcome.kind {
        RoundKind::Template => "template",
        RoundKind::Chat => "chat",
    };
    println!(
        "round {} ({}): {} operations, {} files written, {} skipped{}",
        outcome.round,
        kind,
        outcome.operations_added,
        outcome.files_written.len(),
        outcome.conflicts.len(),
        if outcome.mounted { ", mounted" } else { "" }
    );
}

fn read_payload(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        return std::io::read_to_string(std::io::stdin()).context("read payload from stdin");
    }
    fs::read_to_string(path).with_context(|| format!("read payload {}", path.display()))
}

/// Serialize `value` to pretty-printed JSON on stdout.
fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let payload = serde_json::to_string_pretty(value).context("serialize json")?;
    println!("{payload}");
    Ok(())
}
