// src/main.rs
mod commands;
mod prompt;
mod sections;
mod storage;
mod utils;
mod vcs;

use clap::{Parser, Subcommand};
use commands::App;
use prompt::PromptKind;
use sections::{SectionMap, SectionOrigin};
use std::path::PathBuf;
use storage::Workspace;
use utils::AppError;
use vcs::{Checkpoint, GitCli, NoCheckpoint};

/// Split a large Pine Script into named sections, edit them in isolation and
/// merge them back into the working copy.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Workspace directory holding the working copy, sections and backups
    #[arg(short, long, global = true, env = "PINE_SECTIONS_ROOT", default_value = ".")]
    root: PathBuf,

    /// Do not record changes with git
    #[arg(long, global = true, env = "PINE_SECTIONS_NO_GIT")]
    no_git: bool,

    /// More log output (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Initialize the workspace from a script
    Init {
        /// Script to manage
        script: PathBuf,
    },
    /// List the sections of the working script
    List,
    /// Copy a section to optimized/ for editing
    Extract {
        /// Section name, or any case-insensitive part of it
        section: String,
    },
    /// Merge an edited section file back into the working script
    Apply {
        /// Edited section file; its name must contain the section's file name
        file: PathBuf,

        /// Apply even if the working script changed since the section was stored
        #[arg(long)]
        force: bool,
    },
    /// Rewrite every section file from the working script
    Sync,
    /// Run structural checks on the working script
    Validate {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Generate a review prompt for a section
    Prompt {
        section: String,
    },
    /// Generate an optimization prompt for a section
    Optimize {
        section: String,

        /// What the optimization should achieve
        description: String,
    },
}

fn print_sections(map: &SectionMap) {
    for span in map.spans() {
        let label = if span.origin == SectionOrigin::Preamble { "(preamble)" } else { span.name.as_str() };
        println!("{:<40} {:>8}..{:<8} {:>5} lines", label, span.start, span.end, span.line_count());
    }
    let missing: Vec<&str> = map.placeholders().map(|s| s.name.as_str()).collect();
    if !missing.is_empty() {
        println!("\nNot defined in the script: {}", missing.join(", "));
    }
}

fn main() -> Result<(), AppError> {
    // 1. Parse CLI Arguments
    let args = Args::parse();

    // 2. Setup Logging (reads RUST_LOG env var)
    utils::logging::setup_logging(args.verbose);
    tracing::debug!("Starting with args: {:?}", args);

    // 3. Pick how changes are recorded
    let vcs: Box<dyn Checkpoint> = if args.no_git {
        Box::new(NoCheckpoint)
    } else {
        Box::new(GitCli)
    };

    // 4. Open the workspace
    let workspace = Workspace::new(&args.root)?;
    let app = App::new(workspace, vcs.as_ref());

    // 5. Dispatch
    match args.command {
        Command::Init { script } => {
            let summary = app.init(&script)?;
            println!("Initialized workspace from '{}'", script.display());
            println!("- Original saved as: {}", summary.original.display());
            println!("- Working copy: {}", summary.working.display());
            println!("- Backup: {}", summary.backup.display());
            println!("- Wrote {} sections to '{}/'", summary.sections_written, storage::SECTIONS_DIR);
        }
        Command::List => {
            let map = app.list()?;
            print_sections(&map);
        }
        Command::Extract { section } => {
            let (name, copy) = app.extract(&section)?;
            println!("Extracted section '{}' to: {}", name, copy.display());
        }
        Command::Apply { file, force } => {
            let summary = app.apply(&file, force)?;
            println!(
                "Applied '{}' to section '{}' ({:+} bytes, backup: {})",
                file.display(),
                summary.section_name,
                summary.delta,
                summary.backup.display()
            );
            if !summary.new_sections.is_empty() {
                println!("New sections registered: {}", summary.new_sections.join(", "));
            }
        }
        Command::Sync => {
            let summary = app.sync()?;
            println!("Rewrote {} section files", summary.sections_written);
            if !summary.new_sections.is_empty() {
                println!("New sections registered: {}", summary.new_sections.join(", "));
            }
        }
        Command::Validate { json } => {
            let report = app.validate()?;
            if json {
                let out = serde_json::to_string_pretty(&report)
                    .map_err(|e| AppError::Config(format!("Could not serialize report: {e}")))?;
                println!("{out}");
            } else {
                println!("Script validation results:");
                for (name, ok) in report.checks() {
                    println!("- {:<24} {}", name, ok);
                }
                println!("- {:<24} {} ({} including placeholders)", "section_count", report.section_count, report.total_sections);
                if report.malformed_headers > 0 {
                    println!("- {:<24} {}", "malformed_headers", report.malformed_headers);
                }
                if !report.duplicate_sections.is_empty() {
                    println!("- {:<24} {}", "duplicate_sections", report.duplicate_sections.join(", "));
                }
                println!("\nSHA-256: {}", report.checksum);
            }
            if !report.is_valid() {
                return Err(AppError::Validation(format!(
                    "critical checks failed: {}",
                    report.failed_critical().join(", ")
                )));
            }
        }
        Command::Prompt { section } => {
            let summary = app.prompt(&section, PromptKind::Assistance)?;
            println!("{}", summary.prompt);
            println!("Saved prompt for '{}' to: {}", summary.section_name, summary.saved_to.display());
        }
        Command::Optimize { section, description } => {
            let summary = app.prompt(&section, PromptKind::Optimization { description })?;
            println!("{}", summary.prompt);
            println!("Saved prompt for '{}' to: {}", summary.section_name, summary.saved_to.display());
        }
    }

    Ok(())
}
