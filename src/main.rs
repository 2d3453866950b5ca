//! phyloprep - Alignment preparation for phylogenetics
//!
//! ## Usage
//!
//! ```bash
//! phyloprep process alignments/                  # keep structure, drop duplicates
//! phyloprep process alignments/ -r -s            # recursive, split into dna/ and protein/
//! phyloprep process alignments/ -o out/ --flat   # flatten into out/
//! phyloprep convert gene.nex -o gene.phy
//! phyloprep to-fasta gene.nex --strip-gaps --remove-duplicates
//! phyloprep merge a.fasta b.fasta -o merged.fasta
//! ```
//!
//! ## Input Formats
//!
//! - FASTA (.fasta, .fa, .fas)
//! - NEXUS (.nex, .nexus)

// Use jemalloc for better memory management (returns memory to OS)
#[cfg(not(windows))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use log::LevelFilter;

use phyloprep::formats::OUTPUT_EXTENSION;
use phyloprep::processor::{
    default_output_dir, log_path_for, merge_files, AlignmentProcessor, ProcessOptions,
};

/// Convert FASTA/NEXUS alignments to relaxed PHYLIP
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose", global = true)]
    verbose: bool,
}

/// Options shared by every command that writes sequences.
#[derive(ClapArgs, Debug, Clone, Copy)]
struct RecordArgs {
    /// Don't remove duplicate sequences
    #[arg(long = "keep-duplicates")]
    keep_duplicates: bool,

    /// Don't pad sequence names with spaces
    #[arg(long = "no-align-names")]
    no_align_names: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert every alignment in a directory to PHYLIP
    Process {
        /// Input directory containing alignment files (.fasta, .fa, .fas, .nexus, .nex)
        input_dir: PathBuf,

        /// Output directory (default: <input_dir>/../processed)
        #[arg(short = 'o', long = "output-dir")]
        output_dir: Option<PathBuf>,

        /// Process subdirectories recursively
        #[arg(short = 'r', long = "recursive")]
        recursive: bool,

        /// Split output into dna/ and protein/ subdirectories
        #[arg(short = 's', long = "split-by-type")]
        split_by_type: bool,

        /// Don't maintain directory structure, flatten all files to output root
        #[arg(long = "flat")]
        flat: bool,

        #[command(flatten)]
        records: RecordArgs,
    },

    /// Convert a single alignment to PHYLIP
    Convert {
        /// FASTA or NEXUS file
        file: PathBuf,

        /// Output file (default: input with .phy extension)
        #[arg(short = 'o', long = "output")]
        output: Option<PathBuf>,

        #[command(flatten)]
        records: RecordArgs,
    },

    /// Write an alignment as FASTA with cleaned names
    ToFasta {
        /// FASTA or NEXUS file
        file: PathBuf,

        /// Output file (default: input with .fasta extension)
        #[arg(short = 'o', long = "output")]
        output: Option<PathBuf>,

        /// Remove gap characters ('-') from sequences
        #[arg(long = "strip-gaps")]
        strip_gaps: bool,

        /// Remove duplicate sequences (kept by default)
        #[arg(long = "remove-duplicates")]
        remove_duplicates: bool,
    },

    /// Merge several files into one FASTA without duplicate sequences
    Merge {
        /// Input FASTA or NEXUS files
        #[arg(required = true, num_args = 1..)]
        files: Vec<PathBuf>,

        /// Output FASTA file
        #[arg(short = 'o', long = "output")]
        output: PathBuf,
    },
}

fn init_logging(verbose: bool) {
    let level = if verbose { LevelFilter::Info } else { LevelFilter::Warn };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn options(records: RecordArgs, verbose: bool) -> ProcessOptions {
    ProcessOptions {
        remove_duplicates: !records.keep_duplicates,
        align_names: !records.no_align_names,
        verbose,
        ..ProcessOptions::default()
    }
}

/// Runs `process`: converts a whole directory and prints a summary.
fn run_process(
    input_dir: &Path,
    output_dir: Option<PathBuf>,
    opts: ProcessOptions,
) -> Result<ExitCode> {
    if !input_dir.is_dir() {
        anyhow::bail!("Input directory {} does not exist", input_dir.display());
    }
    let output_dir = output_dir.unwrap_or_else(|| default_output_dir(input_dir));

    println!("Processing alignments from: {}", input_dir.display());
    println!("Output directory: {}", output_dir.display());
    if opts.recursive {
        println!("Mode: Recursive");
    }
    if opts.split_by_type {
        println!("Splitting by sequence type (dna/protein)");
    }
    println!();

    let processor = AlignmentProcessor::new(opts);
    let summary = processor.process_directory(input_dir, &output_dir)?;

    if summary.processed() == 0 {
        println!("No alignment files found in {}", input_dir.display());
        return Ok(ExitCode::SUCCESS);
    }

    let rule = "=".repeat(60);
    println!();
    println!("{}", rule);
    println!("Processing complete!");
    println!("  Successful: {}", summary.successful());
    println!("  Failed: {}", summary.failed());
    println!("  Duplicates removed: {}", summary.duplicates_removed());
    println!("  Log file: {}", log_path_for(&output_dir).display());
    println!("{}", rule);

    Ok(if summary.has_failures() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();
    init_logging(args.verbose);

    match args.command {
        Command::Process {
            input_dir,
            output_dir,
            recursive,
            split_by_type,
            flat,
            records,
        } => {
            let opts = ProcessOptions {
                recursive,
                split_by_type,
                keep_structure: !flat,
                ..options(records, args.verbose)
            };
            run_process(&input_dir, output_dir, opts)
        }

        Command::Convert { file, output, records } => {
            let output = output.unwrap_or_else(|| file.with_extension(OUTPUT_EXTENSION));
            let processor = AlignmentProcessor::new(options(records, args.verbose));
            let report = processor.process_file(&file, &output)?;
            eprintln!(
                "Wrote {} sequences to {} ({} duplicate(s) removed)",
                report.written,
                output.display(),
                report.removed.len()
            );
            Ok(ExitCode::SUCCESS)
        }

        Command::ToFasta {
            file,
            output,
            strip_gaps,
            remove_duplicates,
        } => {
            let output = output.unwrap_or_else(|| file.with_extension("fasta"));
            if output == file {
                anyhow::bail!(
                    "Refusing to overwrite input file {}; use -o/--output",
                    file.display()
                );
            }
            let processor = AlignmentProcessor::new(ProcessOptions {
                remove_duplicates,
                verbose: args.verbose,
                ..ProcessOptions::default()
            });
            let written = processor
                .export_fasta(&file, &output, strip_gaps)
                .with_context(|| format!("Failed to convert {}", file.display()))?;
            eprintln!("Wrote {} sequences to {}", written, output.display());
            Ok(ExitCode::SUCCESS)
        }

        Command::Merge { files, output } => {
            let processor = AlignmentProcessor::new(ProcessOptions {
                verbose: args.verbose,
                ..ProcessOptions::default()
            });
            let report = merge_files(&processor, &files, &output)?;
            eprintln!("Wrote {} sequences to {}", report.written, output.display());
            if !report.removed.is_empty() {
                println!("Removed duplicates:");
                for dup in &report.removed {
                    println!("File: {}, Header: {}", dup.source, dup.name);
                }
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}
