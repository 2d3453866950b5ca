//! Batch conversion of alignment directories.
//!
//! A run discovers every FASTA/NEXUS file under an input directory, converts
//! each one to relaxed PHYLIP and finally writes a single processing log
//! next to the output directory. Files are handled one at a time, in sorted
//! path order; a failing file is recorded and the run moves on.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use thiserror::Error;
use walkdir::WalkDir;

use crate::classify::sequence_type_of;
use crate::dedup::{merge_unique, remove_duplicates, MergeDuplicate};
use crate::formats::fasta::{write_fasta, FastaError};
use crate::formats::nexus::NexusError;
use crate::formats::phylip::{write_phylip, PhylipError};
use crate::formats::{self, has_input_extension, FileFormat, ParseError, OUTPUT_EXTENSION};
use crate::model::{Alignment, SequenceType};

/// Name of the run log, written in the parent of the output directory.
pub const LOG_FILE_NAME: &str = "processing_log.txt";

const LOG_RULE_WIDTH: usize = 80;

/// Switches for a conversion run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessOptions {
    /// Drop records whose sequence repeats an earlier one
    pub remove_duplicates: bool,
    /// Pad names so sequences start in one column
    pub align_names: bool,
    /// Descend into subdirectories
    pub recursive: bool,
    /// Route output into `dna/` and `protein/`
    pub split_by_type: bool,
    /// Mirror the input tree instead of flattening
    pub keep_structure: bool,
    /// Echo each converted file
    pub verbose: bool,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            remove_duplicates: true,
            align_names: true,
            recursive: false,
            split_by_type: false,
            keep_structure: true,
            verbose: false,
        }
    }
}

/// Errors raised while processing.
///
/// Everything except [`ProcessError::InvalidInputDir`] and
/// [`ProcessError::WriteLog`] is scoped to a single file.
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Error reading {file}: {source}")]
    Read { file: String, source: io::Error },

    #[error("Error parsing {file}: {source}")]
    Parse { file: String, source: NexusError },

    #[error("No sequences found in {file}")]
    NoSequences { file: String },

    #[error("Error writing {file}: {source}")]
    Write { file: String, source: PhylipError },

    #[error("Error writing {file}: {source}")]
    WriteFasta { file: String, source: FastaError },

    #[error("{} is not a valid directory", .0.display())]
    InvalidInputDir(PathBuf),

    #[error("Failed to write processing log {}: {source}", path.display())]
    WriteLog { path: PathBuf, source: io::Error },
}

/// Details of one successfully converted file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    /// Parser that read the file
    pub format: FileFormat,
    /// Routing decision, present only when splitting by type
    pub sequence_type: Option<SequenceType>,
    /// Records written
    pub written: usize,
    /// Names dropped as duplicates, in encounter order
    pub removed: Vec<String>,
    /// Names that appeared on more than one record
    pub collisions: Vec<String>,
}

/// What happened to one input file.
#[derive(Debug)]
pub struct FileOutcome {
    pub input: PathBuf,
    /// Destination, known once the file has been read
    pub output: Option<PathBuf>,
    pub result: Result<FileReport, ProcessError>,
}

impl FileOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// Duplicates removed from this file (0 on failure).
    pub fn duplicates_removed(&self) -> usize {
        self.result.as_ref().map_or(0, |report| report.removed.len())
    }

    /// Text block for the processing log.
    pub fn log_message(&self) -> String {
        let report = match &self.result {
            Ok(report) => report,
            Err(err) => return err.to_string(),
        };

        let mut msg = format!("Processing {} ({}):\n", display_name(&self.input), report.format);
        if let Some(seq_type) = report.sequence_type {
            msg.push_str(&format!("  Sequence type: {}\n", seq_type));
        }
        for name in &report.collisions {
            msg.push_str(&format!(
                "  Name collision: '{}' used by more than one record, last one kept\n",
                name
            ));
        }
        if report.removed.is_empty() {
            msg.push_str("  No duplicate sequences found\n");
        } else {
            msg.push_str(&format!(
                "  Removed {} duplicate sequence(s):\n",
                report.removed.len()
            ));
            for name in &report.removed {
                msg.push_str(&format!("    - {}\n", name));
            }
        }
        let output_name = self.output.as_deref().map(display_name).unwrap_or_default();
        msg.push_str(&format!(
            "  Converted {} sequence(s) to PHYLIP: {}\n",
            report.written, output_name
        ));
        msg
    }
}

/// Outcome of a whole directory run.
#[derive(Debug)]
pub struct RunSummary {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub generated: DateTime<Local>,
    /// One entry per discovered file, in processing order
    pub outcomes: Vec<FileOutcome>,
}

impl RunSummary {
    pub fn processed(&self) -> usize {
        self.outcomes.len()
    }

    pub fn successful(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.processed() - self.successful()
    }

    pub fn duplicates_removed(&self) -> usize {
        self.outcomes.iter().map(FileOutcome::duplicates_removed).sum()
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    /// Where the processing log goes.
    pub fn log_path(&self) -> PathBuf {
        log_path_for(&self.output_dir)
    }

    /// Renders the complete processing log.
    pub fn render_log(&self) -> String {
        let mut log = String::from("Alignment Processing Log\n");
        log.push_str(&format!("Generated: {}\n", self.generated.format("%Y-%m-%d %H:%M:%S")));
        log.push_str(&format!("Input directory: {}\n", self.input_dir.display()));
        log.push_str(&format!("Output directory: {}\n", self.output_dir.display()));
        log.push_str(&format!("Processed: {} files\n", self.processed()));
        log.push_str(&format!("Successful: {}\n", self.successful()));
        log.push_str(&format!("Failed: {}\n", self.failed()));
        log.push_str(&format!("Duplicates removed: {}\n", self.duplicates_removed()));
        log.push_str(&"=".repeat(LOG_RULE_WIDTH));
        log.push_str("\n\n");

        let entries: Vec<String> = self.outcomes.iter().map(FileOutcome::log_message).collect();
        log.push_str(&entries.join("\n"));
        log
    }

    /// Writes the processing log, replacing any previous one.
    pub fn write_log(&self) -> Result<PathBuf, ProcessError> {
        let path = self.log_path();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| ProcessError::WriteLog {
                path: path.clone(),
                source,
            })?;
        }
        fs::write(&path, self.render_log()).map_err(|source| ProcessError::WriteLog {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}

/// Processing log location for an output directory: its parent directory.
pub fn log_path_for(output_dir: &Path) -> PathBuf {
    output_dir
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join(LOG_FILE_NAME)
}

/// Default output directory: `processed` next to the input directory.
pub fn default_output_dir(input_dir: &Path) -> PathBuf {
    input_dir
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join("processed")
}

/// Lists alignment files under `input_dir`, sorted by path.
///
/// Unreadable entries are skipped with a warning.
pub fn discover_files(input_dir: &Path, recursive: bool) -> Vec<PathBuf> {
    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut files: Vec<PathBuf> = WalkDir::new(input_dir)
        .min_depth(1)
        .max_depth(max_depth)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                log::warn!("Skipping unreadable entry: {}", err);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && has_input_extension(entry.path()))
        .map(|entry| entry.into_path())
        .collect();
    files.sort();
    files
}

/// Output path for one input file.
///
/// The path is relative to `input_dir` when keeping structure, the bare file
/// name otherwise; a type directory is prepended when `seq_type` is given;
/// the extension becomes `.phy`.
pub fn output_path_for(
    input: &Path,
    input_dir: &Path,
    output_dir: &Path,
    keep_structure: bool,
    seq_type: Option<SequenceType>,
) -> PathBuf {
    let relative = if keep_structure {
        input.strip_prefix(input_dir).ok()
    } else {
        None
    };
    let relative = relative
        .map(Path::to_path_buf)
        .or_else(|| input.file_name().map(PathBuf::from))
        .unwrap_or_default();

    let mut output = output_dir.to_path_buf();
    if let Some(seq_type) = seq_type {
        output.push(seq_type.dir_name());
    }
    output.push(relative.with_extension(OUTPUT_EXTENSION));
    output
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Converts alignment files to relaxed PHYLIP.
#[derive(Debug, Clone, Default)]
pub struct AlignmentProcessor {
    options: ProcessOptions,
}

impl AlignmentProcessor {
    pub fn new(options: ProcessOptions) -> Self {
        Self { options }
    }

    /// Reads and parses one file. An empty result is an error.
    pub fn load(&self, input: &Path) -> Result<(Alignment, FileFormat), ProcessError> {
        let file = display_name(input);
        let (alignment, format) = formats::parse_file(input).map_err(|err| match err {
            ParseError::IoError(source) => ProcessError::Read {
                file: file.clone(),
                source,
            },
            ParseError::NexusError(source) => ProcessError::Parse {
                file: file.clone(),
                source,
            },
        })?;

        if alignment.is_empty() {
            return Err(ProcessError::NoSequences { file });
        }
        for name in alignment.collisions() {
            log::warn!("{}: name '{}' used by more than one record", file, name);
        }
        Ok((alignment, format))
    }

    /// Converts one file to `output`.
    pub fn process_file(&self, input: &Path, output: &Path) -> Result<FileReport, ProcessError> {
        let (alignment, format) = self.load(input)?;
        self.write_converted(&alignment, format, output, None)
    }

    /// Deduplicates (if enabled) and writes an already parsed alignment.
    fn write_converted(
        &self,
        alignment: &Alignment,
        format: FileFormat,
        output: &Path,
        sequence_type: Option<SequenceType>,
    ) -> Result<FileReport, ProcessError> {
        let (kept, removed) = if self.options.remove_duplicates {
            let deduped = remove_duplicates(alignment);
            (deduped.kept, deduped.removed)
        } else {
            (alignment.clone(), Vec::new())
        };

        write_phylip(&kept, output, self.options.align_names).map_err(|source| {
            ProcessError::Write {
                file: display_name(output),
                source,
            }
        })?;

        log::info!(
            "Wrote {} sequence(s) to {} ({} duplicate(s) removed)",
            kept.sequence_count(),
            output.display(),
            removed.len()
        );

        Ok(FileReport {
            format,
            sequence_type,
            written: kept.sequence_count(),
            removed,
            collisions: alignment.collisions().to_vec(),
        })
    }

    /// Runs the whole pipeline for one discovered file.
    fn process_entry(&self, input: &Path, input_dir: &Path, output_dir: &Path) -> FileOutcome {
        let (alignment, format) = match self.load(input) {
            Ok(loaded) => loaded,
            Err(err) => {
                return FileOutcome {
                    input: input.to_path_buf(),
                    output: None,
                    result: Err(err),
                }
            }
        };

        let sequence_type = self
            .options
            .split_by_type
            .then(|| sequence_type_of(input, &alignment));
        let output = output_path_for(
            input,
            input_dir,
            output_dir,
            self.options.keep_structure,
            sequence_type,
        );
        let result = self.write_converted(&alignment, format, &output, sequence_type);

        FileOutcome {
            input: input.to_path_buf(),
            output: Some(output),
            result,
        }
    }

    /// Converts every alignment file under `input_dir` into `output_dir`.
    ///
    /// Only an invalid input directory (checked before anything is touched)
    /// or a failure to write the log aborts the run. The log is written
    /// only if at least one file was found.
    pub fn process_directory(
        &self,
        input_dir: &Path,
        output_dir: &Path,
    ) -> Result<RunSummary, ProcessError> {
        if !input_dir.is_dir() {
            return Err(ProcessError::InvalidInputDir(input_dir.to_path_buf()));
        }

        let files = discover_files(input_dir, self.options.recursive);
        log::info!("Found {} alignment file(s) in {}", files.len(), input_dir.display());

        let mut summary = RunSummary {
            input_dir: input_dir.to_path_buf(),
            output_dir: output_dir.to_path_buf(),
            generated: Local::now(),
            outcomes: Vec::with_capacity(files.len()),
        };
        if files.is_empty() {
            return Ok(summary);
        }

        let echo_root = output_dir.parent().unwrap_or(output_dir);
        for input in &files {
            let outcome = self.process_entry(input, input_dir, output_dir);
            match (&outcome.result, &outcome.output) {
                (Ok(_), Some(output)) if self.options.verbose => {
                    let shown = output.strip_prefix(echo_root).unwrap_or(output);
                    println!("✓ {} -> {}", display_name(input), shown.display());
                }
                (Err(err), _) => {
                    eprintln!("✗ {}: {}", display_name(input), err);
                }
                _ => {}
            }
            summary.outcomes.push(outcome);
        }

        summary.generated = Local::now();
        summary.write_log()?;
        Ok(summary)
    }

    /// Writes one file as FASTA with sanitized names.
    pub fn export_fasta(
        &self,
        input: &Path,
        output: &Path,
        strip_gaps: bool,
    ) -> Result<usize, ProcessError> {
        let (alignment, _) = self.load(input)?;
        let alignment = if self.options.remove_duplicates {
            remove_duplicates(&alignment).kept
        } else {
            alignment
        };
        write_fasta(&alignment, output, strip_gaps).map_err(|source| ProcessError::WriteFasta {
            file: display_name(output),
            source,
        })?;
        Ok(alignment.sequence_count())
    }
}

/// Result of [`merge_files`].
#[derive(Debug)]
pub struct MergeReport {
    pub written: usize,
    pub removed: Vec<MergeDuplicate>,
}

/// Merges several files into one FASTA, dropping any sequence already seen
/// in an earlier record of any input.
pub fn merge_files(
    processor: &AlignmentProcessor,
    inputs: &[PathBuf],
    output: &Path,
) -> Result<MergeReport, ProcessError> {
    let mut loaded = Vec::with_capacity(inputs.len());
    for input in inputs {
        let (alignment, _) = processor.load(input)?;
        loaded.push((input.display().to_string(), alignment));
    }

    let merged = merge_unique(loaded.iter().map(|(label, aln)| (label.as_str(), aln)));
    write_fasta(&merged.kept, output, false).map_err(|source| ProcessError::WriteFasta {
        file: display_name(output),
        source,
    })?;

    Ok(MergeReport {
        written: merged.kept.sequence_count(),
        removed: merged.removed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, rel: &str, content: &str) -> PathBuf {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_default_options() {
        let opts = ProcessOptions::default();
        assert!(opts.remove_duplicates);
        assert!(opts.align_names);
        assert!(opts.keep_structure);
        assert!(!opts.recursive);
        assert!(!opts.split_by_type);
        assert!(!opts.verbose);
    }

    #[test]
    fn test_output_path_keep_structure() {
        let out = output_path_for(
            Path::new("in/sub/gene.fasta"),
            Path::new("in"),
            Path::new("out"),
            true,
            None,
        );
        assert_eq!(out, PathBuf::from("out/sub/gene.phy"));
    }

    #[test]
    fn test_output_path_flat_with_type() {
        let out = output_path_for(
            Path::new("in/sub/gene.v2.nex"),
            Path::new("in"),
            Path::new("out"),
            false,
            Some(SequenceType::Dna),
        );
        assert_eq!(out, PathBuf::from("out/dna/gene.v2.phy"));
    }

    #[test]
    fn test_output_path_structure_with_type() {
        let out = output_path_for(
            Path::new("in/a/b.fa"),
            Path::new("in"),
            Path::new("out"),
            true,
            Some(SequenceType::Protein),
        );
        assert_eq!(out, PathBuf::from("out/protein/a/b.phy"));
    }

    #[test]
    fn test_log_path_and_default_output() {
        assert_eq!(
            log_path_for(Path::new("/data/processed")),
            PathBuf::from("/data/processing_log.txt")
        );
        assert_eq!(default_output_dir(Path::new("/data/raw")), PathBuf::from("/data/processed"));
    }

    #[test]
    fn test_discover_files_filters_and_sorts() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "b.fasta", ">x\nA\n");
        write(dir.path(), "a.nex", "#NEXUS\n");
        write(dir.path(), "notes.txt", "");
        write(dir.path(), "old.phy", "");
        write(dir.path(), "sub/c.fa", ">x\nA\n");

        let names = |files: Vec<PathBuf>| -> Vec<String> {
            files
                .iter()
                .map(|p| p.strip_prefix(dir.path()).unwrap().display().to_string())
                .collect()
        };

        assert_eq!(names(discover_files(dir.path(), false)), vec!["a.nex", "b.fasta"]);
        let recursive = names(discover_files(dir.path(), true));
        assert_eq!(recursive.len(), 3);
        assert!(recursive.contains(&Path::new("sub").join("c.fa").display().to_string()));
    }

    #[test]
    fn test_process_file_reports_duplicates() {
        let dir = TempDir::new().unwrap();
        let input = write(dir.path(), "x.fasta", ">a\nACGT\n>b\nACGT\n>c\nTTTT\n");
        let output = dir.path().join("x.phy");

        let report = AlignmentProcessor::default().process_file(&input, &output).unwrap();
        assert_eq!(report.format, FileFormat::Fasta);
        assert_eq!(report.written, 2);
        assert_eq!(report.removed, vec!["b".to_string()]);
        assert_eq!(fs::read_to_string(&output).unwrap(), "2 4\na  ACGT\nc  TTTT\n");
    }

    #[test]
    fn test_keep_duplicates_and_plain_names() {
        let dir = TempDir::new().unwrap();
        let input = write(dir.path(), "x.fasta", ">a\nACGT\n>bb\nACGT\n");
        let output = dir.path().join("x.phy");
        let processor = AlignmentProcessor::new(ProcessOptions {
            remove_duplicates: false,
            align_names: false,
            ..ProcessOptions::default()
        });

        let report = processor.process_file(&input, &output).unwrap();
        assert!(report.removed.is_empty());
        assert_eq!(fs::read_to_string(&output).unwrap(), "2 4\na ACGT\nbb ACGT\n");
    }

    #[test]
    fn test_process_file_errors() {
        let dir = TempDir::new().unwrap();
        let processor = AlignmentProcessor::default();
        let out = dir.path().join("o.phy");

        let nexus = write(dir.path(), "bad.nex", "#NEXUS\nBEGIN TAXA;\nEND;\n");
        let err = processor.process_file(&nexus, &out).unwrap_err();
        assert_eq!(err.to_string(), "Error parsing bad.nex: No MATRIX block found in NEXUS file");

        let empty = write(dir.path(), "empty.fasta", "ACGT\n");
        let err = processor.process_file(&empty, &out).unwrap_err();
        assert_eq!(err.to_string(), "No sequences found in empty.fasta");

        let ragged = write(dir.path(), "ragged.fa", ">a\nACGT\n>b\nAC\n");
        let err = processor.process_file(&ragged, &out).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Error writing o.phy: Sequences have different lengths: {2, 4}"
        );
        assert!(!out.exists());

        let err = processor.process_file(&dir.path().join("missing.fa"), &out).unwrap_err();
        assert!(matches!(err, ProcessError::Read { .. }));
    }

    #[test]
    fn test_log_message_success() {
        let outcome = FileOutcome {
            input: PathBuf::from("in/x.fasta"),
            output: Some(PathBuf::from("out/dna/x.phy")),
            result: Ok(FileReport {
                format: FileFormat::Fasta,
                sequence_type: Some(SequenceType::Dna),
                written: 2,
                removed: vec!["dup".to_string()],
                collisions: Vec::new(),
            }),
        };
        assert_eq!(
            outcome.log_message(),
            concat!(
                "Processing x.fasta (FASTA):\n",
                "  Sequence type: dna\n",
                "  Removed 1 duplicate sequence(s):\n",
                "    - dup\n",
                "  Converted 2 sequence(s) to PHYLIP: x.phy\n",
            )
        );
        assert_eq!(outcome.duplicates_removed(), 1);
    }

    #[test]
    fn test_process_directory_invalid_root() {
        let dir = TempDir::new().unwrap();
        let result = AlignmentProcessor::default()
            .process_directory(&dir.path().join("nope"), &dir.path().join("out"));
        assert!(matches!(result, Err(ProcessError::InvalidInputDir(_))));
        assert!(!dir.path().join(LOG_FILE_NAME).exists());
    }

    #[test]
    fn test_process_directory_without_files_writes_no_log() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in");
        fs::create_dir(&input).unwrap();

        let summary = AlignmentProcessor::default()
            .process_directory(&input, &dir.path().join("out"))
            .unwrap();
        assert_eq!(summary.processed(), 0);
        assert!(!summary.has_failures());
        assert!(!dir.path().join(LOG_FILE_NAME).exists());
    }

    #[test]
    fn test_export_fasta_strips_gaps() {
        let dir = TempDir::new().unwrap();
        let input = write(dir.path(), "x.nex", "#NEXUS\nMATRIX\nsp one AC-GT\nsp2 A--GT\n;\n");
        let output = dir.path().join("x.fasta");

        let written = AlignmentProcessor::default()
            .export_fasta(&input, &output, true)
            .unwrap();
        assert_eq!(written, 2);
        assert_eq!(fs::read_to_string(&output).unwrap(), ">sp_one\nACGT\n>sp2\nAGT\n");
    }

    #[test]
    fn test_export_fasta_duplicates_follow_options() {
        let dir = TempDir::new().unwrap();
        let input = write(dir.path(), "x.fa", ">a\nACGT\n>b\nACGT\n>c\nTTTT\n");
        let output = dir.path().join("out.fasta");

        let keep = AlignmentProcessor::new(ProcessOptions {
            remove_duplicates: false,
            ..ProcessOptions::default()
        });
        assert_eq!(keep.export_fasta(&input, &output, false).unwrap(), 3);
        assert_eq!(
            fs::read_to_string(&output).unwrap(),
            ">a\nACGT\n>b\nACGT\n>c\nTTTT\n"
        );

        let written = AlignmentProcessor::default()
            .export_fasta(&input, &output, false)
            .unwrap();
        assert_eq!(written, 2);
    }

    #[test]
    fn test_merge_files() {
        let dir = TempDir::new().unwrap();
        let first = write(dir.path(), "1.fa", ">a\nAAAA\n>b\nCCCC\n");
        let second = write(dir.path(), "2.nex", "#NEXUS\nMATRIX\nc CCCC\nd GGGG\n;\n");
        let output = dir.path().join("merged.fasta");

        let inputs = [first, second.clone()];
        let report = merge_files(&AlignmentProcessor::default(), &inputs, &output).unwrap();
        assert_eq!(report.written, 3);
        assert_eq!(report.removed.len(), 1);
        assert_eq!(report.removed[0].name, "c");
        assert_eq!(report.removed[0].source, second.display().to_string());
        assert_eq!(
            fs::read_to_string(&output).unwrap(),
            ">a\nAAAA\n>b\nCCCC\n>d\nGGGG\n"
        );
    }
}
