//! Command runners behind the `cstep` binary.
//!
//! Each runner takes already-parsed arguments plus the loaded [`Config`]
//! and returns the response value the binary prints. Runners never print;
//! logging goes through `tracing`.
//!
//! ## Error Handling
//!
//! Runners return `Result<_, CstepError>`. In a `rewrite` batch a failing
//! file does not stop the others: its error is written next to where its
//! outputs would have gone, and the batch as a whole reports
//! [`CstepError::BatchFailed`] once every file has been processed.

use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use cstep_core::config::Config;
use cstep_core::output::{
    ErrorResponse, FileOutcome, RenameResponse, RewriteResponse, ShowResponse, VerifyOutcome,
    VerifyResponse, SCHEMA_VERSION,
};
use cstep_core::CstepError;
use cstep_cparse::{parse_translation_unit, ParseTree, ParseTreePrinter};
use cstep_cst::visitor::rename;
use cstep_cst::{SourceTree, SourceTreePrinter};
use cstep_instrument::error_bridges::{cst_error, parse_error};
use cstep_instrument::{describe_plan, instrument, InstrumentOptions};

// ============================================================================
// Inputs
// ============================================================================

/// Expand `inputs` into the C files to process: files as given,
/// directories walked for `*.c`. Generated `.g.c` files are skipped.
pub fn collect_inputs(inputs: &[PathBuf], config: &Config) -> Result<Vec<PathBuf>, CstepError> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_file() {
            files.push(input.clone());
        } else if input.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(input)
                .into_iter()
                .filter_map(Result::ok)
                .filter(|e| e.file_type().is_file())
                .map(|e| e.into_path())
                .filter(|p| is_c_source(p, config))
                .collect();
            found.sort();
            debug!(dir = %input.display(), files = found.len(), "walked input directory");
            files.extend(found);
        } else {
            return Err(CstepError::file_not_found(input.display().to_string()));
        }
    }
    if files.is_empty() {
        return Err(CstepError::invalid_args("no C source files to process"));
    }
    Ok(files)
}

fn is_c_source(path: &Path, config: &Config) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    name.ends_with(".c") && !name.ends_with(&config.output.instrumented_suffix)
}

fn read_source(path: &Path) -> Result<String, CstepError> {
    if !path.is_file() {
        return Err(CstepError::file_not_found(path.display().to_string()));
    }
    Ok(fs::read_to_string(path)?)
}

/// Parse with the built-in frontend, or load a tree dumped by an
/// external one.
fn parse(path: &Path, source: &str, parse_tree: Option<&Path>) -> Result<ParseTree, CstepError> {
    let file = path.display().to_string();
    match parse_tree {
        Some(json) => {
            let text = read_source(json)?;
            ParseTree::from_json(&text).map_err(|e| parse_error(e).in_file(file))
        }
        None => parse_translation_unit(source).map_err(|e| parse_error(e).in_file(file)),
    }
}

fn stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("out")
        .to_string()
}

// ============================================================================
// Rewrite
// ============================================================================

/// Arguments of `cstep rewrite`.
#[derive(Debug, Clone, Default)]
pub struct RewriteArgs {
    pub inputs: Vec<PathBuf>,
    /// Directory for outputs; next to each input when absent.
    pub out_dir: Option<PathBuf>,
    /// Parse tree JSON to use instead of the built-in frontend.
    pub parse_tree: Option<PathBuf>,
    /// Return outputs in the response instead of writing files.
    pub stdout: bool,
}

/// Instrument every input, in parallel.
pub fn run_rewrite(config: &Config, args: &RewriteArgs) -> Result<RewriteResponse, CstepError> {
    let files = collect_inputs(&args.inputs, config)?;
    if args.parse_tree.is_some() && files.len() != 1 {
        return Err(CstepError::invalid_args(
            "--parse-tree requires exactly one input file",
        ));
    }
    if let Some(dir) = &args.out_dir {
        fs::create_dir_all(dir)?;
    }
    let options = InstrumentOptions::from(&config.instrument);
    info!(files = files.len(), "rewriting");

    let outcomes: Vec<FileOutcome> = files
        .par_iter()
        .map(|path| rewrite_file(path, config, &options, args))
        .collect();

    let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
    if failed > 0 {
        return Err(CstepError::BatchFailed {
            failed,
            total: outcomes.len(),
            details: serde_json::json!({ "files": serde_json::to_value(&outcomes)? }),
        });
    }
    Ok(RewriteResponse::new(outcomes))
}

fn output_dir(path: &Path, args: &RewriteArgs) -> PathBuf {
    match &args.out_dir {
        Some(dir) => dir.clone(),
        None => path.parent().map(Path::to_path_buf).unwrap_or_default(),
    }
}

fn rewrite_file(path: &Path, config: &Config, options: &InstrumentOptions, args: &RewriteArgs) -> FileOutcome {
    let input = path.display().to_string();
    match try_rewrite_file(path, config, options, args) {
        Ok(outcome) => outcome,
        Err(err) => {
            warn!(file = %input, error = %err, "instrumentation failed");
            if !args.stdout {
                let error_path = output_dir(path, args).join(format!("{}.error.json", stem(path)));
                let written = serde_json::to_string_pretty(&ErrorResponse::from_error(&err))
                    .map_err(CstepError::from)
                    .and_then(|json| fs::write(&error_path, json).map_err(CstepError::from));
                if let Err(write_err) = written {
                    warn!(path = %error_path.display(), error = %write_err, "could not write error file");
                }
            }
            FileOutcome::failed(input, &err)
        }
    }
}

fn try_rewrite_file(
    path: &Path,
    config: &Config,
    options: &InstrumentOptions,
    args: &RewriteArgs,
) -> Result<FileOutcome, CstepError> {
    let file = path.display().to_string();
    let source = read_source(path)?;
    let tree = parse(path, &source, args.parse_tree.as_deref())?;
    let result = instrument(&file, &source, tree, options).map_err(|e| CstepError::from(e).in_file(file.clone()))?;
    let events = result.metadata.notifications.len();
    let nodes = result.metadata.nodes.len();
    let document = result.metadata.to_json(config.output.pretty)?;

    let mut outcome = FileOutcome {
        input: file,
        status: "ok".to_string(),
        instrumented: None,
        metadata: None,
        events: Some(events),
        nodes: Some(nodes),
        instrumented_source: None,
        metadata_document: None,
        error: None,
    };
    if args.stdout {
        outcome.metadata_document = Some(serde_json::to_value(&result.metadata)?);
        outcome.instrumented_source = Some(result.source);
        return Ok(outcome);
    }

    let dir = output_dir(path, args);
    let name = stem(path);
    let instrumented = dir.join(format!("{}{}", name, config.output.instrumented_suffix));
    let metadata = dir.join(format!("{}{}", name, config.output.metadata_suffix));
    fs::write(&instrumented, &result.source)?;
    if let Err(err) = fs::write(&metadata, &document) {
        // Outputs are written together or not at all.
        let _ = fs::remove_file(&instrumented);
        return Err(err.into());
    }
    debug!(file = %outcome.input, events, nodes, "wrote outputs");
    outcome.instrumented = Some(instrumented.display().to_string());
    outcome.metadata = Some(metadata.display().to_string());
    Ok(outcome)
}

// ============================================================================
// Verify
// ============================================================================

/// Check that the CST of every input reproduces it byte for byte.
pub fn run_verify(config: &Config, inputs: &[PathBuf]) -> Result<VerifyResponse, CstepError> {
    let files = collect_inputs(inputs, config)?;
    let outcomes: Vec<VerifyOutcome> = files.par_iter().map(|path| verify_file(path)).collect();
    Ok(VerifyResponse::new(outcomes))
}

fn verify_file(path: &Path) -> VerifyOutcome {
    let file = path.display().to_string();
    let built = read_source(path).and_then(|source| {
        let tree = parse(path, &source, None)?;
        SourceTree::build(&source, tree).map_err(|e| cst_error(e).in_file(file.clone()))
    });
    match built {
        Ok(tree) => VerifyOutcome {
            file,
            round_trip: true,
            nodes: Some(tree.original_nodes().count()),
            error: None,
        },
        Err(err) => {
            warn!(file = %file, error = %err, "round-trip check failed");
            VerifyOutcome {
                file,
                round_trip: false,
                nodes: None,
                error: Some(cstep_core::output::ErrorInfo::from_error(&err)),
            }
        }
    }
}

// ============================================================================
// Show
// ============================================================================

/// Which dumps `cstep show` produces.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShowArgs {
    pub parse_tree: bool,
    pub source_tree: bool,
    pub modifications: bool,
    /// Print source tree nodes with `{n}` child placeholders.
    pub placeholders: bool,
}

/// Debug dumps of one file. With no dump selected, the source tree is
/// shown.
pub fn run_show(config: &Config, file: &Path, args: ShowArgs) -> Result<ShowResponse, CstepError> {
    let name = file.display().to_string();
    let source = read_source(file)?;
    let parse_tree = parse(file, &source, None)?;
    let source_tree_wanted = args.source_tree || args.placeholders || !(args.parse_tree || args.modifications);

    let parse_dump = args
        .parse_tree
        .then(|| ParseTreePrinter::new(&parse_tree, &source).print());
    let source_dump = if source_tree_wanted {
        let tree = SourceTree::build(&source, parse_tree.clone()).map_err(|e| cst_error(e).in_file(name.clone()))?;
        let printer = if args.placeholders {
            SourceTreePrinter::with_placeholders()
        } else {
            SourceTreePrinter::new()
        };
        Some(printer.print(&tree, tree.root()))
    } else {
        None
    };
    let modifications = if args.modifications {
        let options = InstrumentOptions::from(&config.instrument);
        Some(describe_plan(&source, parse_tree, &options).map_err(|e| CstepError::from(e).in_file(name.clone()))?)
    } else {
        None
    };

    Ok(ShowResponse {
        status: "ok".to_string(),
        schema_version: SCHEMA_VERSION.to_string(),
        file: name,
        parse_tree: parse_dump,
        source_tree: source_dump,
        modifications,
    })
}

// ============================================================================
// Rename
// ============================================================================

fn validate_identifier(name: &str) -> Result<(), CstepError> {
    let mut chars = name.chars();
    let valid_start = chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if !valid_start || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(CstepError::invalid_args(format!("'{}' is not a C identifier", name)));
    }
    if cstep_cparse::lexer::is_keyword(name) {
        return Err(CstepError::invalid_args(format!("'{}' is a C keyword", name)));
    }
    Ok(())
}

/// Rename every variable and parameter named `from` in `file`.
pub fn run_rename(file: &Path, from: &str, to: &str, write: bool) -> Result<RenameResponse, CstepError> {
    validate_identifier(from)?;
    validate_identifier(to)?;
    let name = file.display().to_string();
    let source = read_source(file)?;
    let parse_tree = parse(file, &source, None)?;
    let mut tree = SourceTree::build(&source, parse_tree).map_err(|e| cst_error(e).in_file(name.clone()))?;
    let outcome = rename(&mut tree, from, to).map_err(cst_error)?;
    info!(file = %name, from, to, replaced = outcome.renamed, "renamed");

    let written = write && outcome.renamed > 0;
    if written {
        fs::write(file, &outcome.text)?;
    }
    Ok(RenameResponse {
        status: "ok".to_string(),
        schema_version: SCHEMA_VERSION.to_string(),
        file: name,
        from: from.to_string(),
        to: to.to_string(),
        replacements: outcome.renamed,
        written,
        source: (!write).then_some(outcome.text),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_are_validated() {
        assert!(validate_identifier("count_2").is_ok());
        assert!(validate_identifier("_x").is_ok());
        assert!(validate_identifier("2x").is_err());
        assert!(validate_identifier("a-b").is_err());
        assert!(validate_identifier("while").is_err());
        assert!(validate_identifier("").is_err());
    }

    #[test]
    fn generated_files_are_not_inputs() {
        let config = Config::default();
        assert!(is_c_source(Path::new("dir/prog.c"), &config));
        assert!(!is_c_source(Path::new("dir/prog.g.c"), &config));
        assert!(!is_c_source(Path::new("dir/prog.h"), &config));
    }

    #[test]
    fn missing_inputs_are_resolution_errors() {
        let err = collect_inputs(&[PathBuf::from("/nonexistent/cstep/input.c")], &Config::default()).unwrap_err();
        assert_eq!(err.error_code().code(), 3);
    }
}
