//! Compilation driver
//!
//! Walks a source directory, runs the front end and the analyzer over
//! every `.eproto` file, and (when the schemas are error-free) emits one
//! output file per input, rebased from the source root to the output
//! root. File handles are opened, read and closed in one scope; output
//! writes replace the whole file.

use crate::analyzer::Analyzer;
use crate::ast::Item;
use crate::diagnostics::DiagnosticBag;
use crate::emit::{self, Output};
use crate::genir::Strategy;
use crate::source::{FileId, SourceMap};
use crate::{lexer, parser, FILE_EXTENSION};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Driver-level failures. Schema errors are not errors in this sense;
/// they surface as diagnostics in the `Compilation`.
#[derive(Error, Debug)]
pub enum CompileError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("source directory {} does not exist", .0.display())]
    MissingSourceDir(PathBuf),
}

/// What to emit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GenMode {
    #[default]
    Native,
    Evolved,
    Zod,
    Skip,
}

/// Everything a compile run produced
pub struct Compilation {
    pub sources: SourceMap,
    pub analyzer: Analyzer,
    /// Parsed AST per file, for `--ast` dumps
    pub asts: Vec<(FileId, Vec<Item>)>,
    /// Front-end diagnostics (lexer + parser)
    pub parse_diagnostics: DiagnosticBag,
    pub outputs: Vec<Output>,
}

impl Compilation {
    pub fn has_errors(&self) -> bool {
        self.parse_diagnostics.has_errors() || self.analyzer.diagnostics().has_errors()
    }
}

/// Compile every `.eproto` file under `source_dir`.
pub fn compile_dir(source_dir: &Path, mode: GenMode) -> Result<Compilation, CompileError> {
    if !source_dir.is_dir() {
        return Err(CompileError::MissingSourceDir(source_dir.to_path_buf()));
    }

    let mut paths: Vec<PathBuf> = WalkDir::new(source_dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().map(|e| e == FILE_EXTENSION).unwrap_or(false))
        .collect();
    paths.sort();

    let mut sources = SourceMap::new();
    for path in &paths {
        let text = fs::read_to_string(path).map_err(|source| CompileError::Read {
            path: path.clone(),
            source,
        })?;
        let relative = path.strip_prefix(source_dir).unwrap_or(path);
        sources.insert(relative, &text);
    }

    Ok(compile_sources(sources, mode))
}

/// Compile an already-populated source map. The integration tests and
/// editor host enter here.
pub fn compile_sources(sources: SourceMap, mode: GenMode) -> Compilation {
    let mut parse_diagnostics = DiagnosticBag::new();
    let mut analyzer = Analyzer::new();
    let mut asts = Vec::new();

    for file in sources.iter() {
        let tokens = lexer::tokenize(file.id, &file.text, &mut parse_diagnostics);
        let items = parser::parse(file.id, &tokens, &file.text, &mut parse_diagnostics);
        analyzer.set_file(file.id, items.clone());
        asts.push((file.id, items));
    }
    analyzer.analyze();

    let has_errors =
        parse_diagnostics.has_errors() || analyzer.diagnostics().has_errors();
    let outputs = if has_errors {
        Vec::new()
    } else {
        match mode {
            GenMode::Native => emit::emit(analyzer.semantics(), &sources, Strategy::Native),
            GenMode::Evolved => emit::emit(analyzer.semantics(), &sources, Strategy::Evolved),
            GenMode::Zod => emit::emit_zod(analyzer.semantics(), &sources),
            GenMode::Skip => Vec::new(),
        }
    };

    Compilation {
        sources,
        analyzer,
        asts,
        parse_diagnostics,
        outputs,
    }
}

/// Write the outputs under `out_dir`, creating directories as needed.
pub fn write_outputs(out_dir: &Path, outputs: &[Output]) -> Result<(), CompileError> {
    for output in outputs {
        let path = out_dir.join(&output.path);
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| CompileError::Write {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }
        fs::write(&path, &output.contents).map_err(|source| CompileError::Write {
            path: path.clone(),
            source,
        })?;
    }
    Ok(())
}
