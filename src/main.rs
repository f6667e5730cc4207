//! The eproto compiler CLI
//!
//! `eprotoc` compiles a directory of `.eproto` schemas into TypeScript
//! serialization code and RPC descriptors (or zod validation schemas).

use clap::{Parser, ValueEnum};
use eproto::diagnostics::Diagnostic;
use eproto::driver::{self, Compilation, GenMode};
use eproto::source::SourceMap;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "eprotoc")]
#[command(version = eproto::VERSION)]
#[command(about = "The eproto schema compiler", long_about = None)]
struct Cli {
    /// Directory containing .eproto source files
    #[arg(value_name = "SOURCE_DIR")]
    source_dir: PathBuf,

    /// Dump resolved definitions as JSON (to stdout when no file given)
    #[arg(
        short = 'd',
        long = "definitions",
        value_name = "FILE",
        num_args = 0..=1,
        default_missing_value = "-"
    )]
    definitions: Option<String>,

    /// Dump the parsed AST as JSON (to stdout when no file given)
    #[arg(
        short = 'a',
        long = "ast",
        value_name = "FILE",
        num_args = 0..=1,
        default_missing_value = "-"
    )]
    ast: Option<String>,

    /// Output root directory
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    output: PathBuf,

    /// Emitter selection
    #[arg(short, long, value_enum, default_value = "native")]
    gen: Gen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Gen {
    Native,
    Evolved,
    Zod,
    Skip,
}

impl From<Gen> for GenMode {
    fn from(gen: Gen) -> Self {
        match gen {
            Gen::Native => GenMode::Native,
            Gen::Evolved => GenMode::Evolved,
            Gen::Zod => GenMode::Zod,
            Gen::Skip => GenMode::Skip,
        }
    }
}

#[derive(Serialize)]
struct AstDump<'a> {
    file: &'a Path,
    items: &'a [eproto::ast::Item],
}

fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    let compilation = driver::compile_dir(&cli.source_dir, cli.gen.into())
        .map_err(|e| miette::miette!("{}", e))?;

    if let Some(target) = &cli.definitions {
        let json = serde_json::to_string_pretty(compilation.analyzer.semantics())
            .map_err(|e| miette::miette!("failed to serialize definitions: {}", e))?;
        dump(target, &json)?;
    }

    if let Some(target) = &cli.ast {
        let dumps: Vec<AstDump> = compilation
            .asts
            .iter()
            .map(|(file, items)| AstDump {
                file: compilation.sources.path(*file),
                items,
            })
            .collect();
        let json = serde_json::to_string_pretty(&dumps)
            .map_err(|e| miette::miette!("failed to serialize AST: {}", e))?;
        dump(target, &json)?;
    }

    report_diagnostics(&compilation);

    if compilation.has_errors() {
        let count = compilation.parse_diagnostics.len()
            + compilation.analyzer.diagnostics().len();
        return Err(miette::miette!("Found {} error(s)", count));
    }

    driver::write_outputs(&cli.output, &compilation.outputs)
        .map_err(|e| miette::miette!("{}", e))?;

    Ok(())
}

fn dump(target: &str, contents: &str) -> miette::Result<()> {
    if target == "-" {
        println!("{}", contents);
        Ok(())
    } else {
        fs::write(target, contents)
            .map_err(|e| miette::miette!("failed to write {}: {}", target, e))
    }
}

/// Print every diagnostic to stderr, grouped by file in file order, with
/// 1-indexed positions.
fn report_diagnostics(compilation: &Compilation) {
    let mut all: Vec<&Diagnostic> = compilation
        .parse_diagnostics
        .iter()
        .chain(compilation.analyzer.diagnostics().iter())
        .collect();
    all.sort_by_key(|d| (d.file, d.span.start));

    for diag in all {
        eprintln!("{}", render(diag, &compilation.sources));
        if let Some(related) = &diag.related {
            eprintln!(
                "  note: {} ({}:{})",
                related.message,
                compilation.sources.path(related.file).display(),
                compilation.sources.position(related.file, related.span)
            );
        }
    }
}

fn render(diag: &Diagnostic, sources: &SourceMap) -> String {
    format!(
        "error: {}:{}: {}",
        sources.path(diag.file).display(),
        sources.position(diag.file, diag.span),
        diag.message
    )
}
