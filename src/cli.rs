//! Minimal CLI: extract → (generate | plan | read)
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;

use docmap::diagnostics::{Diagnostic, DiagnosticSink, Severity};
use docmap::emit::GeneratorConfig;
use docmap::schema::Schema;
use docmap::{extract, RustTarget};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// generate record ↔ document mappers from Rust record definitions or JSON schema manifests
#[derive(Parser, Debug)]
#[command(name = "docmap")]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// emit one `<record>_mapper.rs` per record
    Generate(GenerateOut),
    /// print every field's classification as JSON
    Plan(PlanOut),
    /// read a document through a record's mapper and print the result
    Read(ReadDocument),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// One or more inputs: `.rs` sources or `.json` manifests. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,

    /// only these records (default: every item marked `/// @document`)
    #[arg(long = "record", short)]
    records: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct GenerateOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output directory (stdout if omitted)
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// fail if any file in --out-dir differs from what would be written; write nothing
    #[arg(long, default_value_t = false, requires = "out_dir")]
    check: bool,

    /// module path generated code imports the runtime from
    #[arg(long, default_value = "docmap::runtime")]
    runtime_path: String,

    /// omit the `@generated` banner
    #[arg(long, default_value_t = false)]
    no_header: bool,
}

#[derive(clap::Parser, Debug)]
struct PlanOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct ReadDocument {
    #[command(flatten)]
    input_settings: InputSettings,

    /// JSON document to read
    #[arg(long)]
    document: PathBuf,

    /// JSON Pointer to select the document inside the file (e.g. /data/items/0)
    #[arg(long)]
    json_pointer: Option<String>,
}

/// Prints diagnostics to stderr and remembers whether any was an error.
#[derive(Debug, Default)]
struct ConsoleSink {
    errors: usize,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl DiagnosticSink for ConsoleSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        let label = match diagnostic.severity {
            Severity::Error => {
                self.errors += 1;
                "error".red().bold()
            }
            Severity::Warning => "warning".yellow().bold(),
        };
        eprintln!("{label}[{}]: {}", diagnostic.code.code_str(), diagnostic.message);
        log::debug!("{diagnostic:?}");
    }
}

impl InputSettings {
    fn load_schemas(&self, sink: &mut dyn DiagnosticSink) -> Result<Vec<Schema>> {
        let source_paths = resolve_file_path_patterns(&self.input)
            .map_err(|error| anyhow::anyhow!("failed to resolve input file paths: {error}"))?;
        let mut schemas = Vec::new();
        for source_path in source_paths {
            let source = std::fs::read_to_string(&source_path)
                .with_context(|| format!("failed to read source file {}", source_path.display()))?;
            match extract::extract_path(&source_path, &source, &self.records) {
                Ok(extracted) => schemas.extend(docmap::accept(extracted, sink)),
                Err(error) => sink.report(Diagnostic::from(&error)),
            }
        }
        Ok(schemas)
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }
    pub fn run(&self) -> Result<()> {
        let mut sink = ConsoleSink::default();
        match &self.cmd {
            Command::Generate(target) => target.run(&mut sink)?,
            Command::Plan(target) => target.run(&mut sink)?,
            Command::Read(target) => target.run(&mut sink)?,
        }
        if sink.errors > 0 {
            bail!("{} error(s) reported", sink.errors);
        }
        Ok(())
    }
}

impl GenerateOut {
    fn config(&self) -> GeneratorConfig {
        GeneratorConfig {
            runtime_path: self.runtime_path.clone(),
            header: !self.no_header,
        }
    }

    fn run(&self, sink: &mut ConsoleSink) -> Result<()> {
        let schemas = self.input_settings.load_schemas(sink)?;
        let outcomes = docmap::generate_batch(&schemas, &RustTarget, &self.config());

        let mut stale = Vec::new();
        for outcome in outcomes {
            for diagnostic in outcome.diagnostics {
                sink.report(diagnostic);
            }
            let Some(unit) = outcome.unit else { continue };
            match &self.out_dir {
                None => println!("{}", unit.source_text),
                Some(dir) => {
                    let path = dir.join(unit.file_name());
                    if self.check {
                        let current = match std::fs::read_to_string(&path) {
                            Ok(current) => Some(current),
                            Err(error) if error.kind() == std::io::ErrorKind::NotFound => None,
                            Err(error) => {
                                return Err(error).with_context(|| format!("failed to read {}", path.display()));
                            }
                        };
                        if current.as_deref() != Some(unit.source_text.as_str()) {
                            stale.push(path);
                        }
                    } else {
                        write_output(&path, &unit.source_text)?;
                        log::info!("wrote {}", path.display());
                    }
                }
            }
        }
        if !stale.is_empty() {
            for path in &stale {
                eprintln!("{}: {}", "out of date".red().bold(), path.display());
            }
            bail!("{} generated file(s) out of date", stale.len());
        }
        Ok(())
    }
}

impl PlanOut {
    fn run(&self, sink: &mut ConsoleSink) -> Result<()> {
        let schemas = self.input_settings.load_schemas(sink)?;
        let mut plans = Vec::with_capacity(schemas.len());
        for schema in &schemas {
            match docmap::plan(schema) {
                Ok(plan) => plans.push(plan),
                Err(error) => sink.report(Diagnostic::from(&error)),
            }
        }
        let plan_src = serde_json::to_string_pretty(&plans)?;
        match self.out.as_ref() {
            Some(out) => write_output(out, &plan_src)?,
            None => println!("{plan_src}"),
        }
        Ok(())
    }
}

impl ReadDocument {
    fn run(&self, sink: &mut ConsoleSink) -> Result<()> {
        let schemas = self.input_settings.load_schemas(sink)?;
        let [schema] = schemas.as_slice() else {
            bail!("`read` needs exactly one record, found {}; narrow it with --record", schemas.len());
        };
        let mapper = docmap::dynamic_mapper(schema)?;

        let source = std::fs::read_to_string(&self.document)
            .with_context(|| format!("failed to read document {}", self.document.display()))?;
        let json_value: serde_json::Value = serde_json::from_str(&source)
            .with_context(|| format!("failed to parse JSON document {}", self.document.display()))?;
        let selected = match self.json_pointer.as_deref() {
            None => &json_value,
            Some(pointer) => json_value
                .pointer(pointer)
                .with_context(|| format!("JSON pointer {pointer} matched nothing"))?,
        };
        let Some(doc) = selected.as_object() else {
            bail!("document must be a JSON object");
        };

        let record = mapper
            .read(doc)
            .with_context(|| format!("document does not fit `{}`", schema.record))?;
        println!("{}", serde_json::to_string_pretty(&record)?);
        Ok(())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn write_output(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{' ))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                matched_any = true;
                out.push(entry?);
            }
            if !matched_any {
                // Pattern was explicitly a glob but matched nothing -> surface as an error
                return Err(format!("glob pattern matched no files: {pattern}").into());
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
