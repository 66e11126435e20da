//! Generates record ↔ document mappers from typed record definitions.
//!
//! Pipeline, one linear pass per record:
//! extract (`extract`) → classify (`classify`) → synthesize (`synth`) → emit (`emit`).
//! Generated code links against `runtime`.
pub mod classify;
pub mod diagnostics;
pub mod emit;
pub mod error;
pub mod extract;
pub mod runtime;
pub mod schema;
pub mod synth;

use rayon::prelude::*;

use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::emit::{GeneratedUnit, GeneratorConfig, Target};
use crate::error::SchemaAcceptanceError;
use crate::extract::Extracted;
use crate::schema::Schema;
use crate::synth::{DynamicMapper, MapperPlan};

pub use crate::emit::RustTarget;

/// Validate, classify, synthesize. Unsupported fields stay in the plan as omissions.
pub fn plan(schema: &Schema) -> Result<MapperPlan, SchemaAcceptanceError> {
    schema.validate()?;
    let classified = classify::classify_fields(schema);
    log::trace!(
        "`{}`: classified {} field(s): {:?}",
        schema.record,
        classified.len(),
        classified.iter().map(|c| &c.strategy).collect::<Vec<_>>()
    );
    synth::synthesize(&schema.record, &classified)
}

/// Interpreted mapper with the same semantics as the generated code.
pub fn dynamic_mapper(schema: &Schema) -> Result<DynamicMapper, SchemaAcceptanceError> {
    plan(schema).map(DynamicMapper::new)
}

/// Generate one unit. Fatal problems yield `None` plus an error diagnostic;
/// each skipped field yields one warning.
pub fn generate(
    schema: &Schema,
    target: &dyn Target,
    config: &GeneratorConfig,
    sink: &mut dyn DiagnosticSink,
) -> Option<GeneratedUnit> {
    let plan = match plan(schema) {
        Ok(plan) => plan,
        Err(err) => {
            sink.report(Diagnostic::from(&err));
            return None;
        }
    };
    for skipped in plan.skipped() {
        sink.report(Diagnostic::from(&skipped));
    }
    let unit = emit::emit(&plan, target, config);
    log::debug!("generated {} ({} bytes)", unit.destination_identifier, unit.source_text.len());
    Some(unit)
}

/// Report extraction failures and keep the schemas that made it through.
pub fn accept(extracted: Extracted, sink: &mut dyn DiagnosticSink) -> Vec<Schema> {
    extracted
        .into_iter()
        .filter_map(|result| match result {
            Ok(schema) => Some(schema),
            Err(err) => {
                sink.report(Diagnostic::from(&err));
                None
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub record: String,
    pub unit: Option<GeneratedUnit>,
    pub diagnostics: Vec<Diagnostic>,
}

/// One worker per schema; each owns its diagnostics. Results keep input order.
pub fn generate_batch(
    schemas: &[Schema],
    target: &(dyn Target + Sync),
    config: &GeneratorConfig,
) -> Vec<Outcome> {
    schemas
        .par_iter()
        .map(|schema| {
            let mut diagnostics = Vec::new();
            let unit = generate(schema, target, config, &mut diagnostics);
            Outcome {
                record: schema.record.clone(),
                unit,
                diagnostics,
            }
        })
        .collect()
}
