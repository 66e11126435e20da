//! Emitter: `MapperPlan` → `GeneratedUnit`.
//!
//! The plan is first laid out as a `MapperTemplate` (names, constructor
//! arguments, document entries); a `Target` turns that into text. Nothing
//! here re-classifies or validates fields.
use std::fmt::{self, Write as _};

use serde::Serialize;

use crate::classify::ZeroValue;
use crate::runtime::Shape;
use crate::schema::{is_keyword, snake_case};
use crate::synth::{FieldPlan, MapperPlan, ReadExpr, WriteExpr};

// ------------------------------- Types ----------------------------------- //

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Path the generated code imports the runtime helpers from.
    pub runtime_path: String,
    /// Prepend the `@generated` banner.
    pub header: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            runtime_path: "docmap::runtime".to_string(),
            header: true,
        }
    }
}

/// The emitter's only output. The host decides where it is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedUnit {
    pub destination_identifier: String,
    pub source_text: String,
}

impl GeneratedUnit {
    pub fn file_name(&self) -> String {
        format!("{}.rs", snake_case(&self.destination_identifier))
    }
}

/// Target-neutral layout of the two routines.
#[derive(Debug, Clone)]
pub struct MapperTemplate<'a> {
    pub record: &'a str,
    pub from_fn: String,
    pub to_fn: String,
    pub constructor_args: Vec<ConstructorArg<'a>>,
    pub entries: Vec<&'a WriteExpr>,
}

#[derive(Debug, Clone)]
pub enum ConstructorArg<'a> {
    Read { field: &'a str, expr: &'a ReadExpr },
    Default { field: &'a str },
}

pub trait Target {
    fn render(&self, template: &MapperTemplate<'_>, config: &GeneratorConfig) -> String;
}

/// Emits plain Rust functions over `serde_json` documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct RustTarget;

// --------------------------- Implementation ------------------------------ //

impl<'a> MapperTemplate<'a> {
    pub fn from_plan(plan: &'a MapperPlan) -> Self {
        let snake = snake_case(&plan.record);
        let mut constructor_args = Vec::with_capacity(plan.fields.len());
        let mut entries = Vec::with_capacity(plan.fields.len());
        for field_plan in &plan.fields {
            match field_plan {
                FieldPlan::Mapped { field, read, write, .. } => {
                    constructor_args.push(ConstructorArg::Read { field: &field.name, expr: read });
                    entries.push(write);
                }
                FieldPlan::Omitted { field, .. } => {
                    constructor_args.push(ConstructorArg::Default { field: &field.name });
                }
            }
        }
        MapperTemplate {
            record: &plan.record,
            from_fn: format!("from_{snake}"),
            to_fn: format!("to_{snake}_document"),
            constructor_args,
            entries,
        }
    }
}

pub fn emit(plan: &MapperPlan, target: &dyn Target, config: &GeneratorConfig) -> GeneratedUnit {
    let template = MapperTemplate::from_plan(plan);
    GeneratedUnit {
        destination_identifier: format!("{}Mapper", plan.record),
        source_text: target.render(&template, config),
    }
}

impl Target for RustTarget {
    fn render(&self, template: &MapperTemplate<'_>, config: &GeneratorConfig) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_unit(&mut out, template, config);
        out
    }
}

impl RustTarget {
    fn write_unit(&self, out: &mut String, t: &MapperTemplate<'_>, config: &GeneratorConfig) -> fmt::Result {
        let record = t.record;
        if config.header {
            writeln!(out, "// @generated by docmap from `{record}`. Do not edit.")?;
            writeln!(out)?;
        }
        // A record with nothing mapped must not leave unused bindings behind.
        let mapped = !t.entries.is_empty();
        let (runtime, unused) = if mapped { ("self as runtime, ", "") } else { ("", "_") };
        writeln!(
            out,
            "use {}::{{{runtime}Document, DocumentShapeError}};",
            config.runtime_path
        )?;
        writeln!(out)?;

        writeln!(
            out,
            "pub fn {}({unused}doc: &Document) -> Result<{record}, DocumentShapeError> {{",
            t.from_fn
        )?;
        writeln!(out, "    Ok({record} {{")?;
        for arg in &t.constructor_args {
            match arg {
                ConstructorArg::Read { field, expr } => {
                    writeln!(out, "        {}: {},", rust_ident(field), read_expr(expr))?;
                }
                ConstructorArg::Default { field } => {
                    writeln!(out, "        {}: Default::default(),", rust_ident(field))?;
                }
            }
        }
        writeln!(out, "    }})")?;
        writeln!(out, "}}")?;
        writeln!(out)?;

        writeln!(out, "pub fn {}({unused}record: &{record}) -> Document {{", t.to_fn)?;
        writeln!(out, "    let {}doc = Document::new();", if mapped { "mut " } else { "" })?;
        for entry in &t.entries {
            match entry {
                WriteExpr::Entry { key, field } => writeln!(
                    out,
                    "    doc.insert({key:?}.to_owned(), runtime::to_value(&record.{}));",
                    rust_ident(field)
                )?,
            }
        }
        writeln!(out, "    doc")?;
        writeln!(out, "}}")?;
        Ok(())
    }
}

fn read_expr(expr: &ReadExpr) -> String {
    match expr {
        ReadExpr::Strict { key, shape } => {
            format!("runtime::read_strict::<{}>(doc, {key:?})?", rust_type(*shape))
        }
        ReadExpr::OrZero { key, shape, zero } => {
            format!("runtime::read_or::<{}>(doc, {key:?}, {})", rust_type(*shape), zero_literal(*zero))
        }
        ReadExpr::Some(inner) => format!("Some({})", read_expr(inner)),
    }
}

fn rust_type(shape: Shape) -> String {
    match shape {
        Shape::Scalar(kind) => kind.rust_type().to_string(),
        Shape::List(kind) => format!("Vec<{}>", kind.rust_type()),
        Shape::Map => "Document".to_string(),
    }
}

fn zero_literal(zero: ZeroValue) -> &'static str {
    match zero {
        ZeroValue::EmptyString => "String::new()",
        ZeroValue::ZeroFloat => "0.0",
        ZeroValue::ZeroInt => "0",
        ZeroValue::False => "false",
        ZeroValue::EmptyList => "Vec::new()",
        ZeroValue::EmptyMap => "Document::new()",
    }
}

/// Keywords become raw identifiers; the document key keeps the bare name.
fn rust_ident(name: &str) -> String {
    if is_keyword(name) {
        format!("r#{name}")
    } else {
        name.to_string()
    }
}
