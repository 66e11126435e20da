//! Schema extraction from Rust sources (`syn`) and from JSON manifests.
//!
//! Records are discovered by the `/// @document` doc marker, or by name when
//! the caller asks for specific records. Acceptance checks run here; failures
//! come back per record so one bad definition never hides the others.
use std::path::Path;

use proc_macro2::TokenTree;
use quote::ToTokens;
use serde::Deserialize;
use syn::ext::IdentExt;
use syn::punctuated::Punctuated;

use crate::error::{ExtractionError, SchemaAcceptanceError};
use crate::schema::{Field, ScalarKind, Schema, TypeRef};

pub const DOCUMENT_MARKER: &str = "@document";

/// One entry per selected record, in source order.
pub type Extracted = Vec<Result<Schema, ExtractionError>>;

// ------------------------------ Rust source ------------------------------ //

pub fn extract_rust(path: &Path, src: &str, records: &[String]) -> Result<Extracted, ExtractionError> {
    let file = syn::parse_file(src).map_err(|source| ExtractionError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    let mut items = Vec::new();
    collect_items(&file.items, &mut items);

    let selected: Vec<&syn::Item> = items
        .into_iter()
        .filter(|item| match item_ident(item) {
            Some(ident) if !records.is_empty() => records.contains(&ident),
            Some(_) => has_marker(item_attrs(item)),
            None => false,
        })
        .collect();

    let mut out: Extracted = selected
        .iter()
        .map(|item| schema_from_item(item).map_err(ExtractionError::from))
        .collect();

    for wanted in records {
        let found = selected.iter().any(|item| item_ident(item).is_some_and(|i| &i == wanted));
        if !found {
            out.push(Err(ExtractionError::RecordNotFound {
                path: path.to_path_buf(),
                record: wanted.clone(),
            }));
        }
    }
    log::debug!("{}: selected {} record definition(s)", path.display(), out.len());
    Ok(out)
}

fn collect_items<'a>(items: &'a [syn::Item], out: &mut Vec<&'a syn::Item>) {
    for item in items {
        match item {
            syn::Item::Mod(module) => {
                if let Some((_, nested)) = &module.content {
                    collect_items(nested, out);
                }
            }
            other => out.push(other),
        }
    }
}

fn item_ident(item: &syn::Item) -> Option<String> {
    match item {
        syn::Item::Struct(s) => Some(s.ident.unraw().to_string()),
        syn::Item::Enum(e) => Some(e.ident.unraw().to_string()),
        syn::Item::Union(u) => Some(u.ident.unraw().to_string()),
        syn::Item::Type(t) => Some(t.ident.unraw().to_string()),
        _ => None,
    }
}

fn item_attrs(item: &syn::Item) -> &[syn::Attribute] {
    match item {
        syn::Item::Struct(s) => &s.attrs,
        syn::Item::Enum(e) => &e.attrs,
        syn::Item::Union(u) => &u.attrs,
        syn::Item::Type(t) => &t.attrs,
        _ => &[],
    }
}

fn has_marker(attrs: &[syn::Attribute]) -> bool {
    attrs.iter().any(|attr| match &attr.meta {
        syn::Meta::NameValue(nv) if nv.path.is_ident("doc") => match &nv.value {
            syn::Expr::Lit(syn::ExprLit { lit: syn::Lit::Str(s), .. }) => s.value().trim() == DOCUMENT_MARKER,
            _ => false,
        },
        _ => false,
    })
}

fn schema_from_item(item: &syn::Item) -> Result<Schema, SchemaAcceptanceError> {
    let record = item_ident(item).unwrap_or_default();
    let not_a_record = |reason: &str| SchemaAcceptanceError::NotARecord {
        record: record.clone(),
        reason: reason.to_string(),
    };
    let item = match item {
        syn::Item::Struct(s) => s,
        syn::Item::Enum(_) => return Err(not_a_record("enums are sum types, not records")),
        syn::Item::Union(_) => return Err(not_a_record("unions are not records")),
        _ => return Err(not_a_record("only structs can be mapped")),
    };
    if !item.generics.params.is_empty() {
        return Err(not_a_record("generic records are not supported"));
    }
    let named = match &item.fields {
        syn::Fields::Named(named) => named,
        syn::Fields::Unnamed(_) => return Err(not_a_record("tuple structs have no named fields")),
        syn::Fields::Unit => return Err(not_a_record("unit structs have no fields")),
    };
    if item.attrs.iter().any(|attr| attr.path().is_ident("non_exhaustive")) {
        return Err(SchemaAcceptanceError::NoConstructor {
            record,
            reason: "`#[non_exhaustive]` forbids struct literals outside the defining crate".to_string(),
        });
    }

    let derives_default = derives(&item.attrs, "Default");
    let serde_default_all = serde_default(&item.attrs);
    let fields = named
        .named
        .iter()
        .filter_map(|field| {
            let ident = field.ident.as_ref()?;
            let (declared_type, option_wrapped) = resolve_type(&field.ty);
            let declared_default = serde_default_all || serde_default(&field.attrs);
            Some(Field {
                name: ident.unraw().to_string(),
                declared_type,
                nullable: option_wrapped || declared_default,
                option_wrapped,
                has_default: option_wrapped || declared_default || derives_default,
            })
        })
        .collect();
    log::trace!("extracted record `{record}`");
    Ok(Schema { record, fields })
}

fn derives(attrs: &[syn::Attribute], name: &str) -> bool {
    attrs.iter().filter(|attr| attr.path().is_ident("derive")).any(|attr| {
        attr.parse_args_with(Punctuated::<syn::Path, syn::Token![,]>::parse_terminated)
            .map(|paths| paths.iter().any(|p| p.segments.last().is_some_and(|s| s.ident == name)))
            .unwrap_or(false)
    })
}

/// `#[serde(default)]` or `#[serde(default = "..")]`, top level of the list only.
fn serde_default(attrs: &[syn::Attribute]) -> bool {
    attrs.iter().filter(|attr| attr.path().is_ident("serde")).any(|attr| match &attr.meta {
        syn::Meta::List(list) => list
            .tokens
            .clone()
            .into_iter()
            .any(|tt| matches!(tt, TokenTree::Ident(ident) if ident == "default")),
        _ => false,
    })
}

/// Structural resolution: `(type, declared as Option<T>)`.
fn resolve_type(ty: &syn::Type) -> (TypeRef, bool) {
    let (inner, option_wrapped) = match single_generic(ty, "Option") {
        Some(inner) => (inner, true),
        None => (ty, false),
    };
    let resolved = shape_of(inner).unwrap_or_else(|| TypeRef::Unsupported(type_text(ty)));
    (resolved, option_wrapped)
}

fn shape_of(ty: &syn::Type) -> Option<TypeRef> {
    if let Some(kind) = scalar_kind(ty) {
        return Some(TypeRef::Scalar(kind));
    }
    if let Some(element) = single_generic(ty, "Vec") {
        return scalar_kind(element).map(TypeRef::List);
    }
    let segment = last_segment(ty)?;
    match (segment.ident.to_string().as_str(), &segment.arguments) {
        ("Document", syn::PathArguments::None) => Some(TypeRef::Map),
        ("Map", syn::PathArguments::AngleBracketed(args)) => {
            let types: Vec<&syn::Type> = args
                .args
                .iter()
                .filter_map(|arg| match arg {
                    syn::GenericArgument::Type(t) => Some(t),
                    _ => None,
                })
                .collect();
            match types.as_slice() {
                [key, value] if scalar_kind(key) == Some(ScalarKind::String) && is_named(value, "Value") => {
                    Some(TypeRef::Map)
                }
                _ => None,
            }
        }
        _ => None,
    }
}

fn scalar_kind(ty: &syn::Type) -> Option<ScalarKind> {
    let segment = last_segment(ty)?;
    if !segment.arguments.is_none() {
        return None;
    }
    match segment.ident.to_string().as_str() {
        "String" => Some(ScalarKind::String),
        "f64" => Some(ScalarKind::Float),
        "i64" => Some(ScalarKind::Int),
        "bool" => Some(ScalarKind::Boolean),
        _ => None,
    }
}

fn last_segment(ty: &syn::Type) -> Option<&syn::PathSegment> {
    match ty {
        syn::Type::Path(p) if p.qself.is_none() => p.path.segments.last(),
        syn::Type::Group(g) => last_segment(&g.elem),
        syn::Type::Paren(p) => last_segment(&p.elem),
        _ => None,
    }
}

fn is_named(ty: &syn::Type, name: &str) -> bool {
    last_segment(ty).is_some_and(|s| s.ident == name && s.arguments.is_none())
}

/// `Wrapper<T>` → `T`.
fn single_generic<'a>(ty: &'a syn::Type, wrapper: &str) -> Option<&'a syn::Type> {
    let segment = last_segment(ty)?;
    if segment.ident != wrapper {
        return None;
    }
    let syn::PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    match args.args.iter().collect::<Vec<_>>().as_slice() {
        [syn::GenericArgument::Type(inner)] => Some(inner),
        _ => None,
    }
}

fn type_text(ty: &syn::Type) -> String {
    ty.to_token_stream()
        .to_string()
        .replace(" :: ", "::")
        .replace(" < ", "<")
        .replace("< ", "<")
        .replace(" <", "<")
        .replace(" >", ">")
        .replace(" ,", ",")
}

// ------------------------------- Manifest -------------------------------- //

#[derive(Debug, Deserialize)]
struct Manifest {
    records: Vec<Schema>,
}

/// JSON manifest: `{"records": [{"record": "User", "fields": [...]}]}`.
pub fn extract_manifest(path: &Path, src: &str, records: &[String]) -> Result<Extracted, ExtractionError> {
    let de = &mut serde_json::Deserializer::from_str(src);
    let manifest: Manifest = serde_path_to_error::deserialize(de).map_err(|err| ExtractionError::Manifest {
        path: path.to_path_buf(),
        json_path: err.path().to_string(),
        message: err.into_inner().to_string(),
    })?;

    let mut out: Extracted = manifest
        .records
        .iter()
        .filter(|schema| records.is_empty() || records.contains(&schema.record))
        .cloned()
        .map(Ok)
        .collect();
    for wanted in records {
        if !manifest.records.iter().any(|schema| &schema.record == wanted) {
            out.push(Err(ExtractionError::RecordNotFound {
                path: path.to_path_buf(),
                record: wanted.clone(),
            }));
        }
    }
    Ok(out)
}

/// Dispatch on extension: `.json` manifests, everything else as Rust.
pub fn extract_path(path: &Path, src: &str, records: &[String]) -> Result<Extracted, ExtractionError> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => extract_manifest(path, src, records),
        _ => extract_rust(path, src, records),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(src: &str) -> Extracted {
        extract_rust(Path::new("models.rs"), src, &[]).unwrap()
    }

    fn one(src: &str) -> Schema {
        let mut out = extract(src);
        assert_eq!(out.len(), 1);
        out.remove(0).unwrap()
    }

    #[test]
    fn only_marked_items_are_selected() {
        let out = extract(
            r#"
            /// @document
            pub struct User { pub id: String }
            pub struct Internal { pub id: String }
            mod nested {
                /// A listing.
                /// @document
                pub struct Listing { pub price: f64 }
            }
            "#,
        );
        let names: Vec<String> = out.into_iter().map(|r| r.unwrap().record).collect();
        assert_eq!(names, ["User", "Listing"]);
    }

    #[test]
    fn both_nullability_markings_collapse() {
        let schema = one(
            r#"
            /// @document
            pub struct User {
                pub id: String,
                pub amount: Option<f64>,
                #[serde(default, rename = "n")]
                pub count: i64,
                pub tags: std::option::Option<Vec<String>>,
                pub extra: serde_json::Map<String, serde_json::Value>,
                pub flags: Vec<bool>,
            }
            "#,
        );
        let by_name = |n: &str| schema.fields.iter().find(|f| f.name == n).unwrap().clone();
        assert!(!by_name("id").nullable);
        assert!(by_name("amount").nullable && by_name("amount").option_wrapped);
        assert!(by_name("count").nullable && !by_name("count").option_wrapped);
        assert_eq!(by_name("tags").declared_type, TypeRef::List(ScalarKind::String));
        assert_eq!(by_name("extra").declared_type, TypeRef::Map);
        assert_eq!(by_name("flags").declared_type, TypeRef::List(ScalarKind::Boolean));
        let order: Vec<&str> = schema.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(order, ["id", "amount", "count", "tags", "extra", "flags"]);
    }

    #[test]
    fn unsupported_types_keep_their_spelling() {
        let schema = one(
            r#"
            /// @document
            #[derive(Debug, Default)]
            pub struct Order {
                pub address: Address,
                pub matrix: Vec<Vec<i64>>,
                pub small: i32,
                pub nested: Option<Option<String>>,
            }
            "#,
        );
        let types: Vec<String> = schema.fields.iter().map(|f| f.declared_type.to_string()).collect();
        assert_eq!(types, ["Address", "Vec<Vec<i64>>", "i32", "Option<Option<String>>"]);
        assert!(schema.fields.iter().all(|f| f.has_default));
        assert!(!schema.fields[0].nullable);
    }

    #[test]
    fn raw_identifiers_are_unrawed() {
        let schema = one("/// @document\npub struct Item { pub r#type: String }");
        assert_eq!(schema.fields[0].name, "type");
    }

    #[test]
    fn container_level_serde_default_marks_every_field() {
        let schema = one("/// @document\n#[derive(Default)]\n#[serde(default)]\npub struct Prefs { pub theme: String, pub size: i64 }");
        assert!(schema.fields.iter().all(|f| f.nullable && f.has_default && !f.option_wrapped));
    }

    #[test]
    fn non_records_are_rejected() {
        let cases = [
            "/// @document\npub enum Status { Open, Closed }",
            "/// @document\npub struct Pair(String, i64);",
            "/// @document\npub struct Marker;",
            "/// @document\npub struct Wrapper<T> { pub inner: T }",
        ];
        for src in cases {
            let out = extract(src);
            assert!(
                matches!(&out[0], Err(ExtractionError::Acceptance(SchemaAcceptanceError::NotARecord { .. }))),
                "{src}"
            );
        }
    }

    #[test]
    fn non_exhaustive_has_no_constructor() {
        let out = extract("/// @document\n#[non_exhaustive]\npub struct User { pub id: String }");
        assert!(matches!(
            &out[0],
            Err(ExtractionError::Acceptance(SchemaAcceptanceError::NoConstructor { record, .. })) if record == "User"
        ));
    }

    #[test]
    fn named_selection_reports_missing_records() {
        let src = "pub struct User { pub id: String }";
        let wanted = vec!["User".to_string(), "Ghost".to_string()];
        let out = extract_rust(Path::new("m.rs"), src, &wanted).unwrap();
        assert_eq!(out.len(), 2);
        assert!(out[0].is_ok());
        assert!(matches!(&out[1], Err(ExtractionError::RecordNotFound { record, .. }) if record == "Ghost"));
    }

    #[test]
    fn parse_errors_are_fatal_for_the_file() {
        let err = extract_rust(Path::new("bad.rs"), "pub struct {", &[]).unwrap_err();
        assert!(matches!(err, ExtractionError::Parse { .. }));
    }

    #[test]
    fn manifest_errors_carry_the_json_path() {
        let src = r#"{"records": [{"record": "User", "fields": [{"name": "id", "type": "Strin"}]}]}"#;
        let err = extract_manifest(Path::new("s.json"), src, &[]).unwrap_err();
        match err {
            ExtractionError::Manifest { json_path, .. } => assert_eq!(json_path, "records[0].fields[0].type"),
            other => panic!("unexpected {other}"),
        }
    }

    #[test]
    fn manifest_records_round_into_schemas() {
        let src = r#"{"records": [{"record": "User", "fields": [
            {"name": "id", "type": {"Scalar": "String"}},
            {"name": "tags", "type": {"List": "String"}, "nullable": true, "option_wrapped": true, "has_default": true}
        ]}]}"#;
        let out = extract_path(Path::new("schema.json"), src, &[]).unwrap();
        let schema = out.into_iter().next().unwrap().unwrap();
        assert_eq!(schema.fields.len(), 2);
        assert!(schema.fields[1].option_wrapped);
    }
}
