use std::fmt;

use serde::Serialize;

use crate::error::{ExtractionError, SchemaAcceptanceError, UnsupportedFieldError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Severity {
    /// Generation for the record was aborted.
    Error,
    /// A field was skipped; the record was still generated.
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum DiagnosticCode {
    DM0001ParseError,
    DM0002RecordNotFound,
    DM0003InvalidManifest,
    DM0100NotARecord,
    DM0101NoConstructor,
    DM0102UnconstructibleField,
    DM0103DuplicateField,
    DM0104InvalidIdentifier,
    DM0200UnsupportedField,
}

impl DiagnosticCode {
    pub fn code_str(self) -> &'static str {
        match self {
            DiagnosticCode::DM0001ParseError => "DM0001",
            DiagnosticCode::DM0002RecordNotFound => "DM0002",
            DiagnosticCode::DM0003InvalidManifest => "DM0003",
            DiagnosticCode::DM0100NotARecord => "DM0100",
            DiagnosticCode::DM0101NoConstructor => "DM0101",
            DiagnosticCode::DM0102UnconstructibleField => "DM0102",
            DiagnosticCode::DM0103DuplicateField => "DM0103",
            DiagnosticCode::DM0104InvalidIdentifier => "DM0104",
            DiagnosticCode::DM0200UnsupportedField => "DM0200",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub severity: Severity,
    /// Empty when the failure happened before a record was identified.
    pub record: String,
    pub field: Option<String>,
    pub message: String,
}

impl Diagnostic {
    pub fn error(code: DiagnosticCode, record: impl Into<String>, message: impl Into<String>) -> Self {
        Diagnostic {
            code,
            severity: Severity::Error,
            record: record.into(),
            field: None,
            message: message.into(),
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}

impl From<&SchemaAcceptanceError> for Diagnostic {
    fn from(err: &SchemaAcceptanceError) -> Self {
        let code = match err {
            SchemaAcceptanceError::NotARecord { .. } => DiagnosticCode::DM0100NotARecord,
            SchemaAcceptanceError::NoConstructor { .. } => DiagnosticCode::DM0101NoConstructor,
            SchemaAcceptanceError::UnconstructibleField { .. } => DiagnosticCode::DM0102UnconstructibleField,
            SchemaAcceptanceError::DuplicateField { .. } => DiagnosticCode::DM0103DuplicateField,
            SchemaAcceptanceError::InvalidIdentifier { .. } => DiagnosticCode::DM0104InvalidIdentifier,
        };
        let diagnostic = Diagnostic::error(code, err.record(), err.to_string());
        match err.field() {
            Some(field) => diagnostic.with_field(field),
            None => diagnostic,
        }
    }
}

impl From<&ExtractionError> for Diagnostic {
    fn from(err: &ExtractionError) -> Self {
        match err {
            ExtractionError::Acceptance(inner) => Diagnostic::from(inner),
            ExtractionError::Parse { .. } => Diagnostic::error(DiagnosticCode::DM0001ParseError, "", err.to_string()),
            ExtractionError::Manifest { .. } => {
                Diagnostic::error(DiagnosticCode::DM0003InvalidManifest, "", err.to_string())
            }
            ExtractionError::RecordNotFound { record, .. } => {
                Diagnostic::error(DiagnosticCode::DM0002RecordNotFound, record.as_str(), err.to_string())
            }
        }
    }
}

impl From<&UnsupportedFieldError> for Diagnostic {
    fn from(err: &UnsupportedFieldError) -> Self {
        Diagnostic {
            code: DiagnosticCode::DM0200UnsupportedField,
            severity: Severity::Warning,
            record: err.record.clone(),
            field: Some(err.field.clone()),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?}: {}", self.code.code_str(), self.severity, self.message)
    }
}

/// Where generation reports problems. The host decides what to do with them.
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

/// Forwards diagnostics to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Error => log::error!("{diagnostic}"),
            Severity::Warning => log::warn!("{diagnostic}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_field_is_a_warning_naming_the_field() {
        let err = UnsupportedFieldError {
            record: "Order".into(),
            field: "address".into(),
            ty: "Address".into(),
        };
        let d = Diagnostic::from(&err);
        assert_eq!(d.severity, Severity::Warning);
        assert_eq!(d.field.as_deref(), Some("address"));
        assert_eq!(
            d.to_string(),
            "DM0200 Warning: unsupported type `Address` for field `address` of `Order`; field skipped"
        );
    }

    struct Capture;

    static CAPTURED: std::sync::Mutex<Vec<(log::Level, String)>> = std::sync::Mutex::new(Vec::new());

    impl log::Log for Capture {
        fn enabled(&self, _: &log::Metadata<'_>) -> bool {
            true
        }
        fn log(&self, record: &log::Record<'_>) {
            CAPTURED.lock().unwrap().push((record.level(), record.args().to_string()));
        }
        fn flush(&self) {}
    }

    #[test]
    fn log_sink_forwards_by_severity() {
        let _ = log::set_logger(&Capture);
        log::set_max_level(log::LevelFilter::Trace);

        let warning = Diagnostic::from(&UnsupportedFieldError {
            record: "Order".into(),
            field: "address".into(),
            ty: "Address".into(),
        });
        let error = Diagnostic::error(DiagnosticCode::DM0100NotARecord, "Kind", "`Kind` is not a record");
        LogSink.report(warning.clone());
        LogSink.report(error.clone());

        let captured = CAPTURED.lock().unwrap();
        assert!(captured.contains(&(log::Level::Warn, warning.to_string())));
        assert!(captured.contains(&(log::Level::Error, error.to_string())));
    }

    #[test]
    fn acceptance_errors_are_errors() {
        let err = SchemaAcceptanceError::NoConstructor { record: "User".into(), reason: "x".into() };
        let d = Diagnostic::from(&ExtractionError::from(err));
        assert_eq!(d.severity, Severity::Error);
        assert_eq!(d.code, DiagnosticCode::DM0101NoConstructor);
        assert_eq!(d.record, "User");
        assert_eq!(d.field, None);
    }
}
