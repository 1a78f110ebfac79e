use crate::session::Phase;

/// Error types for import-map operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The host's input options cannot carry injected entrypoints.
    #[error("[importmaps:{component}] {message}")]
    InvalidInputOptions {
        component: &'static str,
        message: String,
    },

    /// Two declarations normalize to the same chunk name.
    #[error(
        "[importmaps:config] shared dependencies '{first}' and '{second}' both normalize to '{normalized}'"
    )]
    NameCollision {
        normalized: String,
        first: String,
        second: String,
    },

    /// A build session step was invoked out of order.
    #[error("[importmaps:session] expected phase {expected}, session is in {actual}")]
    PhaseOrder { expected: Phase, actual: Phase },

    /// The strict export-shape oracle could not decide on a default export.
    #[error("[importmaps:shape] cannot determine export shape of '{specifier}'")]
    AmbiguousExportShape { specifier: String },

    /// The same dependency is declared twice with different entries.
    #[error("[importmaps:config] shared dependency '{name}' is declared twice with different entries")]
    DuplicateDeclaration { name: String },
}

/// Result type alias for import-map operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn invalid_input(component: &'static str, message: impl Into<String>) -> Self {
        Error::InvalidInputOptions {
            component,
            message: message.into(),
        }
    }

    /// Whether the error aborts the build (as opposed to degrading a single entry).
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::AmbiguousExportShape { .. })
    }
}

impl miette::Diagnostic for Error {
    fn code(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        Some(Box::new(match self {
            Error::InvalidInputOptions { .. } => "INVALID_INPUT_OPTIONS",
            Error::NameCollision { .. } => "NAME_COLLISION",
            Error::PhaseOrder { .. } => "PHASE_ORDER",
            Error::AmbiguousExportShape { .. } => "AMBIGUOUS_EXPORT_SHAPE",
            Error::DuplicateDeclaration { .. } => "DUPLICATE_DECLARATION",
        }))
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(miette::Severity::Error)
    }

    fn help(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        match self {
            Error::InvalidInputOptions { .. } => Some(Box::new(
                "Declare bundler inputs as a name -> path mapping, or switch to the \
                 virtual-modules strategy.",
            )),
            Error::NameCollision { first, second, .. } => Some(Box::new(format!(
                "'{}' and '{}' would be written to the same chunk. Remove one of them or \
                 declare one with a distinct name.",
                first, second
            ))),
            Error::AmbiguousExportShape { specifier } => Some(Box::new(format!(
                "Disable strict export probing, or give '{}' an explicit ESM entry.",
                specifier
            ))),
            Error::DuplicateDeclaration { name } => Some(Box::new(format!(
                "Keep a single declaration of '{}'.",
                name
            ))),
            Error::PhaseOrder { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use miette::Diagnostic;

    #[test]
    fn input_error_carries_component_prefix() {
        let err = Error::invalid_input("build:entry-as-input", "Input options must be an object");
        assert_eq!(
            err.to_string(),
            "[importmaps:build:entry-as-input] Input options must be an object"
        );
        assert_eq!(err.code().unwrap().to_string(), "INVALID_INPUT_OPTIONS");
        assert!(err.is_fatal());
    }

    #[test]
    fn ambiguity_is_not_fatal() {
        let err = Error::AmbiguousExportShape {
            specifier: "legacy".into(),
        };
        assert!(!err.is_fatal());
        assert!(err.help().is_some());
    }
}
