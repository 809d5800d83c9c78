use crate::diagnostic::{Diagnostic, Label, Span};
use crate::value::{Value, value_to_display};

#[derive(Debug, Clone)]
pub enum RuntimeError {
    UnboundVar { action: &'static str, name: String, span: Span },
    TypeMismatch { expected: String, found: String, span: Span },
    NumArgs { expected: usize, got: Vec<Value>, span: Span },
    NotFunction { message: String, repr: String, span: Span },
    AttributeError { container: String, key: String, span: Span },
    NullAccess { span: Span },
    Default { message: String, span: Span },
}

impl RuntimeError {
    pub fn reading(name: impl Into<String>, span: Span) -> Self {
        Self::UnboundVar {
            action: "Reading",
            name: name.into(),
            span,
        }
    }

    pub fn setting(name: impl Into<String>, span: Span) -> Self {
        Self::UnboundVar {
            action: "Setting",
            name: name.into(),
            span,
        }
    }

    pub fn type_mismatch(
        expected: impl Into<String>,
        found: impl Into<String>,
        span: Span,
    ) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
            span,
        }
    }

    pub fn num_args(expected: usize, got: Vec<Value>, span: Span) -> Self {
        Self::NumArgs { expected, got, span }
    }

    pub fn not_function(message: impl Into<String>, value: &Value, span: Span) -> Self {
        Self::NotFunction {
            message: message.into(),
            repr: value_to_display(value),
            span,
        }
    }

    pub fn attribute(container: &Value, key: impl Into<String>, span: Span) -> Self {
        Self::AttributeError {
            container: value_to_display(container),
            key: key.into(),
            span,
        }
    }

    pub fn null_access(span: Span) -> Self {
        Self::NullAccess { span }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::Default {
            message: message.into(),
            span: Span::dummy(),
        }
    }

    pub fn other_at(message: impl Into<String>, span: Span) -> Self {
        Self::Default {
            message: message.into(),
            span,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Self::UnboundVar { span, .. } => *span,
            Self::TypeMismatch { span, .. } => *span,
            Self::NumArgs { span, .. } => *span,
            Self::NotFunction { span, .. } => *span,
            Self::AttributeError { span, .. } => *span,
            Self::NullAccess { span } => *span,
            Self::Default { span, .. } => *span,
        }
    }

    /// Attach `span` when the error has none. Host builtins do not see
    /// source positions, so the evaluator pins their errors to the call
    /// site.
    pub fn or_span(mut self, fallback: Span) -> Self {
        let slot = match &mut self {
            Self::UnboundVar { span, .. } => span,
            Self::TypeMismatch { span, .. } => span,
            Self::NumArgs { span, .. } => span,
            Self::NotFunction { span, .. } => span,
            Self::AttributeError { span, .. } => span,
            Self::NullAccess { span } => span,
            Self::Default { span, .. } => span,
        };
        if slot.is_dummy() {
            *slot = fallback;
        }
        self
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            Self::UnboundVar { action, name, span } => {
                Diagnostic::error(format!("{} an unbound variable `{}`", action, name))
                    .with_code("E0201")
                    .with_label(Label::primary(*span, "not bound in this scope"))
                    .with_help(format!("declare it first: `var {} := …;`", name))
            }
            Self::TypeMismatch { expected, found, span } => {
                Diagnostic::error(format!("expected {}, found {}", expected, found))
                    .with_code("E0202")
                    .with_label(Label::primary(*span, format!("this has type {}", found)))
            }
            Self::NumArgs { expected, got, span } => {
                Diagnostic::error(format!(
                    "wrong number of arguments: expected {}, got {}",
                    expected,
                    got.len()
                ))
                .with_code("E0203")
                .with_label(Label::primary(*span, "in this call"))
                .with_note(format!(
                    "arguments were: {}",
                    got.iter()
                        .map(value_to_display)
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
            }
            Self::NotFunction { message, repr, span } => {
                Diagnostic::error(format!("{}: {}", message, repr))
                    .with_code("E0204")
                    .with_label(Label::primary(*span, "not callable"))
            }
            Self::AttributeError { container, key, span } => {
                Diagnostic::error(format!("no attribute `{}` on {}", key, container))
                    .with_code("E0205")
                    .with_label(Label::primary(*span, format!("`{}` not found here", key)))
            }
            Self::NullAccess { span } => {
                Diagnostic::error("empty value used where a value is required")
                    .with_code("E0206")
                    .with_label(Label::primary(*span, "this is empty"))
            }
            Self::Default { message, span } => Diagnostic::error(message.clone())
                .with_code("E0207")
                .with_label(Label::primary(*span, "")),
        }
    }
}

impl std::fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnboundVar { action, name, .. } => {
                write!(f, "{} an unbound variable `{}`", action, name)
            }
            Self::TypeMismatch { expected, found, .. } => {
                write!(f, "Type mismatch: expected {}, found {}", expected, found)
            }
            Self::NumArgs { expected, got, .. } => write!(
                f,
                "Wrong number of arguments: expected {}, got {}",
                expected,
                got.len()
            ),
            Self::NotFunction { message, repr, .. } => write!(f, "{}: {}", message, repr),
            Self::AttributeError { container, key, .. } => {
                write!(f, "No attribute `{}` on {}", key, container)
            }
            Self::NullAccess { .. } => {
                write!(f, "Empty value used where a value is required")
            }
            Self::Default { message, .. } => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for RuntimeError {}
