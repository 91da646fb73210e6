use thiserror::Error;

/// Failures raised synchronously by construction and correction calls.
///
/// Data anomalies (NaN, infinities, out-of-range destination ids) are never
/// reported here; they render as transparent vertices instead.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum PaintError {
    /// Malformed construction arguments (empty palette, mismatched lengths, ...)
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Numeric argument outside its domain
    #[error("parameter '{param}' {message}")]
    InvalidParameter { param: &'static str, message: String },
    /// Operation called before the setup step it depends on
    #[error("missing prerequisite: {0}")]
    MissingPrerequisite(&'static str),
}

pub type PaintResult<T> = Result<T, PaintError>;

impl PaintError {
    pub fn code(&self) -> &'static str {
        match self {
            PaintError::InvalidInput(_) => "invalid_input",
            PaintError::InvalidParameter { .. } => "invalid_parameter",
            PaintError::MissingPrerequisite(_) => "missing_prerequisite",
        }
    }

    pub(crate) fn input(message: impl Into<String>) -> Self {
        PaintError::InvalidInput(message.into())
    }

    pub(crate) fn param(param: &'static str, message: impl Into<String>) -> Self {
        PaintError::InvalidParameter { param, message: message.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(PaintError::input("x").code(), "invalid_input");
        assert_eq!(PaintError::param("q", "must be in (0, 1]").code(), "invalid_parameter");
        assert_eq!(PaintError::MissingPrerequisite("adjacency").code(), "missing_prerequisite");
    }

    #[test]
    fn messages_name_the_parameter() {
        let e = PaintError::param("alpha", "must be in (0, 1], got 2");
        assert_eq!(e.to_string(), "parameter 'alpha' must be in (0, 1], got 2");
    }
}
