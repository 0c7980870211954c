// =============================================================================
// Engine Errors
// =============================================================================
//
// Every computation either returns a value or one of three failure kinds.
// Zero denominators with a defined fallback (RSI with no losses, ADX with a
// flat range) never reach this type; those without one surface as
// `InvalidParameter`.

use serde::Serialize;

/// Structured failure returned by every engine operation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    /// The input is not shaped like the operation expects (e.g. a price
    /// array containing a string).
    #[error("invalid input: {0}")]
    InputShape(String),

    /// The series is shorter than the requested period allows.
    #[error("not enough data: {0}")]
    InsufficientData(String),

    /// A parameter is outside its valid domain, or the data would force a
    /// division by zero with no sane fallback.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Convenience alias used throughout the engine.
pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    /// Stable machine-readable label for the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InputShape(_) => "input_shape",
            Self::InsufficientData(_) => "insufficient_data",
            Self::InvalidParameter(_) => "invalid_parameter",
        }
    }

    /// Serialisable body for API responses.
    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            kind: self.kind(),
            message: self.to_string(),
        }
    }

    pub(crate) fn insufficient(needed: usize, what: &str) -> Self {
        Self::InsufficientData(format!("need at least {needed} {what}"))
    }
}

/// Wire form of an [`EngineError`].
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub kind: &'static str,
    pub message: String,
}

/// Reject a zero period before any indexing happens.
pub(crate) fn ensure_period(period: usize, name: &str) -> EngineResult<()> {
    if period < 1 {
        return Err(EngineError::InvalidParameter(format!(
            "{name} must be greater than 0"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_labels_are_stable() {
        assert_eq!(EngineError::InputShape("x".into()).kind(), "input_shape");
        assert_eq!(
            EngineError::InsufficientData("x".into()).kind(),
            "insufficient_data"
        );
        assert_eq!(
            EngineError::InvalidParameter("x".into()).kind(),
            "invalid_parameter"
        );
    }

    #[test]
    fn insufficient_message() {
        let err = EngineError::insufficient(15, "candles");
        assert_eq!(err.to_string(), "not enough data: need at least 15 candles");
    }

    #[test]
    fn zero_period_rejected() {
        assert!(ensure_period(0, "period").is_err());
        assert!(ensure_period(1, "period").is_ok());
    }
}
