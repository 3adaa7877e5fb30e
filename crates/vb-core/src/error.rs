use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error(transparent)]
    Unit(#[from] UnitError),
}

/// Errors raised while parsing unit expressions or converting quantities.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UnitError {
    #[error("Unknown unit '{symbol}' in '{expr}'")]
    UnknownUnit { symbol: String, expr: String },

    #[error("Malformed unit expression '{expr}': {reason}")]
    Parse { expr: String, reason: String },

    #[error("Cannot convert '{from}' ({from_dim}) to '{to}' ({to_dim})")]
    Incompatible {
        from: String,
        from_dim: String,
        to: String,
        to_dim: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_errors_pass_through_unchanged() {
        let inner = UnitError::Parse {
            expr: "m^".to_string(),
            reason: "empty exponent".to_string(),
        };
        let err = CoreError::from(inner.clone());
        assert_eq!(err.to_string(), inner.to_string());
        assert_eq!(err, CoreError::Unit(inner));
    }
}
