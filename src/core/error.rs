use thiserror::Error;

/// Errors raised while validating simulation inputs.
///
/// Every check runs before the sampler is touched, so a rejected call never
/// advances the random stream.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    #[error("{what} must be positive, got {value}")]
    InvalidDimension { what: &'static str, value: usize },

    #[error("invalid {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

pub type SimResult<T> = Result<T, SimError>;

pub(crate) fn require_positive(what: &'static str, value: usize) -> SimResult<()> {
    if value == 0 {
        return Err(SimError::InvalidDimension { what, value });
    }
    Ok(())
}

pub(crate) fn require_finite(name: &'static str, value: f64) -> SimResult<()> {
    if !value.is_finite() {
        return Err(SimError::InvalidParameter {
            name,
            reason: format!("must be finite, got {value}"),
        });
    }
    Ok(())
}

pub(crate) fn require_stdev(name: &'static str, value: f64) -> SimResult<()> {
    require_finite(name, value)?;
    if value < 0.0 {
        return Err(SimError::InvalidParameter {
            name,
            reason: format!("standard deviation must be >= 0, got {value}"),
        });
    }
    Ok(())
}
