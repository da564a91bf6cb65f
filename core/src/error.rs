use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GachaError {
    #[error("Invalid probability {p}: must be finite and within [0, 1]")]
    InvalidProbability { p: f64 },

    #[error("Invalid pity config: {reason}")]
    InvalidPityConfig { reason: &'static str },
}

pub type GachaResult<T> = Result<T, GachaError>;
