mod bias;
mod errors;
pub mod lm;

pub use bias::{BiasMap, LogitBias, MAX_BIAS, MIN_BIAS, validate_bias};
pub use errors::{BiasError, ErrorClass, LmError};
pub use lm::*;
