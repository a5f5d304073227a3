pub mod error;

pub use error::{EtlError, Result};
pub mod logger;
pub mod validation;
