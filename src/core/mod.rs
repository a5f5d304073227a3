pub mod aggregate;
pub mod etl;
pub mod loader;
pub mod pipeline;

pub use crate::domain::model::{ParsedInputs, TransformOutput};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
