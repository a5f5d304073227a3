pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use config::{storage::LocalStorage, CliConfig};
pub use core::{etl::EtlEngine, pipeline::LeaguePipeline};
pub use utils::error::{EtlError, Result};
