pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod table;

pub use config::NormalizerConfig;
pub use error::{NormalizeError, Result};
pub use pipeline::{run, NormalizedSchema, RunReport};
pub use table::Table;
