pub mod config;
pub mod error;
pub mod inference;
pub mod pipeline;
pub mod report;
pub mod routes;
pub mod storage;

pub use error::{FailureClass, PipelineError};
pub use pipeline::Pipeline;
