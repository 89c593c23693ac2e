//! End-to-end upload flow.

pub mod pipeline;

pub use pipeline::UploadPipeline;
