pub mod aggregate;
pub mod annotate;
pub mod config;
pub mod error;
pub mod ingest;
pub mod layout;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod timeline;

pub use error::{FlowError, Result};
