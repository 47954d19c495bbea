pub mod analyzer;
pub mod models;
pub mod pipelines;
pub mod requests;

pub use analyzer::Analyzer;
pub use models::ModelRegistry;
