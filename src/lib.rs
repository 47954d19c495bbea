pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod server;
pub mod utils;

pub use adapters::{HttpArticleFetcher, HttpQueryService, LocalStorage, OpenAiModel, VertexModel};
pub use app::{pipelines::BatchPipeline, Analyzer, ModelRegistry};
pub use config::Settings;
pub use core::runner::BatchRunner;
pub use server::{create_router, AppState};
pub use utils::error::{LensError, Result};
