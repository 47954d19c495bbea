pub mod extract;
pub mod fanout;
pub mod normalize;
pub mod prompts;
pub mod render;
pub mod runner;
pub mod sql;
pub mod suggestions;

pub use crate::domain::ports::{Pipeline, Storage};
pub use crate::utils::error::Result;
pub use runner::BatchRunner;
