// 適配器層：domain ports 的具體實作（HTTP 服務、本地磁碟）

pub mod openai;
pub mod query_client;
pub mod article;
pub mod storage;
pub mod vertex;

pub use openai::OpenAiModel;
pub use query_client::HttpQueryService;
pub use article::HttpArticleFetcher;
pub use storage::LocalStorage;
pub use vertex::{VertexModel, VertexSettings};
