use crate::domain::model::{Article, GenerationRequest};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Remote SQL-over-HTTP service holding the GSC rows.
#[async_trait]
pub trait QueryService: Send + Sync {
    async fn execute(&self, sql: &str) -> Result<serde_json::Value>;
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
    fn name(&self) -> &str;
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;
}

#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_article(&self, url: &str) -> Result<Article>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    type Input: Send;
    type Output: Send;

    async fn extract(&self) -> Result<Vec<Self::Input>>;
    async fn transform(&self, data: Vec<Self::Input>) -> Result<Self::Output>;
    async fn load(&self, result: Self::Output) -> Result<String>;
}
