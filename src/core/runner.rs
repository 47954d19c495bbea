use crate::domain::ports::Pipeline;
use crate::utils::error::Result;
use std::time::Instant;

/// Drives a pipeline through extract, transform and load.
pub struct BatchRunner<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> BatchRunner<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<String> {
        let started = Instant::now();
        tracing::info!("Starting batch run...");

        // 提取
        tracing::info!("Reading input rows...");
        let items = self.pipeline.extract().await?;
        tracing::info!("Read {} rows", items.len());

        // 轉換
        tracing::info!("Analyzing pages...");
        let result = self.pipeline.transform(items).await?;

        // 載入
        tracing::info!("Writing archive...");
        let output_path = self.pipeline.load(result).await?;
        tracing::info!(
            "Batch finished in {:.1}s, output saved to: {}",
            started.elapsed().as_secs_f64(),
            output_path
        );

        Ok(output_path)
    }
}
