use crate::domain::model::{GeoBounds, ParsedInputs, TransformOutput};
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

pub trait ConfigProvider: Send + Sync {
    fn data_dir(&self) -> &str;
    fn api_key(&self) -> &str;
    fn geocode_endpoint(&self) -> &str;
    fn distance_endpoint(&self) -> &str;
    fn teams_file(&self) -> &str;
    fn events_file(&self) -> &str;
    fn output_file(&self) -> &str;
    fn default_state(&self) -> &str;
    fn bounds(&self) -> GeoBounds;
    fn request_delay_ms(&self) -> u64;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<ParsedInputs>;
    async fn transform(&self, inputs: ParsedInputs) -> Result<TransformOutput>;
    async fn load(&self, output: TransformOutput) -> Result<String>;
}
