//! S3存储工厂

use std::sync::Arc;

use async_trait::async_trait;

use super::config::build_client;
use super::driver::AwsS3Store;
use crate::config::ClientOptions;
use crate::error::Result;
use crate::storage::{ObjectStore, StoreFactory};

/// S3存储工厂（基于 aws-sdk-s3）
#[derive(Debug, Clone, Copy, Default)]
pub struct AwsStoreFactory;

#[async_trait]
impl StoreFactory for AwsStoreFactory {
    fn name(&self) -> &'static str {
        "aws-s3"
    }

    async fn connect(&self, options: &ClientOptions) -> Result<Arc<dyn ObjectStore>> {
        let parts = build_client(options).await;
        tracing::info!(
            "S3 client connected: region={}, endpoint={}",
            parts.region,
            options.endpoint.as_deref().unwrap_or("aws")
        );
        Ok(Arc::new(AwsS3Store::new(parts, options)))
    }
}
