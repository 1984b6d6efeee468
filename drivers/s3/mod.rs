//! S3 存储后端 / S3 storage backend
//!
//! - config: 由 ClientOptions 构建 aws-sdk-s3 客户端
//! - driver: ObjectStore 实现
//! - factory: StoreFactory 实现

mod config;
mod driver;
mod factory;

pub use config::{build_client, ClientParts};
pub use driver::AwsS3Store;
pub use factory::AwsStoreFactory;
