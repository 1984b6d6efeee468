use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncRead;
use url::Url;

use crate::acl::{CannedAcl, Grant};
use crate::config::ClientOptions;
use crate::error::Result;
use crate::options::PutOptions;

/// Streamed object body / 对象内容流
pub type ObjectReader = Pin<Box<dyn AsyncRead + Send>>;

/// One page request of ListObjectsV2 / 列举请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRequest {
    pub bucket: String,
    pub prefix: String,
    pub max_keys: i32,
    /// Absent on the first request / 首次请求为空
    pub continuation_token: Option<String>,
}

/// Object summary as returned by the listing / 列举返回的对象摘要
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingEntry {
    pub key: String,
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
    pub e_tag: Option<String>,
    pub storage_class: Option<String>,
}

/// One page of listing results / 一页列举结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPage {
    pub entries: Vec<ListingEntry>,
    pub is_truncated: bool,
    pub next_continuation_token: Option<String>,
}

/// Result of a HEAD request / HEAD 请求结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectHead {
    pub content_type: Option<String>,
    pub content_length: u64,
    pub last_modified: Option<DateTime<Utc>>,
    pub e_tag: Option<String>,
    /// User metadata / 用户元数据
    pub metadata: HashMap<String, String>,
}

/// Body of an upload / 上传内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectData {
    Bytes(Bytes),
    /// Streamed from a local file / 从本地文件流式读取
    File(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutObjectRequest {
    pub bucket: String,
    pub key: String,
    pub body: ObjectData,
    pub options: PutOptions,
}

/// How CopyObject treats metadata / 复制时的元数据处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataDirective {
    Copy,
    Replace,
}

impl MetadataDirective {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetadataDirective::Copy => "COPY",
            MetadataDirective::Replace => "REPLACE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyObjectRequest {
    pub source_bucket: String,
    pub source_key: String,
    pub bucket: String,
    pub key: String,
    pub content_type: Option<String>,
    pub metadata_directive: MetadataDirective,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresignMethod {
    Get,
    Put,
}

/// Presigned URL request / 预签名请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresignRequest {
    pub method: PresignMethod,
    pub bucket: String,
    pub key: String,
    pub expires_in: Duration,
    /// PUT only / 仅 PUT
    pub acl: Option<CannedAcl>,
    /// PUT only / 仅 PUT
    pub content_type: Option<String>,
    /// GET only / 仅 GET
    pub response_content_type: Option<String>,
    /// GET only / 仅 GET
    pub response_content_disposition: Option<String>,
}

impl PresignRequest {
    pub fn new(method: PresignMethod, bucket: &str, key: &str, expires_in: Duration) -> Self {
        Self {
            method,
            bucket: bucket.to_string(),
            key: key.to_string(),
            expires_in,
            acl: None,
            content_type: None,
            response_content_type: None,
            response_content_disposition: None,
        }
    }
}

/// Object storage backend (provides only primitive operations) / 对象存储后端接口
///
/// Errors are the backend's own, wrapped in [`crate::Error::Backend`].
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Raw location constraint of a bucket (may be empty) / 桶所在区域
    async fn get_bucket_location(&self, bucket: &str) -> Result<Option<String>>;

    /// Fetch one listing page / 列举一页
    async fn list_objects_v2(&self, request: &ListRequest) -> Result<ListPage>;

    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectReader>;

    async fn put_object(&self, request: PutObjectRequest) -> Result<()>;

    /// `None` when the object does not exist / 对象不存在时返回 None
    async fn head_object(&self, bucket: &str, key: &str) -> Result<Option<ObjectHead>>;

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()>;

    async fn get_object_acl(&self, bucket: &str, key: &str) -> Result<Vec<Grant>>;

    async fn put_object_acl(&self, bucket: &str, key: &str, acl: CannedAcl) -> Result<()>;

    async fn copy_object(&self, request: &CopyObjectRequest) -> Result<()>;

    async fn presign(&self, request: &PresignRequest) -> Result<String>;

    /// Unsigned URL of the object / 对象的公开地址
    fn public_url(&self, bucket: &str, key: &str) -> Result<Url>;
}

/// Creates stores bound to a set of client options / 存储工厂
#[async_trait]
pub trait StoreFactory: Send + Sync {
    /// Human readable name / 工厂名称
    fn name(&self) -> &'static str;

    async fn connect(&self, options: &ClientOptions) -> Result<Arc<dyn ObjectStore>>;
}

pub mod manager;

#[cfg(test)]
pub(crate) mod mock;

pub use manager::{global, register_schemes, SchemeRegistry};
