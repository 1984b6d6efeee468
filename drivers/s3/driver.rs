//! S3存储核心实现 / ObjectStore backed by aws-sdk-s3
//!
//! 设计原则：
//! - 只提供原语，每个方法对应一次S3请求
//! - 错误原样透传（包装为 Error::Backend）

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{self as s3_types, ObjectCannedAcl};
use aws_sdk_s3::Client;
use chrono::{DateTime, Utc};
use url::Url;

use super::config::ClientParts;
use crate::acl::{CannedAcl, Grant, Grantee};
use crate::config::ClientOptions;
use crate::error::{Error, Result};
use crate::storage::{
    CopyObjectRequest, ListPage, ListRequest, ListingEntry, MetadataDirective, ObjectData,
    ObjectHead, ObjectReader, ObjectStore, PresignMethod, PresignRequest, PutObjectRequest,
};
use crate::utils::{encode_key, public_object_url};

/// S3存储
pub struct AwsS3Store {
    client: Client,
    region: String,
    endpoint: Option<String>,
    force_path_style: bool,
}

impl AwsS3Store {
    pub fn new(parts: ClientParts, options: &ClientOptions) -> Self {
        Self::from_client(
            parts.client,
            parts.region,
            options.endpoint.clone(),
            options.force_path_style,
        )
    }

    /// Wrap an existing client / 使用已有客户端
    pub fn from_client(
        client: Client,
        region: impl Into<String>,
        endpoint: Option<String>,
        force_path_style: bool,
    ) -> Self {
        Self {
            client,
            region: region.into(),
            endpoint,
            force_path_style,
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }
}

fn to_chrono(time: &aws_sdk_s3::primitives::DateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(time.secs(), time.subsec_nanos())
}

fn canned_acl(acl: CannedAcl) -> ObjectCannedAcl {
    ObjectCannedAcl::from(acl.as_str())
}

fn to_entry(object: &s3_types::Object) -> ListingEntry {
    ListingEntry {
        key: object.key().unwrap_or_default().to_string(),
        size: object.size().unwrap_or(0).max(0) as u64,
        last_modified: object.last_modified().and_then(to_chrono),
        e_tag: object.e_tag().map(str::to_string),
        storage_class: object.storage_class().map(|c| c.as_str().to_string()),
    }
}

fn to_grant(grant: &s3_types::Grant) -> Grant {
    Grant {
        grantee: grant.grantee().map(|g| Grantee {
            uri: g.uri().map(str::to_string),
            id: g.id().map(str::to_string),
            display_name: g.display_name().map(str::to_string),
            email_address: g.email_address().map(str::to_string),
        }),
        permission: grant.permission().map(|p| p.as_str().to_string()),
    }
}

#[async_trait]
impl ObjectStore for AwsS3Store {
    async fn get_bucket_location(&self, bucket: &str) -> Result<Option<String>> {
        tracing::debug!("S3 GetBucketLocation: bucket={}", bucket);
        let output = self
            .client
            .get_bucket_location()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| Error::backend("GetBucketLocation", e))?;

        Ok(output.location_constraint().map(|c| c.as_str().to_string()))
    }

    async fn list_objects_v2(&self, request: &ListRequest) -> Result<ListPage> {
        let output = self
            .client
            .list_objects_v2()
            .bucket(&request.bucket)
            .prefix(&request.prefix)
            .max_keys(request.max_keys)
            .set_continuation_token(request.continuation_token.clone())
            .send()
            .await
            .map_err(|e| Error::backend("ListObjectsV2", e))?;

        Ok(ListPage {
            entries: output.contents().iter().map(to_entry).collect(),
            is_truncated: output.is_truncated().unwrap_or(false),
            next_continuation_token: output.next_continuation_token().map(str::to_string),
        })
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectReader> {
        tracing::debug!("S3 GetObject: bucket={}, key={}", bucket, key);
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| Error::backend("GetObject", e))?;

        Ok(Box::pin(output.body.into_async_read()))
    }

    async fn put_object(&self, request: PutObjectRequest) -> Result<()> {
        let body = match request.body {
            ObjectData::Bytes(bytes) => ByteStream::from(bytes),
            // 从文件流式上传，不整体读入内存
            ObjectData::File(path) => ByteStream::from_path(&path)
                .await
                .map_err(|e| Error::backend("PutObject", e))?,
        };

        let options = request.options;
        let metadata = if options.metadata.is_empty() {
            None
        } else {
            Some(options.metadata)
        };

        tracing::debug!("S3 PutObject: bucket={}, key={}", request.bucket, request.key);
        self.client
            .put_object()
            .bucket(&request.bucket)
            .key(&request.key)
            .body(body)
            .set_content_type(options.content_type)
            .set_acl(options.acl.map(canned_acl))
            .set_cache_control(options.cache_control)
            .set_content_disposition(options.content_disposition)
            .set_metadata(metadata)
            .send()
            .await
            .map_err(|e| Error::backend("PutObject", e))?;
        Ok(())
    }

    async fn head_object(&self, bucket: &str, key: &str) -> Result<Option<ObjectHead>> {
        let result = self.client.head_object().bucket(bucket).key(key).send().await;

        let output = match result {
            Ok(output) => output,
            Err(err) if err.as_service_error().map_or(false, |e| e.is_not_found()) => {
                tracing::debug!("S3 HeadObject: s3://{}/{} not found", bucket, key);
                return Ok(None);
            }
            Err(err) => return Err(Error::backend("HeadObject", err)),
        };

        let metadata: HashMap<String, String> = output.metadata().cloned().unwrap_or_default();
        Ok(Some(ObjectHead {
            content_type: output.content_type().map(str::to_string),
            content_length: output.content_length().unwrap_or(0).max(0) as u64,
            last_modified: output.last_modified().and_then(to_chrono),
            e_tag: output.e_tag().map(str::to_string),
            metadata,
        }))
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        tracing::debug!("S3 DeleteObject: bucket={}, key={}", bucket, key);
        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| Error::backend("DeleteObject", e))?;
        Ok(())
    }

    async fn get_object_acl(&self, bucket: &str, key: &str) -> Result<Vec<Grant>> {
        let output = self
            .client
            .get_object_acl()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| Error::backend("GetObjectAcl", e))?;

        Ok(output.grants().iter().map(to_grant).collect())
    }

    async fn put_object_acl(&self, bucket: &str, key: &str, acl: CannedAcl) -> Result<()> {
        self.client
            .put_object_acl()
            .bucket(bucket)
            .key(key)
            .acl(canned_acl(acl))
            .send()
            .await
            .map_err(|e| Error::backend("PutObjectAcl", e))?;
        Ok(())
    }

    async fn copy_object(&self, request: &CopyObjectRequest) -> Result<()> {
        // CopySource 需要URL编码（中文等非ASCII字符）
        let source = format!("{}/{}", request.source_bucket, encode_key(&request.source_key));
        let directive = match request.metadata_directive {
            MetadataDirective::Copy => s3_types::MetadataDirective::Copy,
            MetadataDirective::Replace => s3_types::MetadataDirective::Replace,
        };

        tracing::debug!(
            "S3 CopyObject: source={}, dst=s3://{}/{}, directive={}",
            source,
            request.bucket,
            request.key,
            request.metadata_directive.as_str()
        );
        self.client
            .copy_object()
            .copy_source(source)
            .bucket(&request.bucket)
            .key(&request.key)
            .metadata_directive(directive)
            .set_content_type(request.content_type.clone())
            .send()
            .await
            .map_err(|e| Error::backend("CopyObject", e))?;
        Ok(())
    }

    async fn presign(&self, request: &PresignRequest) -> Result<String> {
        let config = PresigningConfig::expires_in(request.expires_in)
            .map_err(|e| Error::backend("Presign", e))?;

        let presigned = match request.method {
            PresignMethod::Get => self
                .client
                .get_object()
                .bucket(&request.bucket)
                .key(&request.key)
                .set_response_content_type(request.response_content_type.clone())
                .set_response_content_disposition(request.response_content_disposition.clone())
                .presigned(config)
                .await
                .map_err(|e| Error::backend("PresignGetObject", e))?,
            PresignMethod::Put => self
                .client
                .put_object()
                .bucket(&request.bucket)
                .key(&request.key)
                .set_acl(request.acl.map(canned_acl))
                .set_content_type(request.content_type.clone())
                .presigned(config)
                .await
                .map_err(|e| Error::backend("PresignPutObject", e))?,
        };

        Ok(presigned.uri().to_string())
    }

    fn public_url(&self, bucket: &str, key: &str) -> Result<Url> {
        public_object_url(
            bucket,
            key,
            &self.region,
            self.endpoint.as_deref(),
            self.force_path_style,
        )
    }
}
