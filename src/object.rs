//! Object handle addressed by an `s3://` URI / 由 s3 URI 定位的对象句柄
//!
//! Every operation is a single delegation to the [`ObjectStore`] resolved for
//! the bucket. The bucket region and the store are resolved lazily on first
//! use and cached for the lifetime of the handle.

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::OnceCell;
use url::Url;

use crate::acl::{self, CannedAcl, Grant};
use crate::config::ClientOptions;
use crate::error::{Error, Result};
use crate::listing::list_entries;
use crate::options::{HttpUrlOptions, ListOptions, PutOptions, UploadUrlOptions};
use crate::storage::{
    CopyObjectRequest, ListRequest, ListingEntry, MetadataDirective, ObjectData, ObjectHead,
    ObjectReader, ObjectStore, PresignMethod, PresignRequest, PutObjectRequest, StoreFactory,
};
use crate::uri::S3Uri;
use crate::utils::DEFAULT_REGION;

/// Object (or key prefix) in a bucket / 桶中的对象
pub struct S3Object {
    uri: S3Uri,
    factory: Arc<dyn StoreFactory>,
    options: ClientOptions,
    /// 桶所在区域（首次使用时查询）
    region: OnceCell<String>,
    /// 绑定到区域的存储
    store: OnceCell<Arc<dyn ObjectStore>>,
}

impl std::fmt::Debug for S3Object {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Object")
            .field("uri", &self.uri)
            .field("factory", &self.factory.name())
            .field("region", &self.region.get())
            .finish()
    }
}

impl S3Object {
    pub fn new(uri: S3Uri, factory: Arc<dyn StoreFactory>, options: ClientOptions) -> Self {
        Self {
            uri,
            factory,
            options,
            region: OnceCell::new(),
            store: OnceCell::new(),
        }
    }

    pub fn uri(&self) -> &S3Uri {
        &self.uri
    }

    pub fn bucket(&self) -> &str {
        self.uri.bucket()
    }

    /// Decoded object key / 对象键
    pub fn key(&self) -> Result<String> {
        self.uri.key()
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Region the bucket lives in / 桶所在区域
    ///
    /// Queried once through GetBucketLocation; an empty location constraint
    /// means `us-east-1`.
    pub async fn region(&self) -> Result<&str> {
        let region = self
            .region
            .get_or_try_init(|| async {
                let discovery = self.factory.connect(&self.options.without_region()).await?;
                let location = discovery.get_bucket_location(self.uri.bucket()).await?;
                let region = normalize_region(location);
                tracing::debug!("Resolved region of bucket {}: {}", self.uri.bucket(), region);
                Ok::<_, Error>(region)
            })
            .await?;
        Ok(region.as_str())
    }

    /// Store bound to the bucket region / 绑定到桶区域的存储
    ///
    /// An explicit `region` option skips the bucket location lookup.
    pub async fn store(&self) -> Result<Arc<dyn ObjectStore>> {
        let store = self
            .store
            .get_or_try_init(|| async {
                let region = match self.options.region.as_deref().filter(|r| !r.is_empty()) {
                    Some(region) => region.to_string(),
                    None => self.region().await?.to_string(),
                };
                let options = self.options.clone().with_region(region);
                self.factory.connect(&options).await
            })
            .await?;
        Ok(store.clone())
    }

    /// Lazily list every entry under this key prefix / 列举前缀下的对象
    ///
    /// Each call starts a fresh listing.
    pub async fn index(
        &self,
        options: ListOptions,
    ) -> Result<BoxStream<'static, Result<ListingEntry>>> {
        options.validate()?;
        let request = ListRequest {
            bucket: self.uri.bucket().to_string(),
            prefix: self.key()?,
            max_keys: options.page_size,
            continuation_token: None,
        };
        Ok(list_entries(self.store().await?, request))
    }

    /// Streamed object body / 流式读取对象
    pub async fn fetch(&self) -> Result<ObjectReader> {
        let key = self.key()?;
        self.store().await?.get_object(self.uri.bucket(), &key).await
    }

    /// Whole object body / 读取整个对象
    pub async fn get(&self) -> Result<Bytes> {
        let mut reader = self.fetch().await?;
        let mut body = Vec::new();
        reader.read_to_end(&mut body).await?;
        Ok(Bytes::from(body))
    }

    pub async fn put(&self, body: impl Into<Bytes>, options: PutOptions) -> Result<()> {
        self.put_data(ObjectData::Bytes(body.into()), options).await
    }

    /// Upload a local file / 上传本地文件
    pub async fn upload_file(&self, path: impl AsRef<Path>, options: PutOptions) -> Result<()> {
        let path = path.as_ref();
        if !tokio::fs::try_exists(path).await? {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} does not exist", path.display()),
            )));
        }
        self.put_data(ObjectData::File(path.to_path_buf()), options).await
    }

    async fn put_data(&self, body: ObjectData, options: PutOptions) -> Result<()> {
        let request = PutObjectRequest {
            bucket: self.uri.bucket().to_string(),
            key: self.key()?,
            body,
            options,
        };
        tracing::debug!("Uploading {}", self.uri);
        self.store().await?.put_object(request).await
    }

    /// Download into a local file, creating parent directories / 下载到本地文件
    ///
    /// The body is written to a hidden sibling and renamed over `path` once
    /// complete, so a failed transfer leaves `path` untouched.
    pub async fn download_file(&self, path: impl AsRef<Path>) -> Result<u64> {
        let path = path.as_ref();
        let partial = partial_path(path)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut reader = self.fetch().await?;
        let result = match write_file(&mut reader, &partial).await {
            Ok(written) => tokio::fs::rename(&partial, path).await.map(|_| written),
            Err(e) => Err(e),
        };
        let written = match result {
            Ok(written) => written,
            Err(e) => {
                if let Err(cleanup) = tokio::fs::remove_file(&partial).await {
                    tracing::warn!("Failed to remove {:?}: {}", partial, cleanup);
                }
                return Err(e.into());
            }
        };

        tracing::debug!("Downloaded {} to {:?} ({} bytes)", self.uri, path, written);
        Ok(written)
    }

    /// HTTP(S) URL of the object / 对象的 HTTP 地址
    ///
    /// Without an expiry this is the unsigned public URL, otherwise a
    /// presigned GET URL.
    pub async fn to_http(&self, options: HttpUrlOptions) -> Result<Url> {
        let key = self.key()?;
        let store = self.store().await?;

        let expires_in = match options.expires_in {
            Some(expires_in) => expires_in,
            None => return store.public_url(self.uri.bucket(), &key),
        };

        let mut request = PresignRequest::new(PresignMethod::Get, self.uri.bucket(), &key, expires_in);
        request.response_content_type = options.response_content_type;
        request.response_content_disposition = options.response_content_disposition;

        let url = store.presign(&request).await?;
        Ok(Url::parse(&url)?)
    }

    /// Presigned PUT URL / 预签名上传地址
    pub async fn upload_url(&self, options: UploadUrlOptions) -> Result<Url> {
        let key = self.key()?;
        let mut request =
            PresignRequest::new(PresignMethod::Put, self.uri.bucket(), &key, options.expires_in);
        if options.public_read {
            request.acl = Some(CannedAcl::PublicRead);
        }
        request.content_type = options.content_type;

        let url = self.store().await?.presign(&request).await?;
        Ok(Url::parse(&url)?)
    }

    /// Whether the object exists; not-found is `false`, not an error / 对象是否存在
    pub async fn exists(&self) -> Result<bool> {
        let key = self.key()?;
        let head = self.store().await?.head_object(self.uri.bucket(), &key).await?;
        Ok(head.is_some())
    }

    /// HEAD the object / 获取对象元信息
    pub async fn head(&self) -> Result<ObjectHead> {
        let key = self.key()?;
        self.store()
            .await?
            .head_object(self.uri.bucket(), &key)
            .await?
            .ok_or_else(|| Error::NotFound {
                bucket: self.uri.bucket().to_string(),
                key,
            })
    }

    pub async fn content_type(&self) -> Result<Option<String>> {
        Ok(self.head().await?.content_type)
    }

    /// Change the content type in place / 修改对象的 Content-Type
    ///
    /// Copies the object onto itself with the `REPLACE` metadata directive,
    /// which also drops user metadata.
    pub async fn set_content_type(&self, content_type: impl Into<String>) -> Result<()> {
        let key = self.key()?;
        let request = CopyObjectRequest {
            source_bucket: self.uri.bucket().to_string(),
            source_key: key.clone(),
            bucket: self.uri.bucket().to_string(),
            key,
            content_type: Some(content_type.into()),
            metadata_directive: MetadataDirective::Replace,
        };
        self.store().await?.copy_object(&request).await
    }

    pub async fn last_modified(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self.head().await?.last_modified)
    }

    /// User metadata / 用户元数据
    pub async fn metadata(&self) -> Result<HashMap<String, String>> {
        Ok(self.head().await?.metadata)
    }

    pub async fn content_length(&self) -> Result<u64> {
        Ok(self.head().await?.content_length)
    }

    /// Apply a canned ACL by symbolic name (`public_read`, `private`, ...) / 设置访问权限
    pub async fn set_permissions(&self, permission: impl AsRef<str>) -> Result<()> {
        let acl = CannedAcl::from_permission(permission.as_ref())?;
        let key = self.key()?;
        tracing::debug!("Setting ACL of {} to {}", self.uri, acl);
        self.store()
            .await?
            .put_object_acl(self.uri.bucket(), &key, acl)
            .await
    }

    pub async fn grants(&self) -> Result<Vec<Grant>> {
        let key = self.key()?;
        self.store().await?.get_object_acl(self.uri.bucket(), &key).await
    }

    /// Whether everyone may read the object / 是否公开可读
    pub async fn is_public(&self) -> Result<bool> {
        Ok(acl::is_public_read(&self.grants().await?))
    }

    /// Delete the object / 删除对象
    pub async fn destroy(&self) -> Result<()> {
        let key = self.key()?;
        self.store().await?.delete_object(self.uri.bucket(), &key).await?;
        tracing::debug!("Deleted {}", self.uri);
        Ok(())
    }
}

/// `dir/.name.part` next to the download target / 下载临时文件
fn partial_path(path: &Path) -> Result<PathBuf> {
    let name = path.file_name().ok_or_else(|| {
        Error::InvalidArgument(format!("download target {:?} has no file name", path))
    })?;
    let mut partial = OsString::from(".");
    partial.push(name);
    partial.push(".part");
    Ok(path.with_file_name(partial))
}

async fn write_file(reader: &mut ObjectReader, path: &Path) -> std::io::Result<u64> {
    let mut file = tokio::fs::File::create(path).await?;
    let written = tokio::io::copy(reader, &mut file).await?;
    file.flush().await?;
    file.sync_all().await?;
    Ok(written)
}

fn normalize_region(location: Option<String>) -> String {
    match location {
        Some(region) if !region.is_empty() => region,
        _ => DEFAULT_REGION.to_string(),
    }
}
