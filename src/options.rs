//! Per-operation options / 各操作的选项

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::acl::CannedAcl;
use crate::error::{Error, Result};

/// Default and maximum keys per listing page / 每页最大键数
pub const DEFAULT_PAGE_SIZE: i32 = 1000;

/// Presigned URL lifetime when none is given (15 minutes) / 默认签名有效期
pub const DEFAULT_PRESIGN_EXPIRY: Duration = Duration::from_secs(900);

/// Listing options / 列举选项
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListOptions {
    /// Keys requested per page, `1..=1000` / 每页数量
    pub page_size: i32,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ListOptions {
    pub fn with_page_size(page_size: i32) -> Self {
        Self { page_size }
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=DEFAULT_PAGE_SIZE).contains(&self.page_size) {
            return Err(Error::InvalidArgument(format!(
                "page size must be between 1 and {}, got {}",
                DEFAULT_PAGE_SIZE, self.page_size
            )));
        }
        Ok(())
    }
}

/// Upload options / 上传选项
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PutOptions {
    pub content_type: Option<String>,
    pub acl: Option<CannedAcl>,
    pub cache_control: Option<String>,
    pub content_disposition: Option<String>,
    /// User metadata (`x-amz-meta-*`) / 用户元数据
    pub metadata: HashMap<String, String>,
}

impl PutOptions {
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_acl(mut self, acl: CannedAcl) -> Self {
        self.acl = Some(acl);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Options for [`crate::S3Object::to_http`] / HTTP 地址选项
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpUrlOptions {
    /// `None` returns the unsigned public URL / 为空时返回公开地址
    pub expires_in: Option<Duration>,
    pub response_content_disposition: Option<String>,
    pub response_content_type: Option<String>,
}

impl HttpUrlOptions {
    pub fn presigned(expires_in: Duration) -> Self {
        Self {
            expires_in: Some(expires_in),
            ..Default::default()
        }
    }

    pub fn with_content_disposition(mut self, disposition: impl Into<String>) -> Self {
        self.response_content_disposition = Some(disposition.into());
        self
    }

    pub fn with_response_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.response_content_type = Some(content_type.into());
        self
    }
}

/// Options for [`crate::S3Object::upload_url`] / 上传地址选项
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadUrlOptions {
    /// Ask for the uploaded object to be world-readable / 上传后公开可读
    pub public_read: bool,
    pub expires_in: Duration,
    pub content_type: Option<String>,
}

impl Default for UploadUrlOptions {
    fn default() -> Self {
        Self {
            public_read: false,
            expires_in: DEFAULT_PRESIGN_EXPIRY,
            content_type: None,
        }
    }
}

impl UploadUrlOptions {
    pub fn public_read() -> Self {
        Self {
            public_read: true,
            ..Default::default()
        }
    }

    pub fn with_expires_in(mut self, expires_in: Duration) -> Self {
        self.expires_in = expires_in;
        self
    }
}
