//! Access control lists / 访问控制列表

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Grantee URI of the "everyone" group / 所有用户组
pub const ALL_USERS_GROUP: &str = "http://acs.amazonaws.com/groups/global/AllUsers";

/// Permission value of a read grant / 读权限
pub const PERMISSION_READ: &str = "READ";

/// Canned ACL values accepted by S3 / S3 预设 ACL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CannedAcl {
    Private,
    PublicRead,
    PublicReadWrite,
    AuthenticatedRead,
    AwsExecRead,
    BucketOwnerRead,
    BucketOwnerFullControl,
}

impl CannedAcl {
    pub const ALL: [CannedAcl; 7] = [
        CannedAcl::Private,
        CannedAcl::PublicRead,
        CannedAcl::PublicReadWrite,
        CannedAcl::AuthenticatedRead,
        CannedAcl::AwsExecRead,
        CannedAcl::BucketOwnerRead,
        CannedAcl::BucketOwnerFullControl,
    ];

    /// Wire value / 请求中使用的值
    pub fn as_str(&self) -> &'static str {
        match self {
            CannedAcl::Private => "private",
            CannedAcl::PublicRead => "public-read",
            CannedAcl::PublicReadWrite => "public-read-write",
            CannedAcl::AuthenticatedRead => "authenticated-read",
            CannedAcl::AwsExecRead => "aws-exec-read",
            CannedAcl::BucketOwnerRead => "bucket-owner-read",
            CannedAcl::BucketOwnerFullControl => "bucket-owner-full-control",
        }
    }

    /// Resolve a symbolic permission name / 解析权限名称
    /// `public_read` and `public-read` both map to [`CannedAcl::PublicRead`].
    pub fn from_permission(name: &str) -> Result<Self, Error> {
        let wire = name.trim().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|acl| acl.as_str() == wire)
            .ok_or_else(|| Error::UnknownPermission(name.to_string()))
    }
}

impl fmt::Display for CannedAcl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CannedAcl {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        Self::from_permission(s)
    }
}

/// Grantee of an ACL grant / 授权对象
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grantee {
    /// Group URI (set for group grantees)
    pub uri: Option<String>,
    pub id: Option<String>,
    pub display_name: Option<String>,
    pub email_address: Option<String>,
}

/// One ACL grant / 一条授权
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    pub grantee: Option<Grantee>,
    /// `FULL_CONTROL`, `READ`, `WRITE`, `READ_ACP` or `WRITE_ACP`
    pub permission: Option<String>,
}

impl Grant {
    pub fn new(grantee: Grantee, permission: &str) -> Self {
        Self {
            grantee: Some(grantee),
            permission: Some(permission.to_string()),
        }
    }

    /// READ granted to the AllUsers group / 是否为公开读授权
    pub fn is_public_read(&self) -> bool {
        let everyone = self
            .grantee
            .as_ref()
            .and_then(|g| g.uri.as_deref())
            .map_or(false, |uri| uri == ALL_USERS_GROUP);
        everyone && self.permission.as_deref() == Some(PERMISSION_READ)
    }
}

/// Whether any grant makes the object world-readable / 是否公开可读
pub fn is_public_read(grants: &[Grant]) -> bool {
    grants.iter().any(Grant::is_public_read)
}
