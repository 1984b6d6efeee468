//! `s3://bucket/key` locations / S3 URI 定位
//!
//! The host of the URI is the bucket, the path (leading `/` stripped once and
//! percent-decoded) is the object key.

use std::fmt;
use std::str::FromStr;

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use url::Url;

use crate::error::{Error, Result};
use crate::utils::{decode_key, encode_key, strip_root};

pub const SCHEME: &str = "s3";

/// Location of an object (or key prefix) inside a bucket / 桶内对象位置
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct S3Uri {
    bucket: String,
    /// Percent-encoded path, always starting with `/`
    path: String,
}

impl S3Uri {
    /// Build a location from a bucket and a logical key / 由桶名和对象键构造
    ///
    /// Every `/`-separated segment of `key` is encoded independently. An empty
    /// key addresses the bucket root (`/`).
    pub fn build(bucket: impl Into<String>, key: &str) -> Self {
        Self {
            bucket: bucket.into(),
            path: format!("/{}", encode_key(key)),
        }
    }

    /// Parse an `s3://` URI string / 解析 s3 URI 字符串
    ///
    /// The path is taken verbatim from `input`: `.` and `..` segments are
    /// part of the key and are never resolved.
    pub fn parse(input: &str) -> Result<Self> {
        let url = parse_url(input)?;
        check_scheme(&url)?;
        Self::from_url_unchecked(&url, Some(input))
    }

    /// Convert an already parsed generic URL / 从通用 URL 转换
    ///
    /// `Url` removes `.`/`..` path segments (also `%2E`/`%2E%2E`) while
    /// parsing, so keys containing them cannot be recovered here. Use
    /// [`S3Uri::parse`] on the original string for such keys.
    pub fn from_url(url: &Url) -> Result<Self> {
        check_scheme(url)?;
        Self::from_url_unchecked(url, None)
    }

    /// Build from a parsed URL without the scheme check (scheme aliases).
    /// With `input`, the raw path of that string replaces `url.path()`.
    pub(crate) fn from_url_unchecked(url: &Url, input: Option<&str>) -> Result<Self> {
        let bucket = match url.host_str() {
            Some(host) if !host.is_empty() => host.to_string(),
            _ => return Err(Error::invalid_uri(url.as_str(), "missing bucket name")),
        };
        if !url.username().is_empty() || url.password().is_some() {
            return Err(Error::invalid_uri(url.as_str(), "userinfo is not allowed"));
        }
        if url.port().is_some() {
            return Err(Error::invalid_uri(url.as_str(), "port is not allowed"));
        }
        if url.query().is_some() || url.fragment().is_some() {
            return Err(Error::invalid_uri(
                url.as_str(),
                "query and fragment are not allowed",
            ));
        }

        let raw = match input {
            Some(input) => raw_path(input),
            None => url.path(),
        };
        let escaped = utf8_percent_encode(raw, PATH_ESCAPE).to_string();
        let path = if escaped.starts_with('/') {
            escaped
        } else {
            format!("/{}", escaped)
        };

        Ok(Self { bucket, path })
    }

    pub fn scheme(&self) -> &'static str {
        SCHEME
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Alias of [`S3Uri::bucket`]: the bucket is the URI host.
    pub fn host(&self) -> &str {
        &self.bucket
    }

    /// Encoded path, including the leading `/` / 编码后的路径
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Decoded object key / 解码后的对象键
    pub fn key(&self) -> Result<String> {
        decode_key(strip_root(&self.path))
    }

    pub fn is_root(&self) -> bool {
        self.path == "/"
    }

    /// Append one logical segment to the key / 追加一个路径分段
    pub fn join(&self, segment: &str) -> Self {
        let encoded = urlencoding::encode(segment);
        let path = if self.path.ends_with('/') {
            format!("{}{}", self.path, encoded)
        } else {
            format!("{}/{}", self.path, encoded)
        };
        Self {
            bucket: self.bucket.clone(),
            path,
        }
    }

    /// Generic URL form; dot segments in the key are resolved by `Url`
    pub fn as_url(&self) -> Result<Url> {
        Ok(Url::parse(&self.to_string())?)
    }
}

/// Characters escaped in a raw path; `%` is kept so existing escapes survive
const PATH_ESCAPE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

fn parse_url(input: &str) -> Result<Url> {
    Url::parse(input).map_err(|e| Error::invalid_uri(input, e.to_string()))
}

fn check_scheme(url: &Url) -> Result<()> {
    if !url.scheme().eq_ignore_ascii_case(SCHEME) {
        return Err(Error::invalid_uri(
            url.as_str(),
            format!("expected scheme `{}`, got `{}`", SCHEME, url.scheme()),
        ));
    }
    Ok(())
}

/// Path of `scheme://authority/path?query#fragment`, exactly as written / 原始路径
fn raw_path(input: &str) -> &str {
    let rest = match input.trim().split_once("://") {
        Some((_, rest)) => rest,
        None => return "",
    };
    let end = rest.find(|c: char| c == '?' || c == '#').unwrap_or(rest.len());
    let rest = &rest[..end];
    match rest.find('/') {
        Some(start) => &rest[start..],
        None => "",
    }
}

impl fmt::Display for S3Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}{}", SCHEME, self.bucket, self.path)
    }
}

impl FromStr for S3Uri {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<&Url> for S3Uri {
    type Error = Error;

    fn try_from(url: &Url) -> Result<Self> {
        Self::from_url(url)
    }
}

impl Serialize for S3Uri {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for S3Uri {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_strips_leading_slash() {
        let uri: S3Uri = "s3://bucket/path/file.ext".parse().unwrap();
        assert_eq!(uri.bucket(), "bucket");
        assert_eq!(uri.key().unwrap(), "path/file.ext");
    }

    #[test]
    fn test_parse_decodes_key() {
        let uri = S3Uri::parse("s3://bucket/a/b%20c.ext").unwrap();
        assert_eq!(uri.key().unwrap(), "a/b c.ext");
        assert_eq!(uri.path(), "/a/b%20c.ext");
    }

    #[test]
    fn test_parse_raw_space_is_encoded() {
        let uri = S3Uri::parse("s3://bucket/a/b c.ext").unwrap();
        assert_eq!(uri.path(), "/a/b%20c.ext");
        assert_eq!(uri.key().unwrap(), "a/b c.ext");
    }

    #[test]
    fn test_build() {
        let uri = S3Uri::build("test_bucket_name", "path/to/somewhere");
        assert_eq!(uri.scheme(), "s3");
        assert_eq!(uri.host(), "test_bucket_name");
        assert_eq!(uri.path(), "/path/to/somewhere");
    }

    #[test]
    fn test_build_end_to_end() {
        let uri = S3Uri::build("my-bucket", "path/to/file.ext");
        assert_eq!(uri.scheme(), "s3");
        assert_eq!(uri.host(), "my-bucket");
        assert_eq!(uri.path(), "/path/to/file.ext");
        assert_eq!(uri.key().unwrap(), "path/to/file.ext");
        assert_eq!(uri.to_string(), "s3://my-bucket/path/to/file.ext");
    }

    #[test]
    fn test_build_empty_key_is_root() {
        let uri = S3Uri::build("bucket", "");
        assert_eq!(uri.path(), "/");
        assert!(uri.is_root());
        assert_eq!(uri.key().unwrap(), "");
    }

    #[test]
    fn test_build_round_trip() {
        for key in [
            "demos/fanfold/4563_VALPACK_55-1 (1).jpg",
            "a+b/c&d=e?f#g",
            "percent%20literal",
            "中文/目录/文件.txt",
            "dir/",
            "logs/../secret.txt",
            "a/./b",
            "./x",
            "../..",
        ] {
            let uri = S3Uri::build("bucket", key);
            assert_eq!(uri.key().unwrap(), key, "key {:?}", key);
            let reparsed = S3Uri::parse(&uri.to_string()).unwrap();
            assert_eq!(reparsed, uri);
            assert_eq!(reparsed.key().unwrap(), key);
        }
    }

    #[test]
    fn test_parse_keeps_dot_segments() {
        let uri = S3Uri::parse("s3://bucket/a/./b").unwrap();
        assert_eq!(uri.path(), "/a/./b");
        assert_eq!(uri.key().unwrap(), "a/./b");

        let uri = S3Uri::parse("s3://bucket/logs/../secret.txt").unwrap();
        assert_eq!(uri.key().unwrap(), "logs/../secret.txt");

        let uri = S3Uri::parse("s3://bucket/logs/%2E%2E/secret.txt").unwrap();
        assert_eq!(uri.key().unwrap(), "logs/../secret.txt");
    }

    #[test]
    fn test_from_url_loses_dot_segments() {
        let url = Url::parse("s3://bucket/a/./b").unwrap();
        assert_eq!(S3Uri::from_url(&url).unwrap().key().unwrap(), "a/b");
    }

    #[test]
    fn test_raw_path() {
        assert_eq!(raw_path("s3://bucket/a/../b?x#y"), "/a/../b");
        assert_eq!(raw_path("s3://bucket"), "");
        assert_eq!(raw_path("s3://bucket/"), "/");
    }

    #[test]
    fn test_bucket_root_without_path() {
        let uri = S3Uri::parse("s3://bucket").unwrap();
        assert_eq!(uri.path(), "/");
        assert_eq!(uri.key().unwrap(), "");
    }

    #[test]
    fn test_parse_rejects_invalid() {
        assert!(matches!(S3Uri::parse("https://bucket/key"), Err(Error::InvalidUri { .. })));
        assert!(matches!(S3Uri::parse("s3:///key"), Err(Error::InvalidUri { .. })));
        assert!(matches!(S3Uri::parse("s3://bucket/key?x=1"), Err(Error::InvalidUri { .. })));
        assert!(matches!(S3Uri::parse("s3://user@bucket/key"), Err(Error::InvalidUri { .. })));
        assert!(matches!(S3Uri::parse("not a uri"), Err(Error::InvalidUri { .. })));
    }

    #[test]
    fn test_join() {
        let uri = S3Uri::build("bucket", "photos");
        assert_eq!(uri.join("a b.jpg").key().unwrap(), "photos/a b.jpg");
        let root = S3Uri::build("bucket", "");
        assert_eq!(root.join("x").path(), "/x");
    }

    #[test]
    fn test_serde_uses_string_form() {
        let uri = S3Uri::build("bucket", "a b");
        let json = serde_json::to_string(&uri).unwrap();
        assert_eq!(json, "\"s3://bucket/a%20b\"");
        let back: S3Uri = serde_json::from_str(&json).unwrap();
        assert_eq!(back, uri);
    }
}
