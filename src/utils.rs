//! Object key utility functions / 对象键工具函数

use url::Url;

use crate::error::{Error, Result};

/// Default region for buckets whose location constraint is empty / 默认区域
pub const DEFAULT_REGION: &str = "us-east-1";

/// Encode a logical key into a URI path body / 将对象键编码为 URI 路径
/// Each `/`-separated segment is percent-encoded on its own, so the separators
/// survive and a space becomes `%20` (never `+`).
/// 每个分段独立编码，分隔符保留
pub fn encode_key(key: &str) -> String {
    key.split('/')
        .map(|segment| urlencoding::encode(segment))
        .collect::<Vec<_>>()
        .join("/")
}

/// Decode a URI path body back into the logical key / 将 URI 路径解码为对象键
pub fn decode_key(path: &str) -> Result<String> {
    urlencoding::decode(path)
        .map(|key| key.into_owned())
        .map_err(|source| Error::KeyDecode {
            path: path.to_string(),
            source,
        })
}

/// Strip exactly one leading separator / 去掉一个开头的 /
pub fn strip_root(path: &str) -> &str {
    path.strip_prefix('/').unwrap_or(path)
}

/// Whether the bucket name can be used as a virtual host label / 判断桶名是否可作为虚拟主机
/// Lowercase letters, digits and `-` only; dotted names do not qualify.
pub fn is_dns_compatible_bucket(bucket: &str) -> bool {
    let bytes = bucket.as_bytes();
    if !(3..=63).contains(&bytes.len()) {
        return false;
    }
    let edge_ok = |b: u8| b.is_ascii_lowercase() || b.is_ascii_digit();
    edge_ok(bytes[0])
        && edge_ok(bytes[bytes.len() - 1])
        && bytes
            .iter()
            .all(|&b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}

/// Compose the unsigned public URL of an object / 生成对象的公开访问地址
///
/// - AWS, DNS-compatible bucket: `https://{bucket}.s3.{region}.amazonaws.com/{key}`
/// - AWS, other bucket names: `https://s3.{region}.amazonaws.com/{bucket}/{key}`
/// - custom endpoint + path style: `{endpoint}/{bucket}/{key}`
/// - custom endpoint: `{scheme}://{bucket}.{host}/{key}`
pub fn public_object_url(
    bucket: &str,
    key: &str,
    region: &str,
    endpoint: Option<&str>,
    force_path_style: bool,
) -> Result<Url> {
    let encoded = encode_key(key);

    let raw = match endpoint {
        Some(endpoint) => {
            let base = Url::parse(endpoint)?;
            let host = base
                .host_str()
                .ok_or_else(|| Error::Config(format!("endpoint has no host: {}", endpoint)))?;
            let authority = match base.port() {
                Some(port) => format!("{}:{}", host, port),
                None => host.to_string(),
            };
            if force_path_style || !is_dns_compatible_bucket(bucket) {
                format!("{}/{}/{}", endpoint.trim_end_matches('/'), bucket, encoded)
            } else {
                format!("{}://{}.{}/{}", base.scheme(), bucket, authority, encoded)
            }
        }
        None => {
            if force_path_style || !is_dns_compatible_bucket(bucket) {
                format!("https://s3.{}.amazonaws.com/{}/{}", region, bucket, encoded)
            } else {
                format!("https://{}.s3.{}.amazonaws.com/{}", bucket, region, encoded)
            }
        }
    };

    Ok(Url::parse(&raw)?)
}
