//! Backend client configuration / 后端客户端配置
//!
//! Options are passed through to the store factory. Anything left unset is
//! resolved by the backend client from the ambient environment
//! (`AWS_REGION`, `AWS_PROFILE`, shared credentials file, ...).

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};

/// Client options / 客户端选项
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientOptions {
    /// Region override; when unset the bucket location is queried / 区域
    pub region: Option<String>,
    /// Custom endpoint (MinIO, R2, LocalStack, ...) / 自定义端点
    /// MinIO: http://localhost:9000
    pub endpoint: Option<String>,
    /// Access Key ID
    pub access_key_id: Option<String>,
    /// Secret Access Key
    pub secret_access_key: Option<String>,
    /// Session Token（用于临时凭证）
    pub session_token: Option<String>,
    /// Named profile from the shared config files / 配置文件中的 profile
    pub profile: Option<String>,
    /// 强制使用路径风格（而非虚拟主机风格）
    /// MinIO等需要设置为true
    pub force_path_style: bool,
}

impl ClientOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_credentials(
        mut self,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        self.access_key_id = Some(access_key_id.into());
        self.secret_access_key = Some(secret_access_key.into());
        self
    }

    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    pub fn with_path_style(mut self, force_path_style: bool) -> Self {
        self.force_path_style = force_path_style;
        self
    }

    /// Same options without the region override / 去掉区域覆盖
    pub fn without_region(&self) -> Self {
        Self {
            region: None,
            ..self.clone()
        }
    }

    /// Explicit static credentials, if both halves are present / 静态凭证
    pub fn static_credentials(&self) -> Option<(&str, &str)> {
        match (&self.access_key_id, &self.secret_access_key) {
            (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty() => {
                Some((id.as_str(), secret.as_str()))
            }
            _ => None,
        }
    }

    /// Fill unset fields from `fallback` / 用另一份配置补全未设置的字段
    pub fn or(self, fallback: &ClientOptions) -> Self {
        Self {
            region: self.region.or_else(|| fallback.region.clone()),
            endpoint: self.endpoint.or_else(|| fallback.endpoint.clone()),
            access_key_id: self.access_key_id.or_else(|| fallback.access_key_id.clone()),
            secret_access_key: self
                .secret_access_key
                .or_else(|| fallback.secret_access_key.clone()),
            session_token: self.session_token.or_else(|| fallback.session_token.clone()),
            profile: self.profile.or_else(|| fallback.profile.clone()),
            force_path_style: self.force_path_style || fallback.force_path_style,
        }
    }
}

/// Load options from a JSON file; a missing file yields defaults / 从 JSON 文件加载配置
pub fn load_config(path: &Path) -> Result<ClientOptions> {
    if !path.exists() {
        tracing::debug!("No config file at {:?}, using defaults", path);
        return Ok(ClientOptions::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read config file {:?}: {}", path, e)))?;

    let options: ClientOptions = serde_json::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse config file {:?}: {}", path, e)))?;

    tracing::info!("Loaded configuration from {:?}", path);
    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let options = ClientOptions::new()
            .with_region("us-east-2")
            .with_endpoint("http://localhost:9000")
            .with_credentials("access", "secret")
            .with_session_token("token")
            .with_path_style(true);

        assert_eq!(options.region.as_deref(), Some("us-east-2"));
        assert_eq!(options.endpoint.as_deref(), Some("http://localhost:9000"));
        assert_eq!(options.static_credentials(), Some(("access", "secret")));
        assert_eq!(options.session_token.as_deref(), Some("token"));
        assert!(options.force_path_style);
        assert!(options.without_region().region.is_none());
    }

    #[test]
    fn test_static_credentials_need_both_halves() {
        let mut options = ClientOptions::default();
        options.access_key_id = Some("access".to_string());
        assert!(options.static_credentials().is_none());
    }

    #[test]
    fn test_or_prefers_own_values() {
        let file = ClientOptions::new().with_region("eu-west-1").with_profile("ci");
        let merged = ClientOptions::new().with_region("us-west-2").or(&file);
        assert_eq!(merged.region.as_deref(), Some("us-west-2"));
        assert_eq!(merged.profile.as_deref(), Some("ci"));
    }

    #[test]
    fn test_load_config_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let options = load_config(&dir.path().join("absent.json")).unwrap();
        assert_eq!(options, ClientOptions::default());
    }

    #[test]
    fn test_load_config_partial_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"endpoint": "http://localhost:9000", "force_path_style": true}"#).unwrap();

        let options = load_config(&path).unwrap();
        assert_eq!(options.endpoint.as_deref(), Some("http://localhost:9000"));
        assert!(options.force_path_style);
        assert!(options.region.is_none());
    }

    #[test]
    fn test_load_config_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(load_config(&path), Err(Error::Config(_))));
    }
}
