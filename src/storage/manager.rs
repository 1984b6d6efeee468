use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use url::Url;

use super::StoreFactory;
use crate::config::ClientOptions;
use crate::error::{Error, Result};
use crate::object::S3Object;
use crate::uri::{S3Uri, SCHEME};

pub type FactoryBox = Arc<dyn StoreFactory>;

/// Process-wide registry, created empty / 全局 scheme 注册表
static GLOBAL_REGISTRY: Lazy<SchemeRegistry> = Lazy::new(SchemeRegistry::new);

/// URI scheme registry (scheme -> store factory) / URI scheme 注册表
#[derive(Clone, Default)]
pub struct SchemeRegistry {
    factories: Arc<RwLock<HashMap<String, FactoryBox>>>,
}

impl SchemeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a store factory for a scheme / 注册 scheme
    /// Re-registering a scheme replaces the previous factory.
    pub fn register_scheme(&self, scheme: &str, factory: FactoryBox) -> Result<()> {
        let scheme = normalize_scheme(scheme)?;
        let name = factory.name();

        let previous = self.factories.write().insert(scheme.clone(), factory);
        match previous {
            Some(old) => tracing::info!(
                "URI scheme re-registered: {} ({} -> {})",
                scheme,
                old.name(),
                name
            ),
            None => tracing::info!("URI scheme registered: {} ({})", scheme, name),
        }
        Ok(())
    }

    /// Remove a scheme / 移除 scheme
    pub fn unregister_scheme(&self, scheme: &str) -> Result<()> {
        let scheme = scheme.to_ascii_lowercase();
        self.factories
            .write()
            .remove(&scheme)
            .ok_or_else(|| Error::UnsupportedScheme(scheme.clone()))?;

        tracing::info!("URI scheme removed: {}", scheme);
        Ok(())
    }

    pub fn factory(&self, scheme: &str) -> Option<FactoryBox> {
        self.factories.read().get(&scheme.to_ascii_lowercase()).cloned()
    }

    pub fn is_registered(&self, scheme: &str) -> bool {
        self.factories
            .read()
            .contains_key(&scheme.to_ascii_lowercase())
    }

    /// Registered schemes, sorted / 已注册的 scheme
    pub fn schemes(&self) -> Vec<String> {
        let mut schemes: Vec<String> = self.factories.read().keys().cloned().collect();
        schemes.sort();
        schemes
    }

    /// Parse a URI string and open the object it addresses / 解析 URI 并打开对象
    ///
    /// The key comes from the raw path of `uri`, dot segments included.
    pub fn open(&self, uri: &str, options: ClientOptions) -> Result<S3Object> {
        let url = Url::parse(uri).map_err(|e| Error::invalid_uri(uri, e.to_string()))?;
        let factory = self.lookup(url.scheme())?;
        let location = S3Uri::from_url_unchecked(&url, Some(uri))?;
        Ok(S3Object::new(location, factory, options))
    }

    /// Open an already parsed URL; see [`S3Uri::from_url`] for the dot segment caveat
    pub fn open_url(&self, url: &Url, options: ClientOptions) -> Result<S3Object> {
        let factory = self.lookup(url.scheme())?;
        let location = S3Uri::from_url_unchecked(url, None)?;
        Ok(S3Object::new(location, factory, options))
    }

    fn lookup(&self, scheme: &str) -> Result<FactoryBox> {
        self.factory(scheme)
            .ok_or_else(|| Error::UnsupportedScheme(scheme.to_string()))
    }
}

/// Lowercase and validate a scheme name (RFC 3986) / 校验 scheme 名称
fn normalize_scheme(scheme: &str) -> Result<String> {
    let mut chars = scheme.chars();
    let valid = chars.next().map_or(false, |c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    if !valid {
        return Err(Error::InvalidArgument(format!("invalid uri scheme: {:?}", scheme)));
    }
    Ok(scheme.to_ascii_lowercase())
}

/// Get the process-wide registry / 获取全局注册表
pub fn global() -> &'static SchemeRegistry {
    &GLOBAL_REGISTRY
}

/// Register the built-in `s3` scheme / 注册内置的 s3 scheme
/// Call once during startup; nothing is registered implicitly.
pub fn register_schemes(registry: &SchemeRegistry) -> Result<()> {
    registry.register_scheme(SCHEME, Arc::new(crate::drivers::s3::AwsStoreFactory))
}
