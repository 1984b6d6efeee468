//! S3客户端配置 / AWS SDK client construction

use aws_config::meta::region::RegionProviderChain;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::Client;

use crate::config::ClientOptions;
use crate::utils::DEFAULT_REGION;

/// Name reported by static credentials / 静态凭证的提供者名称
const CREDENTIALS_PROVIDER: &str = "uri-s3";

/// Built client plus the region it signs for / 客户端及其签名区域
pub struct ClientParts {
    pub client: Client,
    pub region: String,
}

/// Build an S3 client from options, falling back to the ambient AWS
/// environment for anything unset / 按选项创建S3客户端
pub async fn build_client(options: &ClientOptions) -> ClientParts {
    let region = RegionProviderChain::first_try(options.region.clone().map(Region::new))
        .or_default_provider()
        .or_else(Region::new(DEFAULT_REGION));

    let mut loader = aws_config::defaults(BehaviorVersion::latest()).region(region);

    // 自定义端点（MinIO、R2、LocalStack）
    if let Some(endpoint) = &options.endpoint {
        loader = loader.endpoint_url(endpoint);
    }

    if let Some((access_key_id, secret_access_key)) = options.static_credentials() {
        let credentials = Credentials::new(
            access_key_id,
            secret_access_key,
            options.session_token.clone(),
            None,
            CREDENTIALS_PROVIDER,
        );
        loader = loader.credentials_provider(credentials);
    }

    if let Some(profile) = &options.profile {
        loader = loader.profile_name(profile);
    }

    let sdk_config = loader.load().await;
    let region = sdk_config
        .region()
        .map(|r| r.to_string())
        .unwrap_or_else(|| DEFAULT_REGION.to_string());

    let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
        .force_path_style(options.force_path_style)
        .build();

    ClientParts {
        client: Client::from_conf(s3_config),
        region,
    }
}
