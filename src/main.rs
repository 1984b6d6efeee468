use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use futures::TryStreamExt;
use tokio::io::AsyncWriteExt;

use uri_s3::logging::{init_logging, DEFAULT_FILTER};
use uri_s3::options::{DEFAULT_PAGE_SIZE, DEFAULT_PRESIGN_EXPIRY};
use uri_s3::{
    load_config, register_schemes, storage, CannedAcl, ClientOptions, HttpUrlOptions,
    ListOptions, PutOptions, S3Object, UploadUrlOptions,
};

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (built ", env!("BUILD_TIME"), ")");

/// Work with S3 objects addressed as s3://bucket/key URIs
#[derive(Parser, Debug)]
#[command(name = "uri-s3", version = VERSION, about)]
struct Cli {
    /// JSON file with client options / 配置文件
    #[arg(long, global = true, default_value = "config.json")]
    config: PathBuf,

    /// Region override (skips the bucket location lookup)
    #[arg(long, global = true)]
    region: Option<String>,

    /// Custom endpoint, e.g. http://localhost:9000
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Named profile from the shared AWS config files
    #[arg(long, global = true)]
    profile: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every object under a key prefix
    Ls {
        uri: String,
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        page_size: i32,
    },
    /// Write an object to stdout
    Cat { uri: String },
    /// Upload a local file
    Put {
        uri: String,
        file: PathBuf,
        #[arg(long)]
        content_type: Option<String>,
        /// Canned ACL, e.g. public_read
        #[arg(long)]
        acl: Option<String>,
        /// User metadata as key=value, repeatable
        #[arg(long = "meta", value_name = "KEY=VALUE")]
        metadata: Vec<String>,
    },
    /// Download an object into a local file
    Get { uri: String, file: PathBuf },
    /// Delete an object
    Rm { uri: String },
    /// Show object metadata as JSON
    Stat { uri: String },
    /// Print an HTTP URL for the object
    Url {
        uri: String,
        /// Presign for this many seconds instead of printing the public URL
        #[arg(long)]
        expires_in: Option<u64>,
        /// Presigned PUT URL instead of GET
        #[arg(long)]
        upload: bool,
        /// With --upload: the uploaded object becomes public-read
        #[arg(long)]
        public_read: bool,
        /// Content-Disposition served with a presigned GET
        #[arg(long)]
        content_disposition: Option<String>,
        /// Content-Type served with a presigned GET
        #[arg(long)]
        response_content_type: Option<String>,
    },
    /// Show whether an object is public, or apply a canned ACL
    Acl {
        uri: String,
        #[arg(long)]
        set: Option<String>,
    },
    /// Exit with status 0 if the object exists, 1 otherwise
    Exists { uri: String },
}

impl Command {
    fn uri(&self) -> &str {
        match self {
            Command::Ls { uri, .. }
            | Command::Cat { uri }
            | Command::Put { uri, .. }
            | Command::Get { uri, .. }
            | Command::Rm { uri }
            | Command::Stat { uri }
            | Command::Url { uri, .. }
            | Command::Acl { uri, .. }
            | Command::Exists { uri } => uri,
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    init_logging(DEFAULT_FILTER);

    let cli = Cli::parse();

    let file_options = load_config(&cli.config)?;
    let options = cli_options(&cli).or(&file_options);

    let registry = storage::global();
    register_schemes(registry)?;

    let object = registry
        .open(cli.command.uri(), options)
        .with_context(|| format!("Cannot open {}", cli.command.uri()))?;

    run(cli.command, &object).await
}

async fn run(command: Command, object: &S3Object) -> Result<ExitCode> {
    match command {
        Command::Ls { page_size, .. } => {
            let mut entries = object.index(ListOptions::with_page_size(page_size)).await?;
            while let Some(entry) = entries.try_next().await? {
                let modified = entry
                    .last_modified
                    .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_default();
                println!("{:>19}  {:>12}  {}", modified, entry.size, entry.key);
            }
        }
        Command::Cat { .. } => {
            let mut reader = object.fetch().await?;
            let mut stdout = tokio::io::stdout();
            tokio::io::copy(&mut reader, &mut stdout).await?;
            stdout.flush().await?;
        }
        Command::Put {
            file,
            content_type,
            acl,
            metadata,
            ..
        } => {
            let put = put_options(content_type, acl.as_deref(), &metadata)?;
            object.upload_file(&file, put).await?;
            tracing::info!("Uploaded {:?} to {}", file, object.uri());
        }
        Command::Get { file, .. } => {
            let written = object.download_file(&file).await?;
            tracing::info!("Downloaded {} to {:?} ({} bytes)", object.uri(), file, written);
        }
        Command::Rm { .. } => {
            object.destroy().await?;
            tracing::info!("Deleted {}", object.uri());
        }
        Command::Stat { .. } => match object.head().await {
            Ok(head) => println!("{}", serde_json::to_string_pretty(&head)?),
            Err(e) if e.is_not_found() => {
                eprintln!("{}", e);
                return Ok(ExitCode::FAILURE);
            }
            Err(e) => return Err(e.into()),
        },
        Command::Url {
            expires_in,
            upload,
            public_read,
            content_disposition,
            response_content_type,
            ..
        } => {
            let url = if upload {
                let mut url_options = UploadUrlOptions::default();
                url_options.public_read = public_read;
                if let Some(secs) = expires_in {
                    url_options = url_options.with_expires_in(Duration::from_secs(secs));
                }
                object.upload_url(url_options).await?
            } else {
                let url_options =
                    http_options(expires_in, content_disposition, response_content_type);
                object.to_http(url_options).await?
            };
            println!("{}", url);
        }
        Command::Acl { set, .. } => match set {
            Some(permission) => {
                object.set_permissions(&permission).await?;
                tracing::info!("Applied ACL {} to {}", permission, object.uri());
            }
            None => {
                let public = object.is_public().await?;
                println!("{}", if public { "public-read" } else { "private" });
            }
        },
        Command::Exists { .. } => {
            let exists = object.exists().await?;
            println!("{}", exists);
            if !exists {
                return Ok(ExitCode::FAILURE);
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn cli_options(cli: &Cli) -> ClientOptions {
    let mut options = ClientOptions::new();
    if let Some(region) = &cli.region {
        options = options.with_region(region);
    }
    if let Some(endpoint) = &cli.endpoint {
        options = options.with_endpoint(endpoint);
    }
    if let Some(profile) = &cli.profile {
        options = options.with_profile(profile);
    }
    options
}

fn put_options(
    content_type: Option<String>,
    acl: Option<&str>,
    metadata: &[String],
) -> Result<PutOptions> {
    let mut put = PutOptions::default();
    if let Some(content_type) = content_type {
        put = put.with_content_type(content_type);
    }
    if let Some(acl) = acl {
        put = put.with_acl(CannedAcl::from_permission(acl)?);
    }
    for pair in metadata {
        let (key, value) = pair
            .split_once('=')
            .with_context(|| format!("metadata must be KEY=VALUE, got {:?}", pair))?;
        put = put.with_metadata(key, value);
    }
    Ok(put)
}

/// Response overrides only apply to signed URLs, so they imply the default expiry
fn http_options(
    expires_in: Option<u64>,
    content_disposition: Option<String>,
    response_content_type: Option<String>,
) -> HttpUrlOptions {
    let overrides = content_disposition.is_some() || response_content_type.is_some();
    let mut options = match expires_in {
        Some(secs) => HttpUrlOptions::presigned(Duration::from_secs(secs)),
        None if overrides => HttpUrlOptions::presigned(DEFAULT_PRESIGN_EXPIRY),
        None => return HttpUrlOptions::default(),
    };
    if let Some(disposition) = content_disposition {
        options = options.with_content_disposition(disposition);
    }
    if let Some(content_type) = response_content_type {
        options = options.with_response_content_type(content_type);
    }
    options
}
