//! `s3://` URIs for objects in S3 buckets / 以 s3:// URI 访问 S3 对象
//!
//! ```no_run
//! # async fn demo() -> uri_s3::Result<()> {
//! use uri_s3::{register_schemes, storage, ClientOptions, PutOptions};
//!
//! register_schemes(storage::global())?;
//! let object = storage::global().open("s3://my-bucket/path/to/file.ext", ClientOptions::default())?;
//! object.put("hello", PutOptions::default().with_content_type("text/plain")).await?;
//! assert!(object.exists().await?);
//! # Ok(())
//! # }
//! ```

pub mod acl;
pub mod config;
pub mod error;
pub mod listing;
pub mod logging;
pub mod object;
pub mod options;
pub mod storage;
pub mod uri;
pub mod utils;

// Storage backends (point to project root drivers via path attribute) / 存储后端
#[path = "../drivers/mod.rs"]
pub mod drivers;

pub use acl::{CannedAcl, Grant, Grantee};
pub use config::{load_config, ClientOptions};
pub use error::{Error, Result};
pub use listing::list_entries;
pub use object::S3Object;
pub use options::{HttpUrlOptions, ListOptions, PutOptions, UploadUrlOptions};
pub use storage::{register_schemes, ListingEntry, ObjectHead, ObjectStore, SchemeRegistry, StoreFactory};
pub use uri::S3Uri;
