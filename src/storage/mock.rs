//! In-memory store used by unit tests / 单元测试用的内存存储

use std::collections::{HashMap, HashSet};
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use tokio::io::{AsyncRead, AsyncReadExt, ReadBuf};
use url::Url;

use super::{
    CopyObjectRequest, ListPage, ListRequest, ListingEntry, MetadataDirective, ObjectData,
    ObjectHead, ObjectReader, ObjectStore, PresignMethod, PresignRequest, PutObjectRequest,
    StoreFactory,
};
use crate::acl::{CannedAcl, Grant};
use crate::config::ClientOptions;
use crate::error::{Error, Result};
use crate::utils::encode_key;

/// Recorded backend call / 记录的后端调用
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    BucketLocation(String),
    List(ListRequest),
    Get(String),
    Put(PutObjectRequest),
    Head(String),
    Delete(String),
    GetAcl(String),
    PutAcl(String, CannedAcl),
    Copy(CopyObjectRequest),
    Presign(PresignRequest),
}

#[derive(Default)]
struct MockState {
    location: Option<String>,
    /// Pages keyed by the continuation token that requests them
    pages: HashMap<Option<String>, ListPage>,
    failing_token: Option<String>,
    objects: HashMap<String, (Bytes, ObjectHead)>,
    grants: Vec<Grant>,
    deny_head: bool,
    /// Keys whose body fails after the stored bytes
    broken: HashSet<String>,
    calls: Vec<Call>,
}

pub struct MockStore {
    state: Mutex<MockState>,
}

impl MockStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState::default()),
        }
    }

    pub fn set_location(&self, location: Option<&str>) {
        self.state.lock().location = location.map(str::to_string);
    }

    /// Page served for requests carrying `token` / 指定令牌对应的页
    pub fn add_page(&self, token: Option<&str>, page: ListPage) {
        self.state.lock().pages.insert(token.map(str::to_string), page);
    }

    pub fn fail_listing_at(&self, token: &str) {
        self.state.lock().failing_token = Some(token.to_string());
    }

    pub fn insert_object(&self, key: &str, body: &[u8], content_type: Option<&str>) {
        let head = ObjectHead {
            content_type: content_type.map(str::to_string),
            content_length: body.len() as u64,
            last_modified: chrono::DateTime::from_timestamp(1_640_995_200, 0),
            e_tag: Some(format!("\"etag-{}\"", body.len())),
            metadata: HashMap::from([("origin".to_string(), "mock".to_string())]),
        };
        self.state
            .lock()
            .objects
            .insert(key.to_string(), (Bytes::copy_from_slice(body), head));
    }

    pub fn object_body(&self, key: &str) -> Option<Bytes> {
        self.state.lock().objects.get(key).map(|(body, _)| body.clone())
    }

    pub fn object_head(&self, key: &str) -> Option<ObjectHead> {
        self.state.lock().objects.get(key).map(|(_, head)| head.clone())
    }

    pub fn set_grants(&self, grants: Vec<Grant>) {
        self.state.lock().grants = grants;
    }

    pub fn deny_head(&self) {
        self.state.lock().deny_head = true;
    }

    /// Body of `key` errors once its stored bytes are read / 读完数据后报错
    pub fn break_body(&self, key: &str) {
        self.state.lock().broken.insert(key.to_string());
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    pub fn list_calls(&self) -> Vec<ListRequest> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::List(request) => Some(request),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.state.lock().calls.iter().filter(|&c| predicate(c)).count()
    }

    fn record(&self, call: Call) {
        self.state.lock().calls.push(call);
    }
}

pub fn entry(key: &str, size: u64) -> ListingEntry {
    ListingEntry {
        key: key.to_string(),
        size,
        last_modified: None,
        e_tag: None,
        storage_class: Some("STANDARD".to_string()),
    }
}

pub fn page(keys: &[&str], next_token: Option<&str>) -> ListPage {
    ListPage {
        entries: keys.iter().map(|k| entry(k, k.len() as u64)).collect(),
        is_truncated: next_token.is_some(),
        next_continuation_token: next_token.map(str::to_string),
    }
}

/// Reader failing like a dropped connection
struct BrokenReader;

impl AsyncRead for BrokenReader {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Poll::Ready(Err(io::Error::new(
            io::ErrorKind::ConnectionReset,
            "connection reset",
        )))
    }
}

fn missing(key: &str) -> Error {
    Error::backend(
        "GetObject",
        io::Error::new(io::ErrorKind::NotFound, format!("NoSuchKey: {}", key)),
    )
}

#[async_trait]
impl ObjectStore for MockStore {
    async fn get_bucket_location(&self, bucket: &str) -> Result<Option<String>> {
        self.record(Call::BucketLocation(bucket.to_string()));
        Ok(self.state.lock().location.clone())
    }

    async fn list_objects_v2(&self, request: &ListRequest) -> Result<ListPage> {
        self.record(Call::List(request.clone()));
        let state = self.state.lock();
        if request.continuation_token.is_some() && state.failing_token == request.continuation_token {
            return Err(Error::backend(
                "ListObjectsV2",
                io::Error::new(io::ErrorKind::ConnectionReset, "connection reset"),
            ));
        }
        Ok(state
            .pages
            .get(&request.continuation_token)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_object(&self, _bucket: &str, key: &str) -> Result<ObjectReader> {
        self.record(Call::Get(key.to_string()));
        let body = self.object_body(key).ok_or_else(|| missing(key))?;
        let reader = io::Cursor::new(body.to_vec());
        if self.state.lock().broken.contains(key) {
            return Ok(Box::pin(reader.chain(BrokenReader)));
        }
        Ok(Box::pin(reader))
    }

    async fn put_object(&self, request: PutObjectRequest) -> Result<()> {
        self.record(Call::Put(request.clone()));
        let body = match &request.body {
            ObjectData::Bytes(bytes) => bytes.to_vec(),
            ObjectData::File(path) => tokio::fs::read(path).await?,
        };
        self.insert_object(&request.key, &body, request.options.content_type.as_deref());
        Ok(())
    }

    async fn head_object(&self, _bucket: &str, key: &str) -> Result<Option<ObjectHead>> {
        self.record(Call::Head(key.to_string()));
        if self.state.lock().deny_head {
            return Err(Error::backend(
                "HeadObject",
                io::Error::new(io::ErrorKind::PermissionDenied, "AccessDenied"),
            ));
        }
        Ok(self.object_head(key))
    }

    async fn delete_object(&self, _bucket: &str, key: &str) -> Result<()> {
        self.record(Call::Delete(key.to_string()));
        self.state.lock().objects.remove(key);
        Ok(())
    }

    async fn get_object_acl(&self, _bucket: &str, key: &str) -> Result<Vec<Grant>> {
        self.record(Call::GetAcl(key.to_string()));
        Ok(self.state.lock().grants.clone())
    }

    async fn put_object_acl(&self, _bucket: &str, key: &str, acl: CannedAcl) -> Result<()> {
        self.record(Call::PutAcl(key.to_string(), acl));
        Ok(())
    }

    async fn copy_object(&self, request: &CopyObjectRequest) -> Result<()> {
        self.record(Call::Copy(request.clone()));
        let mut state = self.state.lock();
        let (body, mut head) = state
            .objects
            .get(&request.source_key)
            .cloned()
            .ok_or_else(|| missing(&request.source_key))?;
        if request.metadata_directive == MetadataDirective::Replace {
            head.content_type = request.content_type.clone();
            head.metadata.clear();
        }
        state.objects.insert(request.key.clone(), (body, head));
        Ok(())
    }

    async fn presign(&self, request: &PresignRequest) -> Result<String> {
        self.record(Call::Presign(request.clone()));
        let method = match request.method {
            PresignMethod::Get => "GET",
            PresignMethod::Put => "PUT",
        };
        Ok(format!(
            "https://{}.s3.amazonaws.com/{}?X-Amz-Expires={}&x-id={}",
            request.bucket,
            encode_key(&request.key),
            request.expires_in.as_secs(),
            method
        ))
    }

    fn public_url(&self, bucket: &str, key: &str) -> Result<Url> {
        Ok(Url::parse(&format!(
            "https://{}.s3.amazonaws.com/{}",
            bucket,
            encode_key(key)
        ))?)
    }
}

/// Factory handing out one shared [`MockStore`] / 返回同一个 MockStore 的工厂
pub struct MockFactory {
    store: Arc<MockStore>,
    connects: Mutex<Vec<ClientOptions>>,
}

impl MockFactory {
    pub fn new(store: Arc<MockStore>) -> Self {
        Self {
            store,
            connects: Mutex::new(Vec::new()),
        }
    }

    /// Options of every connect call, in order / 每次连接使用的选项
    pub fn connects(&self) -> Vec<ClientOptions> {
        self.connects.lock().clone()
    }
}

#[async_trait]
impl StoreFactory for MockFactory {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn connect(&self, options: &ClientOptions) -> Result<Arc<dyn ObjectStore>> {
        self.connects.lock().push(options.clone());
        Ok(self.store.clone())
    }
}
