//! Lazy paginated listing over ListObjectsV2 / 分页列举
//!
//! Pages are fetched one at a time: the next request is only issued once the
//! entries of the current page have all been consumed. The stream is finite,
//! single-pass, and ends after the first backend error.

use std::collections::VecDeque;
use std::sync::Arc;

use futures::stream::{self, BoxStream, StreamExt};

use crate::error::Result;
use crate::storage::{ListRequest, ListingEntry, ObjectStore};

struct ListState {
    store: Arc<dyn ObjectStore>,
    request: ListRequest,
    buffered: VecDeque<ListingEntry>,
    pages: usize,
    exhausted: bool,
}

impl ListState {
    /// Fetch the next page into the buffer / 拉取下一页
    async fn fetch_page(&mut self) -> Result<()> {
        let page = self.store.list_objects_v2(&self.request).await?;
        self.pages += 1;

        tracing::debug!(
            "Listed page {} of s3://{}/{}: {} entries, truncated={}",
            self.pages,
            self.request.bucket,
            self.request.prefix,
            page.entries.len(),
            page.is_truncated
        );

        self.buffered.extend(page.entries);

        match (page.is_truncated, page.next_continuation_token) {
            (true, Some(token)) => self.request.continuation_token = Some(token),
            (true, None) => {
                // 无法继续：没有令牌只能重新读取第一页
                tracing::warn!(
                    "Truncated listing of s3://{}/{} returned no continuation token, stopping",
                    self.request.bucket,
                    self.request.prefix
                );
                self.exhausted = true;
            }
            (false, _) => self.exhausted = true,
        }
        Ok(())
    }
}

/// Stream every entry under `request.prefix` / 流式列举前缀下的所有对象
///
/// `request.continuation_token` is normally `None`; the bucket, prefix and
/// page size stay fixed for the whole listing.
pub fn list_entries(
    store: Arc<dyn ObjectStore>,
    request: ListRequest,
) -> BoxStream<'static, Result<ListingEntry>> {
    let state = ListState {
        store,
        request,
        buffered: VecDeque::new(),
        pages: 0,
        exhausted: false,
    };

    stream::try_unfold(state, |mut state| async move {
        loop {
            if let Some(entry) = state.buffered.pop_front() {
                return Ok(Some((entry, state)));
            }
            if state.exhausted {
                return Ok(None);
            }
            state.fetch_page().await?;
        }
    })
    .boxed()
}
