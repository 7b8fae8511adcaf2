//! Paginated hashtag search with a stop marker.
//!
//! [`HandleEnumerator`] walks `searchPosts` pages newest-first and yields the
//! author of every post until it reaches the post recorded by the previous
//! run. The sequence is lazy (a page is fetched only once the previous one is
//! drained), finite, and non-restartable. The CID of the newest post seen is
//! captured as a *pending* marker; committing it to the cursor store is the
//! caller's job, after the run's work is confirmed complete.

use crate::agent::PostIndex;
use crate::error::Result;
use crate::xrpc::PostView;
use tracing::debug;

/// Author of a post the bot still has to reply to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub did: String,
    pub handle: String,
}

/// Lazy enumeration of recipients behind a fixed tag search
pub struct HandleEnumerator<'a, I: PostIndex> {
    index: &'a I,
    tag: String,
    limit: u8,
    /// Marker loaded at run start; enumeration stops at this CID
    stop_marker: String,
    /// CID of the first post of the first fetched page
    pending_marker: Option<String>,
    /// Remainder of the current page
    buffered: std::vec::IntoIter<PostView>,
    next_cursor: Option<String>,
    started: bool,
    done: bool,
}

impl<'a, I: PostIndex> HandleEnumerator<'a, I> {
    pub fn new(index: &'a I, tag: impl Into<String>, limit: u8, stop_marker: impl Into<String>) -> Self {
        Self {
            index,
            tag: tag.into(),
            limit,
            stop_marker: stop_marker.into(),
            pending_marker: None,
            buffered: Vec::new().into_iter(),
            next_cursor: None,
            started: false,
            done: false,
        }
    }

    /// The marker to commit once this run's sends succeeded. `None` until the
    /// first page arrives, or when the search returned nothing at all.
    pub fn pending_marker(&self) -> Option<&str> {
        self.pending_marker.as_deref()
    }

    /// Produce the next recipient, fetching further pages as needed.
    /// Returns `Ok(None)` once the stop marker is reached or the result set
    /// is exhausted; later calls keep returning `Ok(None)`.
    pub async fn next(&mut self) -> Result<Option<Recipient>> {
        loop {
            if self.done {
                return Ok(None);
            }

            if let Some(post) = self.buffered.next() {
                if post.cid == self.stop_marker {
                    debug!("Stop marker {} reached", self.stop_marker);
                    self.done = true;
                    return Ok(None);
                }
                return Ok(Some(Recipient {
                    did: post.author.did,
                    handle: post.author.handle,
                }));
            }

            // Current page drained; follow the continuation cursor, if any
            if self.started && self.next_cursor.is_none() {
                self.done = true;
                return Ok(None);
            }

            let page = self
                .index
                .search_page(&self.tag, self.limit, self.next_cursor.as_deref())
                .await?;
            debug!(
                "Fetched search page: {} posts, cursor {:?}",
                page.posts.len(),
                page.cursor
            );

            if !self.started {
                self.started = true;
                self.pending_marker = page.posts.first().map(|p| p.cid.clone());
            }

            if page.posts.is_empty() {
                self.done = true;
                return Ok(None);
            }

            self.next_cursor = page.cursor;
            self.buffered = page.posts.into_iter();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::xrpc::{AuthorView, SearchPostsOutput};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn post(cid: &str, handle: &str) -> PostView {
        PostView {
            uri: format!("at://did:plc:{handle}/app.bsky.feed.post/{cid}"),
            cid: cid.to_string(),
            author: AuthorView {
                did: format!("did:plc:{handle}"),
                handle: handle.to_string(),
                display_name: None,
            },
        }
    }

    fn page(posts: Vec<PostView>, cursor: Option<&str>) -> SearchPostsOutput {
        SearchPostsOutput {
            cursor: cursor.map(str::to_string),
            posts,
        }
    }

    /// PostIndex fake serving a scripted sequence of pages
    struct ScriptedIndex {
        pages: Mutex<VecDeque<SearchPostsOutput>>,
        fetches: AtomicUsize,
    }

    impl ScriptedIndex {
        fn new(pages: Vec<SearchPostsOutput>) -> Self {
            Self {
                pages: Mutex::new(pages.into()),
                fetches: AtomicUsize::new(0),
            }
        }

        fn fetch_count(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PostIndex for ScriptedIndex {
        async fn search_page(
            &self,
            _tag: &str,
            _limit: u8,
            _cursor: Option<&str>,
        ) -> Result<SearchPostsOutput> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.pages
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| Error::Other("unexpected page fetch".to_string()))
        }
    }

    async fn drain<I: PostIndex>(e: &mut HandleEnumerator<'_, I>) -> Vec<String> {
        let mut handles = Vec::new();
        while let Some(recipient) = e.next().await.unwrap() {
            handles.push(recipient.handle);
        }
        handles
    }

    #[tokio::test]
    async fn test_stops_at_marker_within_first_page() {
        let index = ScriptedIndex::new(vec![page(
            vec![post("c1", "alice"), post("c2", "bob"), post("c3", "carol")],
            Some("next"),
        )]);
        let mut e = HandleEnumerator::new(&index, "ineedahug", 100, "c3");

        let handles = drain(&mut e).await;

        // The two authors preceding the marker, in page order, one fetch total
        assert_eq!(handles, vec!["alice", "bob"]);
        assert_eq!(index.fetch_count(), 1);
        assert_eq!(e.pending_marker(), Some("c1"));
    }

    #[tokio::test]
    async fn test_marker_absent_walks_all_pages() {
        let index = ScriptedIndex::new(vec![
            page(vec![post("c1", "alice"), post("c2", "bob")], Some("p2")),
            page(vec![post("c3", "carol")], None),
        ]);
        let mut e = HandleEnumerator::new(&index, "ineedahug", 100, "unseen");

        let handles = drain(&mut e).await;

        assert_eq!(handles, vec!["alice", "bob", "carol"]);
        assert_eq!(index.fetch_count(), 2);
        assert_eq!(e.pending_marker(), Some("c1"));
    }

    #[tokio::test]
    async fn test_marker_in_second_page() {
        let index = ScriptedIndex::new(vec![
            page(vec![post("c1", "alice"), post("c2", "bob")], Some("p2")),
            page(vec![post("c3", "carol"), post("c4", "dave")], Some("p3")),
        ]);
        let mut e = HandleEnumerator::new(&index, "ineedahug", 100, "c3");

        let handles = drain(&mut e).await;

        // Page 3 is never requested once the marker is hit
        assert_eq!(handles, vec!["alice", "bob"]);
        assert_eq!(index.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_newest_post_already_processed() {
        let index = ScriptedIndex::new(vec![page(
            vec![post("c1", "alice"), post("c2", "bob")],
            Some("p2"),
        )]);
        let mut e = HandleEnumerator::new(&index, "ineedahug", 100, "c1");

        let handles = drain(&mut e).await;

        // Nothing new, but the pending marker still points at the newest post
        assert!(handles.is_empty());
        assert_eq!(e.pending_marker(), Some("c1"));
        assert_eq!(index.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_result_set() {
        let index = ScriptedIndex::new(vec![page(vec![], None)]);
        let mut e = HandleEnumerator::new(&index, "ineedahug", 100, "whatever");

        let handles = drain(&mut e).await;

        assert!(handles.is_empty());
        assert_eq!(e.pending_marker(), None);
    }

    #[tokio::test]
    async fn test_exhausted_after_done() {
        let index = ScriptedIndex::new(vec![page(vec![post("c1", "alice")], None)]);
        let mut e = HandleEnumerator::new(&index, "ineedahug", 100, "unseen");

        drain(&mut e).await;

        // Once finished the sequence stays finished
        assert!(e.next().await.unwrap().is_none());
        assert_eq!(index.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_search_failure_propagates() {
        let index = ScriptedIndex::new(vec![]);
        let mut e = HandleEnumerator::new(&index, "ineedahug", 100, "unseen");

        assert!(e.next().await.is_err());
    }
}
