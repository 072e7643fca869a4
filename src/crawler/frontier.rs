//! Per-branch request frontier and the crawl-wide seen-URL set
//!
//! A `Frontier` is a shared handle: every request popped from a branch
//! carries a clone of it, so whichever response comes back next can keep
//! draining the same queue. There is no global scheduler queue.

use crate::crawler::request::RequestDescriptor;
use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Ordered queue of pending requests for one crawl branch
///
/// FIFO for fetches appended during seeding; cart-probe continuations are
/// pushed to the front so in-progress probes finish before new pages start.
#[derive(Clone, Default)]
pub struct Frontier {
    queue: Arc<Mutex<VecDeque<RequestDescriptor>>>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<RequestDescriptor>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn push_back(&self, request: RequestDescriptor) {
        self.lock().push_back(request);
    }

    /// Inserts at index 0 (priority)
    pub fn push_front(&self, request: RequestDescriptor) {
        self.lock().push_front(request);
    }

    /// Pops up to `limit` requests from the front
    ///
    /// Each popped request is pointed at this frontier so its response can
    /// continue draining the branch.
    pub fn pop_batch(&self, limit: usize) -> Vec<RequestDescriptor> {
        let mut queue = self.lock();
        let take = limit.min(queue.len());

        queue
            .drain(..take)
            .map(|mut request| {
                request.context.frontier = self.clone();
                request
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// True when both handles refer to the same branch
    pub fn same_branch(&self, other: &Frontier) -> bool {
        Arc::ptr_eq(&self.queue, &other.queue)
    }
}

impl fmt::Debug for Frontier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pending = self.queue.try_lock().map(|q| q.len()).ok();
        f.debug_struct("Frontier").field("pending", &pending).finish()
    }
}

/// Normalized product URLs already enqueued during this run
///
/// Created when the crawl starts and only ever grows.
#[derive(Debug, Default)]
pub struct SeenUrls {
    urls: HashSet<String>,
}

impl SeenUrls {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `url` as seen; returns false if it already was
    pub fn insert(&mut self, url: &str) -> bool {
        if self.urls.contains(url) {
            return false;
        }
        self.urls.insert(url.to_string())
    }

    pub fn contains(&self, url: &str) -> bool {
        self.urls.contains(url)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::request::RequestKind;

    fn page(path: &str) -> RequestDescriptor {
        RequestDescriptor::get(
            RequestKind::ProductPage,
            format!("https://shop.example.com/{}.html", path),
        )
    }

    fn urls(batch: &[RequestDescriptor]) -> Vec<&str> {
        batch.iter().map(|r| r.url.as_str()).collect()
    }

    #[test]
    fn test_fifo_order() {
        let frontier = Frontier::new();
        for p in ["a", "b", "c"] {
            frontier.push_back(page(p));
        }

        let batch = frontier.pop_batch(2);
        assert_eq!(
            urls(&batch),
            vec!["https://shop.example.com/a.html", "https://shop.example.com/b.html"]
        );
        assert_eq!(frontier.len(), 1);
    }

    #[test]
    fn test_priority_insert_goes_first() {
        let frontier = Frontier::new();
        frontier.push_back(page("a"));
        frontier.push_front(page("probe"));

        let batch = frontier.pop_batch(1);
        assert_eq!(urls(&batch), vec!["https://shop.example.com/probe.html"]);
    }

    #[test]
    fn test_pop_batch_threads_frontier_forward() {
        let frontier = Frontier::new();
        frontier.push_back(page("a"));
        frontier.push_back(page("b"));

        let batch = frontier.pop_batch(1);
        assert!(batch[0].context.frontier.same_branch(&frontier));

        // The popped handle sees the shorter queue and can keep draining it.
        assert_eq!(batch[0].context.frontier.len(), 1);
        let rest = batch[0].context.frontier.pop_batch(4);
        assert_eq!(urls(&rest), vec!["https://shop.example.com/b.html"]);
        assert!(frontier.is_empty());
    }

    #[test]
    fn test_pop_batch_on_empty_frontier() {
        let frontier = Frontier::new();
        assert!(frontier.pop_batch(4).is_empty());
    }

    #[test]
    fn test_fresh_frontiers_are_separate_branches() {
        assert!(!Frontier::new().same_branch(&Frontier::new()));
    }

    #[test]
    fn test_seen_urls_write_once() {
        let mut seen = SeenUrls::new();
        assert!(seen.insert("https://shop.example.com/a.html"));
        assert!(!seen.insert("https://shop.example.com/a.html"));
        assert!(seen.contains("https://shop.example.com/a.html"));
        assert_eq!(seen.len(), 1);
    }
}
