use crate::types::{PostPage, PostSummary};

/// The post-index pagination controller. Owns the loaded summaries, the
/// opaque next-page cursor, and the ticket of the one fetch that may be
/// outstanding. All mutation goes through `start`/`finish`/`fail`; the
/// loading indicator is derived from the outstanding ticket, nothing else.
#[derive(Debug, Default)]
pub struct Listing {
    posts: Vec<PostSummary>,
    next_page: Option<String>,
    in_flight: Option<u64>,
}

impl Listing {
    /// Seed the listing from the first fetched page.
    pub fn new(page: PostPage) -> Self {
        Self {
            posts: page.results,
            next_page: page.next_page,
            in_flight: None,
        }
    }

    /// Begin loading the next page under `ticket`. Returns the cursor URL to
    /// fetch, or `None` when a fetch is already outstanding or the index is
    /// exhausted; callers treat `None` as a no-op.
    pub fn start(&mut self, ticket: u64) -> Option<String> {
        if self.in_flight.is_some() {
            return None;
        }
        let cursor = self.next_page.clone()?;
        self.in_flight = Some(ticket);
        Some(cursor)
    }

    /// Apply a fetched page: append its results and take over its cursor.
    /// Completions for any ticket other than the outstanding one are stale
    /// and ignored.
    pub fn finish(&mut self, ticket: u64, page: PostPage) {
        if self.in_flight != Some(ticket) {
            return;
        }
        self.in_flight = None;
        self.posts.extend(page.results);
        self.next_page = page.next_page;
    }

    /// A fetch under `ticket` failed: clear the outstanding marker and leave
    /// posts and cursor untouched, so the affordance doubles as retry.
    pub fn fail(&mut self, ticket: u64) {
        if self.in_flight == Some(ticket) {
            self.in_flight = None;
        }
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn has_more(&self) -> bool {
        self.next_page.is_some()
    }

    pub fn posts(&self) -> &[PostSummary] {
        &self.posts
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&PostSummary> {
        self.posts.get(index)
    }
}
