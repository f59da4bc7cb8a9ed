use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent};
use tokio::sync::mpsc;

use crate::action::Action;
use crate::cms::ContentSource;
use crate::config::SiteConfig;
use crate::error::BylineError;
use crate::listing::Listing;
use crate::tui::Event;
use crate::types::{Neighbor, PostView};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Index,    // paginated post listing
    Post,     // reading screen
    NotFound, // slug the API does not know
}

pub struct App {
    pub screen: Screen,

    // Index screen
    pub listing: Listing,
    pub post_index: usize,

    // Reading screen
    pub current_post: Option<PostView>,
    pub missing_slug: Option<String>,
    pub scroll_offset: usize,

    pub preview: Option<String>,
    pub error: Option<String>,
    pub should_quit: bool,
    pub site: SiteConfig,

    pending_index: Option<u64>,
    pending_post: Option<u64>,
    ticket: u64,
    source: Arc<dyn ContentSource>,
    action_tx: mpsc::UnboundedSender<Action>,
}

impl App {
    pub fn new(
        source: Arc<dyn ContentSource>,
        site: SiteConfig,
        preview: Option<String>,
        action_tx: mpsc::UnboundedSender<Action>,
    ) -> Self {
        Self {
            screen: Screen::Index,
            listing: Listing::default(),
            post_index: 0,
            current_post: None,
            missing_slug: None,
            scroll_offset: 0,
            preview,
            error: None,
            should_quit: false,
            site,
            pending_index: None,
            pending_post: None,
            ticket: 0,
            source,
            action_tx,
        }
    }

    /// True while any fetch is outstanding. Derived from request lifecycles
    /// only; there is no indicator timer.
    pub fn loading(&self) -> bool {
        self.pending_index.is_some() || self.pending_post.is_some() || self.listing.is_loading()
    }

    pub fn handle_event(&self, event: Event) -> Action {
        match event {
            Event::Init => Action::LoadIndex,
            Event::Key(key) => self.handle_key(key),
            _ => Action::None,
        }
    }

    fn handle_key(&self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                if self.screen == Screen::Index {
                    Action::Quit
                } else {
                    Action::Back
                }
            }
            KeyCode::Char('j') | KeyCode::Down => Action::ScrollDown,
            KeyCode::Char('k') | KeyCode::Up => Action::ScrollUp,
            KeyCode::Enter => {
                if self.screen == Screen::Index {
                    Action::Select
                } else {
                    Action::None
                }
            }
            // The load-more affordance only exists while the API reports
            // further pages and nothing is outstanding.
            KeyCode::Char('m') => {
                if self.screen == Screen::Index
                    && self.listing.has_more()
                    && !self.listing.is_loading()
                {
                    Action::LoadMore
                } else {
                    Action::None
                }
            }
            KeyCode::Char('r') => {
                if self.screen == Screen::Index {
                    Action::Refresh
                } else {
                    Action::None
                }
            }
            KeyCode::Char('x') => {
                if self.screen == Screen::Index && self.preview.is_some() {
                    Action::ExitPreview
                } else {
                    Action::None
                }
            }
            KeyCode::Char('p') => {
                if self.screen == Screen::Post {
                    Action::OpenNeighbor(Neighbor::Previous)
                } else {
                    Action::None
                }
            }
            KeyCode::Char('n') => {
                if self.screen == Screen::Post {
                    Action::OpenNeighbor(Neighbor::Next)
                } else {
                    Action::None
                }
            }
            KeyCode::Char('c') => {
                if self.screen == Screen::Post {
                    Action::OpenComments
                } else {
                    Action::None
                }
            }
            KeyCode::Char('o') => Action::OpenInBrowser,
            KeyCode::Char('y') => Action::YankUrl,
            _ => Action::None,
        }
    }

    pub fn update(&mut self, action: Action) {
        if self.error.is_some() && !matches!(action, Action::Quit | Action::Back) {
            self.error = None;
        }

        match action {
            Action::Quit => {
                self.should_quit = true;
            }
            Action::Back => match self.screen {
                Screen::Index => {
                    self.should_quit = true;
                }
                Screen::Post => {
                    self.screen = Screen::Index;
                    self.current_post = None;
                    self.scroll_offset = 0;
                    // A load still in flight is no longer wanted.
                    self.pending_post = None;
                }
                Screen::NotFound => {
                    self.screen = Screen::Index;
                    self.missing_slug = None;
                    self.pending_post = None;
                }
            },
            Action::ScrollUp => match self.screen {
                Screen::Index => {
                    if self.post_index > 0 {
                        self.post_index -= 1;
                    }
                }
                Screen::Post => {
                    if self.scroll_offset > 0 {
                        self.scroll_offset -= 1;
                    }
                }
                Screen::NotFound => {}
            },
            Action::ScrollDown => match self.screen {
                Screen::Index => {
                    if !self.listing.is_empty() && self.post_index < self.listing.len() - 1 {
                        self.post_index += 1;
                    }
                }
                Screen::Post => {
                    self.scroll_offset += 1;
                }
                Screen::NotFound => {}
            },
            Action::Select => {
                if let Some(post) = self.listing.get(self.post_index) {
                    let slug = post.slug.clone();
                    // Show the reading screen right away; it renders a
                    // placeholder until the fetch lands.
                    self.screen = Screen::Post;
                    self.current_post = None;
                    self.scroll_offset = 0;
                    self.spawn_load_post(slug);
                }
            }

            Action::LoadIndex | Action::Refresh => {
                self.spawn_load_index();
            }
            Action::IndexLoaded(page, ticket) => {
                if self.pending_index == Some(ticket) {
                    self.pending_index = None;
                    self.listing = Listing::new(page);
                    self.post_index = 0;
                }
            }

            Action::LoadMore => {
                let ticket = self.next_ticket();
                if let Some(cursor) = self.listing.start(ticket) {
                    self.spawn_fetch_page(cursor, ticket);
                }
            }
            Action::MoreLoaded(page, ticket) => {
                self.listing.finish(ticket, page);
            }

            Action::PostLoaded(view, ticket) => {
                if self.pending_post == Some(ticket) {
                    self.pending_post = None;
                    self.current_post = Some(*view);
                    self.scroll_offset = 0;
                    self.screen = Screen::Post;
                }
            }
            Action::PostMissing(slug, ticket) => {
                if self.pending_post == Some(ticket) {
                    self.pending_post = None;
                    self.missing_slug = Some(slug);
                    self.screen = Screen::NotFound;
                }
            }
            Action::OpenNeighbor(direction) => {
                let adjacent = self.current_post.as_ref().and_then(|view| match direction {
                    Neighbor::Previous => view.previous.clone(),
                    Neighbor::Next => view.next.clone(),
                });
                if let Some(adjacent) = adjacent {
                    self.current_post = None;
                    self.scroll_offset = 0;
                    self.spawn_load_post(adjacent.slug);
                }
            }

            Action::OpenInBrowser => {
                let url = self.link_slug().and_then(|slug| self.site.post_url(&slug));
                match url {
                    Some(url) => {
                        if let Err(e) = open::that(&url) {
                            self.error = Some(format!("could not open browser: {}", e));
                        }
                    }
                    None => {
                        self.error = Some("no public site URL configured".to_string());
                    }
                }
            }
            Action::OpenComments => {
                let url = self
                    .current_post
                    .as_ref()
                    .and_then(|view| self.site.comments_url(&view.post.slug));
                match url {
                    Some(url) => {
                        if let Err(e) = open::that(&url) {
                            self.error = Some(format!("could not open browser: {}", e));
                        }
                    }
                    None => {
                        self.error = Some("no comments repository configured".to_string());
                    }
                }
            }
            Action::YankUrl => {
                let url = self.link_slug().and_then(|slug| self.site.post_url(&slug));
                match url {
                    Some(url) => {
                        let copied = arboard::Clipboard::new().and_then(|mut c| c.set_text(url));
                        if let Err(e) = copied {
                            self.error = Some(format!("could not copy URL: {}", e));
                        }
                    }
                    None => {
                        self.error = Some("no public site URL configured".to_string());
                    }
                }
            }

            Action::ExitPreview => {
                if self.preview.take().is_some() {
                    self.spawn_load_index();
                }
            }

            Action::LoadFailed(message, ticket) => {
                self.listing.fail(ticket);
                if self.pending_index == Some(ticket) {
                    self.pending_index = None;
                }
                if self.pending_post == Some(ticket) {
                    self.pending_post = None;
                }
                self.error = Some(message);
            }
            Action::None => {}
        }
    }

    /// Slug behind the open/yank keys: the post being read, or the one
    /// selected in the index.
    fn link_slug(&self) -> Option<String> {
        match self.screen {
            Screen::Post => self.current_post.as_ref().map(|v| v.post.slug.clone()),
            Screen::Index => self.listing.get(self.post_index).map(|p| p.slug.clone()),
            Screen::NotFound => None,
        }
    }

    fn next_ticket(&mut self) -> u64 {
        self.ticket += 1;
        self.ticket
    }

    fn spawn_load_index(&mut self) {
        let ticket = self.next_ticket();
        self.pending_index = Some(ticket);
        let tx = self.action_tx.clone();
        let source = Arc::clone(&self.source);
        let preview = self.preview.clone();
        tokio::spawn(async move {
            match source.query_posts(preview.as_deref()).await {
                Ok(page) => {
                    tx.send(Action::IndexLoaded(page, ticket)).ok();
                }
                Err(e) => {
                    tracing::warn!("index query failed: {}", e);
                    tx.send(Action::LoadFailed(e.to_string(), ticket)).ok();
                }
            }
        });
    }

    fn spawn_fetch_page(&self, cursor: String, ticket: u64) {
        let tx = self.action_tx.clone();
        let source = Arc::clone(&self.source);
        tokio::spawn(async move {
            match source.fetch_page(&cursor).await {
                Ok(page) => {
                    tx.send(Action::MoreLoaded(page, ticket)).ok();
                }
                Err(e) => {
                    tracing::warn!("page fetch failed: {}", e);
                    tx.send(Action::LoadFailed(e.to_string(), ticket)).ok();
                }
            }
        });
    }

    fn spawn_load_post(&mut self, slug: String) {
        let ticket = self.next_ticket();
        self.pending_post = Some(ticket);
        let tx = self.action_tx.clone();
        let source = Arc::clone(&self.source);
        let preview = self.preview.clone();
        tokio::spawn(async move {
            let post = match source.get_post(&slug, preview.as_deref()).await {
                Ok(post) => post,
                Err(BylineError::NotFound(slug)) => {
                    tx.send(Action::PostMissing(slug, ticket)).ok();
                    return;
                }
                Err(e) => {
                    tracing::warn!("post load failed: {}", e);
                    tx.send(Action::LoadFailed(e.to_string(), ticket)).ok();
                    return;
                }
            };

            // Neighbor lookups are best-effort; a failure just hides the link.
            let (previous, next) = tokio::join!(
                source.neighbor(&post.id, Neighbor::Previous, preview.as_deref()),
                source.neighbor(&post.id, Neighbor::Next, preview.as_deref()),
            );
            let view = PostView {
                post,
                previous: previous.ok().flatten(),
                next: next.ok().flatten(),
            };
            tx.send(Action::PostLoaded(Box::new(view), ticket)).ok();
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::types::{AdjacentPost, PostDetail, PostPage, PostSummary};
    use crossterm::event::KeyModifiers;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct StubSource {
        index_pages: Mutex<VecDeque<Result<PostPage>>>,
        more_pages: Mutex<VecDeque<Result<PostPage>>>,
        fetch_calls: AtomicUsize,
    }

    impl StubSource {
        fn fetches(&self) -> usize {
            self.fetch_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl ContentSource for StubSource {
        async fn query_posts(&self, _preview: Option<&str>) -> Result<PostPage> {
            self.index_pages
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(page(&[], None)))
        }

        async fn fetch_page(&self, _cursor: &str) -> Result<PostPage> {
            self.fetch_calls.fetch_add(1, Ordering::SeqCst);
            self.more_pages
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(page(&[], None)))
        }

        async fn get_post(&self, slug: &str, _preview: Option<&str>) -> Result<PostDetail> {
            Err(BylineError::NotFound(slug.to_string()))
        }

        async fn neighbor(
            &self,
            _id: &str,
            _direction: Neighbor,
            _preview: Option<&str>,
        ) -> Result<Option<AdjacentPost>> {
            Ok(None)
        }
    }

    fn summary(slug: &str) -> PostSummary {
        PostSummary {
            slug: slug.to_string(),
            first_publication_date: None,
            title: slug.to_uppercase(),
            subtitle: String::new(),
            author: "author".to_string(),
        }
    }

    fn page(slugs: &[&str], next: Option<&str>) -> PostPage {
        PostPage {
            results: slugs.iter().map(|s| summary(s)).collect(),
            next_page: next.map(String::from),
        }
    }

    fn app_with(stub: Arc<StubSource>) -> (App, mpsc::UnboundedReceiver<Action>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let app = App::new(stub, SiteConfig::default(), None, tx);
        (app, rx)
    }

    fn key(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
    }

    fn slugs(app: &App) -> Vec<&str> {
        app.listing.posts().iter().map(|p| p.slug.as_str()).collect()
    }

    async fn drain(app: &mut App, rx: &mut mpsc::UnboundedReceiver<Action>) {
        for _ in 0..16 {
            tokio::task::yield_now().await;
        }
        while let Ok(action) = rx.try_recv() {
            app.update(action);
        }
    }

    #[tokio::test]
    async fn load_more_appends_and_exhausts() {
        let stub = Arc::new(StubSource::default());
        stub.more_pages
            .lock()
            .unwrap()
            .push_back(Ok(page(&["c", "d"], None)));
        let (mut app, mut rx) = app_with(Arc::clone(&stub));
        app.listing = Listing::new(page(&["a", "b"], Some("page2")));

        assert!(matches!(app.handle_key(key('m')), Action::LoadMore));
        app.update(Action::LoadMore);
        assert!(app.loading());

        drain(&mut app, &mut rx).await;

        assert_eq!(slugs(&app), ["a", "b", "c", "d"]);
        assert!(!app.listing.has_more());
        assert!(!app.loading());
        // The affordance is gone once the index is exhausted.
        assert!(matches!(app.handle_key(key('m')), Action::None));
    }

    #[tokio::test]
    async fn failed_page_fetch_keeps_listing_for_retry() {
        let stub = Arc::new(StubSource::default());
        stub.more_pages
            .lock()
            .unwrap()
            .push_back(Err(BylineError::Fetch("boom".to_string())));
        let (mut app, mut rx) = app_with(Arc::clone(&stub));
        app.listing = Listing::new(page(&["a", "b"], Some("page2")));

        app.update(Action::LoadMore);
        drain(&mut app, &mut rx).await;

        assert_eq!(slugs(&app), ["a", "b"]);
        assert!(app.listing.has_more());
        assert!(!app.loading());
        assert!(app.error.as_deref().unwrap().contains("boom"));
        // Retry is still offered.
        assert!(matches!(app.handle_key(key('m')), Action::LoadMore));
    }

    #[tokio::test]
    async fn load_more_is_single_flight() {
        let stub = Arc::new(StubSource::default());
        stub.more_pages
            .lock()
            .unwrap()
            .push_back(Ok(page(&["c"], Some("page3"))));
        let (mut app, mut rx) = app_with(Arc::clone(&stub));
        app.listing = Listing::new(page(&["a"], Some("page2")));

        app.update(Action::LoadMore);
        app.update(Action::LoadMore);
        drain(&mut app, &mut rx).await;

        assert_eq!(stub.fetches(), 1);
        assert_eq!(slugs(&app), ["a", "c"]);
    }

    #[tokio::test]
    async fn superseded_index_load_is_dropped() {
        let stub = Arc::new(StubSource::default());
        {
            let mut pages = stub.index_pages.lock().unwrap();
            pages.push_back(Ok(page(&["old"], None)));
            pages.push_back(Ok(page(&["new"], None)));
        }
        let (mut app, mut rx) = app_with(Arc::clone(&stub));

        app.update(Action::LoadIndex);
        app.update(Action::Refresh);
        for _ in 0..16 {
            tokio::task::yield_now().await;
        }

        let mut loads = Vec::new();
        while let Ok(action) = rx.try_recv() {
            loads.push(action);
        }
        assert_eq!(loads.len(), 2);

        let winner = loads
            .iter()
            .filter_map(|a| match a {
                Action::IndexLoaded(page, ticket) => Some((*ticket, page.results[0].slug.clone())),
                _ => None,
            })
            .max_by_key(|(ticket, _)| *ticket)
            .unwrap()
            .1;

        // Apply the newer completion first; the stale one must not clobber it.
        loads.sort_by_key(|a| match a {
            Action::IndexLoaded(_, ticket) => std::cmp::Reverse(*ticket),
            _ => std::cmp::Reverse(0),
        });
        for action in loads {
            app.update(action);
        }

        assert_eq!(slugs(&app), [winner.as_str()]);
        assert!(!app.loading());
    }

    #[tokio::test]
    async fn missing_post_shows_not_found_screen() {
        let stub = Arc::new(StubSource::default());
        let (mut app, mut rx) = app_with(stub);
        app.listing = Listing::new(page(&["ghost"], None));

        app.update(Action::Select);
        drain(&mut app, &mut rx).await;

        assert_eq!(app.screen, Screen::NotFound);
        assert_eq!(app.missing_slug.as_deref(), Some("ghost"));

        app.update(Action::Back);
        assert_eq!(app.screen, Screen::Index);
        assert!(app.missing_slug.is_none());
    }

    #[test]
    fn index_keys_map_per_state() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut app = App::new(
            Arc::new(StubSource::default()),
            SiteConfig::default(),
            None,
            tx,
        );
        app.listing = Listing::new(page(&["a"], None));

        assert!(matches!(app.handle_key(key('q')), Action::Quit));
        assert!(matches!(app.handle_key(key('m')), Action::None));
        assert!(matches!(app.handle_key(key('x')), Action::None));
        assert!(matches!(app.handle_key(key('r')), Action::Refresh));

        app.preview = Some("preview-ref".to_string());
        assert!(matches!(app.handle_key(key('x')), Action::ExitPreview));

        app.screen = Screen::Post;
        assert!(matches!(app.handle_key(key('q')), Action::Back));
        assert!(matches!(
            app.handle_key(key('n')),
            Action::OpenNeighbor(Neighbor::Next)
        ));
        assert!(matches!(app.handle_key(key('c')), Action::OpenComments));
    }

    #[test]
    fn exiting_preview_clears_the_ref() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let rt = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        let _guard = rt.enter();
        let mut app = App::new(
            Arc::new(StubSource::default()),
            SiteConfig::default(),
            Some("preview-ref".to_string()),
            tx,
        );

        app.update(Action::ExitPreview);
        assert!(app.preview.is_none());
        assert!(app.loading());
    }
}
