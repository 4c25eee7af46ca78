//! Application session: the single owner of all view state, driven by an
//! explicit event loop.
//!
//! [`Session::dispatch`] applies an [`Event`] synchronously and spawns any
//! network call or timer it needs. Spawned work reports back through an
//! internal channel; [`Session::pump`] and [`Session::run`] apply those
//! completions. Every list and detail request carries a generation number
//! and only the latest one is applied.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::client::{ApiError, ProblemApi};
use crate::config::SessionConfig;
use crate::model::{
    DifficultyFilter, FilterState, Problem, SaveRequest, SaveResponse, SortOrder, Stats, Theme,
    UploadFile, UploadReport,
};
use crate::pagination::{PageState, PaginationControls};
use crate::router::{detail_location, BrowserHistory, Route, ROOT_LOCATION};
use crate::storage::{load_theme, save_theme, KeyValueStore};
use crate::view::{editor_section, problem_detail, problem_grid, BannerKind, StatusBanner};

pub const LOAD_PROBLEMS_FAILED: &str = "Failed to load problems. Please try again.";
pub const PROBLEM_NOT_FOUND: &str = "Problem not found. Redirecting to list...";
pub const EMPTY_MARKDOWN: &str = "Markdown content is empty. Paste some content first.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Loads the theme, stats, tags and the view for the current location.
    Start,
    SearchInput(String),
    DifficultySelected(DifficultyFilter),
    TagSelected(String),
    SortSelected(SortOrder),
    NextPage,
    PrevPage,
    OpenProblem(String),
    BackToList,
    HistoryBack,
    HistoryForward,
    ToggleTheme,
    ToggleEditor,
    EditorInput { markdown: String, filename: String },
    ClearEditor,
    SaveEditor,
    UploadFiles(Vec<UploadFile>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditorState {
    pub visible: bool,
    pub markdown: String,
    pub filename: String,
}

/// Everything the view shows.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub filters: FilterState,
    pub pages: PageState<Problem>,
    pub route: Route,
    pub problem: Option<Problem>,
    pub content_html: String,
    pub controls: Option<PaginationControls>,
    pub banner: Option<StatusBanner>,
    /// Tracked calls in flight.
    pub loading: usize,
    pub stats: Option<Stats>,
    pub tags: Vec<String>,
    pub theme: Theme,
    pub editor: EditorState,
    pub upload_report: Option<UploadReport>,
    /// Editor toggle, panel and upload report.
    pub editor_html: String,
    pub history: BrowserHistory,
}

impl AppState {
    pub fn is_loading(&self) -> bool {
        self.loading > 0
    }
}

#[derive(Debug)]
enum Completion {
    SearchSettled {
        generation: u64,
    },
    StatsLoaded(Result<Stats, ApiError>),
    TagsLoaded(Result<Vec<String>, ApiError>),
    ProblemsLoaded {
        generation: u64,
        result: Result<Vec<Problem>, ApiError>,
    },
    ProblemLoaded {
        generation: u64,
        result: Result<Problem, ApiError>,
    },
    NotFoundRedirect {
        navigation: u64,
    },
    EditorSaved(Result<SaveResponse, ApiError>),
    UploadFinished(Result<UploadReport, ApiError>),
    BannerExpired {
        id: u64,
    },
}

pub struct Session<A, S> {
    api: Arc<A>,
    store: S,
    config: SessionConfig,
    state: AppState,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
    search_cancel: Option<CancellationToken>,
    search_generation: u64,
    list_generation: u64,
    detail_generation: u64,
    navigation: u64,
    banner_id: u64,
}

impl<A: ProblemApi, S: KeyValueStore> Session<A, S> {
    pub fn new(api: Arc<A>, store: S, config: SessionConfig) -> Self {
        Self::with_location(api, store, config, ROOT_LOCATION)
    }

    /// Session whose history starts at `location`, as when the page is
    /// opened from a permalink.
    pub fn with_location(
        api: Arc<A>,
        store: S,
        config: SessionConfig,
        location: impl Into<String>,
    ) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        let state = AppState {
            pages: PageState::new(config.page_size),
            history: BrowserHistory::new(location),
            ..AppState::default()
        };
        Self {
            api,
            store,
            config,
            state,
            completions_tx,
            completions_rx,
            search_cancel: None,
            search_generation: 0,
            list_generation: 0,
            detail_generation: 0,
            navigation: 0,
            banner_id: 0,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Applies one event. Must be called from within a Tokio runtime.
    pub fn dispatch(&mut self, event: Event) {
        debug!(component = "session", event = "session.dispatch", input = ?event);
        match event {
            Event::Start => {
                self.state.theme = load_theme(&self.store);
                self.render_editor();
                self.load_stats();
                self.load_tags();
                self.handle_routing();
            }
            Event::SearchInput(text) => {
                self.state.filters.search = text;
                self.reset_to_first_page();
                self.schedule_search();
            }
            Event::DifficultySelected(difficulty) => {
                self.state.filters.difficulty = difficulty;
                self.filters_changed();
            }
            Event::TagSelected(tag) => {
                self.state.filters.tag = tag;
                self.filters_changed();
            }
            Event::SortSelected(sort) => {
                self.state.filters.sort = sort;
                self.filters_changed();
            }
            Event::NextPage => {
                if self.state.route == Route::List && self.state.pages.next() {
                    self.render_list();
                }
            }
            Event::PrevPage => {
                if self.state.route == Route::List && self.state.pages.prev() {
                    self.render_list();
                }
            }
            Event::OpenProblem(slug) => {
                self.state.history.push(detail_location(&slug));
                self.handle_routing();
            }
            Event::BackToList => {
                self.state.history.push(ROOT_LOCATION);
                self.handle_routing();
            }
            Event::HistoryBack => {
                if self.state.history.back() {
                    self.handle_routing();
                }
            }
            Event::HistoryForward => {
                if self.state.history.forward() {
                    self.handle_routing();
                }
            }
            Event::ToggleTheme => {
                self.state.theme = self.state.theme.toggled();
                if let Err(err) = save_theme(&self.store, self.state.theme) {
                    warn!(
                        component = "session",
                        event = "session.theme.save_failed",
                        error = %err
                    );
                }
            }
            Event::ToggleEditor => {
                self.state.editor.visible = !self.state.editor.visible;
                self.render_editor();
            }
            Event::EditorInput { markdown, filename } => {
                self.state.editor.markdown = markdown;
                self.state.editor.filename = filename;
                self.render_editor();
            }
            Event::ClearEditor => {
                self.state.editor.markdown.clear();
                self.state.editor.filename.clear();
                self.render_editor();
            }
            Event::SaveEditor => self.save_editor(),
            Event::UploadFiles(files) => self.upload(files),
        }
    }

    /// Applies completions of spawned work until the runtime goes idle.
    /// Timers that have not elapsed stay pending. Returns how many
    /// completions were applied.
    pub async fn pump(&mut self) -> usize {
        const IDLE_ROUNDS: usize = 3;
        let mut applied = 0;
        let mut idle = 0;
        while idle < IDLE_ROUNDS {
            tokio::task::yield_now().await;
            let mut progressed = false;
            while let Ok(completion) = self.completions_rx.try_recv() {
                self.apply(completion);
                applied += 1;
                progressed = true;
            }
            idle = if progressed { 0 } else { idle + 1 };
        }
        applied
    }

    /// Runs the event loop until `events` closes and no tracked call is in
    /// flight, then returns the final state.
    pub async fn run(mut self, mut events: mpsc::UnboundedReceiver<Event>) -> AppState {
        info!(component = "session", event = "session.run.start");
        let mut events_open = true;
        while events_open || self.state.is_loading() {
            tokio::select! {
                biased;
                Some(completion) = self.completions_rx.recv() => self.apply(completion),
                event = events.recv(), if events_open => match event {
                    Some(event) => self.dispatch(event),
                    None => events_open = false,
                },
            }
        }
        info!(component = "session", event = "session.run.stop");
        self.state
    }

    fn filters_changed(&mut self) {
        self.reset_to_first_page();
        self.load_problems();
    }

    /// The list shows page 1 of the current items until the new ones arrive.
    fn reset_to_first_page(&mut self) {
        self.state.pages.reset_page();
        if self.state.route == Route::List {
            self.render_list();
        }
    }

    fn schedule_search(&mut self) {
        if let Some(pending) = self.search_cancel.take() {
            pending.cancel();
        }
        self.search_generation += 1;
        let generation = self.search_generation;
        let token = CancellationToken::new();
        self.search_cancel = Some(token.clone());

        let deadline = deadline_after(self.config.search_debounce_ms);
        let tx = self.completions_tx.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = sleep_until(deadline) => {
                    let _ = tx.send(Completion::SearchSettled { generation });
                }
            }
        });
    }

    fn handle_routing(&mut self) {
        let route = self.state.history.route();
        self.navigation += 1;
        info!(
            component = "session",
            event = "session.route.resolved",
            location = self.state.history.current(),
            slug = route.slug().unwrap_or_default()
        );
        self.state.route = route.clone();
        match route {
            Route::List => {
                self.state.problem = None;
                self.load_problems();
            }
            Route::Detail { slug } => self.load_problem(slug),
        }
    }

    fn spawn_tracked<F>(&mut self, work: F)
    where
        F: std::future::Future<Output = Completion> + Send + 'static,
    {
        self.state.loading += 1;
        let tx = self.completions_tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(work.await);
        });
    }

    fn spawn_untracked<F>(&self, work: F)
    where
        F: std::future::Future<Output = Completion> + Send + 'static,
    {
        let tx = self.completions_tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(work.await);
        });
    }

    fn finish_tracked(&mut self) {
        self.state.loading = self.state.loading.saturating_sub(1);
    }

    fn load_stats(&self) {
        let api = Arc::clone(&self.api);
        self.spawn_untracked(async move { Completion::StatsLoaded(api.stats().await) });
    }

    fn load_tags(&self) {
        let api = Arc::clone(&self.api);
        self.spawn_untracked(async move { Completion::TagsLoaded(api.tags().await) });
    }

    fn load_problems(&mut self) {
        self.list_generation += 1;
        let generation = self.list_generation;
        let filters = self.state.filters.clone();
        let api = Arc::clone(&self.api);
        debug!(
            component = "session",
            event = "session.problems.request",
            generation,
            search = %filters.search,
            difficulty = filters.difficulty.as_query_value(),
            tag = %filters.tag,
            sort = filters.sort.as_str()
        );
        self.spawn_tracked(async move {
            Completion::ProblemsLoaded {
                generation,
                result: api.list_problems(&filters).await,
            }
        });
    }

    fn load_problem(&mut self, slug: String) {
        self.detail_generation += 1;
        let generation = self.detail_generation;
        let api = Arc::clone(&self.api);
        self.spawn_tracked(async move {
            Completion::ProblemLoaded {
                generation,
                result: api.get_problem(&slug).await,
            }
        });
    }

    fn save_editor(&mut self) {
        let markdown = self.state.editor.markdown.trim().to_string();
        if markdown.is_empty() {
            let err = ApiError::Validation(EMPTY_MARKDOWN.to_string());
            self.show_banner(StatusBanner::error(err.user_message()));
            return;
        }
        let filename = Some(self.state.editor.filename.trim().to_string())
            .filter(|name| !name.is_empty());
        let request = SaveRequest { markdown, filename };
        let api = Arc::clone(&self.api);
        self.spawn_tracked(async move { Completion::EditorSaved(api.save_markdown(&request).await) });
    }

    fn upload(&mut self, files: Vec<UploadFile>) {
        if files.is_empty() {
            return;
        }
        let api = Arc::clone(&self.api);
        self.spawn_tracked(async move { Completion::UploadFinished(api.upload(&files).await) });
    }

    fn reload_catalog(&mut self) {
        self.load_stats();
        self.load_tags();
        self.load_problems();
    }

    fn apply(&mut self, completion: Completion) {
        match completion {
            Completion::SearchSettled { generation } => {
                if generation == self.search_generation {
                    self.search_cancel = None;
                    self.load_problems();
                }
            }
            Completion::StatsLoaded(Ok(stats)) => self.state.stats = Some(stats),
            Completion::TagsLoaded(Ok(tags)) => self.state.tags = tags,
            Completion::StatsLoaded(Err(err)) | Completion::TagsLoaded(Err(err)) => {
                warn!(
                    component = "session",
                    event = "session.sidebar.load_failed",
                    error = %err
                );
            }
            Completion::ProblemsLoaded { generation, result } => {
                self.finish_tracked();
                if generation != self.list_generation {
                    debug!(
                        component = "session",
                        event = "session.response.stale",
                        kind = "problems",
                        generation,
                        latest = self.list_generation
                    );
                    return;
                }
                self.problems_loaded(result);
            }
            Completion::ProblemLoaded { generation, result } => {
                self.finish_tracked();
                if generation != self.detail_generation {
                    debug!(
                        component = "session",
                        event = "session.response.stale",
                        kind = "problem",
                        generation,
                        latest = self.detail_generation
                    );
                    return;
                }
                self.problem_loaded(result);
            }
            Completion::NotFoundRedirect { navigation } => {
                if navigation == self.navigation {
                    info!(component = "session", event = "session.redirect.list");
                    self.state.history.push(ROOT_LOCATION);
                    self.handle_routing();
                }
            }
            Completion::EditorSaved(result) => {
                self.finish_tracked();
                match result {
                    Ok(saved) => {
                        info!(
                            component = "session",
                            event = "session.editor.saved",
                            path = %saved.path
                        );
                        self.show_banner(StatusBanner::success(format!(
                            "Saved: {} → {}",
                            saved.title, saved.path
                        )));
                        self.reload_catalog();
                    }
                    Err(err) => self.show_banner(StatusBanner::error(err.user_message())),
                }
            }
            Completion::UploadFinished(result) => {
                self.finish_tracked();
                match result {
                    Ok(report) => {
                        info!(
                            component = "session",
                            event = "session.upload.finished",
                            success = report.success,
                            errors = report.errors.len()
                        );
                        let uploaded = report.success;
                        let failed = report.errors.len();
                        self.state.upload_report = Some(report);
                        self.render_editor();
                        if uploaded > 0 {
                            self.show_banner(StatusBanner::success(format!(
                                "Uploaded {uploaded} problem(s)"
                            )));
                            self.reload_catalog();
                        } else if failed > 0 {
                            self.show_banner(StatusBanner::error(format!(
                                "Upload failed for {failed} file(s)"
                            )));
                        }
                    }
                    Err(err) => self.show_banner(StatusBanner::error(err.user_message())),
                }
            }
            Completion::BannerExpired { id } => {
                if id == self.banner_id {
                    self.state.banner = None;
                }
            }
        }
    }

    fn problems_loaded(&mut self, result: Result<Vec<Problem>, ApiError>) {
        match result {
            Ok(problems) => {
                info!(
                    component = "session",
                    event = "session.problems.loaded",
                    count = problems.len()
                );
                self.state.pages.replace_items(problems);
                if self.state.route == Route::List {
                    self.render_list();
                }
            }
            Err(err) => {
                warn!(
                    component = "session",
                    event = "session.problems.failed",
                    error = %err
                );
                self.show_banner(StatusBanner::error(LOAD_PROBLEMS_FAILED));
            }
        }
    }

    fn problem_loaded(&mut self, result: Result<Problem, ApiError>) {
        if !matches!(self.state.route, Route::Detail { .. }) {
            return;
        }
        match result {
            Ok(problem) => {
                self.state.content_html = problem_detail(&problem, &self.config.origin);
                self.state.controls = None;
                self.state.problem = Some(problem);
            }
            Err(ApiError::NotFound { slug }) => {
                warn!(
                    component = "session",
                    event = "session.problem.not_found",
                    slug = %slug
                );
                self.show_banner(StatusBanner::error(PROBLEM_NOT_FOUND));
                let navigation = self.navigation;
                let deadline = deadline_after(self.config.not_found_redirect_ms);
                self.spawn_untracked(async move {
                    sleep_until(deadline).await;
                    Completion::NotFoundRedirect { navigation }
                });
            }
            Err(err) => {
                warn!(
                    component = "session",
                    event = "session.problem.failed",
                    error = %err
                );
                self.show_banner(StatusBanner::error(err.user_message()));
            }
        }
    }

    fn render_list(&mut self) {
        let page = self.state.pages.current();
        self.state.content_html = problem_grid(page.items);
        self.state.controls = page.controls();
    }

    fn render_editor(&mut self) {
        let editor = &self.state.editor;
        self.state.editor_html = editor_section(
            editor.visible,
            &editor.markdown,
            &editor.filename,
            self.state.upload_report.as_ref(),
        );
    }

    fn show_banner(&mut self, banner: StatusBanner) {
        self.banner_id += 1;
        let id = self.banner_id;
        let ms = match banner.kind {
            BannerKind::Error => self.config.error_banner_ms,
            BannerKind::Success => self.config.success_banner_ms,
        };
        self.state.banner = Some(banner);
        let deadline = deadline_after(ms);
        self.spawn_untracked(async move {
            sleep_until(deadline).await;
            Completion::BannerExpired { id }
        });
    }
}

/// Measured from when the event is handled.
fn deadline_after(ms: u64) -> Instant {
    Instant::now() + Duration::from_millis(ms)
}
