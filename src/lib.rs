//! LCDS core crate: a browser for a catalog of coding problems.
//!
//! Current implemented scope:
//! - markdown rendering and HTML escaping for problem bodies
//! - a query client for the catalog API plus an in-memory catalog
//! - pagination, URL routing and view rendering
//! - an event-driven session owning all view state
//! - a server-rendered front over axum

mod catalog;
mod client;
mod config;
mod escape;
mod intake;
mod markdown;
mod model;
mod observability;
mod pagination;
mod router;
mod server;
mod session;
mod slug;
mod storage;
mod view;

pub use catalog::{apply_filters, compute_stats, demo_catalog, sort_problems, InMemoryProblemApi};
pub use client::{
    problem_query_pairs, problem_url, problems_url, ApiError, HttpProblemApi, ProblemApi,
};
pub use config::{
    client_config_from_env, parse_base_url, server_config_from_env, session_config_from_env,
    ClientConfig, ConfigError, ServerConfig, SessionConfig,
};
pub use escape::escape_html;
pub use intake::KNOWN_TAGS;
pub use markdown::{
    parse as parse_markdown, parse_inlines, render as render_markdown, render_with, Block, Document,
    Inline, MarkdownOptions,
};
pub use model::{
    Difficulty, DifficultyFilter, FilterState, ParseValueError, Problem, SaveRequest, SaveResponse,
    SortOrder, Stats, Theme, UploadFile, UploadReport, UploadedProblem,
};
pub use observability::{
    init_logging, log_app_bind, log_app_start, log_source_selected, logging_config_from_env,
    CatalogSource, LogFormat, LoggingConfig, LoggingInitError,
};
pub use pagination::{
    clamp_page_index, paginate, total_pages, Page, PageState, PaginationControls, PAGE_SIZE,
};
pub use router::{
    detail_location, permalink, resolve, BrowserHistory, Route, PROBLEM_PARAM, ROOT_LOCATION,
};
pub use server::{catalog_router, list_query};
pub use session::{
    AppState, EditorState, Event, Session, EMPTY_MARKDOWN, LOAD_PROBLEMS_FAILED, PROBLEM_NOT_FOUND,
};
pub use slug::{problem_slug, slugify};
pub use storage::{
    load_theme, save_theme, FileStore, KeyValueStore, MemoryStore, StorageError, THEME_KEY,
};
pub use view::{
    difficulty_badge, editor_section, empty_state, filter_form, pagination_bar,
    problem_card, problem_detail, problem_grid, render_page, stats_strip, status_banner,
    tag_badges, tag_options, upload_report, BannerKind, PageView, StatusBanner, CARD_TAG_LIMIT,
    DETAIL_TAG_LIMIT, EMPTY_STATE_TEXT,
};
