//! Server-rendered catalog pages over axum.

use std::sync::Arc;

use axum::{
    extract::{RawQuery, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};
use url::form_urlencoded;

use crate::client::{ApiError, ProblemApi};
use crate::config::ServerConfig;
use crate::model::{FilterState, Theme};
use crate::pagination::paginate;
use crate::router::{resolve, Route, ROOT_LOCATION};
use crate::session::{LOAD_PROBLEMS_FAILED, PROBLEM_NOT_FOUND};
use crate::storage::{load_theme, KeyValueStore};
use crate::view::{problem_detail, problem_grid, render_page, PageView, StatusBanner};

struct CatalogAppState<A> {
    api: Arc<A>,
    store: Arc<dyn KeyValueStore>,
    config: Arc<ServerConfig>,
}

impl<A> Clone for CatalogAppState<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            store: Arc::clone(&self.store),
            config: Arc::clone(&self.config),
        }
    }
}

pub fn catalog_router<A: ProblemApi>(
    api: Arc<A>,
    store: Arc<dyn KeyValueStore>,
    config: ServerConfig,
) -> Router {
    Router::new()
        .route("/", get(get_page::<A>))
        .route("/health", get(get_health))
        .with_state(CatalogAppState {
            api,
            store,
            config: Arc::new(config),
        })
}

/// List filters and requested page from a raw query string. Unknown or
/// malformed values fall back to their defaults.
pub fn list_query(query: &str) -> (FilterState, usize) {
    let mut filters = FilterState::default();
    let mut page = 1;
    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        match key.as_ref() {
            "search" => filters.search = value.trim().to_string(),
            "difficulty" => filters.difficulty = value.parse().unwrap_or_default(),
            "tag" => filters.tag = value.trim().to_string(),
            "sort" => filters.sort = value.parse().unwrap_or_default(),
            "page" => page = value.trim().parse().unwrap_or(1),
            _ => {}
        }
    }
    (filters, page)
}

async fn get_page<A: ProblemApi>(
    State(state): State<CatalogAppState<A>>,
    RawQuery(query): RawQuery,
) -> Response {
    let query = query.unwrap_or_default();
    let theme = load_theme(state.store.as_ref());
    let route = resolve(&query);
    let kind = match route {
        Route::List => "list",
        Route::Detail { .. } => "detail",
    };
    info!(
        component = "catalog_server",
        event = "http.page.request",
        route = kind,
        slug = route.slug().unwrap_or_default(),
        query = %query
    );
    match route {
        Route::List => list_page(&state, &query, theme).await,
        Route::Detail { slug } => detail_page(&state, &slug, theme).await,
    }
}

async fn list_page<A: ProblemApi>(
    state: &CatalogAppState<A>,
    query: &str,
    theme: Theme,
) -> Response {
    let (filters, page_index) = list_query(query);
    let (stats, tags, problems) = tokio::join!(
        state.api.stats(),
        state.api.tags(),
        state.api.list_problems(&filters)
    );

    let stats = stats
        .inspect_err(|err| warn_sidebar("stats", err))
        .ok();
    let tags = tags
        .inspect_err(|err| warn_sidebar("tags", err))
        .unwrap_or_default();

    let problems = match problems {
        Ok(problems) => problems,
        Err(err) => {
            warn!(
                component = "catalog_server",
                event = "http.page.upstream_error",
                route = "list",
                error = %err
            );
            let banner = StatusBanner::error(LOAD_PROBLEMS_FAILED);
            let html = render_page(&PageView {
                title: "Problem Catalog",
                theme,
                stats: stats.as_ref(),
                filters: Some(&filters),
                tags: &tags,
                banner: Some(&banner),
                ..PageView::default()
            });
            return (StatusCode::BAD_GATEWAY, Html(html)).into_response();
        }
    };

    let page = paginate(&problems, page_index, state.config.page_size);
    info!(
        component = "catalog_server",
        event = "http.page.rendered",
        route = "list",
        page_index = page.page_index,
        total_items = page.total_items
    );
    let content = problem_grid(page.items);
    let html = render_page(&PageView {
        title: "Problem Catalog",
        theme,
        stats: stats.as_ref(),
        filters: Some(&filters),
        tags: &tags,
        content_html: &content,
        controls: page.controls(),
        ..PageView::default()
    });
    Html(html).into_response()
}

async fn detail_page<A: ProblemApi>(
    state: &CatalogAppState<A>,
    slug: &str,
    theme: Theme,
) -> Response {
    match state.api.get_problem(slug).await {
        Ok(problem) => {
            info!(
                component = "catalog_server",
                event = "http.page.rendered",
                route = "detail",
                slug
            );
            let content = problem_detail(&problem, &state.config.origin);
            let html = render_page(&PageView {
                title: &problem.title,
                theme,
                content_html: &content,
                ..PageView::default()
            });
            Html(html).into_response()
        }
        Err(ApiError::NotFound { .. }) => {
            info!(
                component = "catalog_server",
                event = "http.page.not_found",
                slug
            );
            let banner = StatusBanner::error(PROBLEM_NOT_FOUND);
            let refresh_secs = state.config.not_found_redirect_ms.div_ceil(1000);
            let html = render_page(&PageView {
                title: "Problem not found",
                theme,
                banner: Some(&banner),
                refresh: Some((refresh_secs, ROOT_LOCATION)),
                ..PageView::default()
            });
            (StatusCode::NOT_FOUND, Html(html)).into_response()
        }
        Err(err) => {
            warn!(
                component = "catalog_server",
                event = "http.page.upstream_error",
                route = "detail",
                slug,
                error = %err
            );
            let banner = StatusBanner::error(err.user_message());
            let html = render_page(&PageView {
                title: "Problem Catalog",
                theme,
                banner: Some(&banner),
                ..PageView::default()
            });
            (StatusCode::BAD_GATEWAY, Html(html)).into_response()
        }
    }
}

fn warn_sidebar(part: &str, err: &ApiError) {
    warn!(
        component = "catalog_server",
        event = "http.page.sidebar_error",
        part,
        error = %err
    );
}

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
    timestamp: String,
}

async fn get_health() -> impl IntoResponse {
    Json(Health {
        status: "ok",
        timestamp: Utc::now().to_rfc3339(),
    })
}
