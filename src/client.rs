//! Query client for the external problem catalog API.

use std::future::Future;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::ClientConfig;
use crate::model::{
    FilterState, Problem, SaveRequest, SaveResponse, Stats, UploadFile, UploadReport,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("network error for {url}: {message}")]
    Network { url: String, message: String },
    #[error("problem not found: {slug}")]
    NotFound { slug: String },
    #[error("{0}")]
    Validation(String),
    #[error("server returned {status}: {detail}")]
    Server { status: u16, detail: String },
    #[error("invalid response from {url}: {message}")]
    Decode { url: String, message: String },
    #[error("HTTP client build error: {0}")]
    ClientBuild(String),
}

impl ApiError {
    /// Short text for a status banner.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Server { detail, .. } => detail.clone(),
            other => other.to_string(),
        }
    }
}

/// Operations the view needs from the catalog backend.
pub trait ProblemApi: Send + Sync + 'static {
    fn stats(&self) -> impl Future<Output = Result<Stats, ApiError>> + Send;

    fn tags(&self) -> impl Future<Output = Result<Vec<String>, ApiError>> + Send;

    fn list_problems(
        &self,
        filters: &FilterState,
    ) -> impl Future<Output = Result<Vec<Problem>, ApiError>> + Send;

    /// Fails with [`ApiError::NotFound`] when the slug does not resolve.
    fn get_problem(&self, slug: &str) -> impl Future<Output = Result<Problem, ApiError>> + Send;

    fn save_markdown(
        &self,
        request: &SaveRequest,
    ) -> impl Future<Output = Result<SaveResponse, ApiError>> + Send;

    fn upload(
        &self,
        files: &[UploadFile],
    ) -> impl Future<Output = Result<UploadReport, ApiError>> + Send;
}

/// Query pairs for `GET /api/problems`. `difficulty` and `sort` are always
/// present; `search` and `tag` only when non-empty.
pub fn problem_query_pairs(filters: &FilterState) -> Vec<(&'static str, String)> {
    let mut pairs = vec![
        ("difficulty", filters.difficulty.as_query_value().to_string()),
        ("sort", filters.sort.as_str().to_string()),
    ];
    if !filters.search.is_empty() {
        pairs.push(("search", filters.search.clone()));
    }
    if !filters.tag.is_empty() {
        pairs.push(("tag", filters.tag.clone()));
    }
    pairs
}

pub fn problems_url(base_url: &Url, filters: &FilterState) -> Result<Url, ApiError> {
    let mut url = join(base_url, "api/problems")?;
    url.query_pairs_mut()
        .extend_pairs(problem_query_pairs(filters));
    Ok(url)
}

pub fn problem_url(base_url: &Url, slug: &str) -> Result<Url, ApiError> {
    let mut url = join(base_url, "api/problems")?;
    url.path_segments_mut()
        .map_err(|()| ApiError::ClientBuild(format!("base URL cannot be a base: {base_url}")))?
        .push(slug);
    Ok(url)
}

fn join(base_url: &Url, path: &str) -> Result<Url, ApiError> {
    base_url
        .join(path)
        .map_err(|err| ApiError::ClientBuild(format!("invalid endpoint {path}: {err}")))
}

#[derive(Debug, Deserialize)]
struct ProblemList {
    problems: Vec<Problem>,
}

#[derive(Debug, Deserialize)]
struct TagList {
    tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: String,
}

/// [`ProblemApi`] over HTTP with reqwest.
#[derive(Debug, Clone)]
pub struct HttpProblemApi {
    client: Client,
    base_url: Url,
}

impl HttpProblemApi {
    pub fn new(cfg: &ClientConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(cfg.http_timeout_ms))
            .build()
            .map_err(|err| ApiError::ClientBuild(err.to_string()))?;
        Ok(Self {
            client,
            base_url: cfg.base_url.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        let response = self.client.get(url.clone()).send().await.map_err(|err| {
            warn!(
                component = "client",
                event = "client.request.failed",
                url = %url,
                error = %err
            );
            network_error(&url, &err)
        })?;
        decode_json(&url, ensure_success(&url, response).await?).await
    }
}

impl ProblemApi for HttpProblemApi {
    async fn stats(&self) -> Result<Stats, ApiError> {
        self.get_json(join(&self.base_url, "api/stats")?).await
    }

    async fn tags(&self) -> Result<Vec<String>, ApiError> {
        let list: TagList = self.get_json(join(&self.base_url, "api/tags")?).await?;
        Ok(list.tags)
    }

    async fn list_problems(&self, filters: &FilterState) -> Result<Vec<Problem>, ApiError> {
        let url = problems_url(&self.base_url, filters)?;
        debug!(
            component = "client",
            event = "client.problems.request",
            url = %url
        );
        let list: ProblemList = self.get_json(url).await?;
        info!(
            component = "client",
            event = "client.problems.loaded",
            count = list.problems.len()
        );
        Ok(list.problems)
    }

    async fn get_problem(&self, slug: &str) -> Result<Problem, ApiError> {
        let url = problem_url(&self.base_url, slug)?;
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|err| network_error(&url, &err))?;

        if response.status() == StatusCode::NOT_FOUND {
            info!(
                component = "client",
                event = "client.problem.not_found",
                slug
            );
            return Err(ApiError::NotFound {
                slug: slug.to_string(),
            });
        }
        decode_json(&url, ensure_success(&url, response).await?).await
    }

    async fn save_markdown(&self, request: &SaveRequest) -> Result<SaveResponse, ApiError> {
        let url = join(&self.base_url, "api/editor/save")?;
        let response = self
            .client
            .post(url.clone())
            .json(request)
            .send()
            .await
            .map_err(|err| network_error(&url, &err))?;
        decode_json(&url, ensure_success(&url, response).await?).await
    }

    async fn upload(&self, files: &[UploadFile]) -> Result<UploadReport, ApiError> {
        let url = join(&self.base_url, "api/upload")?;
        let form = files.iter().fold(Form::new(), |form, file| {
            form.part(
                "files",
                Part::bytes(file.contents.clone()).file_name(file.filename.clone()),
            )
        });
        let response = self
            .client
            .post(url.clone())
            .multipart(form)
            .send()
            .await
            .map_err(|err| network_error(&url, &err))?;
        decode_json(&url, ensure_success(&url, response).await?).await
    }
}

fn network_error(url: &Url, err: &reqwest::Error) -> ApiError {
    ApiError::Network {
        url: url.to_string(),
        message: err.to_string(),
    }
}

/// Maps non-2xx responses to [`ApiError::Server`], preferring the body's
/// `detail` field as the message.
async fn ensure_success(url: &Url, response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.bytes().await.unwrap_or_default();
    let detail = serde_json::from_slice::<ErrorBody>(&body)
        .map(|body| body.detail)
        .unwrap_or_else(|_| format!("unexpected HTTP status {status}"));
    warn!(
        component = "client",
        event = "client.response.error_status",
        url = %url,
        status = status.as_u16()
    );
    Err(ApiError::Server {
        status: status.as_u16(),
        detail,
    })
}

async fn decode_json<T: DeserializeOwned>(url: &Url, response: Response) -> Result<T, ApiError> {
    let body = response.bytes().await.map_err(|err| network_error(url, &err))?;
    serde_json::from_slice(&body).map_err(|err| ApiError::Decode {
        url: url.to_string(),
        message: err.to_string(),
    })
}
