use std::io;
use std::io::Write;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex};

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use lcds::{
    catalog_router, log_app_bind, log_app_start, log_source_selected, render_markdown,
    CatalogSource, Event, InMemoryProblemApi, LoggingConfig, MemoryStore, ServerConfig, Session,
    SessionConfig,
};
use tower::util::ServiceExt;
use tracing::dispatcher::with_default;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriter;
use url::Url;

#[derive(Clone, Default)]
struct SharedWriter {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl SharedWriter {
    fn output_string(&self) -> String {
        let bytes = self
            .inner
            .lock()
            .expect("writer lock should not be poisoned");
        String::from_utf8_lossy(&bytes).to_string()
    }
}

struct SharedWriterGuard {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl<'a> MakeWriter<'a> for SharedWriter {
    type Writer = SharedWriterGuard;

    fn make_writer(&'a self) -> Self::Writer {
        SharedWriterGuard {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Write for SharedWriterGuard {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut out = self
            .inner
            .lock()
            .expect("writer lock should not be poisoned");
        out.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn capture_logs(max_level: Level, f: impl FnOnce()) -> String {
    let writer = SharedWriter::default();
    let subscriber = tracing_subscriber::fmt()
        .json()
        .with_ansi(false)
        .with_max_level(max_level)
        .with_writer(writer.clone())
        .finish();
    let dispatch = tracing::Dispatch::new(subscriber);

    with_default(&dispatch, f);
    writer.output_string()
}

fn current_thread_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("single-thread runtime should build")
}

#[test]
fn server_lifecycle_helpers_emit_baseline_events() {
    let logs = capture_logs(Level::INFO, || {
        let server = ServerConfig::default();
        log_app_start(&LoggingConfig::default(), &server);
        log_source_selected(&CatalogSource::Demo { problems: 6 }, "LCDS_USE_DEMO");
        log_source_selected(
            &CatalogSource::Http {
                base_url: Url::parse("http://127.0.0.1:8000/").expect("url should parse"),
                timeout_ms: 10_000,
            },
            "LCDS_API_BASE_URL",
        );
        log_app_bind(
            SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 8080),
            &server.origin,
        );
    });

    assert!(logs.contains("\"event\":\"app.start\""));
    assert!(logs.contains("\"storage_path\":\"lcds-storage.json\""));
    assert!(logs.contains("\"event\":\"source.selected\""));
    assert!(logs.contains("\"source\":\"demo\""));
    assert!(logs.contains("\"problems\":6"));
    assert!(logs.contains("\"base_url\":\"http://127.0.0.1:8000/\""));
    assert!(logs.contains("\"timeout_ms\":10000"));
    assert!(logs.contains("\"event\":\"app.bind\""));
    assert!(logs.contains("\"origin\":\"http://127.0.0.1:8080\""));
}

#[test]
fn page_route_logs_every_request_and_its_outcome() {
    let logs = capture_logs(Level::INFO, || {
        current_thread_runtime().block_on(async {
            let app = catalog_router(
                Arc::new(InMemoryProblemApi::demo()),
                Arc::new(MemoryStore::new()),
                ServerConfig::default(),
            );

            for (uri, status) in [
                ("/?problem=missing", StatusCode::NOT_FOUND),
                ("/?page=1", StatusCode::OK),
            ] {
                let response = app
                    .clone()
                    .oneshot(
                        Request::builder()
                            .uri(uri)
                            .body(Body::empty())
                            .expect("request should build"),
                    )
                    .await
                    .expect("page request should succeed");

                assert_eq!(response.status(), status);
            }
        });
    });

    assert_eq!(logs.matches("\"event\":\"http.page.request\"").count(), 2);
    assert!(logs.contains("\"slug\":\"missing\""));
    assert!(logs.contains("\"event\":\"http.page.not_found\""));
    assert!(logs.contains("\"event\":\"http.page.rendered\""));
}

#[test]
fn session_start_emits_route_and_load_events() {
    let logs = capture_logs(Level::INFO, || {
        current_thread_runtime().block_on(async {
            let mut session = Session::new(
                Arc::new(InMemoryProblemApi::demo()),
                MemoryStore::new(),
                SessionConfig::default(),
            );
            session.dispatch(Event::Start);
            session.pump().await;

            assert!(!session.state().is_loading());
        });
    });

    assert!(logs.contains("\"event\":\"session.route.resolved\""));
    assert!(logs.contains("\"event\":\"session.problems.loaded\""));
}

#[test]
fn raw_inline_code_is_reported_at_debug() {
    let logs = capture_logs(Level::DEBUG, || {
        let html = render_markdown("Use `Vec<T>` here.");
        assert!(html.contains("<code>Vec<T></code>"));
    });

    assert!(logs.contains("\"event\":\"markdown.inline_code.unescaped\""));
}
