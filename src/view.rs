//! HTML fragments for the list and detail views, plus the full page shell
//! the server wraps them in.

use crate::escape::escape_html;
use crate::markdown;
use crate::model::{
    Difficulty, DifficultyFilter, FilterState, Problem, SortOrder, Stats, Theme, UploadReport,
};
use crate::pagination::PaginationControls;
use crate::router::{detail_location, permalink, ROOT_LOCATION};

pub const CARD_TAG_LIMIT: usize = 3;
pub const DETAIL_TAG_LIMIT: usize = 10;
pub const EMPTY_STATE_TEXT: &str = "No problems found matching your filters.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    Error,
    Success,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusBanner {
    pub kind: BannerKind,
    pub message: String,
}

impl StatusBanner {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: BannerKind::Error,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: BannerKind::Success,
            message: message.into(),
        }
    }
}

pub fn difficulty_badge(difficulty: Difficulty) -> String {
    format!(
        "<span class=\"badge badge-{}\">{}</span>",
        difficulty.css_class(),
        difficulty.as_str()
    )
}

/// Up to `max_tags` escaped tag badges, followed by a `+N` badge for the rest.
pub fn tag_badges(tags: &[String], max_tags: usize) -> String {
    let mut out = String::new();
    for tag in tags.iter().take(max_tags) {
        out.push_str("<span class=\"badge badge-tag\">");
        out.push_str(&escape_html(tag));
        out.push_str("</span>");
    }
    if tags.len() > max_tags {
        out.push_str(&format!(
            "<span class=\"badge badge-tag badge-overflow\">+{}</span>",
            tags.len() - max_tags
        ));
    }
    out
}

pub fn problem_card(problem: &Problem) -> String {
    let number = problem
        .number
        .map(|number| format!("<div class=\"problem-number\">#{number}</div>"))
        .unwrap_or_default();

    format!(
        "<a class=\"problem-card difficulty-{class}\" data-slug=\"{slug}\" href=\"{href}\">\
         {number}<div class=\"problem-title\">{title}</div>{difficulty}{tags}\
         <div class=\"problem-date\">{date}</div></a>",
        class = problem.difficulty.css_class(),
        slug = escape_html(&problem.slug),
        href = escape_html(&detail_location(&problem.slug)),
        title = escape_html(&problem.title),
        difficulty = difficulty_badge(problem.difficulty),
        tags = tag_badges(&problem.tags, CARD_TAG_LIMIT),
        date = escape_html(problem.date.as_deref().unwrap_or_default()),
    )
}

pub fn problem_grid(problems: &[Problem]) -> String {
    if problems.is_empty() {
        return empty_state();
    }
    let cards: String = problems.iter().map(problem_card).collect();
    format!("<div class=\"problems-grid\">{cards}</div>")
}

pub fn empty_state() -> String {
    format!(
        "<div class=\"empty-state\"><div class=\"empty-state-icon\">📭</div>\
         <div class=\"empty-state-text\">{EMPTY_STATE_TEXT}</div></div>"
    )
}

/// Detail view: meta line, badges, permalink, optional source link and the
/// rendered markdown body.
pub fn problem_detail(problem: &Problem, origin: &str) -> String {
    let mut meta = String::new();
    if let Some(number) = problem.number {
        meta.push_str(&format!("#{number} • "));
    }
    meta.push_str(&escape_html(problem.date.as_deref().unwrap_or_default()));

    let link = permalink(origin, &problem.slug);
    let source = problem
        .source_url()
        .map(|url| {
            format!(
                "<p class=\"source-link\"><a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\">🔗 View original problem</a></p>",
                escape_html(url)
            )
        })
        .unwrap_or_default();

    format!(
        "<div class=\"detail-view\">\
         <a class=\"back-btn\" href=\"{root}\">← Back to list</a>\
         <div class=\"detail-header\">\
         <div class=\"detail-meta\">{meta}</div>\
         <h1 class=\"detail-title\">{title}</h1>\
         <div class=\"detail-badges\">{difficulty}{tags}</div>\
         <div class=\"permalink-box\">Permalink: <a href=\"{link}\">{link}</a></div>\
         </div>{source}\
         <div class=\"detail-body\">{body}</div></div>",
        root = ROOT_LOCATION,
        title = escape_html(&problem.title),
        difficulty = difficulty_badge(problem.difficulty),
        tags = tag_badges(&problem.tags, DETAIL_TAG_LIMIT),
        link = escape_html(&link),
        body = markdown::render(&problem.body),
    )
}

pub fn status_banner(banner: &StatusBanner) -> String {
    let (class, icon) = match banner.kind {
        BannerKind::Error => ("status-message error", "❌"),
        BannerKind::Success => ("status-message", "✅"),
    };
    format!(
        "<div id=\"status-message\" class=\"{class}\" role=\"status\"><strong>{icon} {}</strong></div>",
        escape_html(&banner.message)
    )
}

pub fn stats_strip(stats: &Stats) -> String {
    format!(
        "<div class=\"stats\">\
         <span class=\"stat\" id=\"stat-total\">{} total</span>\
         <span class=\"stat stat-easy\" id=\"stat-easy\">{} easy</span>\
         <span class=\"stat stat-medium\" id=\"stat-medium\">{} medium</span>\
         <span class=\"stat stat-hard\" id=\"stat-hard\">{} hard</span></div>",
        stats.total, stats.easy, stats.medium, stats.hard
    )
}

/// `<option>` list for the tag select, led by an "All Tags" entry.
pub fn tag_options(tags: &[String], selected: &str) -> String {
    let mut out = format!(
        "<option value=\"\"{}>All Tags</option>",
        selected_attr(selected.is_empty())
    );
    for tag in tags {
        let escaped = escape_html(tag);
        out.push_str(&format!(
            "<option value=\"{escaped}\"{}>{escaped}</option>",
            selected_attr(tag == selected)
        ));
    }
    out
}

pub fn filter_form(filters: &FilterState, tags: &[String]) -> String {
    let mut difficulty = format!(
        "<option value=\"All\"{}>All Difficulties</option>",
        selected_attr(filters.difficulty == DifficultyFilter::All)
    );
    for level in Difficulty::ALL {
        difficulty.push_str(&format!(
            "<option value=\"{name}\"{}>{name}</option>",
            selected_attr(filters.difficulty == DifficultyFilter::Only(level)),
            name = level.as_str()
        ));
    }

    let sort: String = SortOrder::ALL
        .into_iter()
        .map(|order| {
            format!(
                "<option value=\"{}\"{}>{}</option>",
                order.as_str(),
                selected_attr(filters.sort == order),
                order.label()
            )
        })
        .collect();

    format!(
        "<form id=\"filters-form\" class=\"filters\" method=\"get\" action=\"{ROOT_LOCATION}\">\
         <input id=\"search-input\" type=\"search\" name=\"search\" placeholder=\"Search by title, number or tag\" value=\"{search}\">\
         <select id=\"difficulty-filter\" name=\"difficulty\">{difficulty}</select>\
         <select id=\"tag-filter\" name=\"tag\">{tags}</select>\
         <select id=\"sort-select\" name=\"sort\">{sort}</select>\
         <button type=\"submit\">Apply</button></form>",
        search = escape_html(&filters.search),
        tags = tag_options(tags, &filters.tag),
    )
}

/// Prev/next buttons submit the filter form with a target page. Buttons at
/// a boundary are rendered disabled.
pub fn pagination_bar(controls: &PaginationControls) -> String {
    format!(
        "<nav id=\"pagination\" class=\"pagination\">\
         <button id=\"prev-btn\" form=\"filters-form\" type=\"submit\" name=\"page\" value=\"{prev}\"{prev_disabled}>← Previous</button>\
         <span id=\"page-info\">{summary}</span>\
         <button id=\"next-btn\" form=\"filters-form\" type=\"submit\" name=\"page\" value=\"{next}\"{next_disabled}>Next →</button></nav>",
        prev = controls.page_index.saturating_sub(1).max(1),
        next = (controls.page_index + 1).min(controls.total_pages),
        prev_disabled = disabled_attr(controls.prev_disabled),
        next_disabled = disabled_attr(controls.next_disabled),
        summary = escape_html(&controls.summary()),
    )
}

/// Per-file upload results, shown as returned by the API.
pub fn upload_report(report: &UploadReport) -> String {
    let mut out = format!(
        "<div class=\"upload-report\"><p>Uploaded {} problem(s)</p>",
        report.success
    );
    if !report.uploaded.is_empty() {
        out.push_str("<ul class=\"upload-success\">");
        for item in &report.uploaded {
            out.push_str(&format!(
                "<li>{} → {}</li>",
                escape_html(&item.title),
                escape_html(&item.path)
            ));
        }
        out.push_str("</ul>");
    }
    if !report.errors.is_empty() {
        out.push_str("<ul class=\"upload-errors\">");
        for error in &report.errors {
            out.push_str(&format!("<li>{}</li>", escape_html(error)));
        }
        out.push_str("</ul>");
    }
    out.push_str("</div>");
    out
}

fn editor_toggle_label(visible: bool) -> &'static str {
    if visible {
        "Hide Editor"
    } else {
        "Markdown Editor"
    }
}

fn editor_panel(markdown: &str, filename: &str) -> String {
    format!(
        "<section id=\"editor-panel\" class=\"editor-panel\">\
         <input id=\"editor-filename\" name=\"filename\" placeholder=\"optional-filename.md\" value=\"{}\">\
         <textarea id=\"markdown-editor\" name=\"markdown\">{}</textarea>\
         <button id=\"editor-save\">Save</button><button id=\"editor-clear\">Clear</button></section>",
        escape_html(filename),
        escape_html(markdown)
    )
}

/// Toggle button, the panel when open, and the last upload report.
pub fn editor_section(
    visible: bool,
    markdown: &str,
    filename: &str,
    report: Option<&UploadReport>,
) -> String {
    let mut out = format!(
        "<div class=\"editor-section\"><button id=\"editor-toggle\">{}</button>",
        editor_toggle_label(visible)
    );
    if visible {
        out.push_str(&editor_panel(markdown, filename));
    }
    if let Some(report) = report {
        out.push_str(&upload_report(report));
    }
    out.push_str("</div>");
    out
}

/// Everything [`render_page`] needs for one document.
#[derive(Debug, Clone, Default)]
pub struct PageView<'a> {
    pub title: &'a str,
    pub theme: Theme,
    pub stats: Option<&'a Stats>,
    pub filters: Option<&'a FilterState>,
    pub tags: &'a [String],
    pub banner: Option<&'a StatusBanner>,
    pub content_html: &'a str,
    pub controls: Option<PaginationControls>,
    /// `(seconds, location)` for a meta refresh.
    pub refresh: Option<(u64, &'a str)>,
}

pub fn render_page(view: &PageView<'_>) -> String {
    let mut out = String::new();
    out.push_str("<!DOCTYPE html><html><head><meta charset=\"utf-8\">\n");
    out.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    if let Some((seconds, location)) = view.refresh {
        out.push_str(&format!(
            "<meta http-equiv=\"refresh\" content=\"{seconds};url={}\">\n",
            escape_html(location)
        ));
    }
    out.push_str(&format!("<title>{}</title>\n", escape_html(view.title)));
    out.push_str(PAGE_STYLE);
    out.push_str(&format!(
        "</head><body data-theme=\"{}\"><main class=\"shell\">\n",
        view.theme.as_str()
    ));
    out.push_str("<header class=\"hero\"><h1><a href=\"/\">Problem Catalog</a></h1>");
    if let Some(stats) = view.stats {
        out.push_str(&stats_strip(stats));
    }
    out.push_str("</header>\n");
    if let Some(banner) = view.banner {
        out.push_str(&status_banner(banner));
        out.push('\n');
    }
    if let Some(filters) = view.filters {
        out.push_str(&filter_form(filters, view.tags));
        out.push('\n');
    }
    out.push_str("<section id=\"problems-container\">");
    out.push_str(view.content_html);
    out.push_str("</section>\n");
    if let Some(controls) = &view.controls {
        out.push_str(&pagination_bar(controls));
        out.push('\n');
    }
    out.push_str("</main></body></html>\n");
    out
}

fn selected_attr(selected: bool) -> &'static str {
    if selected {
        " selected"
    } else {
        ""
    }
}

fn disabled_attr(disabled: bool) -> &'static str {
    if disabled {
        " disabled"
    } else {
        ""
    }
}

const PAGE_STYLE: &str = "<style>:root{--bg:#f5f7fa;--card:#fff;--ink:#1c2430;--muted:#5f6a73;--line:#e8ecf0;--easy:#00b8a3;--medium:#ffa116;--hard:#ef4743}\
body[data-theme=dark]{--bg:#16191d;--card:#22272e;--ink:#e6edf3;--muted:#9aa4ae;--line:#30363d}\
*{box-sizing:border-box}body{margin:0;background:var(--bg);color:var(--ink);font-family:\"Segoe UI\",sans-serif}\
.shell{max-width:1200px;margin:0 auto;padding:24px 18px}.hero h1 a{color:inherit;text-decoration:none}\
.stats{display:flex;gap:12px;color:var(--muted)}.filters{display:flex;gap:8px;flex-wrap:wrap;margin:16px 0}\
.problems-grid{display:grid;grid-template-columns:repeat(auto-fill,minmax(300px,1fr));gap:16px}\
.problem-card{display:block;background:var(--card);border:1px solid var(--line);border-radius:12px;padding:16px;color:inherit;text-decoration:none}\
.difficulty-easy{border-left:4px solid var(--easy)}.difficulty-medium{border-left:4px solid var(--medium)}.difficulty-hard{border-left:4px solid var(--hard)}\
.badge{display:inline-block;margin:4px 4px 0 0;padding:2px 8px;border-radius:10px;font-size:.75rem;background:var(--line)}\
.badge-easy{color:var(--easy)}.badge-medium{color:var(--medium)}.badge-hard{color:var(--hard)}\
.problem-number,.problem-date,.detail-meta{color:var(--muted);font-size:.85rem}\
.status-message{padding:10px 14px;border-radius:8px;background:#e6f7ee;margin:12px 0}.status-message.error{background:#fdecec}\
.pagination{display:flex;gap:12px;align-items:center;justify-content:center;margin:20px 0}\
.permalink-box{font-family:monospace;font-size:.8rem;margin-top:8px}.detail-body pre{overflow:auto;background:var(--line);padding:12px;border-radius:8px}\
.empty-state{text-align:center;padding:48px;color:var(--muted)}.empty-state-icon{font-size:2.5rem}</style>\n";

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    fn problem(tags: &[&str]) -> Problem {
        Problem {
            slug: "1-two-sum".to_string(),
            number: Some(1),
            title: "Two <Sum>".to_string(),
            difficulty: Difficulty::Easy,
            tags: tags.iter().map(|tag| (*tag).to_string()).collect(),
            date: Some("2024-01-01".to_string()),
            url: Some("https://leetcode.com/problems/two-sum/".to_string()),
            body: "## Approach\n\nUse a **hash map**.".to_string(),
        }
    }

    #[test]
    fn five_tags_with_limit_three_render_three_badges_and_overflow() {
        let tags: Vec<String> = ["a", "b", "c", "d", "e"].map(String::from).to_vec();
        let html = tag_badges(&tags, 3);

        let badge = Regex::new(r#"<span class="badge badge-tag">[^<]*</span>"#).unwrap();
        assert_eq!(badge.find_iter(&html).count(), 3);
        assert_eq!(html.matches("badge-overflow").count(), 1);
        assert!(html.ends_with(">+2</span>"));
    }

    #[test]
    fn tags_are_escaped_and_no_overflow_at_limit() {
        let tags = vec!["<b>".to_string()];
        assert_eq!(
            tag_badges(&tags, 3),
            "<span class=\"badge badge-tag\">&lt;b&gt;</span>"
        );
        assert_eq!(tag_badges(&[], 3), "");
    }

    #[test]
    fn card_escapes_title_and_links_to_detail() {
        let html = problem_card(&problem(&["Array"]));
        assert!(html.contains("Two &lt;Sum&gt;"));
        assert!(html.contains("class=\"problem-card difficulty-easy\""));
        assert!(html.contains("href=\"/?problem=1-two-sum\""));
        assert!(html.contains("<div class=\"problem-number\">#1</div>"));
        assert!(html.contains("<span class=\"badge badge-easy\">Easy</span>"));
        assert!(html.contains("2024-01-01"));
    }

    #[test]
    fn card_without_number_has_no_number_badge() {
        let mut unnumbered = problem(&[]);
        unnumbered.number = None;
        assert!(!problem_card(&unnumbered).contains("problem-number"));
    }

    #[test]
    fn empty_grid_renders_empty_state() {
        assert!(problem_grid(&[]).contains(EMPTY_STATE_TEXT));
    }

    #[test]
    fn detail_has_permalink_source_link_and_rendered_body() {
        let html = problem_detail(&problem(&["Array", "Hash Table"]), "http://localhost:8080");
        assert!(html.contains("Permalink: <a href=\"http://localhost:8080/?problem=1-two-sum\">"));
        assert!(html.contains("href=\"https://leetcode.com/problems/two-sum/\""));
        assert!(html.contains("<h2>Approach</h2>"));
        assert!(html.contains("<strong>hash map</strong>"));
        assert!(html.contains("#1 • 2024-01-01"));
        assert!(html.contains("← Back to list"));
    }

    #[test]
    fn detail_caps_tags_at_ten() {
        let tags: Vec<&str> = vec!["t"; 12];
        let html = problem_detail(&problem(&tags), "http://x");
        assert!(html.contains(">+2</span>"));
    }

    #[test]
    fn detail_without_url_omits_source_link() {
        let mut bare = problem(&[]);
        bare.url = Some(String::new());
        assert!(!problem_detail(&bare, "http://x").contains("source-link"));
    }

    #[test]
    fn banner_classes_follow_kind_and_message_is_escaped() {
        let error = status_banner(&StatusBanner::error("bad <thing>"));
        assert!(error.contains("status-message error"));
        assert!(error.contains("bad &lt;thing&gt;"));
        assert!(!status_banner(&StatusBanner::success("ok")).contains("error"));
    }

    #[test]
    fn tag_options_mark_selection() {
        let tags = vec!["Array".to_string(), "Stack".to_string()];
        let html = tag_options(&tags, "Stack");
        assert!(html.starts_with("<option value=\"\">All Tags</option>"));
        assert!(html.contains("<option value=\"Stack\" selected>Stack</option>"));
    }

    #[test]
    fn pagination_bar_disables_boundary_buttons() {
        let controls = PaginationControls {
            page_index: 1,
            total_pages: 3,
            total_items: 20,
            prev_disabled: true,
            next_disabled: false,
        };
        let html = pagination_bar(&controls);
        assert!(html.contains("value=\"1\" disabled>← Previous"));
        assert!(html.contains("value=\"2\">Next →"));
        assert!(html.contains("Page 1 of 3 • 20 problem(s)"));
    }

    #[test]
    fn upload_report_lists_successes_and_errors_verbatim() {
        let report = UploadReport {
            success: 1,
            uploaded: vec![crate::model::UploadedProblem {
                title: "Two Sum".to_string(),
                path: "problems/1-two-sum.md".to_string(),
                filename: None,
                slug: None,
            }],
            errors: vec!["notes.txt: Not a markdown file".to_string()],
        };
        let html = upload_report(&report);
        assert!(html.contains("Uploaded 1 problem(s)"));
        assert!(html.contains("Two Sum → problems/1-two-sum.md"));
        assert!(html.contains("notes.txt: Not a markdown file"));
    }

    #[test]
    fn editor_section_shows_panel_only_when_open() {
        let closed = editor_section(false, "# x", "x.md", None);
        assert!(closed.contains(">Markdown Editor</button>"));
        assert!(!closed.contains("editor-panel"));

        let report = UploadReport {
            success: 0,
            errors: vec!["a.txt: Not a markdown file".to_string()],
            ..UploadReport::default()
        };
        let open = editor_section(true, "a <b> & c", "two\"sum.md", Some(&report));
        assert!(open.contains(">Hide Editor</button>"));
        assert!(open.contains("<textarea id=\"markdown-editor\" name=\"markdown\">a &lt;b&gt; &amp; c</textarea>"));
        assert!(open.contains("value=\"two&quot;sum.md\""));
        assert!(open.contains("a.txt: Not a markdown file"));
    }

    #[test]
    fn page_shell_includes_refresh_theme_and_content() {
        let banner = StatusBanner::error("Problem not found. Redirecting to list...");
        let html = render_page(&PageView {
            title: "Not found",
            theme: Theme::Dark,
            banner: Some(&banner),
            content_html: "<p>x</p>",
            refresh: Some((2, "/")),
            ..PageView::default()
        });
        assert!(html.contains("<meta http-equiv=\"refresh\" content=\"2;url=/\">"));
        assert!(html.contains("data-theme=\"dark\""));
        assert!(html.contains("<p>x</p>"));
        assert!(!html.contains("filters-form"));
    }
}
