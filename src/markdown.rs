//! Markdown to HTML for problem bodies.
//!
//! Parsing and rendering are separate steps: [`parse`] builds a [`Document`]
//! of blocks and inlines, [`Document::to_html`] writes the markup.
//!
//! Supported syntax:
//! - fenced code blocks (optional word-character language tag)
//! - `#`, `##` and `###` headers
//! - paragraphs separated by blank lines, single newlines become `<br>`
//! - inline code, `**bold**`, `*italic*` and `[text](url)` links
//!
//! Text outside code is emitted verbatim, so inline HTML in a body passes
//! through. Inline constructs never span lines.

use tracing::debug;

use crate::escape::escape_html;

const FENCE: &str = "```";
const RAW_BLOCK_PREFIXES: [&str; 4] = ["<h", "<pre", "<ul", "<ol"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MarkdownOptions {
    /// Escape the content of inline code spans. Off by default: problem
    /// bodies have always been rendered with raw inline code.
    pub escape_inline_code: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading { level: u8, content: Vec<Inline> },
    CodeBlock { lang: Option<String>, code: String },
    Paragraph { lines: Vec<Vec<Inline>> },
    /// Paragraph whose first line already opens block-level markup.
    Raw { lines: Vec<Vec<Inline>> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text(String),
    Code(String),
    Strong(Vec<Inline>),
    Emphasis(Vec<Inline>),
    Link { text: Vec<Inline>, href: String },
}

pub fn render(markdown: &str) -> String {
    render_with(markdown, MarkdownOptions::default())
}

pub fn render_with(markdown: &str, options: MarkdownOptions) -> String {
    parse(markdown).to_html(options)
}

pub fn parse(markdown: &str) -> Document {
    let lines: Vec<&str> = markdown.lines().collect();
    let mut blocks = Vec::new();
    let mut paragraph: Vec<&str> = Vec::new();
    let mut idx = 0;

    while idx < lines.len() {
        let line = lines[idx];

        if let Some(lang) = fence_language(line) {
            flush_paragraph(&mut paragraph, &mut blocks);
            let body_start = idx + 1;
            let close = lines[body_start..]
                .iter()
                .position(|candidate| candidate.trim_start().starts_with(FENCE))
                .map(|offset| body_start + offset);
            // An unclosed fence runs to the end of the input.
            let body_end = close.unwrap_or(lines.len());
            let code = lines[body_start..body_end].join("\n").trim().to_string();
            blocks.push(Block::CodeBlock { lang, code });
            idx = close.map_or(lines.len(), |close| close + 1);
            continue;
        }

        if let Some((level, text)) = atx_heading(line) {
            flush_paragraph(&mut paragraph, &mut blocks);
            blocks.push(Block::Heading {
                level,
                content: parse_inlines(text),
            });
        } else if line.trim().is_empty() {
            flush_paragraph(&mut paragraph, &mut blocks);
        } else {
            paragraph.push(line);
        }
        idx += 1;
    }

    flush_paragraph(&mut paragraph, &mut blocks);
    Document { blocks }
}

impl Document {
    pub fn to_html(&self, options: MarkdownOptions) -> String {
        self.blocks
            .iter()
            .map(|block| render_block(block, options))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Tokenizes a single line of text into inline nodes.
pub fn parse_inlines(text: &str) -> Vec<Inline> {
    let mut nodes = Vec::new();
    let mut pending = String::new();
    let mut rest = text;

    while let Some(ch) = rest.chars().next() {
        let matched = match ch {
            '`' => code_span(rest),
            '*' => strong(rest).or_else(|| emphasis(rest)),
            '[' => link(rest),
            _ => None,
        };

        match matched {
            Some((node, consumed)) => {
                if !pending.is_empty() {
                    nodes.push(Inline::Text(std::mem::take(&mut pending)));
                }
                nodes.push(node);
                rest = &rest[consumed..];
            }
            None => {
                pending.push(ch);
                rest = &rest[ch.len_utf8()..];
            }
        }
    }

    if !pending.is_empty() {
        nodes.push(Inline::Text(pending));
    }
    nodes
}

fn fence_language(line: &str) -> Option<Option<String>> {
    let tag = line.strip_prefix(FENCE)?.trim();
    if tag.is_empty() {
        Some(None)
    } else if tag.chars().all(is_word_char) {
        Some(Some(tag.to_string()))
    } else {
        None
    }
}

fn atx_heading(line: &str) -> Option<(u8, &str)> {
    [(3, "### "), (2, "## "), (1, "# ")]
        .into_iter()
        .find_map(|(level, marker)| {
            line.strip_prefix(marker)
                .map(str::trim_end)
                .filter(|text| !text.is_empty())
                .map(|text| (level, text))
        })
}

fn flush_paragraph(lines: &mut Vec<&str>, blocks: &mut Vec<Block>) {
    let Some(first) = lines.first() else {
        return;
    };
    let raw = RAW_BLOCK_PREFIXES
        .iter()
        .any(|prefix| first.starts_with(prefix));
    let parsed = lines.drain(..).map(parse_inlines).collect();

    blocks.push(if raw {
        Block::Raw { lines: parsed }
    } else {
        Block::Paragraph { lines: parsed }
    });
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

fn code_span_len(rest: &str) -> Option<usize> {
    let body = rest.strip_prefix('`')?;
    let end = body.find('`').filter(|&end| end > 0)?;
    Some(end + 2)
}

fn strong_len(rest: &str) -> Option<usize> {
    let body = rest.strip_prefix("**")?;
    find_closing(body, "**").map(|end| end + 4)
}

/// Byte offset of the first closing `delimiter` in `body` that leaves at
/// least one character of content. Code spans are skipped, and so are whole
/// `**…**` pairs when looking for a single `*`.
fn find_closing(body: &str, delimiter: &str) -> Option<usize> {
    let mut pos = 0;
    while pos < body.len() {
        let tail = &body[pos..];
        if let Some(len) = code_span_len(tail) {
            pos += len;
            continue;
        }
        if delimiter == "*" {
            if let Some(len) = strong_len(tail) {
                pos += len;
                continue;
            }
        }
        if pos > 0 && tail.starts_with(delimiter) {
            return Some(pos);
        }
        pos += tail.chars().next().map_or(1, char::len_utf8);
    }
    None
}

fn code_span(rest: &str) -> Option<(Inline, usize)> {
    let len = code_span_len(rest)?;
    Some((Inline::Code(rest[1..len - 1].to_string()), len))
}

fn strong(rest: &str) -> Option<(Inline, usize)> {
    let len = strong_len(rest)?;
    Some((Inline::Strong(parse_inlines(&rest[2..len - 2])), len))
}

fn emphasis(rest: &str) -> Option<(Inline, usize)> {
    let body = rest.strip_prefix('*')?;
    let end = find_closing(body, "*")?;
    Some((Inline::Emphasis(parse_inlines(&body[..end])), end + 2))
}

fn link(rest: &str) -> Option<(Inline, usize)> {
    let body = rest.strip_prefix('[')?;
    let label_end = body.find(']').filter(|&end| end > 0)?;
    let target = body[label_end + 1..].strip_prefix('(')?;
    let href_end = target.find(')').filter(|&end| end > 0)?;

    let node = Inline::Link {
        text: parse_inlines(&body[..label_end]),
        href: target[..href_end].to_string(),
    };
    // `[` + label + `](` + href + `)`
    Some((node, label_end + href_end + 4))
}

fn render_block(block: &Block, options: MarkdownOptions) -> String {
    match block {
        Block::Heading { level, content } => {
            format!("<h{level}>{}</h{level}>", render_inlines(content, options))
        }
        Block::CodeBlock { code, .. } => format!("<pre><code>{}</code></pre>", escape_html(code)),
        Block::Paragraph { lines } => format!("<p>{}</p>", render_lines(lines, options)),
        Block::Raw { lines } => render_lines(lines, options),
    }
}

fn render_lines(lines: &[Vec<Inline>], options: MarkdownOptions) -> String {
    lines
        .iter()
        .map(|line| render_inlines(line, options))
        .collect::<Vec<_>>()
        .join("<br>")
}

fn render_inlines(nodes: &[Inline], options: MarkdownOptions) -> String {
    let mut out = String::new();
    for node in nodes {
        match node {
            Inline::Text(text) => out.push_str(text),
            Inline::Code(code) => {
                out.push_str("<code>");
                if options.escape_inline_code {
                    out.push_str(&escape_html(code));
                } else {
                    if code.contains(['<', '>', '&']) {
                        debug!(
                            component = "markdown",
                            event = "markdown.inline_code.unescaped",
                            length = code.len()
                        );
                    }
                    out.push_str(code);
                }
                out.push_str("</code>");
            }
            Inline::Strong(children) => {
                out.push_str("<strong>");
                out.push_str(&render_inlines(children, options));
                out.push_str("</strong>");
            }
            Inline::Emphasis(children) => {
                out.push_str("<em>");
                out.push_str(&render_inlines(children, options));
                out.push_str("</em>");
            }
            Inline::Link { text, href } => {
                out.push_str("<a href=\"");
                out.push_str(&escape_html(href));
                out.push_str("\" target=\"_blank\" rel=\"noopener noreferrer\">");
                out.push_str(&render_inlines(text, options));
                out.push_str("</a>");
            }
        }
    }
    out
}
