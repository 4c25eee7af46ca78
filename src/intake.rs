//! Problem intake from raw markdown files.
//!
//! An optional YAML frontmatter block (`---` ... `---`) may set `title`,
//! `number`, `difficulty`, `tags`, `date` and `url`. Anything it leaves out
//! is inferred from the body and the filename.

use serde_yaml::{Mapping, Value};
use tracing::debug;

use crate::model::{Difficulty, Problem};
use crate::slug::problem_slug;

/// Tags recognised in problem bodies, in detection order.
pub const KNOWN_TAGS: [&str; 38] = [
    "Array",
    "String",
    "Hash Table",
    "Dynamic Programming",
    "Math",
    "Sorting",
    "Greedy",
    "Depth-First Search",
    "Binary Search",
    "Database",
    "Breadth-First Search",
    "Tree",
    "Matrix",
    "Two Pointers",
    "Binary Tree",
    "Bit Manipulation",
    "Stack",
    "Heap",
    "Priority Queue",
    "Graph",
    "Prefix Sum",
    "Simulation",
    "Design",
    "Counting",
    "Backtracking",
    "Sliding Window",
    "Linked List",
    "Union Find",
    "Queue",
    "Recursion",
    "Divide and Conquer",
    "Memoization",
    "Monotonic Stack",
    "Trie",
    "Number Theory",
    "Geometry",
    "Game Theory",
    "Segment Tree",
];

const MAX_DETECTED_TAGS: usize = 8;

const HARD_WORDS: [&str; 3] = ["hard", "difficult", "complex"];
const MEDIUM_WORDS: [&str; 2] = ["medium", "moderate"];
const EASY_WORDS: [&str; 3] = ["easy", "simple", "basic"];

pub(crate) fn problem_from_markdown(raw: &str, filename: &str) -> Problem {
    let (meta, body) = split_frontmatter(raw);
    let stem = filename.strip_suffix(".md").unwrap_or(filename);

    let title = meta_string(&meta, "title").unwrap_or_else(|| infer_title(body, stem));
    let number = meta_number(&meta)
        .or_else(|| number_from_filename(filename))
        .or_else(|| number_from_heading(body));
    let difficulty = match meta.get("difficulty").filter(|value| is_present(value)) {
        Some(value) => serde_yaml::from_value(value.clone()).unwrap_or(Difficulty::Unknown),
        None => detect_difficulty(body),
    };
    let tags = meta_tags(&meta).unwrap_or_else(|| detect_tags(body));

    Problem {
        slug: problem_slug(number, &title, stem),
        number,
        title,
        difficulty,
        tags,
        date: meta_string(&meta, "date"),
        url: meta_string(&meta, "url"),
        body: body.trim().to_string(),
    }
}

/// Splits off a leading frontmatter block. A block that is not a YAML
/// mapping is dropped from the body and ignored.
fn split_frontmatter(raw: &str) -> (Mapping, &str) {
    let Some(after_open) = raw.strip_prefix("---") else {
        return (Mapping::new(), raw);
    };
    let Some((opening, rest)) = after_open.split_once('\n') else {
        return (Mapping::new(), raw);
    };
    if !opening.trim().is_empty() {
        return (Mapping::new(), raw);
    }

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            let yaml = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return (parse_mapping(yaml), body);
        }
        offset += line.len();
    }
    (Mapping::new(), raw)
}

fn parse_mapping(yaml: &str) -> Mapping {
    if yaml.trim().is_empty() {
        return Mapping::new();
    }
    match serde_yaml::from_str::<Mapping>(yaml) {
        Ok(mapping) => mapping,
        Err(err) => {
            debug!(
                component = "intake",
                event = "intake.frontmatter.invalid",
                error = %err
            );
            Mapping::new()
        }
    }
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(text) => !text.trim().is_empty(),
        Value::Sequence(items) => !items.is_empty(),
        _ => true,
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.trim().to_string()).filter(|text| !text.is_empty()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

fn meta_string(meta: &Mapping, key: &str) -> Option<String> {
    meta.get(key).and_then(scalar_string)
}

fn meta_number(meta: &Mapping) -> Option<u32> {
    let number = match meta.get("number")? {
        Value::Number(number) => number.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    };
    number.filter(|n| *n > 0)
}

/// `tags` may be a list or a comma-separated string.
fn meta_tags(meta: &Mapping) -> Option<Vec<String>> {
    let tags: Vec<String> = match meta.get("tags")? {
        Value::Sequence(items) => items.iter().filter_map(scalar_string).collect(),
        Value::String(text) => text
            .split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    };
    Some(tags).filter(|tags| !tags.is_empty())
}

/// First digit run at the start of the filename or after `-`/`_`.
fn number_from_filename(filename: &str) -> Option<u32> {
    let bytes = filename.as_bytes();
    (0..bytes.len())
        .filter(|&i| i == 0 || matches!(bytes[i - 1], b'-' | b'_'))
        .find_map(|i| {
            let len = bytes[i..].iter().take_while(|b| b.is_ascii_digit()).count();
            if len == 0 {
                return None;
            }
            filename[i..i + len].parse::<u32>().ok()
        })
        .filter(|n| *n > 0)
}

/// First `# N.` in the body, at any heading level.
fn number_from_heading(body: &str) -> Option<u32> {
    body.match_indices('#').find_map(|(i, _)| {
        let after = &body[i + 1..];
        let trimmed = after.trim_start();
        if trimmed.len() == after.len() {
            return None;
        }
        let len = trimmed.bytes().take_while(u8::is_ascii_digit).count();
        if len == 0 || trimmed.as_bytes().get(len) != Some(&b'.') {
            return None;
        }
        trimmed[..len].parse().ok()
    })
}

fn heading_text(line: &str) -> Option<&str> {
    let text = line.strip_prefix("##").or_else(|| line.strip_prefix('#'))?;
    if !text.starts_with(char::is_whitespace) {
        return None;
    }
    Some(text.trim()).filter(|text| !text.is_empty())
}

fn strip_number_prefix(text: &str) -> &str {
    let len = text.bytes().take_while(u8::is_ascii_digit).count();
    if len == 0 {
        return text;
    }
    match text[len..].strip_prefix('.') {
        Some(rest) if rest.starts_with(char::is_whitespace) => rest.trim_start(),
        _ => text,
    }
}

fn infer_title(body: &str, stem: &str) -> String {
    match body.lines().find_map(heading_text) {
        Some(heading) => strip_number_prefix(heading).to_string(),
        None => title_from_stem(stem),
    }
}

fn title_from_stem(stem: &str) -> String {
    let without_number = stem
        .split_once('-')
        .filter(|(prefix, _)| !prefix.is_empty() && prefix.chars().all(|ch| ch.is_ascii_digit()))
        .map_or(stem, |(_, rest)| rest);

    without_number
        .split('-')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn detect_difficulty(body: &str) -> Difficulty {
    let lower = body.to_lowercase();
    let mentions = |words: &[&str]| words.iter().any(|word| lower.contains(word));
    if mentions(&HARD_WORDS) {
        Difficulty::Hard
    } else if mentions(&MEDIUM_WORDS) {
        Difficulty::Medium
    } else if mentions(&EASY_WORDS) {
        Difficulty::Easy
    } else {
        Difficulty::Unknown
    }
}

fn detect_tags(body: &str) -> Vec<String> {
    let lower = body.to_lowercase();
    KNOWN_TAGS
        .iter()
        .filter(|tag| lower.contains(&tag.to_lowercase()))
        .take(MAX_DETECTED_TAGS)
        .map(|tag| (*tag).to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_sets_number_title_and_slug() {
        let problem = problem_from_markdown("# 70. Climbing Stairs\n\nbody", "x.md");
        assert_eq!(problem.number, Some(70));
        assert_eq!(problem.title, "Climbing Stairs");
        assert_eq!(problem.slug, "70-climbing-stairs");
        assert_eq!(problem.difficulty, Difficulty::Unknown);
        assert!(problem.tags.is_empty());
    }

    #[test]
    fn filename_supplies_number_and_title_without_heading() {
        let problem = problem_from_markdown("no heading here", "0070-climbing-stairs.md");
        assert_eq!(problem.title, "Climbing Stairs");
        assert_eq!(problem.number, Some(70));
        assert_eq!(problem.slug, "70-climbing-stairs");

        assert_eq!(number_from_filename("day_12-notes.md"), Some(12));
        assert_eq!(number_from_filename("two-sum.md"), None);
        assert_eq!(number_from_filename("v2.md"), None);
    }

    #[test]
    fn filename_number_wins_over_heading_number() {
        let problem = problem_from_markdown("## 5. Other Title", "0012-integer-to-roman.md");
        assert_eq!(problem.number, Some(12));
        assert_eq!(problem.title, "Other Title");
    }

    #[test]
    fn difficulty_and_tags_are_detected_from_the_body() {
        let body = "# 42. Trapping Rain Water\n\nA hard one. Use two pointers over the array, \
                    or a monotonic stack.";
        let problem = problem_from_markdown(body, "trap.md");
        assert_eq!(problem.difficulty, Difficulty::Hard);
        assert_eq!(
            problem.tags,
            vec!["Array", "Two Pointers", "Stack", "Monotonic Stack"]
        );

        assert_eq!(detect_difficulty("A moderate warmup"), Difficulty::Medium);
        assert_eq!(detect_difficulty("Simple loop"), Difficulty::Easy);
    }

    #[test]
    fn detected_tags_are_capped() {
        let body = KNOWN_TAGS.join(" ");
        assert_eq!(detect_tags(&body).len(), MAX_DETECTED_TAGS);
    }

    #[test]
    fn frontmatter_overrides_inference_and_is_stripped_from_body() {
        let raw = "---\ntitle: Two Sum\nnumber: 1\ndifficulty: Easy\ntags: Array, Hash Table\n\
                   date: 2024-01-01\nurl: https://leetcode.com/problems/two-sum/\n---\n\
                   # Something hard\n\nBody text.";
        let problem = problem_from_markdown(raw, "notes.md");

        assert_eq!(problem.title, "Two Sum");
        assert_eq!(problem.number, Some(1));
        assert_eq!(problem.slug, "1-two-sum");
        assert_eq!(problem.difficulty, Difficulty::Easy);
        assert_eq!(problem.tags, vec!["Array", "Hash Table"]);
        assert_eq!(problem.date.as_deref(), Some("2024-01-01"));
        assert_eq!(
            problem.url.as_deref(),
            Some("https://leetcode.com/problems/two-sum/")
        );
        assert_eq!(problem.body, "# Something hard\n\nBody text.");
    }

    #[test]
    fn frontmatter_tag_list_and_unknown_difficulty() {
        let raw = "---\ndifficulty: Brutal\ntags:\n  - Graph\n  - Trie\n---\n# 9. Palindrome";
        let problem = problem_from_markdown(raw, "x.md");
        assert_eq!(problem.difficulty, Difficulty::Unknown);
        assert_eq!(problem.tags, vec!["Graph", "Trie"]);
        assert_eq!(problem.number, Some(9));
    }

    #[test]
    fn invalid_frontmatter_is_ignored_but_removed() {
        let raw = "---\ntitle: [unclosed\n---\n# 3. Real Title\n";
        let problem = problem_from_markdown(raw, "x.md");
        assert_eq!(problem.title, "Real Title");
        assert_eq!(problem.body, "# 3. Real Title");
    }

    #[test]
    fn unterminated_frontmatter_stays_in_the_body() {
        let raw = "---\ntitle: Nope\n# 4. Median";
        let problem = problem_from_markdown(raw, "x.md");
        assert_eq!(problem.title, "Median");
        assert!(problem.body.starts_with("---"));
    }
}
