//! In-memory catalog implementing [`ProblemApi`] with the backend's
//! filter and sort semantics. Serves the demo mode and tests.

use std::collections::BTreeSet;
use std::sync::{Arc, RwLock};

use crate::client::{ApiError, ProblemApi};
use crate::model::{
    Difficulty, FilterState, Problem, SaveRequest, SaveResponse, SortOrder, Stats, UploadFile,
    UploadReport, UploadedProblem,
};
use crate::intake::problem_from_markdown;
use crate::slug::{problem_slug, slugify};

#[derive(Debug, Clone, Default)]
pub struct InMemoryProblemApi {
    inner: Arc<RwLock<Vec<Problem>>>,
}

impl InMemoryProblemApi {
    pub fn new(problems: Vec<Problem>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(problems)),
        }
    }

    pub fn demo() -> Self {
        Self::new(demo_catalog())
    }

    pub fn problems(&self) -> Vec<Problem> {
        self.inner
            .read()
            .expect("in-memory catalog lock should not be poisoned")
            .clone()
    }

    /// Adds a problem parsed from raw markdown, replacing any entry with the
    /// same slug.
    fn insert_markdown(&self, markdown: &str, filename: &str) -> Problem {
        let problem = problem_from_markdown(markdown, filename);
        let mut guard = self
            .inner
            .write()
            .expect("in-memory catalog lock should not be poisoned");
        guard.retain(|existing| existing.slug != problem.slug);
        guard.push(problem.clone());
        problem
    }
}

impl ProblemApi for InMemoryProblemApi {
    async fn stats(&self) -> Result<Stats, ApiError> {
        Ok(compute_stats(&self.problems()))
    }

    async fn tags(&self) -> Result<Vec<String>, ApiError> {
        let unique: BTreeSet<String> = self
            .problems()
            .into_iter()
            .flat_map(|problem| problem.tags)
            .collect();
        Ok(unique.into_iter().collect())
    }

    async fn list_problems(&self, filters: &FilterState) -> Result<Vec<Problem>, ApiError> {
        Ok(apply_filters(self.problems(), filters))
    }

    async fn get_problem(&self, slug: &str) -> Result<Problem, ApiError> {
        self.problems()
            .into_iter()
            .find(|problem| problem.slug == slug)
            .ok_or_else(|| ApiError::NotFound {
                slug: slug.to_string(),
            })
    }

    async fn save_markdown(&self, request: &SaveRequest) -> Result<SaveResponse, ApiError> {
        let markdown = request.markdown.trim();
        if markdown.is_empty() {
            return Err(ApiError::Validation("Markdown content is empty".to_string()));
        }
        let filename = request.filename.as_deref().unwrap_or_default();
        let problem = self.insert_markdown(markdown, filename);
        Ok(SaveResponse {
            path: memory_path(&problem),
            title: problem.title,
        })
    }

    async fn upload(&self, files: &[UploadFile]) -> Result<UploadReport, ApiError> {
        let mut report = UploadReport::default();
        for file in files {
            if !file.filename.ends_with(".md") {
                report
                    .errors
                    .push(format!("{}: Not a markdown file", file.filename));
                continue;
            }
            let raw = match std::str::from_utf8(&file.contents) {
                Ok(raw) => raw,
                Err(err) => {
                    report.errors.push(format!("{}: {err}", file.filename));
                    continue;
                }
            };
            let problem = self.insert_markdown(raw, &file.filename);
            report.uploaded.push(UploadedProblem {
                path: memory_path(&problem),
                title: problem.title,
                filename: Some(file.filename.clone()),
                slug: Some(problem.slug),
            });
        }
        report.success = report.uploaded.len() as u64;
        Ok(report)
    }
}

/// Filters then sorts like the catalog backend: `All` disables the
/// difficulty filter, tags match exactly, search is a case-insensitive
/// substring of the title, the number or any tag.
pub fn apply_filters(problems: Vec<Problem>, filters: &FilterState) -> Vec<Problem> {
    let search = filters.search.trim().to_lowercase();
    let mut matched: Vec<Problem> = problems
        .into_iter()
        .filter(|problem| filters.difficulty.matches(problem.difficulty))
        .filter(|problem| filters.tag.is_empty() || problem.tags.contains(&filters.tag))
        .filter(|problem| search.is_empty() || matches_search(problem, &search))
        .collect();
    sort_problems(&mut matched, filters.sort);
    matched
}

fn matches_search(problem: &Problem, needle: &str) -> bool {
    problem.title.to_lowercase().contains(needle)
        || problem
            .number
            .is_some_and(|number| number.to_string().contains(needle))
        || problem
            .tags
            .iter()
            .any(|tag| tag.to_lowercase().contains(needle))
}

/// Stable sort. Missing numbers go last ascending and last descending;
/// missing dates go last.
pub fn sort_problems(problems: &mut [Problem], order: SortOrder) {
    match order {
        SortOrder::NumberAsc => problems.sort_by_key(|p| p.number.unwrap_or(u32::MAX)),
        SortOrder::NumberDesc => {
            problems.sort_by(|a, b| b.number.unwrap_or(0).cmp(&a.number.unwrap_or(0)))
        }
        SortOrder::DifficultyAsc => problems.sort_by_key(|p| p.difficulty.rank()),
        SortOrder::DifficultyDesc => {
            problems.sort_by(|a, b| b.difficulty.rank().cmp(&a.difficulty.rank()))
        }
        SortOrder::DateDesc => problems.sort_by(|a, b| {
            b.date
                .as_deref()
                .unwrap_or_default()
                .cmp(a.date.as_deref().unwrap_or_default())
        }),
    }
}

pub fn compute_stats(problems: &[Problem]) -> Stats {
    let mut stats = Stats {
        total: problems.len() as u64,
        ..Stats::default()
    };
    for problem in problems {
        match problem.difficulty {
            Difficulty::Easy => stats.easy += 1,
            Difficulty::Medium => stats.medium += 1,
            Difficulty::Hard => stats.hard += 1,
            Difficulty::Unknown => {}
        }
        for tag in &problem.tags {
            *stats.tags.entry(tag.clone()).or_insert(0) += 1;
        }
    }
    stats
}

fn memory_path(problem: &Problem) -> String {
    format!("memory/{}.md", slugify(&problem.slug))
}

pub fn demo_catalog() -> Vec<Problem> {
    fn entry(
        number: u32,
        title: &str,
        difficulty: Difficulty,
        tags: &[&str],
        date: &str,
        body: &str,
    ) -> Problem {
        Problem {
            slug: problem_slug(Some(number), title, ""),
            number: Some(number),
            title: title.to_string(),
            difficulty,
            tags: tags.iter().map(|tag| (*tag).to_string()).collect(),
            date: Some(date.to_string()),
            url: Some(format!("https://leetcode.com/problems/{}/", slugify(title))),
            body: body.to_string(),
        }
    }

    vec![
        entry(
            1,
            "Two Sum",
            Difficulty::Easy,
            &["Array", "Hash Table"],
            "2024-01-01",
            "# 1. Two Sum\n\nReturn the indices of the two numbers that add up to `target`.\n\n## Approach\n\nOne pass with a **hash map** from value to index.\n\n```python\ndef two_sum(nums, target):\n    seen = {}\n    for i, n in enumerate(nums):\n        if target - n in seen:\n            return [seen[target - n], i]\n        seen[n] = i\n```",
        ),
        entry(
            20,
            "Valid Parentheses",
            Difficulty::Easy,
            &["String", "Stack"],
            "2024-01-02",
            "# 20. Valid Parentheses\n\nPush openers on a *stack*, pop on matching closers.",
        ),
        entry(
            3,
            "Longest Substring Without Repeating Characters",
            Difficulty::Medium,
            &["Hash Table", "String", "Sliding Window"],
            "2024-01-03",
            "# 3. Longest Substring Without Repeating Characters\n\nSliding window over the last index of each character.",
        ),
        entry(
            42,
            "Trapping Rain Water",
            Difficulty::Hard,
            &["Array", "Two Pointers", "Dynamic Programming", "Stack", "Monotonic Stack"],
            "2024-01-04",
            "# 42. Trapping Rain Water\n\nTwo pointers moving inward, tracking the max height seen from each side.",
        ),
        entry(
            121,
            "Best Time to Buy and Sell Stock",
            Difficulty::Easy,
            &["Array", "Dynamic Programming"],
            "2024-01-05",
            "# 121. Best Time to Buy and Sell Stock\n\nTrack the minimum price so far.",
        ),
        entry(
            146,
            "LRU Cache",
            Difficulty::Medium,
            &["Hash Table", "Linked List", "Design"],
            "2024-01-06",
            "# 146. LRU Cache\n\nHash map plus doubly linked list.",
        ),
    ]
}
