//! Client-side narrowing of already-fetched collections.
//!
//! Filtering never triggers a network call: it operates purely on the
//! in-memory list the view last loaded.

use crate::types::{Difficulty, Language, Problem, Submission};

/// Keyword + difficulty + language selection for the problem list.
///
/// An empty keyword matches everything; `None` selectors mean "all".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProblemFilter {
    pub keyword: String,
    pub difficulty: Option<Difficulty>,
    pub language: Option<Language>,
}

impl ProblemFilter {
    /// Keyword matching is a case-insensitive substring test against the
    /// title or the description; difficulty and language are exact.
    pub fn matches(&self, problem: &Problem) -> bool {
        let keyword = self.keyword.to_lowercase();
        let matches_keyword = keyword.is_empty()
            || problem.title.to_lowercase().contains(&keyword)
            || problem.description.to_lowercase().contains(&keyword);
        let matches_difficulty = self
            .difficulty
            .map_or(true, |difficulty| difficulty == problem.difficulty);
        let matches_language = self
            .language
            .map_or(true, |language| language == problem.language);
        matches_keyword && matches_difficulty && matches_language
    }

    /// Narrow `problems`, preserving order. Pure.
    pub fn apply<'a>(&self, problems: &'a [Problem]) -> Vec<&'a Problem> {
        problems.iter().filter(|p| self.matches(p)).collect()
    }
}

/// The submissions pane on a problem page shows only that problem's rows.
pub fn submissions_for_problem<'a>(
    submissions: &'a [Submission],
    problem_id: &str,
) -> Vec<&'a Submission> {
    submissions
        .iter()
        .filter(|submission| submission.problem_id == problem_id)
        .collect()
}
