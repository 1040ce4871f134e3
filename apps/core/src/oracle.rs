use std::sync::Arc;

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use thiserror::Error;

use crate::model::BookmarkEntry;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OracleError {
    #[error("matcher '{matcher}' failed: {message}")]
    Failed {
        matcher: &'static str,
        message: String,
    },
}

impl OracleError {
    pub fn failed(matcher: &'static str, message: impl Into<String>) -> Self {
        Self::Failed {
            matcher,
            message: message.into(),
        }
    }
}

/// Which field of an entry the matcher scores against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKey {
    Title,
    Url,
}

impl MatchKey {
    pub fn select(self, entry: &BookmarkEntry) -> &str {
        match self {
            Self::Title => &entry.title,
            Self::Url => &entry.url,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchOptions {
    pub key: MatchKey,
    pub limit: usize,
    /// Minimum score a candidate needs to be returned.
    pub threshold: i64,
}

impl MatchOptions {
    pub fn by_title(limit: usize) -> Self {
        Self {
            key: MatchKey::Title,
            limit,
            threshold: 0,
        }
    }
}

/// A single ranked hit: `index` points into the corpus slice that was ranked,
/// `positions` are character offsets into the keyed string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleMatch {
    pub index: usize,
    pub score: i64,
    pub positions: Vec<usize>,
}

/// Fuzzy ranking is delegated; callers treat the returned order as final.
pub trait MatchOracle: Send + Sync {
    fn matcher_name(&self) -> &'static str;

    fn rank(
        &self,
        query: &str,
        corpus: &[Arc<BookmarkEntry>],
        options: &MatchOptions,
    ) -> Result<Vec<OracleMatch>, OracleError>;
}

/// Default oracle backed by the skim v2 scorer, case-insensitive.
pub struct SkimOracle {
    matcher: SkimMatcherV2,
}

impl Default for SkimOracle {
    fn default() -> Self {
        Self {
            matcher: SkimMatcherV2::default().ignore_case(),
        }
    }
}

impl MatchOracle for SkimOracle {
    fn matcher_name(&self) -> &'static str {
        "skim-v2"
    }

    fn rank(
        &self,
        query: &str,
        corpus: &[Arc<BookmarkEntry>],
        options: &MatchOptions,
    ) -> Result<Vec<OracleMatch>, OracleError> {
        if options.limit == 0 || query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let mut hits: Vec<OracleMatch> = corpus
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| {
                let (score, positions) =
                    self.matcher.fuzzy_indices(options.key.select(entry), query)?;
                (score >= options.threshold).then_some(OracleMatch {
                    index,
                    score,
                    positions,
                })
            })
            .collect();

        hits.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.index.cmp(&b.index)));
        hits.truncate(options.limit);
        Ok(hits)
    }
}
