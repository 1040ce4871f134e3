use std::sync::Arc;

use crate::corpus::Corpus;
use crate::model::{spans_from_positions, BookmarkEntry, MatchResult};
use crate::oracle::{MatchOptions, MatchOracle, OracleError};

/// The list currently on screen and indexed by the selection cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActiveList {
    /// Empty query: the corpus in its fixed order, no match metadata.
    Unfiltered(Vec<Arc<BookmarkEntry>>),
    Ranked(Vec<MatchResult>),
}

impl Default for ActiveList {
    fn default() -> Self {
        Self::Ranked(Vec::new())
    }
}

impl ActiveList {
    pub fn unfiltered(corpus: &Corpus) -> Self {
        Self::Unfiltered(corpus.entries().to_vec())
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Unfiltered(entries) => entries.len(),
            Self::Ranked(matches) => matches.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn entry(&self, index: usize) -> Option<&BookmarkEntry> {
        match self {
            Self::Unfiltered(entries) => entries.get(index).map(|entry| entry.as_ref()),
            Self::Ranked(matches) => matches.get(index).map(|m| m.entry.as_ref()),
        }
    }

    pub fn match_at(&self, index: usize) -> Option<&MatchResult> {
        match self {
            Self::Unfiltered(_) => None,
            Self::Ranked(matches) => matches.get(index),
        }
    }
}

/// Turns a query into the next active list.
///
/// The oracle's ranking is passed through untouched, including its habit of
/// placing scattered character matches ahead of contiguous ones.
pub fn search(
    oracle: &dyn MatchOracle,
    corpus: &Corpus,
    query: &str,
    display_limit: usize,
) -> Result<ActiveList, OracleError> {
    if query.is_empty() {
        return Ok(ActiveList::unfiltered(corpus));
    }

    let options = MatchOptions::by_title(display_limit);
    let hits = oracle.rank(query, corpus.entries(), &options)?;

    let mut results = Vec::with_capacity(hits.len().min(display_limit));
    for hit in hits.into_iter().take(display_limit) {
        let Some(entry) = corpus.get(hit.index) else {
            return Err(OracleError::failed(
                oracle.matcher_name(),
                format!("match index out of range: {} (len={})", hit.index, corpus.len()),
            ));
        };
        results.push(MatchResult {
            entry: Arc::clone(entry),
            score: hit.score,
            highlight_spans: spans_from_positions(&hit.positions),
        });
    }

    Ok(ActiveList::Ranked(results))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{search, ActiveList};
    use crate::corpus::Corpus;
    use crate::model::{BookmarkEntry, HighlightSpan};
    use crate::oracle::{MatchOptions, MatchOracle, OracleError, OracleMatch, SkimOracle};

    fn scenario_corpus() -> Corpus {
        Corpus::from_entries(vec![
            BookmarkEntry::new("1", "GitHub", "https://github.com"),
            BookmarkEntry::new("2", "Gmail", "https://mail.google.com"),
        ])
    }

    struct OutOfRange;

    impl MatchOracle for OutOfRange {
        fn matcher_name(&self) -> &'static str {
            "out-of-range"
        }

        fn rank(
            &self,
            _query: &str,
            _corpus: &[Arc<BookmarkEntry>],
            _options: &MatchOptions,
        ) -> Result<Vec<OracleMatch>, OracleError> {
            Ok(vec![OracleMatch {
                index: 99,
                score: 1,
                positions: Vec::new(),
            }])
        }
    }

    #[test]
    fn empty_query_returns_corpus_in_order() {
        let corpus = scenario_corpus();
        let list = search(&SkimOracle::default(), &corpus, "", 1).unwrap();
        assert_eq!(list, ActiveList::unfiltered(&corpus));
        assert_eq!(list.len(), 2);
        assert!(list.match_at(0).is_none());
    }

    #[test]
    fn ranked_results_carry_highlight_spans() {
        let list = search(&SkimOracle::default(), &scenario_corpus(), "git", 100).unwrap();
        assert_eq!(list.len(), 1);
        let hit = list.match_at(0).unwrap();
        assert_eq!(hit.entry.title, "GitHub");
        assert_eq!(hit.highlight_spans, vec![HighlightSpan::new(0, 3)]);
    }

    #[test]
    fn bogus_oracle_index_is_reported_as_failure() {
        let err = search(&OutOfRange, &scenario_corpus(), "q", 10).unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }
}
