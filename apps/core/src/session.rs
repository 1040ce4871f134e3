use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::bookmark_source::{BookmarkSource, SourceError};
use crate::config::Config;
use crate::corpus::{self, Corpus, CorpusOptions};
use crate::cursor::SelectionCursor;
use crate::intent::{Command, DispatchOutcome, Effect, Intent, KeyChord, Keymap};
use crate::model::BookmarkEntry;
use crate::navigation::{LaunchError, NavigationSink, OpenMode, OpenRequest};
use crate::oracle::{MatchOracle, OracleError};
use crate::presenter::{self, RenderInstruction, ResultsInfo};
use crate::search::{self, ActiveList};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    pub display_limit: usize,
    pub page_size: usize,
    pub open_mode: OpenMode,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            display_limit: crate::config::DEFAULT_DISPLAY_LIMIT,
            page_size: crate::config::DEFAULT_PAGE_SIZE,
            open_mode: OpenMode::ReplaceCurrent,
        }
    }
}

impl SessionSettings {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            display_limit: cfg.display_limit,
            page_size: cfg.page_size,
            open_mode: cfg.open_mode,
        }
    }
}

/// One open instance of the search UI. Owns the corpus, the active list and
/// the cursor; nothing here outlives the session.
pub struct SearchSession {
    corpus: Corpus,
    oracle: Box<dyn MatchOracle>,
    settings: SessionSettings,
    keymap: Keymap,
    query: String,
    active: ActiveList,
    cursor: SelectionCursor,
    last_info: ResultsInfo,
    last_error: Option<OracleError>,
    rng: StdRng,
}

impl SearchSession {
    /// Starts on the unfiltered list. The first info line reports zero elapsed
    /// time since no loading happened here; see [`SearchSession::from_source`].
    pub fn new(corpus: Corpus, oracle: Box<dyn MatchOracle>, settings: SessionSettings) -> Self {
        let active = ActiveList::unfiltered(&corpus);
        let last_info = ResultsInfo {
            count: active.len(),
            elapsed: Duration::ZERO,
        };
        tracing::info!(
            entries = corpus.len(),
            matcher = oracle.matcher_name(),
            display_limit = settings.display_limit,
            page_size = settings.page_size,
            "search session started"
        );

        Self {
            corpus,
            oracle,
            settings,
            keymap: Keymap::default(),
            query: String::new(),
            active,
            cursor: SelectionCursor::default(),
            last_info,
            last_error: None,
            rng: StdRng::from_entropy(),
        }
    }

    /// Reads the bookmark tree once and flattens it into the session corpus.
    /// The initial info line covers the load and the flatten.
    pub fn from_source(
        source: &dyn BookmarkSource,
        options: &CorpusOptions,
        oracle: Box<dyn MatchOracle>,
        settings: SessionSettings,
    ) -> Result<Self, SourceError> {
        let started = Instant::now();
        let roots = source.load_tree()?;
        let corpus = corpus::build(&roots, options);
        let elapsed = started.elapsed();
        tracing::debug!(
            source = source.source_name(),
            entries = corpus.len(),
            elapsed_ms = elapsed.as_secs_f64() * 1000.0,
            "corpus built"
        );

        let mut session = Self::new(corpus, oracle, settings);
        session.last_info.elapsed = elapsed;
        Ok(session)
    }

    pub fn with_keymap(mut self, keymap: Keymap) -> Self {
        self.keymap = keymap;
        self
    }

    /// Makes open-random reproducible.
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn active_list(&self) -> &ActiveList {
        &self.active
    }

    pub fn cursor(&self) -> usize {
        self.cursor.index()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn results_info(&self) -> ResultsInfo {
        self.last_info
    }

    /// The oracle failure behind the current (empty) list, if any.
    pub fn last_error(&self) -> Option<&OracleError> {
        self.last_error.as_ref()
    }

    pub fn selected_entry(&self) -> Option<&BookmarkEntry> {
        let index = self.cursor.selected(self.active.len())?;
        self.active.entry(index)
    }

    /// Re-runs the search for `query` and replaces the active list.
    ///
    /// An oracle failure leaves an empty list behind for this query only; the
    /// next call searches normally.
    pub fn set_query(&mut self, query: &str) -> RenderInstruction {
        let started = Instant::now();
        self.query = query.to_string();

        let next = match search::search(
            self.oracle.as_ref(),
            &self.corpus,
            query,
            self.settings.display_limit,
        ) {
            Ok(list) => {
                self.last_error = None;
                list
            }
            Err(error) => {
                tracing::warn!(%error, query, "search failed; showing empty results");
                self.last_error = Some(error);
                ActiveList::default()
            }
        };
        self.replace_active(next, started.elapsed());
        tracing::debug!(
            query,
            results = self.active.len(),
            elapsed_ms = self.last_info.elapsed.as_secs_f64() * 1000.0,
            "query evaluated"
        );
        self.render()
    }

    fn replace_active(&mut self, list: ActiveList, elapsed: Duration) {
        self.active = list;
        self.cursor.reset();
        self.last_info = ResultsInfo {
            count: self.active.len(),
            elapsed,
        };
    }

    pub fn handle_key(&mut self, chord: &KeyChord) -> DispatchOutcome {
        match self.keymap.resolve(chord) {
            Some(intent) => self.dispatch(intent),
            None => DispatchOutcome::ignored(),
        }
    }

    /// Applies one intent. At most one open request comes out per call.
    pub fn dispatch(&mut self, intent: Intent) -> DispatchOutcome {
        let len = self.active.len();
        let from = self.cursor.index();

        let effect = match intent.command(self.settings.open_mode) {
            Command::Step(delta) => {
                if self.cursor.step(delta, len) {
                    Effect::CursorMoved {
                        from,
                        to: self.cursor.index(),
                    }
                } else {
                    Effect::None
                }
            }
            Command::Page(direction) => {
                if self.cursor.page(direction, self.settings.page_size, len) {
                    Effect::CursorMoved {
                        from,
                        to: self.cursor.index(),
                    }
                } else {
                    Effect::None
                }
            }
            Command::OpenSelected(mode) => match self.selected_entry() {
                Some(entry) => Effect::Open(OpenRequest {
                    url: entry.url.clone(),
                    mode,
                }),
                None => Effect::None,
            },
            Command::OpenRandom(mode) => {
                if len == 0 {
                    Effect::None
                } else {
                    let index = self.rng.gen_range(0..len);
                    match self.active.entry(index) {
                        Some(entry) => Effect::Open(OpenRequest {
                            url: entry.url.clone(),
                            mode,
                        }),
                        None => Effect::None,
                    }
                }
            }
        };

        tracing::trace!(intent = intent.as_str(), ?effect, "intent dispatched");
        DispatchOutcome {
            effect,
            suppress_default: intent.suppresses_default(),
        }
    }

    /// Dispatches and forwards any resulting open request to `sink`.
    pub fn dispatch_to(
        &mut self,
        intent: Intent,
        sink: &mut dyn NavigationSink,
    ) -> Result<DispatchOutcome, LaunchError> {
        let outcome = self.dispatch(intent);
        if let Some(request) = outcome.open_request() {
            sink.open(request)?;
        }
        Ok(outcome)
    }

    pub fn render(&self) -> RenderInstruction {
        presenter::render(&self.active, self.cursor.index())
    }
}
