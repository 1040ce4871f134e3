use std::sync::Arc;
use std::time::Duration;

use markfind_core::bookmark_source::{BookmarkSource, SourceError, StaticTreeSource};
use markfind_core::corpus::{Corpus, CorpusOptions};
use markfind_core::intent::{Effect, Intent, Key, KeyChord, Keymap};
use markfind_core::model::{BookmarkEntry, BookmarkNode, HighlightSpan};
use markfind_core::navigation::{OpenMode, RecordingSink};
use markfind_core::oracle::{MatchOptions, MatchOracle, OracleError, OracleMatch, SkimOracle};
use markfind_core::presenter::{RenderInstruction, EMPTY_MESSAGE};
use markfind_core::session::{SearchSession, SessionSettings};

fn scenario_corpus() -> Corpus {
    Corpus::from_entries(vec![
        BookmarkEntry::new("1", "GitHub", "https://github.com"),
        BookmarkEntry::new("2", "Gmail", "https://mail.google.com"),
    ])
}

fn session_with(corpus: Corpus) -> SearchSession {
    SearchSession::new(corpus, Box::new(SkimOracle::default()), SessionSettings::default())
        .with_rng_seed(42)
}

fn numbered_corpus(count: usize) -> Corpus {
    Corpus::from_entries(
        (0..count)
            .map(|i| {
                BookmarkEntry::new(
                    &i.to_string(),
                    &format!("Bookmark {i}"),
                    &format!("https://site{i}.example"),
                )
            })
            .collect(),
    )
}

/// Fails for one specific query and delegates everything else.
struct FlakyOracle {
    failing_query: &'static str,
    inner: SkimOracle,
}

impl MatchOracle for FlakyOracle {
    fn matcher_name(&self) -> &'static str {
        "flaky"
    }

    fn rank(
        &self,
        query: &str,
        corpus: &[Arc<BookmarkEntry>],
        options: &MatchOptions,
    ) -> Result<Vec<OracleMatch>, OracleError> {
        if query == self.failing_query {
            return Err(OracleError::failed("flaky", "internal failure"));
        }
        self.inner.rank(query, corpus, options)
    }
}

#[test]
fn scenario_a_empty_query_shows_corpus_in_order() {
    let mut session = session_with(scenario_corpus());
    let render = session.set_query("");

    let titles: Vec<String> = render.rows().iter().map(|r| r.plain_text()).collect();
    assert_eq!(titles, vec!["GitHub", "Gmail"]);
    assert_eq!(session.cursor(), 0);
    assert!(session.active_list().match_at(0).is_none());
}

#[test]
fn scenario_b_query_highlights_matched_prefix() {
    let mut session = session_with(scenario_corpus());
    session.dispatch(Intent::MoveNext);
    session.set_query("git");

    assert_eq!(session.cursor(), 0);
    let hit = session.active_list().match_at(0).expect("GitHub should match");
    assert_eq!(hit.entry.title, "GitHub");
    assert_eq!(hit.highlight_spans, vec![HighlightSpan::new(0, 3)]);

    let render = session.render();
    assert_eq!(render.rows()[0].to_markup("<b>", "</b>"), "<b>Git</b>Hub");
}

#[test]
fn scenario_c_move_next_clamps_at_end() {
    let mut session = session_with(numbered_corpus(3));
    session.dispatch(Intent::MoveNext);
    session.dispatch(Intent::MoveNext);
    assert_eq!(session.cursor(), 2);

    let outcome = session.dispatch(Intent::MoveNext);
    assert_eq!(outcome.effect, Effect::None);
    assert_eq!(session.cursor(), 2);
}

#[test]
fn scenario_d_page_next_jumps_then_clamps() {
    let mut session = session_with(numbered_corpus(10));
    session.dispatch(Intent::PageNext);
    assert_eq!(session.cursor(), 5);
    session.dispatch(Intent::PageNext);
    assert_eq!(session.cursor(), 9);
    session.dispatch(Intent::PagePrev);
    assert_eq!(session.cursor(), 4);
}

#[test]
fn scenario_e_open_on_empty_list_emits_nothing() {
    let mut session = session_with(Corpus::default());
    let mut sink = RecordingSink::default();

    let outcome = session.dispatch_to(Intent::OpenCurrent, &mut sink).unwrap();
    assert_eq!(outcome.effect, Effect::None);
    let outcome = session.dispatch_to(Intent::OpenRandom, &mut sink).unwrap();
    assert_eq!(outcome.effect, Effect::None);
    assert!(sink.requests().is_empty());
    assert_eq!(
        session.render(),
        RenderInstruction::Empty {
            message: EMPTY_MESSAGE.to_string()
        }
    );
}

#[test]
fn scenario_f_oracle_failure_degrades_for_one_query() {
    let oracle = FlakyOracle {
        failing_query: "x",
        inner: SkimOracle::default(),
    };
    let mut session = SearchSession::new(
        scenario_corpus(),
        Box::new(oracle),
        SessionSettings::default(),
    );

    let render = session.set_query("x");
    assert!(session.active_list().is_empty());
    assert!(session.last_error().is_some());
    assert_eq!(
        render,
        RenderInstruction::Empty {
            message: EMPTY_MESSAGE.to_string()
        }
    );

    session.set_query("gm");
    assert!(session.last_error().is_none());
    assert_eq!(session.active_list().entry(0).unwrap().title, "Gmail");
}

#[test]
fn replacing_the_list_always_resets_cursor() {
    let mut session = session_with(numbered_corpus(20));
    for query in ["bookmark", "", "1", "bookmark 1", ""] {
        session.dispatch(Intent::PageNext);
        session.dispatch(Intent::MoveNext);
        session.set_query(query);
        assert_eq!(session.cursor(), 0, "query {query:?}");
    }
}

#[test]
fn non_empty_queries_respect_display_limit() {
    let settings = SessionSettings {
        display_limit: 50,
        ..SessionSettings::default()
    };
    let mut session =
        SearchSession::new(numbered_corpus(400), Box::new(SkimOracle::default()), settings);
    for query in ["b", "bookmark", "1", "k 3"] {
        session.set_query(query);
        assert!(session.active_list().len() <= 50, "query {query:?}");
    }
}

#[test]
fn cursor_never_leaves_range_under_mixed_navigation() {
    let mut session = session_with(numbered_corpus(7));
    let script = [
        Intent::MovePrev,
        Intent::PageNext,
        Intent::PageNext,
        Intent::MoveNext,
        Intent::MoveNext,
        Intent::PagePrev,
        Intent::MovePrev,
        Intent::PagePrev,
        Intent::PagePrev,
    ];
    for _ in 0..10 {
        for intent in script {
            session.dispatch(intent);
            assert!(session.cursor() < 7);
        }
    }
}

#[test]
fn open_current_targets_selected_row_with_configured_mode() {
    let mut session = session_with(numbered_corpus(3));
    session.dispatch(Intent::MoveNext);

    let outcome = session.dispatch(Intent::OpenCurrent);
    let request = outcome.open_request().expect("should open");
    assert_eq!(request.url, "https://site1.example");
    assert_eq!(request.mode, OpenMode::ReplaceCurrent);

    let outcome = session.dispatch(Intent::OpenCurrentNewContext);
    assert_eq!(outcome.open_request().unwrap().mode, OpenMode::NewContext);
}

#[test]
fn open_random_is_reproducible_with_seed() {
    let mut first = session_with(numbered_corpus(50));
    let mut second = session_with(numbered_corpus(50));
    for _ in 0..5 {
        assert_eq!(
            first.dispatch(Intent::OpenRandom),
            second.dispatch(Intent::OpenRandom)
        );
    }
}

#[test]
fn move_and_page_chords_suppress_default_even_when_clamped() {
    let keymap = Keymap::default();
    let movers = [
        Intent::MoveNext,
        Intent::MovePrev,
        Intent::PageNext,
        Intent::PagePrev,
    ];
    assert!(keymap
        .chords_for(Intent::PageNext)
        .contains(&KeyChord::ctrl(Key::Char('d'))));
    assert!(keymap
        .chords_for(Intent::PagePrev)
        .contains(&KeyChord::ctrl(Key::Char('u'))));

    for intent in movers {
        let chords = keymap.chords_for(intent);
        assert!(!chords.is_empty(), "{} has no default chord", intent.as_str());
        for chord in chords {
            let mut session = session_with(numbered_corpus(12));
            let at_top = session.handle_key(&chord);
            assert!(at_top.suppress_default, "{chord} at top");

            for _ in 0..20 {
                session.dispatch(Intent::MoveNext);
            }
            assert_eq!(session.cursor(), 11);
            let at_bottom = session.handle_key(&chord);
            assert!(at_bottom.suppress_default, "{chord} at bottom");

            session.set_query("zzzzqqq");
            assert!(session.active_list().is_empty());
            let on_empty = session.handle_key(&chord);
            assert_eq!(on_empty.effect, Effect::None);
            assert!(on_empty.suppress_default, "{chord} on empty list");
        }
    }
}

#[test]
fn keys_resolve_through_default_keymap() {
    let mut session = session_with(numbered_corpus(3));

    let outcome = session.handle_key(&KeyChord::ctrl(Key::Char('j')));
    assert!(outcome.suppress_default);
    assert_eq!(session.cursor(), 1);

    let outcome = session.handle_key(&KeyChord::plain(Key::Char('j')));
    assert_eq!(outcome.effect, Effect::None);
    assert!(!outcome.suppress_default);
    assert_eq!(session.cursor(), 1);

    let outcome = session.handle_key(&KeyChord::plain(Key::Enter));
    assert_eq!(outcome.open_request().unwrap().url, "https://site1.example");
}

#[test]
fn render_is_idempotent_and_marks_one_row() {
    let mut session = session_with(numbered_corpus(6));
    session.set_query("bookmark");
    session.dispatch(Intent::MoveNext);

    let first = session.render();
    let second = session.render();
    assert_eq!(first, second);
    assert_eq!(first.rows().iter().filter(|r| r.is_selected).count(), 1);
    assert!(first.rows()[1].is_selected);
}

/// Takes a fixed time to hand over the fixture tree.
struct SlowSource {
    delay: Duration,
    inner: StaticTreeSource,
}

impl BookmarkSource for SlowSource {
    fn source_name(&self) -> &'static str {
        "slow"
    }

    fn load_tree(&self) -> Result<Vec<BookmarkNode>, SourceError> {
        std::thread::sleep(self.delay);
        self.inner.load_tree()
    }
}

#[test]
fn startup_info_times_the_tree_load() {
    let source = SlowSource {
        delay: Duration::from_millis(30),
        inner: StaticTreeSource::deterministic_fixture(),
    };
    let session = SearchSession::from_source(
        &source,
        &CorpusOptions::default(),
        Box::new(SkimOracle::default()),
        SessionSettings::default(),
    )
    .unwrap();

    let info = session.results_info();
    assert_eq!(info.count, 3);
    assert!(info.elapsed >= Duration::from_millis(30), "{info}");

    let direct = session_with(scenario_corpus());
    assert_eq!(direct.results_info().elapsed, Duration::ZERO);
}
