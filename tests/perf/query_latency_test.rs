use std::time::Instant;

use crate::corpus::Corpus;
use crate::model::BookmarkEntry;
use crate::oracle::SkimOracle;
use crate::session::{SearchSession, SessionSettings};

fn p95_ms(samples: &mut [f64]) -> f64 {
    samples.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let last = samples.len().saturating_sub(1);
    let idx = ((last as f64) * 0.95).round() as usize;
    samples[idx.min(last)]
}

#[test]
fn keystroke_search_p95_stays_interactive() {
    let mut entries: Vec<BookmarkEntry> = (0..5_000)
        .map(|i| {
            BookmarkEntry::new(
                &i.to_string(),
                &format!("Reading List / Article {i:05}"),
                &format!("https://news.example.com/articles/{i:05}"),
            )
        })
        .collect();
    entries.push(BookmarkEntry::new(
        "gh",
        "Dev / GitHub",
        "https://github.com",
    ));

    let mut session = SearchSession::new(
        Corpus::from_entries(entries),
        Box::new(SkimOracle::default()),
        SessionSettings::default(),
    );

    let keystrokes = ["g", "gi", "git", "gith", "githu", "github"];
    for query in keystrokes {
        session.set_query(query);
    }

    let mut samples = Vec::with_capacity(keystrokes.len() * 5);
    for _ in 0..5 {
        for query in keystrokes {
            let start = Instant::now();
            session.set_query(query);
            samples.push(start.elapsed().as_secs_f64() * 1000.0);
            assert!(session.active_list().len() <= session.settings().display_limit);
        }
    }

    let budget_ms = if cfg!(debug_assertions) { 750.0 } else { 50.0 };
    let p95 = p95_ms(&mut samples);
    assert!(
        p95 <= budget_ms,
        "keystroke p95 too high: {p95:.3}ms (budget {budget_ms}ms)"
    );
    assert_eq!(
        session.active_list().entry(0).map(|e| e.id.as_str()),
        Some("gh")
    );
}
