use std::io::{BufRead, Write};
use std::path::PathBuf;

use thiserror::Error;

use crate::bookmark_source::{self, BrowserKind, SourceError};
use crate::config::{self, ConfigError};
use crate::corpus::CorpusOptions;
use crate::intent::{ChordError, Keymap};
use crate::logging::{self, LoggingError};
use crate::navigation::{NavigationSink, RecordingSink, SystemOpener};
use crate::oracle::SkimOracle;
use crate::presenter::RenderInstruction;
use crate::session::{SearchSession, SessionSettings};
use crate::transport;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("bookmark source error: {0}")]
    Source(#[from] SourceError),
    #[error("keymap error: {0}")]
    Keymap(#[from] ChordError),
    #[error("logging error: {0}")]
    Logging(#[from] LoggingError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl RuntimeError {
    /// Process status for the binary: 3 for bad settings, 4 when no
    /// bookmarks could be read, 1 otherwise.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) | Self::Keymap(_) => 3,
            Self::Source(_) => 4,
            Self::Logging(_) | Self::Io(_) => 1,
        }
    }
}

/// Status for unparseable command lines.
pub const USAGE_EXIT_CODE: u8 = 2;

pub const USAGE: &str = "usage: markfind [--config <path>] [--bookmarks <path>] [--browser chromium|firefox] \
[--query <text> | --stdio] [--no-launch] [--write-default-config]";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeOptions {
    pub config_path: Option<PathBuf>,
    pub bookmarks_path: Option<PathBuf>,
    pub browser: Option<BrowserKind>,
    pub query: Option<String>,
    pub no_launch: bool,
    pub write_default_config: bool,
    pub show_help: bool,
}

pub fn parse_cli_args(args: &[String]) -> Result<RuntimeOptions, String> {
    let mut options = RuntimeOptions::default();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => options.config_path = Some(PathBuf::from(required_value(&mut iter, arg)?)),
            "--bookmarks" => {
                options.bookmarks_path = Some(PathBuf::from(required_value(&mut iter, arg)?))
            }
            "--browser" => {
                let value = required_value(&mut iter, arg)?;
                options.browser = Some(match value.to_ascii_lowercase().as_str() {
                    "chromium" | "chrome" => BrowserKind::Chromium,
                    "firefox" => BrowserKind::Firefox,
                    other => return Err(format!("unsupported browser '{other}'")),
                });
            }
            "--query" => options.query = Some(required_value(&mut iter, arg)?.to_string()),
            "--stdio" => options.query = None,
            "--no-launch" => options.no_launch = true,
            "--write-default-config" => options.write_default_config = true,
            "-h" | "--help" => options.show_help = true,
            other => return Err(format!("unknown argument '{other}'\n{USAGE}")),
        }
    }

    Ok(options)
}

fn required_value<'a>(
    iter: &mut std::slice::Iter<'a, String>,
    flag: &str,
) -> Result<&'a str, String> {
    iter.next()
        .map(String::as_str)
        .ok_or_else(|| format!("{flag} requires a value"))
}

pub fn run_with_options(options: RuntimeOptions) -> Result<(), RuntimeError> {
    if options.show_help {
        println!("{USAGE}");
        return Ok(());
    }

    let mut cfg = config::load(options.config_path.as_deref())?;
    if options.write_default_config || !cfg.config_path.exists() {
        config::save(&cfg)?;
        eprintln!("[markfind] wrote config to {}", cfg.config_path.display());
        if options.write_default_config {
            return Ok(());
        }
    }
    if let Some(path) = options.bookmarks_path {
        cfg.bookmarks_path = Some(path);
    }
    if let Some(browser) = options.browser {
        cfg.browser = browser;
    }

    let log_path = logging::init(&logging::logs_dir(), &cfg.log_level)?;
    tracing::info!(
        config_path = %cfg.config_path.display(),
        log_path = %log_path.display(),
        browser = ?cfg.browser,
        "startup"
    );

    let source = bookmark_source::source_from_config(&cfg)?;
    let keymap = Keymap::with_overrides(&cfg.keymap)?;
    let mut session = SearchSession::from_source(
        source.as_ref(),
        &CorpusOptions::from_config(&cfg),
        Box::new(SkimOracle::default()),
        SessionSettings::from_config(&cfg),
    )?
    .with_keymap(keymap);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    if let Some(query) = options.query {
        session.set_query(&query);
        write_plain_results(&session, &mut out)?;
        eprintln!("[markfind] {}", session.results_info());
        return Ok(());
    }

    let stdin = std::io::stdin();
    let handled = if options.no_launch {
        serve(&mut session, &mut RecordingSink::default(), stdin.lock(), &mut out)?
    } else {
        serve(&mut session, &mut SystemOpener, stdin.lock(), &mut out)?
    };
    tracing::info!(requests = handled, "stdio session closed");
    Ok(())
}

/// JSON-lines loop: one request per input line, one response per output line.
/// Blank lines are skipped; malformed lines get an error response.
pub fn serve<R: BufRead, W: Write>(
    session: &mut SearchSession,
    sink: &mut dyn NavigationSink,
    input: R,
    output: &mut W,
) -> Result<usize, std::io::Error> {
    let mut handled = 0;
    for line in input.lines() {
        let line = line?;
        let payload = line.trim();
        if payload.is_empty() {
            continue;
        }
        let response = transport::handle_json(session, sink, payload);
        writeln!(output, "{response}")?;
        output.flush()?;
        handled += 1;
    }
    Ok(handled)
}

/// Text rendering for one-shot queries: `>` marks the selection, matched
/// characters are wrapped in brackets.
pub fn write_plain_results<W: Write>(
    session: &SearchSession,
    output: &mut W,
) -> Result<(), std::io::Error> {
    match session.render() {
        RenderInstruction::Empty { message } => writeln!(output, "{message}"),
        RenderInstruction::Rows { rows } => {
            for row in rows {
                let marker = if row.is_selected { ">" } else { " " };
                writeln!(output, "{marker} {}\t{}", row.to_markup("[", "]"), row.url)?;
            }
            Ok(())
        }
    }
}
