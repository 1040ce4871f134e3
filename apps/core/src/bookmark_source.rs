use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tempfile::Builder;
use thiserror::Error;
use walkdir::WalkDir;

use crate::config::Config;
use crate::model::BookmarkNode;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrowserKind {
    #[default]
    Chromium,
    Firefox,
}

impl BrowserKind {
    pub fn bookmark_file_name(self) -> &'static str {
        match self {
            Self::Chromium => "Bookmarks",
            Self::Firefox => "places.sqlite",
        }
    }
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid bookmarks file {path}: {message}")]
    Format { path: PathBuf, message: String },
    #[error("places database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("no bookmark store found: {0}")]
    NotFound(String),
}

/// Read-only snapshot provider for the bookmark hierarchy, queried once per session.
pub trait BookmarkSource: Send + Sync {
    fn source_name(&self) -> &'static str;
    fn load_tree(&self) -> Result<Vec<BookmarkNode>, SourceError>;
}

pub struct StaticTreeSource {
    roots: Vec<BookmarkNode>,
}

impl StaticTreeSource {
    pub fn from_roots(roots: Vec<BookmarkNode>) -> Self {
        Self { roots }
    }

    pub fn deterministic_fixture() -> Self {
        Self {
            roots: vec![BookmarkNode::folder(
                "0",
                "",
                vec![
                    BookmarkNode::folder(
                        "1",
                        "Bookmarks Bar",
                        vec![
                            BookmarkNode::bookmark("10", "GitHub", "https://github.com"),
                            BookmarkNode::bookmark("11", "Gmail", "https://mail.google.com"),
                        ],
                    ),
                    BookmarkNode::folder(
                        "2",
                        "Other Bookmarks",
                        vec![BookmarkNode::folder(
                            "20",
                            "Rust",
                            vec![BookmarkNode::bookmark(
                                "21",
                                "The Rust Programming Language",
                                "https://doc.rust-lang.org/book/",
                            )],
                        )],
                    ),
                ],
            )],
        }
    }
}

impl BookmarkSource for StaticTreeSource {
    fn source_name(&self) -> &'static str {
        "static"
    }

    fn load_tree(&self) -> Result<Vec<BookmarkNode>, SourceError> {
        Ok(self.roots.clone())
    }
}

/// The JSON `Bookmarks` file kept in every Chromium profile directory.
pub struct ChromiumBookmarksFile {
    path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct ChromiumFile {
    roots: ChromiumRoots,
}

#[derive(Debug, Deserialize)]
struct ChromiumRoots {
    bookmark_bar: Option<ChromiumNode>,
    other: Option<ChromiumNode>,
    synced: Option<ChromiumNode>,
}

#[derive(Debug, Deserialize)]
struct ChromiumNode {
    #[serde(default)]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    children: Option<Vec<ChromiumNode>>,
}

impl From<ChromiumNode> for BookmarkNode {
    fn from(value: ChromiumNode) -> Self {
        Self {
            id: value.id,
            title: value.name,
            url: value.url,
            children: value
                .children
                .map(|children| children.into_iter().map(BookmarkNode::from).collect()),
        }
    }
}

impl ChromiumBookmarksFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn parse(raw: &str, path: &Path) -> Result<Vec<BookmarkNode>, SourceError> {
        let file: ChromiumFile = serde_json::from_str(raw).map_err(|e| SourceError::Format {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let children: Vec<BookmarkNode> = [file.roots.bookmark_bar, file.roots.other, file.roots.synced]
            .into_iter()
            .flatten()
            .map(BookmarkNode::from)
            .collect();

        Ok(vec![BookmarkNode::folder("0", "", children)])
    }
}

impl BookmarkSource for ChromiumBookmarksFile {
    fn source_name(&self) -> &'static str {
        "chromium"
    }

    fn load_tree(&self) -> Result<Vec<BookmarkNode>, SourceError> {
        let raw = fs::read_to_string(&self.path).map_err(|source| SourceError::Io {
            path: self.path.clone(),
            source,
        })?;
        Self::parse(&raw, &self.path)
    }
}

/// Firefox `places.sqlite`. A running browser keeps the database locked, so
/// it is read from a throwaway copy (main file plus WAL) that is removed on drop.
pub struct FirefoxPlaces {
    path: PathBuf,
    scratch_root: Option<PathBuf>,
}

const FIREFOX_TYPE_BOOKMARK: i64 = 1;
const FIREFOX_TYPE_FOLDER: i64 = 2;
const FIREFOX_ROOT_ID: i64 = 1;
const FIREFOX_TAGS_GUID: &str = "tags________";

struct PlacesRow {
    id: i64,
    kind: i64,
    guid: String,
    title: String,
    url: Option<String>,
}

impl FirefoxPlaces {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            scratch_root: None,
        }
    }

    /// Puts the snapshot directory under `root` instead of the system temp dir.
    pub fn with_scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.scratch_root = Some(root.into());
        self
    }

    pub fn read_tree(db: &Connection) -> Result<Vec<BookmarkNode>, SourceError> {
        let mut stmt = db.prepare(
            "SELECT b.id, b.parent, b.type, COALESCE(b.guid, ''), COALESCE(b.title, ''), p.url
             FROM moz_bookmarks b
             LEFT JOIN moz_places p ON b.fk = p.id
             ORDER BY b.parent, b.position",
        )?;

        let mut children_of: HashMap<i64, Vec<PlacesRow>> = HashMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(1)?,
                PlacesRow {
                    id: row.get(0)?,
                    kind: row.get(2)?,
                    guid: row.get(3)?,
                    title: row.get(4)?,
                    url: row.get(5)?,
                },
            ))
        })?;
        for row in rows {
            let (parent, place) = row?;
            if parent != place.id {
                children_of.entry(parent).or_default().push(place);
            }
        }

        let children = build_places_children(FIREFOX_ROOT_ID, &mut children_of);
        Ok(vec![BookmarkNode::folder(
            &FIREFOX_ROOT_ID.to_string(),
            "",
            children,
        )])
    }
}

fn build_places_children(
    parent: i64,
    children_of: &mut HashMap<i64, Vec<PlacesRow>>,
) -> Vec<BookmarkNode> {
    let Some(rows) = children_of.remove(&parent) else {
        return Vec::new();
    };

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        match row.kind {
            FIREFOX_TYPE_BOOKMARK => {
                if let Some(url) = row.url {
                    out.push(BookmarkNode::bookmark(&row.id.to_string(), &row.title, &url));
                }
            }
            FIREFOX_TYPE_FOLDER if row.guid != FIREFOX_TAGS_GUID => {
                let nested = build_places_children(row.id, children_of);
                let title = firefox_root_title(parent, &row.title);
                out.push(BookmarkNode::folder(&row.id.to_string(), &title, nested));
            }
            _ => {}
        }
    }
    out
}

fn firefox_root_title(parent: i64, title: &str) -> String {
    if parent != FIREFOX_ROOT_ID {
        return title.to_string();
    }
    match title {
        "toolbar" => "Bookmarks Toolbar".to_string(),
        "menu" => "Bookmarks Menu".to_string(),
        "unfiled" => "Other Bookmarks".to_string(),
        "mobile" => "Mobile Bookmarks".to_string(),
        other => other.to_string(),
    }
}

impl BookmarkSource for FirefoxPlaces {
    fn source_name(&self) -> &'static str {
        "firefox"
    }

    fn load_tree(&self) -> Result<Vec<BookmarkNode>, SourceError> {
        let scratch = match &self.scratch_root {
            Some(root) => Builder::new().prefix("markfind-places-").tempdir_in(root),
            None => Builder::new().prefix("markfind-places-").tempdir(),
        }
        .map_err(|source| SourceError::Io {
            path: self.scratch_root.clone().unwrap_or_else(std::env::temp_dir),
            source,
        })?;

        let snapshot = scratch.path().join("places.sqlite");
        copy_into(&self.path, &snapshot)?;
        // Recent writes live in the WAL until Firefox checkpoints.
        let wal = wal_path(&self.path);
        if wal.exists() {
            copy_into(&wal, &wal_path(&snapshot))?;
        }

        let tree = Connection::open(&snapshot)
            .map_err(SourceError::from)
            .and_then(|db| Self::read_tree(&db))?;
        tracing::debug!(path = %self.path.display(), "places snapshot read");
        Ok(tree)
    }
}

fn wal_path(db: &Path) -> PathBuf {
    let mut name = db.as_os_str().to_owned();
    name.push("-wal");
    PathBuf::from(name)
}

fn copy_into(from: &Path, to: &Path) -> Result<(), SourceError> {
    fs::copy(from, to).map(|_| ()).map_err(|source| SourceError::Io {
        path: from.to_path_buf(),
        source,
    })
}

/// Profile directories a browser keeps its bookmark store under on this platform.
pub fn default_profile_roots(browser: BrowserKind) -> Vec<PathBuf> {
    let home = std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from);

    let mut roots = Vec::new();
    if cfg!(target_os = "windows") {
        let local = std::env::var_os("LOCALAPPDATA").map(PathBuf::from);
        let roaming = std::env::var_os("APPDATA").map(PathBuf::from);
        match browser {
            BrowserKind::Chromium => {
                if let Some(local) = local {
                    for vendor in ["Google\\Chrome", "Chromium", "BraveSoftware\\Brave-Browser", "Microsoft\\Edge"] {
                        roots.push(local.join(vendor).join("User Data"));
                    }
                }
            }
            BrowserKind::Firefox => {
                if let Some(roaming) = roaming {
                    roots.push(roaming.join("Mozilla\\Firefox\\Profiles"));
                }
            }
        }
        return roots;
    }

    let Some(home) = home else {
        return roots;
    };

    if cfg!(target_os = "macos") {
        let support = home.join("Library/Application Support");
        match browser {
            BrowserKind::Chromium => {
                for vendor in ["Google/Chrome", "Chromium", "BraveSoftware/Brave-Browser", "Microsoft Edge"] {
                    roots.push(support.join(vendor));
                }
            }
            BrowserKind::Firefox => roots.push(support.join("Firefox/Profiles")),
        }
        return roots;
    }

    match browser {
        BrowserKind::Chromium => {
            for vendor in [
                "google-chrome",
                "chromium",
                "BraveSoftware/Brave-Browser",
                "microsoft-edge",
                "vivaldi",
            ] {
                roots.push(home.join(".config").join(vendor));
            }
        }
        BrowserKind::Firefox => roots.push(home.join(".mozilla/firefox")),
    }
    roots
}

/// Finds bookmark stores below `roots`, sorted so `Default` profiles come first.
pub fn discover_bookmark_files(roots: &[PathBuf], browser: BrowserKind) -> Vec<PathBuf> {
    let file_name = browser.bookmark_file_name();
    let mut found: Vec<PathBuf> = roots
        .iter()
        .filter(|root| root.is_dir())
        .flat_map(|root| {
            WalkDir::new(root)
                .max_depth(3)
                .follow_links(false)
                .into_iter()
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.file_type().is_file() && entry.file_name() == file_name)
                .map(|entry| entry.into_path())
        })
        .collect();

    found.sort_by_key(|path| {
        let is_default = path
            .parent()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
            .map(|n| n == "Default" || n.contains(".default"))
            .unwrap_or(false);
        (!is_default, path.clone())
    });
    found
}

pub fn source_for_path(path: &Path, browser: BrowserKind) -> Box<dyn BookmarkSource> {
    let looks_like_places = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("sqlite"))
        .unwrap_or(false);

    if browser == BrowserKind::Firefox || looks_like_places {
        Box::new(FirefoxPlaces::new(path))
    } else {
        Box::new(ChromiumBookmarksFile::new(path))
    }
}

/// Picks the configured bookmark store, or the first one discovered for the configured browser.
pub fn source_from_config(cfg: &Config) -> Result<Box<dyn BookmarkSource>, SourceError> {
    if let Some(path) = cfg.bookmarks_path.as_deref() {
        return Ok(source_for_path(path, cfg.browser));
    }

    let roots = default_profile_roots(cfg.browser);
    let found = discover_bookmark_files(&roots, cfg.browser);
    match found.into_iter().next() {
        Some(path) => {
            tracing::info!(path = %path.display(), browser = ?cfg.browser, "discovered bookmark store");
            Ok(source_for_path(&path, cfg.browser))
        }
        None => Err(SourceError::NotFound(format!(
            "no {} file under {} searched location(s); set bookmarks_path in the config",
            cfg.browser.bookmark_file_name(),
            roots.len()
        ))),
    }
}
