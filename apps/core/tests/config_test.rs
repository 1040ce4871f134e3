use markfind_core::config::{self, Config};
use markfind_core::navigation::OpenMode;

#[test]
fn accepts_default_config() {
    let cfg = Config::default();
    assert_eq!(cfg.display_limit, 100);
    assert_eq!(cfg.page_size, 5);
    assert_eq!(cfg.path_separator, " / ");
    assert_eq!(cfg.open_mode, OpenMode::ReplaceCurrent);
    assert!(cfg.config_path.to_string_lossy().contains("markfind"));
    assert!(config::validate(&cfg).is_ok());
}

#[test]
fn rejects_out_of_range_limits() {
    let cfg = Config {
        display_limit: 0,
        ..Default::default()
    };
    assert!(config::validate(&cfg).is_err());

    let cfg = Config {
        page_size: 500,
        ..Default::default()
    };
    assert!(config::validate(&cfg).is_err());
}

#[test]
fn missing_file_loads_defaults_at_requested_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");

    let cfg = config::load(Some(&path)).unwrap();
    assert_eq!(cfg.config_path, path);
    assert_eq!(cfg.display_limit, 100);
    assert!(!path.exists());
}

#[test]
fn saved_json_config_loads_back() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = Config {
        config_path: dir.path().join("nested").join("config.json"),
        display_limit: 50,
        path_separator: "/".to_string(),
        ..Default::default()
    };
    cfg.keymap
        .insert("open-random".to_string(), vec!["Ctrl+Shift+R".to_string()]);
    config::save(&cfg).unwrap();

    let loaded = config::load(Some(&cfg.config_path)).unwrap();
    assert_eq!(loaded, cfg);
}

#[test]
fn saved_toml_config_loads_back() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = Config {
        config_path: dir.path().join("markfind.toml"),
        open_mode: OpenMode::NewContext,
        bookmarks_path: Some(dir.path().join("Bookmarks")),
        ..Default::default()
    };
    config::save(&cfg).unwrap();

    let loaded = config::load(Some(&cfg.config_path)).unwrap();
    assert_eq!(loaded, cfg);
}

#[test]
fn invalid_chord_in_file_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{ keymap: { "move-next": ["Hyper+J"] } }"#).unwrap();

    let error = config::load(Some(&path)).expect_err("bad chord should fail");
    assert!(error.to_string().contains("move-next"));
}
