use std::fs;

use encoding_rs::{UTF_8, UTF_16LE, WINDOWS_1252};
use pretty_assertions::assert_eq;
use viper_core::{
    EditorConfig, FileError, FileOptions, JsonFileStore, KeyValueStore, LineEnding, TextCore,
    load_file, save_file,
};

#[test]
fn test_load_detects_encoding_and_line_ending() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Notes.TXT");
    fs::write(&path, b"caf\xE9\r\nbar\r\n").unwrap();

    let loaded = load_file(&path, &FileOptions::default()).unwrap();
    assert_eq!(loaded.text, "café\nbar\n");
    assert_eq!(loaded.encoding, WINDOWS_1252);
    assert_eq!(loaded.line_ending, LineEnding::Crlf);
    assert_eq!(loaded.file_name, "Notes.TXT");
    assert_eq!(loaded.extension, "txt");
}

#[test]
fn test_save_then_load_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.txt");
    let options = FileOptions::default();

    save_file(&path, "é\nz", UTF_16LE, LineEnding::Crlf, &options).unwrap();
    assert_eq!(fs::read(&path).unwrap(), b"\xE9\0\r\0\n\0z\0");

    save_file(&path, "é\nz", UTF_8, LineEnding::Lf, &options).unwrap();
    let loaded = load_file(&path, &options).unwrap();
    assert_eq!(loaded.text, "é\nz");
    assert_eq!(loaded.encoding, UTF_8);
}

#[test]
fn test_save_refuses_lossy_encoding() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.txt");
    let err = save_file(&path, "→", WINDOWS_1252, LineEnding::Lf, &FileOptions::default()).unwrap_err();
    assert!(matches!(err, FileError::Unencodable { .. }));
    assert!(!path.exists());
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_file(dir.path().join("absent"), &FileOptions::default()).unwrap_err();
    assert!(matches!(err, FileError::Io { .. }));
    assert!(!err.is_permission_denied());
}

#[test]
fn test_history_survives_through_json_store() {
    let dir = tempfile::tempdir().unwrap();
    let store_path = dir.path().join("state").join("history.json");

    let mut core = TextCore::new("draft");
    core.insert(5, " two").unwrap();
    core.insert(0, "# ").unwrap();

    let mut store = JsonFileStore::open(&store_path).unwrap();
    core.store_persistent_state(&mut store, "/tmp/draft.md");
    store.flush().unwrap();

    let reopened = JsonFileStore::open(&store_path).unwrap();
    assert_eq!(reopened.get_int("/tmp/draft.md.size"), Some(2));

    let mut restored = TextCore::new(&core.text());
    restored.restore_persistent_state(&reopened, "/tmp/draft.md").unwrap();
    assert!(restored.undo());
    assert!(restored.undo());
    assert_eq!(restored.text(), "draft");
}

#[test]
fn test_config_drives_core() {
    let config = EditorConfig::from_toml_str("max_history_size = 1\nsyntax_highlight = false\n").unwrap();
    let mut core = TextCore::with_config("int x", "c", &config);
    assert!(core.spans().is_empty());

    core.insert(0, "a").unwrap();
    core.insert(0, "b").unwrap();
    assert!(core.undo());
    assert!(!core.undo());
}
