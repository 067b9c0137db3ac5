//! Integration tests for loading records from environment, defaults and files.

use std::fs;

use envi::{Config, Envi, Error};
use serde::{Deserialize, Serialize};
use serial_test::serial;
use tempfile::tempdir;

// ============================================================================
// Test Configuration Types
// ============================================================================

#[derive(Config, Default)]
pub struct Peter {
    #[envi(default = "PAN")]
    pub peter: String,
}

#[derive(Config, Default)]
pub struct Server {
    #[envi(env = "ENVI_IT_HOST", default = "localhost")]
    pub host: String,

    #[envi(env = "ENVI_IT_NAME")]
    pub name: String,
}

#[derive(Config, Default, Serialize, Deserialize)]
#[envi(serde)]
pub struct Database {
    #[serde(rename = "USER")]
    #[envi(default = "admin")]
    pub user: String,

    #[serde(rename = "PORT")]
    #[envi(default = "5432")]
    pub port: i32,

    #[serde(rename = "TLS")]
    #[envi(default = "true")]
    pub tls: bool,
}

#[derive(Config, Default)]
pub struct App {
    #[envi(env = "ENVI_IT_APP_NAME", default = "demo")]
    pub name: String,

    #[envi(env = "ENVI_IT_DB", default = "./missing-db.yaml")]
    pub db: Database,
}

#[derive(Config, Default)]
pub struct Pointers {
    #[envi(default = "boxed")]
    pub boxed: Box<String>,

    #[envi(default = "maybe")]
    pub maybe: Option<String>,

    #[envi(env = "ENVI_IT_PTR_DB", default = "./missing-db.yaml")]
    pub db: Option<Database>,
}

#[derive(Config, Default)]
pub struct BadFormat {
    #[envi(default = "./db.xml", type = "xml")]
    pub db: Database,
}

#[derive(Config, Default)]
pub struct PlainWatch {
    #[envi(env = "ENVI_IT_PLAIN_WATCH", default = "./db.yaml", watch)]
    pub db: Database,
}

#[derive(Config, Default, Serialize, Deserialize)]
#[envi(serde)]
pub struct BrokenDefaults {
    #[envi(default = "not-a-number")]
    pub port: i32,
}

#[derive(Config, Default)]
pub struct HasBrokenDefaults {
    #[envi(env = "ENVI_IT_BROKEN", default = "./broken.yaml")]
    pub inner: BrokenDefaults,
}

fn set_env(key: &str, value: impl AsRef<std::ffi::OsStr>) {
    unsafe { std::env::set_var(key, value) };
}

fn remove_env(key: &str) {
    unsafe { std::env::remove_var(key) };
}

// ============================================================================
// Scalars
// ============================================================================

#[test]
#[serial]
fn test_default_only() {
    let mut peter = Peter::default();
    Envi::new().load(&mut peter).unwrap();
    assert_eq!(peter.peter, "PAN");
}

#[test]
#[serial]
fn test_env_overrides_default() {
    set_env("ENVI_IT_HOST", "example.org");
    set_env("ENVI_IT_NAME", "api");

    let mut server = Server {
        host: "preset".into(),
        name: "preset".into(),
    };
    Envi::new().load(&mut server).unwrap();

    assert_eq!(server.host, "example.org");
    assert_eq!(server.name, "api");

    remove_env("ENVI_IT_HOST");
    remove_env("ENVI_IT_NAME");
}

#[test]
#[serial]
fn test_empty_env_falls_back_to_default() {
    set_env("ENVI_IT_HOST", "");
    remove_env("ENVI_IT_NAME");

    let mut server = Server::default();
    Envi::new().load(&mut server).unwrap();

    assert_eq!(server.host, "localhost");
    assert_eq!(server.name, "");

    remove_env("ENVI_IT_HOST");
}

// ============================================================================
// File-backed records
// ============================================================================

#[test]
#[serial]
fn test_file_keys_override_defaults_and_absent_keys_keep_them() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("db.yaml");
    fs::write(&path, "USER: reader\n").unwrap();
    set_env("ENVI_IT_DB", &path);

    let mut app = App::default();
    Envi::new().load(&mut app).unwrap();

    assert_eq!(app.name, "demo");
    assert_eq!(app.db.user, "reader");
    assert_eq!(app.db.port, 5432);
    assert!(app.db.tls);

    remove_env("ENVI_IT_DB");
}

#[test]
#[serial]
fn test_missing_file_is_read_error() {
    remove_env("ENVI_IT_DB");

    let err = Envi::new().load(&mut App::default()).unwrap_err();
    match err {
        Error::Read { path, source } => {
            assert!(path.is_absolute());
            assert!(path.ends_with("missing-db.yaml"));
            assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
        }
        other => panic!("expected read error, got {other:?}"),
    }
}

#[test]
#[serial]
fn test_pointer_fields_are_allocated() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("db.json");
    fs::write(&path, r#"{"PORT": 6543}"#).unwrap();
    set_env("ENVI_IT_PTR_DB", &path);

    // yaml is a superset of json, so the default format reads it
    let mut pointers = Pointers::default();
    Envi::new().load(&mut pointers).unwrap();

    assert_eq!(*pointers.boxed, "boxed");
    assert_eq!(pointers.maybe.as_deref(), Some("maybe"));
    let db = pointers.db.expect("db should be allocated");
    assert_eq!(db.port, 6543);
    assert_eq!(db.user, "admin");

    remove_env("ENVI_IT_PTR_DB");
}

// ============================================================================
// Structural errors
// ============================================================================

#[test]
fn test_unknown_type_tag() {
    let err = Envi::new().load(&mut BadFormat::default()).unwrap_err();
    assert!(matches!(
        err,
        Error::InvalidTag { ref field, tag: "type", ref value } if field == "db" && value == "xml"
    ));
}

#[test]
fn test_watch_requires_watched_cell() {
    let err = Envi::new().load(&mut PlainWatch::default()).unwrap_err();
    assert!(matches!(
        err,
        Error::NotWatchable { ref field, type_name: "Database" } if field == "db"
    ));
}

#[test]
#[serial]
fn test_bad_default_in_file_record() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.yaml");
    fs::write(&path, "port: 1\n").unwrap();
    set_env("ENVI_IT_BROKEN", &path);

    let err = Envi::new().load(&mut HasBrokenDefaults::default()).unwrap_err();
    assert!(matches!(
        err,
        Error::Parsing { kind: "int32", ref value, .. } if value == "not-a-number"
    ));

    remove_env("ENVI_IT_BROKEN");
}

#[test]
#[serial]
fn test_one_envi_loads_several_records() {
    let mut envi = Envi::new();
    let mut first = Peter::default();
    let mut second = Peter {
        peter: "HOOK".into(),
    };

    envi.load(&mut first).unwrap();
    envi.load(&mut second).unwrap();

    assert_eq!(first.peter, "PAN");
    assert_eq!(second.peter, "PAN");
    assert_eq!(envi.watch_count(), 0);
    assert!(envi.close().is_ok());
}
