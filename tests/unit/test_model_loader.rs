use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use twin_migrate::core::error::{AppError, ErrorReporter};
use twin_migrate::core::model::ModelLoader;

#[derive(Default)]
struct RecordingReporter {
    warnings: Mutex<Vec<(String, Option<String>)>>,
}

impl RecordingReporter {
    fn messages(&self) -> Vec<String> {
        self.warnings
            .lock()
            .unwrap()
            .iter()
            .map(|(message, _)| message.clone())
            .collect()
    }
}

impl ErrorReporter for RecordingReporter {
    fn report_error(&self, _error: &AppError) {}

    fn report_warning(&self, message: &str, context: Option<String>) {
        self.warnings
            .lock()
            .unwrap()
            .push((message.to_string(), context));
    }
}

fn load(extensions: &[&str], paths: &[PathBuf]) -> (Vec<String>, Arc<RecordingReporter>) {
    let reporter = Arc::new(RecordingReporter::default());
    let extensions: Vec<String> = extensions.iter().map(|e| e.to_string()).collect();
    let loader = ModelLoader::new(&extensions, reporter.clone());
    (loader.load(paths).model_ids(), reporter)
}

#[test]
fn test_directories_are_walked_recursively_in_name_order() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("nested/deeper")).unwrap();
    fs::write(dir.path().join("b.json"), r#"{"@id":"ns:b;2"}"#).unwrap();
    fs::write(dir.path().join("a.json"), r#"{"@id":"ns:a;2"}"#).unwrap();
    fs::write(
        dir.path().join("nested/deeper/c.json"),
        r#"{"@id":"ns:c;2"}"#,
    )
    .unwrap();
    fs::write(dir.path().join("notes.txt"), "not a model").unwrap();

    let (ids, reporter) = load(&["json"], &[dir.path().to_path_buf()]);
    assert_eq!(ids, vec!["ns:a;2", "ns:b;2", "ns:c;2"]);
    assert!(reporter.messages().is_empty());
}

#[test]
fn test_bad_files_are_skipped_with_a_warning() {
    let dir = TempDir::new().unwrap();
    let good = dir.path().join("good.json");
    let broken = dir.path().join("broken.json");
    let scalar = dir.path().join("scalar.json");
    fs::write(&good, r#"{"@id":"ns:good;2"}"#).unwrap();
    fs::write(&broken, "{ not json").unwrap();
    fs::write(&scalar, "42").unwrap();

    let (ids, reporter) = load(&["json"], &[broken.clone(), good, scalar]);
    assert_eq!(ids, vec!["ns:good;2"]);

    let warnings = reporter.warnings.lock().unwrap();
    assert_eq!(warnings.len(), 2);
    assert!(warnings[0].0.contains("broken.json"));
    assert!(warnings[0]
        .1
        .as_deref()
        .unwrap()
        .starts_with("invalid JSON"));
}

#[test]
fn test_explicit_files_keep_command_line_order() {
    let dir = TempDir::new().unwrap();
    let z = dir.path().join("z.json");
    let a = dir.path().join("a.json");
    fs::write(&z, r#"{"@id":"ns:z;2"}"#).unwrap();
    fs::write(&a, r#"{"@id":"ns:a;2"}"#).unwrap();

    let (ids, _) = load(&["json"], &[z, a]);
    assert_eq!(ids, vec!["ns:z;2", "ns:a;2"]);
}

#[test]
fn test_duplicate_ids_keep_first_occurrence() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("one.json"),
        r#"{"@id":"ns:room;2","displayName":"first"}"#,
    )
    .unwrap();
    fs::write(
        dir.path().join("two.json"),
        r#"{"@id":"ns:room;2","displayName":"second"}"#,
    )
    .unwrap();

    let reporter = Arc::new(RecordingReporter::default());
    let loader = ModelLoader::new(&["json".to_string()], reporter.clone());
    let batch = loader.load(&[dir.path().to_path_buf()]);

    assert_eq!(batch.len(), 1);
    let model = batch.iter().next().unwrap();
    assert_eq!(model.document()["displayName"], "first");
    assert!(model.source().ends_with("one.json"));
    assert_eq!(
        reporter.messages(),
        vec!["duplicate model 'ns:room;2' ignored".to_string()]
    );
}

#[test]
fn test_configured_extensions_are_honoured() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("room.dtdl"), r#"{"@id":"ns:room;2"}"#).unwrap();
    fs::write(dir.path().join("desk.json"), r#"{"@id":"ns:desk;2"}"#).unwrap();

    let (ids, _) = load(&["DTDL"], &[dir.path().to_path_buf()]);
    assert_eq!(ids, vec!["ns:room;2"]);
}

#[test]
fn test_missing_path_warns_and_yields_empty_batch() {
    let dir = TempDir::new().unwrap();
    let (ids, reporter) = load(&["json"], &[dir.path().join("absent")]);
    assert!(ids.is_empty());
    assert_eq!(reporter.messages().len(), 1);
    assert!(reporter.messages()[0].contains("does not exist"));
}

#[test]
fn test_identifiers_are_not_version_checked_at_load_time() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("odd.json"), r#"{"@id":"no-version"}"#).unwrap();
    let (ids, reporter) = load(&["json"], &[dir.path().to_path_buf()]);
    assert_eq!(ids, vec!["no-version"]);
    assert!(reporter.messages().is_empty());
}
