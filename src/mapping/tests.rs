// Mapping document and generator tests

use super::generate::{generate, GenerateOptions};
use super::source::Source;
use super::*;
use crate::error::MapperError;
use crate::report::testing::RecordingReporter;
use std::io::Write as IoWrite;
use std::path::Path;
use tempfile::TempDir;

/// Create empty files under `dir`
fn touch_files(dir: &Path, names: &[&str]) {
    std::fs::create_dir_all(dir).unwrap();
    for name in names {
        std::fs::File::create(dir.join(name)).unwrap();
    }
}

fn path_str(dir: &Path, name: &str) -> String {
    dir.join(name).to_string_lossy().to_string()
}

fn write_zip(zip_path: &Path, entries: &[(&str, &str)]) {
    let file = std::fs::File::create(zip_path).unwrap();
    let mut writer = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default();
    for (name, content) in entries {
        writer.start_file(*name, options).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap();
}

fn parse_options() -> GenerateOptions {
    GenerateOptions {
        parse_filenames: true,
        ..GenerateOptions::default()
    }
}

// ----- Document model -----

#[test]
fn test_load_missing_file_is_empty() {
    let tmp = TempDir::new().unwrap();
    let doc = MappingDocument::load(&tmp.path().join("nope.yaml")).unwrap();
    assert!(doc.is_empty());
}

#[test]
fn test_decode_both_entry_shapes() {
    let yaml = r#"
/media/a.mp4:
  url: https://site/a
  date: '2020-01-01'
  title: A
  performers:
  - name: Jane
    url: ''
  details: long text
/media/b.mp4:
- name: ''
  url: https://site/p/bob
"#;
    let doc = MappingDocument::from_yaml(yaml).unwrap();

    let a = doc.get("/media/a.mp4").unwrap();
    let record = a.scene().unwrap();
    assert_eq!(record.title, "A");
    assert_eq!(record.details.as_deref(), Some("long text"));
    assert_eq!(record.studio, None);
    assert_eq!(record.performers[0].name, "Jane");

    let b = doc.get("/media/b.mp4").unwrap();
    assert!(b.is_performer_only());
    assert_eq!(b.performers()[0].url, "https://site/p/bob");
}

#[test]
fn test_missing_and_null_fields_default_to_empty() {
    let yaml = r#"
/media/a.mp4:
  title:
  performers:
  - name: Jane
/media/b.mp4:
  title: only a title
"#;
    let mut doc = MappingDocument::from_yaml(yaml).unwrap();
    doc.ensure_placeholders();

    let a = doc.get("/media/a.mp4").unwrap().scene().unwrap();
    assert_eq!(a.title, "");
    assert_eq!(a.url, "");
    assert_eq!(a.performers[0].url, "");

    let b = doc.get("/media/b.mp4").unwrap();
    assert_eq!(b.performers().len(), 1);
    assert!(b.performers()[0].is_placeholder());
}

#[test]
fn test_non_string_scalars_load_as_text() {
    let yaml = r#"
/media/a.mp4:
  url: ''
  date: ''
  title: 1984
  details: true
  studio: 42
  tags: [live, 2020, ~]
  performers:
  - name: 311
    url: ''
/media/b.mp4:
- name: 1.5
"#;
    let doc = MappingDocument::from_yaml(yaml).unwrap();

    let a = doc.get("/media/a.mp4").unwrap().scene().unwrap();
    assert_eq!(a.title, "1984");
    assert_eq!(a.details.as_deref(), Some("true"));
    assert_eq!(a.studio.as_deref(), Some("42"));
    assert_eq!(a.tags, Some(vec!["live".to_string(), "2020".to_string()]));
    assert_eq!(a.performers[0].name, "311");

    let b = doc.get("/media/b.mp4").unwrap();
    assert_eq!(b.performers()[0].name, "1.5");
}

#[test]
fn test_bad_entry_error_names_its_path() {
    let yaml = r#"
/media/good.mp4:
  title: fine
/media/bad.mp4:
  title:
    nested: mapping
"#;
    match MappingDocument::from_yaml(yaml) {
        Err(MapperError::MappingEntry { path, .. }) => assert_eq!(path, "/media/bad.mp4"),
        other => panic!("expected an entry error, got {:?}", other),
    }
}

#[test]
fn test_save_preserves_order_and_unknown_keys() {
    let yaml = r#"
/z/last.mp4:
  url: ''
  date: ''
  title: Z
  performers:
  - name: Zed
    url: ''
    disambiguation: the second
  rating: 5
/a/first.mp4:
- name: Ann
  url: ''
"#;
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("mapping.yaml");

    let doc = MappingDocument::from_yaml(yaml).unwrap();
    doc.save(&out).unwrap();
    let reloaded = MappingDocument::load(&out).unwrap();

    assert_eq!(reloaded, doc);
    let keys: Vec<&String> = reloaded.paths().collect();
    assert_eq!(keys, vec!["/z/last.mp4", "/a/first.mp4"]);

    let z = reloaded.get("/z/last.mp4").unwrap().scene().unwrap();
    assert_eq!(z.extra.get("rating"), Some(&serde_yaml::Value::from(5u64)));
    assert_eq!(z.performers[0].disambiguation, "the second");

    // No temp files left behind
    let leftovers: Vec<_> = std::fs::read_dir(tmp.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().starts_with(crate::constants::TEMP_FILE_PREFIX))
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn test_empty_disambiguation_not_written() {
    let mut doc = MappingDocument::new();
    doc.insert_new("/m/a.mp4", MappingEntry::PerformerOnly(vec![PerformerEntry::named("Ann")]));
    let text = doc.to_yaml().unwrap();
    assert!(!text.contains("disambiguation"));
}

// ----- Generation -----

#[test]
fn test_generate_directory_full_mode() {
    let tmp = TempDir::new().unwrap();
    let media = tmp.path().join("media");
    touch_files(&media, &[
        "StudioX - Jane Doe, John Roe - My Title - 2021-05-01.mp4",
        "random_clip.mkv",
        "cover.jpg",
        "info.json",
    ]);
    std::fs::create_dir_all(media.join("subdir")).unwrap();

    let out = tmp.path().join("mapping.yaml");
    let reporter = RecordingReporter::default();
    let summary = generate(&Source::Directory(media.clone()), &out, &parse_options(), &reporter).unwrap();

    assert_eq!(summary.added, 2);
    assert_eq!(summary.skipped, 2);

    let doc = MappingDocument::load(&out).unwrap();
    assert_eq!(doc.len(), 2);

    let parsed = doc
        .get(&path_str(&media, "StudioX - Jane Doe, John Roe - My Title - 2021-05-01.mp4"))
        .unwrap()
        .scene()
        .unwrap();
    assert_eq!(parsed.title, "My Title");
    assert_eq!(parsed.date, "2021-05-01");
    assert_eq!(parsed.url, "");
    let names: Vec<&str> = parsed.performers.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Jane Doe", "John Roe"]);
    assert!(parsed.performers.iter().all(|p| p.url.is_empty()));

    let unparsed = doc.get(&path_str(&media, "random_clip.mkv")).unwrap().scene().unwrap();
    assert_eq!(unparsed.title, "");
    assert_eq!(unparsed.performers.len(), 1);
    assert!(unparsed.performers[0].is_placeholder());
}

#[test]
fn test_generate_performer_only_mode() {
    let tmp = TempDir::new().unwrap();
    let media = tmp.path().join("media");
    touch_files(&media, &["Studio - Ann, Bea - Title.mp4", "plain.mp4"]);

    let out = tmp.path().join("mapping.yaml");
    let options = GenerateOptions {
        performer_only: true,
        parse_filenames: true,
        ..GenerateOptions::default()
    };
    generate(&Source::Directory(media.clone()), &out, &options, &RecordingReporter::default()).unwrap();

    let doc = MappingDocument::load(&out).unwrap();
    let parsed = doc.get(&path_str(&media, "Studio - Ann, Bea - Title.mp4")).unwrap();
    assert!(parsed.is_performer_only());
    assert_eq!(parsed.performers().len(), 2);

    let plain = doc.get(&path_str(&media, "plain.mp4")).unwrap();
    assert!(plain.is_performer_only());
    assert!(plain.performers()[0].is_placeholder());
}

#[test]
fn test_generate_without_parsing_seeds_placeholder() {
    let tmp = TempDir::new().unwrap();
    let media = tmp.path().join("media");
    touch_files(&media, &["Studio - Ann - Title - 2020-01-01.mp4"]);

    let out = tmp.path().join("mapping.yaml");
    generate(&Source::Directory(media.clone()), &out, &GenerateOptions::default(), &RecordingReporter::default()).unwrap();

    let doc = MappingDocument::load(&out).unwrap();
    let record = doc.get(&path_str(&media, "Studio - Ann - Title - 2020-01-01.mp4")).unwrap().scene().unwrap();
    assert_eq!(record.title, "");
    assert_eq!(record.performers, vec![PerformerEntry::placeholder()]);
}

#[test]
fn test_generate_twice_is_byte_identical() {
    let tmp = TempDir::new().unwrap();
    let media = tmp.path().join("media");
    touch_files(&media, &["A - Ann - One - 2020-01-01.mp4", "B - Bea, Cid - Two.mp4", "x.avi"]);

    let out = tmp.path().join("mapping.yaml");
    let source = Source::Directory(media);
    generate(&source, &out, &parse_options(), &RecordingReporter::default()).unwrap();
    let first = std::fs::read(&out).unwrap();

    let summary = generate(&source, &out, &parse_options(), &RecordingReporter::default()).unwrap();
    let second = std::fs::read(&out).unwrap();

    assert_eq!(summary.added, 0);
    assert_eq!(summary.existing, 3);
    assert_eq!(first, second);
}

#[test]
fn test_regenerate_preserves_edits_and_appends_new() {
    let tmp = TempDir::new().unwrap();
    let media = tmp.path().join("media");
    touch_files(&media, &["A - Ann - One - 2020-01-01.mp4"]);

    let out = tmp.path().join("mapping.yaml");
    let source = Source::Directory(media.clone());
    generate(&source, &out, &parse_options(), &RecordingReporter::default()).unwrap();

    // Operator edits the title and adds a url
    let edited_path = path_str(&media, "A - Ann - One - 2020-01-01.mp4");
    let mut doc = MappingDocument::load(&out).unwrap();
    if let Some(MappingEntry::Scene(record)) = doc.get_mut(&edited_path) {
        record.title = "Hand Edited".to_string();
        record.performers[0].url = "https://site/ann".to_string();
    }
    doc.save(&out).unwrap();

    // A removed file's entry stays too
    let ghost = "/gone/forever.mp4".to_string();
    let mut doc = MappingDocument::load(&out).unwrap();
    doc.insert_new(ghost.clone(), MappingEntry::PerformerOnly(vec![PerformerEntry::named("Ghost")]));
    doc.save(&out).unwrap();

    touch_files(&media, &["B - Bea - Two.mp4"]);
    generate(&source, &out, &parse_options(), &RecordingReporter::default()).unwrap();

    let doc = MappingDocument::load(&out).unwrap();
    let record = doc.get(&edited_path).unwrap().scene().unwrap();
    assert_eq!(record.title, "Hand Edited");
    assert_eq!(record.performers[0].url, "https://site/ann");
    assert!(doc.contains(&ghost));

    let keys: Vec<&String> = doc.paths().collect();
    assert_eq!(keys.last().unwrap().as_str(), path_str(&media, "B - Bea - Two.mp4"));
}

#[test]
fn test_fill_blanks_only_fills_empty_fields() {
    let tmp = TempDir::new().unwrap();
    let media = tmp.path().join("media");
    touch_files(&media, &["A - Ann - One - 2020-01-01.mp4"]);
    let path = path_str(&media, "A - Ann - One - 2020-01-01.mp4");

    let out = tmp.path().join("mapping.yaml");
    let mut doc = MappingDocument::new();
    let mut record = SceneRecord::with_performers(vec![PerformerEntry::placeholder()]);
    record.title = "Kept".to_string();
    doc.insert_new(path.clone(), MappingEntry::Scene(record));
    doc.save(&out).unwrap();

    let options = GenerateOptions {
        parse_filenames: true,
        fill_blanks: true,
        ..GenerateOptions::default()
    };
    let summary = generate(&Source::Directory(media), &out, &options, &RecordingReporter::default()).unwrap();
    assert_eq!(summary.refreshed, 1);

    let doc = MappingDocument::load(&out).unwrap();
    let record = doc.get(&path).unwrap().scene().unwrap();
    assert_eq!(record.title, "Kept");
    assert_eq!(record.date, "2020-01-01");
    assert_eq!(record.performers, vec![PerformerEntry::named("Ann")]);
}

#[test]
fn test_generate_export_archive_manifest() {
    let tmp = TempDir::new().unwrap();
    let media = tmp.path().join("media");
    touch_files(&media, &["one.mp4", "two.mp4"]);

    let manifest = serde_json::json!({
        "scenes": [
            {"path": path_str(&media, "two.mp4"), "checksum": "b"},
            {"path": path_str(&media, "one.mp4"), "checksum": "a"},
            {"path": path_str(&media, "missing.mp4"), "checksum": "c"},
        ]
    });
    let zip_path = tmp.path().join("export.zip");
    write_zip(&zip_path, &[("mappings.json", &manifest.to_string())]);

    let source = Source::ExportArchive(zip_path);
    let out = source.default_output("mapping.yaml");
    let summary = generate(&source, &out, &GenerateOptions::default(), &RecordingReporter::default()).unwrap();

    assert_eq!(summary.added, 2);
    assert_eq!(summary.skipped, 1);
    let doc = MappingDocument::load(&tmp.path().join("mapping.yaml")).unwrap();
    let keys: Vec<&String> = doc.paths().collect();
    assert_eq!(keys, vec![&path_str(&media, "two.mp4"), &path_str(&media, "one.mp4")]);
}

#[test]
fn test_generate_export_archive_scene_files() {
    let tmp = TempDir::new().unwrap();
    let media = tmp.path().join("media");
    touch_files(&media, &["one.mp4"]);

    let scene = serde_json::json!({"title": "One", "files": [path_str(&media, "one.mp4")]});
    let zip_path = tmp.path().join("export.zip");
    write_zip(&zip_path, &[("scenes/abc.json", &scene.to_string()), ("performers/p.json", "{}")]);

    let paths = Source::ExportArchive(zip_path).enumerate().unwrap();
    assert_eq!(paths, vec![path_str(&media, "one.mp4")]);
}

#[test]
fn test_generate_export_directory() {
    let tmp = TempDir::new().unwrap();
    let media = tmp.path().join("media");
    touch_files(&media, &["one.mp4"]);

    let export = tmp.path().join("export");
    std::fs::create_dir_all(&export).unwrap();
    let manifest = serde_json::json!({"scenes": [{"path": path_str(&media, "one.mp4")}]});
    std::fs::write(export.join("mappings.json"), manifest.to_string()).unwrap();

    let paths = Source::ExportDirectory(export).enumerate().unwrap();
    assert_eq!(paths, vec![path_str(&media, "one.mp4")]);
}

#[test]
fn test_broken_archive_writes_nothing() {
    let tmp = TempDir::new().unwrap();
    let zip_path = tmp.path().join("export.zip");
    std::fs::write(&zip_path, b"definitely not a zip").unwrap();

    let out = tmp.path().join("mapping.yaml");
    let err = generate(&Source::ExportArchive(zip_path), &out, &GenerateOptions::default(), &RecordingReporter::default())
        .unwrap_err();

    assert!(matches!(err, MapperError::SourceUnreadable(_)));
    assert!(!out.exists());
}

#[test]
fn test_manifest_entry_without_path_writes_nothing() {
    let tmp = TempDir::new().unwrap();
    let zip_path = tmp.path().join("export.zip");
    write_zip(&zip_path, &[("mappings.json", r#"{"scenes":[{"checksum":"abc"}]}"#)]);

    let out = tmp.path().join("mapping.yaml");
    let err = generate(&Source::ExportArchive(zip_path), &out, &GenerateOptions::default(), &RecordingReporter::default())
        .unwrap_err();

    assert!(matches!(err, MapperError::SourceUnreadable(_)));
    assert!(!out.exists());
}

#[test]
fn test_invalid_pattern_writes_nothing() {
    let tmp = TempDir::new().unwrap();
    let media = tmp.path().join("media");
    touch_files(&media, &["one.mp4"]);

    let out = tmp.path().join("mapping.yaml");
    let options = GenerateOptions {
        parse_filenames: true,
        filename_pattern: Some("(?P<title>".to_string()),
        ..GenerateOptions::default()
    };
    let err = generate(&Source::Directory(media), &out, &options, &RecordingReporter::default()).unwrap_err();

    assert!(matches!(err, MapperError::InvalidPattern(_)));
    assert!(!out.exists());
}

#[test]
fn test_missing_directory_is_unreadable() {
    let tmp = TempDir::new().unwrap();
    let err = Source::Directory(tmp.path().join("absent")).enumerate().unwrap_err();
    assert!(matches!(err, MapperError::SourceUnreadable(_)));
}
