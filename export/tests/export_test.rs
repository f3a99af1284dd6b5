//! End-to-end tests for the archive exporter.

use std::path::{Path, PathBuf};

use chatlib_export::{Archive, ExportConfig, Exporter, strip_footer};
use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::TempDir;

fn fixture_archive() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/archive/conversations.json")
}

fn fixture_images() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/archive/images")
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}

#[test]
fn test_export_fixture_archive() {
    let out = TempDir::new().unwrap();
    let report = Exporter::default()
        .run(&fixture_archive(), out.path())
        .unwrap();

    assert_eq!(report.conversations, 2);
    assert_eq!(report.notes_written, 2);
    assert_eq!(report.images_copied, 2);
    assert_eq!(report.images_missing, 1);
    assert_eq!(report.bundle, None);

    let trip = read(&out.path().join("2023-11-14 - Trip planning - 11111111.md"));
    assert_eq!(
        trip,
        "# Trip planning\n\n\
         \x20 • **Created:** 2023-11-14T22:13:20Z  •  **ID:** 11111111-aaaa  •  **Model:** gpt-4o\n\n\
         **USER**\n\nLook at this\n\n\
         ![[_assets/2023-11-14_Trip-planning_11111111_msg001_img01.png]]\n\n\
         **ASSISTANT**\n\nNice photo\n"
    );

    let fuzzy = read(&out.path().join("2023-11-14 - Fuzzy lookup - 22222222.md"));
    assert_eq!(
        fuzzy,
        "# Fuzzy: lookup?\n\n\
         \x20 • **Created:** 2023-11-14T22:13:20Z  •  **ID:** 22222222-bbbb\n\n\
         **USER**\n\nsee attached\n\n\
         ![[_assets/2023-11-14_Fuzzy-lookup_22222222_msg001_img01.jpg]]\n\n\
         > ⚠️ Missing image for file-missing\n"
    );
}

#[test]
fn test_copied_assets_are_byte_equal() {
    let out = TempDir::new().unwrap();
    Exporter::default()
        .run(&fixture_archive(), out.path())
        .unwrap();

    let assets = out.path().join("_assets");
    assert_eq!(
        std::fs::read(assets.join("2023-11-14_Trip-planning_11111111_msg001_img01.png")).unwrap(),
        std::fs::read(fixture_images().join("indexed-upload.png")).unwrap()
    );
    assert_eq!(
        std::fs::read(assets.join("2023-11-14_Fuzzy-lookup_22222222_msg001_img01.jpg")).unwrap(),
        std::fs::read(fixture_images().join("File_Zq9-upload.JPG")).unwrap()
    );
}

#[test]
fn test_missing_image_folder_renders_placeholders() {
    let out = TempDir::new().unwrap();
    let config = ExportConfig::default().with_source_assets("/no/such/images");
    let report = Exporter::new(config)
        .run(&fixture_archive(), out.path())
        .unwrap();

    assert_eq!(report.images_copied, 0);
    assert_eq!(report.images_missing, 3);
    let trip = read(&out.path().join("2023-11-14 - Trip planning - 11111111.md"));
    assert!(trip.contains("> ⚠️ Missing image for file-IDX1\n"));
}

#[test]
fn test_split_parts_rejoin_to_full_note() {
    let paragraphs: Vec<String> = (0..40)
        .map(|i| format!("Paragraph {i}: {}", "lorem ipsum ".repeat(8)))
        .collect();
    let archive = Archive::from_value(json!([{
        "id": "abcdef12-3456",
        "title": "Long chat",
        "create_time": 1700000000,
        "messages": [
            {"role": "user", "content": paragraphs.join("\n\n")},
            {"role": "assistant", "content": "done"}
        ]
    }]))
    .unwrap();

    let whole_dir = TempDir::new().unwrap();
    Exporter::default()
        .export_archive(&archive, Path::new("/no/images"), whole_dir.path())
        .unwrap();
    let whole = read(&whole_dir.path().join("2023-11-14 - Long chat - abcdef12.md"));

    let split_dir = TempDir::new().unwrap();
    let report = Exporter::new(ExportConfig::default().with_split_chars(500))
        .export_archive(&archive, Path::new("/no/images"), split_dir.path())
        .unwrap();
    assert!(report.notes_written > 1);

    let mut rejoined = String::new();
    for n in 1..=report.notes_written {
        let name = format!("2023-11-14 - Long chat - abcdef12 (part {n}).md");
        let part = read(&split_dir.path().join(name));
        assert!(part.contains(&format!("_Part {n} of {}_", report.notes_written)));
        rejoined.push_str(strip_footer(&part));
    }
    assert_eq!(rejoined, whole);
}

#[test]
fn test_bundle_written_next_to_output() {
    let root = TempDir::new().unwrap();
    let out = root.path().join("staging");
    let report = Exporter::new(ExportConfig::default().with_bundle())
        .run(&fixture_archive(), &out)
        .unwrap();

    assert_eq!(report.bundle, Some(root.path().join("staging.zip")));
    assert!(root.path().join("staging.zip").is_file());
}

#[test]
fn test_dangling_parent_node_is_not_an_entry_point() {
    let text = |s: &str| json!({"content": {"content_type": "text", "parts": [s]}});
    let archive = Archive::from_value(json!([{
        "id": "33333333-cccc",
        "title": "Graph",
        "create_time": 1700000000,
        "mapping": {
            "root": {"message": null, "parent": null, "children": ["a"]},
            "a": {"message": {"author": {"role": "user"}, "content": {"content_type": "text", "parts": ["kept"]}}, "parent": "root", "children": []},
            "stray": {"message": text("dropped"), "parent": "gone", "children": []}
        }
    }]))
    .unwrap();

    let out = TempDir::new().unwrap();
    Exporter::default()
        .export_archive(&archive, Path::new("/no/images"), out.path())
        .unwrap();

    let note = read(&out.path().join("2023-11-14 - Graph - 33333333.md"));
    assert!(note.contains("**USER**\n\nkept\n"), "{note}");
    assert!(!note.contains("dropped"), "{note}");
}

#[test]
fn test_unwritable_note_is_counted_and_skipped() {
    let archive = Archive::from_value(json!([
        {"id": "44444444-dddd", "title": "Blocked", "create_time": 1700000000,
         "messages": [{"role": "user", "content": "one"}]},
        {"id": "55555555-eeee", "title": "Open", "create_time": 1700000000,
         "messages": [{"role": "user", "content": "two"}]}
    ]))
    .unwrap();

    let out = TempDir::new().unwrap();
    std::fs::create_dir_all(out.path().join("2023-11-14 - Blocked - 44444444.md")).unwrap();

    let report = Exporter::default()
        .export_archive(&archive, Path::new("/no/images"), out.path())
        .unwrap();
    assert_eq!(report.conversations, 2);
    assert_eq!(report.notes_written, 1);
    assert_eq!(report.notes_failed, 1);
    assert!(read(&out.path().join("2023-11-14 - Open - 55555555.md")).contains("two"));
}

#[test]
fn test_malformed_archive_is_fatal() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("conversations.json");
    std::fs::write(&path, "42").unwrap();

    let err = Exporter::default()
        .run(&path, &dir.path().join("out"))
        .unwrap_err();
    assert!(matches!(err, chatlib_export::ExportError::MalformedArchive(_)));
}
