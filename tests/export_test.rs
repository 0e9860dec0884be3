//! Static export integration tests.

use std::fs;
use std::path::Path;

use mishap::config::Config;
use mishap::error::Error;
use mishap::export::{export, ExportOptions};

fn options(index: bool) -> ExportOptions {
    ExportOptions { index }
}

fn find_file(dir: &Path, suffix: &str) -> Option<std::path::PathBuf> {
    for entry in fs::read_dir(dir).ok()? {
        let path = entry.ok()?.path();
        if path.is_dir() {
            if let Some(found) = find_file(&path, suffix) {
                return Some(found);
            }
        } else if path.to_string_lossy().ends_with(suffix) {
            return Some(path);
        }
    }
    None
}

#[test]
fn test_basic_export_writes_pages_for_every_template() {
    let target = tempfile::tempdir().unwrap();
    let config = Config::default();

    let summary = export(&config, target.path(), &options(false)).unwrap();
    assert!(summary.written > 0);
    assert_eq!(summary.failed, 0);

    for name in config.templates.names() {
        let dir = target.path().join(name);
        assert!(dir.is_dir(), "expected directory for template {}", name);
        assert!(
            dir.join("404.html").is_file(),
            "expected 404.html for template {}",
            name
        );
    }
}

#[test]
fn test_exported_page_contains_the_code() {
    let target = tempfile::tempdir().unwrap();
    export(&Config::default(), target.path(), &options(false)).unwrap();

    let page = find_file(target.path(), "404.html").expect("404.html somewhere in the tree");
    let content = fs::read_to_string(page).unwrap();
    assert!(content.contains("404"));
}

#[test]
fn test_export_is_idempotent() {
    let target = tempfile::tempdir().unwrap();
    let config = Config::default();

    export(&config, target.path(), &options(false)).unwrap();
    export(&config, target.path(), &options(false)).unwrap();
}

#[test]
fn test_minification_respects_flag() {
    let minified_dir = tempfile::tempdir().unwrap();
    let plain_dir = tempfile::tempdir().unwrap();

    export(&Config::default(), minified_dir.path(), &options(false)).unwrap();

    let mut config = Config::default();
    config.disable_minification = true;
    export(&config, plain_dir.path(), &options(false)).unwrap();

    let minified = fs::read_to_string(find_file(minified_dir.path(), "404.html").unwrap()).unwrap();
    let plain = fs::read_to_string(find_file(plain_dir.path(), "404.html").unwrap()).unwrap();

    assert!(plain.contains('\n'), "unminified output keeps newlines");
    assert!(minified.len() <= plain.len());
}

#[test]
fn test_index_orders_codes_ascending() {
    let target = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.add_code_spec("599=Last/Description").unwrap();
    config.add_code_spec("400=First/Description").unwrap();

    export(&config, target.path(), &options(true)).unwrap();

    let index = fs::read_to_string(target.path().join("index.html")).unwrap();
    assert!(index.contains("Error pages index"));
    assert!(index.contains("Template name:"));

    let pos_400 = index.find(">400<").expect("400 listed in index");
    let pos_599 = index.find(">599<").expect("599 listed in index");
    assert!(pos_400 < pos_599, "codes must be sorted ascending");

    // links are relative to the target directory
    assert!(index.contains("href=\"./"));
    assert!(!index.contains(&format!("href=\"{}", target.path().display())));
}

#[test]
fn test_index_lists_every_template() {
    let target = tempfile::tempdir().unwrap();
    let config = Config::default();

    export(&config, target.path(), &options(true)).unwrap();

    let index = fs::read_to_string(target.path().join("index.html")).unwrap();
    for name in config.templates.names() {
        assert!(index.contains(name), "index should mention {}", name);
    }
}

#[test]
fn test_custom_template_and_code() {
    let work = tempfile::tempdir().unwrap();
    let template_path = work.path().join("custom.html");
    fs::write(
        &template_path,
        "<!DOCTYPE html><html><body><h1>Error {{ code }}</h1></body></html>",
    )
    .unwrap();

    let target = work.path().join("out");
    fs::create_dir(&target).unwrap();

    let mut config = Config::default();
    let name = config.templates.add_from_file(&template_path).unwrap();
    assert_eq!(name, "custom");
    config.add_code_spec("599=Custom Error/Custom error description").unwrap();

    export(&config, &target, &options(false)).unwrap();

    assert!(target.join("custom").is_dir());
    assert!(target.join("custom").join("599.html").is_file());
}

#[test]
fn test_wildcard_codes_are_skipped() {
    let target = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.add_code_spec("5**=Server Error/Wildcard pattern").unwrap();

    export(&config, target.path(), &options(false)).unwrap();

    assert!(
        find_file(target.path(), "5**.html").is_none(),
        "wildcard patterns must not produce files"
    );
}

#[test]
fn test_disabling_all_templates_fails() {
    let target = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    for name in ["app-down", "cable", "ghost"] {
        config.templates.remove(name);
    }

    let err = export(&config, target.path(), &options(false)).unwrap_err();
    assert!(matches!(err, Error::NoTemplates));
    assert_eq!(err.to_string(), "no templates specified");
}

#[test]
fn test_template_name_collision_with_file_fails() {
    let target = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    for name in ["cable", "ghost"] {
        config.templates.remove(name);
    }

    // a regular file occupies the path the template directory needs
    fs::write(target.path().join("app-down"), "conflict").unwrap();

    let err = export(&config, target.path(), &options(false)).unwrap_err();
    assert!(matches!(err, Error::NotADirectory(_)));
    assert!(err.to_string().contains("is not a directory"));

    // nothing was written for the conflicting template
    assert!(find_file(target.path(), ".html").is_none());
}

#[test]
fn test_missing_target_directory_fails() {
    let err = export(
        &Config::default(),
        Path::new("/nonexistent/directory/path"),
        &options(false),
    )
    .unwrap_err();
    assert!(err.to_string().contains("cannot access the target directory"));
}

#[test]
fn test_target_path_that_is_a_file_fails() {
    let work = tempfile::tempdir().unwrap();
    let file_path = work.path().join("not-a-dir.txt");
    fs::write(&file_path, "test").unwrap();

    let err = export(&Config::default(), &file_path, &options(false)).unwrap_err();
    assert!(err.to_string().contains("is not a directory"));
}

#[test]
fn test_empty_target_path_fails() {
    let err = export(&Config::default(), Path::new(""), &options(false)).unwrap_err();
    assert!(err.to_string().contains("missing target directory"));
}

#[test]
fn test_empty_code_description_is_tolerated() {
    let target = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.add_code_spec("599=/").unwrap();

    export(&config, target.path(), &options(false)).unwrap();
    assert!(find_file(target.path(), "599.html").is_some());
}
