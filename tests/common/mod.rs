use std::fs;
use std::path::Path;

use serde::Serialize;
use tempfile::TempDir;

#[derive(Debug, Serialize)]
pub struct Product {
    name: String,
    price: i32,
    tags: Vec<String>,
}

impl Product {
    #[allow(dead_code)]
    pub fn new() -> Product {
        Product {
            name: "Moto G".to_owned(),
            price: 100,
            tags: vec!["phone".to_owned(), "android".to_owned()],
        }
    }
}

/// Writes `files` (path relative to the dir, content) into a fresh temporary directory
#[allow(dead_code)]
pub fn template_dir(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (path, content) in files {
        write(dir.path(), path, content);
    }
    dir
}

#[allow(dead_code)]
pub fn write(dir: &Path, path: &str, content: &str) {
    let full = dir.join(path);
    if let Some(parent) = full.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(full, content).unwrap();
}
