//! Source discovery and output naming.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::config::BatchConfig;
use crate::error::{BatchError, BatchResult};

/// List the `.xml` files (any case) under `dir`, sorted by path.
///
/// Only the top level is read unless `recursive` is set. `exclude` is
/// skipped entirely, so an output directory nested inside the source
/// directory is never read back as input.
pub fn collect_sources(dir: &Path, recursive: bool, exclude: Option<&Path>) -> BatchResult<Vec<PathBuf>> {
    let mut walker = WalkDir::new(dir).min_depth(1);
    if !recursive {
        walker = walker.max_depth(1);
    }

    let mut found = Vec::new();
    for entry in walker
        .into_iter()
        .filter_entry(|e| exclude.map_or(true, |skip| e.path() != skip))
    {
        let entry = entry.map_err(|source| BatchError::SourceDir {
            path: dir.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_file() && is_xml(entry.path()) {
            found.push(entry.into_path());
        }
    }
    found.sort();
    Ok(found)
}

fn is_xml(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"))
}

/// Where the merged output for `source` goes: the configured prefix plus the
/// source file name, in the matching subdirectory of the output directory.
pub fn output_path(config: &BatchConfig, source: &Path) -> PathBuf {
    let name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let subdir = source
        .strip_prefix(&config.sources)
        .ok()
        .and_then(Path::parent)
        .unwrap_or_else(|| Path::new(""));
    config.output.join(subdir).join(format!("{}{name}", config.prefix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, "<r/>").unwrap();
    }

    #[test]
    fn xml_files_only_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.xml", "a.XML", "notes.txt", "c.xml.bak", "sub/d.xml"] {
            touch(&dir.path().join(name));
        }

        let found = collect_sources(dir.path(), false, None).unwrap();
        let names: Vec<String> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.XML", "b.xml"]);
    }

    #[test]
    fn recursive_walk_skips_excluded_dir() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("a.xml"));
        touch(&dir.path().join("sub/d.xml"));
        touch(&dir.path().join("out/Merged_a.xml"));

        let out = dir.path().join("out");
        let found = collect_sources(dir.path(), true, Some(&out)).unwrap();
        assert_eq!(found, vec![dir.path().join("a.xml"), dir.path().join("sub/d.xml")]);
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = collect_sources(&dir.path().join("nope"), false, None).unwrap_err();
        assert!(matches!(err, BatchError::SourceDir { .. }));
    }

    #[test]
    fn output_names() {
        let config = BatchConfig::new("t.xml", "/in", "/out");
        assert_eq!(
            output_path(&config, Path::new("/in/contract.xml")),
            PathBuf::from("/out/Merged_contract.xml")
        );
        assert_eq!(
            output_path(&config.clone().with_prefix("x-"), Path::new("/in/2024/c.xml")),
            PathBuf::from("/out/2024/x-c.xml")
        );
    }
}
