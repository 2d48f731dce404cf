//! Local resource files
//!
//! Generic objects are stored one per file as
//! `<root>/<Kind>.<version>.<group>/<name>.<ext>`. The `Alerts` directory
//! directly under a root is reserved for alert rules and never read here.

use std::path::{Path, PathBuf};

use serde_json::Value;
use walkdir::{DirEntry, WalkDir};

use crate::alerts::ALERTS_DIR_NAME;
use crate::codec::Format;
use crate::error::{Error, Result};
use crate::filter::Filters;
use crate::object::Object;
use crate::resources::Resources;

/// Reads resource files from one or more roots
#[derive(Debug, Clone, Default)]
pub struct FsReader {
    follow_links: bool,
}

impl FsReader {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn follow_links(mut self, follow: bool) -> Self {
        self.follow_links = follow;
        self
    }

    /// Read every JSON/YAML file under `roots` that passes `filters` into `out`.
    ///
    /// Files are visited in sorted order. Hidden entries are skipped. A file
    /// that fails to decode, or decodes to an object without a name, aborts
    /// the read. Returns the number of objects added.
    pub fn read<P: AsRef<Path>>(
        &self,
        out: &mut Resources,
        filters: &Filters,
        roots: &[P],
    ) -> Result<usize> {
        let mut count = 0;

        for root in roots {
            let root = root.as_ref();
            let walker = WalkDir::new(root)
                .follow_links(self.follow_links)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|e| !is_skipped(e));

            for entry in walker {
                let entry = entry.map_err(|e| {
                    let path = e.path().unwrap_or(root).to_path_buf();
                    Error::io(path, e.into())
                })?;
                if !entry.file_type().is_file() || Format::from_path(entry.path()).is_none() {
                    continue;
                }

                let obj = read_object(entry.path())?;
                if !filters.matches(obj.id()) {
                    log::trace!("{} filtered out", obj.id());
                    continue;
                }
                log::debug!("read {} from {}", obj.id(), entry.path().display());
                out.add(obj);
                count += 1;
            }
        }

        Ok(count)
    }
}

fn is_skipped(entry: &DirEntry) -> bool {
    if entry.depth() == 0 {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    if name.starts_with('.') {
        return true;
    }
    entry.depth() == 1 && entry.file_type().is_dir() && name == ALERTS_DIR_NAME
}

fn read_object(path: &Path) -> Result<Object> {
    let value: Value = Format::decode_file(path)?;
    Object::from_value(value).map_err(|e| Error::parse(path, e))
}

/// Writes objects to the per-kind layout
#[derive(Debug, Clone)]
pub struct FsWriter {
    dir: PathBuf,
    format: Format,
}

impl FsWriter {
    pub fn new(dir: impl Into<PathBuf>, format: Format) -> Self {
        Self {
            dir: dir.into(),
            format,
        }
    }

    /// Path an object is written to
    pub fn path_for(&self, obj: &Object) -> PathBuf {
        self.dir
            .join(obj.kind().to_string())
            .join(format!("{}.{}", obj.name(), self.format.extension()))
    }

    /// Write every object, without server-assigned metadata
    pub fn write(&self, resources: &Resources) -> Result<()> {
        for obj in resources {
            let name = obj.name();
            if name.contains(['/', '\\']) || name == ".." {
                return Err(Error::InvalidObject(format!(
                    "{} cannot be written to a file",
                    obj.id()
                )));
            }

            let path = self.path_for(obj);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
            }
            self.format.encode_file(&path, &obj.without_server_fields())?;
            log::debug!("wrote {}", path.display());
        }

        log::info!(
            "wrote {} objects to {}",
            resources.len(),
            self.dir.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::Registry;
    use crate::testutil::{dashboard, dashboards_descriptor, folder, folders_descriptor, object};
    use std::fs;

    fn sample() -> Resources {
        [object(dashboard("a")), object(dashboard("b")), object(folder("f"))]
            .into_iter()
            .collect()
    }

    fn registry() -> Registry {
        Registry::new(vec![dashboards_descriptor(), folders_descriptor()])
    }

    #[test]
    fn test_write_layout_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        FsWriter::new(dir.path(), Format::Yaml).write(&sample()).unwrap();

        assert!(
            dir.path()
                .join("Dashboard.v1beta1.dashboard.grafana.app/a.yaml")
                .is_file()
        );
        assert!(dir.path().join("Folder.v1.folder.grafana.app/f.yaml").is_file());

        let mut out = Resources::new();
        let count = FsReader::new()
            .read(&mut out, &Filters::new(), &[dir.path()])
            .unwrap();
        assert_eq!(count, 3);
        assert_eq!(out.as_list()[0].body(), sample().as_list()[0].body());
    }

    #[test]
    fn test_writer_strips_server_fields() {
        let dir = tempfile::tempdir().unwrap();
        let mut body = dashboard("a");
        body["metadata"]["resourceVersion"] = "12".into();
        body["metadata"]["uid"] = "abc".into();
        body["status"] = serde_json::json!({"ok": true});
        let resources: Resources = [object(body)].into_iter().collect();

        let writer = FsWriter::new(dir.path(), Format::Json);
        writer.write(&resources).unwrap();

        let written: Value = Format::decode_file(&writer.path_for(&resources.as_list()[0])).unwrap();
        assert!(written["metadata"].get("resourceVersion").is_none());
        assert!(written["metadata"].get("uid").is_none());
        assert!(written.get("status").is_none());
        assert_eq!(written["spec"]["title"], "Dashboard a");
    }

    #[test]
    fn test_reader_skips_alerts_and_hidden() {
        let dir = tempfile::tempdir().unwrap();
        FsWriter::new(dir.path(), Format::Json).write(&sample()).unwrap();
        fs::create_dir(dir.path().join("Alerts")).unwrap();
        fs::write(dir.path().join("Alerts/rule.json"), r#"{"uid":"r"}"#).unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join(".git/x.json"), "{broken").unwrap();
        fs::write(dir.path().join("README.md"), "docs").unwrap();

        let mut out = Resources::new();
        let count = FsReader::new()
            .read(&mut out, &Filters::new(), &[dir.path()])
            .unwrap();
        assert_eq!(count, 3);
    }

    #[test]
    fn test_reader_honours_filters() {
        let dir = tempfile::tempdir().unwrap();
        FsWriter::new(dir.path(), Format::Json).write(&sample()).unwrap();

        let filters = Filters::parse(&["dashboards/b", "folders"], &registry()).unwrap();
        let mut out = Resources::new();
        FsReader::new().read(&mut out, &filters, &[dir.path()]).unwrap();
        let names: Vec<_> = out.iter().map(Object::name).collect();
        assert_eq!(names, vec!["b", "f"]);
    }

    #[test]
    fn test_reader_decode_error_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bad.yaml"), "a: [unclosed").unwrap();

        let err = FsReader::new()
            .read(&mut Resources::new(), &Filters::new(), &[dir.path()])
            .unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
        assert!(err.to_string().contains("bad.yaml"));
    }

    #[test]
    fn test_reader_rejects_blank_name() {
        let dir = tempfile::tempdir().unwrap();
        let mut body = dashboard("x");
        body["metadata"]["name"] = " ".into();
        fs::write(dir.path().join("x.json"), body.to_string()).unwrap();

        let err = FsReader::new()
            .read(&mut Resources::new(), &Filters::new(), &[dir.path()])
            .unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = FsReader::new()
            .read(&mut Resources::new(), &Filters::new(), &[dir.path().join("nope")])
            .unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
