//! Reading alert rule files from `<root>/Alerts/`

use std::path::{Path, PathBuf};

use super::{ALERTS_DIR_NAME, AlertRule};
use crate::codec::Format;
use crate::error::{Error, Result};

/// Read every alert rule file directly inside `<root>/Alerts/` of each root.
///
/// Roots without an `Alerts` directory are skipped. Files are read in sorted
/// name order; non-JSON/YAML files and subdirectories are ignored. A file that
/// fails to decode aborts the whole read. A blank UID falls back to the file
/// stem.
pub fn read_alert_rule_files<P: AsRef<Path>>(roots: &[P]) -> Result<Vec<AlertRule>> {
    let mut rules = Vec::new();

    for root in roots {
        let alerts_dir = root.as_ref().join(ALERTS_DIR_NAME);
        match std::fs::metadata(&alerts_dir) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => continue,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => return Err(Error::io(&alerts_dir, e)),
        }

        for path in rule_files(&alerts_dir)? {
            let mut rule: AlertRule = Format::decode_file(&path)?;
            if rule.trimmed_uid().is_empty() {
                rule.uid = file_stem(&path);
            }
            log::debug!("read alert rule {} from {}", rule.uid, path.display());
            rules.push(rule);
        }
    }

    Ok(rules)
}

fn rule_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|e| Error::io(dir, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| Error::io(dir, e))?;
        let path = entry.path();
        if path.is_dir() || Format::from_path(&path).is_none() {
            continue;
        }
        files.push(path);
    }
    files.sort();
    Ok(files)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn alerts_dir(root: &Path) -> PathBuf {
        let dir = root.join(ALERTS_DIR_NAME);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_missing_alerts_dir_is_skipped() {
        let root = tempfile::tempdir().unwrap();
        let rules = read_alert_rule_files(&[root.path()]).unwrap();
        assert!(rules.is_empty());
    }

    #[test]
    fn test_alerts_file_instead_of_dir_is_skipped() {
        let root = tempfile::tempdir().unwrap();
        fs::write(root.path().join(ALERTS_DIR_NAME), "not a dir").unwrap();
        assert!(read_alert_rule_files(&[root.path()]).unwrap().is_empty());
    }

    #[test]
    fn test_reads_json_and_yaml() {
        let root = tempfile::tempdir().unwrap();
        let dir = alerts_dir(root.path());
        fs::write(dir.join("a.json"), r#"{"uid":"a","title":"A"}"#).unwrap();
        fs::write(dir.join("b.yaml"), "uid: b\ntitle: B\n").unwrap();
        fs::write(dir.join("c.yml"), "uid: c\n").unwrap();
        fs::write(dir.join("notes.txt"), "ignored").unwrap();
        fs::create_dir(dir.join("nested.json")).unwrap();

        let rules = read_alert_rule_files(&[root.path()]).unwrap();
        let uids: Vec<_> = rules.iter().map(|r| r.uid.as_str()).collect();
        assert_eq!(uids, vec!["a", "b", "c"]);
        assert_eq!(rules[1].rest["title"], "B");
    }

    #[test]
    fn test_blank_uid_falls_back_to_file_stem() {
        let root = tempfile::tempdir().unwrap();
        let dir = alerts_dir(root.path());
        fs::write(dir.join("disk-full.json"), r#"{"uid":"  ","title":"Disk"}"#).unwrap();
        fs::write(dir.join("mem.yaml"), "title: Mem\n").unwrap();

        let rules = read_alert_rule_files(&[root.path()]).unwrap();
        let uids: Vec<_> = rules.iter().map(|r| r.uid.as_str()).collect();
        assert_eq!(uids, vec!["disk-full", "mem"]);
    }

    #[test]
    fn test_decode_error_names_file() {
        let root = tempfile::tempdir().unwrap();
        let dir = alerts_dir(root.path());
        fs::write(dir.join("ok.json"), r#"{"uid":"ok"}"#).unwrap();
        fs::write(dir.join("zz-broken.json"), "{oops").unwrap();

        let err = read_alert_rule_files(&[root.path()]).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
        assert!(err.to_string().starts_with("parse error in '"));
        assert!(err.to_string().contains("zz-broken.json"));
    }

    #[test]
    fn test_multiple_roots_in_order() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        fs::write(alerts_dir(first.path()).join("x.json"), r#"{"uid":"x"}"#).unwrap();
        fs::write(alerts_dir(second.path()).join("a.json"), r#"{"uid":"a"}"#).unwrap();

        let rules = read_alert_rule_files(&[first.path(), second.path()]).unwrap();
        let uids: Vec<_> = rules.iter().map(|r| r.uid.as_str()).collect();
        assert_eq!(uids, vec!["x", "a"]);
    }
}
