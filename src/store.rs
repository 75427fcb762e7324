//! Record store over a directory of `*.json` paper records.
//!
//! The directory is the only storage: records are read fresh on every load and
//! never written back. The subject index is cached and rebuilt whenever the
//! directory listing or any file's size/mtime changes.

use crate::error::{PapersError, Result};
use crate::record::PaperRecord;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;
use tracing::{debug, info, warn};

/// Record file extension
const RECORD_EXTENSION: &str = ".json";

/// Subject name -> record ids, subjects sorted, ids in filename order
pub type SubjectIndex = BTreeMap<String, Vec<String>>;

/// Snapshot of the directory used to invalidate the cached index
type Generation = Vec<(String, Option<SystemTime>, u64)>;

/// One row of the title/year catalog used by the survey flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub id: String,
    pub title: String,
    pub year: Option<i32>,
}

/// Read-only store of paper records
pub struct RecordStore {
    dir: PathBuf,
    index_cache: Mutex<Option<(Generation, Arc<SubjectIndex>)>>,
}

impl RecordStore {
    /// Open a store over `dir`, which must be an existing directory
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        if !dir.is_dir() {
            return Err(PapersError::Config(format!(
                "Papers directory not found: {}",
                dir.display()
            )));
        }
        info!(dir = %dir.display(), "Opened record store");
        Ok(Self {
            dir,
            index_cache: Mutex::new(None),
        })
    }

    /// Record ids (file names), sorted lexicographically
    pub fn list_records(&self) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if name.ends_with(RECORD_EXTENSION) {
                    ids.push(name.to_string());
                }
            }
        }
        ids.sort();
        Ok(ids)
    }

    /// Load one record by id
    ///
    /// # Errors
    ///
    /// * `NotFound` - id does not name a record file in the store
    /// * `Parse` - file content is not valid UTF-8 JSON
    pub fn load(&self, id: &str) -> Result<PaperRecord> {
        let path = self.resolve(id)?;
        let bytes = std::fs::read(&path)?;
        PaperRecord::from_slice(&bytes).map_err(|e| PapersError::Parse {
            id: id.to_string(),
            message: e.to_string(),
        })
    }

    /// Load records in order, skipping the ones that fail with a warning
    pub fn load_many(&self, ids: &[String]) -> Vec<(String, PaperRecord)> {
        ids.iter()
            .filter_map(|id| match self.load(id) {
                Ok(record) => Some((id.clone(), record)),
                Err(e) => {
                    warn!(id = %id, error = %e, "Skipping unreadable record");
                    None
                }
            })
            .collect()
    }

    /// Subject name -> ids of the records listing it under `subject_area.areas`
    ///
    /// Records that fail to load are skipped with a warning.
    pub fn index_by_subject(&self) -> Result<Arc<SubjectIndex>> {
        let generation = self.generation()?;

        if let Ok(cache) = self.index_cache.lock() {
            if let Some((cached_gen, index)) = cache.as_ref() {
                if *cached_gen == generation {
                    debug!("Subject index cache hit");
                    return Ok(Arc::clone(index));
                }
            }
        }

        let ids: Vec<String> = generation.iter().map(|(id, _, _)| id.clone()).collect();
        let mut index = SubjectIndex::new();
        for (id, record) in self.load_many(&ids) {
            for subject in record.subjects() {
                let papers = index.entry(subject).or_default();
                if !papers.contains(&id) {
                    papers.push(id.clone());
                }
            }
        }
        info!(
            records = ids.len(),
            subjects = index.len(),
            "Built subject index"
        );

        let index = Arc::new(index);
        if let Ok(mut cache) = self.index_cache.lock() {
            *cache = Some((generation, Arc::clone(&index)));
        }
        Ok(index)
    }

    /// Title and publication year of every record, in id order
    ///
    /// Unreadable records still appear, titled by their file stem with no year.
    pub fn catalog(&self) -> Result<Vec<CatalogEntry>> {
        let entries = self
            .list_records()?
            .into_iter()
            .map(|id| {
                let stem = id.trim_end_matches(RECORD_EXTENSION).to_string();
                match self.load(&id) {
                    Ok(record) => CatalogEntry {
                        title: record.title().unwrap_or(stem),
                        year: record.year(),
                        id,
                    },
                    Err(e) => {
                        warn!(id = %id, error = %e, "Catalog entry without metadata");
                        CatalogEntry {
                            title: stem,
                            year: None,
                            id,
                        }
                    }
                }
            })
            .collect();
        Ok(entries)
    }

    /// Distinct publication years, newest first
    pub fn years(&self) -> Result<Vec<i32>> {
        let mut years: Vec<i32> = self.catalog()?.into_iter().filter_map(|e| e.year).collect();
        years.sort_unstable_by(|a, b| b.cmp(a));
        years.dedup();
        Ok(years)
    }

    /// Map an id to a file inside the store, rejecting anything else
    fn resolve(&self, id: &str) -> Result<PathBuf> {
        let id = id.trim();
        if id.is_empty() || id.contains(['/', '\\']) || id.starts_with('.') {
            return Err(PapersError::NotFound(id.to_string()));
        }
        let file_name = if id.ends_with(RECORD_EXTENSION) {
            id.to_string()
        } else {
            format!("{}{}", id, RECORD_EXTENSION)
        };
        let path = self.dir.join(file_name);
        if path.is_file() {
            Ok(path)
        } else {
            Err(PapersError::NotFound(id.to_string()))
        }
    }

    fn generation(&self) -> Result<Generation> {
        Ok(self
            .list_records()?
            .into_iter()
            .map(|id| snapshot(&self.dir, id))
            .collect())
    }
}

/// Modification time and size of one record file
///
/// A file that vanished or became unreadable since the listing gets an empty
/// entry; the index build then skips it like any other bad record.
fn snapshot(dir: &Path, id: String) -> (String, Option<SystemTime>, u64) {
    match std::fs::metadata(dir.join(&id)) {
        Ok(meta) => {
            let modified = meta.modified().ok();
            (id, modified, meta.len())
        }
        Err(e) => {
            warn!(id = %id, error = %e, "Cannot stat record");
            (id, None, 0)
        }
    }
}

/// Entries published in one of `years`
pub fn filter_by_years(entries: &[CatalogEntry], years: &[i32]) -> Vec<CatalogEntry> {
    entries
        .iter()
        .filter(|e| e.year.is_some_and(|y| years.contains(&y)))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) {
        std::fs::write(dir.path().join(name), content).unwrap();
    }

    #[test]
    fn test_open_missing_dir() {
        assert!(matches!(
            RecordStore::open("/nonexistent/papers"),
            Err(PapersError::Config(_))
        ));
    }

    #[test]
    fn test_list_records_sorted_json_only() -> Result<()> {
        let dir = TempDir::new()?;
        write(&dir, "b.json", "{}");
        write(&dir, "a.json", "{}");
        write(&dir, "notes.txt", "x");
        std::fs::create_dir(dir.path().join("sub.json"))?;

        let store = RecordStore::open(dir.path())?;
        assert_eq!(store.list_records()?, vec!["a.json", "b.json"]);
        Ok(())
    }

    #[test]
    fn test_load_errors() -> Result<()> {
        let dir = TempDir::new()?;
        write(&dir, "bad.json", "{not json");
        let store = RecordStore::open(dir.path())?;

        assert!(matches!(store.load("missing.json"), Err(PapersError::NotFound(_))));
        assert!(matches!(store.load("../etc.json"), Err(PapersError::NotFound(_))));
        assert!(matches!(store.load("bad.json"), Err(PapersError::Parse { .. })));
        Ok(())
    }

    #[test]
    fn test_load_non_utf8_is_parse_error() -> Result<()> {
        let dir = TempDir::new()?;
        std::fs::write(dir.path().join("bin.json"), [0xff, 0xfe, b'{', b'}'])?;
        let store = RecordStore::open(dir.path())?;

        match store.load("bin.json") {
            Err(PapersError::Parse { id, .. }) => assert_eq!(id, "bin.json"),
            other => panic!("expected parse error, got {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn test_snapshot_of_vanished_file() -> Result<()> {
        let dir = TempDir::new()?;
        write(&dir, "a.json", "{}");
        let store = RecordStore::open(dir.path())?;

        let (_, modified, len) = snapshot(dir.path(), "a.json".to_string());
        assert!(modified.is_some());
        assert_eq!(len, 2);

        std::fs::remove_file(dir.path().join("a.json"))?;
        assert_eq!(
            snapshot(dir.path(), "a.json".to_string()),
            ("a.json".to_string(), None, 0)
        );
        assert!(store.index_by_subject()?.is_empty());
        Ok(())
    }

    #[test]
    fn test_load_accepts_stem() -> Result<()> {
        let dir = TempDir::new()?;
        write(&dir, "p1.json", r#"{"paper_title": "One"}"#);
        let store = RecordStore::open(dir.path())?;
        assert_eq!(store.load("p1")?.title().as_deref(), Some("One"));
        Ok(())
    }

    #[test]
    fn test_index_skips_bad_records_and_refreshes() -> Result<()> {
        let dir = TempDir::new()?;
        write(&dir, "a.json", r#"{"subject_area": {"areas": [{"name": "NLP"}, {"name": "NLP"}]}}"#);
        write(&dir, "broken.json", "[");
        let store = RecordStore::open(dir.path())?;

        let index = store.index_by_subject()?;
        assert_eq!(index.get("NLP"), Some(&vec!["a.json".to_string()]));
        assert_eq!(index.len(), 1);

        write(&dir, "b.json", r#"{"subject_area": {"areas": ["Biology", {"name": "NLP"}]}}"#);
        let index = store.index_by_subject()?;
        assert_eq!(
            index.get("NLP"),
            Some(&vec!["a.json".to_string(), "b.json".to_string()])
        );
        assert_eq!(index.get("Biology"), Some(&vec!["b.json".to_string()]));
        Ok(())
    }

    #[test]
    fn test_catalog_and_years() -> Result<()> {
        let dir = TempDir::new()?;
        write(&dir, "a.json", r#"{"paper_title": "Alpha", "published": "2021-04-01"}"#);
        write(&dir, "b.json", r#"{"published": "June 2023"}"#);
        write(&dir, "c.json", "oops");
        let store = RecordStore::open(dir.path())?;

        let catalog = store.catalog()?;
        assert_eq!(
            catalog,
            vec![
                CatalogEntry { id: "a.json".into(), title: "Alpha".into(), year: Some(2021) },
                CatalogEntry { id: "b.json".into(), title: "b".into(), year: Some(2023) },
                CatalogEntry { id: "c.json".into(), title: "c".into(), year: None },
            ]
        );
        assert_eq!(store.years()?, vec![2023, 2021]);
        assert_eq!(filter_by_years(&catalog, &[2023]).len(), 1);
        assert!(filter_by_years(&catalog, &[]).is_empty());
        Ok(())
    }
}
