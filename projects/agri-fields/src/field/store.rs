use crate::field::error::FieldError;
use crate::field::types::{field_filename, FieldId, FieldRecord, NewField};
use anyhow::Context;
use chrono::Utc;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

/// Persistence for field records. Callers only see records and ids, never
/// the storage layout.
pub trait FieldRepository: Send + Sync {
    /// Validates and stores a new field. Returns the storage filename.
    fn create(&self, field: NewField) -> Result<String, FieldError>;

    fn list(&self) -> Result<Vec<FieldRecord>, FieldError>;

    fn get_by_id(&self, id: &str) -> Result<FieldRecord, FieldError>;

    fn delete_by_id(&self, id: &str) -> Result<(), FieldError>;
}

/// One pretty-printed JSON document per field, named `<slug>_<id>.json`.
///
/// Nothing is cached; every call goes back to the directory. There is no
/// locking, so concurrent writers touching the same id race.
#[derive(Debug, Clone)]
pub struct FileFieldStore {
    dir: PathBuf,
}

impl FileFieldStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Every `*.json` file directly inside the directory. Symlinks are
    /// followed, so a linked record counts like a regular file.
    fn json_files(&self) -> Result<Vec<PathBuf>, FieldError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        if !self.dir.is_dir() {
            return Err(anyhow::anyhow!("{} is not a directory", self.dir.display()).into());
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&self.dir)
            .follow_links(true)
            .min_depth(1)
            .max_depth(1)
        {
            let entry = entry
                .with_context(|| format!("reading field directory {}", self.dir.display()))?;
            let is_json = entry
                .path()
                .extension()
                .and_then(|s| s.to_str())
                .map(|s| s == "json")
                .unwrap_or(false);
            if entry.file_type().is_file() && is_json {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }

    /// Exact id lookup: only files named `*_<id>.json` are opened, and the
    /// id stored inside the document must match.
    fn find(&self, id: &str) -> Result<Option<(PathBuf, FieldRecord)>, FieldError> {
        let suffix = format!("_{}.json", id);
        for path in self.json_files()? {
            let candidate = path
                .file_name()
                .and_then(|s| s.to_str())
                .map(|name| name.ends_with(&suffix))
                .unwrap_or(false);
            if !candidate {
                continue;
            }
            match read_record(&path) {
                Ok(record) if record.id.to_string() == id => return Ok(Some((path, record))),
                Ok(_) => {}
                Err(e) => warn!("Skipping unreadable field file {}: {:#}", path.display(), e),
            }
        }
        Ok(None)
    }
}

impl FieldRepository for FileFieldStore {
    fn create(&self, field: NewField) -> Result<String, FieldError> {
        let record = validate_new_field(field)?;
        let key = record.id.to_string();
        if self.find(&key)?.is_some() {
            return Err(FieldError::validation(format!(
                "A field with id {} already exists",
                key
            )));
        }

        fs::create_dir_all(&self.dir)
            .with_context(|| format!("creating field directory {}", self.dir.display()))?;

        let filename = field_filename(&record.name, &record.id);
        let path = self.dir.join(&filename);
        let content =
            serde_json::to_string_pretty(&record).context("serializing field record")?;
        // Two ids can still slug to the same filename; never overwrite.
        let mut file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(FieldError::validation(format!(
                    "Another field is already stored as {}",
                    filename
                )));
            }
            Err(e) => {
                return Err(anyhow::Error::new(e)
                    .context(format!("creating {}", path.display()))
                    .into())
            }
        };
        file.write_all(content.as_bytes())
            .with_context(|| format!("writing {}", path.display()))?;

        info!("Saved field {} to {}", key, path.display());
        Ok(filename)
    }

    fn list(&self) -> Result<Vec<FieldRecord>, FieldError> {
        let mut fields = Vec::new();
        for path in self.json_files()? {
            match read_record(&path) {
                Ok(record) => fields.push(record),
                Err(e) => warn!("Skipping unreadable field file {}: {:#}", path.display(), e),
            }
        }
        Ok(fields)
    }

    fn get_by_id(&self, id: &str) -> Result<FieldRecord, FieldError> {
        self.find(id)?
            .map(|(_, record)| record)
            .ok_or_else(|| FieldError::NotFound(id.to_string()))
    }

    fn delete_by_id(&self, id: &str) -> Result<(), FieldError> {
        let (path, _) = self
            .find(id)?
            .ok_or_else(|| FieldError::NotFound(id.to_string()))?;
        fs::remove_file(&path).with_context(|| format!("removing {}", path.display()))?;
        info!("Deleted field {} ({})", id, path.display());
        Ok(())
    }
}

fn read_record(path: &Path) -> anyhow::Result<FieldRecord> {
    let content = fs::read_to_string(path)?;
    let record = serde_json::from_str(&content)?;
    Ok(record)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Turns a create request into a storable record, generating an id from
/// the current time in milliseconds when none was supplied.
fn validate_new_field(field: NewField) -> Result<FieldRecord, FieldError> {
    let NewField {
        id,
        name,
        location,
        crop,
        coordinates,
        mut extra,
    } = field;

    let (Some(name), Some(location), Some(crop), Some(coordinates)) = (
        non_empty(name),
        non_empty(location),
        non_empty(crop),
        coordinates.filter(|c| c.len() >= 3),
    ) else {
        return Err(FieldError::validation(
            "Invalid field data. Name, location, crop, and at least 3 coordinates are required.",
        ));
    };

    let id = id.unwrap_or_else(|| FieldId::Number(Utc::now().timestamp_millis().into()));
    if !id.is_filename_safe() {
        return Err(FieldError::validation(format!(
            "Invalid field id {:?}: only letters, digits, '_' and '-' are allowed",
            id.to_string()
        )));
    }

    // Size is derived on read.
    extra.remove("size");

    Ok(FieldRecord {
        id,
        name,
        location,
        crop,
        coordinates,
        extra,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::types::Coordinate;
    use serde_json::json;

    fn square() -> Vec<Coordinate> {
        vec![
            Coordinate { lat: 13.3500, lng: 74.7900 },
            Coordinate { lat: 13.3500, lng: 74.7901 },
            Coordinate { lat: 13.3501, lng: 74.7901 },
            Coordinate { lat: 13.3501, lng: 74.7900 },
        ]
    }

    fn new_field(id: FieldId, name: &str) -> NewField {
        NewField {
            id: Some(id),
            name: Some(name.to_string()),
            location: Some("Manipal".to_string()),
            crop: Some("Wheat".to_string()),
            coordinates: Some(square()),
            ..NewField::default()
        }
    }

    #[test]
    fn test_create_then_get_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileFieldStore::new(tmp.path().join("fields"));

        let filename = store.create(new_field(7u64.into(), "North Field")).unwrap();
        assert_eq!(filename, "north_field_7.json");
        assert!(store.dir().join(&filename).exists());

        let record = store.get_by_id("7").unwrap();
        assert_eq!(record.id, FieldId::from(7u64));
        assert_eq!(record.name, "North Field");
        assert_eq!(record.location, "Manipal");
        assert_eq!(record.crop, "Wheat");
        assert_eq!(record.coordinates, square());
    }

    #[test]
    fn test_written_file_is_pretty_json_with_id() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileFieldStore::new(tmp.path());

        let mut field = new_field("plot-a".into(), "Plot A");
        field.extra.insert("notes".to_string(), json!("near canal"));
        field.extra.insert("size".to_string(), json!("99.00"));
        let filename = store.create(field).unwrap();

        let content = fs::read_to_string(tmp.path().join(filename)).unwrap();
        assert!(content.contains('\n'));
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["id"], "plot-a");
        assert_eq!(value["notes"], "near canal");
        assert!(value.get("size").is_none());
    }

    #[test]
    fn test_invalid_create_writes_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("fields");
        let store = FileFieldStore::new(&dir);

        let mut short = new_field(1u64.into(), "Short");
        short.coordinates = Some(square()[..2].to_vec());
        assert!(matches!(store.create(short), Err(FieldError::Validation(_))));

        let mut unnamed = new_field(2u64.into(), "");
        unnamed.name = None;
        assert!(matches!(store.create(unnamed), Err(FieldError::Validation(_))));

        let blank_crop = NewField {
            crop: Some("   ".to_string()),
            ..new_field(3u64.into(), "Blank")
        };
        assert!(matches!(store.create(blank_crop), Err(FieldError::Validation(_))));

        assert!(!dir.exists());
    }

    #[test]
    fn test_rejects_unsafe_id() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileFieldStore::new(tmp.path());

        let err = store.create(new_field("../escape".into(), "Bad")).unwrap_err();
        assert!(matches!(err, FieldError::Validation(_)));
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_generates_id_when_missing() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileFieldStore::new(tmp.path());

        let field = NewField {
            id: None,
            ..new_field(0u64.into(), "Generated")
        };
        let filename = store.create(field).unwrap();
        let fields = store.list().unwrap();
        assert_eq!(fields.len(), 1);
        assert!(matches!(fields[0].id, FieldId::Number(_)));
        assert_eq!(filename, format!("generated_{}.json", fields[0].id));
    }

    #[test]
    fn test_duplicate_id_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileFieldStore::new(tmp.path());

        store.create(new_field(5u64.into(), "First")).unwrap();
        let err = store.create(new_field(5u64.into(), "Second")).unwrap_err();
        assert!(matches!(err, FieldError::Validation(_)));
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn test_filename_collision_keeps_first_record() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileFieldStore::new(tmp.path());

        let first = store.create(new_field("b_c".into(), "A")).unwrap();
        assert_eq!(first, "a_b_c.json");

        // "A B" + "c" slugs to the same a_b_c.json
        let err = store.create(new_field("c".into(), "A B")).unwrap_err();
        assert!(matches!(err, FieldError::Validation(_)));

        assert_eq!(store.get_by_id("b_c").unwrap().name, "A");
        assert!(matches!(store.get_by_id("c"), Err(FieldError::NotFound(_))));
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_record_is_listed() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("fields");
        let elsewhere = tmp.path().join("elsewhere");
        fs::create_dir_all(&elsewhere).unwrap();

        let source = FileFieldStore::new(&elsewhere);
        let filename = source.create(new_field(4u64.into(), "Linked")).unwrap();
        fs::create_dir_all(&dir).unwrap();
        std::os::unix::fs::symlink(elsewhere.join(&filename), dir.join(&filename)).unwrap();

        let store = FileFieldStore::new(&dir);
        assert_eq!(store.list().unwrap().len(), 1);
        assert_eq!(store.get_by_id("4").unwrap().name, "Linked");
    }

    #[test]
    fn test_lookup_is_exact_not_substring() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileFieldStore::new(tmp.path());

        store.create(new_field(12u64.into(), "Field 1")).unwrap();
        assert!(matches!(store.get_by_id("1"), Err(FieldError::NotFound(_))));
        assert!(matches!(store.get_by_id("2"), Err(FieldError::NotFound(_))));
        assert!(matches!(store.delete_by_id("1"), Err(FieldError::NotFound(_))));

        store.create(new_field(1u64.into(), "Field 1")).unwrap();
        assert_eq!(store.get_by_id("1").unwrap().id, FieldId::from(1u64));
        assert_eq!(store.get_by_id("12").unwrap().id, FieldId::from(12u64));
    }

    #[test]
    fn test_delete_then_get_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileFieldStore::new(tmp.path());

        store.create(new_field(9u64.into(), "South")).unwrap();
        store.delete_by_id("9").unwrap();
        assert!(matches!(store.get_by_id("9"), Err(FieldError::NotFound(_))));
        assert!(matches!(store.delete_by_id("9"), Err(FieldError::NotFound(_))));
    }

    #[test]
    fn test_list_skips_corrupt_and_foreign_files() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileFieldStore::new(tmp.path());

        store.create(new_field(1u64.into(), "Good")).unwrap();
        fs::write(tmp.path().join("broken_2.json"), "{not json").unwrap();
        fs::write(tmp.path().join("readme.txt"), "ignored").unwrap();
        fs::create_dir(tmp.path().join("nested")).unwrap();

        let fields = store.list().unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].name, "Good");
        assert!(matches!(store.get_by_id("2"), Err(FieldError::NotFound(_))));
    }

    #[test]
    fn test_missing_directory_lists_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileFieldStore::new(tmp.path().join("not-yet"));
        assert!(store.list().unwrap().is_empty());
        assert!(matches!(store.get_by_id("1"), Err(FieldError::NotFound(_))));
    }

    #[test]
    fn test_directory_that_is_a_file_is_storage_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("fields");
        fs::write(&path, "").unwrap();

        let store = FileFieldStore::new(&path);
        assert!(matches!(store.list(), Err(FieldError::Storage(_))));
    }
}
