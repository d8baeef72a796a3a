use crate::field::error::FieldError;
use crate::field::store::FieldRepository;
use crate::field::types::Coordinate;
use anyhow::Context;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Index-keyed `[lng, lat]` map: `{"1": [lng, lat], "2": [lng, lat], ...}`.
///
/// Keys are 1-based and follow vertex order, and they serialize in that
/// order (not lexicographically).
#[derive(Debug, Clone, PartialEq)]
pub struct ManipalCoordinateMap(pub Vec<[f64; 2]>);

impl ManipalCoordinateMap {
    pub fn from_coordinates(coordinates: &[Coordinate]) -> Self {
        Self(coordinates.iter().map(|c| [c.lng, c.lat]).collect())
    }
}

impl Serialize for ManipalCoordinateMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (i, pair) in self.0.iter().enumerate() {
            map.serialize_entry(&(i + 1).to_string(), pair)?;
        }
        map.end()
    }
}

/// Writes one field's coordinates to a single shared snapshot file.
///
/// Every export overwrites the previous one regardless of which field it
/// came from: the file always holds the most recently exported field.
#[derive(Debug, Clone)]
pub struct CoordinateExporter {
    output_path: PathBuf,
}

impl CoordinateExporter {
    pub fn new(output_path: impl Into<PathBuf>) -> Self {
        Self {
            output_path: output_path.into(),
        }
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn export(
        &self,
        store: &dyn FieldRepository,
        field_id: &str,
    ) -> Result<ManipalCoordinateMap, FieldError> {
        let field = store.get_by_id(field_id)?;
        if field.coordinates.len() < 3 {
            return Err(FieldError::validation(
                "Field has invalid or insufficient coordinates",
            ));
        }

        let map = ManipalCoordinateMap::from_coordinates(&field.coordinates);

        if let Some(parent) = self.output_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating export directory {}", parent.display()))?;
            }
        }
        let content = serde_json::to_string_pretty(&map).context("serializing coordinate map")?;
        fs::write(&self.output_path, content)
            .with_context(|| format!("writing {}", self.output_path.display()))?;

        info!(
            "Exported {} coordinates of field {} to {}",
            map.0.len(),
            field_id,
            self.output_path.display()
        );
        Ok(map)
    }
}
