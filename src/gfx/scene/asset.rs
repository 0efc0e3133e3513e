//! JSON geometry assets.
//!
//! The demos ship models as plain JSON with flat `vertices`/`indices`
//! arrays and optional material fields in either the descriptive or the
//! OBJ naming convention. Loading is strict about geometry (a malformed
//! file never yields a partial object) but tolerant about everything else.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use super::{material::Material, object::SceneObject};

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("bad geometry in {path}: {reason}")]
    Geometry { path: PathBuf, reason: String },
}

/// The on-disk model schema. Any subset of the fields may be absent;
/// material defaulting rules fill the gaps.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawModel {
    pub vertices: Vec<f32>,
    pub indices: Vec<u16>,
    pub scalars: Option<Vec<f32>>,
    #[serde(rename = "textureCoords")]
    pub texture_coords: Option<Vec<f32>>,
    pub alias: Option<String>,
    pub wireframe: Option<bool>,

    pub diffuse: Option<Vec<f32>>,
    #[serde(rename = "Kd")]
    pub kd: Option<Vec<f32>>,
    pub ambient: Option<Vec<f32>>,
    #[serde(rename = "Ka")]
    pub ka: Option<Vec<f32>>,
    pub specular: Option<Vec<f32>>,
    #[serde(rename = "Ks")]
    pub ks: Option<Vec<f32>>,
    #[serde(rename = "specularExponent")]
    pub specular_exponent: Option<f32>,
    #[serde(rename = "Ns")]
    pub ns: Option<f32>,
    pub d: Option<f32>,
    pub transparency: Option<f32>,
    pub illum: Option<i32>,

    // Floor-style helper fields, accepted but unused by model loading.
    pub dimension: Option<f32>,
    pub lines: Option<u32>,
}

/// Reads and validates one model file.
pub fn load_model(path: &Path) -> Result<SceneObject, AssetError> {
    let text = fs::read_to_string(path).map_err(|source| AssetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let raw: RawModel = serde_json::from_str(&text).map_err(|source| AssetError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    object_from_raw(raw, path)
}

fn object_from_raw(raw: RawModel, path: &Path) -> Result<SceneObject, AssetError> {
    let geometry_error = |reason: String| AssetError::Geometry {
        path: path.to_path_buf(),
        reason,
    };

    if raw.vertices.is_empty() {
        return Err(geometry_error("no vertices".into()));
    }
    if raw.vertices.len() % 3 != 0 {
        return Err(geometry_error(format!(
            "vertex array length {} is not a multiple of 3",
            raw.vertices.len()
        )));
    }

    let positions: Vec<[f32; 3]> = raw
        .vertices
        .chunks_exact(3)
        .map(|v| [v[0], v[1], v[2]])
        .collect();

    let vertex_count = positions.len();
    if let Some(&out_of_range) = raw.indices.iter().find(|&&i| i as usize >= vertex_count) {
        return Err(geometry_error(format!(
            "index {} out of range for {} vertices",
            out_of_range, vertex_count
        )));
    }

    let texture_coords = match &raw.texture_coords {
        Some(coords) if coords.len() % 2 == 0 => {
            Some(coords.chunks_exact(2).map(|t| [t[0], t[1]]).collect())
        }
        Some(coords) => {
            return Err(geometry_error(format!(
                "texture coordinate array length {} is not a multiple of 2",
                coords.len()
            )));
        }
        None => None,
    };

    let material = Material::from_raw(&raw);
    let mut object = SceneObject::from_parts(
        positions,
        raw.indices,
        raw.scalars,
        texture_coords,
        material,
    );
    object.alias = raw.alias;
    object.wireframe = raw.wireframe.unwrap_or(false);
    Ok(object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_fixture(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("glint-asset-{}-{}", std::process::id(), name));
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn loads_minimal_model_with_defaults() {
        let path = write_fixture(
            "minimal.json",
            r#"{ "vertices": [0,0,0, 1,0,0, 0,1,0], "indices": [0,1,2] }"#,
        );
        let object = load_model(&path).unwrap();
        assert_eq!(object.positions().len(), 3);
        assert_eq!(object.material.diffuse, [1.0, 1.0, 1.0, 1.0]);
        assert!(!object.wireframe);
        fs::remove_file(path).ok();
    }

    #[test]
    fn alias_and_obj_material_names_are_read() {
        let path = write_fixture(
            "aliased.json",
            r#"{
                "alias": "cone",
                "vertices": [0,0,0, 1,0,0, 0,1,0],
                "indices": [0,1,2],
                "Kd": [0.2, 0.4, 0.6],
                "Ns": 4.0
            }"#,
        );
        let object = load_model(&path).unwrap();
        assert_eq!(object.alias.as_deref(), Some("cone"));
        assert_eq!(object.material.diffuse, [0.2, 0.4, 0.6, 1.0]);
        assert_eq!(object.material.specular_exponent, 4.0);
        fs::remove_file(path).ok();
    }

    #[test]
    fn optional_vertex_attributes_survive_loading() {
        let path = write_fixture(
            "attrs.json",
            r#"{
                "vertices": [0,0,0, 1,0,0, 0,1,0],
                "indices": [0,1,2],
                "scalars": [0.0, 0.5, 1.0],
                "textureCoords": [0,0, 1,0, 0,1]
            }"#,
        );
        let object = load_model(&path).unwrap();
        assert_eq!(object.scalars(), Some([0.0, 0.5, 1.0].as_slice()));
        assert_eq!(
            object.texture_coords(),
            Some([[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]].as_slice())
        );
        fs::remove_file(path).ok();
    }

    #[test]
    fn rejects_out_of_range_indices() {
        let path = write_fixture(
            "bad-index.json",
            r#"{ "vertices": [0,0,0, 1,0,0, 0,1,0], "indices": [0,1,9] }"#,
        );
        let err = load_model(&path).unwrap_err();
        assert!(matches!(err, AssetError::Geometry { .. }));
        fs::remove_file(path).ok();
    }

    #[test]
    fn rejects_unparseable_json() {
        let path = write_fixture("garbage.json", "not json at all");
        let err = load_model(&path).unwrap_err();
        assert!(matches!(err, AssetError::Parse { .. }));
        fs::remove_file(path).ok();
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_model(Path::new("/nonexistent/glint-model.json")).unwrap_err();
        assert!(matches!(err, AssetError::Io { .. }));
    }
}
