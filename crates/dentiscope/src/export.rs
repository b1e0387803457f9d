//! Exporting visible scene geometry.
//!
//! An [`ExportConfig`] picks node categories (teeth, anatomy, landmarks) and
//! an output format. Only nodes with bound geometry are written, and only
//! when both the node and its category group are visible. Geometry is
//! written in source units, undoing the display normalization.

use std::path::{Path, PathBuf};

use dentiscope_core::scene::defaults::{ANATOMY, LANDMARKS, MODEL_NODE, TEETH};
use dentiscope_core::{Result, SceneGraph};
use dentiscope_mesh::{MeshBuffers, MeshFormat, NormalizedMesh};
use serde::{Deserialize, Serialize};

/// File stem of a merged export.
pub const MERGED_STEM: &str = "dental-model";

/// Output format of an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Stl,
    Obj,
    Ply,
}

impl From<ExportFormat> for MeshFormat {
    fn from(format: ExportFormat) -> Self {
        match format {
            ExportFormat::Stl => MeshFormat::Stl,
            ExportFormat::Obj => MeshFormat::Obj,
            ExportFormat::Ply => MeshFormat::Ply,
        }
    }
}

/// Which categories to export and how.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExportConfig {
    pub teeth: bool,
    pub anatomy: bool,
    pub landmarks: bool,
    /// Write one combined asset instead of one per node.
    pub merge_into_one: bool,
    pub format: ExportFormat,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            teeth: true,
            anatomy: true,
            landmarks: false,
            merge_into_one: false,
            format: ExportFormat::Stl,
        }
    }
}

impl ExportConfig {
    fn selects(&self, category: &str) -> bool {
        match category {
            TEETH => self.teeth,
            ANATOMY => self.anatomy,
            LANDMARKS => self.landmarks,
            _ => false,
        }
    }
}

/// One written file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedAsset {
    pub file_name: String,
    /// Scene nodes whose geometry went into this asset.
    pub node_ids: Vec<String>,
    pub bytes: Vec<u8>,
}

/// Scene nodes that currently have geometry bound to them.
fn bound_geometry<'a>(model: Option<&'a NormalizedMesh>) -> Vec<(&'static str, &'a NormalizedMesh)> {
    model
        .filter(|mesh| !mesh.is_placeholder())
        .map(|mesh| vec![(MODEL_NODE, mesh)])
        .unwrap_or_default()
}

/// Bound nodes that pass the category and visibility filters, in scene order.
fn selected<'a>(
    scene: &SceneGraph,
    model: Option<&'a NormalizedMesh>,
    config: &ExportConfig,
) -> Vec<(&'static str, &'a NormalizedMesh)> {
    bound_geometry(model)
        .into_iter()
        .filter(|(id, _)| {
            let Some(node) = scene.find(id) else {
                return false;
            };
            let Some(group) = scene.root_of(id) else {
                return false;
            };
            node.visible && group.visible && config.selects(group.id())
        })
        .collect()
}

/// Builds the export assets for the current scene.
///
/// Returns an empty list when nothing qualifies.
pub fn export(
    scene: &SceneGraph,
    model: Option<&NormalizedMesh>,
    config: &ExportConfig,
) -> Result<Vec<ExportedAsset>> {
    let format = MeshFormat::from(config.format);
    let parts = selected(scene, model, config);
    if parts.is_empty() {
        return Ok(Vec::new());
    }

    if config.merge_into_one {
        let sources: Vec<MeshBuffers> = parts.iter().map(|(_, mesh)| mesh.source_geometry()).collect();
        let merged = MeshBuffers::merge(&sources);
        let bytes = dentiscope_mesh::export::write(&merged, format)?;
        return Ok(vec![ExportedAsset {
            file_name: format!("{MERGED_STEM}.{}", format.extension()),
            node_ids: parts.iter().map(|(id, _)| (*id).to_string()).collect(),
            bytes,
        }]);
    }

    parts
        .into_iter()
        .map(|(id, mesh)| {
            let bytes = dentiscope_mesh::export::write(&mesh.source_geometry(), format)?;
            Ok(ExportedAsset {
                file_name: format!("{id}.{}", format.extension()),
                node_ids: vec![id.to_string()],
                bytes,
            })
        })
        .collect()
}

/// Writes assets into `dir` and returns the written paths.
pub fn write_assets(dir: impl AsRef<Path>, assets: &[ExportedAsset]) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;
    assets
        .iter()
        .map(|asset| {
            let path = dir.join(&asset.file_name);
            std::fs::write(&path, &asset.bytes)?;
            log::info!("exported {} ({} bytes)", path.display(), asset.bytes.len());
            Ok(path)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use dentiscope_core::scene::defaults::{SINUS, TEETH};
    use dentiscope_mesh::MeshFormat;

    const TETRA: &str = "v 0 0 0\nv 10 0 0\nv 0 10 0\nv 0 0 10\nf 1 3 2\nf 1 2 4\nf 1 4 3\nf 2 3 4\n";

    fn model() -> NormalizedMesh {
        dentiscope_mesh::load(TETRA.as_bytes(), MeshFormat::Obj).expect("valid obj")
    }

    #[test]
    fn test_separate_export_per_node() {
        let scene = SceneGraph::dental();
        let mesh = model();
        let assets = export(&scene, Some(&mesh), &ExportConfig::default()).expect("exported");
        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].file_name, "teeth.stl");
        assert_eq!(assets[0].node_ids, vec![TEETH.to_string()]);

        // Round trip through the writer keeps source units.
        let back = dentiscope_mesh::parse(&assets[0].bytes, MeshFormat::Stl).expect("valid stl");
        let extent = back.bounds().expect("non-empty").max_extent();
        assert!((extent - 10.0).abs() < 1e-3);
    }

    #[test]
    fn test_merged_export_name() {
        let scene = SceneGraph::dental();
        let mesh = model();
        let config = ExportConfig {
            merge_into_one: true,
            format: ExportFormat::Ply,
            ..ExportConfig::default()
        };
        let assets = export(&scene, Some(&mesh), &config).expect("exported");
        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].file_name, "dental-model.ply");
    }

    #[test]
    fn test_hidden_or_unselected_nodes_skipped() {
        let mesh = model();
        let hidden = SceneGraph::dental().toggle_visibility(TEETH).expect("known node");
        assert!(export(&hidden, Some(&mesh), &ExportConfig::default())
            .expect("exported")
            .is_empty());

        let config = ExportConfig {
            teeth: false,
            ..ExportConfig::default()
        };
        assert!(export(&SceneGraph::dental(), Some(&mesh), &config)
            .expect("exported")
            .is_empty());

        // Hiding an unrelated node does not affect the teeth export.
        let scene = SceneGraph::dental().toggle_visibility(SINUS).expect("known node");
        assert_eq!(export(&scene, Some(&mesh), &ExportConfig::default()).expect("exported").len(), 1);
    }

    #[test]
    fn test_placeholder_is_never_exported() {
        let placeholder = dentiscope_mesh::placeholder();
        let assets = export(&SceneGraph::dental(), Some(&placeholder), &ExportConfig::default())
            .expect("exported");
        assert!(assets.is_empty());
    }

    #[test]
    fn test_config_json_names() {
        let config: ExportConfig = serde_json::from_str(
            r#"{"teeth":true,"anatomy":false,"landmarks":true,"mergeIntoOne":true,"format":"obj"}"#,
        )
        .expect("valid config");
        assert!(config.merge_into_one);
        assert!(!config.anatomy);
        assert_eq!(config.format, ExportFormat::Obj);
    }
}
