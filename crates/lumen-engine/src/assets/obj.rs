use std::path::Path;

use crate::scene::MeshData;

/// Loads every model in an OBJ file into one flattened mesh.
///
/// Faces are triangulated on load. Failure is logged and yields an empty
/// mesh, which the geometry pass skips.
pub fn load_mesh(path: &Path) -> MeshData {
    let options = tobj::LoadOptions {
        triangulate: true,
        single_index: false,
        ignore_points: true,
        ignore_lines: true,
        ..Default::default()
    };

    let models = match tobj::load_obj(path, &options) {
        Ok((models, _materials)) => models,
        Err(err) => {
            log::error!("failed to load mesh {}: {err}", path.display());
            return MeshData::default();
        }
    };

    let mut mesh = MeshData::default();
    for model in &models {
        mesh.append(MeshData::from_obj(&model.mesh));
    }

    if mesh.is_empty() {
        log::warn!("mesh {} has no triangles", path.display());
    } else {
        log::info!(
            "loaded mesh {} ({} models, {} vertices)",
            path.display(),
            models.len(),
            mesh.vertices.len()
        );
    }
    mesh
}
