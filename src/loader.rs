//! File import and background loading.
//!
//! `import_file` resolves a model path to the normalized `AssetNode`
//! hierarchy; the format is keyed by file extension (glTF and GLB).
//! `AssetLoader` runs imports on a worker thread so the GL context
//! thread only polls for finished CPU-side hierarchies and does the
//! uploads itself.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crossbeam_channel::{unbounded, Receiver, Sender};
use gltf::buffer::Source;
use gltf::mesh::util::ReadIndices;
use gltf::Gltf;

use crate::data::{AssetNode, AttributeBlock, IndexBlock, MeshSource, SourceMesh, SourceSubmesh, Topology};
use crate::error::LoadError;
use crate::layout::VertexSemantic;

/// Import a model file into an asset hierarchy. Only glTF/GLB are
/// understood; other extensions fail with `UnsupportedFormat`.
pub fn import_file(path: &Path) -> Result<AssetNode, LoadError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("gltf") | Some("glb") => import_gltf(path),
        _ => Err(LoadError::UnsupportedFormat(path.to_path_buf())),
    }
}

fn import_gltf(path: &Path) -> Result<AssetNode, LoadError> {
    let gltf = Gltf::open(path)
        .map_err(|e| LoadError::MalformedAsset(format!("{path:?}: {e}")))?;

    let base_dir = path.parent().unwrap_or_else(|| Path::new("")).to_path_buf();
    let blob = gltf.blob.clone();

    // Pull every buffer the document references into memory up front.
    let mut raw_buffers = Vec::new();
    for buffer in gltf.buffers() {
        let data = match buffer.source() {
            Source::Uri(uri) => {
                let buffer_path = base_dir.join(uri);
                std::fs::read(&buffer_path).map_err(|e| LoadError::Io {
                    path: buffer_path,
                    source: e,
                })?
            }
            Source::Bin => blob
                .clone()
                .ok_or_else(|| LoadError::MalformedAsset("GLB binary chunk missing".into()))?,
        };
        raw_buffers.push(data);
    }

    let root_name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "asset".to_owned());

    let scene = gltf
        .default_scene()
        .or_else(|| gltf.scenes().next())
        .ok_or_else(|| LoadError::MalformedAsset(format!("{path:?}: no scene")))?;

    let children = scene
        .nodes()
        .map(|node| import_node(&node, &raw_buffers, &base_dir))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(AssetNode {
        name: root_name,
        mesh: None,
        children,
    })
}

fn import_node(
    node: &gltf::Node,
    buffers: &[Vec<u8>],
    base_dir: &Path,
) -> Result<AssetNode, LoadError> {
    let name = node
        .name()
        .map(str::to_owned)
        .unwrap_or_else(|| format!("node.{}", node.index()));

    let mesh = node
        .mesh()
        .map(|mesh| import_mesh(&mesh, buffers, base_dir))
        .transpose()?;

    let children = node
        .children()
        .map(|child| import_node(&child, buffers, base_dir))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(AssetNode {
        name,
        mesh,
        children,
    })
}

fn import_mesh(
    mesh: &gltf::Mesh,
    buffers: &[Vec<u8>],
    base_dir: &Path,
) -> Result<SourceMesh, LoadError> {
    let mesh_name = mesh
        .name()
        .map(str::to_owned)
        .unwrap_or_else(|| format!("mesh.{}", mesh.index()));

    let mut submeshes = Vec::new();
    for (pi, primitive) in mesh.primitives().enumerate() {
        let name = format!("{mesh_name}.{pi}");
        let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|v| v.as_slice()));

        let mut attributes = HashMap::new();

        if let Some(positions) = reader.read_positions() {
            attributes.insert(
                VertexSemantic::Position,
                AttributeBlock::vec3(&positions.collect::<Vec<_>>()),
            );
        }
        if let Some(normals) = reader.read_normals() {
            attributes.insert(
                VertexSemantic::Normal,
                AttributeBlock::vec3(&normals.collect::<Vec<_>>()),
            );
        }
        if let Some(tangents) = reader.read_tangents() {
            attributes.insert(
                VertexSemantic::Tangent,
                AttributeBlock::vec4(&tangents.collect::<Vec<_>>()),
            );
        }
        if let Some(uvs) = reader.read_tex_coords(0) {
            attributes.insert(
                VertexSemantic::TexCoord0,
                AttributeBlock::vec2(&uvs.into_f32().collect::<Vec<_>>()),
            );
        }
        if let Some(uvs) = reader.read_tex_coords(1) {
            attributes.insert(
                VertexSemantic::TexCoord1,
                AttributeBlock::vec2(&uvs.into_f32().collect::<Vec<_>>()),
            );
        }
        if let Some(colors) = reader.read_colors(0) {
            attributes.insert(
                VertexSemantic::Color,
                AttributeBlock::vec4(&colors.into_rgba_f32().collect::<Vec<_>>()),
            );
        }
        if let Some(joints) = reader.read_joints(0) {
            let data = joints
                .into_u16()
                .flat_map(|j| j.map(f32::from))
                .collect::<Vec<_>>();
            attributes.insert(VertexSemantic::Joints, AttributeBlock::new(4, data));
        }
        if let Some(weights) = reader.read_weights(0) {
            attributes.insert(
                VertexSemantic::Weights,
                AttributeBlock::vec4(&weights.into_f32().collect::<Vec<_>>()),
            );
        }

        let vertex_count = attributes
            .get(&VertexSemantic::Position)
            .map(AttributeBlock::count)
            .or_else(|| attributes.values().next().map(AttributeBlock::count))
            .unwrap_or(0);

        let topology = match primitive.mode() {
            gltf::mesh::Mode::Points => Topology::Points,
            gltf::mesh::Mode::Lines => Topology::Lines,
            gltf::mesh::Mode::LineStrip => Topology::LineStrip,
            gltf::mesh::Mode::Triangles => Topology::Triangles,
            gltf::mesh::Mode::TriangleStrip => Topology::TriangleStrip,
            gltf::mesh::Mode::TriangleFan => Topology::TriangleFan,
            gltf::mesh::Mode::LineLoop => {
                return Err(LoadError::UnsupportedPrimitive(format!(
                    "submesh '{name}': line loop"
                )))
            }
        };

        // Source index widths are preserved. 8-bit indices have no
        // 16/32-bit home, so they widen to u16.
        let indices = reader.read_indices().map(|read| match read {
            ReadIndices::U8(it) => IndexBlock::U16(it.map(u16::from).collect()),
            ReadIndices::U16(it) => IndexBlock::U16(it.collect()),
            ReadIndices::U32(it) => IndexBlock::U32(it.collect()),
        });

        submeshes.push(SourceSubmesh {
            name,
            vertex_count,
            attributes,
            indices,
            topology,
            textures: material_textures(&primitive.material(), base_dir),
        });
    }

    Ok(SourceMesh {
        name: mesh_name,
        submeshes,
    })
}

/// Texture paths referenced by a material, in binding-slot order:
/// base color, metallic-roughness, normal, occlusion, emissive.
/// Absent and embedded images contribute no slot.
fn material_textures(material: &gltf::Material, base_dir: &Path) -> Vec<PathBuf> {
    let pbr = material.pbr_metallic_roughness();
    let candidates = [
        pbr.base_color_texture().map(|info| info.texture()),
        pbr.metallic_roughness_texture().map(|info| info.texture()),
        material.normal_texture().map(|info| info.texture()),
        material.occlusion_texture().map(|info| info.texture()),
        material.emissive_texture().map(|info| info.texture()),
    ];

    let mut paths = Vec::new();
    for texture in candidates.into_iter().flatten() {
        match texture.source().source() {
            gltf::image::Source::Uri { uri, .. } => paths.push(base_dir.join(uri)),
            gltf::image::Source::View { .. } => {
                log::debug!("embedded image on texture {} skipped", texture.index());
            }
        }
    }
    paths
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AssetHandle(pub usize);

pub enum AssetRequest {
    ImportMesh { name: String, source: MeshSource },
}

/// One finished background import. The hierarchy is CPU-side only;
/// buffer and texture upload stay with whoever owns the GL context.
pub struct ImportedAsset {
    pub handle: AssetHandle,
    pub name: String,
    pub result: Result<AssetNode, LoadError>,
}

/// Worker-thread importer. Requests go in over a channel, finished
/// hierarchies are polled back out. Independent imports share nothing,
/// so a single worker is enough and keeps ordering predictable.
pub struct AssetLoader {
    request_tx: Sender<AssetRequest>,
    result_rx: Receiver<ImportedAsset>,
}

impl AssetLoader {
    pub fn new() -> Self {
        let (request_tx, request_rx) = unbounded::<AssetRequest>();
        let (result_tx, result_rx) = unbounded::<ImportedAsset>();

        std::thread::spawn(move || {
            let mut next_id = 0usize;
            for request in request_rx {
                match request {
                    AssetRequest::ImportMesh { name, source } => {
                        log::info!("importing mesh asset '{name}'");
                        let result = source.root_node();
                        if let Err(e) = &result {
                            log::error!("import of '{name}' failed: {e}");
                        }

                        let handle = AssetHandle(next_id);
                        next_id += 1;

                        if result_tx
                            .send(ImportedAsset {
                                handle,
                                name,
                                result,
                            })
                            .is_err()
                        {
                            // Receiver dropped; the loader is done.
                            break;
                        }
                    }
                }
            }
        });

        Self {
            request_tx,
            result_rx,
        }
    }

    pub fn request_import(&self, name: impl Into<String>, source: MeshSource) {
        let request = AssetRequest::ImportMesh {
            name: name.into(),
            source,
        };
        if let Err(e) = self.request_tx.send(request) {
            log::error!("asset loader worker is gone: {e}");
        }
    }

    /// Drain every finished import without blocking.
    pub fn poll_loaded(&self) -> Vec<ImportedAsset> {
        let mut loaded = Vec::new();
        while let Ok(asset) = self.result_rx.try_recv() {
            loaded.push(asset);
        }
        loaded
    }
}

impl Default for AssetLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;
    use crate::shapes::Shape;

    #[test]
    fn unknown_extension_is_unsupported() {
        let result = import_file(Path::new("model.fbx"));
        assert!(matches!(result, Err(LoadError::UnsupportedFormat(_))));
    }

    #[test]
    fn missing_gltf_file_is_malformed() {
        let result = import_file(Path::new("/nonexistent/model.gltf"));
        assert!(matches!(result, Err(LoadError::MalformedAsset(_))));
    }

    #[test]
    fn background_import_round_trips() {
        let loader = AssetLoader::new();
        loader.request_import(
            "unit-cube",
            MeshSource::Procedural(Shape::Cube { size: 1.0 }),
        );

        let deadline = Instant::now() + Duration::from_secs(5);
        let mut results = Vec::new();
        while results.is_empty() && Instant::now() < deadline {
            results = loader.poll_loaded();
            std::thread::sleep(Duration::from_millis(5));
        }

        assert_eq!(results.len(), 1);
        let asset = &results[0];
        assert_eq!(asset.handle, AssetHandle(0));
        assert_eq!(asset.name, "unit-cube");
        assert!(asset.result.as_ref().unwrap().mesh.is_some());
    }
}
