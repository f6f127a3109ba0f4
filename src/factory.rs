//! Turns scene-asset hierarchies into GPU-ready mesh data.
//!
//! The factory walks an `AssetNode` tree depth-first, builds one
//! `MeshData` per mesh-bearing node via `SubmeshBuilder`, resolves
//! textures through the optional collaborator and accumulates the
//! aggregate bounding box of everything it loaded.

use std::path::{Path, PathBuf};

use crate::data::{Aabb, AssetNode, MeshSource, SourceMesh};
use crate::error::LoadError;
use crate::layout::VertexLayout;
use crate::submesh::{SubmeshBuilder, SubmeshData};
use crate::textures::TextureLoader;

/// What to do when one submesh cannot be reconciled against the target
/// layout. The policy is explicit; there is no default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPolicy {
    /// The first bad submesh fails the whole load.
    AbortOnError,
    /// Bad submeshes are dropped and recorded; siblings still load.
    SkipInvalidSubmeshes,
}

/// Non-fatal conditions collected over one load and reported after it
/// completes instead of interrupting it.
#[derive(Debug, Default)]
pub struct LoadDiagnostics {
    /// Texture path and failure detail, one entry per unbound slot.
    pub texture_failures: Vec<(PathBuf, String)>,
    /// Submesh name and failure detail for submeshes dropped under
    /// `SkipInvalidSubmeshes`.
    pub skipped_submeshes: Vec<(String, String)>,
}

impl LoadDiagnostics {
    pub fn is_clean(&self) -> bool {
        self.texture_failures.is_empty() && self.skipped_submeshes.is_empty()
    }
}

/// CPU-side mesh: ordered submesh data plus the union of their bounds.
/// Upload via `Mesh::from_data` on the GL context thread.
#[derive(Debug)]
pub struct MeshData {
    pub name: String,
    pub submeshes: Vec<SubmeshData>,
    pub bounds: Aabb,
}

/// Result of one load: meshes in traversal order, the aggregate bounds
/// of the entire hierarchy and the non-fatal diagnostics.
#[derive(Debug)]
pub struct LoadOutput {
    pub meshes: Vec<MeshData>,
    pub bounds: Aabb,
    pub diagnostics: LoadDiagnostics,
}

pub struct MeshFactory {
    layout: VertexLayout,
    policy: LoadPolicy,
}

impl MeshFactory {
    pub fn new(layout: VertexLayout, policy: LoadPolicy) -> Self {
        Self { layout, policy }
    }

    /// Load from a file path. The format is resolved by extension and
    /// interpreted by the importer; the traversal afterwards is the
    /// same as for in-memory hierarchies.
    pub fn load_file(
        &self,
        path: impl AsRef<Path>,
        textures: Option<&mut dyn TextureLoader>,
    ) -> Result<LoadOutput, LoadError> {
        self.load_source(&MeshSource::File(path.as_ref().to_path_buf()), textures)
    }

    pub fn load_source(
        &self,
        source: &MeshSource,
        textures: Option<&mut dyn TextureLoader>,
    ) -> Result<LoadOutput, LoadError> {
        let root = source.root_node()?;
        self.load_node(&root, textures)
    }

    /// Load from an in-memory asset hierarchy: depth-first traversal,
    /// one mesh per mesh-bearing node, in traversal order.
    pub fn load_node(
        &self,
        root: &AssetNode,
        mut textures: Option<&mut dyn TextureLoader>,
    ) -> Result<LoadOutput, LoadError> {
        let builder = SubmeshBuilder::new(&self.layout);
        let mut meshes = Vec::new();
        let mut bounds = Aabb::empty();
        let mut diagnostics = LoadDiagnostics::default();

        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            if let Some(source_mesh) = &node.mesh {
                if let Some(mesh) =
                    self.build_mesh(&builder, source_mesh, &mut textures, &mut diagnostics)?
                {
                    bounds.union(&mesh.bounds);
                    meshes.push(mesh);
                }
            }
            for child in node.children.iter().rev() {
                stack.push(child);
            }
        }

        log::debug!(
            "loaded {} mesh(es) from '{}' ({} submesh(es) skipped, {} texture slot(s) unbound)",
            meshes.len(),
            root.name,
            diagnostics.skipped_submeshes.len(),
            diagnostics.texture_failures.len()
        );

        Ok(LoadOutput {
            meshes,
            bounds,
            diagnostics,
        })
    }

    fn build_mesh(
        &self,
        builder: &SubmeshBuilder,
        source: &SourceMesh,
        textures: &mut Option<&mut dyn TextureLoader>,
        diagnostics: &mut LoadDiagnostics,
    ) -> Result<Option<MeshData>, LoadError> {
        let mut submeshes = Vec::new();
        let mut bounds = Aabb::empty();

        for sub in &source.submeshes {
            let mut data = match builder.build(sub) {
                Ok(data) => data,
                Err(e) => match self.policy {
                    LoadPolicy::AbortOnError => return Err(e),
                    LoadPolicy::SkipInvalidSubmeshes => {
                        log::warn!("skipping submesh '{}': {e}", sub.name);
                        diagnostics
                            .skipped_submeshes
                            .push((sub.name.clone(), e.to_string()));
                        continue;
                    }
                },
            };

            // Texture failures never fail the submesh; the slot stays
            // unbound and the condition is reported afterwards.
            if let Some(loader) = textures.as_mut() {
                for path in &sub.textures {
                    match loader.load_texture(path) {
                        Ok(texture) => data.textures.push(Some(texture)),
                        Err(e) => {
                            log::warn!("submesh '{}': {e}", sub.name);
                            diagnostics
                                .texture_failures
                                .push((path.clone(), e.to_string()));
                            data.textures.push(None);
                        }
                    }
                }
            }

            bounds.union(&data.bounds);
            submeshes.push(data);
        }

        if submeshes.is_empty() {
            return match self.policy {
                LoadPolicy::AbortOnError => Err(LoadError::EmptyMesh {
                    name: source.name.clone(),
                }),
                LoadPolicy::SkipInvalidSubmeshes => {
                    log::warn!("mesh '{}' produced no drawable submeshes", source.name);
                    Ok(None)
                }
            };
        }

        Ok(Some(MeshData {
            name: source.name.clone(),
            submeshes,
            bounds,
        }))
    }
}
