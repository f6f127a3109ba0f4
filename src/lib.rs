//! Loads hierarchical scene assets (glTF files, procedural surfaces or
//! raw arrays) into GPU-ready meshes and dispatches OpenGL draw calls
//! against them.
//!
//! Data flows source → [`MeshFactory`] → [`MeshData`] → [`Mesh`] →
//! [`Renderer`]. Everything up to `MeshData` is CPU-side and can run
//! on worker threads; upload and drawing stay with the GL context.

pub mod data;
pub mod error;
pub mod factory;
pub mod layout;
pub mod loader;
pub mod mesh;
pub mod renderer;
pub mod shapes;
pub mod submesh;
pub mod textures;

pub use data::{
    Aabb, AssetNode, AttributeBlock, IndexBlock, IndexKind, MeshSource, RawArrayMesh, SourceMesh,
    SourceSubmesh, Topology,
};
pub use error::{LoadError, TextureError};
pub use factory::{LoadDiagnostics, LoadOutput, LoadPolicy, MeshData, MeshFactory};
pub use layout::{AttributeDescriptor, AttributeFormat, VertexLayout, VertexSemantic};
pub use loader::{AssetLoader, ImportedAsset};
pub use mesh::{Mesh, Submesh};
pub use renderer::Renderer;
pub use shapes::Shape;
pub use submesh::{SubmeshBuilder, SubmeshData};
pub use textures::{GlTextureLoader, TextureLoader};
