use std::path::PathBuf;

use thiserror::Error;

use crate::data::Topology;
use crate::layout::VertexSemantic;

/// Fatal load failures. These abort the affected mesh (or the whole
/// load, depending on the configured policy).
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("unsupported model format: {0:?}")]
    UnsupportedFormat(PathBuf),

    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed asset: {0}")]
    MalformedAsset(String),

    #[error("unsupported primitive mode: {0}")]
    UnsupportedPrimitive(String),

    #[error("submesh '{name}' is missing the required position attribute")]
    MissingPosition { name: String },

    #[error(
        "submesh '{name}': attribute {semantic:?} has {found} components, layout expects {expected}"
    )]
    AttributeMismatch {
        name: String,
        semantic: VertexSemantic,
        found: u8,
        expected: u8,
    },

    #[error("duplicate attribute semantic {0:?} in vertex layout")]
    DuplicateSemantic(VertexSemantic),

    #[error("vertex layout does not declare a position attribute")]
    LayoutMissingPosition,

    #[error("submesh '{name}': index count {count} is invalid for {topology:?}")]
    InvalidIndexCount {
        name: String,
        count: usize,
        topology: Topology,
    },

    /// Contract violation in index buffer construction: the number of
    /// index blocks, index counts and index types must all agree.
    #[error("index buffer arity mismatch: {buffers} buffers, {counts} counts, {kinds} types")]
    IndexArityMismatch {
        buffers: usize,
        counts: usize,
        kinds: usize,
    },

    #[error("mesh '{name}' produced no drawable submeshes")]
    EmptyMesh { name: String },

    #[error("gpu resource creation failed: {0}")]
    Gpu(String),
}

/// Non-fatal, per-texture-slot failures. The affected submesh is still
/// built with that slot unbound; failures are aggregated into the load
/// diagnostics instead of aborting the load.
#[derive(Debug, Error)]
pub enum TextureError {
    #[error("texture {path:?} unavailable: {source}")]
    Unavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("texture {path:?} could not be decoded: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("texture {path:?}: gpu upload failed: {detail}")]
    Gpu { path: PathBuf, detail: String },
}
