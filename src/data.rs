use std::collections::HashMap;
use std::path::PathBuf;

use cgmath::Vector3;

use crate::error::LoadError;
use crate::layout::VertexSemantic;
use crate::shapes::Shape;

/// How indices group into primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Topology {
    Points,
    Lines,
    LineStrip,
    #[default]
    Triangles,
    TriangleStrip,
    TriangleFan,
}

impl Topology {
    pub fn gl_mode(&self) -> u32 {
        match self {
            Self::Points => glow::POINTS,
            Self::Lines => glow::LINES,
            Self::LineStrip => glow::LINE_STRIP,
            Self::Triangles => glow::TRIANGLES,
            Self::TriangleStrip => glow::TRIANGLE_STRIP,
            Self::TriangleFan => glow::TRIANGLE_FAN,
        }
    }

    /// Whether `count` elements can form whole primitives of this
    /// topology.
    pub fn valid_count(&self, count: usize) -> bool {
        match self {
            Self::Points => true,
            Self::Lines => count % 2 == 0,
            Self::LineStrip => count == 0 || count >= 2,
            Self::Triangles => count % 3 == 0,
            Self::TriangleStrip | Self::TriangleFan => count == 0 || count >= 3,
        }
    }
}

/// Index element width. Source widths are preserved; nothing is
/// widened to 32 bits just because another submesh needed it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexKind {
    U16,
    U32,
}

impl IndexKind {
    pub fn byte_width(&self) -> usize {
        match self {
            Self::U16 => 2,
            Self::U32 => 4,
        }
    }

    pub fn gl_type(&self) -> u32 {
        match self {
            Self::U16 => glow::UNSIGNED_SHORT,
            Self::U32 => glow::UNSIGNED_INT,
        }
    }
}

/// One source index buffer, typed per submesh (element types are not
/// assumed uniform across a mesh).
#[derive(Debug, Clone)]
pub enum IndexBlock {
    U16(Vec<u16>),
    U32(Vec<u32>),
}

impl IndexBlock {
    pub fn kind(&self) -> IndexKind {
        match self {
            Self::U16(_) => IndexKind::U16,
            Self::U32(_) => IndexKind::U32,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::U16(v) => v.len(),
            Self::U32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the first `count` elements.
    pub fn truncated(&self, count: usize) -> Self {
        match self {
            Self::U16(v) => Self::U16(v[..count].to_vec()),
            Self::U32(v) => Self::U32(v[..count].to_vec()),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::U16(v) => bytemuck::cast_slice(v).to_vec(),
            Self::U32(v) => bytemuck::cast_slice(v).to_vec(),
        }
    }
}

/// Raw data for one vertex attribute, canonicalized to f32 scalars.
/// `data.len()` must equal vertex count times `components`.
#[derive(Debug, Clone)]
pub struct AttributeBlock {
    pub components: u8,
    pub data: Vec<f32>,
}

impl AttributeBlock {
    pub fn new(components: u8, data: Vec<f32>) -> Self {
        Self { components, data }
    }

    pub fn vec2(values: &[[f32; 2]]) -> Self {
        Self::new(2, bytemuck::cast_slice(values).to_vec())
    }

    pub fn vec3(values: &[[f32; 3]]) -> Self {
        Self::new(3, bytemuck::cast_slice(values).to_vec())
    }

    pub fn vec4(values: &[[f32; 4]]) -> Self {
        Self::new(4, bytemuck::cast_slice(values).to_vec())
    }

    pub fn count(&self) -> usize {
        self.data.len() / self.components as usize
    }
}

/// One drawable unit of a source mesh: a single topology, a single
/// index type and a semantic-keyed set of attribute blocks. Texture
/// paths are in binding-slot order.
#[derive(Debug, Clone)]
pub struct SourceSubmesh {
    pub name: String,
    pub vertex_count: usize,
    pub attributes: HashMap<VertexSemantic, AttributeBlock>,
    pub indices: Option<IndexBlock>,
    pub topology: Topology,
    pub textures: Vec<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct SourceMesh {
    pub name: String,
    pub submeshes: Vec<SourceSubmesh>,
}

/// Node of a scene-asset hierarchy. Meshes hang off nodes; children
/// are traversed depth-first in order.
#[derive(Debug, Clone)]
pub struct AssetNode {
    pub name: String,
    pub mesh: Option<SourceMesh>,
    pub children: Vec<AssetNode>,
}

impl AssetNode {
    pub fn leaf(name: impl Into<String>, mesh: SourceMesh) -> Self {
        Self {
            name: name.into(),
            mesh: Some(mesh),
            children: Vec::new(),
        }
    }

    pub fn group(name: impl Into<String>, children: Vec<AssetNode>) -> Self {
        Self {
            name: name.into(),
            mesh: None,
            children,
        }
    }
}

/// Mesh constructed from caller-supplied arrays. The attribute map is
/// shared by every submesh; each index block becomes one submesh. The
/// block, count and kind lists must have equal arity.
#[derive(Debug, Clone)]
pub struct RawArrayMesh {
    pub name: String,
    pub vertex_count: usize,
    pub attributes: HashMap<VertexSemantic, AttributeBlock>,
    pub topology: Topology,
    pub index_blocks: Vec<IndexBlock>,
    pub index_counts: Vec<u32>,
    pub index_kinds: Vec<IndexKind>,
}

impl RawArrayMesh {
    pub fn to_node(&self) -> Result<AssetNode, LoadError> {
        crate::submesh::validate_index_arity(
            self.index_blocks.len(),
            self.index_counts.len(),
            self.index_kinds.len(),
        )?;

        let mut submeshes = Vec::new();
        if self.index_blocks.is_empty() {
            // Indexing may not be provided; draw the arrays directly.
            submeshes.push(SourceSubmesh {
                name: self.name.clone(),
                vertex_count: self.vertex_count,
                attributes: self.attributes.clone(),
                indices: None,
                topology: self.topology,
                textures: Vec::new(),
            });
        } else {
            for (i, block) in self.index_blocks.iter().enumerate() {
                let count = self.index_counts[i] as usize;
                let kind = self.index_kinds[i];
                if kind != block.kind() {
                    return Err(LoadError::MalformedAsset(format!(
                        "raw mesh '{}': index buffer {i} is {:?} but was declared {kind:?}",
                        self.name,
                        block.kind()
                    )));
                }
                if count > block.len() {
                    return Err(LoadError::MalformedAsset(format!(
                        "raw mesh '{}': index count {count} exceeds buffer length {}",
                        self.name,
                        block.len()
                    )));
                }
                submeshes.push(SourceSubmesh {
                    name: format!("{}.{i}", self.name),
                    vertex_count: self.vertex_count,
                    attributes: self.attributes.clone(),
                    indices: Some(block.truncated(count)),
                    topology: self.topology,
                    textures: Vec::new(),
                });
            }
        }

        Ok(AssetNode::leaf(
            self.name.clone(),
            SourceMesh {
                name: self.name.clone(),
                submeshes,
            },
        ))
    }
}

/// Where mesh data comes from. All variants normalize into the same
/// `AssetNode` hierarchy before building.
#[derive(Debug, Clone)]
pub enum MeshSource {
    /// Model file resolved by extension (glTF/GLB).
    File(PathBuf),
    /// Parametric surface generation.
    Procedural(Shape),
    /// Caller-supplied vertex/index arrays.
    RawArrays(RawArrayMesh),
}

impl MeshSource {
    pub fn root_node(&self) -> Result<AssetNode, LoadError> {
        match self {
            Self::File(path) => crate::loader::import_file(path),
            Self::Procedural(shape) => Ok(shape.generate()),
            Self::RawArrays(raw) => raw.to_node(),
        }
    }
}

/// Axis-aligned bounding box in the asset's local space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vector3<f32>,
    pub max: Vector3<f32>,
}

impl Aabb {
    pub fn empty() -> Self {
        Self {
            min: Vector3::new(f32::INFINITY, f32::INFINITY, f32::INFINITY),
            max: Vector3::new(f32::NEG_INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x
    }

    pub fn include(&mut self, point: [f32; 3]) {
        self.min.x = self.min.x.min(point[0]);
        self.min.y = self.min.y.min(point[1]);
        self.min.z = self.min.z.min(point[2]);
        self.max.x = self.max.x.max(point[0]);
        self.max.y = self.max.y.max(point[1]);
        self.max.z = self.max.z.max(point[2]);
    }

    pub fn union(&mut self, other: &Aabb) {
        if other.is_empty() {
            return;
        }
        self.include([other.min.x, other.min.y, other.min.z]);
        self.include([other.max.x, other.max.y, other.max.z]);
    }

    /// Bounds of a position block (first three components per vertex).
    pub fn from_positions(block: &AttributeBlock) -> Self {
        let mut bounds = Self::empty();
        let stride = block.components as usize;
        if stride < 3 {
            return bounds;
        }
        for vertex in block.data.chunks_exact(stride) {
            bounds.include([vertex[0], vertex[1], vertex[2]]);
        }
        bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aabb_union_ignores_empty_operands() {
        let mut a = Aabb::empty();
        a.include([1.0, 2.0, 3.0]);
        let before = a;
        a.union(&Aabb::empty());
        assert_eq!(a, before);
    }

    #[test]
    fn aabb_from_positions_spans_all_vertices() {
        let block = AttributeBlock::vec3(&[[-1.0, 0.0, 2.0], [3.0, -4.0, 0.5]]);
        let bounds = Aabb::from_positions(&block);
        assert_eq!(bounds.min, Vector3::new(-1.0, -4.0, 0.5));
        assert_eq!(bounds.max, Vector3::new(3.0, 0.0, 2.0));
    }

    #[test]
    fn raw_mesh_rejects_mismatched_index_declaration() {
        let raw = RawArrayMesh {
            name: "raw".into(),
            vertex_count: 3,
            attributes: HashMap::from([(
                VertexSemantic::Position,
                AttributeBlock::vec3(&[[0.0; 3]; 3]),
            )]),
            topology: Topology::Triangles,
            index_blocks: vec![IndexBlock::U32(vec![0, 1, 2])],
            index_counts: vec![3],
            index_kinds: vec![IndexKind::U16],
        };
        assert!(matches!(raw.to_node(), Err(LoadError::MalformedAsset(_))));
    }
}
