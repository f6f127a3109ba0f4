//! Builds GPU-ready submesh records from raw source data.
//!
//! The builder reconciles whatever attribute blocks a source provides
//! against the target vertex layout: attributes in the layout but
//! missing from the source are synthesized with documented defaults,
//! attributes in the source but not in the layout are dropped, and
//! scalar conversion follows the format each descriptor declares.

use std::collections::HashMap;

use crate::data::{Aabb, AttributeBlock, IndexKind, SourceSubmesh, Topology};
use crate::error::LoadError;
use crate::layout::{GlVertexAttribute, VertexLayout, VertexSemantic};

/// Assembled index buffer bytes for one submesh.
#[derive(Debug, Clone)]
pub struct IndexData {
    pub bytes: Vec<u8>,
    pub count: i32,
    pub kind: IndexKind,
}

/// CPU-side result of building one submesh. Holds everything the GPU
/// upload step needs; no GL calls happen here, so builds can run on
/// worker threads.
#[derive(Debug, Clone)]
pub struct SubmeshData {
    pub name: String,
    pub vertex_count: usize,
    /// One byte blob per layout buffer index.
    pub vertex_buffers: Vec<Vec<u8>>,
    pub attributes: Vec<GlVertexAttribute>,
    pub strides: Vec<i32>,
    pub indices: Option<IndexData>,
    pub topology: Topology,
    /// Resolved texture handles in binding-slot order; `None` marks a
    /// slot whose texture could not be resolved.
    pub textures: Vec<Option<glow::NativeTexture>>,
    pub bounds: Aabb,
}

/// The number of index blocks, counts and element types supplied to a
/// build call must all equal the number of submeshes being built.
pub fn validate_index_arity(buffers: usize, counts: usize, kinds: usize) -> Result<(), LoadError> {
    if buffers == counts && counts == kinds {
        Ok(())
    } else {
        Err(LoadError::IndexArityMismatch {
            buffers,
            counts,
            kinds,
        })
    }
}

pub struct SubmeshBuilder<'a> {
    layout: &'a VertexLayout,
}

impl<'a> SubmeshBuilder<'a> {
    pub fn new(layout: &'a VertexLayout) -> Self {
        Self { layout }
    }

    pub fn build(&self, source: &SourceSubmesh) -> Result<SubmeshData, LoadError> {
        let vertex_buffers =
            self.assemble_vertex_buffers(&source.name, &source.attributes, source.vertex_count)?;

        let position = source
            .attributes
            .get(&VertexSemantic::Position)
            .ok_or_else(|| LoadError::MissingPosition {
                name: source.name.clone(),
            })?;
        let bounds = Aabb::from_positions(position);

        let indices = match &source.indices {
            Some(block) => {
                let count = block.len();
                if !source.topology.valid_count(count) {
                    return Err(LoadError::InvalidIndexCount {
                        name: source.name.clone(),
                        count,
                        topology: source.topology,
                    });
                }
                Some(IndexData {
                    bytes: block.to_bytes(),
                    count: count as i32,
                    kind: block.kind(),
                })
            }
            None => {
                // Non-indexed draw; the vertex count itself must form
                // whole primitives.
                if !source.topology.valid_count(source.vertex_count) {
                    return Err(LoadError::InvalidIndexCount {
                        name: source.name.clone(),
                        count: source.vertex_count,
                        topology: source.topology,
                    });
                }
                None
            }
        };

        Ok(SubmeshData {
            name: source.name.clone(),
            vertex_count: source.vertex_count,
            vertex_buffers,
            attributes: self.layout.gl_attributes(),
            strides: (0..self.layout.buffer_count())
                .map(|b| self.layout.stride(b) as i32)
                .collect(),
            indices,
            topology: source.topology,
            textures: Vec::new(),
            bounds,
        })
    }

    /// Interleaves (or keeps planar, per the layout's buffer indices)
    /// the source blocks into one byte blob per layout buffer. Every
    /// returned blob's length equals `vertex_count` times that
    /// buffer's stride.
    pub fn assemble_vertex_buffers(
        &self,
        name: &str,
        attributes: &HashMap<VertexSemantic, AttributeBlock>,
        vertex_count: usize,
    ) -> Result<Vec<Vec<u8>>, LoadError> {
        let mut buffers: Vec<Vec<u8>> = (0..self.layout.buffer_count())
            .map(|b| vec![0u8; vertex_count * self.layout.stride(b)])
            .collect();

        for descriptor in self.layout.attributes() {
            let stride = self.layout.stride(descriptor.buffer_index);
            let width = descriptor.format.byte_width();
            let components = descriptor.components as usize;
            let buffer = &mut buffers[descriptor.buffer_index];

            match attributes.get(&descriptor.semantic) {
                Some(block) => {
                    if block.components != descriptor.components {
                        return Err(LoadError::AttributeMismatch {
                            name: name.to_owned(),
                            semantic: descriptor.semantic,
                            found: block.components,
                            expected: descriptor.components,
                        });
                    }
                    if block.count() != vertex_count {
                        return Err(LoadError::MalformedAsset(format!(
                            "submesh '{name}': attribute {:?} has {} vertices, expected {vertex_count}",
                            descriptor.semantic,
                            block.count()
                        )));
                    }
                    for v in 0..vertex_count {
                        let base = v * stride + descriptor.offset;
                        for c in 0..components {
                            let value = block.data[v * components + c];
                            descriptor
                                .format
                                .put(value, &mut buffer[base + c * width..]);
                        }
                    }
                }
                None => {
                    if descriptor.semantic == VertexSemantic::Position {
                        return Err(LoadError::MissingPosition {
                            name: name.to_owned(),
                        });
                    }
                    let default = descriptor.semantic.default_value();
                    for v in 0..vertex_count {
                        let base = v * stride + descriptor.offset;
                        for c in 0..components {
                            descriptor
                                .format
                                .put(default[c], &mut buffer[base + c * width..]);
                        }
                    }
                }
            }
        }

        Ok(buffers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::IndexBlock;
    use crate::layout::AttributeFormat;

    fn positions(n: usize) -> AttributeBlock {
        AttributeBlock::vec3(&vec![[1.0, 2.0, 3.0]; n])
    }

    fn source(
        name: &str,
        vertex_count: usize,
        attributes: HashMap<VertexSemantic, AttributeBlock>,
        indices: Option<IndexBlock>,
    ) -> SourceSubmesh {
        SourceSubmesh {
            name: name.into(),
            vertex_count,
            attributes,
            indices,
            topology: Topology::Triangles,
            textures: Vec::new(),
        }
    }

    #[test]
    fn buffer_length_is_vertex_count_times_stride() {
        let layout = VertexLayout::position_normal_uv();
        let builder = SubmeshBuilder::new(&layout);
        let attributes = HashMap::from([(VertexSemantic::Position, positions(6))]);
        let data = builder
            .build(&source("s", 6, attributes, Some(IndexBlock::U16(vec![0; 6]))))
            .unwrap();
        assert_eq!(data.vertex_buffers.len(), 1);
        assert_eq!(data.vertex_buffers[0].len(), 6 * layout.stride(0));
    }

    #[test]
    fn missing_normals_are_synthesized_as_zero() {
        let layout = VertexLayout::position_normal_uv();
        let builder = SubmeshBuilder::new(&layout);
        let attributes = HashMap::from([(VertexSemantic::Position, positions(2))]);
        let buffers = builder.assemble_vertex_buffers("s", &attributes, 2).unwrap();

        // Normal lives at offset 12 of a 32-byte vertex.
        let v0_normal = &buffers[0][12..24];
        for chunk in v0_normal.chunks_exact(4) {
            assert_eq!(f32::from_ne_bytes(chunk.try_into().unwrap()), 0.0);
        }
    }

    #[test]
    fn source_attributes_outside_the_layout_are_dropped() {
        let layout =
            VertexLayout::packed(&[(VertexSemantic::Position, AttributeFormat::F32, 3)]).unwrap();
        let builder = SubmeshBuilder::new(&layout);
        let attributes = HashMap::from([
            (VertexSemantic::Position, positions(4)),
            (VertexSemantic::Color, AttributeBlock::vec4(&[[1.0; 4]; 4])),
        ]);
        let buffers = builder.assemble_vertex_buffers("s", &attributes, 4).unwrap();
        assert_eq!(buffers[0].len(), 4 * 12);
    }

    #[test]
    fn colors_narrow_to_unorm8_on_request() {
        let layout = VertexLayout::packed(&[
            (VertexSemantic::Position, AttributeFormat::F32, 3),
            (VertexSemantic::Color, AttributeFormat::U8Norm, 4),
        ])
        .unwrap();
        let builder = SubmeshBuilder::new(&layout);
        let attributes = HashMap::from([
            (VertexSemantic::Position, positions(1)),
            (
                VertexSemantic::Color,
                AttributeBlock::vec4(&[[1.0, 0.5, 0.0, 1.0]]),
            ),
        ]);
        let buffers = builder.assemble_vertex_buffers("s", &attributes, 1).unwrap();
        assert_eq!(&buffers[0][12..16], &[255, 128, 0, 255]);
    }

    #[test]
    fn component_count_mismatch_fails() {
        let layout = VertexLayout::position_normal_uv();
        let builder = SubmeshBuilder::new(&layout);
        let attributes = HashMap::from([
            (VertexSemantic::Position, positions(2)),
            (VertexSemantic::Normal, AttributeBlock::vec4(&[[0.0; 4]; 2])),
        ]);
        let result = builder.assemble_vertex_buffers("s", &attributes, 2);
        assert!(matches!(
            result,
            Err(LoadError::AttributeMismatch { found: 4, expected: 3, .. })
        ));
    }

    #[test]
    fn missing_position_is_fatal() {
        let layout = VertexLayout::position_normal_uv();
        let builder = SubmeshBuilder::new(&layout);
        let result = builder.build(&source("bare", 3, HashMap::new(), None));
        assert!(matches!(result, Err(LoadError::MissingPosition { .. })));
    }

    #[test]
    fn triangle_list_rejects_partial_triangles() {
        let layout = VertexLayout::position_normal_uv();
        let builder = SubmeshBuilder::new(&layout);
        let attributes = HashMap::from([(VertexSemantic::Position, positions(4))]);
        let result = builder.build(&source(
            "s",
            4,
            attributes,
            Some(IndexBlock::U16(vec![0, 1, 2, 3])),
        ));
        assert!(matches!(result, Err(LoadError::InvalidIndexCount { count: 4, .. })));
    }

    #[test]
    fn planar_layout_fills_every_buffer() {
        let layout = VertexLayout::separate(&[
            (VertexSemantic::Position, AttributeFormat::F32, 3),
            (VertexSemantic::TexCoord0, AttributeFormat::F32, 2),
        ])
        .unwrap();
        let builder = SubmeshBuilder::new(&layout);
        let attributes = HashMap::from([
            (VertexSemantic::Position, positions(5)),
            (
                VertexSemantic::TexCoord0,
                AttributeBlock::vec2(&[[0.25, 0.75]; 5]),
            ),
        ]);
        let buffers = builder.assemble_vertex_buffers("s", &attributes, 5).unwrap();
        assert_eq!(buffers.len(), 2);
        assert_eq!(buffers[0].len(), 5 * 12);
        assert_eq!(buffers[1].len(), 5 * 8);
    }

    #[test]
    fn index_width_follows_the_source_block() {
        let layout = VertexLayout::position_normal_uv();
        let builder = SubmeshBuilder::new(&layout);
        let attributes = HashMap::from([(VertexSemantic::Position, positions(3))]);
        let data = builder
            .build(&source(
                "s",
                3,
                attributes,
                Some(IndexBlock::U32(vec![0, 1, 2])),
            ))
            .unwrap();
        let indices = data.indices.unwrap();
        assert_eq!(indices.kind, IndexKind::U32);
        assert_eq!(indices.count, 3);
        assert_eq!(indices.bytes.len(), 12);
    }

    #[test]
    fn arity_mismatch_is_reported() {
        assert!(matches!(
            validate_index_arity(2, 3, 2),
            Err(LoadError::IndexArityMismatch {
                buffers: 2,
                counts: 3,
                kinds: 2
            })
        ));
        assert!(validate_index_arity(2, 2, 2).is_ok());
    }
}
