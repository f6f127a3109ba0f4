//! Parametric surface generation. Each shape produces the same
//! normalized `AssetNode` hierarchy the file importer does, so
//! procedural geometry flows through the factory unchanged.

use std::collections::HashMap;
use std::f32::consts::PI;

use crate::data::{AssetNode, AttributeBlock, IndexBlock, SourceMesh, SourceSubmesh, Topology};
use crate::layout::VertexSemantic;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    /// Cube of side `size` centered at the origin.
    Cube { size: f32 },
    /// Rectangle in the XZ plane centered at the origin, facing +Y.
    Plane { width: f32, depth: f32 },
    /// UV sphere from parametric equations. `segments` around the
    /// equator, `rings` from pole to pole; values below 3 segments or
    /// 2 rings are clamped up to keep the surface non-degenerate.
    Sphere {
        radius: f32,
        segments: u32,
        rings: u32,
    },
}

impl Shape {
    pub fn generate(&self) -> AssetNode {
        match *self {
            Self::Cube { size } => cube(size),
            Self::Plane { width, depth } => plane(width, depth),
            Self::Sphere {
                radius,
                segments,
                rings,
            } => sphere(radius, segments, rings),
        }
    }
}

fn submesh_node(
    name: &str,
    positions: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    texcoords: Vec<[f32; 2]>,
    indices: IndexBlock,
) -> AssetNode {
    let vertex_count = positions.len();
    let attributes = HashMap::from([
        (VertexSemantic::Position, AttributeBlock::vec3(&positions)),
        (VertexSemantic::Normal, AttributeBlock::vec3(&normals)),
        (VertexSemantic::TexCoord0, AttributeBlock::vec2(&texcoords)),
    ]);
    AssetNode::leaf(
        name,
        SourceMesh {
            name: name.to_owned(),
            submeshes: vec![SourceSubmesh {
                name: name.to_owned(),
                vertex_count,
                attributes,
                indices: Some(indices),
                topology: Topology::Triangles,
                textures: Vec::new(),
            }],
        },
    )
}

fn cube(size: f32) -> AssetNode {
    let h = size * 0.5;

    // Four corners per face, counter-clockwise seen from outside.
    let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
        ([0.0, 0.0, 1.0], [[-h, -h, h], [h, -h, h], [h, h, h], [-h, h, h]]),
        ([0.0, 0.0, -1.0], [[h, -h, -h], [-h, -h, -h], [-h, h, -h], [h, h, -h]]),
        ([-1.0, 0.0, 0.0], [[-h, -h, -h], [-h, -h, h], [-h, h, h], [-h, h, -h]]),
        ([1.0, 0.0, 0.0], [[h, -h, h], [h, -h, -h], [h, h, -h], [h, h, h]]),
        ([0.0, 1.0, 0.0], [[-h, h, h], [h, h, h], [h, h, -h], [-h, h, -h]]),
        ([0.0, -1.0, 0.0], [[-h, -h, -h], [h, -h, -h], [h, -h, h], [-h, -h, h]]),
    ];

    let mut positions = Vec::with_capacity(24);
    let mut normals = Vec::with_capacity(24);
    let mut texcoords = Vec::with_capacity(24);
    let mut indices: Vec<u16> = Vec::with_capacity(36);

    for (face, (normal, corners)) in faces.iter().enumerate() {
        let base = (face * 4) as u16;
        positions.extend_from_slice(corners);
        normals.extend_from_slice(&[*normal; 4]);
        texcoords.extend_from_slice(&[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]);
        indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }

    submesh_node("cube", positions, normals, texcoords, IndexBlock::U16(indices))
}

fn plane(width: f32, depth: f32) -> AssetNode {
    let hw = width * 0.5;
    let hd = depth * 0.5;
    let positions = vec![
        [-hw, 0.0, hd],
        [hw, 0.0, hd],
        [hw, 0.0, -hd],
        [-hw, 0.0, -hd],
    ];
    let normals = vec![[0.0, 1.0, 0.0]; 4];
    let texcoords = vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
    let indices: Vec<u16> = vec![0, 1, 2, 2, 3, 0];

    submesh_node("plane", positions, normals, texcoords, IndexBlock::U16(indices))
}

fn sphere(radius: f32, segments: u32, rings: u32) -> AssetNode {
    // Below these the parameter math divides by zero.
    let segments = segments.max(3);
    let rings = rings.max(2);

    let mut positions = Vec::new();
    let mut normals = Vec::new();
    let mut texcoords = Vec::new();

    for ring in 0..=rings {
        let theta = ring as f32 * PI / rings as f32;
        let (sin_theta, cos_theta) = theta.sin_cos();

        for segment in 0..=segments {
            let phi = segment as f32 * 2.0 * PI / segments as f32;
            let (sin_phi, cos_phi) = phi.sin_cos();

            let x = sin_theta * cos_phi;
            let y = cos_theta;
            let z = sin_theta * sin_phi;

            positions.push([x * radius, y * radius, z * radius]);
            normals.push([x, y, z]);
            texcoords.push([
                segment as f32 / segments as f32,
                ring as f32 / rings as f32,
            ]);
        }
    }

    let mut indices: Vec<u32> = Vec::new();
    for ring in 0..rings {
        for segment in 0..segments {
            let current = ring * (segments + 1) + segment;
            let next = current + segments + 1;

            indices.extend_from_slice(&[current, next, current + 1]);
            indices.extend_from_slice(&[current + 1, next, next + 1]);
        }
    }

    submesh_node("sphere", positions, normals, texcoords, IndexBlock::U32(indices))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn only_submesh(node: &AssetNode) -> &SourceSubmesh {
        &node.mesh.as_ref().unwrap().submeshes[0]
    }

    #[test]
    fn cube_has_twelve_triangles() {
        let node = Shape::Cube { size: 1.0 }.generate();
        let sub = only_submesh(&node);
        assert_eq!(sub.vertex_count, 24);
        assert_eq!(sub.indices.as_ref().unwrap().len(), 36);
    }

    #[test]
    fn sphere_grid_counts_match_parameters() {
        let node = Shape::Sphere {
            radius: 2.0,
            segments: 8,
            rings: 6,
        }
        .generate();
        let sub = only_submesh(&node);
        assert_eq!(sub.vertex_count, (8 + 1) * (6 + 1));
        assert_eq!(sub.indices.as_ref().unwrap().len(), 8 * 6 * 6);
    }

    #[test]
    fn degenerate_sphere_parameters_are_clamped() {
        let node = Shape::Sphere {
            radius: 1.0,
            segments: 0,
            rings: 0,
        }
        .generate();
        let sub = only_submesh(&node);
        // Clamped to 3 segments and 2 rings.
        assert_eq!(sub.vertex_count, (3 + 1) * (2 + 1));
        assert_eq!(sub.indices.as_ref().unwrap().len(), 3 * 2 * 6);
        let positions = &sub.attributes[&VertexSemantic::Position];
        assert!(positions.data.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn sphere_positions_lie_on_the_radius() {
        let node = Shape::Sphere {
            radius: 3.0,
            segments: 4,
            rings: 4,
        }
        .generate();
        let sub = only_submesh(&node);
        let positions = &sub.attributes[&VertexSemantic::Position];
        for p in positions.data.chunks_exact(3) {
            let len = (p[0] * p[0] + p[1] * p[1] + p[2] * p[2]).sqrt();
            approx::assert_relative_eq!(len, 3.0, epsilon = 1e-4);
        }
    }
}
