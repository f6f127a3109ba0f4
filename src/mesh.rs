//! GPU-side mesh objects.
//!
//! `Mesh::from_data` uploads the factory's CPU-side output on the
//! thread that owns the GL context. A mesh owns its submeshes; each
//! submesh owns its buffer objects and holds non-owning texture
//! handles. Submesh order is draw order.

use glow::HasContext;

use crate::data::{Aabb, IndexKind, Topology};
use crate::error::LoadError;
use crate::factory::MeshData;
use crate::layout::GlVertexAttribute;
use crate::submesh::SubmeshData;

/// One drawable unit: a single topology, a single index type, its
/// buffers and its textures in binding-slot order.
pub struct Submesh {
    pub name: String,
    vao: glow::NativeVertexArray,
    vertex_buffers: Vec<glow::NativeBuffer>,
    index_buffer: Option<glow::NativeBuffer>,
    attributes: Vec<GlVertexAttribute>,
    strides: Vec<i32>,
    pub vertex_count: i32,
    /// Index count and element width, when the submesh is indexed.
    pub indices: Option<(i32, IndexKind)>,
    pub topology: Topology,
    pub textures: Vec<Option<glow::NativeTexture>>,
    pub bounds: Aabb,
}

impl Submesh {
    pub fn from_data(gl: &glow::Context, data: SubmeshData) -> Result<Self, LoadError> {
        unsafe {
            let vao = gl.create_vertex_array().map_err(LoadError::Gpu)?;
            gl.bind_vertex_array(Some(vao));

            let mut vertex_buffers = Vec::with_capacity(data.vertex_buffers.len());
            for bytes in &data.vertex_buffers {
                let vbo = gl.create_buffer().map_err(LoadError::Gpu)?;
                gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
                gl.buffer_data_u8_slice(glow::ARRAY_BUFFER, bytes, glow::STATIC_DRAW);
                vertex_buffers.push(vbo);
            }

            let index_buffer = match &data.indices {
                Some(indices) => {
                    let ebo = gl.create_buffer().map_err(LoadError::Gpu)?;
                    gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(ebo));
                    gl.buffer_data_u8_slice(
                        glow::ELEMENT_ARRAY_BUFFER,
                        &indices.bytes,
                        glow::STATIC_DRAW,
                    );
                    Some(ebo)
                }
                None => None,
            };

            Ok(Self {
                name: data.name,
                vao,
                vertex_buffers,
                index_buffer,
                attributes: data.attributes,
                strides: data.strides,
                vertex_count: data.vertex_count as i32,
                indices: data.indices.map(|ix| (ix.count, ix.kind)),
                topology: data.topology,
                textures: data.textures,
                bounds: data.bounds,
            })
        }
    }

    pub fn bind(&self, gl: &glow::Context) {
        unsafe {
            gl.bind_vertex_array(Some(self.vao));

            for (buffer_index, vbo) in self.vertex_buffers.iter().enumerate() {
                gl.bind_buffer(glow::ARRAY_BUFFER, Some(*vbo));
                for attr in self
                    .attributes
                    .iter()
                    .filter(|a| a.buffer_index == buffer_index)
                {
                    gl.vertex_attrib_pointer_f32(
                        attr.location,
                        attr.components,
                        attr.gl_type,
                        attr.normalized,
                        self.strides[buffer_index],
                        attr.offset as i32,
                    );
                    gl.enable_vertex_attrib_array(attr.location);
                }
            }

            if let Some(ebo) = self.index_buffer {
                gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(ebo));
            }

            // Unbound slots are simply left alone; the submesh draws
            // untextured there.
            for (slot, texture) in self.textures.iter().enumerate() {
                if let Some(texture) = texture {
                    gl.active_texture(glow::TEXTURE0 + slot as u32);
                    gl.bind_texture(glow::TEXTURE_2D, Some(*texture));
                }
            }
        }
    }

    pub fn draw(&self, gl: &glow::Context) {
        unsafe {
            match self.indices {
                Some((count, kind)) => {
                    gl.draw_elements(self.topology.gl_mode(), count, kind.gl_type(), 0);
                }
                None => {
                    gl.draw_arrays(self.topology.gl_mode(), 0, self.vertex_count);
                }
            }
        }
    }

    /// Delete the buffer objects. Textures belong to the cache.
    pub fn destroy(&self, gl: &glow::Context) {
        unsafe {
            for vbo in &self.vertex_buffers {
                gl.delete_buffer(*vbo);
            }
            if let Some(ebo) = self.index_buffer {
                gl.delete_buffer(ebo);
            }
            gl.delete_vertex_array(self.vao);
        }
    }
}

/// One loaded asset in GPU form: ordered submeshes and the union of
/// their bounds.
pub struct Mesh {
    pub name: String,
    pub submeshes: Vec<Submesh>,
    pub bounds: Aabb,
}

impl Mesh {
    pub fn from_data(gl: &glow::Context, data: MeshData) -> Result<Self, LoadError> {
        let submeshes = data
            .submeshes
            .into_iter()
            .map(|sub| Submesh::from_data(gl, sub))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            name: data.name,
            submeshes,
            bounds: data.bounds,
        })
    }

    /// Draw every submesh in stored order. Reordering is not a legal
    /// optimization; downstream blending can depend on it.
    pub fn draw(&self, gl: &glow::Context) {
        for submesh in &self.submeshes {
            submesh.bind(gl);
            submesh.draw(gl);
        }
    }

    pub fn destroy(&self, gl: &glow::Context) {
        for submesh in &self.submeshes {
            submesh.destroy(gl);
        }
    }
}
