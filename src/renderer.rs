//! Consumer-facing draw dispatch.
//!
//! The renderer owns the uploaded meshes and issues one draw call per
//! submesh, in submesh order, binding buffers and textures first. It
//! runs strictly on the GL context thread.

use glow::HasContext;

use crate::error::LoadError;
use crate::factory::LoadOutput;
use crate::mesh::Mesh;

#[derive(Default)]
pub struct Renderer {
    pub meshes: Vec<Mesh>,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upload a factory load result and take ownership of the meshes.
    pub fn upload(&mut self, gl: &glow::Context, output: LoadOutput) -> Result<(), LoadError> {
        for data in output.meshes {
            self.meshes.push(Mesh::from_data(gl, data)?);
        }
        Ok(())
    }

    pub fn clear_frame(&self, gl: &glow::Context) {
        unsafe {
            gl.clear_color(0.0, 0.0, 0.0, 1.0);
            gl.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);
        }
    }

    /// Draw every mesh, submeshes strictly in stored order. Missing
    /// textures never skip a submesh; it draws untextured.
    pub fn draw_all(&self, gl: &glow::Context) {
        unsafe {
            gl.enable(glow::CULL_FACE);
            gl.enable(glow::DEPTH_TEST);
            gl.depth_func(glow::LESS);
        }

        for mesh in &self.meshes {
            mesh.draw(gl);
        }
    }

    /// Release every GPU buffer this renderer owns.
    pub fn destroy(&mut self, gl: &glow::Context) {
        for mesh in &self.meshes {
            mesh.destroy(gl);
        }
        self.meshes.clear();
    }
}
