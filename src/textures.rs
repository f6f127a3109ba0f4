//! Texture-loading collaborator.
//!
//! The factory talks to textures only through the `TextureLoader`
//! trait; failures are the non-fatal "texture unavailable" condition
//! and never abort a load. `GlTextureLoader` is the real
//! implementation: decode with `image`, upload with `glow`, cache by
//! path. The cache is the sole owner of the decoded textures; submesh
//! records hold non-owning handle copies.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use glow::HasContext;

use crate::error::TextureError;

pub trait TextureLoader {
    /// Resolve a texture identifier to a GPU texture handle.
    fn load_texture(&mut self, path: &Path) -> Result<glow::NativeTexture, TextureError>;
}

pub struct GlTextureLoader<'a> {
    gl: &'a glow::Context,
    cache: HashMap<PathBuf, glow::NativeTexture>,
}

impl<'a> GlTextureLoader<'a> {
    pub fn new(gl: &'a glow::Context) -> Self {
        Self {
            gl,
            cache: HashMap::new(),
        }
    }

    fn upload(&self, path: &Path, width: u32, height: u32, data: &[u8]) -> Result<glow::NativeTexture, TextureError> {
        let gl = self.gl;
        unsafe {
            let texture = gl.create_texture().map_err(|detail| TextureError::Gpu {
                path: path.to_path_buf(),
                detail,
            })?;
            gl.bind_texture(glow::TEXTURE_2D, Some(texture));

            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, glow::REPEAT as i32);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, glow::REPEAT as i32);
            gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MIN_FILTER,
                glow::LINEAR_MIPMAP_LINEAR as i32,
            );
            gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MAG_FILTER,
                glow::LINEAR as i32,
            );

            gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                glow::RGBA as i32,
                width as i32,
                height as i32,
                0,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                glow::PixelUnpackData::Slice(Some(data)),
            );
            gl.generate_mipmap(glow::TEXTURE_2D);

            Ok(texture)
        }
    }
}

impl TextureLoader for GlTextureLoader<'_> {
    fn load_texture(&mut self, path: &Path) -> Result<glow::NativeTexture, TextureError> {
        if let Some(texture) = self.cache.get(path) {
            return Ok(*texture);
        }

        let img = image::open(path)
            .map_err(|e| match e {
                image::ImageError::IoError(source) => TextureError::Unavailable {
                    path: path.to_path_buf(),
                    source,
                },
                other => TextureError::Decode {
                    path: path.to_path_buf(),
                    source: other,
                },
            })?
            .flipv()
            .to_rgba8();

        let (width, height) = img.dimensions();
        let texture = self.upload(path, width, height, &img.into_raw())?;

        log::debug!("loaded texture {path:?} ({width}x{height})");
        self.cache.insert(path.to_path_buf(), texture);
        Ok(texture)
    }
}
