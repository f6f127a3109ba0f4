use crate::error::LoadError;

/// Semantic role of a vertex attribute. Used to match source data
/// blocks against the target layout requested by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexSemantic {
    Position,
    Normal,
    Tangent,
    TexCoord0,
    TexCoord1,
    Color,
    Joints,
    Weights,
}

impl VertexSemantic {
    /// Default value synthesized when the target layout requires this
    /// attribute but the source does not provide it. Position has no
    /// default; a missing position is a fatal load error instead.
    ///
    /// Normals default to zero, tangents to the degenerate (0,0,0,1),
    /// texcoords to zero, colors to opaque white, joints to bone 0 and
    /// weights to (1,0,0,0).
    pub fn default_value(&self) -> [f32; 4] {
        match self {
            Self::Position => [0.0; 4],
            Self::Normal => [0.0; 4],
            Self::Tangent => [0.0, 0.0, 0.0, 1.0],
            Self::TexCoord0 | Self::TexCoord1 => [0.0; 4],
            Self::Color => [1.0; 4],
            Self::Joints => [0.0; 4],
            Self::Weights => [1.0, 0.0, 0.0, 0.0],
        }
    }
}

/// Scalar storage format of a vertex attribute component.
///
/// Conversion from canonical f32 source data follows the format the
/// descriptor declares; picking a normalized integer format is the
/// explicit request for the narrowing it implies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeFormat {
    /// 32-bit float, stored as-is.
    F32,
    /// 8-bit unsigned, normalized to 0.0..=1.0.
    U8Norm,
    /// 16-bit unsigned, normalized to 0.0..=1.0.
    U16Norm,
    /// 16-bit unsigned integer (joint indices).
    U16,
}

impl AttributeFormat {
    pub fn byte_width(&self) -> usize {
        match self {
            Self::F32 => 4,
            Self::U8Norm => 1,
            Self::U16Norm | Self::U16 => 2,
        }
    }

    pub fn gl_type(&self) -> u32 {
        match self {
            Self::F32 => glow::FLOAT,
            Self::U8Norm => glow::UNSIGNED_BYTE,
            Self::U16Norm | Self::U16 => glow::UNSIGNED_SHORT,
        }
    }

    pub fn normalized(&self) -> bool {
        matches!(self, Self::U8Norm | Self::U16Norm)
    }

    /// Encode one scalar into `dst` (native endianness, GPU buffers
    /// never leave the host).
    pub fn put(&self, value: f32, dst: &mut [u8]) {
        match self {
            Self::F32 => dst[..4].copy_from_slice(&value.to_ne_bytes()),
            Self::U8Norm => {
                dst[0] = (value.clamp(0.0, 1.0) * 255.0).round() as u8;
            }
            Self::U16Norm => {
                let v = (value.clamp(0.0, 1.0) * 65535.0).round() as u16;
                dst[..2].copy_from_slice(&v.to_ne_bytes());
            }
            Self::U16 => {
                let v = value.round().clamp(0.0, 65535.0) as u16;
                dst[..2].copy_from_slice(&v.to_ne_bytes());
            }
        }
    }
}

/// One vertex attribute: role, format, component count and placement
/// within the buffer it draws from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttributeDescriptor {
    pub semantic: VertexSemantic,
    pub format: AttributeFormat,
    pub components: u8,
    pub offset: usize,
    pub buffer_index: usize,
}

impl AttributeDescriptor {
    pub fn byte_size(&self) -> usize {
        self.components as usize * self.format.byte_width()
    }
}

/// GL-facing view of one attribute, ready for `vertex_attrib_pointer`.
/// Locations are assigned in layout order.
#[derive(Debug, Clone, Copy)]
pub struct GlVertexAttribute {
    pub location: u32,
    pub components: i32,
    pub gl_type: u32,
    pub normalized: bool,
    pub offset: usize,
    pub buffer_index: usize,
}

/// Ordered set of attribute descriptors spanning one or more vertex
/// buffers. Duplicate semantics are rejected and a position attribute
/// is mandatory.
#[derive(Debug, Clone)]
pub struct VertexLayout {
    attributes: Vec<AttributeDescriptor>,
    strides: Vec<usize>,
}

impl VertexLayout {
    pub fn from_descriptors(attributes: Vec<AttributeDescriptor>) -> Result<Self, LoadError> {
        for (i, a) in attributes.iter().enumerate() {
            if attributes[..i].iter().any(|b| b.semantic == a.semantic) {
                return Err(LoadError::DuplicateSemantic(a.semantic));
            }
        }
        if !attributes
            .iter()
            .any(|a| a.semantic == VertexSemantic::Position)
        {
            return Err(LoadError::LayoutMissingPosition);
        }

        let buffer_count = attributes
            .iter()
            .map(|a| a.buffer_index + 1)
            .max()
            .unwrap_or(0);
        let mut strides = vec![0usize; buffer_count];
        for a in &attributes {
            strides[a.buffer_index] = strides[a.buffer_index].max(a.offset + a.byte_size());
        }

        Ok(Self {
            attributes,
            strides,
        })
    }

    /// Single interleaved buffer; offsets are packed tightly in the
    /// order given.
    pub fn packed(specs: &[(VertexSemantic, AttributeFormat, u8)]) -> Result<Self, LoadError> {
        let mut offset = 0;
        let mut attributes = Vec::with_capacity(specs.len());
        for &(semantic, format, components) in specs {
            let descriptor = AttributeDescriptor {
                semantic,
                format,
                components,
                offset,
                buffer_index: 0,
            };
            offset += descriptor.byte_size();
            attributes.push(descriptor);
        }
        Self::from_descriptors(attributes)
    }

    /// One buffer per attribute, for sources that keep their data
    /// planar instead of interleaved.
    pub fn separate(specs: &[(VertexSemantic, AttributeFormat, u8)]) -> Result<Self, LoadError> {
        let attributes = specs
            .iter()
            .enumerate()
            .map(|(i, &(semantic, format, components))| AttributeDescriptor {
                semantic,
                format,
                components,
                offset: 0,
                buffer_index: i,
            })
            .collect();
        Self::from_descriptors(attributes)
    }

    /// The common float3 position + float3 normal + float2 texcoord
    /// layout most shaders expect.
    pub fn position_normal_uv() -> Self {
        Self::packed(&[
            (VertexSemantic::Position, AttributeFormat::F32, 3),
            (VertexSemantic::Normal, AttributeFormat::F32, 3),
            (VertexSemantic::TexCoord0, AttributeFormat::F32, 2),
        ])
        .expect("static layout is valid")
    }

    pub fn attributes(&self) -> &[AttributeDescriptor] {
        &self.attributes
    }

    pub fn buffer_count(&self) -> usize {
        self.strides.len()
    }

    pub fn stride(&self, buffer_index: usize) -> usize {
        self.strides[buffer_index]
    }

    pub fn gl_attributes(&self) -> Vec<GlVertexAttribute> {
        self.attributes
            .iter()
            .enumerate()
            .map(|(i, a)| GlVertexAttribute {
                location: i as u32,
                components: a.components as i32,
                gl_type: a.format.gl_type(),
                normalized: a.format.normalized(),
                offset: a.offset,
                buffer_index: a.buffer_index,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packed_layout_computes_offsets_and_stride() {
        let layout = VertexLayout::position_normal_uv();
        let attrs = layout.attributes();
        assert_eq!(attrs[0].offset, 0);
        assert_eq!(attrs[1].offset, 12);
        assert_eq!(attrs[2].offset, 24);
        assert_eq!(layout.buffer_count(), 1);
        assert_eq!(layout.stride(0), 32);
    }

    #[test]
    fn separate_layout_uses_one_buffer_per_attribute() {
        let layout = VertexLayout::separate(&[
            (VertexSemantic::Position, AttributeFormat::F32, 3),
            (VertexSemantic::Color, AttributeFormat::U8Norm, 4),
        ])
        .unwrap();
        assert_eq!(layout.buffer_count(), 2);
        assert_eq!(layout.stride(0), 12);
        assert_eq!(layout.stride(1), 4);
    }

    #[test]
    fn duplicate_semantic_is_rejected() {
        let result = VertexLayout::packed(&[
            (VertexSemantic::Position, AttributeFormat::F32, 3),
            (VertexSemantic::Position, AttributeFormat::F32, 3),
        ]);
        assert!(matches!(result, Err(LoadError::DuplicateSemantic(_))));
    }

    #[test]
    fn layout_without_position_is_rejected() {
        let result = VertexLayout::packed(&[(VertexSemantic::Normal, AttributeFormat::F32, 3)]);
        assert!(matches!(result, Err(LoadError::LayoutMissingPosition)));
    }

    #[test]
    fn normalized_formats_encode_scalars() {
        let mut byte = [0u8; 1];
        AttributeFormat::U8Norm.put(0.5, &mut byte);
        assert_eq!(byte[0], 128);

        let mut short = [0u8; 2];
        AttributeFormat::U16.put(513.0, &mut short);
        assert_eq!(u16::from_ne_bytes(short), 513);
    }
}
