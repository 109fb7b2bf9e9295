use crate::{Error, Result};

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum FormatType {
    #[default]
    Null,
    Float,
    Int,
    UInt,
}

impl FormatType {
    pub const INVALID: FormatType = FormatType::Null;
    pub const SIGNED: FormatType = FormatType::Int;
    pub const UNSIGNED: FormatType = FormatType::UInt;
}

/// Component layouts for vertex attributes and texels
#[allow(non_camel_case_types)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Format {
    #[default]
    Null = 0,
    R8_Int,
    R8G8_Int,
    R8G8B8_Int,
    R8G8B8A8_Int,
    R16_Int,
    R16G16_Int,
    R16G16B16_Int,
    R16G16B16A16_Int,
    R32_Int,
    R32G32_Int,
    R32G32B32_Int,
    R32G32B32A32_Int,
    R8_UInt,
    R8G8_UInt,
    R8G8B8_UInt,
    R8G8B8A8_UInt,
    R16_UInt,
    R16G16_UInt,
    R16G16B16_UInt,
    R16G16B16A16_UInt,
    R32_UInt,
    R32G32_UInt,
    R32G32B32_UInt,
    R32G32B32A32_UInt,
    R32_Float,
    R32G32_Float,
    R32G32B32_Float,
    R32G32B32A32_Float,
    R64_Float,
    R64G64_Float,
    R64G64B64_Float,
    R64G64B64A64_Float,
}

impl Format {
    pub const INVALID: Format = Format::Null;
}

/// Bits per channel, component type and total size of a format
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct FormatInfo {
    pub red_bits: u8,
    pub green_bits: u8,
    pub blue_bits: u8,
    pub alpha_bits: u8,
    pub format_type: FormatType,
    pub size_in_bytes: u8,
}

impl FormatInfo {
    const fn new(bits: [u8; 4], format_type: FormatType, size_in_bytes: u8) -> Self {
        FormatInfo {
            red_bits: bits[0],
            green_bits: bits[1],
            blue_bits: bits[2],
            alpha_bits: bits[3],
            format_type,
            size_in_bytes,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.format_type != FormatType::INVALID
    }

    /// Number of channels with a non zero bit count
    pub fn component_count(&self) -> u8 {
        [self.red_bits, self.green_bits, self.blue_bits, self.alpha_bits]
            .iter()
            .filter(|bits| **bits > 0)
            .count() as u8
    }
}

const FORMAT_INFO_TABLE: [FormatInfo; 32] = [
    FormatInfo::new([8, 0, 0, 0], FormatType::Int, 1),
    FormatInfo::new([8, 8, 0, 0], FormatType::Int, 2),
    FormatInfo::new([8, 8, 8, 0], FormatType::Int, 3),
    FormatInfo::new([8, 8, 8, 8], FormatType::Int, 4),
    FormatInfo::new([16, 0, 0, 0], FormatType::Int, 2),
    FormatInfo::new([16, 16, 0, 0], FormatType::Int, 4),
    FormatInfo::new([16, 16, 16, 0], FormatType::Int, 6),
    FormatInfo::new([16, 16, 16, 16], FormatType::Int, 8),
    FormatInfo::new([32, 0, 0, 0], FormatType::Int, 4),
    FormatInfo::new([32, 32, 0, 0], FormatType::Int, 8),
    FormatInfo::new([32, 32, 32, 0], FormatType::Int, 12),
    FormatInfo::new([32, 32, 32, 32], FormatType::Int, 16),
    FormatInfo::new([8, 0, 0, 0], FormatType::UInt, 1),
    FormatInfo::new([8, 8, 0, 0], FormatType::UInt, 2),
    FormatInfo::new([8, 8, 8, 0], FormatType::UInt, 3),
    FormatInfo::new([8, 8, 8, 8], FormatType::UInt, 4),
    FormatInfo::new([16, 0, 0, 0], FormatType::UInt, 2),
    FormatInfo::new([16, 16, 0, 0], FormatType::UInt, 4),
    FormatInfo::new([16, 16, 16, 0], FormatType::UInt, 6),
    FormatInfo::new([16, 16, 16, 16], FormatType::UInt, 8),
    FormatInfo::new([32, 0, 0, 0], FormatType::UInt, 4),
    FormatInfo::new([32, 32, 0, 0], FormatType::UInt, 8),
    FormatInfo::new([32, 32, 32, 0], FormatType::UInt, 12),
    FormatInfo::new([32, 32, 32, 32], FormatType::UInt, 16),
    FormatInfo::new([32, 0, 0, 0], FormatType::Float, 4),
    FormatInfo::new([32, 32, 0, 0], FormatType::Float, 8),
    FormatInfo::new([32, 32, 32, 0], FormatType::Float, 12),
    FormatInfo::new([32, 32, 32, 32], FormatType::Float, 16),
    FormatInfo::new([64, 0, 0, 0], FormatType::Float, 8),
    FormatInfo::new([64, 64, 0, 0], FormatType::Float, 16),
    FormatInfo::new([64, 64, 64, 0], FormatType::Float, 24),
    FormatInfo::new([64, 64, 64, 64], FormatType::Float, 32),
];

/// Layout of `format`, an all zero info with `FormatType::Null` for `Format::Null`
pub fn get_format_info(format: Format) -> FormatInfo {
    (format as usize)
        .checked_sub(1)
        .and_then(|index| FORMAT_INFO_TABLE.get(index).copied())
        .unwrap_or_default()
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct VertexAttribute {
    pub format: Format,
    /// Byte offset in the vertex, 0 places the attribute after the previous one
    pub offset: usize,
}

/// Interleaved vertex layout built one attribute at a time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VertexFormat {
    attributes: Vec<VertexAttribute>,
    stride: usize,
    offset: usize,
}

impl VertexFormat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_attribute(&mut self, attribute: VertexAttribute) -> Result<()> {
        let info = get_format_info(attribute.format);
        if !info.is_valid() {
            return Err(Error::invalid_param("vertex attribute has no format"));
        }
        let offset = if attribute.offset == 0 {
            self.offset
        } else {
            attribute.offset
        };
        self.attributes.push(VertexAttribute {
            format: attribute.format,
            offset,
        });
        self.offset = offset + info.size_in_bytes as usize;
        self.stride = self.stride.max(self.offset);
        Ok(())
    }

    pub fn reset(&mut self) {
        self.attributes.clear();
        self.stride = 0;
        self.offset = 0;
    }

    pub fn attributes(&self) -> &[VertexAttribute] {
        &self.attributes
    }

    /// Size in bytes of one vertex
    pub fn stride(&self) -> usize {
        self.stride
    }
}
