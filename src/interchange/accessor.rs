//! Typed accessor decoding.
//!
//! An accessor is a view of `count` elements inside a buffer view. Each element holds
//! one to sixteen components of a single numeric type, stored little-endian.

use crate::error::{ImportError, Result};
use crate::types::Table;

/// Numeric type of accessor components, keyed by GL enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentType {
    I8,
    U8,
    I16,
    U16,
    U32,
    F32,
}

impl ComponentType {
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            5120 => Some(ComponentType::I8),
            5121 => Some(ComponentType::U8),
            5122 => Some(ComponentType::I16),
            5123 => Some(ComponentType::U16),
            5125 => Some(ComponentType::U32),
            5126 => Some(ComponentType::F32),
            _ => None,
        }
    }

    /// Size of one component in bytes.
    pub fn size(&self) -> usize {
        match self {
            ComponentType::I8 | ComponentType::U8 => 1,
            ComponentType::I16 | ComponentType::U16 => 2,
            ComponentType::U32 | ComponentType::F32 => 4,
        }
    }

    pub fn is_integer(&self) -> bool {
        !matches!(self, ComponentType::F32)
    }

    fn decode(&self, bytes: &[u8], normalized: bool) -> f64 {
        match self {
            ComponentType::I8 => {
                let v = bytes[0] as i8 as f64;
                if normalized { (v / 127.0).max(-1.0) } else { v }
            }
            ComponentType::U8 => {
                let v = bytes[0] as f64;
                if normalized { v / 255.0 } else { v }
            }
            ComponentType::I16 => {
                let v = i16::from_le_bytes([bytes[0], bytes[1]]) as f64;
                if normalized { (v / 32767.0).max(-1.0) } else { v }
            }
            ComponentType::U16 => {
                let v = u16::from_le_bytes([bytes[0], bytes[1]]) as f64;
                if normalized { v / 65535.0 } else { v }
            }
            ComponentType::U32 => {
                u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64
            }
            ComponentType::F32 => {
                f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64
            }
        }
    }
}

/// Shape of one accessor element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    Scalar,
    Vec2,
    Vec3,
    Vec4,
    Mat2,
    Mat3,
    Mat4,
}

impl ElementType {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "SCALAR" => Some(ElementType::Scalar),
            "VEC2" => Some(ElementType::Vec2),
            "VEC3" => Some(ElementType::Vec3),
            "VEC4" => Some(ElementType::Vec4),
            "MAT2" => Some(ElementType::Mat2),
            "MAT3" => Some(ElementType::Mat3),
            "MAT4" => Some(ElementType::Mat4),
            _ => None,
        }
    }

    /// Components per element.
    pub fn components(&self) -> usize {
        match self {
            ElementType::Scalar => 1,
            ElementType::Vec2 => 2,
            ElementType::Vec3 => 3,
            ElementType::Vec4 | ElementType::Mat2 => 4,
            ElementType::Mat3 => 9,
            ElementType::Mat4 => 16,
        }
    }
}

/// Where and how an accessor is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessorLayout {
    pub component_type: ComponentType,
    pub element_type: ElementType,
    pub count: usize,
    pub byte_offset: usize,
    pub normalized: bool,
}

impl AccessorLayout {
    /// Size of one element in bytes.
    pub fn element_size(&self) -> usize {
        self.component_type.size() * self.element_type.components()
    }

    /// Size of all elements in bytes, `None` when it does not fit in `usize`.
    pub fn byte_length(&self) -> Option<usize> {
        self.element_size().checked_mul(self.count)
    }

    fn checked_byte_length(&self, index: usize) -> Result<usize> {
        self.byte_length().ok_or_else(|| {
            ImportError::Format(format!(
                "accessor {}: {} elements of {} bytes overflow",
                index,
                self.count,
                self.element_size()
            ))
        })
    }
}

/// A decoded accessor. Values are widened to `f64`, one row per element.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessorData {
    pub component_type: ComponentType,
    pub element_type: ElementType,
    pub normalized: bool,
    table: Table,
}

impl AccessorData {
    /// An accessor with no backing buffer view: every component is zero.
    ///
    /// Its encoded size may not exceed `max_bytes`, the buffer data actually present.
    pub fn zeroed(index: usize, layout: &AccessorLayout, max_bytes: usize) -> Result<Self> {
        let length = layout.checked_byte_length(index)?;
        if length > max_bytes {
            return Err(ImportError::Format(format!(
                "accessor {}: {} zero-filled bytes exceed the {} bytes of buffer data",
                index, length, max_bytes
            )));
        }
        Ok(Self {
            component_type: layout.component_type,
            element_type: layout.element_type,
            normalized: layout.normalized,
            table: Table::zeros(layout.count, layout.element_type.components())?,
        })
    }

    /// Element count.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn width(&self) -> usize {
        self.table.width()
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn into_table(self) -> Table {
        self.table
    }

    /// Values as vertex or face indices. `None` for float or negative data.
    pub fn as_indices(&self) -> Option<Vec<usize>> {
        if !self.component_type.is_integer() || self.normalized {
            return None;
        }
        self.table
            .values()
            .iter()
            .map(|&v| (v >= 0.0).then_some(v as usize))
            .collect()
    }

    /// Elements as column-major 4x4 matrices.
    pub fn as_mat4(&self) -> Option<Vec<[f64; 16]>> {
        if self.element_type != ElementType::Mat4 {
            return None;
        }
        self.table
            .rows()
            .map(|row| row.try_into().ok())
            .collect()
    }
}

/// Decode accessor `index` from the bytes of its buffer view.
///
/// Fails closed when the declared range does not fit inside `view`.
pub fn resolve_accessor(
    index: usize,
    view: &[u8],
    layout: &AccessorLayout,
) -> Result<AccessorData> {
    let length = layout.checked_byte_length(index)?;
    let end = layout
        .byte_offset
        .checked_add(length)
        .filter(|&end| end <= view.len())
        .ok_or_else(|| {
            ImportError::Format(format!(
                "accessor {}: {} bytes at offset {} exceed buffer view of {} bytes",
                index,
                length,
                layout.byte_offset,
                view.len()
            ))
        })?;

    let bytes = &view[layout.byte_offset..end];
    let size = layout.component_type.size();
    let values = bytes
        .chunks_exact(size)
        .map(|c| layout.component_type.decode(c, layout.normalized))
        .collect();

    Ok(AccessorData {
        component_type: layout.component_type,
        element_type: layout.element_type,
        normalized: layout.normalized,
        table: Table::new(layout.element_type.components(), values)?,
    })
}
