//! Accessor component types, element shapes and typed component storage.

use byteorder::{ByteOrder, LittleEndian};
use num_traits::{Bounded, NumCast, ToPrimitive};

use crate::status::{GltfError, Result};

/// Scalar component type of an accessor, keyed by its GL enum value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ComponentType {
    Int8 = 5120,
    Uint8 = 5121,
    Int16 = 5122,
    Uint16 = 5123,
    Uint32 = 5125,
    Float32 = 5126,
}

impl ComponentType {
    pub fn from_gl(code: u32) -> Result<Self> {
        match code {
            5120 => Ok(ComponentType::Int8),
            5121 => Ok(ComponentType::Uint8),
            5122 => Ok(ComponentType::Int16),
            5123 => Ok(ComponentType::Uint16),
            5125 => Ok(ComponentType::Uint32),
            5126 => Ok(ComponentType::Float32),
            other => Err(GltfError::UnsupportedComponentType(other)),
        }
    }

    pub fn gl_code(&self) -> u32 {
        *self as u32
    }

    pub fn byte_length(&self) -> usize {
        match self {
            ComponentType::Int8 | ComponentType::Uint8 => 1,
            ComponentType::Int16 | ComponentType::Uint16 => 2,
            ComponentType::Uint32 | ComponentType::Float32 => 4,
        }
    }

    pub fn is_integral(&self) -> bool {
        !matches!(self, ComponentType::Float32)
    }
}

/// Element shape of an accessor (`SCALAR`, `VEC3`, `MAT4`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
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
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "SCALAR" => Ok(ElementType::Scalar),
            "VEC2" => Ok(ElementType::Vec2),
            "VEC3" => Ok(ElementType::Vec3),
            "VEC4" => Ok(ElementType::Vec4),
            "MAT2" => Ok(ElementType::Mat2),
            "MAT3" => Ok(ElementType::Mat3),
            "MAT4" => Ok(ElementType::Mat4),
            other => Err(GltfError::UnsupportedElementType(other.to_string())),
        }
    }

    /// Number of components per element.
    pub fn item_size(&self) -> usize {
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

/// Owned, typed component storage. The runtime equivalent of a typed array.
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentArray {
    Int8(Vec<i8>),
    Uint8(Vec<u8>),
    Int16(Vec<i16>),
    Uint16(Vec<u16>),
    Uint32(Vec<u32>),
    Float32(Vec<f32>),
}

macro_rules! dispatch {
    ($array:expr, $values:ident => $body:expr) => {
        match $array {
            ComponentArray::Int8($values) => $body,
            ComponentArray::Uint8($values) => $body,
            ComponentArray::Int16($values) => $body,
            ComponentArray::Uint16($values) => $body,
            ComponentArray::Uint32($values) => $body,
            ComponentArray::Float32($values) => $body,
        }
    };
}

fn cast_into<T: NumCast + Bounded>(value: f64) -> T {
    // Saturates out-of-range integers instead of wrapping.
    NumCast::from(value).unwrap_or_else(|| {
        if value.is_sign_negative() {
            T::min_value()
        } else {
            T::max_value()
        }
    })
}

impl ComponentArray {
    /// A zero-filled array of `len` components.
    pub fn zeros(component_type: ComponentType, len: usize) -> Self {
        match component_type {
            ComponentType::Int8 => ComponentArray::Int8(vec![0; len]),
            ComponentType::Uint8 => ComponentArray::Uint8(vec![0; len]),
            ComponentType::Int16 => ComponentArray::Int16(vec![0; len]),
            ComponentType::Uint16 => ComponentArray::Uint16(vec![0; len]),
            ComponentType::Uint32 => ComponentArray::Uint32(vec![0; len]),
            ComponentType::Float32 => ComponentArray::Float32(vec![0.0; len]),
        }
    }

    /// Reads up to `len` little-endian components from the start of `bytes`.
    /// Fewer are read when `bytes` is too short.
    pub fn from_le_bytes(component_type: ComponentType, bytes: &[u8], len: usize) -> Self {
        let width = component_type.byte_length();
        let len = len.min(bytes.len() / width);
        let bytes = &bytes[..len * width];
        match component_type {
            ComponentType::Int8 => ComponentArray::Int8(bytes.iter().map(|b| *b as i8).collect()),
            ComponentType::Uint8 => ComponentArray::Uint8(bytes.to_vec()),
            ComponentType::Int16 => {
                let mut out = vec![0i16; len];
                LittleEndian::read_i16_into(bytes, &mut out);
                ComponentArray::Int16(out)
            }
            ComponentType::Uint16 => {
                let mut out = vec![0u16; len];
                LittleEndian::read_u16_into(bytes, &mut out);
                ComponentArray::Uint16(out)
            }
            ComponentType::Uint32 => {
                let mut out = vec![0u32; len];
                LittleEndian::read_u32_into(bytes, &mut out);
                ComponentArray::Uint32(out)
            }
            ComponentType::Float32 => {
                let mut out = vec![0f32; len];
                LittleEndian::read_f32_into(bytes, &mut out);
                ComponentArray::Float32(out)
            }
        }
    }

    pub fn component_type(&self) -> ComponentType {
        match self {
            ComponentArray::Int8(_) => ComponentType::Int8,
            ComponentArray::Uint8(_) => ComponentType::Uint8,
            ComponentArray::Int16(_) => ComponentType::Int16,
            ComponentArray::Uint16(_) => ComponentType::Uint16,
            ComponentArray::Uint32(_) => ComponentType::Uint32,
            ComponentArray::Float32(_) => ComponentType::Float32,
        }
    }

    pub fn len(&self) -> usize {
        dispatch!(self, values => values.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Component `index` widened to `f64`, or `None` past the end.
    pub fn get(&self, index: usize) -> Option<f64> {
        dispatch!(self, values => values.get(index).and_then(|v| v.to_f64()))
    }

    /// Stores `value` at `index`, converting to the array's component type.
    /// Out-of-range indices are ignored.
    pub fn set(&mut self, index: usize, value: f64) {
        dispatch!(self, values => {
            if let Some(slot) = values.get_mut(index) {
                *slot = cast_into(value);
            }
        })
    }

    /// Copies `len` components starting at `start` into a new array of the
    /// same type. Ranges past the end are truncated.
    pub fn slice(&self, start: usize, len: usize) -> Self {
        dispatch!(self, values => {
            let start = start.min(values.len());
            let end = (start + len).min(values.len());
            values[start..end].to_vec().into()
        })
    }

    /// Appends every component of `other`, converting to this array's type.
    pub fn extend_from(&mut self, other: &ComponentArray) {
        let converted: Vec<f64> = (0..other.len()).filter_map(|i| other.get(i)).collect();
        dispatch!(self, values => {
            values.reserve(converted.len());
            for value in converted {
                values.push(cast_into(value));
            }
        })
    }

    pub fn to_f32_vec(&self) -> Vec<f32> {
        dispatch!(self, values => values.iter().map(|v| v.to_f32().unwrap_or_default()).collect())
    }

    pub fn to_u32_vec(&self) -> Vec<u32> {
        dispatch!(self, values => values.iter().map(|v| v.to_u32().unwrap_or_default()).collect())
    }
}

macro_rules! impl_from_vec {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<Vec<$ty>> for ComponentArray {
                fn from(values: Vec<$ty>) -> Self {
                    ComponentArray::$variant(values)
                }
            }
        )*
    };
}

impl_from_vec!(i8 => Int8, u8 => Uint8, i16 => Int16, u16 => Uint16, u32 => Uint32, f32 => Float32);

/// Converts a normalized integer component to its floating-point value.
pub fn denormalize(component_type: ComponentType, value: f64) -> f64 {
    match component_type {
        ComponentType::Int8 => (value / 127.0).max(-1.0),
        ComponentType::Uint8 => value / 255.0,
        ComponentType::Int16 => (value / 32767.0).max(-1.0),
        ComponentType::Uint16 => value / 65535.0,
        ComponentType::Uint32 => value / 4294967295.0,
        ComponentType::Float32 => value,
    }
}
