//! Vertex attribute storage.
//!
//! An [`Attribute`] is either a standalone [`BufferAttribute`] owning its
//! components, or an [`InterleavedBufferAttribute`] viewing one stream of a
//! shared, strided [`InterleavedBuffer`]. Both are cheap to clone: storage is
//! reference counted and never mutated after construction.

use std::rc::Rc;

use crate::component::{denormalize, ComponentArray, ComponentType};
use crate::ids::BufferId;

/// Tightly packed attribute data: `count * item_size` components.
#[derive(Debug, Clone, PartialEq)]
pub struct BufferAttribute {
    pub name: String,
    pub array: ComponentArray,
    pub item_size: usize,
    pub normalized: bool,
}

impl BufferAttribute {
    pub fn new(array: ComponentArray, item_size: usize, normalized: bool) -> Self {
        Self {
            name: String::new(),
            array,
            item_size,
            normalized,
        }
    }

    pub fn count(&self) -> usize {
        if self.item_size == 0 {
            0
        } else {
            self.array.len() / self.item_size
        }
    }

    pub fn get_component(&self, index: usize, component: usize) -> f64 {
        self.array
            .get(index * self.item_size + component)
            .unwrap_or_default()
    }

    pub fn set_component(&mut self, index: usize, component: usize, value: f64) {
        if component < self.item_size {
            self.array.set(index * self.item_size + component, value);
        }
    }
}

/// Strided storage shared by several interleaved attributes. The stride is
/// measured in components, not bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct InterleavedBuffer {
    pub id: BufferId,
    pub array: ComponentArray,
    pub stride: usize,
}

impl InterleavedBuffer {
    pub fn new(array: ComponentArray, stride: usize) -> Self {
        Self {
            id: BufferId::next(),
            array,
            stride,
        }
    }

    /// Number of strided records in the buffer.
    pub fn count(&self) -> usize {
        if self.stride == 0 {
            0
        } else {
            self.array.len() / self.stride
        }
    }
}

/// One attribute stream inside an [`InterleavedBuffer`]. `offset` is the
/// component offset of the stream's first element from the start of the
/// buffer, and `count` the number of elements the stream covers, which may
/// be fewer than the buffer's records.
#[derive(Debug, Clone, PartialEq)]
pub struct InterleavedBufferAttribute {
    pub data: Rc<InterleavedBuffer>,
    pub item_size: usize,
    pub offset: usize,
    pub count: usize,
    pub normalized: bool,
}

impl InterleavedBufferAttribute {
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn get_component(&self, index: usize, component: usize) -> f64 {
        self.data
            .array
            .get(index * self.data.stride + self.offset + component)
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Attribute {
    Buffer(Rc<BufferAttribute>),
    Interleaved(InterleavedBufferAttribute),
}

impl From<BufferAttribute> for Attribute {
    fn from(attribute: BufferAttribute) -> Self {
        Attribute::Buffer(Rc::new(attribute))
    }
}

impl Attribute {
    pub fn count(&self) -> usize {
        match self {
            Attribute::Buffer(attribute) => attribute.count(),
            Attribute::Interleaved(attribute) => attribute.count(),
        }
    }

    pub fn item_size(&self) -> usize {
        match self {
            Attribute::Buffer(attribute) => attribute.item_size,
            Attribute::Interleaved(attribute) => attribute.item_size,
        }
    }

    pub fn normalized(&self) -> bool {
        match self {
            Attribute::Buffer(attribute) => attribute.normalized,
            Attribute::Interleaved(attribute) => attribute.normalized,
        }
    }

    pub fn component_type(&self) -> ComponentType {
        match self {
            Attribute::Buffer(attribute) => attribute.array.component_type(),
            Attribute::Interleaved(attribute) => attribute.data.array.component_type(),
        }
    }

    pub fn is_interleaved(&self) -> bool {
        matches!(self, Attribute::Interleaved(_))
    }

    /// Raw component value, as stored.
    pub fn get_component(&self, index: usize, component: usize) -> f64 {
        match self {
            Attribute::Buffer(attribute) => attribute.get_component(index, component),
            Attribute::Interleaved(attribute) => attribute.get_component(index, component),
        }
    }

    pub fn get_x(&self, index: usize) -> f64 {
        self.get_component(index, 0)
    }

    pub fn get_y(&self, index: usize) -> f64 {
        self.get_component(index, 1)
    }

    pub fn get_z(&self, index: usize) -> f64 {
        self.get_component(index, 2)
    }

    pub fn get_w(&self, index: usize) -> f64 {
        self.get_component(index, 3)
    }

    /// Copies the attribute into standalone, tightly packed storage of the
    /// same component type. Interleaved streams are de-interleaved.
    pub fn to_buffer_attribute(&self) -> BufferAttribute {
        match self {
            Attribute::Buffer(attribute) => (**attribute).clone(),
            Attribute::Interleaved(attribute) => {
                let count = attribute.count();
                let item_size = attribute.item_size;
                let mut array =
                    ComponentArray::zeros(attribute.data.array.component_type(), count * item_size);
                for i in 0..count {
                    for c in 0..item_size {
                        array.set(i * item_size + c, attribute.get_component(i, c));
                    }
                }
                BufferAttribute::new(array, item_size, attribute.normalized)
            }
        }
    }

    /// Every element flattened to `f32`, applying normalization when the
    /// attribute is flagged as normalized.
    pub fn to_f32_vec(&self) -> Vec<f32> {
        let component_type = self.component_type();
        let normalized = self.normalized() && component_type.is_integral();
        let item_size = self.item_size();
        let mut out = Vec::with_capacity(self.count() * item_size);
        for i in 0..self.count() {
            for c in 0..item_size {
                let value = self.get_component(i, c);
                let value = if normalized {
                    denormalize(component_type, value)
                } else {
                    value
                };
                out.push(value as f32);
            }
        }
        out
    }

    /// Scalar attribute contents as `u32`, used for index buffers.
    pub fn to_u32_vec(&self) -> Vec<u32> {
        (0..self.count())
            .map(|i| self.get_x(i).max(0.0) as u32)
            .collect()
    }

    /// True when both attributes share the same backing storage.
    pub fn ptr_eq(&self, other: &Attribute) -> bool {
        match (self, other) {
            (Attribute::Buffer(a), Attribute::Buffer(b)) => Rc::ptr_eq(a, b),
            (Attribute::Interleaved(a), Attribute::Interleaved(b)) => {
                Rc::ptr_eq(&a.data, &b.data) && a.offset == b.offset && a.item_size == b.item_size
            }
            _ => false,
        }
    }
}
