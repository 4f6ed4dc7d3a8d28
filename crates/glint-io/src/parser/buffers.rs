//! Buffers, buffer views and accessors.

use std::rc::Rc;

use futures::future::try_join;
use glint_core::attribute::{Attribute, BufferAttribute, InterleavedBuffer, InterleavedBufferAttribute};
use glint_core::component::{ComponentArray, ComponentType, ElementType};
use glint_core::status::{resolve, GltfError, Result};

use super::GltfParser;
use crate::uri::{decode_data_uri, is_data_uri, resolve_url};

/// `[start, start + len)` of `bytes`, or an error naming accessor `accessor`.
fn checked_range(accessor: usize, start: usize, len: usize, available: usize) -> Result<std::ops::Range<usize>> {
    let end = start.checked_add(len).unwrap_or(usize::MAX);
    if end > available {
        return Err(GltfError::AccessorOutOfBounds {
            accessor,
            start,
            end,
            available,
        });
    }
    Ok(start..end)
}

/// Upper bound for the zero-filled base of a sparse accessor without a
/// bufferView, which has no backing bytes to bound its `count`.
const MAX_SPARSE_BASE_BYTES: usize = 1 << 28;

/// Byte length of `count` elements of `element_bytes` each.
fn byte_length(accessor: usize, count: usize, element_bytes: usize) -> Result<usize> {
    count.checked_mul(element_bytes).ok_or_else(|| {
        GltfError::invalid_definition(
            "accessor",
            accessor,
            format!("{} elements of {} bytes overflow", count, element_bytes),
        )
    })
}

impl GltfParser {
    pub(super) async fn load_buffer(self: Rc<Self>, index: usize) -> Result<Rc<Vec<u8>>> {
        let buffer_def = resolve(&self.document.buffers, index, "buffer")?;

        if let Some(buffer_type) = &buffer_def.buffer_type {
            if buffer_type != "arraybuffer" {
                return Err(GltfError::UnsupportedBufferType(buffer_type.clone()));
            }
        }

        match &buffer_def.uri {
            Some(uri) => Ok(Rc::new(self.fetch_uri(uri).await?)),
            // The GLB binary chunk backs the first buffer when it has no URI.
            None if index == 0 => self
                .binary_chunk
                .clone()
                .ok_or_else(|| GltfError::invalid_definition("buffer", index, "no uri and no binary chunk")),
            None => Err(GltfError::invalid_definition("buffer", index, "no uri")),
        }
    }

    /// Bytes behind `uri`: decoded locally for data URIs, fetched otherwise.
    pub(super) async fn fetch_uri(&self, uri: &str) -> Result<Vec<u8>> {
        if is_data_uri(uri) {
            return Ok(decode_data_uri(uri)?.data);
        }
        let fetcher = self
            .fetcher
            .as_ref()
            .ok_or_else(|| GltfError::MissingCollaborator(format!("no fetch service to load \"{}\"", uri)))?;
        let url = resolve_url(uri, &self.options.path);
        log::debug!("Fetching {}", url);
        let fetched = fetcher.fetch(&url).await;
        fetched.map_err(|e| GltfError::Fetch {
            uri: url,
            reason: e.to_string(),
        })
    }

    pub(super) async fn load_buffer_view(self: Rc<Self>, index: usize) -> Result<Rc<Vec<u8>>> {
        let view_def = resolve(&self.document.buffer_views, index, "bufferView")?;
        let (buffer_index, start, len) = (view_def.buffer, view_def.byte_offset, view_def.byte_length);

        let buffer = self
            .get_dependency(super::DependencyType::Buffer, buffer_index)
            .await?
            .bytes()?;

        let end = start.checked_add(len).unwrap_or(usize::MAX);
        if end > buffer.len() {
            return Err(GltfError::invalid_definition(
                "bufferView",
                index,
                format!("bytes {}..{} exceed buffer {} of {} bytes", start, end, buffer_index, buffer.len()),
            ));
        }
        Ok(Rc::new(buffer[start..end].to_vec()))
    }

    pub(super) async fn load_accessor(self: Rc<Self>, index: usize) -> Result<Option<Attribute>> {
        let accessor_def = resolve(&self.document.accessors, index, "accessor")?;

        if accessor_def.buffer_view.is_none() && accessor_def.sparse.is_none() {
            // Metadata only; no data to read.
            return Ok(None);
        }

        let component_type = ComponentType::from_gl(accessor_def.component_type)?;
        let item_size = ElementType::parse(&accessor_def.element_type)?.item_size();
        let element_bytes = component_type.byte_length();
        let item_bytes = element_bytes * item_size;
        let count = accessor_def.count;
        let normalized = accessor_def.normalized;

        let view = async {
            match accessor_def.buffer_view {
                Some(view_index) => self.buffer_view_bytes(view_index).await.map(Some),
                None => Ok::<_, GltfError>(None),
            }
        };
        let sparse_views = async {
            match &accessor_def.sparse {
                Some(sparse) => {
                    let (indices, values) = try_join(
                        self.buffer_view_bytes(sparse.indices.buffer_view),
                        self.buffer_view_bytes(sparse.values.buffer_view),
                    )
                    .await?;
                    Ok::<_, GltfError>(Some((indices, values)))
                }
                None => Ok(None),
            }
        };
        let (view, sparse_views) = try_join(view, sparse_views).await?;

        let byte_stride = accessor_def
            .buffer_view
            .and_then(|view_index| self.document.buffer_views.get(view_index))
            .and_then(|view_def| view_def.byte_stride);

        let attribute = match (&view, byte_stride) {
            (Some(view), Some(stride)) if stride != item_bytes => {
                let view_index = accessor_def.buffer_view.unwrap_or_default();
                if stride % element_bytes != 0 || accessor_def.byte_offset % element_bytes != 0 {
                    return Err(GltfError::invalid_definition(
                        "accessor",
                        index,
                        format!("stride {} or offset {} not aligned to {} byte components", stride, accessor_def.byte_offset, element_bytes),
                    ));
                }
                if count > 0 {
                    let span = byte_length(index, count - 1, stride)?
                        .checked_add(item_bytes)
                        .unwrap_or(usize::MAX);
                    checked_range(index, accessor_def.byte_offset, span, view.len())?;
                }
                let data = self.interleaved_buffer(view_index, component_type, view, stride);
                Attribute::Interleaved(InterleavedBufferAttribute {
                    data,
                    item_size,
                    offset: accessor_def.byte_offset / element_bytes,
                    count,
                    normalized,
                })
            }
            (Some(view), _) => {
                let len = byte_length(index, count, item_bytes)?;
                let range = checked_range(index, accessor_def.byte_offset, len, view.len())?;
                let array = ComponentArray::from_le_bytes(component_type, &view[range], count * item_size);
                BufferAttribute::new(array, item_size, normalized).into()
            }
            (None, _) => {
                let len = byte_length(index, count, item_bytes)?;
                if len > MAX_SPARSE_BASE_BYTES {
                    return Err(GltfError::invalid_definition(
                        "accessor",
                        index,
                        format!("sparse base of {} bytes exceeds {} bytes", len, MAX_SPARSE_BASE_BYTES),
                    ));
                }
                BufferAttribute::new(ComponentArray::zeros(component_type, count * item_size), item_size, normalized)
                    .into()
            }
        };

        let (Some(sparse), Some((indices_view, values_view))) = (&accessor_def.sparse, sparse_views) else {
            return Ok(Some(attribute));
        };

        if sparse.count > 0 && item_size > 4 {
            return Err(GltfError::SparseItemSize(item_size));
        }

        let indices_type = ComponentType::from_gl(sparse.indices.component_type)?;
        let indices_range = checked_range(
            index,
            sparse.indices.byte_offset,
            byte_length(index, sparse.count, indices_type.byte_length())?,
            indices_view.len(),
        )?;
        let sparse_indices = ComponentArray::from_le_bytes(indices_type, &indices_view[indices_range], sparse.count);

        let values_range = checked_range(
            index,
            sparse.values.byte_offset,
            byte_length(index, sparse.count, item_bytes)?,
            values_view.len(),
        )?;
        let sparse_values = ComponentArray::from_le_bytes(component_type, &values_view[values_range], sparse.count * item_size);

        // Patching always produces an independent, de-interleaved copy.
        let mut patched = attribute.to_buffer_attribute();
        for i in 0..sparse.count {
            let target = sparse_indices.get(i).unwrap_or_default() as usize;
            if target >= count {
                return Err(GltfError::invalid_definition(
                    "accessor",
                    index,
                    format!("sparse index {} out of range for {} elements", target, count),
                ));
            }
            for component in 0..item_size {
                let value = sparse_values.get(i * item_size + component).unwrap_or_default();
                patched.array.set(target * item_size + component, value);
            }
        }

        Ok(Some(patched.into()))
    }

    /// The interleaved storage of `view_index` read as `component_type`,
    /// shared by every accessor over the same view and type.
    fn interleaved_buffer(
        &self,
        view_index: usize,
        component_type: ComponentType,
        view: &[u8],
        byte_stride: usize,
    ) -> Rc<InterleavedBuffer> {
        let key = (view_index, component_type);
        if let Some(existing) = self.interleaved_buffers.borrow().get(&key) {
            return existing.clone();
        }
        let element_bytes = component_type.byte_length();
        let len = view.len() / element_bytes;
        let array = ComponentArray::from_le_bytes(component_type, view, len);
        let buffer = Rc::new(InterleavedBuffer::new(array, byte_stride / element_bytes));
        self.interleaved_buffers.borrow_mut().insert(key, buffer.clone());
        buffer
    }
}
