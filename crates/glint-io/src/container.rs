//! GLB container decoding and encoding.
//!
//! A GLB file is a 12-byte header (`glTF` magic, version, total length)
//! followed by length-prefixed chunks. The JSON chunk carries the document
//! text and the optional BIN chunk the embedded buffer. Anything that does not
//! start with the magic is treated as plain JSON text.
//!
//! # Example
//!
//! ```ignore
//! use glint_io::container::{decode_container, encode_glb};
//!
//! let glb = encode_glb(r#"{"asset":{"version":"2.0"}}"#, Some(&[1, 2, 3, 4]));
//! let decoded = decode_container(&glb)?;
//! assert!(decoded.is_container);
//! assert_eq!(decoded.binary_chunk.as_deref(), Some(&[1u8, 2, 3, 4][..]));
//! ```

use byteorder::{ByteOrder, LittleEndian};
use glint_core::status::{GltfError, Result};

/// "glTF" in little-endian.
pub const GLB_MAGIC: u32 = 0x4654_6C67;
pub const GLB_VERSION: u32 = 2;
pub const GLB_HEADER_LENGTH: usize = 12;
pub const GLB_CHUNK_HEADER_LENGTH: usize = 8;
/// "JSON" in little-endian.
pub const GLB_CHUNK_JSON: u32 = 0x4E4F_534A;
/// "BIN\0" in little-endian.
pub const GLB_CHUNK_BIN: u32 = 0x004E_4942;

/// Document text and embedded binary payload split out of an input.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedContainer {
    pub document_text: String,
    pub binary_chunk: Option<Vec<u8>>,
    /// Whether the input was a GLB container rather than plain JSON.
    pub is_container: bool,
}

/// Returns true when `data` starts with the GLB magic.
pub fn is_glb(data: &[u8]) -> bool {
    data.len() >= 4 && LittleEndian::read_u32(&data[0..4]) == GLB_MAGIC
}

/// Splits `data` into document text and an optional binary chunk.
pub fn decode_container(data: &[u8]) -> Result<DecodedContainer> {
    if !is_glb(data) {
        let document_text = std::str::from_utf8(data)
            .map_err(|e| GltfError::InvalidText(e.to_string()))?
            .to_string();
        return Ok(DecodedContainer {
            document_text,
            binary_chunk: None,
            is_container: false,
        });
    }

    if data.len() < GLB_HEADER_LENGTH {
        return Err(GltfError::InvalidHeader(format!(
            "container is {} bytes, header needs {}",
            data.len(),
            GLB_HEADER_LENGTH
        )));
    }

    let version = LittleEndian::read_u32(&data[4..8]);
    if version < GLB_VERSION {
        return Err(GltfError::UnsupportedContainerVersion(version));
    }

    let mut offset = GLB_HEADER_LENGTH;
    let mut json_chunk: Option<&[u8]> = None;
    let mut bin_chunk: Option<&[u8]> = None;

    // Trailing bytes too short for a chunk header are ignored.
    while offset + GLB_CHUNK_HEADER_LENGTH <= data.len() {
        let chunk_length = LittleEndian::read_u32(&data[offset..offset + 4]) as usize;
        let chunk_type = LittleEndian::read_u32(&data[offset + 4..offset + 8]);
        offset += GLB_CHUNK_HEADER_LENGTH;

        let end = offset
            .checked_add(chunk_length)
            .filter(|&end| end <= data.len())
            .ok_or(GltfError::TruncatedChunk {
                offset,
                length: chunk_length,
                available: data.len() - offset,
            })?;

        let payload = &data[offset..end];
        match chunk_type {
            GLB_CHUNK_JSON => json_chunk = Some(payload),
            GLB_CHUNK_BIN => bin_chunk = Some(payload),
            _ => log::debug!("skipping unknown GLB chunk type {:#010x}", chunk_type),
        }
        offset = end;
    }

    let json = json_chunk.ok_or(GltfError::MissingJsonChunk)?;
    let document_text = std::str::from_utf8(json)
        .map_err(|e| GltfError::InvalidText(e.to_string()))?
        .to_string();

    Ok(DecodedContainer {
        document_text,
        binary_chunk: bin_chunk.map(<[u8]>::to_vec),
        is_container: true,
    })
}

/// Builds a GLB container. The JSON chunk is padded with spaces and the BIN
/// chunk with zeros to 4-byte alignment.
pub fn encode_glb(document_text: &str, binary_chunk: Option<&[u8]>) -> Vec<u8> {
    let json_bytes = document_text.as_bytes();
    let json_padding = (4 - (json_bytes.len() % 4)) % 4;
    let padded_json_len = json_bytes.len() + json_padding;

    let bin_lengths = binary_chunk.map(|bin| {
        let padding = (4 - (bin.len() % 4)) % 4;
        (padding, bin.len() + padding)
    });

    let mut total_len = GLB_HEADER_LENGTH + GLB_CHUNK_HEADER_LENGTH + padded_json_len;
    if let Some((_, padded_bin_len)) = bin_lengths {
        total_len += GLB_CHUNK_HEADER_LENGTH + padded_bin_len;
    }

    let mut output = vec![0u8; total_len];

    // Header
    LittleEndian::write_u32(&mut output[0..4], GLB_MAGIC);
    LittleEndian::write_u32(&mut output[4..8], GLB_VERSION);
    LittleEndian::write_u32(&mut output[8..12], total_len as u32);

    // JSON chunk
    let mut offset = GLB_HEADER_LENGTH;
    LittleEndian::write_u32(&mut output[offset..offset + 4], padded_json_len as u32);
    LittleEndian::write_u32(&mut output[offset + 4..offset + 8], GLB_CHUNK_JSON);
    offset += GLB_CHUNK_HEADER_LENGTH;
    output[offset..offset + json_bytes.len()].copy_from_slice(json_bytes);
    for byte in &mut output[offset + json_bytes.len()..offset + padded_json_len] {
        *byte = b' ';
    }
    offset += padded_json_len;

    // Binary chunk, zero padded by construction
    if let (Some(bin), Some((_, padded_bin_len))) = (binary_chunk, bin_lengths) {
        LittleEndian::write_u32(&mut output[offset..offset + 4], padded_bin_len as u32);
        LittleEndian::write_u32(&mut output[offset + 4..offset + 8], GLB_CHUNK_BIN);
        offset += GLB_CHUNK_HEADER_LENGTH;
        output[offset..offset + bin.len()].copy_from_slice(bin);
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use glint_core::status::ErrorKind;

    fn chunk(chunk_type: u32, payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        out.extend_from_slice(&chunk_type.to_le_bytes());
        out.extend_from_slice(payload);
        out
    }

    fn header(version: u32, total: usize) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(b"glTF");
        out.extend_from_slice(&version.to_le_bytes());
        out.extend_from_slice(&(total as u32).to_le_bytes());
        out
    }

    #[test]
    fn test_glb_magic() {
        assert_eq!(u32::from_le_bytes(*b"glTF"), GLB_MAGIC);
        assert_eq!(u32::from_le_bytes(*b"JSON"), GLB_CHUNK_JSON);
        assert_eq!(u32::from_le_bytes(*b"BIN\0"), GLB_CHUNK_BIN);
    }

    #[test]
    fn test_plain_json_passthrough() {
        let decoded = decode_container(br#"{"asset":{"version":"2.0"}}"#).unwrap();
        assert!(!decoded.is_container);
        assert!(decoded.binary_chunk.is_none());
        assert!(decoded.document_text.starts_with('{'));
    }

    #[test]
    fn test_legacy_version_rejected() {
        let data = header(1, 12);
        let err = decode_container(&data).unwrap_err();
        assert_eq!(err, GltfError::UnsupportedContainerVersion(1));
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[test]
    fn test_unknown_chunks_skipped() {
        let mut data = header(2, 0);
        data.extend(chunk(0x1234_5678, b"junk"));
        data.extend(chunk(GLB_CHUNK_JSON, b"{}  "));
        let decoded = decode_container(&data).unwrap();
        assert_eq!(decoded.document_text, "{}  ");
    }

    #[test]
    fn test_missing_json_chunk() {
        let mut data = header(2, 0);
        data.extend(chunk(GLB_CHUNK_BIN, &[0, 0, 0, 0]));
        assert_eq!(decode_container(&data).unwrap_err(), GltfError::MissingJsonChunk);
    }

    #[test]
    fn test_truncated_chunk_is_error() {
        let mut data = header(2, 0);
        data.extend_from_slice(&100u32.to_le_bytes());
        data.extend_from_slice(&GLB_CHUNK_JSON.to_le_bytes());
        data.extend_from_slice(b"{}");
        assert!(matches!(
            decode_container(&data),
            Err(GltfError::TruncatedChunk { length: 100, available: 2, .. })
        ));
    }

    #[test]
    fn test_short_header_is_error() {
        assert!(matches!(decode_container(b"glTF\x02\0"), Err(GltfError::InvalidHeader(_))));
    }

    #[test]
    fn test_encode_pads_chunks() {
        let glb = encode_glb("{}", Some(&[7]));
        assert_eq!(glb.len() % 4, 0);
        assert_eq!(LittleEndian::read_u32(&glb[8..12]) as usize, glb.len());
        let decoded = decode_container(&glb).unwrap();
        assert_eq!(decoded.document_text, "{}  ");
        assert_eq!(decoded.binary_chunk, Some(vec![7, 0, 0, 0]));
    }
}
