//! Network sub-chunk parsing for block runtime ID rewriting.
//!
//! A LevelChunk payload is a sequence of sub-chunks followed by biome and
//! block-entity data. Block cells are packed words indexing into a per-layer
//! palette of runtime IDs, so a chunk is rewritten by remapping the palette
//! entries alone and copying the packed words through untouched.

use bytes::{BufMut, BytesMut};

use crate::codec::{
    check_len, read_u8, read_vari32, write_u8, write_vari32, CodecError, CodecResult,
};

/// Cells per sub-chunk: 16 * 16 * 16.
const CELLS_PER_SUB_CHUNK: usize = 4096;

/// Sub-chunk serialisation version carrying paletted storage layers.
const SUB_CHUNK_VERSION: u8 = 8;

fn copy_words(buf: &mut BytesMut, out: &mut BytesMut, bits_per_cell: u8) -> CodecResult<()> {
    if bits_per_cell == 0 {
        return Ok(());
    }
    if bits_per_cell > 32 {
        return Err(CodecError::InvalidValue {
            value: bits_per_cell as i64,
            field: "storage bits per cell",
            reason: "exceeds one word",
        });
    }
    // Cells never straddle a word; the tail of each word is padding.
    let cells_per_word = 32 / bits_per_cell as usize;
    let word_count = (CELLS_PER_SUB_CHUNK + cells_per_word - 1) / cells_per_word;
    let byte_count = word_count * 4;
    if buf.len() < byte_count {
        return Err(CodecError::NotEnoughData);
    }
    out.put_slice(&buf.split_to(byte_count));
    Ok(())
}

fn rewrite_storage_layer(
    buf: &mut BytesMut,
    out: &mut BytesMut,
    remap: &dyn Fn(u32) -> u32,
) -> CodecResult<()> {
    let header = read_u8(buf)?;
    write_u8(out, header);
    let bits_per_cell = header >> 1;
    copy_words(buf, out, bits_per_cell)?;

    // A zero-bit layer has exactly one implicit palette entry.
    let palette_count = if bits_per_cell == 0 {
        1
    } else {
        let count = read_vari32(buf)?;
        if count < 0 {
            return Err(CodecError::InvalidValue {
                value: count as i64,
                field: "storage palette size",
                reason: "negative",
            });
        }
        check_len(count as u64, CELLS_PER_SUB_CHUNK as u64, "storage palette")?;
        write_vari32(out, count);
        count as usize
    };
    for _ in 0..palette_count {
        let runtime_id = read_vari32(buf)?;
        write_vari32(out, remap(runtime_id as u32) as i32);
    }
    Ok(())
}

fn rewrite_sub_chunk(
    buf: &mut BytesMut,
    out: &mut BytesMut,
    remap: &dyn Fn(u32) -> u32,
) -> CodecResult<()> {
    let version = read_u8(buf)?;
    if version != SUB_CHUNK_VERSION {
        return Err(CodecError::UnknownEnumTag {
            value: version as u64,
            field: "sub-chunk version",
        });
    }
    write_u8(out, version);
    let layer_count = read_u8(buf)?;
    write_u8(out, layer_count);
    for _ in 0..layer_count {
        rewrite_storage_layer(buf, out, remap)?;
    }
    Ok(())
}

/// Rewrite every block runtime ID inside a serialised chunk column. The
/// biome, border block and block entity data after the sub-chunks is copied
/// through unchanged.
pub fn rewrite_chunk_payload(
    payload: &[u8],
    sub_chunk_count: u32,
    remap: &dyn Fn(u32) -> u32,
) -> CodecResult<Vec<u8>> {
    let mut buf = BytesMut::from(payload);
    let mut out = BytesMut::with_capacity(payload.len());
    for _ in 0..sub_chunk_count {
        rewrite_sub_chunk(&mut buf, &mut out, remap)?;
    }
    out.put_slice(&buf);
    Ok(out.to_vec())
}
