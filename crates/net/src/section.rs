//! Chunk section binary codec.
//!
//! A section is a 16×16×16 block of cells transmitted palette-compressed:
//!
//! ```text
//! u16    non-empty block count        (big-endian)
//! u8     bits per entry
//! -- bits == 0: single-value palette
//! varint the one block state id
//! varint packed long count (always 0)
//! -- 4 <= bits <= 8: indexed palette
//! varint palette length, then that many varint block state ids
//! varint packed long count, then that many big-endian u64
//! -- bits == 15: direct (indices are global state ids)
//! varint packed long count, then that many big-endian u64
//! ```
//!
//! Cells are packed little-endian within each u64 and never span longs, so a
//! long holds `64 / bits` cells. Decoding keeps the palette order, the read
//! bit width, and the raw packed array; substitution rewrites palette values
//! in place, so an unmodified section re-encodes to bit-identical bytes and
//! a modified one only differs where a value actually changed.
//!
//! Any decode error here is fatal for the connection: forwarding a partially
//! reconstructed section risks silent world corruption on the client.

use serde::{Deserialize, Serialize};
use veilcraft_core::BlockStateId;

/// Cells per section (16³).
pub const SECTION_CELLS: usize = 4096;

/// Bit width marking a direct (palette-less) container.
pub const DIRECT_BITS: u8 = 15;

/// Smallest indexed palette width the encoder emits.
const MIN_INDEXED_BITS: u8 = 4;

/// Widest indexed palette width before switching to direct.
const MAX_INDEXED_BITS: u8 = 8;

/// Errors raised by section decoding.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SectionCodecError {
    /// Ran out of bytes mid-structure.
    #[error("unexpected end of section data")]
    UnexpectedEof,
    /// A varint ran past its maximum width.
    #[error("varint longer than 5 bytes")]
    VarIntTooLong,
    /// The bit width is not one the encoder can produce.
    #[error("invalid bits-per-entry: {0}")]
    BadBitWidth(u8),
    /// Palette length does not fit the declared bit width.
    #[error("palette of {len} entries does not fit {bits} bits")]
    BadPaletteSize {
        /// Declared palette length.
        len: usize,
        /// Declared bit width.
        bits: u8,
    },
    /// Packed array length disagrees with the bit width.
    #[error("expected {expected} packed longs, got {got}")]
    LengthMismatch {
        /// Longs required by the bit width.
        expected: usize,
        /// Longs declared on the wire.
        got: usize,
    },
    /// A packed cell indexes past the palette.
    #[error("palette index {index} out of range for palette of {len}")]
    IndexOutOfRange {
        /// Offending index value.
        index: u32,
        /// Palette length.
        len: usize,
    },
    /// Bytes were left over after the declared section count.
    #[error("{0} trailing bytes after last section")]
    TrailingBytes(usize),
}

/// Block state storage of one decoded section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum PalettedStates {
    /// Every cell holds the same state.
    Single(BlockStateId),
    /// Cells index into a palette.
    Indexed {
        bits: u8,
        palette: Vec<BlockStateId>,
        packed: Vec<u64>,
    },
    /// Cells hold global state ids directly.
    Direct { packed: Vec<u64> },
}

/// One decoded chunk section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkSection {
    /// Count of non-empty cells, carried through unchanged.
    pub non_empty_count: u16,
    states: PalettedStates,
}

impl ChunkSection {
    /// Build a section from per-cell states, choosing the minimal width.
    ///
    /// Palette order is first-occurrence order, matching what an encoder
    /// walking the cells produces.
    pub fn from_states(states: &[BlockStateId], non_empty_count: u16) -> Self {
        assert_eq!(states.len(), SECTION_CELLS, "section must have 4096 cells");

        let mut palette: Vec<BlockStateId> = Vec::new();
        let mut indices = Vec::with_capacity(SECTION_CELLS);
        for state in states {
            let index = match palette.iter().position(|p| p == state) {
                Some(i) => i,
                None => {
                    palette.push(*state);
                    palette.len() - 1
                }
            };
            indices.push(index as u32);
        }

        let states = if palette.len() == 1 {
            PalettedStates::Single(palette[0])
        } else {
            let bits = bits_for_palette(palette.len());
            if bits > MAX_INDEXED_BITS {
                let ids: Vec<u32> = states.iter().map(|s| s.0).collect();
                PalettedStates::Direct {
                    packed: pack(&ids, DIRECT_BITS),
                }
            } else {
                PalettedStates::Indexed {
                    bits,
                    palette,
                    packed: pack(&indices, bits),
                }
            }
        };

        Self {
            non_empty_count,
            states,
        }
    }

    /// State of the cell at `index`.
    pub fn state_at(&self, index: usize) -> BlockStateId {
        assert!(index < SECTION_CELLS);
        match &self.states {
            PalettedStates::Single(state) => *state,
            PalettedStates::Indexed {
                bits,
                palette,
                packed,
            } => {
                let id = cell_at(packed, *bits, index);
                palette[id as usize]
            }
            PalettedStates::Direct { packed } => {
                BlockStateId(cell_at(packed, DIRECT_BITS, index))
            }
        }
    }

    /// Rewrite every distinct state through `f`, in place.
    ///
    /// For palette-backed storage only the palette is touched, leaving the
    /// packed index array byte-identical. Returns whether anything changed.
    pub fn map_states(&mut self, mut f: impl FnMut(BlockStateId) -> Option<BlockStateId>) -> bool {
        match &mut self.states {
            PalettedStates::Single(state) => match f(*state) {
                Some(new) if new != *state => {
                    *state = new;
                    true
                }
                _ => false,
            },
            PalettedStates::Indexed { palette, .. } => {
                let mut changed = false;
                for entry in palette.iter_mut() {
                    if let Some(new) = f(*entry) {
                        if new != *entry {
                            *entry = new;
                            changed = true;
                        }
                    }
                }
                changed
            }
            PalettedStates::Direct { packed } => {
                let mut ids = unpack(packed, DIRECT_BITS);
                let mut changed = false;
                for id in ids.iter_mut() {
                    if let Some(new) = f(BlockStateId(*id)) {
                        if new.0 != *id {
                            *id = new.0;
                            changed = true;
                        }
                    }
                }
                if changed {
                    *packed = pack(&ids, DIRECT_BITS);
                }
                changed
            }
        }
    }

    fn decode(reader: &mut Reader<'_>) -> Result<Self, SectionCodecError> {
        let non_empty_count = reader.read_u16()?;
        let bits = reader.read_u8()?;

        let states = match bits {
            0 => {
                let value = BlockStateId(reader.read_varint()?);
                let longs = reader.read_varint()? as usize;
                if longs != 0 {
                    return Err(SectionCodecError::LengthMismatch {
                        expected: 0,
                        got: longs,
                    });
                }
                PalettedStates::Single(value)
            }
            MIN_INDEXED_BITS..=MAX_INDEXED_BITS => {
                let palette_len = reader.read_varint()? as usize;
                if palette_len == 0 || palette_len > 1usize << bits {
                    return Err(SectionCodecError::BadPaletteSize {
                        len: palette_len,
                        bits,
                    });
                }
                let mut palette = Vec::with_capacity(palette_len);
                for _ in 0..palette_len {
                    palette.push(BlockStateId(reader.read_varint()?));
                }
                let packed = reader.read_packed(bits)?;
                // A corrupt index array must not survive to the client.
                for i in 0..SECTION_CELLS {
                    let index = cell_at(&packed, bits, i);
                    if index as usize >= palette_len {
                        return Err(SectionCodecError::IndexOutOfRange {
                            index,
                            len: palette_len,
                        });
                    }
                }
                PalettedStates::Indexed {
                    bits,
                    palette,
                    packed,
                }
            }
            DIRECT_BITS => PalettedStates::Direct {
                packed: reader.read_packed(DIRECT_BITS)?,
            },
            other => return Err(SectionCodecError::BadBitWidth(other)),
        };

        Ok(Self {
            non_empty_count,
            states,
        })
    }

    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.non_empty_count.to_be_bytes());
        match &self.states {
            PalettedStates::Single(state) => {
                out.push(0);
                write_varint(out, state.0);
                write_varint(out, 0);
            }
            PalettedStates::Indexed {
                bits,
                palette,
                packed,
            } => {
                out.push(*bits);
                write_varint(out, palette.len() as u32);
                for entry in palette {
                    write_varint(out, entry.0);
                }
                write_varint(out, packed.len() as u32);
                for long in packed {
                    out.extend_from_slice(&long.to_be_bytes());
                }
            }
            PalettedStates::Direct { packed } => {
                out.push(DIRECT_BITS);
                write_varint(out, packed.len() as u32);
                for long in packed {
                    out.extend_from_slice(&long.to_be_bytes());
                }
            }
        }
    }
}

/// Decode `count` consecutive sections, requiring the buffer to be fully
/// consumed.
pub fn decode_sections(data: &[u8], count: usize) -> Result<Vec<ChunkSection>, SectionCodecError> {
    let mut reader = Reader::new(data);
    let mut sections = Vec::with_capacity(count);
    for _ in 0..count {
        sections.push(ChunkSection::decode(&mut reader)?);
    }
    let remaining = reader.remaining();
    if remaining != 0 {
        return Err(SectionCodecError::TrailingBytes(remaining));
    }
    Ok(sections)
}

/// Encode sections back into one contiguous buffer.
pub fn encode_sections(sections: &[ChunkSection]) -> Vec<u8> {
    let mut out = Vec::new();
    for section in sections {
        section.encode(&mut out);
    }
    out
}

/// Width the encoder selects for a palette of `len` entries (len > 1).
fn bits_for_palette(len: usize) -> u8 {
    let needed = (usize::BITS - (len - 1).leading_zeros()) as u8;
    needed.max(MIN_INDEXED_BITS)
}

fn cells_per_long(bits: u8) -> usize {
    64 / bits as usize
}

fn expected_longs(bits: u8) -> usize {
    SECTION_CELLS.div_ceil(cells_per_long(bits))
}

fn cell_at(packed: &[u64], bits: u8, index: usize) -> u32 {
    let cpl = cells_per_long(bits);
    let long = packed[index / cpl];
    let shift = (index % cpl) * bits as usize;
    let mask = (1u64 << bits) - 1;
    ((long >> shift) & mask) as u32
}

fn pack(values: &[u32], bits: u8) -> Vec<u64> {
    let cpl = cells_per_long(bits);
    let mut packed = vec![0u64; expected_longs(bits)];
    for (i, &value) in values.iter().enumerate() {
        let shift = (i % cpl) * bits as usize;
        packed[i / cpl] |= u64::from(value) << shift;
    }
    packed
}

fn unpack(packed: &[u64], bits: u8) -> Vec<u32> {
    (0..SECTION_CELLS).map(|i| cell_at(packed, bits, i)).collect()
}

fn write_varint(out: &mut Vec<u8>, mut value: u32) {
    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn read_u8(&mut self) -> Result<u8, SectionCodecError> {
        let byte = *self
            .data
            .get(self.pos)
            .ok_or(SectionCodecError::UnexpectedEof)?;
        self.pos += 1;
        Ok(byte)
    }

    fn read_u16(&mut self) -> Result<u16, SectionCodecError> {
        Ok(u16::from_be_bytes([self.read_u8()?, self.read_u8()?]))
    }

    fn read_u64(&mut self) -> Result<u64, SectionCodecError> {
        if self.remaining() < 8 {
            return Err(SectionCodecError::UnexpectedEof);
        }
        let bytes: [u8; 8] = self.data[self.pos..self.pos + 8].try_into().expect("8 bytes");
        self.pos += 8;
        Ok(u64::from_be_bytes(bytes))
    }

    fn read_varint(&mut self) -> Result<u32, SectionCodecError> {
        let mut value = 0u32;
        for i in 0..5 {
            let byte = self.read_u8()?;
            value |= u32::from(byte & 0x7F) << (7 * i);
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(SectionCodecError::VarIntTooLong)
    }

    fn read_packed(&mut self, bits: u8) -> Result<Vec<u64>, SectionCodecError> {
        let expected = expected_longs(bits);
        let got = self.read_varint()? as usize;
        if got != expected {
            return Err(SectionCodecError::LengthMismatch { expected, got });
        }
        let mut packed = Vec::with_capacity(expected);
        for _ in 0..expected {
            packed.push(self.read_u64()?);
        }
        Ok(packed)
    }
}
