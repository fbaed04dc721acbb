/// The 8-byte PNG signature, big-endian packed.
pub const PNG_SIGNATURE: u64 = 0x8950_4E47_0D0A_1A0A;

pub(crate) const PNG_SIGNATURE_BYTES: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// Incoming/outgoing byte buffer size.
pub(crate) const BUFFER_SIZE: usize = 32 * 1024;

/// Assembly buffer for non-IDAT chunk payloads.
pub(crate) const ASSEMBLE_SIZE: usize = 32 * 1024;

/// Staging buffer for post-inflate / pre-deflate scanline bytes.
pub(crate) const ZBUF_SIZE: usize = 32 * 1024;

/// Leading slack on the scanline scratch so neighbour reads one pixel
/// to the left of column zero land on zero bytes. Covers the widest
/// pixel (RGBA at 16 bits per sample).
pub(crate) const LINE_PAD: usize = 8;

// Comparable chunk type words: the four letters, uppercased, packed
// little-endian. Comparisons happen on whole words, not byte slices.
pub(crate) const BLOCK_IHDR: u32 = u32::from_le_bytes(*b"IHDR");
pub(crate) const BLOCK_IDAT: u32 = u32::from_le_bytes(*b"IDAT");
pub(crate) const BLOCK_IEND: u32 = u32::from_le_bytes(*b"IEND");
pub(crate) const BLOCK_PLTE: u32 = u32::from_le_bytes(*b"PLTE");
pub(crate) const BLOCK_GAMA: u32 = u32::from_le_bytes(*b"GAMA");
pub(crate) const BLOCK_BKGD: u32 = u32::from_le_bytes(*b"BKGD");
pub(crate) const BLOCK_TIME: u32 = u32::from_le_bytes(*b"TIME");
pub(crate) const BLOCK_PHYS: u32 = u32::from_le_bytes(*b"PHYS");
pub(crate) const BLOCK_TRNS: u32 = u32::from_le_bytes(*b"TRNS");
