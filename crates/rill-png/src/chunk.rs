//! Chunk framing: length, type, payload, CRC — in both directions.
use bitflags::bitflags;
use rill_core::{ByteReader, ByteWriter};

use crate::crc::{crc32, crc_update};
use crate::error::PngError;

bitflags! {
    /// Property bits a chunk type spells out through the case of its
    /// four letters.
    pub struct ChunkFlags: u8 {
        const ANCILLARY      = 1;
        const PRIVATE        = 2;
        const NON_CONFORMING = 4;
        const SAFE_TO_COPY   = 8;
    }
}

/// Read bit 5 of each type letter: lowercase means the flag is set.
pub(crate) fn classify_type(letters: [u8; 4]) -> ChunkFlags
{
    let mut flags = ChunkFlags::empty();

    if letters[0] & 32 != 0
    {
        flags |= ChunkFlags::ANCILLARY;
    }
    if letters[1] & 32 != 0
    {
        flags |= ChunkFlags::PRIVATE;
    }
    if letters[2] & 32 != 0
    {
        flags |= ChunkFlags::NON_CONFORMING;
    }
    if letters[3] & 32 != 0
    {
        flags |= ChunkFlags::SAFE_TO_COPY;
    }
    flags
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum BlockState
{
    Wait,
    Start,
    ReadBlock,
    ReadCrc,
    Finished,
    Error
}

/// Decode-side chunk framer.
///
/// Consumes the 8-byte envelope, tracks how much payload is still
/// outstanding, runs the CRC over type and payload, and checks the
/// trailing word. The caller owns the buffer and removes whatever a
/// step reports as consumed.
pub(crate) struct BlockReader
{
    pub state:      BlockState,
    /// Payload length of the chunk being read.
    pub length:     usize,
    /// Payload bytes still outstanding.
    pub left:       usize,
    /// Little-endian packed, uppercased type word.
    pub block_type: u32,
    pub flags:      ChunkFlags,
    /// Raw type letters as they appeared, for diagnostics.
    pub letters:    [u8; 4],
    running_crc:    u32
}

impl BlockReader
{
    pub fn new() -> BlockReader
    {
        BlockReader {
            state:       BlockState::Wait,
            length:      0,
            left:        0,
            block_type:  0,
            flags:       ChunkFlags::empty(),
            letters:     [0; 4],
            running_crc: 0
        }
    }

    /// Try to consume the 8-byte length+type envelope from `buf`.
    /// Returns the bytes consumed: 8, or 0 when more input is needed.
    pub fn start(&mut self, buf: &[u8]) -> usize
    {
        if buf.len() < 8
        {
            return 0;
        }
        let mut reader = ByteReader::new(buf);

        self.length = reader.get_u32_be() as usize;
        self.left = self.length;

        // the type participates in the CRC, the length does not
        self.running_crc = crc_update(0xFFFF_FFFF, &buf[4..8]);

        let mut letters = [buf[4], buf[5], buf[6], buf[7]];
        self.letters = letters;
        self.flags = classify_type(letters);

        // normalize to uppercase for the comparable word
        for letter in &mut letters
        {
            *letter &= !32;
        }
        self.block_type = u32::from_le_bytes(letters);

        self.state = BlockState::ReadBlock;
        8
    }

    /// Fold a slice of payload into the running CRC.
    pub fn update_crc(&mut self, payload: &[u8])
    {
        self.running_crc = crc_update(self.running_crc, payload);
    }

    /// Try to consume and verify the trailing CRC word.
    /// Returns the bytes consumed: 4, or 0 when more input is needed.
    pub fn read_crc(&mut self, buf: &[u8], confirm: bool) -> Result<usize, PngError>
    {
        if buf.len() < 4
        {
            return Ok(0);
        }
        let stored = ByteReader::new(buf).get_u32_be();
        let calculated = self.running_crc ^ 0xFFFF_FFFF;

        if confirm && stored != calculated
        {
            self.state = BlockState::Error;
            return Err(PngError::BadCrc(stored, calculated));
        }

        self.state = BlockState::Finished;
        Ok(4)
    }
}

/// Encode-side chunk framer.
///
/// `start` reserves the length word and writes the type; once the body
/// has been appended, `finish` backpatches the length and appends the
/// CRC over type and payload.
pub(crate) struct BlockWriter
{
    length_pos: usize
}

impl BlockWriter
{
    pub fn start(out: &mut Vec<u8>, block_type: u32, flags: ChunkFlags) -> BlockWriter
    {
        let length_pos = out.len();
        let mut writer = ByteWriter::new(out);

        // patched in finish once the body length is known
        writer.write_u32_be(0);

        let mut type_word = block_type;
        if flags.contains(ChunkFlags::ANCILLARY)
        {
            type_word |= 32;
        }
        if flags.contains(ChunkFlags::PRIVATE)
        {
            type_word |= 32 << 8;
        }
        if flags.contains(ChunkFlags::NON_CONFORMING)
        {
            type_word |= 32 << 16;
        }
        if flags.contains(ChunkFlags::SAFE_TO_COPY)
        {
            type_word |= 32 << 24;
        }
        writer.write_u32_le(type_word);

        BlockWriter { length_pos }
    }

    pub fn finish(self, out: &mut Vec<u8>)
    {
        let length = out.len() - self.length_pos - 8;
        let crc = crc32(&out[self.length_pos + 4..]);

        let mut writer = ByteWriter::new(out);
        writer.put_u32_be_at(self.length_pos, length as u32);
        writer.write_u32_be(crc);
    }
}

#[test]
fn flag_bits_follow_bit_five()
{
    // each lowercase letter sets exactly its own property bit; a
    // truthiness test instead of the bit mask would set every flag for
    // any nonzero letter
    assert_eq!(classify_type(*b"IHDR"), ChunkFlags::empty());
    assert_eq!(classify_type(*b"tEXt"), ChunkFlags::ANCILLARY | ChunkFlags::SAFE_TO_COPY);
    assert_eq!(classify_type(*b"tIME"), ChunkFlags::ANCILLARY);
    assert_eq!(classify_type(*b"IdAT"), ChunkFlags::PRIVATE);
    assert_eq!(classify_type(*b"IHdR"), ChunkFlags::NON_CONFORMING);
    assert_eq!(
        classify_type(*b"abcd"),
        ChunkFlags::ANCILLARY
            | ChunkFlags::PRIVATE
            | ChunkFlags::NON_CONFORMING
            | ChunkFlags::SAFE_TO_COPY
    );
}

#[test]
fn written_chunks_parse_back()
{
    use crate::constants::BLOCK_IHDR;

    let mut out = Vec::new();
    let writer = BlockWriter::start(&mut out, BLOCK_IHDR, ChunkFlags::empty());
    out.extend_from_slice(b"payload");
    writer.finish(&mut out);

    // 4 length + 4 type + 7 payload + 4 crc
    assert_eq!(out.len(), 19);
    assert_eq!(&out[..4], &[0, 0, 0, 7]);
    assert_eq!(&out[4..8], b"IHDR");

    let mut reader = BlockReader::new();
    assert_eq!(reader.start(&out), 8);
    assert_eq!(reader.length, 7);
    assert_eq!(reader.block_type, BLOCK_IHDR);

    reader.update_crc(b"payload");
    assert_eq!(reader.read_crc(&out[15..], true).unwrap(), 4);
    assert_eq!(reader.state, BlockState::Finished);
}

#[test]
fn lowercase_letters_round_trip_through_writer()
{
    use crate::constants::BLOCK_TRNS;

    let mut out = Vec::new();
    let writer = BlockWriter::start(&mut out, BLOCK_TRNS, ChunkFlags::ANCILLARY);
    writer.finish(&mut out);

    assert_eq!(&out[4..8], b"tRNS");

    let mut reader = BlockReader::new();
    reader.start(&out);
    assert_eq!(reader.flags, ChunkFlags::ANCILLARY);
    assert_eq!(reader.block_type, BLOCK_TRNS);
    assert!(reader.read_crc(&out[8..], true).is_ok());
}

#[test]
fn corrupted_crc_is_reported()
{
    use crate::constants::BLOCK_IDAT;

    let mut out = Vec::new();
    let writer = BlockWriter::start(&mut out, BLOCK_IDAT, ChunkFlags::empty());
    out.extend_from_slice(&[1, 2, 3]);
    writer.finish(&mut out);

    let last = out.len() - 1;
    out[last] ^= 0xFF;

    let mut reader = BlockReader::new();
    reader.start(&out);
    reader.update_crc(&[1, 2, 3]);

    let result = reader.read_crc(&out[11..], true);
    assert!(matches!(result, Err(PngError::BadCrc(..))));
    assert_eq!(reader.state, BlockState::Error);
}
