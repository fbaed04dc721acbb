//! Pump adapters over the external DEFLATE engine.
//!
//! Both directions move bounded slices per call and report exactly how
//! much was consumed and produced, so the state machines can interleave
//! them with their own buffer compaction.
use flate2::{Compress, Compression, Decompress, FlushCompress, FlushDecompress, Status};

use crate::error::PngError;

/// Streaming INFLATE for the concatenated IDAT payloads.
pub(crate) struct Inflator
{
    stream:   Decompress,
    finished: bool
}

impl Inflator
{
    pub fn new() -> Inflator
    {
        Inflator {
            // zlib wrapping: 2-byte header, adler-32 trailer
            stream:   Decompress::new(true),
            finished: false
        }
    }

    /// Inflate from `input` into `output`, returning
    /// `(consumed, produced)`.
    pub fn inflate(&mut self, input: &[u8], output: &mut [u8]) -> Result<(usize, usize), PngError>
    {
        let in_before = self.stream.total_in();
        let out_before = self.stream.total_out();

        let status = self
            .stream
            .decompress(input, output, FlushDecompress::Sync)
            .map_err(|_| PngError::Zlib("corrupt deflate stream"))?;

        match status
        {
            Status::Ok => {}
            Status::StreamEnd => self.finished = true,
            Status::BufError =>
            {
                return Err(PngError::Zlib("inflate made no progress"));
            }
        }

        let consumed = (self.stream.total_in() - in_before) as usize;
        let produced = (self.stream.total_out() - out_before) as usize;

        Ok((consumed, produced))
    }

    /// True once the adler-verified end of stream was seen.
    pub const fn is_finished(&self) -> bool
    {
        self.finished
    }
}

/// Streaming DEFLATE for producing IDAT payloads.
pub(crate) struct Deflator
{
    stream:   Compress,
    finished: bool
}

impl Deflator
{
    pub fn new(level: Compression) -> Deflator
    {
        Deflator {
            stream:   Compress::new(level, true),
            finished: false
        }
    }

    /// Deflate from `input` into `output`; `finish` ends the stream.
    /// Returns `(consumed, produced)`.
    pub fn deflate(
        &mut self, input: &[u8], output: &mut [u8], finish: bool
    ) -> Result<(usize, usize), PngError>
    {
        let flush = if finish
        {
            FlushCompress::Finish
        }
        else
        {
            FlushCompress::Sync
        };

        let in_before = self.stream.total_in();
        let out_before = self.stream.total_out();

        let status = self
            .stream
            .compress(input, output, flush)
            .map_err(|_| PngError::Zlib("deflate failed"))?;

        match status
        {
            Status::Ok => {}
            Status::StreamEnd => self.finished = true,
            Status::BufError =>
            {
                return Err(PngError::Zlib("deflate made no progress"));
            }
        }

        let consumed = (self.stream.total_in() - in_before) as usize;
        let produced = (self.stream.total_out() - out_before) as usize;

        Ok((consumed, produced))
    }

    /// True once the trailer has been written.
    pub const fn is_finished(&self) -> bool
    {
        self.finished
    }
}

#[test]
fn deflate_then_inflate_round_trips()
{
    let data = b"the quick brown fox jumps over the lazy dog";

    let mut deflator = Deflator::new(Compression::default());
    let mut compressed = [0_u8; 256];
    let (consumed, produced) = deflator.deflate(data, &mut compressed, true).unwrap();

    assert_eq!(consumed, data.len());
    assert!(deflator.is_finished());

    let mut inflator = Inflator::new();
    let mut plain = [0_u8; 256];
    let (eaten, got) = inflator.inflate(&compressed[..produced], &mut plain).unwrap();

    assert_eq!(eaten, produced);
    assert_eq!(&plain[..got], data);
    assert!(inflator.is_finished());
}

#[test]
fn inflate_in_dribs_and_drabs()
{
    let data: Vec<u8> = (0..=255).cycle().take(4096).collect();

    let mut deflator = Deflator::new(Compression::default());
    let mut compressed = vec![0_u8; 8192];
    let (_, produced) = deflator.deflate(&data, &mut compressed, true).unwrap();
    compressed.truncate(produced);

    let mut inflator = Inflator::new();
    let mut plain = Vec::new();
    let mut scratch = [0_u8; 97];

    for piece in compressed.chunks(13)
    {
        let mut offset = 0;
        while offset < piece.len()
        {
            let (eaten, got) = inflator.inflate(&piece[offset..], &mut scratch).unwrap();
            plain.extend_from_slice(&scratch[..got]);
            offset += eaten;

            if eaten == 0 && got == 0
            {
                break;
            }
        }
    }

    assert_eq!(plain, data);
    assert!(inflator.is_finished());
}

#[test]
fn garbage_surfaces_a_zlib_error()
{
    let mut inflator = Inflator::new();
    let mut out = [0_u8; 64];

    // 0xFF 0xFF is not a valid zlib header
    let result = inflator.inflate(&[0xFF, 0xFF, 0x00, 0x01], &mut out);
    assert!(matches!(result, Err(PngError::Zlib(_))));
}
