//! Shared helpers for the end-to-end codec tests: reference zlib
//! plumbing, raw chunk building and pump-driving loops.
use std::io::Read;
use std::io::Write;

use rill_png::{PngDecoder, PngEncoder, PngImage, PngStatus};

pub const SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// One-shot zlib compression through the reference engine.
pub fn deflate(data: &[u8]) -> Vec<u8>
{
    let mut encoder =
        flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());

    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// One-shot zlib decompression through the reference engine.
pub fn inflate(data: &[u8]) -> Vec<u8>
{
    let mut out = Vec::new();

    flate2::read::ZlibDecoder::new(data)
        .read_to_end(&mut out)
        .unwrap();
    out
}

/// Append one wire chunk: length, type, payload, CRC.
pub fn chunk(stream: &mut Vec<u8>, name: &[u8; 4], payload: &[u8])
{
    stream.extend_from_slice(&(payload.len() as u32).to_be_bytes());

    let type_start = stream.len();
    stream.extend_from_slice(name);
    stream.extend_from_slice(payload);

    let crc = rill_png::crc::crc32(&stream[type_start..]);
    stream.extend_from_slice(&crc.to_be_bytes());
}

pub fn ihdr_payload(width: u32, height: u32, depth: u8, colour: u8, interlace: u8) -> Vec<u8>
{
    let mut payload = Vec::new();

    payload.extend_from_slice(&width.to_be_bytes());
    payload.extend_from_slice(&height.to_be_bytes());
    payload.extend_from_slice(&[depth, colour, 0, 0, interlace]);
    payload
}

/// Build a complete single-IDAT stream around raw (filtered) scanline
/// bytes.
pub fn build_png(
    width: u32, height: u32, depth: u8, colour: u8, interlace: u8, scanlines: &[u8]
) -> Vec<u8>
{
    let mut stream = SIGNATURE.to_vec();

    chunk(&mut stream, b"IHDR", &ihdr_payload(width, height, depth, colour, interlace));
    chunk(&mut stream, b"IDAT", &deflate(scanlines));
    chunk(&mut stream, b"IEND", &[]);
    stream
}

/// Split a stream into its (type, payload) chunks, signature checked.
pub fn parse_chunks(stream: &[u8]) -> Vec<([u8; 4], Vec<u8>)>
{
    assert_eq!(stream[..8], SIGNATURE);

    let mut chunks = Vec::new();
    let mut at = 8;

    while at < stream.len()
    {
        let length =
            u32::from_be_bytes(stream[at..at + 4].try_into().unwrap()) as usize;
        let name: [u8; 4] = stream[at + 4..at + 8].try_into().unwrap();
        let payload = stream[at + 8..at + 8 + length].to_vec();

        chunks.push((name, payload));
        at += 8 + length + 4;
    }
    chunks
}

/// Decode a whole stream, asserting it finishes cleanly.
pub fn decode(stream: &[u8]) -> PngImage
{
    let mut decoder = PngDecoder::new();
    let status = decoder.feed(stream);

    assert!(
        status.contains(PngStatus::FINISHED),
        "decode did not finish, status {status:?}"
    );
    decoder.into_image()
}

/// Run an encoder to completion, collecting the whole stream.
pub fn drain_encoder(encoder: &mut PngEncoder) -> Vec<u8>
{
    let mut piece = [0_u8; 2048];
    let mut stream = Vec::new();

    loop
    {
        let n = encoder.pump(&mut piece);
        stream.extend_from_slice(&piece[..n]);

        assert!(
            !encoder.status().contains(PngStatus::ERROR),
            "encode failed, status {:?}",
            encoder.status()
        );
        if n == 0 && encoder.status().contains(PngStatus::FINISHED)
        {
            return stream;
        }
    }
}

/// Encode a populated descriptor to a complete stream.
pub fn encode_image(image: PngImage) -> Vec<u8>
{
    let mut encoder = PngEncoder::new(image).unwrap();
    drain_encoder(&mut encoder)
}
