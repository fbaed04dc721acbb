//! Failure paths: every broken stream must latch the right status
//! bits and leave the decoder parked.
use rill_png::{PngDecoder, PngOptions, PngStatus};
use rill_tests::{build_png, chunk, deflate, ihdr_payload, SIGNATURE};

fn feed_all(stream: &[u8]) -> (PngDecoder, PngStatus)
{
    let mut decoder = PngDecoder::new();
    let status = decoder.feed(stream);
    (decoder, status)
}

#[test]
fn not_a_png()
{
    let (_, status) = feed_all(b"BM6\x00\x00\x00 a bitmap, of all things");

    assert!(status.contains(PngStatus::ERROR | PngStatus::NO_PNG));
    assert!(!status.contains(PngStatus::IS_DRAWABLE));
}

#[test]
fn corrupted_crc_mid_stream()
{
    let compressed = deflate(&[0x00, 1, 2, 3, 0x00, 4, 5, 6]);
    let (first, second) = compressed.split_at(compressed.len() / 2);

    let mut stream = SIGNATURE.to_vec();
    chunk(&mut stream, b"IHDR", &ihdr_payload(3, 2, 8, 0, 0));

    // corrupt the first IDAT's trailing CRC
    chunk(&mut stream, b"IDAT", first);
    let crc_at = stream.len() - 1;
    stream[crc_at] ^= 0xFF;

    chunk(&mut stream, b"IDAT", second);
    chunk(&mut stream, b"IEND", &[]);

    let (_, status) = feed_all(&stream);

    assert!(status.contains(PngStatus::ERROR | PngStatus::CRC_ERR));
    assert!(!status.contains(PngStatus::IS_DRAWABLE));
    assert!(!status.contains(PngStatus::FINISHED));
}

#[test]
fn crc_checking_can_be_waived()
{
    let mut stream = build_png(1, 1, 8, 0, 0, &[0x00, 0x55]);
    // the IDAT CRC sits just before the 12-byte IEND chunk
    let crc_at = stream.len() - 13;
    stream[crc_at] ^= 0x01;

    // strict decode fails
    let (_, strict) = feed_all(&stream);
    assert!(strict.contains(PngStatus::ERROR));

    // lenient decode shrugs
    let mut lenient =
        PngDecoder::new_with_options(PngOptions::default().set_confirm_crc(false));
    let status = lenient.feed(&stream);
    assert!(status.contains(PngStatus::FINISHED), "status {status:?}");
}

#[test]
fn zero_dimensions_are_out_of_specs()
{
    let (_, status) = feed_all(&build_png(0, 1, 8, 0, 0, &[]));
    assert!(status.contains(PngStatus::ERROR | PngStatus::OUT_OF_SPECS));

    let (_, status) = feed_all(&build_png(1, 0, 8, 0, 0, &[]));
    assert!(status.contains(PngStatus::ERROR | PngStatus::OUT_OF_SPECS));
}

#[test]
fn illegal_depth_for_colour_type()
{
    // RGB at 4 bits per sample
    let (_, status) = feed_all(&build_png(2, 2, 4, 2, 0, &[0; 8]));
    assert!(status.contains(PngStatus::ERROR | PngStatus::OUT_OF_SPECS));
}

#[test]
fn unknown_interlace_compression_or_filter_method()
{
    let mut stream = SIGNATURE.to_vec();
    let mut bad_interlace = ihdr_payload(1, 1, 8, 0, 0);
    bad_interlace[12] = 2;
    chunk(&mut stream, b"IHDR", &bad_interlace);
    let (_, status) = feed_all(&stream);
    assert!(status.contains(PngStatus::OUT_OF_SPECS));

    let mut stream = SIGNATURE.to_vec();
    let mut bad_compression = ihdr_payload(1, 1, 8, 0, 0);
    bad_compression[10] = 1;
    chunk(&mut stream, b"IHDR", &bad_compression);
    let (_, status) = feed_all(&stream);
    assert!(status.contains(PngStatus::OUT_OF_SPECS));

    let mut stream = SIGNATURE.to_vec();
    let mut bad_filter = ihdr_payload(1, 1, 8, 0, 0);
    bad_filter[11] = 1;
    chunk(&mut stream, b"IHDR", &bad_filter);
    let (_, status) = feed_all(&stream);
    assert!(status.contains(PngStatus::OUT_OF_SPECS));
}

#[test]
fn scanline_filter_byte_out_of_range()
{
    let (_, status) = feed_all(&build_png(1, 1, 8, 0, 0, &[7, 0x00]));
    assert!(status.contains(PngStatus::ERROR | PngStatus::OUT_OF_SPECS));
}

#[test]
fn first_chunk_must_be_ihdr()
{
    let mut stream = SIGNATURE.to_vec();
    chunk(&mut stream, b"IDAT", &deflate(&[0x00, 0x00]));

    let (_, status) = feed_all(&stream);
    assert!(status.contains(PngStatus::ERROR | PngStatus::OUT_OF_SPECS));
}

#[test]
fn broken_zlib_stream()
{
    // valid chunk framing around bytes that are not a zlib stream
    let mut bad = SIGNATURE.to_vec();
    chunk(&mut bad, b"IHDR", &ihdr_payload(1, 1, 8, 0, 0));
    chunk(&mut bad, b"IDAT", &[0xFF, 0xFF, 0x13, 0x37]);
    chunk(&mut bad, b"IEND", &[]);

    let (_, status) = feed_all(&bad);
    assert!(status.contains(PngStatus::ERROR | PngStatus::ZLIB_ERR));
}

#[test]
fn truncated_stream_surfaces_on_finish()
{
    let stream = build_png(4, 4, 8, 0, 0, &{
        let mut raw = Vec::new();
        for _ in 0..4
        {
            raw.push(0);
            raw.extend_from_slice(&[9, 9, 9, 9]);
        }
        raw
    });

    let mut decoder = PngDecoder::new();
    decoder.feed(&stream[..stream.len() - 20]);

    assert!(decoder.status().contains(PngStatus::LOADING));

    let status = decoder.finish();
    assert!(status.contains(PngStatus::ERROR | PngStatus::IDAT_ERR));
}

#[test]
fn missing_scanlines_at_iend()
{
    // deflate stream ends cleanly but holds only one of two rows
    let mut stream = SIGNATURE.to_vec();
    chunk(&mut stream, b"IHDR", &ihdr_payload(2, 2, 8, 0, 0));
    chunk(&mut stream, b"IDAT", &deflate(&[0x00, 1, 2]));
    chunk(&mut stream, b"IEND", &[]);

    let (_, status) = feed_all(&stream);
    assert!(status.contains(PngStatus::ERROR | PngStatus::IDAT_ERR));
}

#[test]
fn oversized_ancillary_chunk_hits_the_limit()
{
    let mut stream = SIGNATURE.to_vec();
    chunk(&mut stream, b"IHDR", &ihdr_payload(1, 1, 8, 0, 0));
    chunk(&mut stream, b"teXt", &vec![0x41; 40 * 1024]);
    chunk(&mut stream, b"IDAT", &deflate(&[0x00, 0x00]));
    chunk(&mut stream, b"IEND", &[]);

    let (_, status) = feed_all(&stream);
    assert!(status.contains(PngStatus::ERROR | PngStatus::IMP_LIMIT));
}

#[test]
fn errors_latch_and_stay()
{
    let (mut decoder, first) = feed_all(b"not a png");
    let again = decoder.feed(&build_png(1, 1, 8, 0, 0, &[0x00, 0xFF]));
    let finished = decoder.finish();

    assert_eq!(first, again);
    assert_eq!(first, finished);
}

#[test]
fn disposed_decoder_stays_quiet()
{
    let mut decoder = PngDecoder::new();
    decoder.dispose();

    let status = decoder.feed(&build_png(1, 1, 8, 0, 0, &[0x00, 0xFF]));
    assert!(status.contains(PngStatus::DISPOSED));
    assert!(!status.contains(PngStatus::FINISHED));
}
