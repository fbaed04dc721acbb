//! Decode-side behaviour on hand-built streams.
use rill_png::{Background, PngColor, PngDecoder, PngStatus, Transparency};
use rill_tests::{build_png, chunk, decode, deflate, ihdr_payload, SIGNATURE};

#[test]
fn minimal_grey_pixel()
{
    // 1x1, 8-bit greyscale, one unfiltered scanline
    let stream = build_png(1, 1, 8, 0, 0, &[0x00, 0xFF]);
    let image = decode(&stream);

    assert_eq!((image.width, image.height), (1, 1));
    assert_eq!(image.stride, 1);
    assert_eq!(image.blob, [0xFF]);
    assert_eq!(image.color, PngColor::Luma);
}

#[test]
fn indexed_two_bit_scanline_and_palette()
{
    let mut stream = SIGNATURE.to_vec();

    chunk(&mut stream, b"IHDR", &ihdr_payload(4, 1, 2, 3, 0));
    chunk(&mut stream, b"PLTE", &[0, 0, 0, 255, 0, 0, 0, 255, 0, 0, 0, 255]);
    chunk(&mut stream, b"IDAT", &deflate(&[0x00, 0x1B]));
    chunk(&mut stream, b"IEND", &[]);

    let mut image = decode(&stream);

    // indices 0,1,2,3 packed most significant bits first
    assert_eq!(image.blob, [0x1B]);
    assert_eq!(image.palette[1], 0xFFFF_0000);
    assert_eq!(image.palette[2], 0xFF00_FF00);

    image.convert_to_rgba32(false).unwrap();

    let words: Vec<u32> = image
        .blob
        .chunks_exact(4)
        .map(|c| u32::from_ne_bytes(c.try_into().unwrap()))
        .collect();

    assert_eq!(
        words,
        [0xFF00_0000, 0xFFFF_0000, 0xFF00_FF00, 0xFF00_00FF]
    );
}

#[test]
fn paeth_and_up_filters_reconstruct()
{
    // seed row unfiltered, second row Paeth, third row Up, all with
    // zero deltas: every row equals the seed
    let scanlines = [
        0, 0x10, 0x20, 0x30, //
        4, 0, 0, 0, //
        2, 0, 0, 0,
    ];
    let image = decode(&build_png(3, 3, 8, 0, 0, &scanlines));

    assert_eq!(
        image.blob,
        [0x10, 0x20, 0x30, 0x10, 0x20, 0x30, 0x10, 0x20, 0x30]
    );
}

#[test]
fn every_filter_type_on_rgb_rows()
{
    // five rows of 3x5 RGB, one per filter type, alternating bytes
    let row: [u8; 9] = [10, 20, 30, 40, 50, 60, 70, 80, 90];
    let mut raster = Vec::new();
    for _ in 0..5
    {
        raster.extend_from_slice(&row);
    }

    // filter each row by hand against the previous raster row
    let mut scanlines = Vec::new();
    scanlines.push(0);
    scanlines.extend_from_slice(&row);

    // Sub: delta to the pixel three bytes left
    scanlines.push(1);
    for i in 0..9
    {
        let left = if i >= 3 { row[i - 3] } else { 0 };
        scanlines.push(row[i].wrapping_sub(left));
    }
    // Up: identical rows make this all zero
    scanlines.push(2);
    scanlines.extend_from_slice(&[0; 9]);

    // Average of identical left/up neighbourhoods
    scanlines.push(3);
    for i in 0..9
    {
        let left = if i >= 3 { row[i - 3] } else { 0 };
        let mean = (u16::from(left) + u16::from(row[i])) / 2;
        scanlines.push(row[i].wrapping_sub(mean as u8));
    }
    // Paeth picks up for identical rows past the first pixel
    scanlines.push(4);
    for i in 0..9
    {
        let left = if i >= 3 { row[i - 3] } else { 0 };
        let up = row[i];
        let up_left = left;

        let p = i16::from(left) + i16::from(up) - i16::from(up_left);
        let pa = (p - i16::from(left)).abs();
        let pb = (p - i16::from(up)).abs();
        let pc = (p - i16::from(up_left)).abs();

        let predictor = if pa <= pb && pa <= pc
        {
            left
        }
        else if pb <= pc
        {
            up
        }
        else
        {
            up_left
        };
        scanlines.push(row[i].wrapping_sub(predictor));
    }

    let image = decode(&build_png(3, 5, 8, 2, 0, &scanlines));
    assert_eq!(image.blob, raster);
}

#[test]
fn hand_built_interlaced_stream()
{
    // 2x2 grey: Adam7 sends pixel (0,0) in pass 1, (0,1) in pass 6,
    // and the bottom row in pass 7
    let scanlines = [
        0, 1, // pass 1
        0, 2, // pass 6
        0, 3, 4, // pass 7
    ];
    let image = decode(&build_png(2, 2, 8, 0, 1, &scanlines));

    assert_eq!(image.blob, [1, 2, 3, 4]);
}

#[test]
fn sixteen_bit_samples_stay_big_endian()
{
    let stream = build_png(2, 1, 16, 0, 0, &[0x00, 0x12, 0x34, 0xAB, 0xCD]);
    let image = decode(&stream);

    assert_eq!(image.stride, 4);
    assert_eq!(image.blob, [0x12, 0x34, 0xAB, 0xCD]);
}

#[test]
fn trns_and_bkgd_reach_the_descriptor()
{
    let mut stream = SIGNATURE.to_vec();

    chunk(&mut stream, b"IHDR", &ihdr_payload(1, 1, 8, 0, 0));
    chunk(&mut stream, b"tRNS", &[0x00, 0x42]);
    chunk(&mut stream, b"bKGD", &[0x00, 0x99]);
    chunk(&mut stream, b"IDAT", &deflate(&[0x00, 0x42]));
    chunk(&mut stream, b"IEND", &[]);

    let image = decode(&stream);

    assert_eq!(image.transparency, Some(Transparency::Grey(0x42)));
    assert_eq!(image.background, Some(Background::Grey(0x99)));
}

#[test]
fn unknown_and_informational_chunks_are_tolerated()
{
    let mut stream = SIGNATURE.to_vec();

    chunk(&mut stream, b"IHDR", &ihdr_payload(1, 1, 8, 0, 0));
    chunk(&mut stream, b"gAMA", &45455_u32.to_be_bytes());
    chunk(&mut stream, b"pHYs", &[0, 0, 11, 18, 0, 0, 11, 18, 1]);
    chunk(&mut stream, b"tIME", &[7, 230, 8, 1, 12, 0, 0]);
    chunk(&mut stream, b"ruNk", &[1, 2, 3, 4]);
    chunk(&mut stream, b"IDAT", &deflate(&[0x00, 0x7F]));
    chunk(&mut stream, b"IEND", &[]);

    let image = decode(&stream);
    assert_eq!(image.blob, [0x7F]);
}

#[test]
fn multiple_idats_form_one_stream()
{
    let compressed = deflate(&[0x00, 0x01, 0x02, 0x03, 0x04]);
    let (first, second) = compressed.split_at(compressed.len() / 2);

    let mut stream = SIGNATURE.to_vec();
    chunk(&mut stream, b"IHDR", &ihdr_payload(4, 1, 8, 0, 0));
    chunk(&mut stream, b"IDAT", first);
    chunk(&mut stream, b"IDAT", second);
    chunk(&mut stream, b"IEND", &[]);

    let image = decode(&stream);
    assert_eq!(image.blob, [0x01, 0x02, 0x03, 0x04]);
}

#[test]
fn stride_matches_the_shape_invariant()
{
    // width * bpp * samples rounded up to whole bytes
    let cases: [(u32, u8, u8, usize); 5] = [
        (5, 1, 0, 1),  // 5 bits of grey
        (5, 2, 3, 2),  // 10 bits of indices
        (3, 8, 2, 9),  // RGB bytes
        (2, 16, 6, 16), // RGBA words
        (9, 4, 0, 5),  // 36 bits of grey
    ];

    for (width, depth, colour, stride) in cases
    {
        let bits = u32::from(depth)
            * width
            * match colour
            {
                2 => 3,
                6 => 4,
                _ => 1
            };
        let row_bytes = ((bits + 7) / 8) as usize;

        let mut scanlines = Vec::new();
        scanlines.push(0);
        scanlines.extend(std::iter::repeat(0_u8).take(row_bytes));

        let image = decode(&build_png(width, 1, depth, colour, 0, &scanlines));
        assert_eq!(image.stride, stride, "width {width} depth {depth} colour {colour}");
        assert_eq!(image.blob.len(), stride);
    }
}

#[test]
fn drip_fed_decode_matches_one_shot()
{
    let scanlines = [0, 1, 2, 3, 4, 0, 5, 6, 7, 8];
    let stream = build_png(4, 2, 8, 0, 0, &scanlines);

    let whole = decode(&stream);

    let mut decoder = PngDecoder::new();
    for piece in stream.chunks(3)
    {
        decoder.feed(piece);
    }
    assert!(decoder.status().contains(PngStatus::FINISHED));
    assert_eq!(decoder.image().blob, whole.blob);
}
