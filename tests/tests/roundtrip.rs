//! Encode-then-decode laws across colour types, depths and interlace.
use rill_png::{
    Background, InterlaceMethod, PngColor, PngEncoder, PngImage, Transparency
};
use rill_tests::{decode, encode_image, inflate, parse_chunks};

/// Deterministic pixel bytes with zeroed row-padding kept trivially by
/// using widths that fill whole bytes.
fn test_blob(len: usize) -> Vec<u8>
{
    (0..len).map(|i| (i * 31 + 7) as u8).collect()
}

fn populated(color: PngColor, depth: u8, width: usize, height: usize) -> PngImage
{
    let mut image = PngImage::new();
    let samples = usize::from(color.num_components());
    let stride = (width * usize::from(depth) * samples + 7) / 8;

    image
        .populate_with_image(color, depth, width, height, test_blob(stride * height))
        .unwrap();
    image
}

#[test]
fn all_colour_types_and_depths_round_trip()
{
    let cases: [(PngColor, u8); 13] = [
        (PngColor::Luma, 1),
        (PngColor::Luma, 2),
        (PngColor::Luma, 4),
        (PngColor::Luma, 8),
        (PngColor::Luma, 16),
        (PngColor::Palette, 1),
        (PngColor::Palette, 2),
        (PngColor::Palette, 4),
        (PngColor::Palette, 8),
        (PngColor::LumaA, 8),
        (PngColor::LumaA, 16),
        (PngColor::RGB, 8),
        (PngColor::RGBA, 16)
    ];

    for (color, depth) in cases
    {
        // width 8 keeps sub-byte rows free of padding bits
        let image = populated(color, depth, 8, 3);
        let source = image.blob.clone();

        let decoded = decode(&encode_image(image));

        assert_eq!(decoded.blob, source, "{color:?} at depth {depth}");
        assert_eq!(decoded.color, color);
        assert_eq!(decoded.depth, depth);
    }
}

#[test]
fn two_by_two_red_square()
{
    let red = [0xFF, 0x00, 0x00];
    let mut blob = Vec::new();
    for _ in 0..4
    {
        blob.extend_from_slice(&red);
    }

    let mut image = PngImage::new();
    image
        .populate_with_image(PngColor::RGB, 8, 2, 2, blob.clone())
        .unwrap();

    let decoded = decode(&encode_image(image));
    assert_eq!(decoded.blob, blob);
    assert_eq!(decoded.blob.len(), 12);
}

#[test]
fn interlaced_output_decodes_to_the_same_raster()
{
    // 8x8 grey, each pixel is row*8 + col
    let blob: Vec<u8> = (0..64_u8).collect();

    let mut plain = PngImage::new();
    plain
        .populate_with_image(PngColor::Luma, 8, 8, 8, blob.clone())
        .unwrap();

    let mut adam7 = PngImage::new();
    adam7
        .populate_with_image(PngColor::Luma, 8, 8, 8, blob.clone())
        .unwrap();
    adam7.interlace = InterlaceMethod::Adam7;

    let plain_stream = encode_image(plain);
    let adam7_stream = encode_image(adam7);
    assert_ne!(plain_stream, adam7_stream);

    let from_plain = decode(&plain_stream);
    let from_adam7 = decode(&adam7_stream);

    assert_eq!(from_plain.blob, blob);
    assert_eq!(from_adam7.blob, blob);
    assert_eq!(from_adam7.interlace, InterlaceMethod::Adam7);
}

#[test]
fn interlaced_sub_byte_round_trip()
{
    let image = populated(PngColor::Luma, 1, 8, 8);
    let source = image.blob.clone();

    let mut adam7 = PngImage::new();
    adam7
        .populate_with_image(PngColor::Luma, 1, 8, 8, source.clone())
        .unwrap();
    adam7.interlace = InterlaceMethod::Adam7;

    let decoded = decode(&encode_image(adam7));
    assert_eq!(decoded.blob, source);
}

#[test]
fn emitted_stream_checks_out_against_the_reference_zlib()
{
    let mut image = PngImage::new();
    image
        .populate_with_image(PngColor::Luma, 8, 4, 1, vec![1, 2, 3, 4])
        .unwrap();

    let stream = encode_image(image);
    let chunks = parse_chunks(&stream);

    assert_eq!(chunks.first().unwrap().0, *b"IHDR");
    assert_eq!(chunks.last().unwrap().0, *b"IEND");

    let idat: Vec<u8> = chunks
        .iter()
        .filter(|(name, _)| name == b"IDAT")
        .flat_map(|(_, payload)| payload.clone())
        .collect();

    // filter byte zero, then the packed row
    assert_eq!(inflate(&idat), [0, 1, 2, 3, 4]);
}

#[test]
fn palette_background_and_transparency_survive()
{
    let mut image = PngImage::new();
    image
        .populate_with_image(PngColor::Palette, 4, 8, 2, test_blob(8))
        .unwrap();

    for (i, entry) in image.palette.iter_mut().take(16).enumerate()
    {
        *entry = u32::from(0x80 + i as u8) << 24 | (i as u32) * 0x000A_0503;
    }
    image.background = Some(Background::Index(3));

    let expected_palette = image.palette;
    let expected_blob = image.blob.clone();

    let decoded = decode(&encode_image(image));

    assert_eq!(decoded.palette[..16], expected_palette[..16]);
    assert_eq!(decoded.background, Some(Background::Index(3)));
    assert_eq!(decoded.blob, expected_blob);
}

#[test]
fn grey_transparency_key_survives()
{
    let mut image = PngImage::new();
    image
        .populate_with_image(PngColor::Luma, 8, 2, 1, vec![0x10, 0x42])
        .unwrap();
    image.transparency = Some(Transparency::Grey(0x42));

    let decoded = decode(&encode_image(image));
    assert_eq!(decoded.transparency, Some(Transparency::Grey(0x42)));
}

#[test]
fn rgb_transparency_key_survives()
{
    let mut image = PngImage::new();
    image
        .populate_with_image(PngColor::RGB, 16, 1, 1, vec![0, 1, 0, 2, 0, 3])
        .unwrap();
    image.transparency = Some(Transparency::Rgb(1, 2, 3));
    image.background = Some(Background::Rgb(9, 8, 7));

    let decoded = decode(&encode_image(image));
    assert_eq!(decoded.transparency, Some(Transparency::Rgb(1, 2, 3)));
    assert_eq!(decoded.background, Some(Background::Rgb(9, 8, 7)));
}

#[test]
fn converted_images_encode_back_to_rgba()
{
    let source = vec![1, 2, 3, 4, 5, 6, 7, 8];

    let mut image = PngImage::new();
    image
        .populate_with_image(PngColor::RGBA, 8, 2, 1, source.clone())
        .unwrap();
    image.convert_to_rgba32(false).unwrap();
    assert_eq!(image.color, PngColor::HostRgba);

    let decoded = decode(&encode_image(image));

    assert_eq!(decoded.color, PngColor::RGBA);
    assert_eq!(decoded.depth, 8);
    assert_eq!(decoded.blob, source);
}

#[test]
fn encoder_pump_respects_tiny_output_slices()
{
    let image = populated(PngColor::RGB, 8, 8, 8);
    let source = image.blob.clone();

    let mut encoder = PngEncoder::new(image).unwrap();
    let mut stream = Vec::new();
    let mut tiny = [0_u8; 7];

    loop
    {
        let n = encoder.pump(&mut tiny);
        stream.extend_from_slice(&tiny[..n]);

        if n == 0
            && encoder
                .status()
                .contains(rill_png::PngStatus::FINISHED)
        {
            break;
        }
    }

    assert_eq!(decode(&stream).blob, source);
}

#[test]
fn full_circle_through_both_pumps_twice()
{
    let image = populated(PngColor::LumaA, 8, 8, 4);
    let source = image.blob.clone();

    let once = decode(&encode_image(image));
    let twice = decode(&encode_image(once));

    assert_eq!(twice.blob, source);
}
