//! Parsing of completed non-IDAT chunk payloads.
//!
//! The chunk framer assembles payloads and verifies their CRC before
//! anything here runs, so these helpers see whole, trusted slices.
use rill_core::ByteReader;

use crate::enums::{InterlaceMethod, PngColor};
use crate::error::PngError;
use crate::image::{Background, PngImage, Transparency};
use crate::options::PngOptions;

/// Digest the 13-byte IHDR payload into the descriptor.
///
/// Rejects everything the wire format forbids: bad payload size, zero
/// dimensions, unknown colour types, depths illegal for the colour
/// type, nonzero compression or filter methods, interlace above 1.
pub(crate) fn parse_ihdr(
    image: &mut PngImage, payload: &[u8], options: &PngOptions
) -> Result<(), PngError>
{
    if payload.len() != 13
    {
        return Err(PngError::OutOfSpecs("IHDR payload is not 13 bytes"));
    }
    let mut reader = ByteReader::new(payload);

    let width = reader.get_u32_be() as usize;
    let height = reader.get_u32_be() as usize;
    let depth = reader.get_u8();
    let colour = reader.get_u8();
    let compression = reader.get_u8();
    let filter = reader.get_u8();
    let interlace = reader.get_u8();

    if width == 0 || height == 0
    {
        return Err(PngError::OutOfSpecs("zero width or height"));
    }
    if width > options.max_width() || height > options.max_height()
    {
        return Err(PngError::ImplementationLimit("image dimensions above the configured maximum"));
    }

    let color =
        PngColor::from_int(colour).ok_or(PngError::OutOfSpecs("unknown colour type"))?;

    if !color.is_legal_depth(depth)
    {
        return Err(PngError::OutOfSpecs("bit depth illegal for colour type"));
    }
    if compression != 0 || filter != 0
    {
        return Err(PngError::OutOfSpecs("unknown compression or filter method"));
    }
    let interlace = InterlaceMethod::from_int(interlace)
        .ok_or(PngError::OutOfSpecs("interlace method above 1"))?;

    image.width = width;
    image.height = height;
    image.depth = depth;
    image.color = color;
    image.compression = compression;
    image.filter_method = filter;
    image.interlace = interlace;
    image.recompute_layout();

    Ok(())
}

/// Fill palette entries from PLTE; alpha stays at its default 0xFF.
pub(crate) fn parse_plte(image: &mut PngImage, payload: &[u8])
{
    if payload.len() % 3 != 0
    {
        log::warn!("PLTE length {} is not a multiple of 3", payload.len());
    }

    for (entry, rgb) in image.palette.iter_mut().zip(payload.chunks_exact(3))
    {
        *entry = 0xFF00_0000
            | u32::from(rgb[0]) << 16
            | u32::from(rgb[1]) << 8
            | u32::from(rgb[2]);
    }
}

/// Digest tRNS; its meaning depends on the colour type.
pub(crate) fn parse_trns(image: &mut PngImage, payload: &[u8])
{
    match image.color
    {
        PngColor::Palette =>
        {
            // one alpha byte per leading palette entry
            for (entry, &alpha) in image.palette.iter_mut().zip(payload.iter())
            {
                *entry = (*entry & 0x00FF_FFFF) | u32::from(alpha) << 24;
            }
        }
        PngColor::Luma =>
        {
            let mut reader = ByteReader::new(payload);
            image.transparency = Some(Transparency::Grey(reader.get_u16_be()));
        }
        PngColor::RGB =>
        {
            let mut reader = ByteReader::new(payload);
            let r = reader.get_u16_be();
            let g = reader.get_u16_be();
            let b = reader.get_u16_be();
            image.transparency = Some(Transparency::Rgb(r, g, b));
        }
        _ =>
        {
            // colour types with a real alpha channel don't get a key
            log::warn!("ignoring tRNS for colour type {:?}", image.color);
        }
    }
}

/// Digest bKGD; its layout also depends on the colour type.
pub(crate) fn parse_bkgd(image: &mut PngImage, payload: &[u8])
{
    let mut reader = ByteReader::new(payload);

    image.background = match image.color
    {
        PngColor::Palette => Some(Background::Index(reader.get_u8())),
        PngColor::Luma | PngColor::LumaA => Some(Background::Grey(reader.get_u16_be())),
        PngColor::RGB | PngColor::RGBA =>
        {
            let r = reader.get_u16_be();
            let g = reader.get_u16_be();
            let b = reader.get_u16_be();
            Some(Background::Rgb(r, g, b))
        }
        PngColor::HostRgba => None
    };
}
