//! Post-decode conversion into packed host RGBA words.
use rill_core::ByteReader;

use crate::enums::PngColor;
use crate::error::PngError;
use crate::image::{PngImage, Transparency};

/// Walk the sub-byte samples of one scanline, most significant bits
/// first, handing `(raw, scaled)` pairs to `emit`: the raw sample for
/// transparency-key matching and the 0..=255 expansion for display.
fn for_each_packed_sample(
    line: &[u8], width: usize, depth: u8, mut emit: impl FnMut(u16, u8)
)
{
    let mask = (1_u16 << depth) - 1;
    let mut col = 0;

    for &byte in line
    {
        let mut bits = byte;

        for _ in 0..8 / depth
        {
            if col >= width
            {
                break;
            }
            let raw = u16::from(bits >> (8 - depth)) & mask;
            let scaled = ((raw * 255) / mask) as u8;

            emit(raw, scaled);
            bits <<= depth;
            col += 1;
        }
    }
}

impl PngImage
{
    /// Convert the pixel blob to packed host-endian 32-bit RGBA words
    /// (`0xAARRGGBB`), releasing the original blob.
    ///
    /// Grey and indexed samples expand to full 8-bit channels; pixels
    /// matching the transparency key get alpha zero; `inverse_alpha`
    /// flips every alpha. 16-bit samples are truncated to their high
    /// byte, a documented precision loss. A descriptor already in
    /// host-RGBA form is left untouched.
    pub fn convert_to_rgba32(&mut self, inverse_alpha: bool) -> Result<(), PngError>
    {
        if self.color == PngColor::HostRgba
        {
            return Ok(());
        }
        if self.blob.len() != self.stride * self.height
        {
            return Err(PngError::GenericStatic("descriptor holds no pixels"));
        }

        let mut out: Vec<u8> = Vec::new();
        out.try_reserve_exact(4 * self.width * self.height)
            .map_err(|_| PngError::OutOfMemory)?;

        let fix_alpha = |alpha: u8| if inverse_alpha { 255 - alpha } else { alpha };
        let mut push = |a: u8, r: u8, g: u8, b: u8| {
            let word = u32::from(a) << 24 | u32::from(r) << 16 | u32::from(g) << 8 | u32::from(b);
            out.extend_from_slice(&word.to_ne_bytes());
        };

        let grey_key = match self.transparency
        {
            Some(Transparency::Grey(key)) => Some(key),
            _ => None
        };
        let rgb_key = match self.transparency
        {
            Some(Transparency::Rgb(r, g, b)) => Some((r, g, b)),
            _ => None
        };

        for row in 0..self.height
        {
            let line = &self.blob[row * self.stride..row * self.stride + self.stride];

            match self.color
            {
                PngColor::Luma if self.depth <= 8 =>
                {
                    for_each_packed_sample(line, self.width, self.depth, |raw, grey| {
                        let alpha = if grey_key == Some(raw) { 0 } else { 255 };
                        push(fix_alpha(alpha), grey, grey, grey);
                    });
                }
                PngColor::Luma =>
                {
                    let mut reader = ByteReader::new(line);
                    for _ in 0..self.width
                    {
                        let raw = reader.get_u16_be();
                        let grey = (raw >> 8) as u8;
                        let alpha = if grey_key == Some(raw) { 0 } else { 255 };
                        push(fix_alpha(alpha), grey, grey, grey);
                    }
                }
                PngColor::LumaA =>
                {
                    let mut reader = ByteReader::new(line);
                    for _ in 0..self.width
                    {
                        let (grey, alpha) = if self.depth == 8
                        {
                            (reader.get_u8(), reader.get_u8())
                        }
                        else
                        {
                            (
                                (reader.get_u16_be() >> 8) as u8,
                                (reader.get_u16_be() >> 8) as u8
                            )
                        };
                        push(fix_alpha(alpha), grey, grey, grey);
                    }
                }
                PngColor::RGB | PngColor::RGBA =>
                {
                    let has_alpha = self.color == PngColor::RGBA;
                    let mut reader = ByteReader::new(line);

                    for _ in 0..self.width
                    {
                        let (raw_r, raw_g, raw_b) = if self.depth == 8
                        {
                            (
                                u16::from(reader.get_u8()),
                                u16::from(reader.get_u8()),
                                u16::from(reader.get_u8())
                            )
                        }
                        else
                        {
                            (reader.get_u16_be(), reader.get_u16_be(), reader.get_u16_be())
                        };

                        let mut alpha = if has_alpha
                        {
                            if self.depth == 8
                            {
                                reader.get_u8()
                            }
                            else
                            {
                                (reader.get_u16_be() >> 8) as u8
                            }
                        }
                        else
                        {
                            255
                        };

                        if rgb_key == Some((raw_r, raw_g, raw_b))
                        {
                            alpha = 0;
                        }

                        let (r, g, b) = if self.depth == 8
                        {
                            (raw_r as u8, raw_g as u8, raw_b as u8)
                        }
                        else
                        {
                            ((raw_r >> 8) as u8, (raw_g >> 8) as u8, (raw_b >> 8) as u8)
                        };
                        push(fix_alpha(alpha), r, g, b);
                    }
                }
                PngColor::Palette =>
                {
                    let palette = &self.palette;
                    for_each_packed_sample(line, self.width, self.depth, |raw, _| {
                        let entry = palette[usize::from(raw) & 255];
                        let alpha = (entry >> 24) as u8;

                        push(
                            fix_alpha(alpha),
                            (entry >> 16) as u8,
                            (entry >> 8) as u8,
                            entry as u8
                        );
                    });
                }
                PngColor::HostRgba => unreachable!()
            }
        }

        self.blob = out;
        self.color = PngColor::HostRgba;
        self.depth = 32;
        self.sample_depth = 8;
        self.samples_per_pixel = 4;
        self.stride = 4 * self.width;

        Ok(())
    }

    /// Convert the pixel blob to packed host-endian 64-bit RGBA words
    /// (`0xAAAA_RRRR_GGGG_BBBB` nibble layout by channel), releasing
    /// the original blob.
    ///
    /// The three 256-entry lookup tables translate 8-bit-or-narrower
    /// channel values, which is where gamma ramps plug in; 16-bit
    /// sources bypass them. Alpha widens by `0x0101` so full coverage
    /// stays full.
    pub fn convert_to_rgba64(
        &mut self, r_trans: &[u16; 256], g_trans: &[u16; 256], b_trans: &[u16; 256],
        inverse_alpha: bool
    ) -> Result<(), PngError>
    {
        if self.color == PngColor::HostRgba
        {
            return Ok(());
        }
        if self.blob.len() != self.stride * self.height
        {
            return Err(PngError::GenericStatic("descriptor holds no pixels"));
        }

        let mut out: Vec<u8> = Vec::new();
        out.try_reserve_exact(8 * self.width * self.height)
            .map_err(|_| PngError::OutOfMemory)?;

        let fix_alpha = |alpha: u16| if inverse_alpha { 0xFFFF - alpha } else { alpha };
        let mut push = |a: u16, r: u16, g: u16, b: u16| {
            let word =
                u64::from(a) << 48 | u64::from(r) << 32 | u64::from(g) << 16 | u64::from(b);
            out.extend_from_slice(&word.to_ne_bytes());
        };

        let grey_key = match self.transparency
        {
            Some(Transparency::Grey(key)) => Some(key),
            _ => None
        };
        let rgb_key = match self.transparency
        {
            Some(Transparency::Rgb(r, g, b)) => Some((r, g, b)),
            _ => None
        };

        for row in 0..self.height
        {
            let line = &self.blob[row * self.stride..row * self.stride + self.stride];

            match self.color
            {
                PngColor::Luma if self.depth <= 8 =>
                {
                    for_each_packed_sample(line, self.width, self.depth, |raw, grey| {
                        let alpha = if grey_key == Some(raw) { 0 } else { 0xFFFF };
                        let at = usize::from(grey);

                        push(fix_alpha(alpha), r_trans[at], g_trans[at], b_trans[at]);
                    });
                }
                PngColor::Luma =>
                {
                    let mut reader = ByteReader::new(line);
                    for _ in 0..self.width
                    {
                        let raw = reader.get_u16_be();
                        let alpha = if grey_key == Some(raw) { 0 } else { 0xFFFF };

                        push(fix_alpha(alpha), raw, raw, raw);
                    }
                }
                PngColor::LumaA =>
                {
                    let mut reader = ByteReader::new(line);
                    for _ in 0..self.width
                    {
                        if self.depth == 8
                        {
                            let at = usize::from(reader.get_u8());
                            let alpha = u16::from(reader.get_u8()) * 0x0101;

                            push(fix_alpha(alpha), r_trans[at], g_trans[at], b_trans[at]);
                        }
                        else
                        {
                            let grey = reader.get_u16_be();
                            let alpha = reader.get_u16_be();

                            push(fix_alpha(alpha), grey, grey, grey);
                        }
                    }
                }
                PngColor::RGB | PngColor::RGBA =>
                {
                    let has_alpha = self.color == PngColor::RGBA;
                    let mut reader = ByteReader::new(line);

                    for _ in 0..self.width
                    {
                        if self.depth == 8
                        {
                            let raw_r = reader.get_u8();
                            let raw_g = reader.get_u8();
                            let raw_b = reader.get_u8();

                            let mut alpha = if has_alpha
                            {
                                u16::from(reader.get_u8()) * 0x0101
                            }
                            else
                            {
                                0xFFFF
                            };
                            if rgb_key
                                == Some((
                                    u16::from(raw_r),
                                    u16::from(raw_g),
                                    u16::from(raw_b)
                                ))
                            {
                                alpha = 0;
                            }

                            push(
                                fix_alpha(alpha),
                                r_trans[usize::from(raw_r)],
                                g_trans[usize::from(raw_g)],
                                b_trans[usize::from(raw_b)]
                            );
                        }
                        else
                        {
                            let raw_r = reader.get_u16_be();
                            let raw_g = reader.get_u16_be();
                            let raw_b = reader.get_u16_be();

                            let mut alpha =
                                if has_alpha { reader.get_u16_be() } else { 0xFFFF };
                            if rgb_key == Some((raw_r, raw_g, raw_b))
                            {
                                alpha = 0;
                            }

                            push(fix_alpha(alpha), raw_r, raw_g, raw_b);
                        }
                    }
                }
                PngColor::Palette =>
                {
                    let palette = &self.palette;
                    for_each_packed_sample(line, self.width, self.depth, |raw, _| {
                        let entry = palette[usize::from(raw) & 255];
                        let alpha = u16::from((entry >> 24) as u8) * 0x0101;

                        push(
                            fix_alpha(alpha),
                            r_trans[usize::from((entry >> 16) as u8)],
                            g_trans[usize::from((entry >> 8) as u8)],
                            b_trans[usize::from(entry as u8)]
                        );
                    });
                }
                PngColor::HostRgba => unreachable!()
            }
        }

        self.blob = out;
        self.color = PngColor::HostRgba;
        self.depth = 64;
        self.sample_depth = 16;
        self.samples_per_pixel = 4;
        self.stride = 8 * self.width;

        Ok(())
    }
}
