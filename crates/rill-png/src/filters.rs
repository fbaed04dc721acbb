//! Scanline filtering: the decode-side reconstructor and the
//! encode-side packing and filter seam.
use rill_core::ByteWriter;

use crate::constants::LINE_PAD;
use crate::enums::FilterMethod;
use crate::error::PngError;
use crate::image::PngImage;
use crate::interlace::Pass;

/// Nearest-of-three predictor as specified for filter type 4.
pub(crate) fn paeth_predictor(a: u8, b: u8, c: u8) -> u8
{
    // a = left, b = above, c = above-left
    let p = i16::from(a) + i16::from(b) - i16::from(c);
    let pa = (p - i16::from(a)).abs();
    let pb = (p - i16::from(b)).abs();
    let pc = (p - i16::from(c)).abs();

    if pa <= pb && pa <= pc
    {
        return a;
    }
    if pb <= pc
    {
        return b;
    }
    c
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum FilterState
{
    Wait,
    Start,
    StartPass,
    StartLine,
    FilterMode,
    Inline,
    Done
}

/// The decode-side filter reconstructor.
///
/// Pumps bytes out of the inflate staging buffer, reverses the
/// per-scanline filter and distributes the results into the pixel
/// blob at the positions the current interlace pass dictates.
///
/// The two scratch lines carry [`LINE_PAD`] bytes of leading zeros, so
/// left and upper-left neighbour reads at column zero land on zero
/// without any branching.
pub(crate) struct Reconstructor
{
    pub state:  FilterState,
    pass:       usize,
    row:        usize,
    col:        usize,
    line_pos:   usize,
    cur_filter: FilterMethod,
    this_line:  Vec<u8>,
    last_line:  Vec<u8>
}

impl Reconstructor
{
    pub fn new() -> Reconstructor
    {
        Reconstructor {
            state:      FilterState::Wait,
            pass:       0,
            row:        0,
            col:        0,
            line_pos:   0,
            cur_filter: FilterMethod::None,
            this_line:  Vec::new(),
            last_line:  Vec::new()
        }
    }

    /// Size the scratch lines for an image of the given stride.
    pub fn prepare(&mut self, stride: usize) -> Result<(), PngError>
    {
        let size = stride + 2 * LINE_PAD;

        self.this_line
            .try_reserve_exact(size)
            .map_err(|_| PngError::OutOfMemory)?;
        self.last_line
            .try_reserve_exact(size)
            .map_err(|_| PngError::OutOfMemory)?;
        self.this_line.resize(size, 0);
        self.last_line.resize(size, 0);

        self.state = FilterState::Start;
        Ok(())
    }

    /// Drain as much of `zbuf` as the machine can use, writing
    /// reconstructed pixels into `image.blob`. Consumed bytes are
    /// removed from the front of `zbuf`.
    pub fn run(&mut self, image: &mut PngImage, zbuf: &mut Vec<u8>) -> Result<(), PngError>
    {
        match self.advance(image, zbuf)
        {
            Ok(consumed) =>
            {
                zbuf.drain(..consumed);
                Ok(())
            }
            Err(err) =>
            {
                // the stream is abandoned, drop what was pending
                zbuf.clear();
                Err(err)
            }
        }
    }

    fn advance(&mut self, image: &mut PngImage, zbuf: &[u8]) -> Result<usize, PngError>
    {
        let bpp = usize::from(image.depth);
        let bytes_per_pixel = image.bytes_per_pixel();
        let mut consumed = 0;

        loop
        {
            match self.state
            {
                FilterState::Wait =>
                {
                    // image data arrived before the header set us up
                    log::warn!("filter machine driven while idle");
                    return Ok(consumed);
                }
                FilterState::Start =>
                {
                    self.pass = 0;
                    self.state = FilterState::StartPass;
                }
                FilterState::StartPass =>
                {
                    // skip passes that cover no pixels
                    while self.pass < Pass::count(image.interlace)
                        && Pass::for_index(image.interlace, self.pass)
                            .is_empty(image.width, image.height)
                    {
                        self.pass += 1;
                    }
                    if self.pass >= Pass::count(image.interlace)
                    {
                        self.state = FilterState::Done;
                        continue;
                    }

                    let pass = Pass::for_index(image.interlace, self.pass);
                    self.row = pass.start_row;

                    // the previous scanline reads as zero on pass entry
                    self.this_line.fill(0);
                    self.last_line.fill(0);

                    self.state = FilterState::StartLine;
                }
                FilterState::StartLine =>
                {
                    core::mem::swap(&mut self.this_line, &mut self.last_line);

                    let pass = Pass::for_index(image.interlace, self.pass);
                    self.col = pass.start_col;
                    self.line_pos = 0;
                    self.state = FilterState::FilterMode;
                }
                FilterState::FilterMode =>
                {
                    if zbuf.len() - consumed < 1
                    {
                        return Ok(consumed);
                    }
                    let mode = zbuf[consumed];
                    consumed += 1;

                    self.cur_filter = FilterMethod::from_int(mode)
                        .ok_or(PngError::OutOfSpecs("filter type outside 0..=4"))?;
                    self.state = FilterState::Inline;
                }
                FilterState::Inline =>
                {
                    let pass = Pass::for_index(image.interlace, self.pass);
                    let mut line_done = false;

                    while zbuf.len() - consumed >= bytes_per_pixel && !line_done
                    {
                        for index in 0..bytes_per_pixel
                        {
                            let raw = zbuf[consumed + index];
                            let at = LINE_PAD + self.line_pos + index;

                            let left = self.this_line[at - bytes_per_pixel];
                            let up = self.last_line[at];
                            let up_left = self.last_line[at - bytes_per_pixel];

                            let value = match self.cur_filter
                            {
                                FilterMethod::None => raw,
                                FilterMethod::Sub => raw.wrapping_add(left),
                                FilterMethod::Up => raw.wrapping_add(up),
                                FilterMethod::Average =>
                                {
                                    let mean = (u16::from(left) + u16::from(up)) / 2;
                                    raw.wrapping_add(mean as u8)
                                }
                                FilterMethod::Paeth =>
                                {
                                    raw.wrapping_add(paeth_predictor(left, up, up_left))
                                }
                            };
                            self.this_line[at] = value;

                            if bpp < 8
                            {
                                // filters work on bytes but the packed
                                // bits land on pixels of the current
                                // pass, most significant bit first
                                let mask = (1_u8 << bpp) - 1;
                                let mut bits = value;

                                for _ in 0..8 / bpp
                                {
                                    if self.col < image.width
                                    {
                                        let bit_offset = bpp * self.col;
                                        let byte =
                                            image.stride * self.row + (bit_offset >> 3);
                                        let colour = (bits >> (8 - bpp)) & mask;

                                        image.blob[byte] |=
                                            colour << (8 - (bit_offset & 7) - bpp);
                                    }
                                    bits <<= bpp;
                                    self.col += pass.col_inc;
                                }
                            }
                            else
                            {
                                let at_blob = image.stride * self.row
                                    + bytes_per_pixel * self.col
                                    + index;

                                image.blob[at_blob] = value;
                            }
                        }
                        consumed += bytes_per_pixel;
                        self.line_pos += bytes_per_pixel;

                        if bpp >= 8
                        {
                            self.col += pass.col_inc;
                        }

                        if self.col >= image.width
                        {
                            self.row += pass.row_inc;

                            if self.row >= image.height
                            {
                                self.pass += 1;
                                self.state = FilterState::StartPass;
                            }
                            else
                            {
                                self.state = FilterState::StartLine;
                            }
                            line_done = true;
                        }
                    }

                    if !line_done
                    {
                        // a partial pixel group stays in the buffer
                        return Ok(consumed);
                    }
                }
                FilterState::Done =>
                {
                    // every pass is complete; surplus inflate output is
                    // dropped rather than wrapped around
                    if zbuf.len() > consumed
                    {
                        log::warn!(
                            "discarding {} surplus image data bytes",
                            zbuf.len() - consumed
                        );
                    }
                    return Ok(zbuf.len());
                }
            }
        }
    }
}

/// Select the filter for one scanline about to be emitted.
///
/// Every line currently goes out unfiltered.
// TODO: score the five candidates by sum of absolute differences and
// pick the smallest.
pub(crate) fn choose_filter(_previous: &[u8], _current: &[u8]) -> FilterMethod
{
    FilterMethod::None
}

/// Apply `filter` to `current`, appending the filtered bytes to `out`.
///
/// `previous` is the unfiltered line above, empty for the first line
/// of a pass; `bytes_per_pixel` is the neighbour distance.
pub(crate) fn filter_scanline(
    current: &[u8], previous: &[u8], filter: FilterMethod, bytes_per_pixel: usize,
    out: &mut Vec<u8>
)
{
    match filter
    {
        FilterMethod::None =>
        {
            out.extend_from_slice(current);
        }
        FilterMethod::Sub =>
        {
            for (i, &byte) in current.iter().enumerate()
            {
                let left = if i >= bytes_per_pixel
                {
                    current[i - bytes_per_pixel]
                }
                else
                {
                    0
                };
                out.push(byte.wrapping_sub(left));
            }
        }
        FilterMethod::Up =>
        {
            for (i, &byte) in current.iter().enumerate()
            {
                let up = previous.get(i).copied().unwrap_or(0);
                out.push(byte.wrapping_sub(up));
            }
        }
        FilterMethod::Average =>
        {
            for (i, &byte) in current.iter().enumerate()
            {
                let left = if i >= bytes_per_pixel
                {
                    current[i - bytes_per_pixel]
                }
                else
                {
                    0
                };
                let up = previous.get(i).copied().unwrap_or(0);
                let mean = (u16::from(left) + u16::from(up)) / 2;

                out.push(byte.wrapping_sub(mean as u8));
            }
        }
        FilterMethod::Paeth =>
        {
            for (i, &byte) in current.iter().enumerate()
            {
                let (left, up_left) = if i >= bytes_per_pixel
                {
                    (
                        current[i - bytes_per_pixel],
                        previous.get(i - bytes_per_pixel).copied().unwrap_or(0)
                    )
                }
                else
                {
                    (0, 0)
                };
                let up = previous.get(i).copied().unwrap_or(0);

                out.push(byte.wrapping_sub(paeth_predictor(left, up, up_left)));
            }
        }
    }
}

/// Pack one pass row of the image into wire layout.
///
/// Sub-byte samples pack most-significant-bit first; pixels the pass
/// skips are left out; padding bits at the end of a row are zero.
/// Host-RGBA blobs are unpacked from native words into wire order
/// R,G,B,A whatever the host endianness.
pub(crate) fn pack_scanline(image: &PngImage, pass: Pass, row: usize, out: &mut Vec<u8>)
{
    use crate::enums::PngColor;

    out.clear();

    let bpp = usize::from(image.depth);
    let line = &image.blob[image.stride * row..image.stride * row + image.stride];
    let mut col = pass.start_col;

    if image.color == PngColor::HostRgba
    {
        let word_bytes = bpp / 8;
        let mut writer = ByteWriter::new(out);

        while col < image.width
        {
            let at = word_bytes * col;

            if word_bytes == 4
            {
                // 0xAaRrGgBb
                let word =
                    u32::from_ne_bytes(line[at..at + 4].try_into().unwrap());

                writer.write_u8((word >> 16) as u8);
                writer.write_u8((word >> 8) as u8);
                writer.write_u8(word as u8);
                writer.write_u8((word >> 24) as u8);
            }
            else
            {
                // 0xAAaaRRrrGGggBBbb
                let word =
                    u64::from_ne_bytes(line[at..at + 8].try_into().unwrap());

                writer.write_u16_be((word >> 32) as u16);
                writer.write_u16_be((word >> 16) as u16);
                writer.write_u16_be(word as u16);
                writer.write_u16_be((word >> 48) as u16);
            }
            col += pass.col_inc;
        }
        return;
    }

    if bpp < 8
    {
        let pixels_per_byte = 8 / bpp;
        let mask = (1_u8 << bpp) - 1;

        while col < image.width
        {
            let mut packed = 0_u8;

            for k in 0..pixels_per_byte
            {
                let source = col + k * pass.col_inc;
                let bits = if source < image.width
                {
                    let bit_offset = bpp * source;
                    (line[bit_offset >> 3] >> (8 - (bit_offset & 7) - bpp)) & mask
                }
                else
                {
                    0
                };
                packed = (packed << bpp) | bits;
            }
            out.push(packed);
            col += pixels_per_byte * pass.col_inc;
        }
        return;
    }

    let bytes_per_pixel = image.bytes_per_pixel();

    while col < image.width
    {
        let at = bytes_per_pixel * col;
        out.extend_from_slice(&line[at..at + bytes_per_pixel]);
        col += pass.col_inc;
    }
}
