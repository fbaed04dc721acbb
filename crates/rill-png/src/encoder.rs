//! The encode-side top state machine and its pump.
use flate2::Compression;
use rill_core::ByteWriter;

use crate::chunk::{BlockWriter, ChunkFlags};
use crate::constants::{
    BLOCK_BKGD, BLOCK_IDAT, BLOCK_IEND, BLOCK_IHDR, BLOCK_PLTE, BLOCK_TRNS, BUFFER_SIZE,
    PNG_SIGNATURE_BYTES, ZBUF_SIZE
};
use crate::enums::PngColor;
use crate::error::PngError;
use crate::filters::{choose_filter, filter_scanline, pack_scanline};
use crate::image::{Background, PngImage, Transparency};
use crate::interlace::Pass;
use crate::status::PngStatus;
use crate::zlib::Deflator;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum SaverState
{
    Off,
    Start,
    Header,
    Identified,
    SendMiscBlocks,
    StartSendingIdats,
    SendIdats,
    Finished,
    Error
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum EmitState
{
    Wait,
    Start,
    StartPass,
    StartLine,
    WaitForSpace,
    OutputLine,
    NextLine,
    NextPass,
    Finished
}

/// A streaming PNG encoder.
///
/// Takes a populated [`PngImage`] and serves the encoded stream in
/// arbitrary-sized slices through [`pump`](PngEncoder::pump). The
/// descriptor's `interlace` field decides whether the output is
/// Adam7-interlaced; host-RGBA descriptors left behind by the
/// converters are re-packed to wire order on the way out.
///
/// ```no_run
/// use rill_png::{PngColor, PngEncoder, PngImage, PngStatus};
///
/// let mut image = PngImage::new();
/// image
///     .populate_with_image(PngColor::Luma, 8, 2, 1, vec![0x00, 0xFF])
///     .unwrap();
///
/// let mut encoder = PngEncoder::new(image).unwrap();
/// let mut chunk = [0_u8; 4096];
/// loop
/// {
///     let n = encoder.pump(&mut chunk);
///     // hand chunk[..n] to the byte sink
///     if n == 0 && encoder.status().contains(PngStatus::FINISHED)
///     {
///         break;
///     }
/// }
/// ```
pub struct PngEncoder
{
    image: PngImage,
    state: SaverState,
    emit:  EmitState,

    pass: usize,
    row:  usize,

    /// Current pass row in wire layout, before filtering.
    packed_line: Vec<u8>,
    /// The unfiltered line above, for the filter chooser.
    prev_line:   Vec<u8>,

    zbuf:     Vec<u8>,
    deflator: Deflator,

    /// Outgoing bytes awaiting the caller.
    buffer: Vec<u8>
}

impl PngEncoder
{
    /// Start a save at the default compression level.
    pub fn new(image: PngImage) -> Result<PngEncoder, PngError>
    {
        PngEncoder::new_with_level(image, 6)
    }

    /// Start a save with an explicit deflate level (0..=9).
    pub fn new_with_level(mut image: PngImage, level: u32) -> Result<PngEncoder, PngError>
    {
        if image.status.contains(PngStatus::DISPOSED)
        {
            return Err(PngError::Disposed);
        }
        if !image.is_drawable() || image.blob.len() != image.stride * image.height
        {
            return Err(PngError::GenericStatic("descriptor holds no drawable image"));
        }
        image.status.insert(PngStatus::SAVING);

        Ok(PngEncoder {
            image,
            state: SaverState::Start,
            emit: EmitState::Wait,
            pass: 0,
            row: 0,
            packed_line: Vec::new(),
            prev_line: Vec::new(),
            zbuf: Vec::with_capacity(ZBUF_SIZE),
            deflator: Deflator::new(Compression::new(level.min(9))),
            buffer: Vec::with_capacity(BUFFER_SIZE)
        })
    }

    /// Produce the next slice of the stream into `out`.
    ///
    /// Returns the number of bytes written; once the status word
    /// carries [`PngStatus::FINISHED`] and a call returns zero, the
    /// stream is complete.
    pub fn pump(&mut self, out: &mut [u8]) -> usize
    {
        if !self
            .image
            .status
            .intersects(PngStatus::ERROR | PngStatus::DISPOSED)
        {
            if let Err(err) = self.run()
            {
                self.latch(err);
            }
        }

        let take = out.len().min(self.buffer.len());
        out[..take].copy_from_slice(&self.buffer[..take]);
        self.buffer.drain(..take);
        take
    }

    pub fn status(&self) -> PngStatus
    {
        self.image.status
    }

    pub fn image(&self) -> &PngImage
    {
        &self.image
    }

    pub fn into_image(self) -> PngImage
    {
        self.image
    }

    /// Drop the buffers and mark the context disposed; idempotent.
    pub fn dispose(&mut self)
    {
        self.buffer = Vec::new();
        self.zbuf = Vec::new();
        self.packed_line = Vec::new();
        self.prev_line = Vec::new();
        self.state = SaverState::Off;
        self.image.dispose();
    }

    fn latch(&mut self, err: PngError)
    {
        log::warn!("png save failed: {err:?}");

        self.state = SaverState::Error;
        self.image.status.remove(PngStatus::SAVING);
        self.image.status.insert(err.status() | PngStatus::ERROR);
    }

    /// Advance until the output buffer lacks headroom for another
    /// chunk envelope or the stream is complete.
    fn run(&mut self) -> Result<(), PngError>
    {
        loop
        {
            match self.state
            {
                SaverState::Off | SaverState::Finished | SaverState::Error =>
                {
                    return Ok(());
                }
                SaverState::Start =>
                {
                    self.emit = EmitState::Wait;
                    self.state = SaverState::Header;
                }
                SaverState::Header =>
                {
                    self.buffer.extend_from_slice(&PNG_SIGNATURE_BYTES);
                    self.state = SaverState::Identified;
                }
                SaverState::Identified =>
                {
                    self.write_ihdr();
                    self.state = SaverState::SendMiscBlocks;
                }
                SaverState::SendMiscBlocks =>
                {
                    // palette and friends are small; 4 KiB of headroom
                    // lets them all go out in one sweep
                    if BUFFER_SIZE - self.buffer.len() < 4096
                    {
                        return Ok(());
                    }
                    self.write_misc_blocks();
                    self.state = SaverState::StartSendingIdats;
                }
                SaverState::StartSendingIdats =>
                {
                    // the DEFLATE engine is ready from construction
                    self.zbuf.clear();
                    self.emit = EmitState::Start;
                    self.state = SaverState::SendIdats;
                }
                SaverState::SendIdats =>
                {
                    if BUFFER_SIZE - self.buffer.len() < 8192 + 12
                    {
                        return Ok(());
                    }
                    self.fill_zbuf()?;

                    let finishing = self.emit == EmitState::Finished;

                    if !self.zbuf.is_empty() || (finishing && !self.deflator.is_finished())
                    {
                        self.write_idat(finishing)?;
                    }

                    if finishing && self.deflator.is_finished()
                    {
                        let writer = BlockWriter::start(
                            &mut self.buffer,
                            BLOCK_IEND,
                            ChunkFlags::empty()
                        );
                        writer.finish(&mut self.buffer);

                        self.image.status.remove(PngStatus::SAVING);
                        self.image.status.insert(PngStatus::FINISHED);
                        self.state = SaverState::Finished;
                        return Ok(());
                    }
                }
            }
        }
    }

    fn write_ihdr(&mut self)
    {
        let wire_depth = match self.image.color
        {
            // host words carry four samples each
            PngColor::HostRgba => self.image.depth / 4,
            _ => self.image.depth
        };

        let writer = BlockWriter::start(&mut self.buffer, BLOCK_IHDR, ChunkFlags::empty());
        {
            let mut body = ByteWriter::new(&mut self.buffer);

            body.write_u32_be(self.image.width as u32);
            body.write_u32_be(self.image.height as u32);
            body.write_u8(wire_depth);
            body.write_u8(self.image.color.wire_value());
            body.write_u8(self.image.compression);
            body.write_u8(self.image.filter_method);
            body.write_u8(self.image.interlace.to_int());
        }
        writer.finish(&mut self.buffer);
    }

    /// PLTE, bKGD and tRNS, in that order, each only when the image
    /// calls for it.
    fn write_misc_blocks(&mut self)
    {
        let color = self.image.color;
        let mut transparencies = false;

        if color == PngColor::Palette
        {
            let entries = (1_usize << self.image.depth).min(256);

            let writer =
                BlockWriter::start(&mut self.buffer, BLOCK_PLTE, ChunkFlags::empty());
            for &entry in &self.image.palette[..entries]
            {
                self.buffer.push((entry >> 16) as u8);
                self.buffer.push((entry >> 8) as u8);
                self.buffer.push(entry as u8);

                if entry >> 24 != 0xFF
                {
                    transparencies = true;
                }
            }
            writer.finish(&mut self.buffer);
        }

        if let Some(background) = self.image.background
        {
            let mut payload = Vec::new();
            {
                let mut body = ByteWriter::new(&mut payload);

                match (color, background)
                {
                    (PngColor::Palette, Background::Index(index)) =>
                    {
                        body.write_u8(index);
                    }
                    (PngColor::Luma | PngColor::LumaA, Background::Grey(grey)) =>
                    {
                        body.write_u16_be(grey);
                    }
                    (PngColor::RGB | PngColor::RGBA, Background::Rgb(r, g, b)) =>
                    {
                        body.write_u16_be(r);
                        body.write_u16_be(g);
                        body.write_u16_be(b);
                    }
                    (_, background) =>
                    {
                        log::warn!(
                            "background {background:?} does not fit colour type {color:?}, dropped"
                        );
                    }
                }
            }

            if !payload.is_empty()
            {
                let writer =
                    BlockWriter::start(&mut self.buffer, BLOCK_BKGD, ChunkFlags::ANCILLARY);
                self.buffer.extend_from_slice(&payload);
                writer.finish(&mut self.buffer);
            }
        }

        if color == PngColor::Palette && transparencies
        {
            let entries = (1_usize << self.image.depth).min(256);

            let writer =
                BlockWriter::start(&mut self.buffer, BLOCK_TRNS, ChunkFlags::ANCILLARY);
            for &entry in &self.image.palette[..entries]
            {
                self.buffer.push((entry >> 24) as u8);
            }
            writer.finish(&mut self.buffer);
        }

        if matches!(color, PngColor::Luma | PngColor::RGB)
        {
            if let Some(key) = self.image.transparency
            {
                let writer =
                    BlockWriter::start(&mut self.buffer, BLOCK_TRNS, ChunkFlags::ANCILLARY);
                let mut body = ByteWriter::new(&mut self.buffer);

                match key
                {
                    Transparency::Grey(grey) =>
                    {
                        body.write_u16_be(grey);
                    }
                    Transparency::Rgb(r, g, b) =>
                    {
                        body.write_u16_be(r);
                        body.write_u16_be(g);
                        body.write_u16_be(b);
                    }
                }
                writer.finish(&mut self.buffer);
            }
        }
    }

    /// Emit one IDAT chunk, deflating as much staged scanline data as
    /// the output headroom takes.
    fn write_idat(&mut self, finishing: bool) -> Result<(), PngError>
    {
        let writer = BlockWriter::start(&mut self.buffer, BLOCK_IDAT, ChunkFlags::empty());

        let body_start = self.buffer.len();
        // leave room for the CRC and the next envelope
        let headroom = BUFFER_SIZE - body_start - 12;

        self.buffer.resize(body_start + headroom, 0);

        let result =
            self.deflator
                .deflate(&self.zbuf, &mut self.buffer[body_start..], finishing);

        let (consumed, produced) = match result
        {
            Ok(moved) => moved,
            Err(err) =>
            {
                self.buffer.truncate(body_start);
                return Err(err);
            }
        };

        self.buffer.truncate(body_start + produced);
        self.zbuf.drain(..consumed);

        writer.finish(&mut self.buffer);
        Ok(())
    }

    /// The emitter machine: pack pass rows and push filtered lines
    /// into the staging buffer while it has room.
    fn fill_zbuf(&mut self) -> Result<(), PngError>
    {
        loop
        {
            match self.emit
            {
                EmitState::Wait =>
                {
                    log::warn!("emitter driven while idle");
                    return Ok(());
                }
                EmitState::Start =>
                {
                    self.pass = 0;
                    self.emit = EmitState::StartPass;
                }
                EmitState::StartPass =>
                {
                    let pass = Pass::for_index(self.image.interlace, self.pass);

                    // the line above reads as zero on pass entry
                    self.prev_line.clear();
                    self.row = pass.start_row;

                    self.emit = if pass.is_empty(self.image.width, self.image.height)
                    {
                        EmitState::NextPass
                    }
                    else
                    {
                        EmitState::StartLine
                    };
                }
                EmitState::StartLine =>
                {
                    let pass = Pass::for_index(self.image.interlace, self.pass);

                    pack_scanline(&self.image, pass, self.row, &mut self.packed_line);

                    if self.packed_line.len() + 1 > ZBUF_SIZE
                    {
                        return Err(PngError::ImplementationLimit(
                            "scanline exceeds the staging buffer"
                        ));
                    }
                    self.emit = EmitState::WaitForSpace;
                }
                EmitState::WaitForSpace =>
                {
                    if ZBUF_SIZE - self.zbuf.len() >= self.packed_line.len() + 1
                    {
                        self.emit = EmitState::OutputLine;
                    }
                    else
                    {
                        return Ok(());
                    }
                }
                EmitState::OutputLine =>
                {
                    let filter = choose_filter(&self.prev_line, &self.packed_line);

                    self.zbuf.push(filter.to_int());
                    filter_scanline(
                        &self.packed_line,
                        &self.prev_line,
                        filter,
                        self.image.bytes_per_pixel(),
                        &mut self.zbuf
                    );

                    // the unfiltered line becomes next line's neighbour
                    core::mem::swap(&mut self.prev_line, &mut self.packed_line);
                    self.emit = EmitState::NextLine;
                }
                EmitState::NextLine =>
                {
                    let pass = Pass::for_index(self.image.interlace, self.pass);

                    self.row += pass.row_inc;
                    self.emit = if self.row >= self.image.height
                    {
                        EmitState::NextPass
                    }
                    else
                    {
                        EmitState::StartLine
                    };
                }
                EmitState::NextPass =>
                {
                    self.pass += 1;
                    self.emit = if self.pass >= Pass::count(self.image.interlace)
                    {
                        EmitState::Finished
                    }
                    else
                    {
                        EmitState::StartPass
                    };
                }
                EmitState::Finished => return Ok(())
            }
        }
    }
}
