//! The decode-side top state machine and its pump.
use crate::chunk::{BlockReader, BlockState, ChunkFlags};
use crate::constants::{
    ASSEMBLE_SIZE, BLOCK_BKGD, BLOCK_GAMA, BLOCK_IDAT, BLOCK_IEND, BLOCK_IHDR, BLOCK_PHYS,
    BLOCK_PLTE, BLOCK_TIME, BLOCK_TRNS, BUFFER_SIZE, PNG_SIGNATURE_BYTES, ZBUF_SIZE
};
use crate::error::PngError;
use crate::filters::{FilterState, Reconstructor};
use crate::headers;
use crate::image::PngImage;
use crate::options::PngOptions;
use crate::status::PngStatus;
use crate::zlib::Inflator;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum LoaderState
{
    Off,
    Start,
    Identified,
    Ihdr,
    ReadIdats,
    Finished,
    Error
}

/// A streaming PNG decoder.
///
/// Feed it byte slices of any size with [`feed`](PngDecoder::feed);
/// each call consumes what it can, advances the state machines until
/// they stall on missing input, and returns the descriptor's status
/// word. Once the status carries [`PngStatus::FINISHED`] the decoded
/// image can be taken with [`into_image`](PngDecoder::into_image).
///
/// Errors are latched: after a failure every further call is a no-op
/// returning the sticky status, and recovery means starting over with
/// a fresh decoder.
///
/// ```
/// use rill_png::{PngDecoder, PngStatus};
///
/// let mut decoder = PngDecoder::new();
/// let status = decoder.feed(&[0x89, b'P', b'N', b'G']);
/// assert!(status.contains(PngStatus::LOADING));
/// ```
pub struct PngDecoder
{
    image:     PngImage,
    options:   PngOptions,
    state:     LoaderState,
    block:     BlockReader,
    recon:     Reconstructor,
    inflator:  Inflator,
    /// Incoming bytes not yet digested.
    buffer:    Vec<u8>,
    /// Assembly space for non-IDAT chunk payloads.
    blk_cache: Vec<u8>,
    /// Inflated scanline bytes awaiting reconstruction.
    zbuf:      Vec<u8>
}

impl Default for PngDecoder
{
    fn default() -> Self
    {
        PngDecoder::new()
    }
}

impl PngDecoder
{
    pub fn new() -> PngDecoder
    {
        PngDecoder::new_with_options(PngOptions::default())
    }

    pub fn new_with_options(options: PngOptions) -> PngDecoder
    {
        let mut image = PngImage::new();
        image.status = PngStatus::LOADING;

        PngDecoder {
            image,
            options,
            state: LoaderState::Start,
            block: BlockReader::new(),
            recon: Reconstructor::new(),
            inflator: Inflator::new(),
            buffer: Vec::with_capacity(BUFFER_SIZE),
            blk_cache: Vec::with_capacity(ASSEMBLE_SIZE),
            zbuf: Vec::with_capacity(ZBUF_SIZE)
        }
    }

    /// Push a slice of the stream into the decoder.
    ///
    /// Consumes all of `data` unless the stream finishes or fails
    /// first; trailing bytes after IEND are ignored.
    pub fn feed(&mut self, data: &[u8]) -> PngStatus
    {
        if self
            .image
            .status
            .intersects(PngStatus::ERROR | PngStatus::FINISHED | PngStatus::DISPOSED)
        {
            return self.image.status;
        }

        let mut rest = data;

        while !rest.is_empty()
        {
            let space = BUFFER_SIZE - self.buffer.len();
            if space == 0
            {
                // the machines below always drain a full buffer
                break;
            }
            let take = space.min(rest.len());

            self.buffer.extend_from_slice(&rest[..take]);
            rest = &rest[take..];

            if let Err(err) = self.run()
            {
                self.latch(err);
                break;
            }
            if self.image.status.contains(PngStatus::FINISHED)
            {
                break;
            }
        }
        self.image.status
    }

    /// Signal that the input stream has ended.
    ///
    /// A stream that stops before IEND is broken; this latches
    /// IDAT_ERR so the caller learns about truncation the read loop
    /// itself cannot see.
    pub fn finish(&mut self) -> PngStatus
    {
        if self
            .image
            .status
            .intersects(PngStatus::ERROR | PngStatus::FINISHED | PngStatus::DISPOSED)
        {
            return self.image.status;
        }
        self.latch(PngError::BadIdat("stream ended before IEND"));
        self.image.status
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
        self.blk_cache = Vec::new();
        self.zbuf = Vec::new();
        self.state = LoaderState::Off;
        self.image.dispose();
    }

    fn latch(&mut self, err: PngError)
    {
        log::warn!("png load failed: {err:?}");

        self.state = LoaderState::Error;
        self.block.state = BlockState::Error;

        self.image
            .status
            .remove(PngStatus::LOADING | PngStatus::IS_DRAWABLE);
        self.image.status.insert(err.status() | PngStatus::ERROR);
    }

    /// Drive both machines until neither can move.
    fn run(&mut self) -> Result<(), PngError>
    {
        loop
        {
            let block_moved = self.step_block()?;
            let loader_moved = self.step_loader()?;

            if !block_moved && !loader_moved
            {
                return Ok(());
            }
        }
    }

    fn step_block(&mut self) -> Result<bool, PngError>
    {
        match self.block.state
        {
            BlockState::Wait | BlockState::Finished | BlockState::Error => Ok(false),
            BlockState::Start =>
            {
                let consumed = self.block.start(&self.buffer);
                if consumed == 0
                {
                    return Ok(false);
                }
                self.buffer.drain(..consumed);
                self.blk_cache.clear();
                Ok(true)
            }
            BlockState::ReadBlock =>
            {
                let take = self.buffer.len().min(self.block.left);

                if take > 0
                {
                    self.block.update_crc(&self.buffer[..take]);

                    if self.block.block_type == BLOCK_IDAT
                    {
                        // IDATs bypass assembly: inflate right here so
                        // the stream never has to fit in memory whole
                        self.consume_idat(take)?;
                    }
                    else
                    {
                        if self.blk_cache.len() + take > ASSEMBLE_SIZE
                        {
                            return Err(PngError::ImplementationLimit(
                                "chunk payload exceeds the assembly buffer"
                            ));
                        }
                        self.blk_cache.extend_from_slice(&self.buffer[..take]);
                    }
                    self.block.left -= take;
                    self.buffer.drain(..take);
                }

                if self.block.left == 0
                {
                    self.block.state = BlockState::ReadCrc;
                    return Ok(true);
                }
                Ok(take > 0)
            }
            BlockState::ReadCrc =>
            {
                let consumed = self.block.read_crc(&self.buffer, self.options.confirm_crc())?;
                if consumed == 0
                {
                    return Ok(false);
                }
                self.buffer.drain(..consumed);
                Ok(true)
            }
        }
    }

    /// Inflate `take` buffered IDAT payload bytes, draining each batch
    /// through the filter reconstructor before refilling the staging
    /// buffer.
    fn consume_idat(&mut self, take: usize) -> Result<(), PngError>
    {
        let mut offset = 0;

        while offset < take && !self.inflator.is_finished()
        {
            let old_len = self.zbuf.len();
            self.zbuf.resize(ZBUF_SIZE, 0);

            let result = self
                .inflator
                .inflate(&self.buffer[offset..take], &mut self.zbuf[old_len..]);

            let (consumed, produced) = match result
            {
                Ok(moved) => moved,
                Err(err) =>
                {
                    self.zbuf.truncate(old_len);
                    return Err(err);
                }
            };
            self.zbuf.truncate(old_len + produced);
            offset += consumed;

            self.recon.run(&mut self.image, &mut self.zbuf)?;

            if consumed == 0 && produced == 0
            {
                // staging full and the reconstructor kept nothing back
                break;
            }
        }
        Ok(())
    }

    fn step_loader(&mut self) -> Result<bool, PngError>
    {
        match self.state
        {
            LoaderState::Off | LoaderState::Finished | LoaderState::Error => Ok(false),
            LoaderState::Start =>
            {
                if self.buffer.len() < 8
                {
                    return Ok(false);
                }
                if self.buffer[..8] != PNG_SIGNATURE_BYTES
                {
                    return Err(PngError::BadSignature);
                }
                self.buffer.drain(..8);
                self.state = LoaderState::Identified;
                Ok(true)
            }
            LoaderState::Identified =>
            {
                // the INFLATE engine is ready from construction; arm
                // the chunk framer and expect IHDR first
                self.block.state = BlockState::Start;
                self.state = LoaderState::Ihdr;
                Ok(true)
            }
            LoaderState::Ihdr =>
            {
                if self.block.state != BlockState::Finished
                {
                    return Ok(false);
                }
                if self.block.block_type != BLOCK_IHDR
                {
                    return Err(PngError::OutOfSpecs("first chunk is not IHDR"));
                }

                headers::parse_ihdr(&mut self.image, &self.blk_cache, &self.options)?;

                let size = self.image.stride * self.image.height;
                let mut blob = Vec::new();
                blob.try_reserve_exact(size)
                    .map_err(|_| PngError::OutOfMemory)?;
                blob.resize(size, 0);
                self.image.blob = blob;

                self.recon.prepare(self.image.stride)?;
                self.image.status.insert(PngStatus::IS_DRAWABLE);

                log::debug!(
                    "PNG {}x{}, stride {}, {} bpp, sample {} bits, colour {:?}, interlace {:?}",
                    self.image.width,
                    self.image.height,
                    self.image.stride,
                    self.image.depth,
                    self.image.sample_depth,
                    self.image.color,
                    self.image.interlace
                );

                self.block.state = BlockState::Start;
                self.state = LoaderState::ReadIdats;
                Ok(true)
            }
            LoaderState::ReadIdats =>
            {
                if self.block.state != BlockState::Finished
                {
                    return Ok(false);
                }

                if self.block.block_type == BLOCK_IEND
                {
                    if self.recon.state != FilterState::Done
                    {
                        return Err(PngError::BadIdat(
                            "image data ended before the last scanline"
                        ));
                    }
                    self.image.status.remove(PngStatus::LOADING);
                    self.image.status.insert(PngStatus::FINISHED);
                    self.state = LoaderState::Finished;
                    return Ok(true);
                }

                match self.block.block_type
                {
                    BLOCK_PLTE => headers::parse_plte(&mut self.image, &self.blk_cache),
                    BLOCK_TRNS => headers::parse_trns(&mut self.image, &self.blk_cache),
                    BLOCK_BKGD => headers::parse_bkgd(&mut self.image, &self.blk_cache),
                    // payload already went through the zlib adapter
                    BLOCK_IDAT => {}
                    // accepted and ignored
                    BLOCK_GAMA | BLOCK_TIME | BLOCK_PHYS => {}
                    _ =>
                    {
                        let name = String::from_utf8_lossy(&self.block.letters).into_owned();

                        if self.block.flags.contains(ChunkFlags::ANCILLARY)
                        {
                            log::debug!("ignoring ancillary chunk {name}");
                        }
                        else
                        {
                            log::warn!("skipping unknown critical chunk {name}");
                        }
                    }
                }

                self.block.state = BlockState::Start;
                Ok(true)
            }
        }
    }
}
