//! The caller-visible image descriptor and its lifecycle.
use crate::enums::{InterlaceMethod, PngColor};
use crate::error::PngError;
use crate::status::PngStatus;

/// Transparency key carried by a tRNS chunk on non-indexed images.
///
/// Samples are stored at wire width; for depths below 16 only the low
/// bits are meaningful.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Transparency
{
    Grey(u16),
    Rgb(u16, u16, u16)
}

/// Background colour carried by a bKGD chunk.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Background
{
    Index(u8),
    Grey(u16),
    Rgb(u16, u16, u16)
}

/// An image descriptor: geometry, palette, pixel blob and the status
/// word the pump drivers latch their progress into.
///
/// The blob mirrors the PNG wire layout, row-major with
/// [`stride`](PngImage::stride) bytes per row: sub-byte samples packed
/// most-significant-bit first, 16-bit samples big-endian. After a
/// conversion to [`PngColor::HostRgba`] the blob instead holds
/// host-endian 32 or 64 bit RGBA words.
pub struct PngImage
{
    pub width:  usize,
    pub height: usize,

    /// Bits per sample as stored in the blob (32/64 for host RGBA,
    /// meaning bits per pixel word).
    pub depth:             u8,
    pub sample_depth:      u8,
    pub samples_per_pixel: u8,

    pub color:         PngColor,
    pub compression:   u8,
    pub filter_method: u8,
    pub interlace:     InterlaceMethod,

    /// Bytes from the start of one scanline to the next.
    pub stride: usize,
    pub blob:   Vec<u8>,

    /// 256 AARRGGBB entries; defaults to the opaque grey ramp so
    /// unset entries still draw sensibly.
    pub palette: [u32; 256],

    pub transparency: Option<Transparency>,
    pub background:   Option<Background>,

    pub status: PngStatus
}

fn grey_ramp() -> [u32; 256]
{
    let mut palette = [0_u32; 256];

    for (index, entry) in palette.iter_mut().enumerate()
    {
        *entry = 0xFF00_0000 + (index as u32) * 0x0001_0101;
    }
    palette
}

impl Default for PngImage
{
    fn default() -> Self
    {
        PngImage::new()
    }
}

impl PngImage
{
    /// A pristine descriptor: no pixels, cleared status, grey-ramp
    /// palette.
    pub fn new() -> PngImage
    {
        PngImage {
            width:             0,
            height:            0,
            depth:             0,
            sample_depth:      0,
            samples_per_pixel: 0,
            color:             PngColor::default(),
            compression:       0,
            filter_method:     0,
            interlace:         InterlaceMethod::Standard,
            stride:            0,
            blob:              Vec::new(),
            palette:           grey_ramp(),
            transparency:      None,
            background:        None,
            status:            PngStatus::empty()
        }
    }

    /// Derive sample depth, samples per pixel and stride from colour
    /// type, depth and width.
    pub(crate) fn recompute_layout(&mut self)
    {
        self.sample_depth = match self.color
        {
            PngColor::Palette => 8,
            PngColor::HostRgba => self.depth / 4,
            _ => self.depth
        };
        self.samples_per_pixel = self.color.num_components();

        self.stride = match self.color
        {
            // whole words per pixel, no sub-byte packing to round
            PngColor::HostRgba => self.width * usize::from(self.depth / 8),
            _ =>
            {
                (self.width * usize::from(self.depth) * usize::from(self.samples_per_pixel) + 7) / 8
            }
        };
    }

    /// Bytes needed to hold at least one pixel, the neighbour distance
    /// the scanline filters use. Never below one even for sub-byte
    /// packings.
    pub(crate) fn bytes_per_pixel(&self) -> usize
    {
        let bits = usize::from(self.sample_depth) * usize::from(self.samples_per_pixel);

        (bits / 8).max(1)
    }

    // zero-size images stay populatable: the encoder turns them into
    // a header and trailer with an empty data stream, only the decode
    // side refuses them
    fn check_depth(color: PngColor, depth: u8) -> Result<(), PngError>
    {
        if !color.is_legal_depth(depth)
        {
            return Err(PngError::OutOfSpecs("bit depth illegal for colour type"));
        }
        Ok(())
    }

    /// Adopt an existing pixel blob ahead of a save.
    ///
    /// Fails with `WouldDestroy` when the descriptor already holds
    /// data, and checks the blob length against the derived stride.
    pub fn populate_with_image(
        &mut self, color: PngColor, depth: u8, width: usize, height: usize, blob: Vec<u8>
    ) -> Result<(), PngError>
    {
        if self.status != PngStatus::empty()
        {
            return Err(PngError::WouldDestroy);
        }
        PngImage::check_depth(color, depth)?;

        self.color = color;
        self.depth = depth;
        self.width = width;
        self.height = height;
        self.recompute_layout();

        if blob.len() != self.stride * self.height
        {
            return Err(PngError::Generic(format!(
                "blob holds {} bytes but the geometry needs {}",
                blob.len(),
                self.stride * self.height
            )));
        }
        self.blob = blob;
        self.status = PngStatus::IS_DRAWABLE;

        Ok(())
    }

    /// Like [`populate_with_image`](PngImage::populate_with_image) but
    /// allocates a zeroed blob of the right size.
    pub fn populate_empty(
        &mut self, color: PngColor, depth: u8, width: usize, height: usize
    ) -> Result<(), PngError>
    {
        if self.status != PngStatus::empty()
        {
            return Err(PngError::WouldDestroy);
        }
        PngImage::check_depth(color, depth)?;

        self.color = color;
        self.depth = depth;
        self.width = width;
        self.height = height;
        self.recompute_layout();

        let size = self.stride * self.height;
        let mut blob = Vec::new();

        blob.try_reserve_exact(size)
            .map_err(|_| PngError::OutOfMemory)?;
        blob.resize(size, 0);

        self.blob = blob;
        self.status = PngStatus::IS_DRAWABLE;

        Ok(())
    }

    /// Release the pixel blob and mark the descriptor disposed.
    ///
    /// Idempotent; dropping the descriptor releases memory either way,
    /// this latches the state for callers that keep it around.
    pub fn dispose(&mut self)
    {
        self.blob = Vec::new();
        self.status = PngStatus::DISPOSED;
    }

    pub fn is_drawable(&self) -> bool
    {
        self.status.contains(PngStatus::IS_DRAWABLE)
    }
}

#[test]
fn palette_defaults_to_grey_ramp()
{
    let image = PngImage::new();

    assert_eq!(image.palette[0], 0xFF00_0000);
    assert_eq!(image.palette[1], 0xFF01_0101);
    assert_eq!(image.palette[255], 0xFFFF_FFFF);
}

#[test]
fn stride_rounds_up_to_whole_bytes()
{
    let mut image = PngImage::new();

    image.populate_empty(PngColor::Palette, 2, 5, 3).unwrap();
    // 5 pixels at 2 bits each is 10 bits, so 2 bytes per row
    assert_eq!(image.stride, 2);
    assert_eq!(image.blob.len(), 6);
    assert_eq!(image.sample_depth, 8);
    assert_eq!(image.samples_per_pixel, 1);
}

#[test]
fn populate_refuses_to_clobber()
{
    let mut image = PngImage::new();

    image.populate_empty(PngColor::RGB, 8, 2, 2).unwrap();

    let again = image.populate_with_image(PngColor::Luma, 8, 1, 1, vec![0]);
    assert!(matches!(again, Err(PngError::WouldDestroy)));
}

#[test]
fn populate_validates_depth()
{
    let mut image = PngImage::new();

    assert!(matches!(
        image.populate_empty(PngColor::RGB, 4, 2, 2),
        Err(PngError::OutOfSpecs(_))
    ));
}

#[test]
fn zero_size_images_are_populatable()
{
    // the encoder needs these; they come out as header plus trailer
    let mut image = PngImage::new();

    image.populate_empty(PngColor::Luma, 8, 0, 2).unwrap();
    assert_eq!(image.stride, 0);
    assert!(image.blob.is_empty());
    assert!(image.is_drawable());
}

#[test]
fn dispose_is_idempotent()
{
    let mut image = PngImage::new();

    image.populate_empty(PngColor::Luma, 8, 4, 4).unwrap();
    image.dispose();
    image.dispose();

    assert!(image.blob.is_empty());
    assert_eq!(image.status, PngStatus::DISPOSED);
}
