/// PNG colour types.
///
/// The wire knows the first five; `HostRgba` is the internal extension
/// the converters leave behind: pixels already packed into host-endian
/// 32 or 64 bit RGBA words.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PngColor
{
    Luma,
    RGB,
    Palette,
    LumaA,
    RGBA,
    HostRgba
}

impl Default for PngColor
{
    fn default() -> Self
    {
        PngColor::Luma
    }
}

impl PngColor
{
    /// Map a wire colour-type byte; 1, 5 and 7 have no meaning.
    pub const fn from_int(value: u8) -> Option<PngColor>
    {
        match value
        {
            0 => Some(PngColor::Luma),
            2 => Some(PngColor::RGB),
            3 => Some(PngColor::Palette),
            4 => Some(PngColor::LumaA),
            6 => Some(PngColor::RGBA),
            _ => None
        }
    }

    pub const fn to_int(self) -> u8
    {
        match self
        {
            PngColor::Luma => 0,
            PngColor::RGB => 2,
            PngColor::Palette => 3,
            PngColor::LumaA => 4,
            PngColor::RGBA => 6,
            // extension bit on top of the RGBA wire value
            PngColor::HostRgba => 0x80 | 6
        }
    }

    /// The colour-type byte as it goes on the wire; the extension bit
    /// is stripped, so host-RGBA images identify as plain RGBA.
    pub const fn wire_value(self) -> u8
    {
        self.to_int() & 7
    }

    /// Samples per pixel for this colour type.
    pub const fn num_components(self) -> u8
    {
        match self
        {
            PngColor::Luma | PngColor::Palette => 1,
            PngColor::LumaA => 2,
            PngColor::RGB => 3,
            PngColor::RGBA | PngColor::HostRgba => 4
        }
    }

    /// Whether `depth` bits per sample is allowed for this colour type.
    pub const fn is_legal_depth(self, depth: u8) -> bool
    {
        match self
        {
            PngColor::Luma => matches!(depth, 1 | 2 | 4 | 8 | 16),
            PngColor::Palette => matches!(depth, 1 | 2 | 4 | 8),
            PngColor::RGB | PngColor::LumaA | PngColor::RGBA =>
            {
                matches!(depth, 8 | 16)
            }
            PngColor::HostRgba => matches!(depth, 32 | 64)
        }
    }
}

/// Per-scanline filter types, value order as on the wire.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FilterMethod
{
    None,
    Sub,
    Up,
    Average,
    Paeth
}

impl FilterMethod
{
    pub const fn from_int(value: u8) -> Option<FilterMethod>
    {
        match value
        {
            0 => Some(FilterMethod::None),
            1 => Some(FilterMethod::Sub),
            2 => Some(FilterMethod::Up),
            3 => Some(FilterMethod::Average),
            4 => Some(FilterMethod::Paeth),
            _ => None
        }
    }

    pub const fn to_int(self) -> u8
    {
        match self
        {
            FilterMethod::None => 0,
            FilterMethod::Sub => 1,
            FilterMethod::Up => 2,
            FilterMethod::Average => 3,
            FilterMethod::Paeth => 4
        }
    }
}

/// Interlace methods; only none and Adam7 exist.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InterlaceMethod
{
    Standard,
    Adam7
}

impl Default for InterlaceMethod
{
    fn default() -> Self
    {
        InterlaceMethod::Standard
    }
}

impl InterlaceMethod
{
    pub const fn from_int(value: u8) -> Option<InterlaceMethod>
    {
        match value
        {
            0 => Some(InterlaceMethod::Standard),
            1 => Some(InterlaceMethod::Adam7),
            _ => None
        }
    }

    pub const fn to_int(self) -> u8
    {
        match self
        {
            InterlaceMethod::Standard => 0,
            InterlaceMethod::Adam7 => 1
        }
    }
}

#[test]
fn illegal_colour_values_rejected()
{
    assert!(PngColor::from_int(1).is_none());
    assert!(PngColor::from_int(5).is_none());
    assert!(PngColor::from_int(7).is_none());

    assert_eq!(PngColor::from_int(6), Some(PngColor::RGBA));
}

#[test]
fn host_rgba_identifies_as_rgba_on_the_wire()
{
    assert_eq!(PngColor::HostRgba.wire_value(), 6);
    assert_eq!(PngColor::HostRgba.num_components(), 4);
}

#[test]
fn depth_legality()
{
    assert!(PngColor::Luma.is_legal_depth(1));
    assert!(PngColor::Palette.is_legal_depth(2));
    assert!(!PngColor::Palette.is_legal_depth(16));
    assert!(!PngColor::RGB.is_legal_depth(4));
    assert!(PngColor::RGBA.is_legal_depth(16));
}
