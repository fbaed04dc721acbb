//! A streaming PNG decoder and encoder.
//!
//! Both directions run as cooperative pumps: the caller feeds the
//! [`PngDecoder`] byte slices of any size and collects slices of any
//! size from the [`PngEncoder`], and each call moves the internal
//! state machines only as far as the buffered data allows. Nothing
//! here touches files or sockets; a byte source and a byte sink are
//! the whole outside world.
//!
//! Progress and failure surface through the [`PngStatus`] bit flags on
//! the [`PngImage`] descriptor, and errors are latched: a broken
//! stream parks the machine and further calls return the sticky
//! status.
//!
//! Decoded blobs mirror the PNG wire layout. The two converters,
//! [`PngImage::convert_to_rgba32`] and [`PngImage::convert_to_rgba64`],
//! rewrite the blob into packed host-endian RGBA words for callers
//! that want to blit rather than parse.
mod chunk;
mod constants;
mod convert;
pub mod crc;
mod decoder;
mod encoder;
mod enums;
mod error;
mod filters;
mod headers;
mod image;
mod interlace;
mod options;
mod status;
mod zlib;

pub use constants::PNG_SIGNATURE;
pub use decoder::PngDecoder;
pub use encoder::PngEncoder;
pub use enums::{FilterMethod, InterlaceMethod, PngColor};
pub use error::PngError;
pub use image::{Background, PngImage, Transparency};
pub use options::PngOptions;
pub use status::PngStatus;

/// Build the process-wide CRC table ahead of time.
///
/// Purely a warm-up: the table also builds itself, thread-safely, the
/// first time any codec touches it.
pub fn init()
{
    crc::crc_table();
}
