use core::fmt::Debug;
use std::fmt::Formatter;

use rill_core::NotEnoughBytes;

use crate::status::PngStatus;

/// Everything that can abort a decode or encode.
///
/// Each variant maps onto the status bits the descriptor latches; the
/// variant itself carries the detail a log line wants.
pub enum PngError
{
    /// The stream does not begin with the PNG signature.
    BadSignature,
    /// Stored and calculated chunk CRC disagree.
    BadCrc(u32, u32),
    /// The stream violates the PNG specification.
    OutOfSpecs(&'static str),
    /// The stream is legal but exceeds what this codec handles.
    ImplementationLimit(&'static str),
    /// The compressed stream is broken.
    Zlib(&'static str),
    /// The pixel data stream is broken or ends early.
    BadIdat(&'static str),
    /// An allocation was refused.
    OutOfMemory,
    /// The descriptor already holds an image.
    WouldDestroy,
    /// The context was disposed.
    Disposed,
    /// A generic error.
    GenericStatic(&'static str),
    /// A generic error with formatted detail.
    Generic(String)
}

impl PngError
{
    /// The status bits this error contributes, `ERROR` excluded; the
    /// pump driver adds that when it latches.
    pub fn status(&self) -> PngStatus
    {
        match self
        {
            PngError::BadSignature => PngStatus::NO_PNG,
            PngError::BadCrc(..) => PngStatus::CRC_ERR,
            PngError::OutOfSpecs(_) => PngStatus::OUT_OF_SPECS,
            PngError::ImplementationLimit(_) => PngStatus::IMP_LIMIT,
            PngError::Zlib(_) => PngStatus::ZLIB_ERR,
            PngError::BadIdat(_) => PngStatus::IDAT_ERR,
            PngError::OutOfMemory => PngStatus::OUT_OF_MEM,
            PngError::WouldDestroy => PngStatus::WOULD_DESTROY,
            PngError::Disposed => PngStatus::DISPOSED,
            PngError::GenericStatic(_) | PngError::Generic(_) => PngStatus::empty()
        }
    }
}

impl Debug for PngError
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result
    {
        match self
        {
            PngError::BadSignature =>
            {
                writeln!(f, "Not a png, signature bytes didn't match")
            }
            PngError::BadCrc(stored, calculated) =>
            {
                writeln!(
                    f,
                    "Bad chunk CRC, stored {stored:08X} but calculated {calculated:08X}"
                )
            }
            PngError::OutOfSpecs(reason) =>
            {
                writeln!(f, "Out of specs: {reason}")
            }
            PngError::ImplementationLimit(reason) =>
            {
                writeln!(f, "Implementation limit reached: {reason}")
            }
            PngError::Zlib(reason) =>
            {
                writeln!(f, "Zlib error: {reason}")
            }
            PngError::BadIdat(reason) =>
            {
                writeln!(f, "Bad image data stream: {reason}")
            }
            PngError::OutOfMemory =>
            {
                writeln!(f, "Out of memory")
            }
            PngError::WouldDestroy =>
            {
                writeln!(f, "Descriptor already holds an image")
            }
            PngError::Disposed =>
            {
                writeln!(f, "Context was disposed")
            }
            PngError::GenericStatic(message) =>
            {
                writeln!(f, "{message}")
            }
            PngError::Generic(message) =>
            {
                writeln!(f, "{message}")
            }
        }
    }
}

impl From<&'static str> for PngError
{
    fn from(message: &'static str) -> Self
    {
        PngError::GenericStatic(message)
    }
}

impl From<NotEnoughBytes> for PngError
{
    fn from(err: NotEnoughBytes) -> Self
    {
        PngError::Generic(format!("{err:?}"))
    }
}

#[test]
fn errors_map_to_their_status_bits()
{
    assert_eq!(PngError::BadSignature.status(), PngStatus::NO_PNG);
    assert_eq!(PngError::BadCrc(1, 2).status(), PngStatus::CRC_ERR);
    assert_eq!(PngError::OutOfMemory.status(), PngStatus::OUT_OF_MEM);
    assert_eq!(PngError::Zlib("x").status(), PngStatus::ZLIB_ERR);
}
