use bitflags::bitflags;

bitflags! {
    /// Caller-observable codec state.
    ///
    /// The flags are additive: a descriptor mid-decode carries `LOADING`,
    /// gains `IS_DRAWABLE` once the header is understood and the pixel
    /// blob exists, and ends with either `FINISHED` or `ERROR` plus the
    /// bits naming what went wrong. A cleared word is the pristine state.
    pub struct PngStatus: u32 {
        const ERROR          = 0x0001;
        const LOADING        = 0x0002;
        const SAVING         = 0x0004;
        const IS_DRAWABLE    = 0x0008;
        const FINISHED       = 0x0010;
        const NO_PNG         = 0x0020;
        const OUT_OF_SPECS   = 0x0040;
        const IMP_LIMIT      = 0x0080;
        const CRC_ERR        = 0x0100;
        const ZLIB_ERR       = 0x0200;
        const IDAT_ERR       = 0x0400;
        const OUT_OF_MEM     = 0x0800;
        const DISPOSED       = 0x1000;
        const WOULD_DESTROY  = 0x2000;
        const BAD_FILEHANDLE = 0x4000;
    }
}

impl Default for PngStatus
{
    fn default() -> Self
    {
        PngStatus::empty()
    }
}

#[test]
fn flags_are_additive()
{
    let mut status = PngStatus::LOADING;

    status.insert(PngStatus::IS_DRAWABLE);
    status.insert(PngStatus::CRC_ERR | PngStatus::ERROR);
    status.remove(PngStatus::LOADING);

    assert_eq!(
        status,
        PngStatus::IS_DRAWABLE | PngStatus::CRC_ERR | PngStatus::ERROR
    );
    assert_eq!(status.bits(), 0x0109);
}
