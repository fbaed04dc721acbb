use core::fmt;

/// Error raised when a read would run past the end of the source.
#[derive(Copy, Clone, Eq, PartialEq)]
pub struct NotEnoughBytes
{
    pub requested: usize,
    pub available: usize
}

impl fmt::Debug for NotEnoughBytes
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(
            f,
            "Not enough bytes, requested {} but only {} are available",
            self.requested, self.available
        )
    }
}

/// A position-tracking reader over a borrowed byte slice.
///
/// Reads never panic; the `_err` variants report exhaustion while the
/// plain variants saturate to zero, which suits probing loops that
/// check [`has`](ByteReader::has) up front.
pub struct ByteReader<'a>
{
    source:   &'a [u8],
    position: usize
}

impl<'a> ByteReader<'a>
{
    pub const fn new(source: &'a [u8]) -> ByteReader<'a>
    {
        ByteReader { source, position: 0 }
    }

    /// Number of bytes between the cursor and the end of the source.
    pub fn remaining(&self) -> usize
    {
        self.source.len().saturating_sub(self.position)
    }

    /// True if at least `num` bytes can still be read.
    pub fn has(&self, num: usize) -> bool
    {
        self.remaining() >= num
    }

    pub const fn position(&self) -> usize
    {
        self.position
    }

    /// Move the cursor forward, clamped to the end of the source.
    pub fn skip(&mut self, num: usize)
    {
        self.position = self.position.saturating_add(num).min(self.source.len());
    }

    /// Move the cursor backwards, clamped to the start of the source.
    pub fn rewind(&mut self, num: usize)
    {
        self.position = self.position.saturating_sub(num);
    }

    /// Borrow `num` bytes starting `offset` bytes past the cursor
    /// without moving the cursor.
    pub fn peek_at(&self, offset: usize, num: usize) -> Result<&'a [u8], NotEnoughBytes>
    {
        let start = self.position.saturating_add(offset);
        let end = start.saturating_add(num);

        self.source.get(start..end).ok_or(NotEnoughBytes {
            requested: num,
            available: self.remaining().saturating_sub(offset)
        })
    }

    pub fn get_u8(&mut self) -> u8
    {
        let byte = self.source.get(self.position).copied().unwrap_or(0);
        self.position = self.position.saturating_add(1).min(self.source.len());
        byte
    }

    pub fn get_u16_be(&mut self) -> u16
    {
        u16::from(self.get_u8()) << 8 | u16::from(self.get_u8())
    }

    pub fn get_u16_le(&mut self) -> u16
    {
        u16::from(self.get_u8()) | u16::from(self.get_u8()) << 8
    }

    pub fn get_u32_be(&mut self) -> u32
    {
        u32::from(self.get_u16_be()) << 16 | u32::from(self.get_u16_be())
    }

    pub fn get_u32_le(&mut self) -> u32
    {
        u32::from(self.get_u16_le()) | u32::from(self.get_u16_le()) << 16
    }

    pub fn get_u16_be_err(&mut self) -> Result<u16, NotEnoughBytes>
    {
        self.require(2)?;
        Ok(self.get_u16_be())
    }

    pub fn get_u32_be_err(&mut self) -> Result<u32, NotEnoughBytes>
    {
        self.require(4)?;
        Ok(self.get_u32_be())
    }

    pub fn get_u64_be_err(&mut self) -> Result<u64, NotEnoughBytes>
    {
        self.require(8)?;
        Ok(u64::from(self.get_u32_be()) << 32 | u64::from(self.get_u32_be()))
    }

    fn require(&self, num: usize) -> Result<(), NotEnoughBytes>
    {
        if self.has(num)
        {
            Ok(())
        }
        else
        {
            Err(NotEnoughBytes {
                requested: num,
                available: self.remaining()
            })
        }
    }
}

#[test]
fn endian_reads()
{
    let data = [0x01, 0x02, 0x03, 0x04];

    let mut be = ByteReader::new(&data);
    assert_eq!(be.get_u32_be(), 0x0102_0304);

    let mut le = ByteReader::new(&data);
    assert_eq!(le.get_u32_le(), 0x0403_0201);
}

#[test]
fn reads_past_end_saturate()
{
    let mut reader = ByteReader::new(&[0xAA]);

    assert_eq!(reader.get_u16_be(), 0xAA00);
    assert_eq!(reader.remaining(), 0);
    assert_eq!(reader.get_u8(), 0);
    assert!(reader.get_u32_be_err().is_err());
}

#[test]
fn peek_does_not_advance()
{
    let mut reader = ByteReader::new(b"IHDRrest");

    assert_eq!(reader.peek_at(0, 4).unwrap(), b"IHDR");
    assert_eq!(reader.position(), 0);

    reader.skip(4);
    assert_eq!(reader.peek_at(0, 4).unwrap(), b"rest");
    reader.rewind(4);
    assert_eq!(reader.position(), 0);
}
