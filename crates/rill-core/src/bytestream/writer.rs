/// An appending writer over a growable byte buffer.
///
/// Writes go to the end of the buffer; `put_u32_be_at` patches a word
/// written earlier, which length-prefixed framings need once the body
/// size is known.
pub struct ByteWriter<'a>
{
    buffer: &'a mut Vec<u8>
}

impl<'a> ByteWriter<'a>
{
    pub fn new(buffer: &'a mut Vec<u8>) -> ByteWriter<'a>
    {
        ByteWriter { buffer }
    }

    /// Bytes written into the underlying buffer so far.
    pub fn position(&self) -> usize
    {
        self.buffer.len()
    }

    pub fn write_u8(&mut self, value: u8)
    {
        self.buffer.push(value);
    }

    pub fn write_u16_be(&mut self, value: u16)
    {
        self.buffer.extend_from_slice(&value.to_be_bytes());
    }

    pub fn write_u16_le(&mut self, value: u16)
    {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_u32_be(&mut self, value: u32)
    {
        self.buffer.extend_from_slice(&value.to_be_bytes());
    }

    pub fn write_u32_le(&mut self, value: u32)
    {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_u64_be(&mut self, value: u64)
    {
        self.buffer.extend_from_slice(&value.to_be_bytes());
    }

    pub fn write_bytes(&mut self, bytes: &[u8])
    {
        self.buffer.extend_from_slice(bytes);
    }

    /// Overwrite the 4 bytes at `position` with a big-endian word.
    ///
    /// Panics if `position + 4` exceeds what has been written; callers
    /// patch only offsets they reserved themselves.
    pub fn put_u32_be_at(&mut self, position: usize, value: u32)
    {
        self.buffer[position..position + 4].copy_from_slice(&value.to_be_bytes());
    }
}

#[test]
fn backpatching()
{
    let mut sink = Vec::new();
    let mut writer = ByteWriter::new(&mut sink);

    let patch_at = writer.position();
    writer.write_u32_be(0);
    writer.write_bytes(b"body");
    writer.put_u32_be_at(patch_at, 4);

    assert_eq!(sink, [0, 0, 0, 4, b'b', b'o', b'd', b'y']);
}

#[test]
fn endian_writes()
{
    let mut sink = Vec::new();
    let mut writer = ByteWriter::new(&mut sink);

    writer.write_u16_be(0x0102);
    writer.write_u16_le(0x0102);
    writer.write_u64_be(0x0102_0304_0506_0708);

    assert_eq!(
        sink,
        [0x01, 0x02, 0x02, 0x01, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08]
    );
}
