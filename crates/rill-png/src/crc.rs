//! CRC-32 as laid out in ISO 3309, the variant PNG chunks carry.
use std::sync::OnceLock;

static CRC_TABLE: OnceLock<[u32; 256]> = OnceLock::new();

fn make_crc_table() -> [u32; 256]
{
    let mut table = [0_u32; 256];

    for (n, entry) in table.iter_mut().enumerate()
    {
        let mut c = n as u32;

        for _ in 0..8
        {
            if c & 1 == 1
            {
                c = 0xEDB8_8320 ^ (c >> 1);
            }
            else
            {
                c >>= 1;
            }
        }
        *entry = c;
    }
    table
}

/// The process-wide remainder table, built on first use.
pub(crate) fn crc_table() -> &'static [u32; 256]
{
    CRC_TABLE.get_or_init(make_crc_table)
}

/// Advance a running CRC over `buf`.
///
/// A chunk's CRC starts from `0xFFFF_FFFF` and the value stored on the
/// wire is the final running CRC complemented.
pub fn crc_update(crc: u32, buf: &[u8]) -> u32
{
    let table = crc_table();
    let mut c = crc;

    for byte in buf
    {
        c = table[usize::from((c as u8) ^ byte)] ^ (c >> 8);
    }
    c
}

/// One-shot CRC of a complete buffer, pre-conditioned and complemented.
pub fn crc32(buf: &[u8]) -> u32
{
    crc_update(0xFFFF_FFFF, buf) ^ 0xFFFF_FFFF
}

#[test]
fn crc_check_value()
{
    // the ITU/ISO check value for this polynomial
    assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
}

#[test]
fn crc_of_empty_iend()
{
    // every PNG ends with this exact chunk CRC
    assert_eq!(crc32(b"IEND"), 0xAE42_6082);
}

#[test]
fn incremental_matches_one_shot()
{
    let data = b"IHDR with some payload bytes";

    let split = crc_update(crc_update(0xFFFF_FFFF, &data[..7]), &data[7..]) ^ 0xFFFF_FFFF;

    assert_eq!(split, crc32(data));
}
