//! ASCII hex helpers

/// Value of a single hex digit. Anything that is not `0-9`, `a-f` or `A-F`
/// reads as zero; framing errors are left to the record checksum.
pub const fn nibble(c: u8) -> u8 {
    match c {
        b'0'..=b'9' => c - b'0',
        b'a'..=b'f' => c - b'a' + 10,
        b'A'..=b'F' => c - b'A' + 10,
        _ => 0,
    }
}

/// Decode two hex digits, most significant first.
pub fn decode_byte(pair: &[u8]) -> u8 {
    nibble(pair[0]) << 4 | nibble(pair[1])
}

/// Decode four hex digits, high byte first.
pub fn decode_u16(quad: &[u8]) -> u16 {
    u16::from(decode_byte(&quad[..2])) << 8 | u16::from(decode_byte(&quad[2..4]))
}
