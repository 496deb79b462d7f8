//! LEB128 unsigned varints as used throughout CryptoNote serialization.

/// Longest encoding of a `u64` (ceil(64 / 7)).
pub const MAX_VARINT_LEN: usize = 10;

/// Append `value` to `out` as a varint.
pub fn write_varint(out: &mut Vec<u8>, mut value: u64) {
    while value >= 0x80 {
        out.push((value as u8 & 0x7f) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

/// Encode `value` as a standalone varint.
pub fn encode_varint(value: u64) -> Vec<u8> {
    let mut out = Vec::with_capacity(MAX_VARINT_LEN);
    write_varint(&mut out, value);
    out
}

/// Decode a varint from the start of `data`. Returns `(value, bytes_read)`.
///
/// `None` on truncation, on more than 10 bytes, or when the value does not
/// fit in 64 bits.
pub fn read_varint(data: &[u8]) -> Option<(u64, usize)> {
    let mut value: u64 = 0;
    for (i, &byte) in data.iter().enumerate().take(MAX_VARINT_LEN) {
        let low = (byte & 0x7f) as u64;
        let shift = 7 * i as u32;
        if shift == 63 && low > 1 {
            return None;
        }
        value |= low << shift;
        if byte & 0x80 == 0 {
            return Some((value, i + 1));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_encodings() {
        assert_eq!(encode_varint(0), vec![0x00]);
        assert_eq!(encode_varint(127), vec![0x7f]);
        assert_eq!(encode_varint(128), vec![0x80, 0x01]);
        assert_eq!(encode_varint(300), vec![0xac, 0x02]);
        assert_eq!(encode_varint(u64::MAX).len(), MAX_VARINT_LEN);
    }

    #[test]
    fn test_read_reports_length() {
        let mut buf = encode_varint(0x3ef318);
        buf.extend_from_slice(&[0xaa, 0xbb]);
        let (value, used) = read_varint(&buf).unwrap();
        assert_eq!(value, 0x3ef318);
        assert_eq!(used, 3);
    }

    #[test]
    fn test_truncated_and_oversized() {
        assert!(read_varint(&[]).is_none());
        assert!(read_varint(&[0x80, 0x80]).is_none());
        assert!(read_varint(&[0xff; 11]).is_none());
        // 10th byte may only carry the top bit of a u64
        let mut too_big = vec![0xff; 9];
        too_big.push(0x02);
        assert!(read_varint(&too_big).is_none());
        assert_eq!(read_varint(&encode_varint(u64::MAX)), Some((u64::MAX, 10)));
    }
}
