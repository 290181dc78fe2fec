//! Variable-length unsigned integers (LEB128).
//!
//! Type tags, integer magnitudes, and the length prefix of every
//! length-prefixed object are stored in this encoding:
//! seven bits per byte, low bits first, high bit set on all but the last byte.

/// Number of bytes needed to encode `value`.
pub const fn encoded_len(mut value: u64) -> usize {
    let mut len = 1;
    while value >= 0x80 {
        value >>= 7;
        len += 1;
    }
    len
}

/// Write `value` at the start of `out`, returning the number of bytes written.
///
/// Panics if `out` is too short; callers size their buffers with `encoded_len`.
pub fn write(mut value: u64, out: &mut [u8]) -> usize {
    let mut i = 0;
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out[i] = byte;
            return i + 1;
        }
        out[i] = byte | 0x80;
        i += 1;
    }
}

/// Append `value` to a vector.
pub fn push(value: u64, out: &mut Vec<u8>) {
    let mut buf = [0u8; 10];
    let n = write(value, &mut buf);
    out.extend_from_slice(&buf[..n]);
}

/// Read a value from the start of `input`.
/// Returns the value and the number of bytes consumed,
/// or None if the input ends mid-value or the value overflows 64 bits.
pub fn read(input: &[u8]) -> Option<(u64, usize)> {
    let mut value = 0u64;
    for (i, &byte) in input.iter().enumerate() {
        let shift = 7 * i as u32;
        if shift >= 64 {
            return None;
        }
        let bits = (byte & 0x7f) as u64;
        if shift == 63 && bits > 1 {
            return None;
        }
        value |= bits << shift;
        if byte & 0x80 == 0 {
            return Some((value, i + 1));
        }
    }
    None
}

/// Length of the encoded value at the start of `input`, without decoding it.
/// Stops at the end of the input if the value is unterminated.
pub fn skip(input: &[u8]) -> usize {
    input
        .iter()
        .position(|b| b & 0x80 == 0)
        .map(|p| p + 1)
        .unwrap_or(input.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_values_take_one_byte() {
        for v in 0..0x80u64 {
            let mut buf = [0u8; 10];
            assert_eq!(write(v, &mut buf), 1);
            assert_eq!(buf[0], v as u8);
            assert_eq!(encoded_len(v), 1);
        }
    }

    #[test]
    fn boundaries() {
        for (v, len) in [
            (0x7fu64, 1),
            (0x80, 2),
            (0x3fff, 2),
            (0x4000, 3),
            (u32::MAX as u64, 5),
            (u64::MAX, 10),
        ] {
            let mut buf = Vec::new();
            push(v, &mut buf);
            assert_eq!(buf.len(), len, "length of {v:#x}");
            assert_eq!(encoded_len(v), len);
            assert_eq!(read(&buf), Some((v, len)));
            assert_eq!(skip(&buf), len);
        }
    }

    #[test]
    fn truncated_input() {
        assert_eq!(read(&[0x80, 0x80]), None);
        assert_eq!(read(&[]), None);
    }

    #[test]
    fn overflow_rejected() {
        let mut buf = vec![0xffu8; 9];
        buf.push(0x02);
        assert_eq!(read(&buf), None);
    }
}
