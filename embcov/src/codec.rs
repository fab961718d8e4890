use core::convert::TryInto;

/// Byte order of the words inside a `.gcda` record.
///
/// Records are written in the layout of the target, so a host reading them must
/// be told which one that was.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    Little,
    Big,
}

impl Endianness {
    #[cfg(target_endian = "little")]
    pub const NATIVE: Endianness = Endianness::Little;
    #[cfg(target_endian = "big")]
    pub const NATIVE: Endianness = Endianness::Big;
}

/// Read from a byte slice.
pub struct Reader<'a> {
    buf: &'a [u8],
    offs: usize,
}

impl<'a> Reader<'a> {
    pub fn init(bytes: &'a [u8]) -> Reader<'a> {
        Reader {
            buf: bytes,
            offs: 0,
        }
    }

    pub fn rest(&mut self) -> &'a [u8] {
        let ret = &self.buf[self.offs..];
        self.offs = self.buf.len();
        ret
    }

    pub fn take(&mut self, len: usize) -> Option<&'a [u8]> {
        if self.left() < len {
            return None;
        }

        let current = self.offs;
        self.offs += len;
        Some(&self.buf[current..current + len])
    }

    pub fn peek(&self, len: usize) -> Option<&'a [u8]> {
        if self.left() < len {
            return None;
        }

        let current = self.offs;
        Some(&self.buf[current..current + len])
    }

    /// Takes the bytes up to the next NUL, consuming the NUL as well.
    pub fn take_until_nul(&mut self) -> Option<&'a [u8]> {
        let len = self.buf[self.offs..].iter().position(|b| *b == 0)?;
        let ret = self.take(len)?;
        self.offs += 1;
        Some(ret)
    }

    pub fn any_left(&self) -> bool {
        self.offs < self.buf.len()
    }

    pub fn left(&self) -> usize {
        self.buf.len() - self.offs
    }

    pub fn used(&self) -> usize {
        self.offs
    }

    pub fn sub(&mut self, len: usize) -> Option<Reader<'a>> {
        self.take(len).map(Reader::init)
    }

    pub fn read_u32(&mut self, endianness: Endianness) -> Option<u32> {
        self.take(4).and_then(|bytes| decode_u32(bytes, endianness))
    }
}

pub fn decode_u32(bytes: &[u8], endianness: Endianness) -> Option<u32> {
    let bytes: [u8; 4] = bytes.try_into().ok()?;
    Some(match endianness {
        Endianness::Little => u32::from_le_bytes(bytes),
        Endianness::Big => u32::from_be_bytes(bytes),
    })
}

/// Length field of the output envelope, most significant byte first.
///
/// Computed by division so the result does not depend on the byte order of the
/// machine producing it.
pub fn put_length(len: usize) -> [u8; 4] {
    [
        (len / 16_777_216) as u8,
        (len / 65_536) as u8,
        (len / 256) as u8,
        len as u8,
    ]
}

/// Inverse of [`put_length`].
pub fn decode_length(bytes: &[u8]) -> Option<usize> {
    decode_u32(bytes, Endianness::Big).map(|len| len as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test]
    fn test_reader() {
        let mut reader = Reader::init(b"abc\0\x01\x02\x03\x04rest");

        assert_eq!(reader.take_until_nul(), Some(&b"abc"[..]));
        assert_eq!(reader.used(), 4);
        assert_eq!(reader.peek(1), Some(&[1u8][..]));
        assert_eq!(reader.read_u32(Endianness::Big), Some(0x0102_0304));
        assert_eq!(reader.take_until_nul(), None);
        assert_eq!(reader.take(5), None);
        assert_eq!(reader.rest(), b"rest");
        assert!(!reader.any_left());
    }

    #[test_log::test]
    fn test_length_field() {
        assert_eq!(put_length(0x0102_0304), [1, 2, 3, 4]);
        assert_eq!(put_length(300), [0, 0, 1, 44]);
        assert_eq!(decode_length(&put_length(123_456)), Some(123_456));
    }

    #[test_log::test]
    fn test_native_endianness() {
        let word = 0xaabb_ccdd_u32.to_ne_bytes();
        assert_eq!(decode_u32(&word, Endianness::NATIVE), Some(0xaabb_ccdd));
    }
}
