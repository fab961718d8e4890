//! Reads `.gcda` records back, mostly for inspecting what a target emitted.

use crate::{
    codec::{decode_u32, Endianness, Reader},
    error::Error,
    gcov::{
        counter_kind_of, FunctionIdent, GcovType, GcovUnsigned, GCOV_DATA_MAGIC,
        GCOV_HAS_CHECKSUM, GCOV_TAG_FUNCTION, GCOV_TAG_FUNCTION_LENGTH, GCOV_UNIT_SIZE,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub version: GcovUnsigned,
    pub stamp: GcovUnsigned,
    pub checksum: Option<GcovUnsigned>,
}

/// Counters of one kind, decoded on access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Counters<'a> {
    raw: &'a [u8],
    endianness: Endianness,
}

impl<'a> Counters<'a> {
    pub fn len(&self) -> usize {
        self.raw.len() / 8
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<GcovType> {
        let bytes = self.raw.get(index * 8..index * 8 + 8)?;
        let lo = decode_u32(&bytes[..4], self.endianness)? as u64;
        let hi = decode_u32(&bytes[4..], self.endianness)? as u64;
        Some((hi << 32 | lo) as GcovType)
    }

    pub fn iter(&self) -> impl Iterator<Item = GcovType> + 'a {
        let counters = *self;
        (0..counters.len()).filter_map(move |i| counters.get(i))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Item<'a> {
    Function(FunctionIdent),
    Counters { kind: usize, values: Counters<'a> },
}

/// Iterates over the blocks of one record.
pub struct RecordReader<'a> {
    reader: Reader<'a>,
    endianness: Endianness,
    header: Header,
    done: bool,
}

impl<'a> RecordReader<'a> {
    pub fn new(record: &'a [u8], endianness: Endianness) -> Result<Self, Error> {
        let mut reader = Reader::init(record);
        let mut word = || {
            reader
                .read_u32(endianness)
                .ok_or(Error::Malformed("truncated header"))
        };

        if word()? != GCOV_DATA_MAGIC {
            return Err(Error::Malformed("bad magic"));
        }
        let version = word()?;
        let stamp = word()?;
        let checksum = if GCOV_HAS_CHECKSUM {
            Some(word()?)
        } else {
            None
        };

        Ok(Self {
            reader,
            endianness,
            header: Header {
                version,
                stamp,
                checksum,
            },
            done: false,
        })
    }

    /// Byte order of `record`, judged by its magic.
    pub fn detect(record: &[u8]) -> Option<Endianness> {
        let magic = record.get(..4)?;
        [Endianness::NATIVE, Endianness::Little, Endianness::Big]
            .into_iter()
            .find(|endianness| decode_u32(magic, *endianness) == Some(GCOV_DATA_MAGIC))
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    fn read_item(&mut self) -> Result<Item<'a>, Error> {
        let tag = self
            .reader
            .read_u32(self.endianness)
            .ok_or(Error::Malformed("truncated tag"))?;
        let length = self
            .reader
            .read_u32(self.endianness)
            .ok_or(Error::Malformed("truncated length"))?;
        let words = (length / GCOV_UNIT_SIZE) as usize;

        if tag == GCOV_TAG_FUNCTION {
            if words != GCOV_TAG_FUNCTION_LENGTH as usize {
                return Err(Error::Malformed("function block of unexpected length"));
            }
            let mut word = || {
                self.reader
                    .read_u32(self.endianness)
                    .ok_or(Error::Malformed("truncated function block"))
            };
            return Ok(Item::Function(FunctionIdent {
                ident: word()?,
                lineno_checksum: word()?,
                cfg_checksum: word()?,
            }));
        }

        let kind = counter_kind_of(tag).ok_or(Error::Malformed("unknown tag"))?;
        if words % 2 != 0 {
            return Err(Error::Malformed("odd counter block length"));
        }
        let raw = self
            .reader
            .take(words * 4)
            .ok_or(Error::Malformed("truncated counter block"))?;

        Ok(Item::Counters {
            kind,
            values: Counters {
                raw,
                endianness: self.endianness,
            },
        })
    }
}

impl<'a> Iterator for RecordReader<'a> {
    type Item = Result<Item<'a>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || !self.reader.any_left() {
            return None;
        }

        let item = self.read_item();
        self.done = item.is_err();
        Some(item)
    }
}
