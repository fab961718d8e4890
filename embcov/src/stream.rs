//! Splits an output stream written through an [`crate::sink::Envelope`] back into records.

use crate::{
    codec::{decode_length, Reader},
    error::Error,
    sink::END_MARKER,
};

/// One `name\0 length record` group of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamEntry<'a> {
    pub name: &'a [u8],
    pub record: &'a [u8],
}

/// Iterates over the entries of a stream up to the end marker.
///
/// Anything after the marker is ignored. A stream that stops early yields one
/// [`Error::Malformed`] and then ends.
pub struct StreamReader<'a> {
    reader: Reader<'a>,
    done: bool,
}

impl<'a> StreamReader<'a> {
    pub fn new(stream: &'a [u8]) -> Self {
        Self {
            reader: Reader::init(stream),
            done: false,
        }
    }

    /// Bytes consumed so far.
    pub fn used(&self) -> usize {
        self.reader.used()
    }

    fn read_entry(&mut self) -> Result<Option<StreamEntry<'a>>, Error> {
        if !self.reader.any_left() {
            return Err(Error::Malformed("stream ends without end marker"));
        }

        let name = self
            .reader
            .take_until_nul()
            .ok_or(Error::Malformed("truncated name"))?;
        if name == &END_MARKER[..END_MARKER.len() - 1] {
            return Ok(None);
        }

        let len = self
            .reader
            .take(4)
            .and_then(decode_length)
            .ok_or(Error::Malformed("truncated length"))?;
        let record = self
            .reader
            .take(len)
            .ok_or(Error::Malformed("truncated record"))?;

        Ok(Some(StreamEntry { name, record }))
    }
}

impl<'a> Iterator for StreamReader<'a> {
    type Item = Result<StreamEntry<'a>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let entry = self.read_entry();
        if !matches!(entry, Ok(Some(_))) {
            self.done = true;
        }
        entry.transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{Envelope, MemoryBlock, Sink};

    fn stream(records: &[(&[u8], &[u8])]) -> Vec<u8> {
        let mut block = vec![0u8; 4096];
        let mut sink = Envelope::new(MemoryBlock::new(&mut block));
        sink.begin().unwrap();
        for (name, record) in records {
            sink.record(name, record).unwrap();
        }
        sink.end().unwrap();
        sink.get_ref().written().to_vec()
    }

    #[test_log::test]
    fn test_entries() {
        let bytes = stream(&[(b"a.gcda", &[1, 2, 3, 4]), (b"dir/b.gcda", &[])]);
        let entries: Vec<_> = StreamReader::new(&bytes)
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(
            entries,
            vec![
                StreamEntry {
                    name: b"a.gcda",
                    record: &[1, 2, 3, 4]
                },
                StreamEntry {
                    name: b"dir/b.gcda",
                    record: &[]
                },
            ]
        );
    }

    #[test_log::test]
    fn test_trailing_garbage_is_ignored() {
        let mut bytes = stream(&[]);
        bytes.extend_from_slice(&[0xff; 16]);

        let mut reader = StreamReader::new(&bytes);
        assert_eq!(reader.next(), None);
        assert_eq!(reader.used(), END_MARKER.len());
    }

    #[test_log::test]
    fn test_truncated() {
        let bytes = stream(&[(b"a.gcda", &[1; 40])]);
        let cut = &bytes[..20];

        let results: Vec<_> = StreamReader::new(cut).collect();
        assert_eq!(results, vec![Err(Error::Malformed("truncated record"))]);

        let results: Vec<_> = StreamReader::new(&bytes[..bytes.len() - END_MARKER.len()]).collect();
        assert_eq!(results.len(), 2);
        assert_eq!(
            results[1],
            Err(Error::Malformed("stream ends without end marker"))
        );
    }
}
