use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use log::{debug, error};

use crate::{error::Error, sink::ByteSink};

/// Writes the stream to a file, replacing whatever was there.
pub struct FileSink {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
}

impl FileSink {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            writer: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ByteSink for FileSink {
    fn open(&mut self) -> Result<(), Error> {
        let file = File::create(&self.path).map_err(|err| {
            error!("Failed to create {}: {}", self.path.display(), err);
            Error::SinkOpen("file")
        })?;
        debug!("writing coverage stream to {}", self.path.display());
        self.writer = Some(BufWriter::new(file));
        Ok(())
    }

    fn put_byte(&mut self, byte: u8) -> Result<(), Error> {
        self.put_bytes(&[byte])
    }

    fn put_bytes(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.writer
            .as_mut()
            .ok_or(Error::SinkWrite("file"))?
            .write_all(bytes)
            .map_err(|_| Error::SinkWrite("file"))
    }

    fn close(&mut self) -> Result<(), Error> {
        match self.writer.take() {
            Some(mut writer) => writer.flush().map_err(|_| Error::SinkWrite("file")),
            None => Ok(()),
        }
    }
}
