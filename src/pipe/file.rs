//! Terminal chain ends backed by readers and writers.

use std::io::{Read, Write};

use crate::pipe::{Pipe, Result, Straw};

/// Terminal pipe writing untransformed bytes to a [`Write`] sink.
pub struct FilePipe<W> {
    sink: W,
}

impl<W: Write> FilePipe<W> {
    pub fn new(sink: W) -> Self {
        Self { sink }
    }

    /// Hand back the sink, e.g. to look at a buffer in tests.
    pub fn into_inner(self) -> W {
        self.sink
    }
}

impl<W: Write> Pipe for FilePipe<W> {
    fn put(&mut self, data: &[u8]) -> Result<usize> {
        self.sink.write_all(data)?;
        Ok(data.len())
    }

    fn flush(&mut self) -> Result<usize> {
        self.sink.flush()?;
        Ok(0)
    }
}

/// Terminal straw reading untransformed bytes from a [`Read`] source.
pub struct FileStraw<R> {
    source: R,
}

impl<R: Read> FileStraw<R> {
    pub fn new(source: R) -> Self {
        Self { source }
    }
}

impl<R: Read> Straw for FileStraw<R> {
    fn get(&mut self, buf: &mut [u8]) -> Result<usize> {
        Ok(self.source.read(buf)?)
    }
}
