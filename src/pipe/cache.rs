//! Read-side cache between a slow source and small-read consumers.

use crate::pipe::{Result, Straw};

/// Default cache capacity in bytes.
const CACHE_SIZE: usize = 1024;

/// A straw that fills an internal buffer from its source in large reads
/// and serves smaller requests out of it.
pub struct CacheStraw<'a> {
    source: &'a mut dyn Straw,
    buffer: Vec<u8>,
    index: usize,
    length: usize,
}

impl<'a> CacheStraw<'a> {
    pub fn new(source: &'a mut dyn Straw) -> Self {
        Self::with_capacity(source, CACHE_SIZE)
    }

    pub fn with_capacity(source: &'a mut dyn Straw, capacity: usize) -> Self {
        Self {
            source,
            buffer: vec![0u8; capacity.max(1)],
            index: 0,
            length: 0,
        }
    }
}

impl Straw for CacheStraw<'_> {
    fn get(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut total = 0;
        while total < buf.len() {
            if self.length > 0 {
                let readlen = (buf.len() - total).min(self.length);
                buf[total..total + readlen]
                    .copy_from_slice(&self.buffer[self.index..self.index + readlen]);
                self.index += readlen;
                self.length -= readlen;
                total += readlen;
            }
            if total == buf.len() {
                break;
            }
            self.length = self.source.get(&mut self.buffer)?;
            self.index = 0;
            if self.length == 0 {
                break;
            }
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::CacheStraw;
    use crate::pipe::{FileStraw, Straw};

    #[test]
    fn small_reads_cross_cache_refills() {
        let data: Vec<u8> = (0u8..=255).cycle().take(1000).collect();
        let mut source: &[u8] = &data;
        let mut fstraw = FileStraw::new(&mut source);
        let mut cache = CacheStraw::with_capacity(&mut fstraw, 64);

        let mut out = Vec::new();
        let mut buf = [0u8; 7];
        loop {
            let got = cache.get(&mut buf).unwrap();
            if got == 0 {
                break;
            }
            out.extend_from_slice(&buf[..got]);
        }
        assert_eq!(out, data);
    }

    #[test]
    fn oversized_read_drains_cache_and_source() {
        let data = [7u8; 100];
        let mut source: &[u8] = &data;
        let mut fstraw = FileStraw::new(&mut source);
        let mut cache = CacheStraw::with_capacity(&mut fstraw, 16);

        let mut small = [0u8; 4];
        cache.get_exact(&mut small).unwrap();
        let mut big = [0u8; 96];
        cache.get_exact(&mut big).unwrap();
        assert!(matches!(cache.get(&mut small), Ok(0)));
    }
}
