//! Composable byte transformers.
//!
//! A [`Pipe`] pushes bytes towards a sink, a [`Straw`] pulls bytes from a
//! source. Chains are composed bottom-up on the stack: a transforming
//! link borrows its successor, so a link can never outlive the terminal
//! end that owns the file handle.

mod cache;
mod file;
mod pk;
mod sha;

pub use cache::CacheStraw;
pub use file::{FilePipe, FileStraw};
pub use pk::{PkPipe, PkStraw};
pub use sha::Sha1Pipe;

/// The error type for pipe and straw chains.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An [`std::io::Error`] from the terminal end of the chain.
    #[error("{0}")]
    IO(#[from] std::io::Error),
    /// A [`crate::crypto::Error`] from a key handling link.
    #[error("{0}")]
    Crypto(#[from] crate::crypto::Error),
}

type Result<T> = std::result::Result<T, Error>;

/// A push-mode byte transformer.
///
/// `put` transforms its input and hands the result to the next link.
pub trait Pipe {
    /// Process `data`, pushing the transformed bytes downstream.
    /// Returns the number of bytes that reached the sink; a buffering
    /// link may legitimately return 0.
    fn put(&mut self, data: &[u8]) -> Result<usize>;

    /// Emit any buffered tail, then flush the rest of the chain.
    /// Returns the number of bytes this pushed to the sink.
    fn flush(&mut self) -> Result<usize>;
}

/// A pull-mode byte transformer.
///
/// `get` requests bytes from the previous link, transforms them, and
/// returns them.
pub trait Straw {
    /// Fill `buf` with up to `buf.len()` transformed bytes.
    /// Returns the number of bytes produced; 0 means the source ran dry.
    fn get(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Fill all of `buf`, failing with
    /// [`std::io::ErrorKind::UnexpectedEof`] if the source runs dry first.
    fn get_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        let mut buf = buf;
        while !buf.is_empty() {
            match self.get(buf)? {
                0 => {
                    return Err(std::io::Error::new(
                        std::io::ErrorKind::UnexpectedEof,
                        "straw ran dry mid-read",
                    )
                    .into())
                }
                n => {
                    let rest = buf;
                    buf = &mut rest[n..];
                }
            }
        }
        Ok(())
    }
}
