//! Header encryption links: an RSA wrapped session key up front, then
//! Blowfish in 8 byte ECB blocks.

use blowfish::Blowfish;

use crate::crypto::{
    self, BlowfishKey, PKey, WrappedKey, BLOWFISH_BLOCK_SIZE, WRAPPED_KEY_SIZE,
};
use crate::pipe::{Pipe, Result, Straw};

/// Push-mode encryptor.
///
/// The first `put` emits the wrapped session key, after which data flows
/// through Blowfish in 8 byte blocks. A trailing partial block is held
/// back until `flush`, which zero pads it.
pub struct PkPipe<'a> {
    inner: &'a mut dyn Pipe,
    wrapped: WrappedKey,
    cipher: Blowfish,
    started: bool,
    buffer: [u8; BLOWFISH_BLOCK_SIZE],
    fill: usize,
}

impl<'a> PkPipe<'a> {
    /// `key` is the wrapping key (the private half when producing
    /// archives the game can open).
    pub fn new(inner: &'a mut dyn Pipe, key: &PKey, session_key: BlowfishKey) -> Self {
        Self {
            inner,
            wrapped: crypto::wrap_key(&session_key, key),
            cipher: crypto::init_cipher(&session_key),
            started: false,
            buffer: [0u8; BLOWFISH_BLOCK_SIZE],
            fill: 0,
        }
    }
}

impl Pipe for PkPipe<'_> {
    fn put(&mut self, data: &[u8]) -> Result<usize> {
        let mut total = 0;
        if !self.started {
            total += self.inner.put(&self.wrapped)?;
            self.started = true;
        }
        for &byte in data {
            self.buffer[self.fill] = byte;
            self.fill += 1;
            if self.fill == BLOWFISH_BLOCK_SIZE {
                crypto::encrypt_block(&self.cipher, &mut self.buffer);
                total += self.inner.put(&self.buffer)?;
                self.buffer = [0u8; BLOWFISH_BLOCK_SIZE];
                self.fill = 0;
            }
        }
        Ok(total)
    }

    fn flush(&mut self) -> Result<usize> {
        let mut total = 0;
        if self.fill > 0 {
            // The buffer past the fill point is still zero, which is
            // exactly the padding the format wants.
            crypto::encrypt_block(&self.cipher, &mut self.buffer);
            total += self.inner.put(&self.buffer)?;
            self.buffer = [0u8; BLOWFISH_BLOCK_SIZE];
            self.fill = 0;
        }
        total += self.inner.flush()?;
        Ok(total)
    }
}

/// Pull-mode decryptor.
///
/// The first `get` consumes and unwraps the session key; afterwards 8
/// byte blocks are decrypted from the source on demand.
pub struct PkStraw<'a> {
    inner: &'a mut dyn Straw,
    key: &'a PKey,
    cipher: Option<Blowfish>,
    buffer: [u8; BLOWFISH_BLOCK_SIZE],
    index: usize,
    avail: usize,
}

impl<'a> PkStraw<'a> {
    /// `key` is the unwrapping key (the public half for game archives).
    pub fn new(inner: &'a mut dyn Straw, key: &'a PKey) -> Self {
        Self {
            inner,
            key,
            cipher: None,
            buffer: [0u8; BLOWFISH_BLOCK_SIZE],
            index: 0,
            avail: 0,
        }
    }
}

impl Straw for PkStraw<'_> {
    fn get(&mut self, buf: &mut [u8]) -> Result<usize> {
        if self.cipher.is_none() {
            let mut wrapped = [0u8; WRAPPED_KEY_SIZE];
            self.inner.get_exact(&mut wrapped)?;
            let session = crypto::unwrap_key(&wrapped, self.key)?;
            self.cipher = Some(crypto::init_cipher(&session));
        }

        let mut total = 0;
        while total < buf.len() {
            if self.avail == 0 {
                let mut block = [0u8; BLOWFISH_BLOCK_SIZE];
                let got = self.inner.get(&mut block)?;
                if got == 0 {
                    break;
                }
                // Ciphertext comes in whole blocks; a short read here
                // means a truncated source.
                self.inner.get_exact(&mut block[got..])?;
                let cipher = self.cipher.as_ref().unwrap_or_else(|| unreachable!());
                crypto::decrypt_block(cipher, &mut block);
                self.buffer = block;
                self.index = 0;
                self.avail = BLOWFISH_BLOCK_SIZE;
            }
            let take = (buf.len() - total).min(self.avail);
            buf[total..total + take].copy_from_slice(&self.buffer[self.index..self.index + take]);
            self.index += take;
            self.avail -= take;
            total += take;
        }
        Ok(total)
    }
}
