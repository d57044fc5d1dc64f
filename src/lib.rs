//! Structures and tools for the MIX archive container format used by the
//! classic Westwood RTS games.
//!
//! The crate is organized around a few building blocks:
//!
//! * [`crc`] - the two 32 bit hash schemes that address files inside a MIX.
//! * [`pipe`] - composable byte transformers ([`pipe::Pipe`]s push bytes
//!   towards a sink, [`pipe::Straw`]s pull bytes from a source).
//! * [`crypto`] - the RSA-wrapped Blowfish scheme protecting MIX headers.
//! * [`mix`] - the archive format itself: [`mix::io::MixBuilder`] packages
//!   files, [`mix::io::MixArchive`] reads them back.
//! * [`mix::db`] - the filename database mapping hashes back to names.
//!
//! The `makemix` and `unmakemix` binaries are thin command line frontends
//! over these modules.

pub mod crc;
pub mod crypto;
pub mod ini;
pub mod logging;
pub mod mix;
pub mod pipe;
pub mod utils;
