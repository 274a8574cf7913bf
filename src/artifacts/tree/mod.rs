//! Tree entry transcoding
//!
//! Trees are stored as a concatenation of binary entries
//! `<mode> <name>\0<20-byte-sha1>` and displayed as pretty lines
//! `<mode> <type> <hex40>\t<name>\n`. The encoder and decoder convert between
//! the two while input arrives in arbitrarily sized chunks.
//!
//! Entry order is passed through untouched: canonical tree ordering is the
//! caller's responsibility.

pub mod decoder;
pub mod encoder;
pub mod entry;

pub use decoder::{PrettyTreeReader, TreeDecoder};
pub use encoder::TreeEncoder;
pub use entry::TreeEntry;
