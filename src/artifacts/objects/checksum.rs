use crate::artifacts::objects::object_id::ObjectId;
use flate2::Compression;
use flate2::write::ZlibEncoder;
use sha1::{Digest, Sha1};
use std::io::{self, Write};

/// Compressing sink that hashes every uncompressed byte on its way through.
///
/// The digest covers exactly the bytes accepted by the encoder, so a partial
/// write never leaves the digest and the compressed stream out of step.
pub struct Checksum<W: Write> {
    encoder: ZlibEncoder<W>,
    digest: Sha1,
    written: u64,
}

impl<W: Write> Checksum<W> {
    pub fn new(sink: W) -> Self {
        Checksum {
            encoder: ZlibEncoder::new(sink, Compression::default()),
            digest: Sha1::new(),
            written: 0,
        }
    }

    /// Uncompressed bytes accepted so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Finish the zlib stream and return the digest with the sink.
    pub fn finish(self) -> io::Result<(ObjectId, W)> {
        let sink = self.encoder.finish()?;
        let raw: [u8; 20] = self.digest.finalize().into();
        Ok((ObjectId::from_raw(&raw), sink))
    }
}

impl<W: Write> Write for Checksum<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.encoder.write(buf)?;
        self.digest.update(&buf[..n]);
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.encoder.flush()
    }
}
