use crate::artifacts::tree::entry::TreeEntry;
use crate::errors::ObjectError;
use std::io::{self, Read};

const READ_CHUNK: usize = 8 * 1024;

/// Binary to text tree transcoder.
///
/// Mirrors [`TreeEncoder`](super::encoder::TreeEncoder): an entry split across
/// chunks is kept until its fixed-width digest is complete.
#[derive(Debug, Default)]
pub struct TreeDecoder {
    pending: Vec<u8>,
}

impl TreeDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume `chunk` and append the pretty line of every entry it completes
    /// to `out`. Returns the number of entries emitted.
    pub fn decode(&mut self, chunk: &[u8], out: &mut Vec<u8>) -> Result<usize, ObjectError> {
        self.pending.extend_from_slice(chunk);

        let mut consumed = 0;
        let mut entries = 0;
        while let Some((entry, used)) = TreeEntry::parse_binary(&self.pending[consumed..])? {
            entry.write_pretty(out)?;
            consumed += used;
            entries += 1;
        }
        self.pending.drain(..consumed);

        Ok(entries)
    }

    /// Bytes of an incomplete entry held back for the next chunk.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Fails if the input stopped in the middle of an entry.
    pub fn finish(&self) -> Result<(), ObjectError> {
        if self.pending.is_empty() {
            return Ok(());
        }
        Err(ObjectError::Truncated(format!(
            "{} bytes of an incomplete tree entry",
            self.pending.len()
        )))
    }
}

/// Reader adapter rendering a binary tree payload as pretty text.
///
/// Text produced beyond the caller's buffer is kept and handed out on the
/// following reads.
pub struct PrettyTreeReader<R: Read> {
    inner: R,
    decoder: TreeDecoder,
    rendered: Vec<u8>,
    position: usize,
    scratch: Vec<u8>,
    exhausted: bool,
}

impl<R: Read> PrettyTreeReader<R> {
    pub fn new(inner: R) -> Self {
        PrettyTreeReader {
            inner,
            decoder: TreeDecoder::new(),
            rendered: Vec::new(),
            position: 0,
            scratch: vec![0; READ_CHUNK],
            exhausted: false,
        }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for PrettyTreeReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        while self.position == self.rendered.len() {
            if self.exhausted {
                return Ok(0);
            }
            self.rendered.clear();
            self.position = 0;

            let n = self.inner.read(&mut self.scratch)?;
            if n == 0 {
                self.decoder.finish()?;
                self.exhausted = true;
                continue;
            }
            self.decoder.decode(&self.scratch[..n], &mut self.rendered)?;
        }

        let n = buf.len().min(self.rendered.len() - self.position);
        buf[..n].copy_from_slice(&self.rendered[self.position..self.position + n]);
        self.position += n;

        Ok(n)
    }
}
