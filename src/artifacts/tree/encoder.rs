use crate::artifacts::tree::entry::TreeEntry;
use crate::errors::ObjectError;

/// Text to binary tree transcoder.
///
/// Input may be split anywhere, even inside a token; the incomplete tail of
/// each chunk is kept and prefixed to the next one. Entries are emitted in the
/// order they arrive.
#[derive(Debug, Default)]
pub struct TreeEncoder {
    pending: Vec<u8>,
}

impl TreeEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume `chunk` and append the binary form of every line it completes
    /// to `out`. Returns the number of entries emitted.
    pub fn encode(&mut self, chunk: &[u8], out: &mut Vec<u8>) -> Result<usize, ObjectError> {
        self.pending.extend_from_slice(chunk);

        let mut consumed = 0;
        let mut entries = 0;
        while let Some(end) = self.pending[consumed..].iter().position(|&b| b == b'\n') {
            let line = &self.pending[consumed..consumed + end];
            TreeEntry::parse_pretty(line)?.write_binary(out);
            consumed += end + 1;
            entries += 1;
        }
        self.pending.drain(..consumed);

        Ok(entries)
    }

    /// Bytes held back waiting for the rest of their line.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Fails if the input stopped in the middle of a line.
    pub fn finish(&self) -> Result<(), ObjectError> {
        if self.pending.is_empty() {
            return Ok(());
        }
        Err(ObjectError::Truncated(format!(
            "{} bytes of an unterminated tree line",
            self.pending.len()
        )))
    }
}
