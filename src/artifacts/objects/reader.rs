//! Loose object reader
//!
//! The header is parsed eagerly from a bounded lookahead, so type and length
//! are known before any payload byte is consumed. The unparsed rest of the
//! lookahead is chained in front of the remaining decompressed stream.

use crate::artifacts::objects::HEADER_LIMIT;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::tree::PrettyTreeReader;
use crate::errors::ObjectError;
use flate2::read::ZlibDecoder;
use std::io::{self, Chain, Cursor, Read};
use tracing::trace;

/// Framing parse variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReaderOptions {
    /// Render tree payloads as pretty text lines.
    pub pretty_tree: bool,
}

impl ReaderOptions {
    pub fn pretty() -> Self {
        ReaderOptions { pretty_tree: true }
    }
}

type RawPayload<R> = Chain<Cursor<Vec<u8>>, ZlibDecoder<R>>;

enum Payload<R: Read> {
    Raw(RawPayload<R>),
    Pretty(PrettyTreeReader<RawPayload<R>>),
}

pub struct ObjectReader<R: Read> {
    object_type: ObjectType,
    len: u64,
    options: ReaderOptions,
    payload: Payload<R>,
}

impl<R: Read> ObjectReader<R> {
    /// Reader returning payloads exactly as stored.
    pub fn new(source: R) -> Result<Self, ObjectError> {
        Self::with_options(source, ReaderOptions::default())
    }

    /// Decode the header of a compressed object
    ///
    /// At most the first 28 decompressed bytes are examined for the header;
    /// whatever follows it is handed out before the rest of the stream.
    ///
    /// # Arguments
    ///
    /// * `source` - Zlib compressed object bytes
    /// * `options` - Whether tree payloads are rendered as text
    ///
    /// # Returns
    ///
    /// A reader over the payload, or `MalformedHeader` / `UnknownType` when
    /// the header cannot be parsed
    pub fn with_options(source: R, options: ReaderOptions) -> Result<Self, ObjectError> {
        let mut decoder = ZlibDecoder::new(source);

        let mut lookahead = Vec::with_capacity(HEADER_LIMIT);
        (&mut decoder)
            .take(HEADER_LIMIT as u64)
            .read_to_end(&mut lookahead)?;

        let (object_type, len, consumed) = parse_header(&lookahead)?;
        trace!(%object_type, len, "object header parsed");

        let raw = Cursor::new(lookahead.split_off(consumed)).chain(decoder);
        let payload = if options.pretty_tree && object_type == ObjectType::Tree {
            Payload::Pretty(PrettyTreeReader::new(raw))
        } else {
            Payload::Raw(raw)
        };

        Ok(ObjectReader {
            object_type,
            len,
            options,
            payload,
        })
    }

    pub fn object_type(&self) -> ObjectType {
        self.object_type
    }

    /// Payload length declared by the header. For pretty trees this is the
    /// binary length, not the length of the rendered text.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Start over on a new source, keeping the options.
    pub fn reset(&mut self, source: R) -> Result<(), ObjectError> {
        *self = Self::with_options(source, self.options)?;
        Ok(())
    }

    /// Drop the decompression state and hand the original source back.
    pub fn into_inner(self) -> R {
        let raw = match self.payload {
            Payload::Raw(raw) => raw,
            Payload::Pretty(pretty) => pretty.into_inner(),
        };
        let (_, decoder) = raw.into_inner();
        decoder.into_inner()
    }
}

impl<R: Read> Read for ObjectReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.payload {
            Payload::Raw(raw) => raw.read(buf),
            Payload::Pretty(pretty) => pretty.read(buf),
        }
    }
}

/// Parse `<type> <length>\0` from the front of `buf`, returning the type, the
/// length and the number of header bytes.
fn parse_header(buf: &[u8]) -> Result<(ObjectType, u64, usize), ObjectError> {
    let space = buf
        .iter()
        .position(|&b| b == b' ')
        .ok_or_else(|| ObjectError::MalformedHeader("missing space after type".into()))?;
    let object_type = ObjectType::parse(&buf[..space])?;

    let nul = buf[space + 1..]
        .iter()
        .position(|&b| b == 0)
        .map(|at| space + 1 + at)
        .ok_or_else(|| ObjectError::MalformedHeader("missing NUL after length".into()))?;

    let digits = &buf[space + 1..nul];
    let malformed = || {
        ObjectError::MalformedHeader(format!(
            "invalid length {:?}",
            String::from_utf8_lossy(digits)
        ))
    };
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return Err(malformed());
    }
    let len = std::str::from_utf8(digits)
        .map_err(|_| malformed())?
        .parse::<u64>()
        .map_err(|_| malformed())?;

    Ok((object_type, len, nul + 1))
}
