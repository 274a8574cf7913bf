use crate::artifacts::objects::DIGEST_SIZE;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::errors::ObjectError;
use derive_new::new;

/// A single tree entry, independent of its encoding.
///
/// Binary: `<mode> <name>\0<20-byte-sha1>`
/// Pretty: `<mode> <type> <hex40>\t<name>\n`
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct TreeEntry {
    /// File permissions and kind, as an octal value (`0o100644`, `0o40000`).
    pub mode: u32,
    /// Raw entry name; never contains NUL or LF.
    pub name: Vec<u8>,
    pub target: ObjectId,
}

impl TreeEntry {
    /// Kind of the referenced object, selected by the leading octal digit of
    /// the mode: `1` is a blob, `4` is a tree.
    pub fn object_type(&self) -> Result<ObjectType, ObjectError> {
        let mut leading = self.mode;
        while leading >= 8 {
            leading /= 8;
        }

        match leading {
            1 => Ok(ObjectType::Blob),
            4 => Ok(ObjectType::Tree),
            _ => Err(ObjectError::MalformedTree(format!(
                "unrecognized mode {:o}",
                self.mode
            ))),
        }
    }

    pub fn write_binary(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(format!("{:o} ", self.mode).as_bytes());
        out.extend_from_slice(&self.name);
        out.push(0);
        out.extend_from_slice(&self.target.to_raw());
    }

    /// Tree modes are displayed zero-padded to six digits (`040000`), blob
    /// modes already have six.
    pub fn write_pretty(&self, out: &mut Vec<u8>) -> Result<(), ObjectError> {
        let object_type = self.object_type()?;
        let padding = match object_type {
            ObjectType::Tree => "0",
            _ => "",
        };

        out.extend_from_slice(
            format!("{padding}{:o} {object_type} {}\t", self.mode, self.target).as_bytes(),
        );
        out.extend_from_slice(&self.name);
        out.push(b'\n');
        Ok(())
    }

    /// Parse one pretty line
    ///
    /// # Arguments
    ///
    /// * `line` - `<mode> <type> <hex40>\t<name>` without its trailing newline;
    ///   the leading zero of tree modes is optional
    ///
    /// # Returns
    ///
    /// The entry, `MalformedHeader` for a bad digest, or `MalformedTree` for
    /// any other structural defect
    pub fn parse_pretty(line: &[u8]) -> Result<Self, ObjectError> {
        let (mode, rest) = split_once(line, b' ')
            .ok_or_else(|| ObjectError::MalformedTree("missing space after mode".into()))?;
        let (object_type, rest) = split_once(rest, b' ')
            .ok_or_else(|| ObjectError::MalformedTree("missing space after type".into()))?;
        let (hash, name) = split_once(rest, b'\t')
            .ok_or_else(|| ObjectError::MalformedTree("missing tab before name".into()))?;

        // the type is implied by the mode, it only has to be a known token
        ObjectType::parse(object_type)?;

        let mode = mode.strip_prefix(b"0").unwrap_or(mode);
        let entry = TreeEntry {
            mode: parse_mode(mode)?,
            name: check_name(name)?.to_vec(),
            target: parse_hex_digest(hash)?,
        };
        entry.object_type()?;

        Ok(entry)
    }

    /// Parse one binary entry from the front of `buf`
    ///
    /// # Arguments
    ///
    /// * `buf` - Binary tree bytes, possibly ending mid-entry
    ///
    /// # Returns
    ///
    /// `Ok(None)` when `buf` holds only part of an entry, otherwise the entry
    /// and the number of bytes it occupied
    pub fn parse_binary(buf: &[u8]) -> Result<Option<(Self, usize)>, ObjectError> {
        match buf.first() {
            None => return Ok(None),
            Some(b'1' | b'4') => {}
            Some(other) => {
                return Err(ObjectError::MalformedTree(format!(
                    "unrecognized mode starting with {:?}",
                    char::from(*other)
                )));
            }
        }

        let Some(space) = buf.iter().position(|&b| b == b' ') else {
            return Ok(None);
        };
        let Some(nul) = buf[space + 1..].iter().position(|&b| b == 0) else {
            return Ok(None);
        };
        let nul = space + 1 + nul;
        let end = nul + 1 + DIGEST_SIZE;
        if buf.len() < end {
            return Ok(None);
        }

        let mut digest = [0u8; DIGEST_SIZE];
        digest.copy_from_slice(&buf[nul + 1..end]);

        let entry = TreeEntry {
            mode: parse_mode(&buf[..space])?,
            name: check_name(&buf[space + 1..nul])?.to_vec(),
            target: ObjectId::from_raw(&digest),
        };

        Ok(Some((entry, end)))
    }
}

fn split_once(bytes: &[u8], delimiter: u8) -> Option<(&[u8], &[u8])> {
    let at = bytes.iter().position(|&b| b == delimiter)?;
    Some((&bytes[..at], &bytes[at + 1..]))
}

fn parse_mode(mode: &[u8]) -> Result<u32, ObjectError> {
    let malformed = || {
        ObjectError::MalformedTree(format!(
            "invalid mode {:?}",
            String::from_utf8_lossy(mode)
        ))
    };

    if mode.is_empty() || !mode.iter().all(|b| (b'0'..=b'7').contains(b)) {
        return Err(malformed());
    }
    let digits = std::str::from_utf8(mode).map_err(|_| malformed())?;
    u32::from_str_radix(digits, 8).map_err(|_| malformed())
}

fn check_name(name: &[u8]) -> Result<&[u8], ObjectError> {
    if name.is_empty() {
        return Err(ObjectError::MalformedTree("empty entry name".into()));
    }
    if name.contains(&0) || name.contains(&b'\n') {
        return Err(ObjectError::MalformedTree(format!(
            "entry name {:?} contains NUL or LF",
            String::from_utf8_lossy(name)
        )));
    }
    Ok(name)
}

fn parse_hex_digest(hash: &[u8]) -> Result<ObjectId, ObjectError> {
    let mut digest = [0u8; DIGEST_SIZE];
    hex::decode_to_slice(hash, &mut digest).map_err(|err| {
        ObjectError::MalformedHeader(format!(
            "invalid object id {:?}: {err}",
            String::from_utf8_lossy(hash)
        ))
    })?;
    Ok(ObjectId::from_raw(&digest))
}
