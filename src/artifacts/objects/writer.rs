//! Streaming loose object writer
//!
//! A writer moves through `Idle → HeaderWritten → Closed`:
//!
//! - [`ObjectWriter::write_header`] declares the type and, optionally, the
//!   payload size.
//! - With a known size (and a non-tree type) the header goes out immediately
//!   and every write streams through zlib and SHA-1.
//! - With an unknown size, or for trees, the payload is spooled to a scratch
//!   file (tree text is transcoded to binary first) and the header is emitted
//!   on [`ObjectWriter::close`], once the real length is known.

use crate::artifacts::objects::checksum::Checksum;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::tree::TreeEncoder;
use crate::errors::ObjectError;
use std::fs::File;
use std::io::{self, Seek, Write};
use tracing::{debug, trace};

/// Object writing protocol shared by plain codec writers and store writers.
pub trait ObjectWrite: Write {
    fn write_header(&mut self, object_type: ObjectType, size: Option<u64>)
    -> Result<(), ObjectError>;

    fn close(&mut self) -> Result<ObjectId, ObjectError>;

    fn hash(&self) -> Result<ObjectId, ObjectError>;
}

enum WriterState {
    Idle,
    Streaming {
        declared: u64,
        header_len: u64,
    },
    Spooling {
        object_type: ObjectType,
        spool: File,
        tree: Option<TreeEncoder>,
        scratch: Vec<u8>,
    },
    Closed(ObjectId),
    Failed,
}

pub struct ObjectWriter<W: Write> {
    checksum: Option<Checksum<W>>,
    sink: Option<W>,
    state: WriterState,
}

impl<W: Write> ObjectWriter<W> {
    /// Create a writer whose compressed output goes to `sink`.
    pub fn new(sink: W) -> Self {
        ObjectWriter {
            checksum: Some(Checksum::new(sink)),
            sink: None,
            state: WriterState::Idle,
        }
    }

    /// Declare the object type and payload size. `None` means the size is
    /// unknown; trees always behave as if it were.
    pub fn write_header(
        &mut self,
        object_type: ObjectType,
        size: Option<u64>,
    ) -> Result<(), ObjectError> {
        if !matches!(self.state, WriterState::Idle) {
            return Err(ObjectError::HeaderOrderViolation("header already written"));
        }

        match size {
            Some(declared) if object_type != ObjectType::Tree => {
                let header = object_type.header(declared);
                self.checksum_mut()?.write_all(&header)?;
                self.state = WriterState::Streaming {
                    declared,
                    header_len: header.len() as u64,
                };
            }
            _ => {
                let tree = (object_type == ObjectType::Tree).then(TreeEncoder::new);
                self.state = WriterState::Spooling {
                    object_type,
                    spool: tempfile::tempfile()?,
                    tree,
                    scratch: Vec::new(),
                };
            }
        }

        trace!(%object_type, ?size, "object header accepted");
        Ok(())
    }

    /// Finish the object and return its digest.
    ///
    /// A second call fails with [`ObjectError::HeaderOrderViolation`], as does
    /// closing before a header was written.
    pub fn close(&mut self) -> Result<ObjectId, ObjectError> {
        match std::mem::replace(&mut self.state, WriterState::Failed) {
            WriterState::Idle => {
                self.state = WriterState::Idle;
                Err(ObjectError::HeaderOrderViolation("close before header"))
            }
            WriterState::Closed(oid) => {
                self.state = WriterState::Closed(oid);
                Err(ObjectError::HeaderOrderViolation("writer already closed"))
            }
            WriterState::Failed => Err(ObjectError::HeaderOrderViolation(
                "writer failed and cannot be closed",
            )),
            WriterState::Streaming {
                declared,
                header_len,
            } => {
                let actual = self.checksum_mut()?.written() - header_len;
                if actual != declared {
                    return Err(ObjectError::SizeMismatch { declared, actual });
                }
                self.finish()
            }
            WriterState::Spooling {
                object_type,
                mut spool,
                tree,
                ..
            } => {
                if let Some(tree) = &tree {
                    tree.finish()?;
                }

                let size = spool.stream_position()?;
                spool.rewind()?;

                let checksum = self.checksum_mut()?;
                checksum.write_all(&object_type.header(size))?;
                io::copy(&mut spool, checksum)?;
                debug!(%object_type, size, "spooled object measured");

                self.finish()
            }
        }
    }

    /// Digest of the framed object; only available after [`close`](Self::close).
    pub fn hash(&self) -> Result<ObjectId, ObjectError> {
        match &self.state {
            WriterState::Closed(oid) => Ok(oid.clone()),
            _ => Err(ObjectError::HeaderOrderViolation("hash requested before close")),
        }
    }

    /// Hand back the finished sink after a successful close.
    pub fn take_sink(&mut self) -> Result<W, ObjectError> {
        self.sink
            .take()
            .ok_or(ObjectError::HeaderOrderViolation("sink is not available"))
    }

    fn finish(&mut self) -> Result<ObjectId, ObjectError> {
        let checksum = self
            .checksum
            .take()
            .ok_or(ObjectError::HeaderOrderViolation("writer already closed"))?;
        let (oid, sink) = checksum.finish()?;

        self.sink = Some(sink);
        self.state = WriterState::Closed(oid.clone());
        debug!(%oid, "object written");

        Ok(oid)
    }

    fn checksum_mut(&mut self) -> Result<&mut Checksum<W>, ObjectError> {
        self.checksum
            .as_mut()
            .ok_or(ObjectError::HeaderOrderViolation("writer already closed"))
    }
}

impl<W: Write> Write for ObjectWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let result = match &mut self.state {
            WriterState::Idle => Err(ObjectError::HeaderOrderViolation("write before header")),
            WriterState::Closed(_) | WriterState::Failed => {
                Err(ObjectError::HeaderOrderViolation("write after close"))
            }
            WriterState::Streaming {
                declared,
                header_len,
            } => match self.checksum.as_mut() {
                None => Err(ObjectError::HeaderOrderViolation("write after close")),
                Some(checksum) => {
                    let actual = checksum.written() - *header_len + buf.len() as u64;
                    if actual > *declared {
                        Err(ObjectError::SizeMismatch {
                            declared: *declared,
                            actual,
                        })
                    } else {
                        checksum.write(buf).map_err(ObjectError::from)
                    }
                }
            },
            WriterState::Spooling {
                spool,
                tree,
                scratch,
                ..
            } => spool_chunk(spool, tree.as_mut(), scratch, buf).map(|()| buf.len()),
        };

        // a partially accepted payload cannot be framed correctly any more
        if result.is_err()
            && matches!(
                self.state,
                WriterState::Streaming { .. } | WriterState::Spooling { .. }
            )
        {
            self.state = WriterState::Failed;
        }
        result.map_err(io::Error::from)
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.state {
            WriterState::Spooling { spool, .. } => spool.flush(),
            _ => match self.checksum.as_mut() {
                Some(checksum) => checksum.flush(),
                None => Ok(()),
            },
        }
    }
}

fn spool_chunk(
    spool: &mut File,
    tree: Option<&mut TreeEncoder>,
    scratch: &mut Vec<u8>,
    chunk: &[u8],
) -> Result<(), ObjectError> {
    match tree {
        Some(encoder) => {
            scratch.clear();
            encoder.encode(chunk, scratch)?;
            spool.write_all(scratch)?;
        }
        None => spool.write_all(chunk)?,
    }
    Ok(())
}

impl<W: Write> ObjectWrite for ObjectWriter<W> {
    fn write_header(
        &mut self,
        object_type: ObjectType,
        size: Option<u64>,
    ) -> Result<(), ObjectError> {
        ObjectWriter::write_header(self, object_type, size)
    }

    fn close(&mut self) -> Result<ObjectId, ObjectError> {
        ObjectWriter::close(self)
    }

    fn hash(&self) -> Result<ObjectId, ObjectError> {
        ObjectWriter::hash(self)
    }
}
