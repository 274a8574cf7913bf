//! Object store abstraction
//!
//! A store hands out compressed object streams by (possibly abbreviated)
//! hash and accepts new objects through a staged writer. Backends differ in
//! where the bytes live; lookup and publication rules are shared.

use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::reader::{ObjectReader, ReaderOptions};
use crate::artifacts::objects::writer::{ObjectWrite, ObjectWriter};
use crate::errors::{ObjectError, ObjectResult};
use std::io::{self, Read, Write};
use tracing::{debug, trace};

/// Storage backend for compressed loose objects.
///
/// Implementations only decide where compressed bytes live. Framing,
/// hashing and prefix rules are shared, so every backend yields the same
/// object IDs and the same stored bytes.
pub trait ObjectStore: Send + Sync {
    /// Raw, still compressed, bytes of a stored object.
    type Source: Read;
    /// Destination of compressed bytes until the object is published.
    type Staging: Write;

    /// Open the compressed stream of the object matching `hash`.
    ///
    /// `hash` may be abbreviated. No match yields [`ObjectError::NotFound`],
    /// several yield [`ObjectError::Ambiguous`].
    fn object(&self, hash: &str) -> ObjectResult<Self::Source>;

    /// Open a decoding reader over the object matching `hash`
    ///
    /// # Arguments
    ///
    /// * `hash` - Full or abbreviated object ID, at least two hex characters
    /// * `options` - Decoding options, e.g. rendering trees as text
    ///
    /// # Returns
    ///
    /// A reader positioned at the start of the payload, with the object type
    /// and length already parsed from the header
    fn reader(
        &self,
        hash: &str,
        options: ReaderOptions,
    ) -> ObjectResult<ObjectReader<Self::Source>> {
        ObjectReader::with_options(self.object(hash)?, options)
    }

    /// Fresh staging area for one object.
    fn stage(&self) -> ObjectResult<Self::Staging>;

    /// Make a staged object visible under `oid`.
    ///
    /// # Arguments
    ///
    /// * `oid` - ID computed while the object was written
    /// * `staged` - Staging area holding the compressed bytes
    ///
    /// Publishing an object that is already present succeeds and leaves the
    /// stored bytes as they were.
    fn publish(&self, oid: &ObjectId, staged: Self::Staging) -> ObjectResult<()>;

    /// Writer whose object becomes visible once it is closed.
    fn writer(&self) -> ObjectResult<StoreWriter<'_, Self>>
    where
        Self: Sized,
    {
        Ok(StoreWriter {
            store: self,
            inner: ObjectWriter::new(self.stage()?),
        })
    }
}

/// Object writer bound to a store.
pub struct StoreWriter<'s, S: ObjectStore> {
    store: &'s S,
    inner: ObjectWriter<S::Staging>,
}

impl<S: ObjectStore> StoreWriter<'_, S> {
    pub fn write_header(
        &mut self,
        object_type: ObjectType,
        size: Option<u64>,
    ) -> ObjectResult<()> {
        self.inner.write_header(object_type, size)
    }

    /// Finish the object and publish it to the store.
    pub fn close(&mut self) -> ObjectResult<ObjectId> {
        let oid = self.inner.close()?;
        let staged = self.inner.take_sink()?;
        self.store.publish(&oid, staged)?;

        Ok(oid)
    }

    pub fn hash(&self) -> ObjectResult<ObjectId> {
        self.inner.hash()
    }
}

impl<S: ObjectStore> Write for StoreWriter<'_, S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<S: ObjectStore> ObjectWrite for StoreWriter<'_, S> {
    fn write_header(&mut self, object_type: ObjectType, size: Option<u64>) -> ObjectResult<()> {
        StoreWriter::write_header(self, object_type, size)
    }

    fn close(&mut self) -> ObjectResult<ObjectId> {
        StoreWriter::close(self)
    }

    fn hash(&self) -> ObjectResult<ObjectId> {
        StoreWriter::hash(self)
    }
}

/// Pick the single full hash starting with `prefix` out of `candidates`.
pub(crate) fn resolve_prefix<I>(prefix: &str, candidates: I) -> ObjectResult<String>
where
    I: IntoIterator<Item = String>,
{
    let mut matches = candidates
        .into_iter()
        .filter(|candidate| candidate.starts_with(prefix))
        .collect::<Vec<_>>();

    match matches.len() {
        0 => {
            trace!(prefix, "no object matches");
            Err(ObjectError::NotFound(prefix.to_string()))
        }
        1 => Ok(matches.remove(0)),
        _ => {
            matches.sort();
            debug!(prefix, candidates = matches.len(), "ambiguous object prefix");
            Err(ObjectError::Ambiguous {
                prefix: prefix.to_string(),
                candidates: matches,
            })
        }
    }
}
