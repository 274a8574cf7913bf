use crate::areas::store::ObjectStore;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::{ObjectError, ObjectResult};
use std::io;
use std::path::{Path, PathBuf};

const PACK_DIR: &str = "objects/pack";

/// Placeholder for objects stored in packfiles.
///
/// Every operation reports [`ObjectError::Unsupported`].
#[derive(Debug, Clone)]
pub struct PackStore {
    path: Box<Path>,
}

impl PackStore {
    pub fn new(git_dir: impl Into<PathBuf>) -> Self {
        PackStore {
            path: git_dir.into().join(PACK_DIR).into_boxed_path(),
        }
    }

    pub fn pack_path(&self) -> &Path {
        &self.path
    }
}

impl ObjectStore for PackStore {
    type Source = io::Empty;
    type Staging = io::Sink;

    fn object(&self, _hash: &str) -> ObjectResult<io::Empty> {
        Err(ObjectError::Unsupported("reading packed objects"))
    }

    fn stage(&self) -> ObjectResult<io::Sink> {
        Err(ObjectError::Unsupported("writing packed objects"))
    }

    fn publish(&self, _oid: &ObjectId, _staged: io::Sink) -> ObjectResult<()> {
        Err(ObjectError::Unsupported("writing packed objects"))
    }
}
