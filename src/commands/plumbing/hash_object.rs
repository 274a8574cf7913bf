use crate::areas::repository::Repository;
use crate::areas::store::ObjectStore;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::writer::{ObjectWrite, ObjectWriter};
use anyhow::Context;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

/// Content to hash, with its length when it is known up front.
pub struct HashInput {
    source: Box<dyn Read>,
    size: Option<u64>,
}

impl HashInput {
    pub fn file(path: &Path) -> anyhow::Result<Self> {
        let file =
            File::open(path).with_context(|| format!("Unable to open {}", path.display()))?;
        let size = file
            .metadata()
            .with_context(|| format!("Unable to stat {}", path.display()))?
            .len();

        Ok(HashInput {
            source: Box::new(file),
            size: Some(size),
        })
    }

    /// Standard input, whose length is only known once it is drained.
    pub fn stdin() -> Self {
        HashInput {
            source: Box::new(io::stdin()),
            size: None,
        }
    }

    /// Any other reader, e.g. content already held in memory.
    pub fn reader(source: impl Read + 'static, size: Option<u64>) -> Self {
        HashInput {
            source: Box::new(source),
            size,
        }
    }
}

impl Repository {
    pub fn hash_object(
        &self,
        mut input: HashInput,
        object_type: ObjectType,
        write: bool,
    ) -> anyhow::Result<()> {
        let database = self.database();
        let mut writer: Box<dyn ObjectWrite + '_> = if write {
            Box::new(database.writer().context("Unable to stage object")?)
        } else {
            Box::new(ObjectWriter::new(io::sink()))
        };

        writer.write_header(object_type, input.size)?;
        io::copy(&mut input.source, &mut writer).context("Unable to hash object content")?;
        let object_id = writer.close().context("Unable to finish object")?;

        writeln!(self.writer(), "{object_id}")?;

        Ok(())
    }
}
