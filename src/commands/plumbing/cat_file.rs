use crate::areas::repository::Repository;
use crate::areas::store::ObjectStore;
use crate::artifacts::objects::reader::ReaderOptions;
use anyhow::Context;
use std::io::{self, Write};

/// What `cat-file` reports, printed in field order.
#[derive(Debug, Clone, Copy, Default)]
pub struct CatFileOptions {
    pub show_type: bool,
    pub show_size: bool,
    pub pretty_print: bool,
}

impl CatFileOptions {
    fn is_empty(&self) -> bool {
        !(self.show_type || self.show_size || self.pretty_print)
    }
}

impl Repository {
    pub fn cat_file(&self, hash: &str, options: CatFileOptions) -> anyhow::Result<()> {
        if options.is_empty() {
            anyhow::bail!("one of -t, -s or -p is required");
        }

        let reader_options = ReaderOptions {
            pretty_tree: options.pretty_print,
        };
        let mut reader = self
            .database()
            .reader(hash, reader_options)
            .with_context(|| format!("Unable to read object {hash}"))?;

        let mut writer = self.writer();
        if options.show_type {
            writeln!(writer, "{}", reader.object_type())?;
        }
        if options.show_size {
            writeln!(writer, "{}", reader.len())?;
        }
        if options.pretty_print {
            io::copy(&mut reader, &mut *writer)
                .with_context(|| format!("Unable to print object {hash}"))?;
        }
        writer.flush()?;

        Ok(())
    }
}
