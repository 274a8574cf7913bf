use crate::areas::repository::{DOT_GIT, Repository, create_layout};
use anyhow::Context;
use std::io::Write;
use std::path::Path;

impl Repository {
    /// Create an empty repository at `root`, in a `.git` subdirectory unless
    /// `bare` is set.
    pub fn init(root: &Path, bare: bool, writer: Box<dyn Write>) -> anyhow::Result<Self> {
        let git_dir = if bare {
            root.to_path_buf()
        } else {
            root.join(DOT_GIT)
        };

        create_layout(&git_dir, bare)
            .with_context(|| format!("Failed to initialize {}", git_dir.display()))?;
        let git_dir = git_dir
            .canonicalize()
            .context("Failed to resolve repository path")?;

        let repository = Repository::at(git_dir, writer);
        writeln!(
            repository.writer(),
            "Initialized empty Git repository in {}",
            repository.path().display()
        )?;

        Ok(repository)
    }
}
