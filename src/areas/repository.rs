use crate::areas::database::DiskStore;
use crate::errors::{ObjectError, ObjectResult};
use std::cell::{RefCell, RefMut};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DOT_GIT: &str = ".git";
pub const GIT_DIR_ENV: &str = "GIT_DIR";

const DEFAULT_BRANCH: &str = "master";
const LAYOUT_DIRS: [&str; 7] = [
    "branches",
    "hooks",
    "info",
    "objects/info",
    "objects/pack",
    "refs/heads",
    "refs/tags",
];
const DESCRIPTION: &str =
    "Unnamed repository; edit this file 'description' to name the repository.\n";

pub struct Repository {
    path: Box<Path>,
    writer: RefCell<Box<dyn Write>>,
    database: DiskStore,
}

impl Repository {
    /// Open the repository enclosing `start`.
    ///
    /// # Arguments
    ///
    /// * `start` - Directory discovery starts from
    /// * `writer` - Destination of command output
    ///
    /// # Returns
    ///
    /// The repository, or `NotARepository` when neither `GIT_DIR` nor any
    /// ancestor of `start` names a git directory. `GIT_DIR`, when set, skips
    /// discovery but must still point at a repository layout.
    pub fn open(start: &Path, writer: Box<dyn Write>) -> anyhow::Result<Self> {
        let git_dir = match std::env::var_os(GIT_DIR_ENV) {
            Some(git_dir) => {
                debug!(git_dir = ?git_dir, "repository taken from {GIT_DIR_ENV}");
                check_git_dir(PathBuf::from(git_dir))?
            }
            None => locate(start)?,
        };

        Ok(Self::at(git_dir, writer))
    }

    /// Repository rooted at an already known git directory.
    pub fn at(git_dir: impl Into<PathBuf>, writer: Box<dyn Write>) -> Self {
        let path = git_dir.into().into_boxed_path();
        let database = DiskStore::new(path.to_path_buf());

        Repository {
            path,
            writer: RefCell::new(writer),
            database,
        }
    }

    /// The git directory (`.git`, or the repository itself when bare).
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn writer(&'_ self) -> RefMut<'_, Box<dyn Write>> {
        self.writer.borrow_mut()
    }

    pub fn database(&self) -> &DiskStore {
        &self.database
    }
}

/// Walk upward from `start` to the nearest git directory.
///
/// A directory qualifies when it has a `.git` subdirectory, or when it is a
/// bare repository itself (`config`, `HEAD` and `objects` side by side).
pub fn locate(start: &Path) -> ObjectResult<PathBuf> {
    let start = start
        .canonicalize()
        .map_err(|_| ObjectError::NotARepository(start.to_path_buf()))?;

    for dir in start.ancestors() {
        let dot_git = dir.join(DOT_GIT);
        if dot_git.is_dir() {
            debug!(git_dir = %dot_git.display(), "repository located");
            return Ok(dot_git);
        }
        if is_bare(dir) {
            debug!(git_dir = %dir.display(), "bare repository located");
            return Ok(dir.to_path_buf());
        }
    }

    Err(ObjectError::NotARepository(start))
}

/// Accept an explicitly named git directory only if it has the layout
/// discovery would recognize.
pub fn check_git_dir(git_dir: PathBuf) -> ObjectResult<PathBuf> {
    if is_bare(&git_dir) {
        Ok(git_dir)
    } else {
        Err(ObjectError::NotARepository(git_dir))
    }
}

fn is_bare(dir: &Path) -> bool {
    dir.join("config").is_file() && dir.join("HEAD").is_file() && dir.join("objects").is_dir()
}

/// Lay out an empty repository in `git_dir`, which must be missing or empty.
pub fn create_layout(git_dir: &Path, bare: bool) -> ObjectResult<()> {
    fs::create_dir_all(git_dir)?;
    if fs::read_dir(git_dir)?.next().is_some() {
        return Err(ObjectError::DirectoryNotEmpty(git_dir.to_path_buf()));
    }

    for dir in LAYOUT_DIRS {
        fs::create_dir_all(git_dir.join(dir))?;
    }

    fs::write(git_dir.join("info").join("exclude"), b"")?;
    fs::write(
        git_dir.join("HEAD"),
        format!("ref: refs/heads/{DEFAULT_BRANCH}\n"),
    )?;
    fs::write(
        git_dir.join("config"),
        format!(
            "[core]\n\trepositoryformatversion = 0\n\tfilemode = true\n\tbare = {bare}\n"
        ),
    )?;
    fs::write(git_dir.join("description"), DESCRIPTION)?;

    debug!(git_dir = %git_dir.display(), bare, "repository layout created");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case::bare(true)]
    #[case::non_bare(false)]
    fn layout_has_the_standard_entries(#[case] bare: bool) {
        let dir = tempfile::tempdir().unwrap();
        let git_dir = dir.path().join("repo.git");
        create_layout(&git_dir, bare).unwrap();

        for entry in LAYOUT_DIRS {
            assert!(git_dir.join(entry).is_dir(), "{entry} is missing");
        }
        assert_eq!(
            fs::read_to_string(git_dir.join("HEAD")).unwrap(),
            "ref: refs/heads/master\n"
        );
        assert!(
            fs::read_to_string(git_dir.join("config"))
                .unwrap()
                .contains(&format!("bare = {bare}"))
        );
        assert!(git_dir.join("info").join("exclude").is_file());
        assert!(git_dir.join("description").is_file());
    }

    #[test]
    fn layout_refuses_a_non_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("stray"), b"x").unwrap();

        assert!(matches!(
            create_layout(dir.path(), true),
            Err(ObjectError::DirectoryNotEmpty(_))
        ));
    }

    #[test]
    fn locate_walks_up_to_dot_git() {
        let dir = tempfile::tempdir().unwrap();
        create_layout(&dir.path().join(DOT_GIT), false).unwrap();
        let nested = dir.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();

        let found = locate(&nested).unwrap();
        assert_eq!(found, dir.path().canonicalize().unwrap().join(DOT_GIT));
    }

    #[test]
    fn locate_recognizes_bare_repositories() {
        let dir = tempfile::tempdir().unwrap();
        create_layout(dir.path(), true).unwrap();

        let found = locate(&dir.path().join("refs").join("heads")).unwrap();
        assert_eq!(found, dir.path().canonicalize().unwrap());
    }

    #[test]
    fn locate_fails_outside_a_repository() {
        let dir = tempfile::tempdir().unwrap();

        assert!(matches!(
            locate(dir.path()),
            Err(ObjectError::NotARepository(_))
        ));
    }

    #[test]
    fn locate_reports_a_missing_start_as_not_a_repository() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nowhere");

        assert!(matches!(
            locate(&missing),
            Err(ObjectError::NotARepository(path)) if path == missing
        ));
    }

    #[test]
    fn explicit_git_dir_needs_a_repository_layout() {
        let dir = tempfile::tempdir().unwrap();
        let git_dir = dir.path().join(DOT_GIT);

        assert!(matches!(
            check_git_dir(git_dir.clone()),
            Err(ObjectError::NotARepository(_))
        ));
        fs::create_dir(&git_dir).unwrap();
        assert!(matches!(
            check_git_dir(git_dir.clone()),
            Err(ObjectError::NotARepository(_))
        ));

        fs::remove_dir(&git_dir).unwrap();
        create_layout(&git_dir, false).unwrap();
        assert_eq!(check_git_dir(git_dir.clone()).unwrap(), git_dir);
    }
}
