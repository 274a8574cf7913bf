use crate::areas::repository::{create_layout, locate};
use crate::areas::store::{ObjectStore, resolve_prefix};
use crate::artifacts::objects::OBJECT_ID_LENGTH;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::{ObjectError, ObjectResult};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tempfile::{NamedTempFile, TempDir};
use tracing::{debug, trace};

const OBJECTS_DIR: &str = "objects";
const TEMP_PREFIX: &str = "tmp-obj-";

/// Loose object store under `<git dir>/objects`.
///
/// Objects are staged in a temporary file inside the objects directory and
/// moved into `objects/<2 hex>/<38 hex>` on publish, so a reader never sees a
/// partially written object.
#[derive(Debug, Clone)]
pub struct DiskStore {
    path: Box<Path>,
    publish_lock: Arc<Mutex<()>>,
}

impl DiskStore {
    pub fn new(git_dir: impl Into<PathBuf>) -> Self {
        DiskStore {
            path: git_dir.into().into_boxed_path(),
            publish_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Store of the repository enclosing `start`.
    pub fn open(start: &Path) -> ObjectResult<Self> {
        Ok(Self::new(locate(start)?))
    }

    /// Store backed by a fresh bare repository in a temporary directory, which
    /// is removed when the returned guard is dropped.
    pub fn temporary() -> ObjectResult<(TempDir, Self)> {
        let dir = tempfile::Builder::new().prefix("odb-").tempdir()?;
        create_layout(dir.path(), true)?;
        let store = Self::new(dir.path());

        Ok((dir, store))
    }

    /// The git directory this store belongs to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn objects_path(&self) -> PathBuf {
        self.path.join(OBJECTS_DIR)
    }

    fn object_path(&self, oid: &ObjectId) -> PathBuf {
        self.objects_path().join(oid.to_path())
    }

    /// Full hashes stored in the bucket named by the first two characters of
    /// `prefix`.
    fn bucket_candidates(&self, prefix: &str) -> ObjectResult<Vec<String>> {
        let (bucket, _) = prefix.split_at(2);
        let bucket_path = self.objects_path().join(bucket);

        let entries = match fs::read_dir(&bucket_path) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut candidates = Vec::new();
        for entry in entries {
            let entry = entry?;
            let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                continue;
            };
            // skips staging leftovers and foreign files
            if name.len() == OBJECT_ID_LENGTH - 2 && name.bytes().all(|b| b.is_ascii_hexdigit()) {
                candidates.push(format!("{bucket}{name}"));
            }
        }

        Ok(candidates)
    }
}

impl ObjectStore for DiskStore {
    type Source = File;
    type Staging = NamedTempFile;

    fn object(&self, hash: &str) -> ObjectResult<File> {
        let prefix = ObjectId::check_prefix(hash)?;

        if prefix.len() == OBJECT_ID_LENGTH {
            let oid = ObjectId::try_parse(prefix.as_str())?;
            match File::open(self.object_path(&oid)) {
                Ok(file) => return Ok(file),
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => return Err(err.into()),
            }
        }

        let full = resolve_prefix(&prefix, self.bucket_candidates(&prefix)?)?;
        trace!(%prefix, oid = %full, "object resolved");

        let oid = ObjectId::try_parse(full)?;
        match File::open(self.object_path(&oid)) {
            Ok(file) => Ok(file),
            // removed between listing and opening
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                Err(ObjectError::NotFound(prefix))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn stage(&self) -> ObjectResult<NamedTempFile> {
        let objects_path = self.objects_path();
        fs::create_dir_all(&objects_path)?;

        let staged = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .tempfile_in(&objects_path)?;
        trace!(path = %staged.path().display(), "object staged");

        Ok(staged)
    }

    fn publish(&self, oid: &ObjectId, staged: NamedTempFile) -> ObjectResult<()> {
        let _guard = self
            .publish_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let object_path = self.object_path(oid);
        if object_path.exists() {
            debug!(%oid, "object already stored");
            return Ok(());
        }

        if let Some(bucket) = object_path.parent() {
            fs::create_dir_all(bucket)?;
        }
        staged.as_file().sync_all()?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(staged.path(), fs::Permissions::from_mode(0o444))?;
        }

        match staged.persist_noclobber(&object_path) {
            Ok(_) => {
                debug!(%oid, "object published");
                Ok(())
            }
            // another process got there first with the same content
            Err(err) if err.error.kind() == io::ErrorKind::AlreadyExists => {
                debug!(%oid, "object already stored");
                Ok(())
            }
            Err(err) => Err(err.error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::objects::object_type::ObjectType;
    use crate::artifacts::objects::reader::ReaderOptions;
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};
    use std::io::{Read, Write};

    const HELLO: &str = "8c01d89ae06311834ee4b1fab2f0414d35f01102";

    #[fixture]
    fn store() -> (TempDir, DiskStore) {
        DiskStore::temporary().unwrap()
    }

    fn put(store: &DiskStore, object_type: ObjectType, data: &[u8]) -> ObjectId {
        let mut writer = store.writer().unwrap();
        writer
            .write_header(object_type, Some(data.len() as u64))
            .unwrap();
        writer.write_all(data).unwrap();
        writer.close().unwrap()
    }

    fn read_all(store: &DiskStore, hash: &str) -> Vec<u8> {
        let mut reader = store.reader(hash, ReaderOptions::default()).unwrap();
        let mut payload = Vec::new();
        reader.read_to_end(&mut payload).unwrap();
        payload
    }

    #[rstest]
    fn published_object_lands_in_its_bucket(store: (TempDir, DiskStore)) {
        let (_dir, store) = store;
        let oid = put(&store, ObjectType::Blob, b"hello, world");

        assert_eq!(oid.as_ref(), HELLO);
        let path = store
            .objects_path()
            .join("8c")
            .join("01d89ae06311834ee4b1fab2f0414d35f01102");
        assert!(path.is_file());
        assert_eq!(read_all(&store, HELLO), b"hello, world");
    }

    #[cfg(unix)]
    #[rstest]
    fn published_objects_are_read_only(store: (TempDir, DiskStore)) {
        use std::os::unix::fs::PermissionsExt;

        let (_dir, store) = store;
        let oid = put(&store, ObjectType::Blob, b"hello, world");
        let mode = fs::metadata(store.object_path(&oid))
            .unwrap()
            .permissions()
            .mode();

        assert_eq!(mode & 0o777, 0o444);
    }

    #[rstest]
    fn abbreviated_hashes_resolve(store: (TempDir, DiskStore)) {
        let (_dir, store) = store;
        put(&store, ObjectType::Blob, b"hello, world");

        assert_eq!(read_all(&store, "8c01d8"), b"hello, world");
        assert_eq!(read_all(&store, "8C01D8"), b"hello, world");
    }

    #[rstest]
    fn shared_prefix_is_ambiguous(store: (TempDir, DiskStore)) {
        let (_dir, store) = store;
        put(&store, ObjectType::Blob, b"object 5");
        put(&store, ObjectType::Blob, b"object 11");

        let Err(ObjectError::Ambiguous { prefix, candidates }) = store.object("44c") else {
            panic!("expected an ambiguous prefix");
        };
        assert_eq!(prefix, "44c");
        assert_eq!(
            candidates,
            vec![
                "44c5e21b93fce2c19f9c83c14a06d45d8e407996".to_string(),
                "44c9d328fe85cc760b7cb18253029cf21f71a56f".to_string(),
            ]
        );

        assert_eq!(read_all(&store, "44c9"), b"object 5");
        assert_eq!(read_all(&store, "44c5"), b"object 11");
    }

    #[rstest]
    #[case::absent_bucket("ffff")]
    #[case::absent_full_hash("8c01d89ae06311834ee4b1fab2f0414d35f01103")]
    fn unknown_hashes_are_not_found(store: (TempDir, DiskStore), #[case] hash: &str) {
        let (_dir, store) = store;
        put(&store, ObjectType::Blob, b"hello, world");

        assert!(matches!(store.object(hash), Err(ObjectError::NotFound(_))));
    }

    #[rstest]
    #[case("8")]
    #[case("zz")]
    #[case("8c01d89ae06311834ee4b1fab2f0414d35f0110200")]
    fn unusable_hashes_are_rejected(store: (TempDir, DiskStore), #[case] hash: &str) {
        let (_dir, store) = store;

        assert!(matches!(
            store.object(hash),
            Err(ObjectError::InvalidHash(_))
        ));
    }

    #[rstest]
    fn publishing_twice_keeps_one_binding(store: (TempDir, DiskStore)) {
        let (_dir, store) = store;
        let first = put(&store, ObjectType::Blob, b"hello, world");
        let second = put(&store, ObjectType::Blob, b"hello, world");

        assert_eq!(first, second);
        let bucket = store.objects_path().join("8c");
        assert_eq!(fs::read_dir(bucket).unwrap().count(), 1);
    }

    #[rstest]
    fn staging_leftovers_are_cleaned_up(store: (TempDir, DiskStore)) {
        let (_dir, store) = store;
        put(&store, ObjectType::Blob, b"hello, world");
        put(&store, ObjectType::Blob, b"hello, world");

        let leftovers = fs::read_dir(store.objects_path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_name().to_string_lossy().starts_with(TEMP_PREFIX))
            .count();
        assert_eq!(leftovers, 0);
    }

    #[rstest]
    fn abandoned_writer_publishes_nothing(store: (TempDir, DiskStore)) {
        let (_dir, store) = store;
        {
            let mut writer = store.writer().unwrap();
            writer.write_header(ObjectType::Blob, Some(12)).unwrap();
            writer.write_all(b"hello").unwrap();
        }

        assert!(matches!(store.object(HELLO), Err(ObjectError::NotFound(_))));
    }

    #[rstest]
    fn concurrent_writers_agree(store: (TempDir, DiskStore)) {
        let (_dir, store) = store;

        let oids = std::thread::scope(|scope| {
            let handles = (0..8)
                .map(|_| scope.spawn(|| put(&store, ObjectType::Blob, b"hello, world")))
                .collect::<Vec<_>>();
            handles
                .into_iter()
                .map(|handle| handle.join().unwrap())
                .collect::<Vec<_>>()
        });

        assert!(oids.iter().all(|oid| oid.as_ref() == HELLO));
        assert_eq!(read_all(&store, HELLO), b"hello, world");
    }

    #[test]
    fn open_finds_the_enclosing_repository() {
        let dir = tempfile::tempdir().unwrap();
        create_layout(&dir.path().join(".git"), false).unwrap();

        let store = DiskStore::open(dir.path()).unwrap();
        assert_eq!(
            store.objects_path(),
            dir.path().canonicalize().unwrap().join(".git").join("objects")
        );
    }
}
