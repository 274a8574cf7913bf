use crate::areas::store::{ObjectStore, resolve_prefix};
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::{ObjectError, ObjectResult};
use bytes::Bytes;
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

/// Object store kept entirely in memory.
///
/// Compressed objects live in a map behind a `RwLock`; clones share the same
/// map. Entries are never replaced once present, so a poisoned lock still
/// guards consistent data and is recovered instead of propagated.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    objects: Arc<RwLock<HashMap<String, Bytes>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.read_map().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_map().is_empty()
    }

    pub fn contains(&self, oid: &ObjectId) -> bool {
        self.read_map().contains_key::<str>(oid.as_ref())
    }

    /// Sorted hashes of every stored object.
    pub fn ids(&self) -> Vec<String> {
        let mut ids = self.read_map().keys().cloned().collect::<Vec<_>>();
        ids.sort();
        ids
    }

    fn read_map(&self) -> RwLockReadGuard<'_, HashMap<String, Bytes>> {
        self.objects.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_map(&self) -> RwLockWriteGuard<'_, HashMap<String, Bytes>> {
        self.objects.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ObjectStore for MemoryStore {
    type Source = Cursor<Bytes>;
    type Staging = Vec<u8>;

    fn object(&self, hash: &str) -> ObjectResult<Cursor<Bytes>> {
        let prefix = ObjectId::check_prefix(hash)?;
        let map = self.read_map();

        if let Some(bytes) = map.get(&prefix) {
            return Ok(Cursor::new(bytes.clone()));
        }

        let full = resolve_prefix(&prefix, map.keys().cloned())?;
        map.get(&full)
            .map(|bytes| Cursor::new(bytes.clone()))
            .ok_or(ObjectError::NotFound(prefix))
    }

    fn stage(&self) -> ObjectResult<Vec<u8>> {
        Ok(Vec::new())
    }

    fn publish(&self, oid: &ObjectId, staged: Vec<u8>) -> ObjectResult<()> {
        let mut map = self.write_map();
        let mut inserted = false;
        map.entry(oid.to_string()).or_insert_with(|| {
            inserted = true;
            Bytes::from(staged)
        });

        debug!(%oid, inserted, "object published in memory");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::objects::object_type::ObjectType;
    use crate::artifacts::objects::reader::ReaderOptions;
    use pretty_assertions::assert_eq;
    use std::io::{Read, Write};

    const HELLO: &str = "8c01d89ae06311834ee4b1fab2f0414d35f01102";
    const HELLO_TREE: &str = "da192267bbf8163c9762634196c8e5e1d70b684d";

    fn put(
        store: &MemoryStore,
        object_type: ObjectType,
        size: Option<u64>,
        data: &[u8],
    ) -> ObjectId {
        let mut writer = store.writer().unwrap();
        writer.write_header(object_type, size).unwrap();
        writer.write_all(data).unwrap();
        writer.close().unwrap()
    }

    fn read_to_string(store: &MemoryStore, hash: &str, options: ReaderOptions) -> String {
        let mut reader = store.reader(hash, options).unwrap();
        let mut out = String::new();
        reader.read_to_string(&mut out).unwrap();
        out
    }

    #[test]
    fn blob_and_tree_round_trip() {
        let store = MemoryStore::new();
        let blob = put(&store, ObjectType::Blob, Some(12), b"hello, world");
        assert_eq!(blob.as_ref(), HELLO);

        let line = format!("100644 blob {HELLO}\thello.txt\n");
        let tree = put(&store, ObjectType::Tree, None, line.as_bytes());
        assert_eq!(tree.as_ref(), HELLO_TREE);

        let reader = store.reader(HELLO_TREE, ReaderOptions::default()).unwrap();
        assert_eq!(reader.object_type(), ObjectType::Tree);
        assert_eq!(reader.len(), 37);

        assert_eq!(
            read_to_string(&store, HELLO_TREE, ReaderOptions::pretty()),
            line
        );
        assert_eq!(
            read_to_string(&store, "8c01", ReaderOptions::default()),
            "hello, world"
        );
    }

    #[test]
    fn unknown_length_is_measured() {
        let store = MemoryStore::new();
        let oid = put(&store, ObjectType::Blob, None, b"hello, world");
        assert_eq!(oid.as_ref(), HELLO);

        let reader = store.reader(HELLO, ReaderOptions::default()).unwrap();
        assert_eq!(reader.len(), 12);
    }

    #[test]
    fn shared_prefix_is_ambiguous() {
        let store = MemoryStore::new();
        put(&store, ObjectType::Blob, Some(8), b"object 5");
        put(&store, ObjectType::Blob, Some(9), b"object 11");

        assert!(matches!(
            store.object("44c"),
            Err(ObjectError::Ambiguous { candidates, .. }) if candidates.len() == 2
        ));
        assert_eq!(
            read_to_string(&store, "44c9", ReaderOptions::default()),
            "object 5"
        );
        assert_eq!(
            read_to_string(&store, "44c5", ReaderOptions::default()),
            "object 11"
        );
        assert!(matches!(store.object("44d"), Err(ObjectError::NotFound(_))));
    }

    #[test]
    fn republishing_keeps_the_first_bytes() {
        let store = MemoryStore::new();
        let oid = put(&store, ObjectType::Blob, Some(12), b"hello, world");
        let before = store.object(HELLO).unwrap().into_inner();

        store.publish(&oid, b"not the same bytes".to_vec()).unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.object(HELLO).unwrap().into_inner(), before);
    }

    #[test]
    fn clones_share_objects() {
        let store = MemoryStore::new();
        let other = store.clone();
        let oid = put(&other, ObjectType::Blob, Some(12), b"hello, world");

        assert!(store.contains(&oid));
        assert_eq!(store.ids(), vec![HELLO.to_string()]);
    }

    #[test]
    fn concurrent_writers_and_readers() {
        let store = MemoryStore::new();

        std::thread::scope(|scope| {
            for i in 0..16 {
                let store = &store;
                scope.spawn(move || {
                    let data = format!("object {}", i % 4);
                    let oid = put(store, ObjectType::Blob, None, data.as_bytes());
                    assert_eq!(
                        read_to_string(store, oid.as_ref(), ReaderOptions::default()),
                        data
                    );
                });
            }
        });

        assert_eq!(store.len(), 4);
    }
}
