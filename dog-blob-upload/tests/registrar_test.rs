use std::sync::Arc;

use bytes::Bytes;
use dog_blob_upload::{
    BlobUploadRegistrar, MemoryBlobStore, PublicAccess, RecyclingStreamPool, UploadCollaborators, UploaderLifetime,
};

fn collaborators(store: &MemoryBlobStore) -> UploadCollaborators {
    UploadCollaborators::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(RecyclingStreamPool::default()),
    )
}

#[test]
fn scoped_is_the_default_lifetime() {
    assert_eq!(UploaderLifetime::default(), UploaderLifetime::Scoped);
}

#[test]
fn singleton_resolves_the_same_instance() {
    let store = MemoryBlobStore::new();
    let registered = BlobUploadRegistrar::register(collaborators(&store), UploaderLifetime::Singleton);

    assert_eq!(registered.lifetime(), UploaderLifetime::Singleton);
    assert!(Arc::ptr_eq(&registered.resolve(), &registered.resolve()));
}

#[test]
fn scoped_resolves_a_fresh_instance_per_scope() {
    let store = MemoryBlobStore::new();
    let registered = BlobUploadRegistrar::register(collaborators(&store), UploaderLifetime::Scoped);

    assert_eq!(registered.lifetime(), UploaderLifetime::Scoped);
    assert!(!Arc::ptr_eq(&registered.resolve(), &registered.resolve()));
}

#[tokio::test]
async fn scopes_share_the_same_collaborators() {
    let store = MemoryBlobStore::new();
    let factory = BlobUploadRegistrar::scoped(collaborators(&store));

    let first = factory.create_scope();
    let second = factory.create_scope();

    first
        .upload_text("shared", "one.txt", "one", None, PublicAccess::None, None)
        .await
        .unwrap();
    second
        .upload_text("shared", "two.txt", "two", None, PublicAccess::None, None)
        .await
        .unwrap();

    assert_eq!(store.read("shared", "one.txt").unwrap(), Bytes::from_static(b"one"));
    assert_eq!(store.read("shared", "two.txt").unwrap(), Bytes::from_static(b"two"));
}

#[tokio::test]
async fn singleton_serves_concurrent_callers() {
    let store = MemoryBlobStore::new();
    let uploader = BlobUploadRegistrar::singleton(collaborators(&store));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let uploader = uploader.clone();
            tokio::spawn(async move {
                uploader
                    .upload_and_get_sas_uri("shared", &format!("{}.bin", i), &[i as u8; 4], None, PublicAccess::None, None)
                    .await
            })
        })
        .collect();

    for handle in handles {
        let uri = handle.await.unwrap().unwrap();
        assert!(uri.starts_with("memory://shared/"));
    }
    assert_eq!(store.sas_requests(), 8);
}
