use core_model::SaveFailure;
use core_store::{DEFAULT_CONTENT, DocumentStore, FsStore, MAIN_FILE, StoreError};

#[tokio::test]
async fn create_save_load_delete_cycle() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsStore::new(dir.path());

    let project = store.create("me", "Thesis").await.unwrap();
    assert_eq!(project.owner, "me");
    assert_eq!(project.title, "Thesis");
    assert_eq!(project.path, format!("me/{}/{MAIN_FILE}", project.id));
    assert_eq!(store.load(&project.path).await.unwrap(), DEFAULT_CONTENT);

    store
        .save(&project.id, &project.path, "= Chapter 1\n")
        .await
        .unwrap();
    assert_eq!(store.load(&project.path).await.unwrap(), "= Chapter 1\n");

    store.delete(&project.id, &project.path).await.unwrap();
    assert!(store.list("me").await.unwrap().is_empty());
    assert_eq!(
        store.load(&project.path).await.unwrap(),
        DEFAULT_CONTENT,
        "deleted file loads as default content"
    );
}

#[tokio::test]
async fn missing_file_loads_default_content() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsStore::new(dir.path());
    assert_eq!(
        store.load("someone/nothing/main.typ").await.unwrap(),
        DEFAULT_CONTENT
    );
}

#[tokio::test]
async fn list_returns_owner_projects_only() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsStore::new(dir.path());
    let a = store.create("me", "A").await.unwrap();
    let b = store.create("me", "B").await.unwrap();
    store.create("you", "C").await.unwrap();

    let mine = store.list("me").await.unwrap();
    assert_eq!(mine.len(), 2);
    let ids: Vec<&str> = mine.iter().map(|p| p.id.as_str()).collect();
    assert!(ids.contains(&a.id.as_str()));
    assert!(ids.contains(&b.id.as_str()));
    assert!(mine[0].updated_at >= mine[1].updated_at);
    assert!(store.list("nobody").await.unwrap().is_empty());
}

#[tokio::test]
async fn save_without_metadata_still_writes_file() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsStore::new(dir.path());
    store
        .save("ghost", "me/ghost/main.typ", "text")
        .await
        .unwrap();
    assert_eq!(store.load("me/ghost/main.typ").await.unwrap(), "text");
}

#[tokio::test]
async fn delete_checks_project_identity() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsStore::new(dir.path());
    let project = store.create("me", "A").await.unwrap();

    let err = store.delete("other-id", &project.path).await.unwrap_err();
    assert!(matches!(err, StoreError::InvalidPath(_)));
    let err = store.delete("x", "me/none/main.typ").await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
    assert_eq!(store.list("me").await.unwrap().len(), 1);
}

#[tokio::test]
async fn escaping_paths_become_save_failures() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsStore::new(dir.path());
    let err = store.save("p", "../outside.typ", "x").await.unwrap_err();
    let failure: SaveFailure = err.into();
    assert_eq!(failure.message, "Invalid project path: ../outside.typ");
}
