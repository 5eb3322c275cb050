use bank_core::csv_codec::CONTENT_TYPE;
use bank_core::object_store::{LocalFsObjectStore, ObjectStore};
use bank_core::StoreError;

#[tokio::test]
async fn put_then_get_returns_written_bytes() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let store = LocalFsObjectStore::new(dir.path());

    store
        .put_object(
            "bank_data/customer_data/2026-02-14/customers.csv",
            b"Customer_ID\nCUST-0001\n",
            CONTENT_TYPE,
        )
        .await
        .expect("put should succeed");

    let body = store
        .get_object("bank_data/customer_data/2026-02-14/customers.csv")
        .await
        .expect("get should succeed");
    assert_eq!(body, b"Customer_ID\nCUST-0001\n");
}

#[tokio::test]
async fn same_key_is_overwritten_without_leftover_temp_files() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let store = LocalFsObjectStore::new(dir.path());
    let key = "bank_data/accounts_data/2026-02-14/accounts.csv";

    store.put_object(key, b"first", CONTENT_TYPE).await.expect("put");
    store.put_object(key, b"second", CONTENT_TYPE).await.expect("put");

    assert_eq!(store.get_object(key).await.expect("get"), b"second");
    assert_eq!(
        store.list_objects("bank_data/").await.expect("list"),
        vec![key.to_string()]
    );
}

#[tokio::test]
async fn list_is_sorted_and_filtered_by_prefix() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let store = LocalFsObjectStore::new(dir.path());

    for key in [
        "warehouse/Raw_Dataset/accounts/part-00001.parquet",
        "warehouse/Raw_Dataset/accounts/part-00000.parquet",
        "warehouse/Raw_Dataset/customer/part-00000.parquet",
    ] {
        store.put_object(key, b"PAR1", "application/octet-stream").await.expect("put");
    }

    let keys = store
        .list_objects("warehouse/Raw_Dataset/accounts/")
        .await
        .expect("list");
    assert_eq!(
        keys,
        vec![
            "warehouse/Raw_Dataset/accounts/part-00000.parquet".to_string(),
            "warehouse/Raw_Dataset/accounts/part-00001.parquet".to_string(),
        ]
    );
}

#[tokio::test]
async fn missing_object_and_missing_root_behave() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let store = LocalFsObjectStore::new(dir.path().join("not-created-yet"));

    assert!(store.list_objects("").await.expect("list").is_empty());
    let error = store.get_object("a/b.csv").await.expect_err("missing should fail");
    assert!(matches!(error, StoreError::NotFound { .. }));
    store.delete_object("a/b.csv").await.expect("delete of missing is a no-op");
}
