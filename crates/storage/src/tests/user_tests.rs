use super::{create_test_storage, create_test_user};
use crate::traits::UserStore;
use crate::StorageError;

#[tokio::test]
async fn create_and_find_user_round_trips() {
    let (storage, _temp_dir) = create_test_storage();
    let user = create_test_user(1);

    storage.create_user(&user).await.unwrap();

    let found = storage.find_user(1).await.unwrap().unwrap();
    assert_eq!(found, user);
}

#[tokio::test]
async fn metric_value_order_survives_persistence() {
    let (storage, _temp_dir) = create_test_storage();
    storage.create_user(&create_test_user(1)).await.unwrap();

    let found = storage.find_user(1).await.unwrap().unwrap();
    let labels: Vec<&str> =
        found.metrics[0].values.iter().map(|v| v.label.as_str()).collect();
    assert_eq!(labels, ["Great", "Neutral", "Awful"]);
}

#[tokio::test]
async fn find_user_returns_none_for_unknown_id() {
    let (storage, _temp_dir) = create_test_storage();
    assert!(storage.find_user(404).await.unwrap().is_none());
}

#[tokio::test]
async fn update_user_replaces_the_whole_document() {
    let (storage, _temp_dir) = create_test_storage();
    let mut user = create_test_user(1);
    storage.create_user(&user).await.unwrap();

    user.metrics.truncate(1);
    user.metrics[0].baseline = None;
    storage.update_user(&user).await.unwrap();

    let found = storage.find_user(1).await.unwrap().unwrap();
    assert_eq!(found.metrics.len(), 1);
    assert_eq!(found.metrics[0].baseline, None);
}

#[tokio::test]
async fn update_unknown_user_is_not_found() {
    let (storage, _temp_dir) = create_test_storage();
    let user = create_test_user(9);
    let err = storage.update_user(&user).await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound { entity: "user", id: 9 }));
}

#[tokio::test]
async fn find_all_users_lists_everyone() {
    let (storage, _temp_dir) = create_test_storage();
    storage.create_user(&create_test_user(2)).await.unwrap();
    storage.create_user(&create_test_user(1)).await.unwrap();

    let users = storage.find_all_users().await.unwrap();
    let ids: Vec<i64> = users.iter().map(|u| u.user_id).collect();
    assert_eq!(ids, [1, 2]);
}
