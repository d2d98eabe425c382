mod common;

use pretty_assertions::assert_eq;
use serde_json::json;

use common::TestGraph;
use social_graph::test_utils::user_in_state;
use social_graph::{Address, ElementId, Pagination, RepositoryError, User};

#[test_log::test(tokio::test)]
async fn test_insert_and_get_round_trip() {
    let graph = TestGraph::new();
    let user = user_in_state("@ann", "Ann Lee", "CA");

    let created = graph.users.insert_user(&user).await.unwrap();
    let id = created.id.clone().expect("generated id");
    assert!(uuid::Uuid::parse_str(id.as_str()).is_ok());

    let fetched = graph.users.get_user_by_id(&id).await.unwrap();
    assert_eq!(fetched, created);
    assert_eq!(fetched.address, user.address);
    assert_eq!(fetched.name.as_deref(), Some("Ann Lee"));
}

#[test_log::test(tokio::test)]
async fn test_insert_duplicate_username_is_conflict() {
    let graph = TestGraph::new();
    graph.insert(User::new("@ann", Some("Ann"))).await;

    let result = graph.users.insert_user(&User::new("@ann", Some("Another Ann"))).await;
    match result {
        Err(RepositoryError::Conflict(message)) => {
            assert_eq!(message, "User already exists by username: @ann")
        }
        other => panic!("Expected Conflict, got {:?}", other),
    }

    // usernames are case-sensitive as stored
    assert!(graph.users.insert_user(&User::new("@ANN", None)).await.is_ok());
}

#[test_log::test(tokio::test)]
async fn test_get_missing_user_is_not_found() {
    let graph = TestGraph::new();
    let result = graph.users.get_user_by_id(&ElementId::from("missing")).await;
    match result {
        Err(error @ RepositoryError::NotFound(_)) => {
            assert_eq!(error.to_string(), "User not found by id: missing");
            assert_eq!(error.status_code(), 404);
        }
        other => panic!("Expected NotFound, got {:?}", other),
    }
}

#[test_log::test(tokio::test)]
async fn test_list_users_filters_and_paginates_in_store_order() {
    let graph = TestGraph::new();
    graph.insert(user_in_state("@ann", "Ann Lee", "CA")).await;
    graph.insert(user_in_state("@bob", "Bob Stone", "CA")).await;
    graph.insert(user_in_state("@joanne", "Joanne Ruiz", "ca")).await;
    graph.insert(user_in_state("@hanna", "Hannah Fox", "NY")).await;
    graph.insert(user_in_state("@susann", "SUSANNA Kim", "CA")).await;

    let first = graph
        .users
        .list_users(Some("ann"), Some("CA"), Pagination::new(1, 1))
        .await
        .unwrap();
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].username, "@ann");

    let all = graph
        .users
        .list_users(Some("ann"), Some("CA"), Pagination::new(10, 1))
        .await
        .unwrap();
    let usernames: Vec<&str> = all.iter().map(|u| u.username.as_str()).collect();
    assert_eq!(usernames, vec!["@ann", "@joanne", "@susann"]);

    let third = graph
        .users
        .list_users(Some("ann"), Some("CA"), Pagination::new(1, 3))
        .await
        .unwrap();
    assert_eq!(third[0].username, "@susann");

    let beyond = graph
        .users
        .list_users(Some("ann"), Some("CA"), Pagination::new(1, 4))
        .await;
    match beyond {
        Err(RepositoryError::NotFound(message)) => assert_eq!(message, "Users not found"),
        other => panic!("Expected NotFound, got {:?}", other),
    }
}

#[test_log::test(tokio::test)]
async fn test_list_users_without_filters_and_invalid_pagination() {
    let graph = TestGraph::new();
    assert!(matches!(
        graph.users.list_users(None, None, Pagination::default()).await,
        Err(RepositoryError::NotFound(_))
    ));

    graph.insert(User::new("@ann", None)).await;
    graph.insert(User::new("@bob", None)).await;
    let users = graph.users.list_users(None, None, Pagination::default()).await.unwrap();
    assert_eq!(users.len(), 2);

    assert!(matches!(
        graph.users.list_users(None, None, Pagination::new(0, 1)).await,
        Err(RepositoryError::BadRequest(_))
    ));
}

#[test_log::test(tokio::test)]
async fn test_replace_user_clears_omitted_fields() {
    let graph = TestGraph::new();
    let id = graph.insert(user_in_state("@ann", "Ann Lee", "CA")).await;

    let replacement = User::new("@ann.lee", None);
    let replaced = graph.users.replace_user(&id, &replacement).await.unwrap();
    assert_eq!(replaced.id, Some(id.clone()));
    assert_eq!(replaced.username, "@ann.lee");
    assert_eq!(replaced.name, None);
    assert_eq!(replaced.address, None);

    assert_eq!(graph.users.get_user_by_id(&id).await.unwrap(), replaced);
}

#[test_log::test(tokio::test)]
async fn test_replace_user_errors() {
    let graph = TestGraph::new();
    let ann = graph.insert(User::new("@ann", None)).await;
    graph.insert(User::new("@bob", None)).await;

    assert!(matches!(
        graph.users.replace_user(&ElementId::from("missing"), &User::new("@x", None)).await,
        Err(RepositoryError::NotFound(_))
    ));

    match graph.users.replace_user(&ann, &User::new("@bob", Some("Bob?"))).await {
        Err(RepositoryError::Conflict(message)) => {
            assert_eq!(message, "User already exists by username: @bob")
        }
        other => panic!("Expected Conflict, got {:?}", other),
    }
    // the failed replace left the vertex untouched
    let ann_user = graph.users.get_user_by_id(&ann).await.unwrap();
    assert_eq!(ann_user.username, "@ann");

    // keeping one's own username is not a conflict
    assert!(graph.users.replace_user(&ann, &User::new("@ann", Some("Ann"))).await.is_ok());
}

#[test_log::test(tokio::test)]
async fn test_patch_null_clears_only_that_property() {
    let graph = TestGraph::new();
    let id = graph.insert(user_in_state("@ann", "Ann Lee", "CA")).await;
    let before = graph.users.get_user_by_id(&id).await.unwrap();

    let patch = json!({"name": null});
    let patched = graph.users.patch_user(&id, patch.as_object().unwrap()).await.unwrap();

    assert_eq!(patched.name, None);
    assert_eq!(patched.username, before.username);
    assert_eq!(patched.address, before.address);
}

#[test_log::test(tokio::test)]
async fn test_patch_merges_nested_fields() {
    let graph = TestGraph::new();
    let id = graph.insert(user_in_state("@ann", "Ann Lee", "CA")).await;

    let patch = json!({"address": {"city": "Austin", "state": "TX"}, "name": "Ann L."});
    let patched = graph.users.patch_user(&id, patch.as_object().unwrap()).await.unwrap();

    let address = patched.address.expect("address kept");
    assert_eq!(address.city.as_deref(), Some("Austin"));
    assert_eq!(address.state.as_deref(), Some("TX"));
    assert_eq!(address.address_line.as_deref(), Some("100 Market St"));
    assert_eq!(patched.name.as_deref(), Some("Ann L."));
}

#[test_log::test(tokio::test)]
async fn test_patch_null_nested_record_clears_every_subfield() {
    let graph = TestGraph::new();
    let id = graph.insert(user_in_state("@ann", "Ann Lee", "CA")).await;

    let patch = json!({"address": null});
    let patched = graph.users.patch_user(&id, patch.as_object().unwrap()).await.unwrap();
    assert_eq!(patched.address, None);
    assert_eq!(patched.name.as_deref(), Some("Ann Lee"));

    let filtered = graph.users.list_users(None, Some("CA"), Pagination::default()).await;
    assert!(matches!(filtered, Err(RepositoryError::NotFound(_))));
}

#[test_log::test(tokio::test)]
async fn test_patch_errors() {
    let graph = TestGraph::new();
    let ann = graph.insert(User::new("@ann", None)).await;
    graph.insert(User::new("@bob", None)).await;

    let empty = serde_json::Map::new();
    match graph.users.patch_user(&ann, &empty).await {
        Err(error @ RepositoryError::BadRequest(_)) => assert_eq!(error.status_code(), 400),
        other => panic!("Expected BadRequest, got {:?}", other),
    }

    let missing = json!({"name": "x"});
    assert!(matches!(
        graph.users.patch_user(&ElementId::from("missing"), missing.as_object().unwrap()).await,
        Err(RepositoryError::NotFound(_))
    ));

    let clear_username = json!({"username": null});
    assert!(matches!(
        graph.users.patch_user(&ann, clear_username.as_object().unwrap()).await,
        Err(RepositoryError::BadRequest(_))
    ));

    let partition = json!({"_partition": "other"});
    assert!(matches!(
        graph.users.patch_user(&ann, partition.as_object().unwrap()).await,
        Err(RepositoryError::BadRequest(_))
    ));

    let taken = json!({"username": "@bob"});
    assert!(matches!(
        graph.users.patch_user(&ann, taken.as_object().unwrap()).await,
        Err(RepositoryError::Conflict(_))
    ));
}

#[test_log::test(tokio::test)]
async fn test_delete_user() {
    let graph = TestGraph::new();
    let id = graph.insert(User::new("@ann", None).with_address(Address::default())).await;

    graph.users.delete_user(&id).await.unwrap();
    assert!(matches!(graph.users.get_user_by_id(&id).await, Err(RepositoryError::NotFound(_))));
    assert!(matches!(graph.users.delete_user(&id).await, Err(RepositoryError::NotFound(_))));
}
