mod common;

use common::{client, register};
use pinnwand_common::model::Id;
use pinnwand_db::{DbError, ErrorKind};

#[tokio::test]
async fn follow_is_guarded_by_the_pair_key() {
    let client = client().await;
    let ada = register(&client, "ada").await;
    let bob = register(&client, "bob").await;

    client.follow(ada, bob).await.unwrap();
    assert!(client.is_following(ada, bob).await.unwrap());
    assert!(!client.is_following(bob, ada).await.unwrap());

    let err = client.follow(ada, bob).await.unwrap_err();
    assert!(matches!(err, DbError::AlreadyFollowing(id) if id == bob));
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn unfollow_twice_is_not_found() {
    let client = client().await;
    let ada = register(&client, "ada").await;
    let bob = register(&client, "bob").await;

    client.follow(ada, bob).await.unwrap();
    client.unfollow(ada, bob).await.unwrap();
    assert!(!client.is_following(ada, bob).await.unwrap());

    let err = client.unfollow(ada, bob).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn self_follow_conflicts() {
    let client = client().await;
    let ada = register(&client, "ada").await;

    let err = client.follow(ada, ada).await.unwrap_err();
    assert!(matches!(err, DbError::SelfFollow));
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn following_an_unknown_user() {
    let client = client().await;
    let ada = register(&client, "ada").await;

    let err = client.follow(ada, Id::from(12_345)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn listings() {
    let client = client().await;
    let ada = register(&client, "ada").await;
    let bob = register(&client, "bob").await;
    let cyd = register(&client, "cyd").await;

    client.follow(bob, ada).await.unwrap();
    client.follow(cyd, ada).await.unwrap();
    client.follow(ada, cyd).await.unwrap();

    let mut followers: Vec<_> = client
        .list_followers(ada)
        .await
        .unwrap()
        .into_iter()
        .map(|user| user.id)
        .collect();
    followers.sort();
    let mut expected = vec![bob, cyd];
    expected.sort();
    assert_eq!(followers, expected);

    let following = client.list_following(ada).await.unwrap();
    assert_eq!(following.len(), 1);
    assert_eq!(following[0].handle.get(), "cyd");

    assert_eq!(client.list_following(bob).await.unwrap().len(), 1);
    assert!(client.list_followers(bob).await.unwrap().is_empty());
}
