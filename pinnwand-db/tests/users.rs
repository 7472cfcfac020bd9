mod common;

use common::{client, post, register, register_account};
use pinnwand_common::{
    model::{
        auth::{AuthToken, Credentials, TokenKind},
        user::ProfileStatus,
    },
    util::PositiveDuration,
    validation::{EditProfileRequest, RegisterRequest},
};
use pinnwand_db::{DbError, ErrorKind, auth::TokenLifetimes};
use time::Duration;

fn lifetimes() -> TokenLifetimes {
    TokenLifetimes {
        access: PositiveDuration::new_unchecked(Duration::minutes(60)),
        refresh: PositiveDuration::new_unchecked(Duration::days(7)),
    }
}

fn credentials(email: &str, password: &str) -> Credentials {
    Credentials {
        email: email.to_owned(),
        password: password.to_owned(),
    }
}

#[tokio::test]
async fn registration_defaults() {
    let client = client().await;
    let account = register_account(&client, "ada").await;

    assert_eq!(account.handle.get(), "ada");
    assert_eq!(account.email.get(), "ada@example.org");
    assert_eq!(account.profile.status, ProfileStatus::Public);
    assert_eq!(client.fetch_account(account.id).await.unwrap(), account);
}

#[tokio::test]
async fn registration_conflicts_name_the_field() {
    let client = client().await;
    register(&client, "ada").await;

    let err = client
        .register(RegisterRequest {
            username: "ada2".to_owned(),
            email: "ada@example.org".to_owned(),
            password: "secret-enough".to_owned(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::EmailTaken));

    let err = client
        .register(RegisterRequest {
            username: "ada".to_owned(),
            email: "other@example.org".to_owned(),
            password: "secret-enough".to_owned(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::UsernameTaken));
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let err = client
        .register(RegisterRequest {
            username: "bad name".to_owned(),
            email: "bad".to_owned(),
            password: "1".to_owned(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[tokio::test]
async fn login_and_refresh() {
    let client = client().await;
    let ada = register(&client, "ada").await;

    let tokens = client
        .login(&credentials("ada@example.org", "correct horse"), lifetimes())
        .await
        .unwrap();

    let access: AuthToken = tokens.access_token.parse().unwrap();
    assert_eq!(access.user_id, ada);
    let authentication = client
        .fetch_auth(&access.hash().unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(authentication.user, ada);
    assert_eq!(authentication.kind, TokenKind::Access);
    assert_eq!(
        authentication.expires_after.map(|lifetime| lifetime.whole_seconds()),
        Some(3600)
    );

    let refresh: AuthToken = tokens.refresh_token.parse().unwrap();
    let refreshed = client
        .refresh_access_token(&refresh, lifetimes().access)
        .await
        .unwrap();
    let new_access: AuthToken = refreshed.access_token.parse().unwrap();
    assert!(client.fetch_auth(&new_access.hash().unwrap()).await.unwrap().is_some());

    // An access token is not a refresh token.
    let err = client
        .refresh_access_token(&access, lifetimes().access)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
}

#[tokio::test]
async fn login_failures_look_alike() {
    let client = client().await;
    register(&client, "ada").await;

    for (email, password) in [
        ("ada@example.org", "wrong horse"),
        ("nobody@example.org", "correct horse"),
    ] {
        let err = client
            .login(&credentials(email, password), lifetimes())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::InvalidCredentials));
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }

    let unknown = AuthToken::generate_random(pinnwand_common::model::Id::from(1));
    assert!(client.fetch_auth(&unknown.hash().unwrap()).await.unwrap().is_none());
}

#[tokio::test]
async fn profile_edits() {
    let client = client().await;
    let ada = register(&client, "ada").await;
    register(&client, "bob").await;

    let account = client
        .edit_profile(
            ada,
            EditProfileRequest {
                name: Some("Ada Lovelace".to_owned()),
                bio: Some("Analyst".to_owned()),
                ..EditProfileRequest::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(account.profile.name.as_deref(), Some("Ada Lovelace"));
    assert_eq!(account.handle.get(), "ada");

    let account = client
        .edit_profile(
            ada,
            EditProfileRequest {
                bio: Some("  ".to_owned()),
                username: Some("countess".to_owned()),
                ..EditProfileRequest::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(account.profile.bio, None);
    assert_eq!(account.profile.name.as_deref(), Some("Ada Lovelace"));
    assert_eq!(account.handle.get(), "countess");

    let err = client
        .edit_profile(
            ada,
            EditProfileRequest {
                username: Some("bob".to_owned()),
                ..EditProfileRequest::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::UsernameTaken));
}

#[tokio::test]
async fn profile_counts() {
    let client = client().await;
    let ada = register(&client, "ada").await;
    let bob = register(&client, "bob").await;
    let cyd = register(&client, "cyd").await;

    client.follow(bob, ada).await.unwrap();
    client.follow(cyd, ada).await.unwrap();
    client.follow(ada, bob).await.unwrap();
    post(&client, ada, "one").await;
    post(&client, ada, "two").await;

    let profile = client.fetch_profile(cyd, ada).await.unwrap();
    assert_eq!(profile.followers_count, 2);
    assert_eq!(profile.following_count, 1);
    assert_eq!(profile.posts_count, 2);
    assert!(profile.is_following);
    assert!(!client.fetch_profile(cyd, bob).await.unwrap().is_following);
}

#[tokio::test]
async fn search() {
    let client = client().await;
    for name in ["Ada", "adam", "badass", "bob", "under_score", "underXscore"] {
        register(&client, name).await;
    }

    let handles = |users: Vec<pinnwand_common::model::user::UserSummary>| {
        users
            .into_iter()
            .map(|user| user.handle.into_inner())
            .collect::<Vec<_>>()
    };

    assert_eq!(
        handles(client.search_users("ADA").await.unwrap()),
        ["Ada", "adam", "badass"]
    );
    assert_eq!(
        handles(client.search_users("r_s").await.unwrap()),
        ["under_score"]
    );
    assert!(client.search_users("%").await.unwrap().is_empty());
}
