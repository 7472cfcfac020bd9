mod common;

use common::{client, make_private, post, register, register_account};
use pinnwand_common::model::{Id, user::Role};
use pinnwand_db::{DbError, ErrorKind};

#[tokio::test]
async fn duplicate_reports_count_once() {
    let client = client().await;
    let ada = register(&client, "ada").await;
    let xen = register(&client, "xen").await;
    let admin = register(&client, "admin").await;
    client.set_user_role(admin, Role::Admin).await.unwrap();
    let p1 = post(&client, ada, "questionable").await;

    client.report_post(xen, p1.id).await.unwrap();
    let err = client.report_post(xen, p1.id).await.unwrap_err();
    assert!(matches!(err, DbError::AlreadyReported(id) if id == p1.id));
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let reports = client.list_reported_posts(admin).await.unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].post_id, p1.id);
    assert_eq!(reports[0].report_count, 1);
    assert_eq!(reports[0].content, "questionable");
    assert_eq!(reports[0].author_display_name, "ada");
}

#[tokio::test]
async fn reports_are_ordered_by_count() {
    let client = client().await;
    let ada = register(&client, "ada").await;
    let bob = register(&client, "bob").await;
    let admin = register(&client, "admin").await;
    client.set_user_role(admin, Role::Admin).await.unwrap();
    client
        .edit_profile(
            ada,
            pinnwand_common::validation::EditProfileRequest {
                name: Some("Ada Lovelace".to_owned()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let once = post(&client, bob, "once").await;
    let twice = post(&client, ada, "twice").await;
    client.report_post(ada, once.id).await.unwrap();
    client.report_post(bob, twice.id).await.unwrap();
    client.report_post(admin, twice.id).await.unwrap();

    let reports = client.list_reported_posts(admin).await.unwrap();
    let counts: Vec<_> = reports
        .iter()
        .map(|report| (report.content.as_str(), report.report_count))
        .collect();
    assert_eq!(counts, [("twice", 2), ("once", 1)]);
    assert_eq!(reports[0].author_display_name, "Ada Lovelace");
}

#[tokio::test]
async fn members_may_not_moderate() {
    let client = client().await;
    let member = register_account(&client, "member").await;
    assert_eq!(member.role, Role::Member);

    let err = client.list_reported_posts(member.id).await.unwrap_err();
    assert!(matches!(err, DbError::AdminRequired));
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let p1 = post(&client, member.id, "mine").await;
    let err = client.resolve_report(member.id, p1.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
    assert!(client.fetch_post(member.id, p1.id).await.is_ok());
}

#[tokio::test]
async fn resolving_deletes_the_post() {
    let client = client().await;
    let ada = register(&client, "ada").await;
    let xen = register(&client, "xen").await;
    let admin = register(&client, "admin").await;
    client.set_user_role(admin, Role::Admin).await.unwrap();

    let p1 = post(&client, ada, "spam").await;
    client.like_post(xen, p1.id).await.unwrap();
    client.report_post(xen, p1.id).await.unwrap();

    client.resolve_report(admin, p1.id).await.unwrap();
    assert!(client.list_reported_posts(admin).await.unwrap().is_empty());
    assert!(matches!(
        client.fetch_post(ada, p1.id).await,
        Err(DbError::PostNotFound(_))
    ));

    let err = client.resolve_report(admin, p1.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    let err = client.resolve_report(admin, Id::from(99)).await.unwrap_err();
    assert!(matches!(err, DbError::PostNotFound(_)));
}

#[tokio::test]
async fn hidden_posts_cannot_be_reported() {
    let client = client().await;
    let ada = register(&client, "ada").await;
    let xen = register(&client, "xen").await;
    let p1 = post(&client, ada, "private").await;
    make_private(&client, ada).await;

    let err = client.report_post(xen, p1.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}
