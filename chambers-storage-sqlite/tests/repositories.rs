use chambers_core::{
    Error, Session, UserId,
    error::{AuthError, StorageError},
    publication::{PublicationId, PublicationRecord},
    repositories::{
        PasswordRepository, PasswordRepositoryProvider, PublicationRepository,
        PublicationRepositoryProvider, RepositoryProvider, SessionRepository,
        SessionRepositoryProvider, UserRepository, UserRepositoryProvider,
    },
    user::NewUser,
};
use chambers_storage_sqlite::SqliteRepositoryProvider;
use chrono::{Duration, TimeZone, Utc};

async fn provider() -> SqliteRepositoryProvider {
    let provider = SqliteRepositoryProvider::connect("sqlite::memory:")
        .await
        .unwrap();
    provider.migrate().await.unwrap();
    provider
}

fn record(title: &str, slug: &str, days_ago: i64) -> PublicationRecord {
    PublicationRecord {
        title: title.to_string(),
        slug: slug.to_string(),
        content: "Body text that is long enough to publish.".to_string(),
        image: "/uploads/cover.png".to_string(),
        date_published: Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap() - Duration::days(days_ago),
    }
}

#[tokio::test]
async fn test_user_create_and_lookup() {
    let provider = provider().await;

    let user = provider.user().create(NewUser::new("admin")).await.unwrap();
    assert_eq!(user.username, "admin");

    let by_name = provider.user().find_by_username("admin").await.unwrap();
    assert_eq!(by_name.map(|u| u.id), Some(user.id.clone()));

    assert!(provider.user().find_by_username("ADMIN").await.unwrap().is_none());
    assert!(
        provider
            .user()
            .find_by_id(&UserId::new("usr_missing"))
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_duplicate_username_is_reported() {
    let provider = provider().await;
    provider.user().create(NewUser::new("admin")).await.unwrap();

    let err = provider
        .user()
        .create(NewUser::new("admin"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Auth(AuthError::UsernameTaken)));
}

#[tokio::test]
async fn test_password_hash_round_trip() {
    let provider = provider().await;
    let user = provider.user().create(NewUser::new("admin")).await.unwrap();

    assert_eq!(provider.password().get_password_hash(&user.id).await.unwrap(), None);

    provider
        .password()
        .set_password_hash(&user.id, "$argon2id$fake")
        .await
        .unwrap();
    assert_eq!(
        provider.password().get_password_hash(&user.id).await.unwrap(),
        Some("$argon2id$fake".to_string())
    );

    let err = provider
        .password()
        .set_password_hash(&UserId::new("usr_missing"), "x")
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_sessions_are_stored_by_hash() {
    let provider = provider().await;
    let user = provider.user().create(NewUser::new("admin")).await.unwrap();

    let session = Session::new(&user.id, Some("agent".into()), None, Duration::hours(24));
    provider.session().create(session.clone()).await.unwrap();

    let stored: String = sqlx::query_scalar("SELECT token_hash FROM sessions")
        .fetch_one(provider.pool())
        .await
        .unwrap();
    assert_ne!(stored, session.token.as_str());
    assert_eq!(stored, session.token.token_hash());

    let found = provider
        .session()
        .find_by_token(&session.token)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.user_id, user.id);
    assert_eq!(found.user_agent.as_deref(), Some("agent"));

    provider.session().delete(&session.token).await.unwrap();
    assert!(
        provider
            .session()
            .find_by_token(&session.token)
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_session_cleanup_and_revocation() {
    let provider = provider().await;
    let user = provider.user().create(NewUser::new("admin")).await.unwrap();

    let expired = Session::new(&user.id, None, None, Duration::hours(-1));
    let current = Session::new(&user.id, None, None, Duration::hours(1));
    let other = Session::new(&user.id, None, None, Duration::hours(1));
    for s in [&expired, &current, &other] {
        provider.session().create(s.clone()).await.unwrap();
    }

    assert_eq!(provider.session().cleanup_expired().await.unwrap(), 1);

    provider
        .session()
        .delete_others(&user.id, &current.token)
        .await
        .unwrap();
    assert!(provider.session().find_by_token(&current.token).await.unwrap().is_some());
    assert!(provider.session().find_by_token(&other.token).await.unwrap().is_none());
}

#[tokio::test]
async fn test_publications_crud() {
    let provider = provider().await;
    let repo = provider.publication();

    let created = repo.create(record("First article", "first-article", 3)).await.unwrap();
    assert_eq!(created.slug, "first-article");

    let found = repo.find_by_id(created.id).await.unwrap().unwrap();
    assert_eq!(found, created);
    assert_eq!(repo.find_by_slug("first-article").await.unwrap(), Some(created.clone()));

    let updated = repo
        .update(
            created.id,
            PublicationRecord {
                title: "Renamed article".to_string(),
                ..record("ignored", "first-article", 3)
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.title, "Renamed article");
    assert_eq!(updated.id, created.id);

    let err = repo
        .update(PublicationId::new(999), record("Missing", "missing", 0))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Storage(StorageError::NotFound)));

    assert!(repo.delete(created.id).await.unwrap());
    assert!(!repo.delete(created.id).await.unwrap());
    assert!(repo.find_by_id(created.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_publications_list_newest_first() {
    let provider = provider().await;
    let repo = provider.publication();

    repo.create(record("Old", "old", 30)).await.unwrap();
    repo.create(record("New", "new", 0)).await.unwrap();
    repo.create(record("Mid", "mid", 10)).await.unwrap();

    let slugs: Vec<_> = repo
        .list()
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.slug)
        .collect();
    assert_eq!(slugs, ["new", "mid", "old"]);
}

#[tokio::test]
async fn test_slug_uniqueness() {
    let provider = provider().await;
    let repo = provider.publication();

    let first = repo.create(record("Article", "article", 0)).await.unwrap();

    assert!(repo.slug_exists("article", None).await.unwrap());
    assert!(!repo.slug_exists("article", Some(first.id)).await.unwrap());
    assert!(!repo.slug_exists("article-2", None).await.unwrap());

    let err = repo.create(record("Article", "article", 0)).await.unwrap_err();
    assert!(matches!(err, Error::Storage(StorageError::Constraint(_))));
}

#[tokio::test]
async fn test_empty_slugs_can_be_backfilled() {
    let provider = provider().await;
    let repo = provider.publication();

    let a = repo.create(record("Legacy one", "", 1)).await.unwrap();
    let b = repo.create(record("Legacy two", "", 2)).await.unwrap();
    repo.create(record("Modern", "modern", 0)).await.unwrap();

    let missing: Vec<_> = repo
        .list_missing_slugs()
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(missing, [a.id, b.id]);

    assert!(repo.find_by_slug("").await.unwrap().is_none());

    repo.set_slug(a.id, "legacy-one").await.unwrap();
    assert_eq!(repo.list_missing_slugs().await.unwrap().len(), 1);
    assert!(repo.set_slug(PublicationId::new(999), "x").await.unwrap_err().is_not_found());
}
