//! Integration tests for the bulk generation/import pipeline.

use std::sync::Arc;

use domain_users::{
    BulkConfig, CredentialHasher, GeneratedUser, Gender, InMemoryTokenRepository,
    InMemoryUserRepository, Role, UserError, UserRepository, UserResult, UserService,
};

/// Argon2 is deliberately slow; bulk tests swap in a transparent hasher.
struct PlainHasher;

impl CredentialHasher for PlainHasher {
    fn hash(&self, plaintext: &str) -> UserResult<String> {
        Ok(format!("plain:{plaintext}"))
    }

    fn verify(&self, plaintext: &str, hash: &str) -> UserResult<bool> {
        Ok(hash == format!("plain:{plaintext}"))
    }
}

fn service() -> (
    Arc<UserService<InMemoryUserRepository, InMemoryTokenRepository>>,
    Arc<InMemoryUserRepository>,
) {
    let repository = Arc::new(InMemoryUserRepository::new());
    let service = UserService::with_parts(
        Arc::clone(&repository),
        Arc::new(InMemoryTokenRepository::new()),
        Arc::new(PlainHasher),
        BulkConfig::default(),
    );
    (Arc::new(service), repository)
}

fn candidate(i: usize) -> GeneratedUser {
    GeneratedUser {
        firstname: format!("First{i}"),
        lastname: Some(format!("Last{i}")),
        birth_date: None,
        city: None,
        country: None,
        avatar: None,
        company: None,
        job_position: None,
        mobile: None,
        username: format!("user{i:05}"),
        email: format!("user{i:05}@example.com"),
        password: "secret".to_string(),
        role: Role::User,
        gender: Gender::Female,
    }
}

#[tokio::test]
async fn test_generate_returns_exact_count() {
    let (service, _) = service();

    for count in [1, 100, 2500] {
        let users = service.generate_users(count).await.unwrap();
        assert_eq!(users.len(), count);
    }
}

#[tokio::test]
async fn test_generate_rejects_out_of_range_counts() {
    let (service, _) = service();

    assert!(matches!(
        service.generate_users(0).await,
        Err(UserError::Validation(_))
    ));
    assert!(matches!(
        service.generate_users(200_001).await,
        Err(UserError::Validation(_))
    ));
}

#[tokio::test]
async fn test_generate_accepts_maximum_count() {
    let (service, _) = service();

    let users = service.generate_users(200_000).await.unwrap();
    assert_eq!(users.len(), 200_000);
}

#[tokio::test]
async fn test_generation_persists_nothing() {
    let (service, repository) = service();

    service.generate_users(500).await.unwrap();
    assert_eq!(repository.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_import_clean_dataset() {
    let (service, repository) = service();
    let dataset: Vec<_> = (0..150).map(candidate).collect();
    let raw = serde_json::to_vec(&dataset).unwrap();

    let summary = service.upload_batch(&raw).await.unwrap();

    assert_eq!(summary.total_records, 150);
    assert_eq!(summary.successfully_imported, 150);
    assert_eq!(summary.failed_to_import, 0);
    assert_eq!(repository.count().await.unwrap(), 150);
}

#[tokio::test]
async fn test_reimport_counts_everything_as_failed() {
    let (service, repository) = service();
    let dataset: Vec<_> = (0..150).map(candidate).collect();
    let raw = serde_json::to_vec(&dataset).unwrap();

    service.upload_batch(&raw).await.unwrap();
    let summary = service.upload_batch(&raw).await.unwrap();

    assert_eq!(summary.total_records, 150);
    assert_eq!(summary.successfully_imported, 0);
    assert_eq!(summary.failed_to_import, 150);
    assert_eq!(repository.count().await.unwrap(), 150);
}

#[tokio::test]
async fn test_partial_collisions_are_accounted_per_record() {
    let (service, repository) = service();

    // Pre-seed 10 usernames the dataset will collide with. Collision emails
    // are distinct, so only the username side trips the dedup filter.
    for i in 0..10 {
        let mut taken = candidate(i);
        taken.email = format!("taken{i:05}@example.com");
        let raw = serde_json::to_vec(&vec![taken]).unwrap();
        service.upload_batch(&raw).await.unwrap();
    }

    let dataset: Vec<_> = (0..250).map(candidate).collect();
    let raw = serde_json::to_vec(&dataset).unwrap();
    let summary = service.upload_batch(&raw).await.unwrap();

    assert_eq!(summary.total_records, 250);
    assert_eq!(summary.successfully_imported, 240);
    assert_eq!(summary.failed_to_import, 10);
    assert_eq!(repository.count().await.unwrap(), 250);
}

#[tokio::test]
async fn test_failed_batch_does_not_abort_siblings() {
    let (service, repository) = service();

    // Candidates 100..200 fill exactly one import batch. Pre-seeding them
    // with swapped emails makes that batch collide while its siblings stay
    // clean.
    for i in 100..200 {
        let mut taken = candidate(i);
        taken.email = format!("seeded{i:05}@example.com");
        let raw = serde_json::to_vec(&vec![taken]).unwrap();
        service.upload_batch(&raw).await.unwrap();
    }

    let dataset: Vec<_> = (0..250).map(candidate).collect();
    let raw = serde_json::to_vec(&dataset).unwrap();
    let summary = service.upload_batch(&raw).await.unwrap();

    assert_eq!(summary.total_records, 250);
    assert_eq!(summary.successfully_imported, 150);
    assert_eq!(summary.failed_to_import, 100);
    assert_eq!(repository.count().await.unwrap(), 250);
}

#[tokio::test]
async fn test_upload_rejects_empty_and_malformed_payloads() {
    let (service, _) = service();

    assert!(matches!(
        service.upload_batch(b"").await,
        Err(UserError::Validation(_))
    ));
    assert!(matches!(
        service.upload_batch(b"{not json").await,
        Err(UserError::Validation(_))
    ));
    assert!(matches!(
        service.upload_batch(b"[]").await,
        Err(UserError::Validation(_))
    ));
}

#[tokio::test]
async fn test_generated_dataset_round_trips_through_import() {
    let (service, _) = service();

    let users = service.generate_users(500).await.unwrap();
    let raw = serde_json::to_vec(&users).unwrap();
    let summary = service.upload_batch(&raw).await.unwrap();

    // Random usernames may collide with each other; the counts must still
    // reconcile.
    assert_eq!(summary.total_records, 500);
    assert_eq!(
        summary.successfully_imported + summary.failed_to_import,
        summary.total_records
    );
}

#[tokio::test]
async fn test_concurrent_uploads_of_overlapping_datasets() {
    let (service, repository) = service();

    // Two concurrent uploads share 50 records. However the races resolve,
    // each unique record is persisted at most once and both summaries
    // reconcile.
    let first: Vec<_> = (0..150).map(candidate).collect();
    let second: Vec<_> = (100..250).map(candidate).collect();
    let raw_first = serde_json::to_vec(&first).unwrap();
    let raw_second = serde_json::to_vec(&second).unwrap();

    let (a, b) = futures::join!(
        service.upload_batch(&raw_first),
        service.upload_batch(&raw_second)
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_eq!(a.successfully_imported + a.failed_to_import, 150);
    assert_eq!(b.successfully_imported + b.failed_to_import, 150);
    assert!(repository.count().await.unwrap() <= 250);
    assert!(repository.count().await.unwrap() >= 150);
}
