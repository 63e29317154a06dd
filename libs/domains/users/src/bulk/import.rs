use std::collections::HashSet;

use crate::error::{UserError, UserResult};
use crate::hasher::CredentialHasher;
use crate::models::{GeneratedUser, User};
use crate::repository::UserRepository;

/// Import one batch of candidates, returning how many were persisted.
///
/// Uses exactly two membership queries against the store to drop candidates
/// whose email or username is already taken, then writes the survivors in a
/// single bulk insert. A uniqueness conflict on the insert (a race with a
/// concurrent batch) costs the whole batch, reported as zero successes.
pub(crate) async fn import_batch<R: UserRepository + ?Sized>(
    repository: &R,
    hasher: &dyn CredentialHasher,
    batch: Vec<GeneratedUser>,
) -> UserResult<usize> {
    let emails: HashSet<String> = batch.iter().map(|c| c.email.clone()).collect();
    let usernames: HashSet<String> = batch.iter().map(|c| c.username.clone()).collect();

    let taken_emails = repository.existing_emails(&emails).await?;
    let taken_usernames = repository.existing_usernames(&usernames).await?;

    let mut to_insert = Vec::with_capacity(batch.len());
    for candidate in batch {
        if taken_emails.contains(&candidate.email)
            || taken_usernames.contains(&candidate.username)
        {
            continue;
        }
        let password_hash = hasher.hash(&candidate.password)?;
        to_insert.push(User::from_candidate(candidate, password_hash));
    }

    if to_insert.is_empty() {
        return Ok(0);
    }

    match repository.insert_many(to_insert).await {
        Ok(saved) => Ok(saved.len()),
        Err(UserError::Duplicate(key)) => {
            tracing::info!(%key, "Batch lost a uniqueness race, dropping it");
            Ok(0)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Gender, Role};
    use crate::repository::InMemoryUserRepository;

    struct PlainHasher;

    impl CredentialHasher for PlainHasher {
        fn hash(&self, plaintext: &str) -> UserResult<String> {
            Ok(format!("plain:{plaintext}"))
        }

        fn verify(&self, plaintext: &str, hash: &str) -> UserResult<bool> {
            Ok(hash == format!("plain:{plaintext}"))
        }
    }

    fn candidate(i: usize) -> GeneratedUser {
        GeneratedUser {
            firstname: "Test".to_string(),
            lastname: None,
            birth_date: None,
            city: None,
            country: None,
            avatar: None,
            company: None,
            job_position: None,
            mobile: None,
            username: format!("user{i:04}"),
            email: format!("user{i:04}@example.com"),
            password: "secret".to_string(),
            role: Role::User,
            gender: Gender::Male,
        }
    }

    #[tokio::test]
    async fn test_imports_clean_batch() {
        let repo = InMemoryUserRepository::new();
        let batch: Vec<_> = (0..10).map(candidate).collect();

        let imported = import_batch(&repo, &PlainHasher, batch).await.unwrap();

        assert_eq!(imported, 10);
        assert_eq!(repo.count().await.unwrap(), 10);
    }

    #[tokio::test]
    async fn test_skips_already_persisted_candidates() {
        let repo = InMemoryUserRepository::new();
        let hasher = PlainHasher;
        import_batch(&repo, &hasher, (0..5).map(candidate).collect())
            .await
            .unwrap();

        // Candidates 3 and 4 are already persisted; only 5..8 survive.
        let imported = import_batch(&repo, &hasher, (3..8).map(candidate).collect())
            .await
            .unwrap();

        assert_eq!(imported, 3);
        assert_eq!(repo.count().await.unwrap(), 8);
    }

    #[tokio::test]
    async fn test_fully_duplicate_batch_imports_nothing() {
        let repo = InMemoryUserRepository::new();
        let hasher = PlainHasher;
        import_batch(&repo, &hasher, (0..5).map(candidate).collect())
            .await
            .unwrap();

        let imported = import_batch(&repo, &hasher, (0..5).map(candidate).collect())
            .await
            .unwrap();

        assert_eq!(imported, 0);
        assert_eq!(repo.count().await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_intra_batch_conflict_drops_whole_batch() {
        let repo = InMemoryUserRepository::new();

        // Same username twice within one batch: the membership check cannot
        // see it, the bulk insert rejects it, the batch reports zero.
        let mut batch: Vec<_> = (0..3).map(candidate).collect();
        batch[2].username = batch[1].username.clone();

        let imported = import_batch(&repo, &PlainHasher, batch).await.unwrap();

        assert_eq!(imported, 0);
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_candidate_passwords_are_hashed() {
        let repo = InMemoryUserRepository::new();
        import_batch(&repo, &PlainHasher, vec![candidate(0)])
            .await
            .unwrap();

        let user = repo.get_by_username("user0000").await.unwrap().unwrap();
        assert_eq!(user.password_hash, "plain:secret");
    }
}
