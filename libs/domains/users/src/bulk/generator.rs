use chrono::NaiveDate;
use fake::faker::address::raw::{CityName, CountryName};
use fake::faker::company::raw::CompanyName;
use fake::faker::internet::raw::FreeEmail;
use fake::faker::job::raw::Position;
use fake::faker::name::raw::{FirstName, LastName};
use fake::faker::phone_number::raw::PhoneNumber;
use fake::locales::EN;
use fake::Fake;
use rand::distr::Alphanumeric;
use rand::Rng;

use crate::models::{GeneratedUser, Gender, Role};

const USERNAME_LETTERS: usize = 4;
const USERNAME_DIGITS: usize = 2;
const PASSWORD_LENGTH: usize = 10;

/// Produce `count` synthetic user candidates.
///
/// Pure CPU work: no store access, no async. Usernames are random but not
/// guaranteed unique; the import stage owns deduplication.
pub fn generate_batch(count: usize) -> Vec<GeneratedUser> {
    let mut rng = rand::rng();
    (0..count).map(|_| generate_user(&mut rng)).collect()
}

fn generate_user<R: Rng>(rng: &mut R) -> GeneratedUser {
    let username = random_username(rng);
    let avatar = format!("https://i.pravatar.cc/150?u={username}");

    GeneratedUser {
        firstname: FirstName(EN).fake_with_rng(rng),
        lastname: Some(LastName(EN).fake_with_rng(rng)),
        birth_date: random_birth_date(rng),
        city: Some(CityName(EN).fake_with_rng(rng)),
        country: Some(CountryName(EN).fake_with_rng(rng)),
        avatar: Some(avatar),
        company: Some(CompanyName(EN).fake_with_rng(rng)),
        job_position: Some(Position(EN).fake_with_rng(rng)),
        mobile: Some(PhoneNumber(EN).fake_with_rng(rng)),
        username,
        email: FreeEmail(EN).fake_with_rng(rng),
        password: random_password(rng),
        role: if rng.random_bool(0.5) {
            Role::Manager
        } else {
            Role::Admin
        },
        gender: if rng.random_bool(0.5) {
            Gender::Male
        } else {
            Gender::Female
        },
    }
}

/// Four lowercase letters followed by two digits, e.g. `qhzt42`.
fn random_username<R: Rng>(rng: &mut R) -> String {
    let mut username = String::with_capacity(USERNAME_LETTERS + USERNAME_DIGITS);
    for _ in 0..USERNAME_LETTERS {
        username.push(rng.random_range(b'a'..=b'z') as char);
    }
    for _ in 0..USERNAME_DIGITS {
        username.push(rng.random_range(b'0'..=b'9') as char);
    }
    username
}

fn random_password<R: Rng>(rng: &mut R) -> String {
    (0..PASSWORD_LENGTH)
        .map(|_| rng.sample(Alphanumeric) as char)
        .collect()
}

fn random_birth_date<R: Rng>(rng: &mut R) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(
        rng.random_range(1950..=2005),
        rng.random_range(1..=12),
        rng.random_range(1..=28),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generates_exact_count() {
        assert_eq!(generate_batch(0).len(), 0);
        assert_eq!(generate_batch(250).len(), 250);
    }

    #[test]
    fn test_generated_fields_have_expected_shape() {
        for user in generate_batch(50) {
            assert_eq!(user.username.len(), USERNAME_LETTERS + USERNAME_DIGITS);
            assert!(user.username[..USERNAME_LETTERS]
                .chars()
                .all(|c| c.is_ascii_lowercase()));
            assert!(user.username[USERNAME_LETTERS..]
                .chars()
                .all(|c| c.is_ascii_digit()));

            assert!(user.email.contains('@'));
            assert_eq!(user.password.len(), PASSWORD_LENGTH);
            assert!(matches!(user.role, Role::Manager | Role::Admin));
            assert!(user.birth_date.is_some());
            assert!(!user.firstname.is_empty());
        }
    }
}
