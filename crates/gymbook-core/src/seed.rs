//! Demo data seeding
//!
//! Creates the demo staff accounts and a weekly group-class plan anchored
//! to the current week's Monday. Both passes are idempotent: accounts are
//! skipped by email, classes by their (name, start) pair, so seeding can
//! run on every start.

use chrono::{Datelike, Duration, Local, NaiveDate};
use tracing::{debug, info};

use crate::catalog::SessionCatalog;
use crate::domain::session::NewSession;
use crate::domain::user::Role;
use crate::error::{Error, Result};
use crate::identity::IdentityGateway;

/// Demo accounts: one manager and two trainers
const SEED_USERS: &[(&str, &str, &str, &str, Role)] = &[
    ("Marian", "Kowalski", "marian@mygym", "manager123", Role::Manager),
    ("Tomasz", "Tomasz", "tomasz@mygym", "trainer123", Role::Trainer),
    ("Kasia", "Nowak", "kasia@mygym", "trainer123", Role::Trainer),
];

struct SeedSession {
    name: &'static str,
    description: &'static str,
    difficulty: &'static str,
    price: f64,
    /// Day offset from Monday
    weekday: i64,
    /// Start hour, on the hour
    hour: u32,
}

const SEED_CAPACITY: i64 = 10;
const SEED_DURATION_MIN: i64 = 60;

/// Weekly group-class plan, Monday through Sunday
const SEED_SESSIONS: &[SeedSession] = &[
    // Monday
    SeedSession { name: "Yoga", description: "Morning yoga flow", difficulty: "easy", price: 30.0, weekday: 0, hour: 8 },
    SeedSession { name: "Full body workout", description: "Total body strength", difficulty: "medium", price: 35.0, weekday: 0, hour: 10 },
    SeedSession { name: "Barbell", description: "Barbell strength training", difficulty: "hard", price: 40.0, weekday: 0, hour: 18 },
    // Tuesday
    SeedSession { name: "Cycling", description: "Indoor cycling", difficulty: "medium", price: 35.0, weekday: 1, hour: 9 },
    SeedSession { name: "Stretching", description: "Mobility and flexibility", difficulty: "easy", price: 30.0, weekday: 1, hour: 17 },
    SeedSession { name: "Crossfit", description: "High intensity WOD", difficulty: "hard", price: 40.0, weekday: 1, hour: 18 },
    // Wednesday
    SeedSession { name: "Pilates", description: "Core stability training", difficulty: "medium", price: 35.0, weekday: 2, hour: 8 },
    SeedSession { name: "Full body workout", description: "Functional strength", difficulty: "medium", price: 35.0, weekday: 2, hour: 12 },
    SeedSession { name: "Yoga", description: "Evening relaxation", difficulty: "easy", price: 30.0, weekday: 2, hour: 17 },
    SeedSession { name: "Barbell", description: "Power lifting basics", difficulty: "hard", price: 40.0, weekday: 2, hour: 20 },
    // Thursday
    SeedSession { name: "Cycling", description: "Endurance cycling", difficulty: "medium", price: 35.0, weekday: 3, hour: 9 },
    SeedSession { name: "Stretching", description: "Deep stretch session", difficulty: "easy", price: 30.0, weekday: 3, hour: 16 },
    SeedSession { name: "Crossfit", description: "Metabolic conditioning", difficulty: "hard", price: 40.0, weekday: 3, hour: 18 },
    // Friday
    SeedSession { name: "Yoga", description: "Morning yoga", difficulty: "easy", price: 30.0, weekday: 4, hour: 8 },
    SeedSession { name: "Pilates", description: "Posture and core", difficulty: "medium", price: 35.0, weekday: 4, hour: 11 },
    SeedSession { name: "Full body workout", description: "Strength & cardio mix", difficulty: "medium", price: 35.0, weekday: 4, hour: 17 },
    SeedSession { name: "Barbell", description: "Heavy lifting", difficulty: "hard", price: 40.0, weekday: 4, hour: 19 },
    // Saturday
    SeedSession { name: "Cycling", description: "Weekend ride", difficulty: "medium", price: 35.0, weekday: 5, hour: 10 },
    SeedSession { name: "Crossfit", description: "Team WOD", difficulty: "hard", price: 40.0, weekday: 5, hour: 12 },
    SeedSession { name: "Stretching", description: "Recovery session", difficulty: "easy", price: 30.0, weekday: 5, hour: 16 },
    // Sunday
    SeedSession { name: "Yoga", description: "Slow yoga & breathing", difficulty: "easy", price: 30.0, weekday: 6, hour: 10 },
    SeedSession { name: "Pilates", description: "Light core training", difficulty: "easy", price: 30.0, weekday: 6, hour: 13 },
];

/// Monday of the week containing `date`
pub fn week_monday(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Create the demo accounts, skipping emails already on file.
///
/// Returns the number of accounts created.
pub async fn seed_users(identity: &IdentityGateway) -> Result<u32> {
    let mut created = 0;
    for (first, last, email, password, role) in SEED_USERS {
        match identity.create_user(first, last, email, password, *role).await {
            Ok(id) => {
                info!(user_id = id, email, "Seeded user");
                created += 1;
            }
            Err(Error::DuplicateEmail) => {
                debug!(email, "Seed user already exists");
            }
            Err(other) => return Err(other),
        }
    }
    Ok(created)
}

/// Create the weekly class plan, assigned to the first trainer on file.
///
/// Classes whose (name, start) pair already exists are skipped. Returns
/// the number of sessions created.
pub async fn seed_sessions(identity: &IdentityGateway, catalog: &SessionCatalog) -> Result<u32> {
    let trainers = identity.trainers().await?;
    let Some(trainer) = trainers.first() else {
        return Err(Error::validation(
            "trainer_id",
            "No trainers exist; seed users first",
        ));
    };

    let monday = week_monday(Local::now().date_naive());

    let mut created = 0;
    for seed in SEED_SESSIONS {
        let date = monday + Duration::days(seed.weekday);
        let new = NewSession {
            kind: "group".to_string(),
            trainer_id: trainer.id,
            start_time: format!("{}T{:02}:00:00", date, seed.hour),
            duration_min: SEED_DURATION_MIN,
            capacity: SEED_CAPACITY,
            name: Some(seed.name.to_string()),
            description: Some(seed.description.to_string()),
            difficulty: Some(seed.difficulty.to_string()),
            price: Some(seed.price),
        };

        match catalog.create_session(&new).await {
            Ok(id) => {
                info!(session_id = id, name = seed.name, start = %new.start_time, "Seeded session");
                created += 1;
            }
            // the duplicate-definition guard reports on the name field
            Err(Error::Validation { ref field, .. }) if field == "name" => {
                debug!(name = seed.name, start = %new.start_time, "Seed session already exists");
            }
            Err(other) => return Err(other),
        }
    }
    Ok(created)
}

/// Seed accounts then the class plan; returns (users, sessions) created
pub async fn seed_all(identity: &IdentityGateway, catalog: &SessionCatalog) -> Result<(u32, u32)> {
    let users = seed_users(identity).await?;
    let sessions = seed_sessions(identity, catalog).await?;
    Ok((users, sessions))
}
