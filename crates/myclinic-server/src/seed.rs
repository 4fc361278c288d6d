// SPDX-License-Identifier: Apache-2.0

//! Demo-data population. Everything is derived from a caller-supplied seed
//! so repeated runs against a fresh store produce identical datasets.

use chrono::{Duration, NaiveDate, NaiveTime, Utc};
use myclinic_model::{NewAppointment, NewPatient};
use myclinic_store::{ClinicStore, StoreError};

const FIRST_NAMES: &[&str] = &[
    "Alice", "Bruno", "Carmen", "David", "Elena", "Farid", "Grace", "Hiro", "Ingrid", "Jamal",
    "Katya", "Liam", "Mei", "Noor", "Oscar", "Priya", "Quinn", "Rosa", "Samuel", "Tara",
];

const LAST_NAMES: &[&str] = &[
    "Almeida", "Becker", "Costa", "Dubois", "Eriksen", "Fontaine", "Garcia", "Haddad", "Ivanova",
    "Jansen", "Kovacs", "Larsen", "Moreau", "Nakamura", "Okafor", "Petrov", "Quispe", "Rossi",
    "Silva", "Tanaka",
];

const DOCTORS: &[&str] = &[
    "Dr. Amara Osei",
    "Dr. Ben Carter",
    "Dr. Chen Wei",
    "Dr. Dana Kim",
    "Dr. Elias Novak",
    "Dr. Fatima Rahman",
];

const CONDITIONS: &[&str] = &[
    "seasonal allergies",
    "mild asthma",
    "type 2 diabetes",
    "hypertension, medicated",
    "recovering from knee surgery",
    "no significant history",
];

/// splitmix64; good enough for demo data and dependency-free.
pub struct SeedRng {
    state: u64,
}

impl SeedRng {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    fn below(&mut self, bound: u64) -> u64 {
        if bound == 0 {
            return 0;
        }
        self.next_u64() % bound
    }

    fn pick<'a>(&mut self, pool: &[&'a str]) -> &'a str {
        pool[self.below(pool.len() as u64) as usize]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub patients: usize,
    pub appointments: usize,
}

fn random_dob(rng: &mut SeedRng) -> NaiveDate {
    let year = 1935 + rng.below(90) as i32;
    let month = 1 + rng.below(12) as u32;
    // day capped at 28 so every (year, month) pair is valid
    let day = 1 + rng.below(28) as u32;
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

fn business_hour_time(rng: &mut SeedRng) -> NaiveTime {
    let hour = 9 + rng.below(8) as u32;
    let minute = 15 * rng.below(4) as u32;
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or_default()
}

/// Inserts `patients` patient rows and `appointments` appointment rows, the
/// latter spread over the next 30 days and referencing seeded patients.
pub fn seed_demo_data(
    store: &dyn ClinicStore,
    patients: usize,
    appointments: usize,
    seed: u64,
) -> Result<SeedSummary, StoreError> {
    let mut rng = SeedRng::new(seed);

    let patient_rows: Vec<(NewPatient, bool)> = (0..patients)
        .map(|_| {
            let draft = NewPatient {
                name: format!("{} {}", rng.pick(FIRST_NAMES), rng.pick(LAST_NAMES)),
                date_of_birth: random_dob(&mut rng),
                contact_info: Some(format!("555-01{:02}", rng.below(100))),
                basic_medical_history: if rng.below(4) == 0 {
                    None
                } else {
                    Some(rng.pick(CONDITIONS).to_string())
                },
            };
            let verified = rng.below(10) < 3;
            (draft, verified)
        })
        .collect();
    let ids = store.bulk_insert_patients(&patient_rows)?;

    if ids.is_empty() {
        return Ok(SeedSummary {
            patients: 0,
            appointments: 0,
        });
    }

    let today = Utc::now().date_naive();
    let appointment_rows: Vec<NewAppointment> = (0..appointments)
        .map(|_| NewAppointment {
            patient_id: ids[rng.below(ids.len() as u64) as usize],
            date: today + Duration::days(rng.below(30) as i64),
            time: business_hour_time(&mut rng),
            doctor_name: rng.pick(DOCTORS).to_string(),
        })
        .collect();
    let inserted = store.bulk_insert_appointments(&appointment_rows)?;

    Ok(SeedSummary {
        patients: ids.len(),
        appointments: inserted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;
    use myclinic_store::MemoryStore;

    #[test]
    fn seeding_inserts_the_requested_counts() {
        let store = MemoryStore::new();
        let summary = seed_demo_data(&store, 50, 100, 7).expect("seed");
        assert_eq!(
            summary,
            SeedSummary {
                patients: 50,
                appointments: 100
            }
        );
        assert_eq!(store.list_patients(None).expect("list").len(), 50);
        assert_eq!(store.list_appointments().expect("list").len(), 100);
    }

    #[test]
    fn seeding_is_deterministic_for_a_fixed_seed() {
        let a = MemoryStore::new();
        let b = MemoryStore::new();
        seed_demo_data(&a, 20, 40, 42).expect("seed");
        seed_demo_data(&b, 20, 40, 42).expect("seed");
        let names_a: Vec<String> = a
            .list_patients(None)
            .expect("list")
            .into_iter()
            .map(|p| p.name)
            .collect();
        let names_b: Vec<String> = b
            .list_patients(None)
            .expect("list")
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names_a, names_b);
    }

    #[test]
    fn appointments_land_inside_the_next_thirty_days() {
        let store = MemoryStore::new();
        seed_demo_data(&store, 5, 30, 1).expect("seed");
        let today = Utc::now().date_naive();
        for a in store.list_appointments().expect("list") {
            let offset = (a.date - today).num_days();
            assert!((0..30).contains(&offset), "date {} out of window", a.date);
            assert!((9..17).contains(&a.time.hour()));
        }
    }

    #[test]
    fn zero_patients_means_no_appointments() {
        let store = MemoryStore::new();
        let summary = seed_demo_data(&store, 0, 10, 1).expect("seed");
        assert_eq!(summary.appointments, 0);
        assert!(store.list_appointments().expect("list").is_empty());
    }
}
