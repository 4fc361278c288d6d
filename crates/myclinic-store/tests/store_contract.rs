use chrono::{NaiveDate, NaiveTime};
use myclinic_model::{NewAppointment, NewPatient, PatientId};
use myclinic_store::{ClinicStore, MemoryStore, SqliteStore};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("date")
}

fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).expect("time")
}

fn new_patient(name: &str) -> NewPatient {
    NewPatient {
        name: name.to_string(),
        date_of_birth: date(2000, 1, 1),
        contact_info: Some("555-0100".to_string()),
        basic_medical_history: None,
    }
}

fn new_appointment(patient_id: PatientId, d: NaiveDate, t: NaiveTime) -> NewAppointment {
    NewAppointment {
        patient_id,
        date: d,
        time: t,
        doctor_name: "Dr. Smith".to_string(),
    }
}

fn backends() -> Vec<(&'static str, Box<dyn ClinicStore>)> {
    vec![
        ("memory", Box::new(MemoryStore::new())),
        (
            "sqlite",
            Box::new(SqliteStore::open_in_memory().expect("open sqlite")),
        ),
    ]
}

#[test]
fn create_then_get_round_trips_field_for_field() {
    for (backend, store) in backends() {
        let draft = NewPatient {
            name: "Test Patient".to_string(),
            date_of_birth: date(2000, 1, 1),
            contact_info: Some("555-0100".to_string()),
            basic_medical_history: Some("none of note".to_string()),
        };
        let created = store.create_patient(&draft).expect("create");
        assert!(!created.verified_by_admin, "{backend}: default unverified");
        let fetched = store
            .get_patient(created.id)
            .expect("get")
            .expect("present");
        assert_eq!(fetched, created, "{backend}");
    }
}

#[test]
fn appointment_round_trips_date_and_time() {
    for (backend, store) in backends() {
        let p = store.create_patient(&new_patient("Test Patient")).expect("create");
        let a = store
            .create_appointment(&new_appointment(p.id, date(2024, 12, 15), time(10, 0)))
            .expect("create appointment");
        let fetched = store
            .get_appointment(a.id)
            .expect("get")
            .expect("present");
        assert_eq!(fetched, a, "{backend}");
        assert_eq!(fetched.internal_admin_notes, None, "{backend}");
    }
}

#[test]
fn deleting_a_patient_cascades_to_its_appointments() {
    for (backend, store) in backends() {
        let keep = store.create_patient(&new_patient("Keep")).expect("create");
        let gone = store.create_patient(&new_patient("Gone")).expect("create");
        store
            .create_appointment(&new_appointment(keep.id, date(2024, 12, 15), time(9, 0)))
            .expect("create");
        store
            .create_appointment(&new_appointment(gone.id, date(2024, 12, 15), time(10, 0)))
            .expect("create");
        store
            .create_appointment(&new_appointment(gone.id, date(2024, 12, 16), time(11, 0)))
            .expect("create");

        assert!(store.delete_patient(gone.id).expect("delete"), "{backend}");

        let remaining = store.list_appointments().expect("list");
        assert_eq!(remaining.len(), 1, "{backend}: cascade left orphans");
        assert_eq!(remaining[0].patient_id, keep.id, "{backend}");
    }
}

#[test]
fn list_patients_filters_by_case_insensitive_substring() {
    for (backend, store) in backends() {
        store.create_patient(&new_patient("Alice Martin")).expect("create");
        store.create_patient(&new_patient("Bob Martinez")).expect("create");
        store.create_patient(&new_patient("Carol Jones")).expect("create");

        let hits = store.list_patients(Some("martin")).expect("list");
        assert_eq!(hits.len(), 2, "{backend}");
        let all = store.list_patients(None).expect("list");
        assert_eq!(all.len(), 3, "{backend}");
        // id order is stable
        assert!(
            all.windows(2).all(|w| w[0].id < w[1].id),
            "{backend}: unstable order"
        );
    }
}

#[test]
fn appointments_list_in_date_time_order() {
    for (backend, store) in backends() {
        let p = store.create_patient(&new_patient("Test Patient")).expect("create");
        store
            .create_appointment(&new_appointment(p.id, date(2024, 12, 20), time(9, 0)))
            .expect("create");
        store
            .create_appointment(&new_appointment(p.id, date(2024, 12, 15), time(14, 0)))
            .expect("create");
        store
            .create_appointment(&new_appointment(p.id, date(2024, 12, 15), time(10, 0)))
            .expect("create");

        let rows = store.list_appointments().expect("list");
        let keys: Vec<(NaiveDate, NaiveTime)> = rows.iter().map(|a| (a.date, a.time)).collect();
        assert_eq!(
            keys,
            vec![
                (date(2024, 12, 15), time(10, 0)),
                (date(2024, 12, 15), time(14, 0)),
                (date(2024, 12, 20), time(9, 0)),
            ],
            "{backend}"
        );
    }
}

#[test]
fn standard_update_never_touches_privileged_fields() {
    for (backend, store) in backends() {
        let p = store.create_patient(&new_patient("Test Patient")).expect("create");
        assert!(store
            .update_patient_admin(p.id, &new_patient("Test Patient"), true)
            .expect("admin update"));

        let mut fields = new_patient("Renamed Patient");
        fields.contact_info = None;
        assert!(store.update_patient(p.id, &fields).expect("update"));

        let after = store.get_patient(p.id).expect("get").expect("present");
        assert_eq!(after.name, "Renamed Patient", "{backend}");
        assert!(after.verified_by_admin, "{backend}: flag must survive");
    }
}

#[test]
fn admin_update_writes_privileged_appointment_notes() {
    for (backend, store) in backends() {
        let p = store.create_patient(&new_patient("Test Patient")).expect("create");
        let a = store
            .create_appointment(&new_appointment(p.id, date(2024, 12, 15), time(10, 0)))
            .expect("create");
        assert!(store
            .update_appointment_admin(
                a.id,
                &new_appointment(p.id, date(2024, 12, 15), time(10, 0)),
                Some("bring previous scans"),
            )
            .expect("admin update"));
        let after = store.get_appointment(a.id).expect("get").expect("present");
        assert_eq!(
            after.internal_admin_notes.as_deref(),
            Some("bring previous scans"),
            "{backend}"
        );

        // the standard update path leaves the notes alone
        assert!(store
            .update_appointment(a.id, &new_appointment(p.id, date(2024, 12, 16), time(9, 0)))
            .expect("update"));
        let after = store.get_appointment(a.id).expect("get").expect("present");
        assert_eq!(
            after.internal_admin_notes.as_deref(),
            Some("bring previous scans"),
            "{backend}"
        );
    }
}

#[test]
fn missing_ids_report_absent_rather_than_failing() {
    for (backend, store) in backends() {
        let missing = PatientId::new(999);
        assert!(store.get_patient(missing).expect("get").is_none(), "{backend}");
        assert!(!store.delete_patient(missing).expect("delete"), "{backend}");
        assert!(
            !store
                .update_patient(missing, &new_patient("Nobody"))
                .expect("update"),
            "{backend}"
        );
        assert!(!store.patient_exists(missing).expect("exists"), "{backend}");
    }
}

#[test]
fn creating_an_appointment_for_a_missing_patient_is_a_store_fault() {
    for (backend, store) in backends() {
        let err = store
            .create_appointment(&new_appointment(
                PatientId::new(999),
                date(2024, 12, 15),
                time(10, 0),
            ))
            .expect_err("dangling reference must be rejected");
        assert!(!err.to_string().is_empty(), "{backend}");
    }
}

#[test]
fn admin_list_filters_verified_and_doctor_and_date() {
    for (backend, store) in backends() {
        let p1 = store.create_patient(&new_patient("Alice Martin")).expect("create");
        let p2 = store.create_patient(&new_patient("Bob Martinez")).expect("create");
        store
            .update_patient_admin(p1.id, &new_patient("Alice Martin"), true)
            .expect("verify");

        let verified = store
            .list_patients_admin(None, Some(true))
            .expect("list verified");
        assert_eq!(verified.len(), 1, "{backend}");
        assert_eq!(verified[0].id, p1.id, "{backend}");

        store
            .create_appointment(&new_appointment(p1.id, date(2024, 12, 15), time(10, 0)))
            .expect("create");
        let mut other = new_appointment(p2.id, date(2024, 12, 16), time(11, 0));
        other.doctor_name = "Dr. Jones".to_string();
        store.create_appointment(&other).expect("create");

        let smith = store
            .list_appointments_admin(Some("smith"), None, None)
            .expect("list by doctor");
        assert_eq!(smith.len(), 1, "{backend}");

        let on_16th = store
            .list_appointments_admin(None, None, Some(date(2024, 12, 16)))
            .expect("list by date");
        assert_eq!(on_16th.len(), 1, "{backend}");
        assert_eq!(on_16th[0].doctor_name, "Dr. Jones", "{backend}");
    }
}

#[test]
fn admin_appointment_list_filters_by_patient_name() {
    for (backend, store) in backends() {
        let alice = store.create_patient(&new_patient("Alice Martin")).expect("create");
        let bob = store.create_patient(&new_patient("Bob Jones")).expect("create");
        store
            .create_appointment(&new_appointment(alice.id, date(2024, 12, 15), time(10, 0)))
            .expect("create");
        store
            .create_appointment(&new_appointment(bob.id, date(2024, 12, 15), time(11, 0)))
            .expect("create");

        let hits = store
            .list_appointments_admin(None, Some("martin"), None)
            .expect("list by patient");
        assert_eq!(hits.len(), 1, "{backend}");
        assert_eq!(hits[0].patient_id, alice.id, "{backend}");

        let none = store
            .list_appointments_admin(None, Some("nobody"), None)
            .expect("list by patient");
        assert!(none.is_empty(), "{backend}");
    }
}

#[test]
fn substring_filters_treat_like_metacharacters_literally() {
    for (backend, store) in backends() {
        let plain = store.create_patient(&new_patient("Alice Martin")).expect("create");
        let percent = store
            .create_patient(&new_patient("100% Wellness Clinic"))
            .expect("create");
        let underscore = store
            .create_patient(&new_patient("room_7 walk-in"))
            .expect("create");

        assert!(
            store.list_patients(Some("%")).expect("list").len() == 1
                && store.list_patients(Some("%")).expect("list")[0].id == percent.id,
            "{backend}: bare % must only match a literal %"
        );
        let hits = store.list_patients(Some("_")).expect("list");
        assert_eq!(hits.len(), 1, "{backend}: bare _ must only match a literal _");
        assert_eq!(hits[0].id, underscore.id, "{backend}");
        assert!(
            store.list_patients(Some("m%w")).expect("list").is_empty(),
            "{backend}: % must not act as a wildcard"
        );
        assert!(
            store.list_patients(Some("\\")).expect("list").is_empty(),
            "{backend}: backslash is literal, matches nothing here"
        );

        store
            .create_appointment(&new_appointment(plain.id, date(2024, 12, 15), time(10, 0)))
            .expect("create");
        let mut odd = new_appointment(percent.id, date(2024, 12, 15), time(11, 0));
        odd.doctor_name = "Dr. 50%_On-Call".to_string();
        store.create_appointment(&odd).expect("create");

        let by_doctor = store
            .list_appointments_admin(Some("%_"), None, None)
            .expect("list by doctor");
        assert_eq!(by_doctor.len(), 1, "{backend}");
        assert_eq!(by_doctor[0].doctor_name, "Dr. 50%_On-Call", "{backend}");
        assert!(
            store
                .list_appointments_admin(Some("d%l"), None, None)
                .expect("list by doctor")
                .is_empty(),
            "{backend}: % must not act as a wildcard in doctor filter"
        );
    }
}

#[test]
fn bulk_insert_populates_both_entities() {
    for (backend, store) in backends() {
        let patients: Vec<(NewPatient, bool)> = (0..10)
            .map(|i| (new_patient(&format!("Seeded Patient {i}")), i % 2 == 0))
            .collect();
        let ids = store.bulk_insert_patients(&patients).expect("bulk patients");
        assert_eq!(ids.len(), 10, "{backend}");

        let appointments: Vec<NewAppointment> = ids
            .iter()
            .map(|id| new_appointment(*id, date(2024, 12, 15), time(10, 0)))
            .collect();
        let n = store
            .bulk_insert_appointments(&appointments)
            .expect("bulk appointments");
        assert_eq!(n, 10, "{backend}");

        let verified = store
            .list_patients_admin(None, Some(true))
            .expect("list verified");
        assert_eq!(verified.len(), 5, "{backend}");
    }
}

#[test]
fn sqlite_store_persists_across_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("clinic.sqlite");
    let id = {
        let store = SqliteStore::open(&path).expect("open");
        store.create_patient(&new_patient("Test Patient")).expect("create").id
    };
    let store = SqliteStore::open(&path).expect("reopen");
    let fetched = store.get_patient(id).expect("get").expect("present");
    assert_eq!(fetched.name, "Test Patient");
}
