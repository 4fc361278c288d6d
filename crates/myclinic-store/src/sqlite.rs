// SPDX-License-Identifier: Apache-2.0

use crate::{ClinicStore, StoreError};
use chrono::{NaiveDate, NaiveTime};
use myclinic_model::{
    Appointment, AppointmentId, NewAppointment, NewPatient, Patient, PatientId,
};
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS patient (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    date_of_birth TEXT NOT NULL,
    contact_info TEXT,
    basic_medical_history TEXT,
    verified_by_admin INTEGER NOT NULL DEFAULT 0
);
CREATE TABLE IF NOT EXISTS appointment (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    patient_id INTEGER NOT NULL REFERENCES patient(id) ON DELETE CASCADE,
    date TEXT NOT NULL,
    time TEXT NOT NULL,
    doctor_name TEXT NOT NULL,
    internal_admin_notes TEXT
);
CREATE INDEX IF NOT EXISTS appointment_patient_idx ON appointment(patient_id);
CREATE INDEX IF NOT EXISTS appointment_schedule_idx ON appointment(date, time);
";

/// SQLite-backed store. A single connection behind a mutex serializes all
/// operations; the cascade on `appointment.patient_id` is enforced by the
/// database itself (`PRAGMA foreign_keys=ON` at open).
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|e| StoreError(e.to_string()))?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|e| StoreError(e.to_string()))?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|e| StoreError(e.to_string()))?;
        conn.execute_batch(SCHEMA)
            .map_err(|e| StoreError(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError("store mutex poisoned".to_string()))
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, rusqlite::Error> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn parse_time(raw: &str) -> Result<NaiveTime, rusqlite::Error> {
    NaiveTime::parse_from_str(raw, "%H:%M:%S").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn patient_from_row(row: &Row<'_>) -> Result<Patient, rusqlite::Error> {
    Ok(Patient {
        id: PatientId::new(row.get(0)?),
        name: row.get(1)?,
        date_of_birth: parse_date(&row.get::<_, String>(2)?)?,
        contact_info: row.get(3)?,
        basic_medical_history: row.get(4)?,
        verified_by_admin: row.get::<_, i64>(5)? != 0,
    })
}

fn appointment_from_row(row: &Row<'_>) -> Result<Appointment, rusqlite::Error> {
    Ok(Appointment {
        id: AppointmentId::new(row.get(0)?),
        patient_id: PatientId::new(row.get(1)?),
        date: parse_date(&row.get::<_, String>(2)?)?,
        time: parse_time(&row.get::<_, String>(3)?)?,
        doctor_name: row.get(4)?,
        internal_admin_notes: row.get(5)?,
    })
}

const PATIENT_COLS: &str =
    "id, name, date_of_birth, contact_info, basic_medical_history, verified_by_admin";
const APPOINTMENT_COLS: &str =
    "id, patient_id, date, time, doctor_name, internal_admin_notes";

/// Substring filters are literal: `%`, `_`, and `\` in the needle must not
/// act as LIKE metacharacters. Pairs with `ESCAPE '\'` in the queries.
fn escape_like(needle: &str) -> String {
    needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

impl ClinicStore for SqliteStore {
    fn create_patient(&self, draft: &NewPatient) -> Result<Patient, StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO patient (name, date_of_birth, contact_info, basic_medical_history)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                draft.name,
                draft.date_of_birth.to_string(),
                draft.contact_info,
                draft.basic_medical_history,
            ],
        )
        .map_err(|e| StoreError(e.to_string()))?;
        Ok(Patient {
            id: PatientId::new(conn.last_insert_rowid()),
            name: draft.name.clone(),
            date_of_birth: draft.date_of_birth,
            contact_info: draft.contact_info.clone(),
            basic_medical_history: draft.basic_medical_history.clone(),
            verified_by_admin: false,
        })
    }

    fn get_patient(&self, id: PatientId) -> Result<Option<Patient>, StoreError> {
        let conn = self.lock()?;
        conn.query_row(
            &format!("SELECT {PATIENT_COLS} FROM patient WHERE id = ?1"),
            params![id.as_i64()],
            patient_from_row,
        )
        .map(Some)
        .or_else(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => Ok(None),
            other => Err(StoreError(other.to_string())),
        })
    }

    fn list_patients(&self, name_contains: Option<&str>) -> Result<Vec<Patient>, StoreError> {
        self.list_patients_admin(name_contains, None)
    }

    fn list_patients_admin(
        &self,
        name_contains: Option<&str>,
        verified: Option<bool>,
    ) -> Result<Vec<Patient>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {PATIENT_COLS} FROM patient
                 WHERE (?1 IS NULL OR name LIKE '%' || ?1 || '%' ESCAPE '\\')
                   AND (?2 IS NULL OR verified_by_admin = ?2)
                 ORDER BY id"
            ))
            .map_err(|e| StoreError(e.to_string()))?;
        let rows = stmt
            .query_map(
                params![name_contains.map(escape_like), verified.map(i64::from)],
                patient_from_row,
            )
            .map_err(|e| StoreError(e.to_string()))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError(e.to_string()))
    }

    fn update_patient(&self, id: PatientId, fields: &NewPatient) -> Result<bool, StoreError> {
        let conn = self.lock()?;
        let changed = conn
            .execute(
                "UPDATE patient
                 SET name = ?1, date_of_birth = ?2, contact_info = ?3, basic_medical_history = ?4
                 WHERE id = ?5",
                params![
                    fields.name,
                    fields.date_of_birth.to_string(),
                    fields.contact_info,
                    fields.basic_medical_history,
                    id.as_i64(),
                ],
            )
            .map_err(|e| StoreError(e.to_string()))?;
        Ok(changed > 0)
    }

    fn update_patient_admin(
        &self,
        id: PatientId,
        fields: &NewPatient,
        verified_by_admin: bool,
    ) -> Result<bool, StoreError> {
        let conn = self.lock()?;
        let changed = conn
            .execute(
                "UPDATE patient
                 SET name = ?1, date_of_birth = ?2, contact_info = ?3,
                     basic_medical_history = ?4, verified_by_admin = ?5
                 WHERE id = ?6",
                params![
                    fields.name,
                    fields.date_of_birth.to_string(),
                    fields.contact_info,
                    fields.basic_medical_history,
                    verified_by_admin,
                    id.as_i64(),
                ],
            )
            .map_err(|e| StoreError(e.to_string()))?;
        Ok(changed > 0)
    }

    fn delete_patient(&self, id: PatientId) -> Result<bool, StoreError> {
        let conn = self.lock()?;
        let changed = conn
            .execute("DELETE FROM patient WHERE id = ?1", params![id.as_i64()])
            .map_err(|e| StoreError(e.to_string()))?;
        Ok(changed > 0)
    }

    fn patient_exists(&self, id: PatientId) -> Result<bool, StoreError> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT 1 FROM patient WHERE id = ?1",
            params![id.as_i64()],
            |_| Ok(()),
        )
        .map(|()| true)
        .or_else(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => Ok(false),
            other => Err(StoreError(other.to_string())),
        })
    }

    fn create_appointment(&self, draft: &NewAppointment) -> Result<Appointment, StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO appointment (patient_id, date, time, doctor_name)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                draft.patient_id.as_i64(),
                draft.date.to_string(),
                draft.time.format("%H:%M:%S").to_string(),
                draft.doctor_name,
            ],
        )
        .map_err(|e| StoreError(e.to_string()))?;
        Ok(Appointment {
            id: AppointmentId::new(conn.last_insert_rowid()),
            patient_id: draft.patient_id,
            date: draft.date,
            time: draft.time,
            doctor_name: draft.doctor_name.clone(),
            internal_admin_notes: None,
        })
    }

    fn get_appointment(&self, id: AppointmentId) -> Result<Option<Appointment>, StoreError> {
        let conn = self.lock()?;
        conn.query_row(
            &format!("SELECT {APPOINTMENT_COLS} FROM appointment WHERE id = ?1"),
            params![id.as_i64()],
            appointment_from_row,
        )
        .map(Some)
        .or_else(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => Ok(None),
            other => Err(StoreError(other.to_string())),
        })
    }

    fn list_appointments(&self) -> Result<Vec<Appointment>, StoreError> {
        self.list_appointments_admin(None, None, None)
    }

    fn list_appointments_admin(
        &self,
        doctor_contains: Option<&str>,
        patient_contains: Option<&str>,
        on_date: Option<NaiveDate>,
    ) -> Result<Vec<Appointment>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT a.id, a.patient_id, a.date, a.time, a.doctor_name,
                        a.internal_admin_notes
                 FROM appointment a JOIN patient p ON p.id = a.patient_id
                 WHERE (?1 IS NULL OR a.doctor_name LIKE '%' || ?1 || '%' ESCAPE '\\')
                   AND (?2 IS NULL OR p.name LIKE '%' || ?2 || '%' ESCAPE '\\')
                   AND (?3 IS NULL OR a.date = ?3)
                 ORDER BY a.date, a.time, a.id",
            )
            .map_err(|e| StoreError(e.to_string()))?;
        let rows = stmt
            .query_map(
                params![
                    doctor_contains.map(escape_like),
                    patient_contains.map(escape_like),
                    on_date.map(|d| d.to_string()),
                ],
                appointment_from_row,
            )
            .map_err(|e| StoreError(e.to_string()))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError(e.to_string()))
    }

    fn update_appointment(
        &self,
        id: AppointmentId,
        fields: &NewAppointment,
    ) -> Result<bool, StoreError> {
        let conn = self.lock()?;
        let changed = conn
            .execute(
                "UPDATE appointment
                 SET patient_id = ?1, date = ?2, time = ?3, doctor_name = ?4
                 WHERE id = ?5",
                params![
                    fields.patient_id.as_i64(),
                    fields.date.to_string(),
                    fields.time.format("%H:%M:%S").to_string(),
                    fields.doctor_name,
                    id.as_i64(),
                ],
            )
            .map_err(|e| StoreError(e.to_string()))?;
        Ok(changed > 0)
    }

    fn update_appointment_admin(
        &self,
        id: AppointmentId,
        fields: &NewAppointment,
        internal_admin_notes: Option<&str>,
    ) -> Result<bool, StoreError> {
        let conn = self.lock()?;
        let changed = conn
            .execute(
                "UPDATE appointment
                 SET patient_id = ?1, date = ?2, time = ?3, doctor_name = ?4,
                     internal_admin_notes = ?5
                 WHERE id = ?6",
                params![
                    fields.patient_id.as_i64(),
                    fields.date.to_string(),
                    fields.time.format("%H:%M:%S").to_string(),
                    fields.doctor_name,
                    internal_admin_notes,
                    id.as_i64(),
                ],
            )
            .map_err(|e| StoreError(e.to_string()))?;
        Ok(changed > 0)
    }

    fn delete_appointment(&self, id: AppointmentId) -> Result<bool, StoreError> {
        let conn = self.lock()?;
        let changed = conn
            .execute(
                "DELETE FROM appointment WHERE id = ?1",
                params![id.as_i64()],
            )
            .map_err(|e| StoreError(e.to_string()))?;
        Ok(changed > 0)
    }

    fn bulk_insert_patients(
        &self,
        rows: &[(NewPatient, bool)],
    ) -> Result<Vec<PatientId>, StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(|e| StoreError(e.to_string()))?;
        let mut ids = Vec::with_capacity(rows.len());
        for (draft, verified) in rows {
            tx.execute(
                "INSERT INTO patient
                 (name, date_of_birth, contact_info, basic_medical_history, verified_by_admin)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    draft.name,
                    draft.date_of_birth.to_string(),
                    draft.contact_info,
                    draft.basic_medical_history,
                    verified,
                ],
            )
            .map_err(|e| StoreError(e.to_string()))?;
            ids.push(PatientId::new(tx.last_insert_rowid()));
        }
        tx.commit().map_err(|e| StoreError(e.to_string()))?;
        Ok(ids)
    }

    fn bulk_insert_appointments(&self, rows: &[NewAppointment]) -> Result<usize, StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(|e| StoreError(e.to_string()))?;
        for draft in rows {
            tx.execute(
                "INSERT INTO appointment (patient_id, date, time, doctor_name)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    draft.patient_id.as_i64(),
                    draft.date.to_string(),
                    draft.time.format("%H:%M:%S").to_string(),
                    draft.doctor_name,
                ],
            )
            .map_err(|e| StoreError(e.to_string()))?;
        }
        tx.commit().map_err(|e| StoreError(e.to_string()))?;
        Ok(rows.len())
    }
}
