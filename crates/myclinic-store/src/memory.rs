// SPDX-License-Identifier: Apache-2.0

use crate::{ClinicStore, StoreError};
use chrono::NaiveDate;
use myclinic_model::{
    Appointment, AppointmentId, NewAppointment, NewPatient, Patient, PatientId,
};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct Inner {
    patients: BTreeMap<i64, Patient>,
    appointments: BTreeMap<i64, Appointment>,
    next_patient_id: i64,
    next_appointment_id: i64,
}

/// In-memory store with the same contract as [`crate::SqliteStore`],
/// including the patient-to-appointment cascade. Used by tests and as a
/// throwaway backend.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError("store mutex poisoned".to_string()))
    }
}

fn name_matches(name: &str, needle: Option<&str>) -> bool {
    match needle {
        None => true,
        Some(q) => name.to_lowercase().contains(&q.to_lowercase()),
    }
}

impl ClinicStore for MemoryStore {
    fn create_patient(&self, draft: &NewPatient) -> Result<Patient, StoreError> {
        let mut inner = self.lock()?;
        inner.next_patient_id += 1;
        let patient = Patient {
            id: PatientId::new(inner.next_patient_id),
            name: draft.name.clone(),
            date_of_birth: draft.date_of_birth,
            contact_info: draft.contact_info.clone(),
            basic_medical_history: draft.basic_medical_history.clone(),
            verified_by_admin: false,
        };
        inner.patients.insert(patient.id.as_i64(), patient.clone());
        Ok(patient)
    }

    fn get_patient(&self, id: PatientId) -> Result<Option<Patient>, StoreError> {
        Ok(self.lock()?.patients.get(&id.as_i64()).cloned())
    }

    fn list_patients(&self, name_contains: Option<&str>) -> Result<Vec<Patient>, StoreError> {
        self.list_patients_admin(name_contains, None)
    }

    fn list_patients_admin(
        &self,
        name_contains: Option<&str>,
        verified: Option<bool>,
    ) -> Result<Vec<Patient>, StoreError> {
        let inner = self.lock()?;
        Ok(inner
            .patients
            .values()
            .filter(|p| name_matches(&p.name, name_contains))
            .filter(|p| verified.is_none_or(|v| p.verified_by_admin == v))
            .cloned()
            .collect())
    }

    fn update_patient(&self, id: PatientId, fields: &NewPatient) -> Result<bool, StoreError> {
        let mut inner = self.lock()?;
        match inner.patients.get_mut(&id.as_i64()) {
            Some(patient) => {
                patient.name = fields.name.clone();
                patient.date_of_birth = fields.date_of_birth;
                patient.contact_info = fields.contact_info.clone();
                patient.basic_medical_history = fields.basic_medical_history.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn update_patient_admin(
        &self,
        id: PatientId,
        fields: &NewPatient,
        verified_by_admin: bool,
    ) -> Result<bool, StoreError> {
        let updated = self.update_patient(id, fields)?;
        if updated {
            let mut inner = self.lock()?;
            if let Some(patient) = inner.patients.get_mut(&id.as_i64()) {
                patient.verified_by_admin = verified_by_admin;
            }
        }
        Ok(updated)
    }

    fn delete_patient(&self, id: PatientId) -> Result<bool, StoreError> {
        let mut inner = self.lock()?;
        if inner.patients.remove(&id.as_i64()).is_none() {
            return Ok(false);
        }
        inner.appointments.retain(|_, a| a.patient_id != id);
        Ok(true)
    }

    fn patient_exists(&self, id: PatientId) -> Result<bool, StoreError> {
        Ok(self.lock()?.patients.contains_key(&id.as_i64()))
    }

    fn create_appointment(&self, draft: &NewAppointment) -> Result<Appointment, StoreError> {
        let mut inner = self.lock()?;
        if !inner.patients.contains_key(&draft.patient_id.as_i64()) {
            return Err(StoreError(format!(
                "foreign key violation: no patient {}",
                draft.patient_id
            )));
        }
        inner.next_appointment_id += 1;
        let appointment = Appointment {
            id: AppointmentId::new(inner.next_appointment_id),
            patient_id: draft.patient_id,
            date: draft.date,
            time: draft.time,
            doctor_name: draft.doctor_name.clone(),
            internal_admin_notes: None,
        };
        inner
            .appointments
            .insert(appointment.id.as_i64(), appointment.clone());
        Ok(appointment)
    }

    fn get_appointment(&self, id: AppointmentId) -> Result<Option<Appointment>, StoreError> {
        Ok(self.lock()?.appointments.get(&id.as_i64()).cloned())
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
        let inner = self.lock()?;
        let mut rows: Vec<Appointment> = inner
            .appointments
            .values()
            .filter(|a| name_matches(&a.doctor_name, doctor_contains))
            .filter(|a| match patient_contains {
                None => true,
                Some(q) => inner
                    .patients
                    .get(&a.patient_id.as_i64())
                    .is_some_and(|p| name_matches(&p.name, Some(q))),
            })
            .filter(|a| on_date.is_none_or(|d| a.date == d))
            .cloned()
            .collect();
        rows.sort_by_key(Appointment::schedule_key);
        Ok(rows)
    }

    fn update_appointment(
        &self,
        id: AppointmentId,
        fields: &NewAppointment,
    ) -> Result<bool, StoreError> {
        let mut inner = self.lock()?;
        if !inner.patients.contains_key(&fields.patient_id.as_i64()) {
            return Err(StoreError(format!(
                "foreign key violation: no patient {}",
                fields.patient_id
            )));
        }
        match inner.appointments.get_mut(&id.as_i64()) {
            Some(appointment) => {
                appointment.patient_id = fields.patient_id;
                appointment.date = fields.date;
                appointment.time = fields.time;
                appointment.doctor_name = fields.doctor_name.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn update_appointment_admin(
        &self,
        id: AppointmentId,
        fields: &NewAppointment,
        internal_admin_notes: Option<&str>,
    ) -> Result<bool, StoreError> {
        let updated = self.update_appointment(id, fields)?;
        if updated {
            let mut inner = self.lock()?;
            if let Some(appointment) = inner.appointments.get_mut(&id.as_i64()) {
                appointment.internal_admin_notes = internal_admin_notes.map(str::to_string);
            }
        }
        Ok(updated)
    }

    fn delete_appointment(&self, id: AppointmentId) -> Result<bool, StoreError> {
        Ok(self.lock()?.appointments.remove(&id.as_i64()).is_some())
    }

    fn bulk_insert_patients(
        &self,
        rows: &[(NewPatient, bool)],
    ) -> Result<Vec<PatientId>, StoreError> {
        let mut ids = Vec::with_capacity(rows.len());
        for (draft, verified) in rows {
            let patient = self.create_patient(draft)?;
            if *verified {
                let mut inner = self.lock()?;
                if let Some(p) = inner.patients.get_mut(&patient.id.as_i64()) {
                    p.verified_by_admin = true;
                }
            }
            ids.push(patient.id);
        }
        Ok(ids)
    }

    fn bulk_insert_appointments(&self, rows: &[NewAppointment]) -> Result<usize, StoreError> {
        for draft in rows {
            self.create_appointment(draft)?;
        }
        Ok(rows.len())
    }
}
