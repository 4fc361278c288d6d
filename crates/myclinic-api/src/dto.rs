// SPDX-License-Identifier: Apache-2.0

//! Response shapes for the standard (non-administrative) surface. Privileged
//! fields are absent here by construction; only the admin handlers serialize
//! the full records.

use chrono::{NaiveDate, NaiveTime};
use myclinic_model::{Appointment, AppointmentId, Patient, PatientId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatientPublic {
    pub id: PatientId,
    pub name: String,
    pub date_of_birth: NaiveDate,
    pub contact_info: Option<String>,
    pub basic_medical_history: Option<String>,
}

impl From<&Patient> for PatientPublic {
    fn from(p: &Patient) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            date_of_birth: p.date_of_birth,
            contact_info: p.contact_info.clone(),
            basic_medical_history: p.basic_medical_history.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppointmentPublic {
    pub id: AppointmentId,
    pub patient: PatientId,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub doctor_name: String,
}

impl From<&Appointment> for AppointmentPublic {
    fn from(a: &Appointment) -> Self {
        Self {
            id: a.id,
            patient: a.patient_id,
            date: a.date,
            time: a.time,
            doctor_name: a.doctor_name.clone(),
        }
    }
}
