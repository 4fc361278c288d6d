// SPDX-License-Identifier: Apache-2.0

use crate::patient::{ParseError, PatientId};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub const DOCTOR_NAME_MAX_LEN: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppointmentId(i64);

impl AppointmentId {
    #[must_use]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let raw = input
            .trim()
            .parse::<i64>()
            .map_err(|_| ParseError::InvalidId("appointment id"))?;
        if raw <= 0 {
            return Err(ParseError::InvalidId("appointment id"));
        }
        Ok(Self(raw))
    }

    #[must_use]
    pub const fn as_i64(self) -> i64 {
        self.0
    }
}

impl Display for AppointmentId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A stored appointment row. The `patient_id` reference must always resolve
/// to a live patient; deleting the patient deletes the appointment.
/// `internal_admin_notes` is writable only through the administrative surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Appointment {
    pub id: AppointmentId,
    pub patient_id: PatientId,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub doctor_name: String,
    pub internal_admin_notes: Option<String>,
}

impl Appointment {
    /// Listing order key: `(date, time)` ascending, id as tiebreak.
    #[must_use]
    pub fn schedule_key(&self) -> (NaiveDate, NaiveTime, AppointmentId) {
        (self.date, self.time, self.id)
    }
}

/// The non-privileged field set accepted by the standard create/update paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewAppointment {
    pub patient_id: PatientId,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub doctor_name: String,
}

impl NewAppointment {
    pub fn validate(&self) -> Result<(), ParseError> {
        if self.doctor_name.trim().is_empty() {
            return Err(ParseError::Empty("doctor_name"));
        }
        if self.doctor_name.chars().count() > DOCTOR_NAME_MAX_LEN {
            return Err(ParseError::TooLong("doctor_name", DOCTOR_NAME_MAX_LEN));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn appt(day: u32, hour: u32, id: i64) -> Appointment {
        Appointment {
            id: AppointmentId::new(id),
            patient_id: PatientId::new(1),
            date: NaiveDate::from_ymd_opt(2024, 12, day).expect("date"),
            time: NaiveTime::from_hms_opt(hour, 0, 0).expect("time"),
            doctor_name: "Dr. Smith".to_string(),
            internal_admin_notes: None,
        }
    }

    #[test]
    fn schedule_key_orders_by_date_then_time() {
        let mut rows = vec![appt(20, 9, 1), appt(15, 14, 2), appt(15, 10, 3)];
        rows.sort_by_key(Appointment::schedule_key);
        let ids: Vec<i64> = rows.iter().map(|a| a.id.as_i64()).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[test]
    fn new_appointment_validate_requires_doctor_name() {
        let a = NewAppointment {
            patient_id: PatientId::new(1),
            date: NaiveDate::from_ymd_opt(2024, 12, 15).expect("date"),
            time: NaiveTime::from_hms_opt(10, 0, 0).expect("time"),
            doctor_name: String::new(),
        };
        assert!(a.validate().is_err());
    }
}
