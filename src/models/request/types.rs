use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::auth::validate;
use crate::errors::AppError;
use crate::models::attendance::AttendanceStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttendanceMode {
    Online,
    InPerson,
}

impl AttendanceMode {
    pub fn as_str(self) -> &'static str {
        match self {
            AttendanceMode::Online => "ONLINE",
            AttendanceMode::InPerson => "IN_PERSON",
        }
    }
}

impl FromStr for AttendanceMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ONLINE" => Ok(AttendanceMode::Online),
            "IN_PERSON" => Ok(AttendanceMode::InPerson),
            other => Err(AppError::InvalidArgument(format!("unknown attendance mode '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimeAdjustment {
    ArrivingLate,
    LeavingEarly,
}

impl TimeAdjustment {
    pub fn as_str(self) -> &'static str {
        match self {
            TimeAdjustment::ArrivingLate => "ARRIVING_LATE",
            TimeAdjustment::LeavingEarly => "LEAVING_EARLY",
        }
    }
}

impl FromStr for TimeAdjustment {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ARRIVING_LATE" => Ok(TimeAdjustment::ArrivingLate),
            "LEAVING_EARLY" => Ok(TimeAdjustment::LeavingEarly),
            other => Err(AppError::InvalidArgument(format!("unknown time adjustment '{other}'"))),
        }
    }
}

/// Admin outcome for a pending request. Recorded on the linked attendance row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    pub fn from_approve(approve: bool) -> Self {
        if approve { Decision::Approve } else { Decision::Reject }
    }

    pub fn outcome(self) -> AttendanceStatus {
        match self {
            Decision::Approve => AttendanceStatus::ExcusedAbsence,
            Decision::Reject => AttendanceStatus::UnexcusedAbsence,
        }
    }
}

/// An absence/schedule request with its attendance context.
///
/// `status` is the linked attendance status; the request itself has none.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub id: i64,
    pub attendance_id: i64,
    pub user_id: i64,
    pub user_name: String,
    pub meeting_id: i64,
    pub meeting_name: String,
    pub meeting_date: String,
    pub reason: String,
    pub attendance_mode: AttendanceMode,
    pub time_adjustment: Option<TimeAdjustment>,
    pub is_late: bool,
    pub status: AttendanceStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated member-editable request fields.
#[derive(Debug, Clone)]
pub struct RequestFields {
    pub reason: String,
    pub attendance_mode: AttendanceMode,
    pub time_adjustment: Option<TimeAdjustment>,
}

/// Create/update request body. Update replaces all three fields;
/// `isLate` is fixed at creation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestPayload {
    pub reason: String,
    pub attendance_mode: String,
    #[serde(default)]
    pub time_adjustment: Option<String>,
}

impl RequestPayload {
    pub fn validate(&self) -> Result<RequestFields, AppError> {
        let mut errors = Vec::new();
        errors.extend(validate::validate_required(&self.reason, "Reason", 2000));

        let attendance_mode = self
            .attendance_mode
            .parse::<AttendanceMode>()
            .map_err(|e| errors.push(e.to_string()))
            .ok();
        let time_adjustment = match self.time_adjustment.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(s) => s
                .parse::<TimeAdjustment>()
                .map_err(|e| errors.push(e.to_string()))
                .ok(),
        };

        validate::into_result(errors)?;
        let attendance_mode = attendance_mode
            .ok_or_else(|| AppError::InvalidArgument("attendanceMode is required".to_string()))?;

        Ok(RequestFields {
            reason: self.reason.trim().to_string(),
            attendance_mode,
            time_adjustment,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct DecisionPayload {
    pub approve: bool,
}
