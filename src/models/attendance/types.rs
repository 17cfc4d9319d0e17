use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::AppError;
use crate::models::meeting::MeetingType;

/// Presence state of one user at one meeting.
///
/// Any state may be set from any other; only the vocabulary is enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttendanceStatus {
    Present,
    ExcusedAbsence,
    UnexcusedAbsence,
    Pending,
}

impl AttendanceStatus {
    pub const ALL: [AttendanceStatus; 4] = [
        AttendanceStatus::Present,
        AttendanceStatus::ExcusedAbsence,
        AttendanceStatus::UnexcusedAbsence,
        AttendanceStatus::Pending,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AttendanceStatus::Present => "PRESENT",
            AttendanceStatus::ExcusedAbsence => "EXCUSED_ABSENCE",
            AttendanceStatus::UnexcusedAbsence => "UNEXCUSED_ABSENCE",
            AttendanceStatus::Pending => "PENDING",
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttendanceStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AttendanceStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| AppError::InvalidStatus(s.to_string()))
    }
}

/// Attendance row joined with the names a list view needs.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Attendance {
    pub id: i64,
    pub user_id: i64,
    pub meeting_id: i64,
    pub status: AttendanceStatus,
    pub user_name: String,
    pub meeting_name: String,
    pub meeting_date: String,
    pub meeting_type: MeetingType,
    pub has_request: bool,
    pub updated_at: DateTime<Utc>,
}

/// Optional list filters; `None` means "any".
#[derive(Debug, Clone, Copy, Default)]
pub struct AttendanceFilter {
    pub user_id: Option<i64>,
    pub meeting_id: Option<i64>,
}

/// Body of `PATCH /api/attendance/{id}`.
#[derive(Debug, Deserialize)]
pub struct StatusPayload {
    pub status: String,
}

/// Body of `PUT /api/attendance/status`: set the status for a (user, meeting) pair.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairStatusPayload {
    pub user_id: i64,
    pub meeting_id: i64,
    pub status: String,
}
