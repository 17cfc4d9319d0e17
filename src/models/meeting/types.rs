use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::auth::validate;
use crate::errors::AppError;

/// Meeting category. Each category has its own unexcused-absence allowance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MeetingType {
    Regular,
    FullBody,
}

impl MeetingType {
    pub fn as_str(self) -> &'static str {
        match self {
            MeetingType::Regular => "REGULAR",
            MeetingType::FullBody => "FULL_BODY",
        }
    }
}

impl fmt::Display for MeetingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MeetingType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "REGULAR" => Ok(MeetingType::Regular),
            "FULL_BODY" => Ok(MeetingType::FullBody),
            other => Err(AppError::InvalidArgument(format!("unknown meeting type '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Meeting {
    pub id: i64,
    pub name: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub notes: String,
    #[serde(rename = "type")]
    pub meeting_type: MeetingType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated meeting fields, used for both create and update.
#[derive(Debug, Clone)]
pub struct NewMeeting {
    pub name: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub notes: String,
    pub meeting_type: MeetingType,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingPayload {
    pub name: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub notes: String,
    #[serde(rename = "type")]
    pub meeting_type: String,
}

impl MeetingPayload {
    /// Check every field and return the normalized meeting, or all problems at once.
    pub fn validate(&self) -> Result<NewMeeting, AppError> {
        let mut errors = Vec::new();
        errors.extend(validate::validate_required(&self.name, "Name", 200));
        errors.extend(validate::validate_optional(&self.notes, "Notes", 5000));

        let date = validate::parse_date(&self.date);
        if date.is_none() {
            errors.push(format!("Date must be YYYY-MM-DD, got '{}'", self.date));
        }
        let start = validate::parse_time(&self.start_time);
        if start.is_none() {
            errors.push(format!("Start time must be HH:MM, got '{}'", self.start_time));
        }
        let end = validate::parse_time(&self.end_time);
        if end.is_none() {
            errors.push(format!("End time must be HH:MM, got '{}'", self.end_time));
        }
        if let (Some(start), Some(end)) = (start, end) {
            if end <= start {
                errors.push("End time must be after start time".to_string());
            }
        }

        let meeting_type = match self.meeting_type.parse::<MeetingType>() {
            Ok(t) => Some(t),
            Err(e) => {
                errors.push(e.to_string());
                None
            }
        };

        validate::into_result(errors)?;
        let meeting_type = meeting_type
            .ok_or_else(|| AppError::InvalidArgument("meeting type is required".to_string()))?;

        Ok(NewMeeting {
            name: self.name.trim().to_string(),
            date: self.date.trim().to_string(),
            start_time: self.start_time.trim().to_string(),
            end_time: self.end_time.trim().to_string(),
            notes: self.notes.trim().to_string(),
            meeting_type,
        })
    }
}
