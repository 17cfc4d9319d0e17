//! Unexcused-absence quota.
//!
//! Every member may accrue a fixed number of unexcused absences per meeting
//! category. Only `UNEXCUSED_ABSENCE` rows count against the quota.

use serde::Serialize;
use sqlx::PgPool;

use crate::auth::validate;
use crate::errors::AppError;
use crate::models::meeting::MeetingType;
use crate::models::user;

pub const REGULAR_ALLOWANCE: u32 = 3;
pub const FULL_BODY_ALLOWANCE: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AbsenceBalance {
    pub used: u32,
    pub allowed: u32,
    /// Never negative: going over the allowance clamps to zero.
    pub remaining: u32,
}

impl AbsenceBalance {
    pub fn new(used: u32, allowed: u32) -> Self {
        AbsenceBalance {
            used,
            allowed,
            remaining: allowed.saturating_sub(used),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemainingAbsences {
    pub regular: AbsenceBalance,
    pub full_body: AbsenceBalance,
}

/// Count unexcused absences by meeting category and compare against the allowances.
pub fn tally<I>(unexcused: I) -> RemainingAbsences
where
    I: IntoIterator<Item = MeetingType>,
{
    let (mut regular, mut full_body) = (0u32, 0u32);
    for meeting_type in unexcused {
        match meeting_type {
            MeetingType::Regular => regular += 1,
            MeetingType::FullBody => full_body += 1,
        }
    }
    RemainingAbsences {
        regular: AbsenceBalance::new(regular, REGULAR_ALLOWANCE),
        full_body: AbsenceBalance::new(full_body, FULL_BODY_ALLOWANCE),
    }
}

/// Remaining excusable absences for the user named by `user_id`.
///
/// The identifier is validated before the store is touched.
pub async fn remaining_absences(pool: &PgPool, user_id: &str) -> Result<RemainingAbsences, AppError> {
    let user_id = validate::parse_id(user_id, "userId")?;

    user::find_by_id(pool, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {user_id}")))?;

    let types = super::unexcused_meeting_types(pool, user_id).await?;
    Ok(tally(types))
}
