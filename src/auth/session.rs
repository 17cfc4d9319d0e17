use actix_session::Session;

use crate::errors::AppError;
use crate::models::role::Role;
use crate::models::user::User;

const USER_ID_KEY: &str = "user_id";
const ROLE_KEY: &str = "role";

/// The signed-in member, as recorded in the session cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: i64,
    pub role: Role,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Board members may act on anyone; members only on themselves.
    pub fn require_self_or_admin(&self, user_id: i64) -> Result<(), AppError> {
        if self.is_admin() || self.id == user_id {
            Ok(())
        } else {
            Err(AppError::PermissionDenied(format!(
                "user {} may not act on user {user_id}",
                self.id
            )))
        }
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::PermissionDenied(Role::Eboard.to_string()))
        }
    }
}

pub fn sign_in(session: &Session, user: &User) -> Result<(), AppError> {
    session.renew();
    session
        .insert(USER_ID_KEY, user.id)
        .and_then(|_| session.insert(ROLE_KEY, user.role.as_str()))
        .map_err(|e| AppError::Session(format!("Failed to write session: {e}")))
}

pub fn get_user_id(session: &Session) -> Option<i64> {
    session.get::<i64>(USER_ID_KEY).unwrap_or(None)
}

/// Read the signed-in user; `Session` error if there is none.
pub fn current_user(session: &Session) -> Result<CurrentUser, AppError> {
    let id = get_user_id(session).ok_or_else(|| AppError::Session("Not authenticated".to_string()))?;
    let role = session
        .get::<String>(ROLE_KEY)
        .map_err(|e| AppError::Session(format!("Session error: {e}")))?
        .ok_or_else(|| AppError::Session("No role in session".to_string()))?
        .parse::<Role>()
        .map_err(|_| AppError::Session("Unknown role in session".to_string()))?;
    Ok(CurrentUser { id, role })
}

/// Check for a board member; returns the signed-in user on success.
pub fn require_admin(session: &Session) -> Result<CurrentUser, AppError> {
    let user = current_user(session)?;
    user.require_admin()?;
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn member_may_only_act_on_self() {
        let me = CurrentUser { id: 5, role: Role::Member };
        assert!(me.require_self_or_admin(5).is_ok());
        assert!(matches!(me.require_self_or_admin(6), Err(AppError::PermissionDenied(_))));
        assert!(me.require_admin().is_err());
    }

    #[test]
    fn board_may_act_on_anyone() {
        let admin = CurrentUser { id: 1, role: Role::Eboard };
        assert!(admin.require_self_or_admin(99).is_ok());
        assert!(admin.require_admin().is_ok());
    }
}
