use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::AppError;

/// Organization role. `Eboard` members are the administrators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Member,
    Eboard,
}

impl Role {
    pub const ALL: [Role; 2] = [Role::Member, Role::Eboard];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Member => "MEMBER",
            Role::Eboard => "EBOARD",
        }
    }

    pub fn is_admin(self) -> bool {
        self == Role::Eboard
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MEMBER" => Ok(Role::Member),
            "EBOARD" => Ok(Role::Eboard),
            other => Err(AppError::InvalidArgument(format!("unknown role '{other}'"))),
        }
    }
}
