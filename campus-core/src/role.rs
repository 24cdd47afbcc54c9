//! Portal roles and acting users

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A role held by a portal user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// System administrator
    Admin,
    /// General administration office, first reviewer of letters
    AdminUmum,
    /// Vice dean for academic affairs (Wakil Dekan 1)
    Wd1,
    /// Dean
    Dean,
    /// Finance administrator
    FinanceAdmin,
    /// Quality assurance unit (Gugus Kendali Mutu)
    Gkm,
    /// Laboratory administrator
    LabAdmin,
    /// Student
    Student,
    /// Lecturer
    Lecturer,
}

impl Role {
    /// Every role, in display order
    pub const ALL: [Role; 9] = [
        Role::Admin,
        Role::AdminUmum,
        Role::Wd1,
        Role::Dean,
        Role::FinanceAdmin,
        Role::Gkm,
        Role::LabAdmin,
        Role::Student,
        Role::Lecturer,
    ];

    /// Stored name of the role
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::AdminUmum => "admin_umum",
            Role::Wd1 => "wd1",
            Role::Dean => "dean",
            Role::FinanceAdmin => "finance_admin",
            Role::Gkm => "gkm",
            Role::LabAdmin => "lab_admin",
            Role::Student => "student",
            Role::Lecturer => "lecturer",
        }
    }

    /// Human-readable title
    pub fn description(&self) -> &'static str {
        match self {
            Role::Admin => "System administrator",
            Role::AdminUmum => "General administration",
            Role::Wd1 => "Vice dean (academic)",
            Role::Dean => "Dean",
            Role::FinanceAdmin => "Finance administrator",
            Role::Gkm => "Quality assurance",
            Role::LabAdmin => "Laboratory administrator",
            Role::Student => "Student",
            Role::Lecturer => "Lecturer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Role::ALL
            .iter()
            .copied()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| Error::InvalidInput(format!("Unknown role: {}", s)))
    }
}

/// A user acting on a letter request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// User ID
    pub id: i64,
    /// The user's role
    pub role: Role,
}

impl Actor {
    /// Create a new actor
    pub fn new(id: i64, role: Role) -> Self {
        Self { id, role }
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "user {} ({})", self.id, self.role)
    }
}
