use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Student => write!(f, "student"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

impl FromStr for Role {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "student" => Ok(Role::Student),
            "admin" => Ok(Role::Admin),
            other => anyhow::bail!("unknown role: {}", other),
        }
    }
}

/// Who is acting. There is no credential check, picking a role logs in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    login: Option<(String, Role)>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn student(name: &str) -> Self {
        let mut session = Self::default();
        session.login(Role::Student, name);
        session
    }

    pub fn admin(name: &str) -> Self {
        let mut session = Self::default();
        session.login(Role::Admin, name);
        session
    }

    pub fn login(&mut self, role: Role, name: &str) {
        let name = match name.trim() {
            "" => role.to_string(),
            name => name.to_string(),
        };
        info!("{} logged in as {}", name, role);
        self.login = Some((name, role));
    }

    pub fn logout(&mut self) {
        if let Some((name, _)) = self.login.take() {
            info!("{} logged out", name);
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.login.is_some()
    }

    pub fn role(&self) -> Option<Role> {
        self.login.as_ref().map(|(_, role)| *role)
    }

    pub fn name(&self) -> Option<&str> {
        self.login.as_ref().map(|(name, _)| name.as_str())
    }

    /// Learner name of a logged-in student.
    pub fn require_student(&self) -> Result<&str> {
        match &self.login {
            Some((name, Role::Student)) => Ok(name.as_str()),
            _ => Err(Error::Unauthorized),
        }
    }

    pub fn require_admin(&self) -> Result<&str> {
        match &self.login {
            Some((name, Role::Admin)) => Ok(name.as_str()),
            _ => Err(Error::Unauthorized),
        }
    }

    /// Name of any logged-in user.
    pub fn require_login(&self) -> Result<(&str, Role)> {
        self.login
            .as_ref()
            .map(|(name, role)| (name.as_str(), *role))
            .ok_or(Error::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_gate_actions() {
        let anonymous = Session::anonymous();
        assert!(matches!(anonymous.require_student(), Err(Error::Unauthorized)));
        assert!(matches!(anonymous.require_login(), Err(Error::Unauthorized)));

        let student = Session::student("alice");
        assert_eq!(student.require_student().unwrap(), "alice");
        assert!(student.require_admin().is_err());

        let admin = Session::admin("root");
        assert!(admin.require_student().is_err());
        assert_eq!(admin.require_admin().unwrap(), "root");
    }

    #[test]
    fn empty_name_falls_back_to_role() {
        let mut session = Session::anonymous();
        session.login(Role::Student, "  ");
        assert_eq!(session.name(), Some("student"));
        session.logout();
        assert!(!session.is_logged_in());
        assert_eq!(session.role(), None);
    }

    #[test]
    fn parse_role() {
        assert_eq!("Admin".parse::<Role>().unwrap(), Role::Admin);
        assert!("tutor".parse::<Role>().is_err());
    }
}
