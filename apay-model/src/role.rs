use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use crate::error::ModelError;

/// Closed set of principal kinds. Each role owns one panel of the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Role {
    /// Church administrator: modules, products and QR accounts
    #[cfg_attr(feature = "serde", serde(rename = "admin"))]
    Admin,
    /// Sales module / kiosk that charges QR accounts
    #[cfg_attr(feature = "serde", serde(rename = "modulo", alias = "module"))]
    Module,
    /// Bank / teller that activates and recharges QR accounts
    #[cfg_attr(feature = "serde", serde(rename = "banco", alias = "bank"))]
    Bank,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Module, Role::Bank];

    /// Name used by the backend for this role.
    pub fn as_wire(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Module => "modulo",
            Role::Bank => "banco",
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

impl FromStr for Role {
    type Err = ModelError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "modulo" | "module" => Ok(Role::Module),
            "banco" | "bank" => Ok(Role::Bank),
            _ => Err(ModelError::UnknownRole(raw.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wire_names_and_aliases() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("modulo".parse::<Role>().unwrap(), Role::Module);
        assert_eq!("Module".parse::<Role>().unwrap(), Role::Module);
        assert_eq!("banco".parse::<Role>().unwrap(), Role::Bank);
        assert_eq!("bank".parse::<Role>().unwrap(), Role::Bank);
    }

    #[test]
    fn rejects_roles_outside_the_enum() {
        let err = "tienda".parse::<Role>().unwrap_err();
        assert_eq!(err, ModelError::UnknownRole("tienda".into()));
    }

    #[test]
    fn display_uses_wire_name() {
        let names: Vec<String> = Role::ALL.iter().map(|r| r.to_string()).collect();
        assert_eq!(names, ["admin", "modulo", "banco"]);
    }
}
