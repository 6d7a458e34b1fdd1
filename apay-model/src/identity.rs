use crate::ids::ChurchId;
use crate::role::Role;

/// The authenticated principal as returned by the backend and persisted
/// by the session store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Identity {
    #[cfg_attr(feature = "serde", serde(rename = "usuario"))]
    pub username: String,
    #[cfg_attr(feature = "serde", serde(rename = "rol"))]
    pub role: Role,
    #[cfg_attr(feature = "serde", serde(rename = "nombreResponsable"))]
    pub responsible_name: String,
    #[cfg_attr(feature = "serde", serde(rename = "idIglesia"))]
    pub church_id: ChurchId,
}

impl Identity {
    pub fn new(
        username: impl Into<String>,
        role: Role,
        responsible_name: impl Into<String>,
        church_id: ChurchId,
    ) -> Self {
        Self {
            username: username.into(),
            role,
            responsible_name: responsible_name.into(),
            church_id,
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.role == role
    }
}
