//! Domain model for the account driving a request.

use super::birth_record::Author;

/// The authenticated account driving a request.
///
/// Identity and the admin flag come from the upstream identity provider and
/// are passed explicitly into every operation that needs them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub uid: String,
    pub display_name: String,
    pub email: String,
    pub is_admin: bool,
}

impl Actor {
    /// Attribution stamped onto records this actor creates
    pub fn as_author(&self) -> Author {
        Author {
            name: self.display_name.clone(),
            id: self.uid.clone(),
            email: self.email.clone(),
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::Actor;

    pub fn admin() -> Actor {
        Actor {
            uid: "uid-admin".to_string(),
            display_name: "Admin Registrar".to_string(),
            email: "admin@example.org".to_string(),
            is_admin: true,
        }
    }

    pub fn clerk() -> Actor {
        Actor {
            uid: "uid-clerk".to_string(),
            display_name: "Desk Clerk".to_string(),
            email: "clerk@example.org".to_string(),
            is_admin: false,
        }
    }
}
