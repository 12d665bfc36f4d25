#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Role {
    Superuser = 1,
    Admin = 2,
    Employee = 3,
}

impl Role {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::Superuser),
            2 => Some(Role::Admin),
            3 => Some(Role::Employee),
            _ => None,
        }
    }

    /// Admin capability covers both staff admins and superusers.
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Superuser | Role::Admin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_capability() {
        assert!(Role::Superuser.is_admin());
        assert!(Role::Admin.is_admin());
        assert!(!Role::Employee.is_admin());
        assert!(Role::from_id(9).is_none());
    }
}
