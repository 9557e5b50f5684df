#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash)]
pub enum UserRole {
    #[default]
    Member,
    Staff,
}

impl UserRole {
    pub fn is_staff(&self) -> bool {
        matches!(self, UserRole::Staff)
    }
}

impl From<bool> for UserRole {
    fn from(is_staff: bool) -> Self {
        if is_staff {
            UserRole::Staff
        } else {
            UserRole::Member
        }
    }
}
