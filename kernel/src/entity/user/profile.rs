use destructure::Destructure;
use time::Date;
use vodca::References;

/// Contact details. Every field may be blank.
#[derive(Debug, Clone, Default, Eq, PartialEq, References, Destructure)]
pub struct UserProfile {
    first_name: String,
    last_name: String,
    phone_number: String,
    address: String,
    date_of_birth: Option<Date>,
}

impl UserProfile {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        phone_number: impl Into<String>,
        address: impl Into<String>,
        date_of_birth: Option<Date>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            phone_number: phone_number.into(),
            address: address.into(),
            date_of_birth,
        }
    }
}
