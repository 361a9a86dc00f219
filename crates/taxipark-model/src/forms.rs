use crate::error::FieldErrors;
use crate::ids::{DriverId, ManufacturerId};
use crate::license::LicenseNumber;

pub const USERNAME_MAX_LEN: usize = 150;
pub const PASSWORD_MIN_LEN: usize = 8;

fn field(pairs: &[(String, String)], name: &str) -> String {
    pairs
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.trim().to_string())
        .unwrap_or_default()
}

fn fields(pairs: &[(String, String)], name: &str) -> Vec<String> {
    pairs
        .iter()
        .filter(|(k, _)| k == name)
        .map(|(_, v)| v.trim().to_string())
        .collect()
}

fn validate_username(username: &str, errors: &mut FieldErrors) {
    if username.is_empty() {
        errors.push("username", "username is required");
    } else if username.chars().count() > USERNAME_MAX_LEN {
        errors.push(
            "username",
            format!("username must be at most {USERNAME_MAX_LEN} characters"),
        );
    } else if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
    {
        errors.push(
            "username",
            "username may contain only letters, digits and @ . + - _",
        );
    }
}

/// New-driver form: explicit field list, no introspection. Password is
/// entered twice and must match; the license number is validated with the
/// same rule used on update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriverCreationForm {
    pub username: String,
    pub password1: String,
    pub password2: String,
    pub first_name: String,
    pub last_name: String,
    pub license_number: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverCreationData {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub license_number: LicenseNumber,
}

impl DriverCreationForm {
    pub const FIELDS: [&'static str; 6] = [
        "username",
        "password1",
        "password2",
        "first_name",
        "last_name",
        "license_number",
    ];

    #[must_use]
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        Self {
            username: field(pairs, "username"),
            password1: field(pairs, "password1"),
            password2: field(pairs, "password2"),
            first_name: field(pairs, "first_name"),
            last_name: field(pairs, "last_name"),
            license_number: field(pairs, "license_number"),
        }
    }

    pub fn validate(&self) -> Result<DriverCreationData, FieldErrors> {
        let mut errors = FieldErrors::new();
        validate_username(&self.username, &mut errors);
        if self.password1.chars().count() < PASSWORD_MIN_LEN {
            errors.push(
                "password1",
                format!("password must be at least {PASSWORD_MIN_LEN} characters"),
            );
        }
        if self.password1 != self.password2 {
            errors.push("password2", "passwords do not match");
        }
        let license = match LicenseNumber::parse(&self.license_number) {
            Ok(v) => Some(v),
            Err(e) => {
                errors.push("license_number", e.0);
                None
            }
        };
        errors.into_result()?;
        let license_number = license.ok_or_else(FieldErrors::new)?;
        Ok(DriverCreationData {
            username: self.username.clone(),
            password: self.password1.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            license_number,
        })
    }
}

/// Back-office driver edit: profile fields and license, no password change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriverChangeForm {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub license_number: String,
    pub is_superuser: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverChangeData {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub license_number: LicenseNumber,
    pub is_superuser: bool,
}

impl DriverChangeForm {
    pub const FIELDS: [&'static str; 5] = [
        "username",
        "first_name",
        "last_name",
        "license_number",
        "is_superuser",
    ];

    #[must_use]
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        Self {
            username: field(pairs, "username"),
            first_name: field(pairs, "first_name"),
            last_name: field(pairs, "last_name"),
            license_number: field(pairs, "license_number"),
            is_superuser: matches!(field(pairs, "is_superuser").as_str(), "1" | "on" | "true"),
        }
    }

    pub fn validate(&self) -> Result<DriverChangeData, FieldErrors> {
        let mut errors = FieldErrors::new();
        validate_username(&self.username, &mut errors);
        let license = match LicenseNumber::parse(&self.license_number) {
            Ok(v) => Some(v),
            Err(e) => {
                errors.push("license_number", e.0);
                None
            }
        };
        errors.into_result()?;
        let license_number = license.ok_or_else(FieldErrors::new)?;
        Ok(DriverChangeData {
            username: self.username.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            license_number,
            is_superuser: self.is_superuser,
        })
    }
}

/// License-only update: a valid submission changes nothing but the license
/// number.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriverLicenseUpdateForm {
    pub license_number: String,
}

impl DriverLicenseUpdateForm {
    pub const FIELDS: [&'static str; 1] = ["license_number"];

    #[must_use]
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        Self {
            license_number: field(pairs, "license_number"),
        }
    }

    pub fn validate(&self) -> Result<LicenseNumber, FieldErrors> {
        LicenseNumber::parse(&self.license_number)
            .map_err(|e| FieldErrors::single("license_number", e.0))
    }
}

/// Car form: model, one manufacturer, zero-or-more drivers. Driver ids keep
/// submission order; the stored association must read back in that order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CarForm {
    pub model: String,
    pub manufacturer: String,
    pub drivers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarData {
    pub model: String,
    pub manufacturer: ManufacturerId,
    pub drivers: Vec<DriverId>,
}

impl CarForm {
    pub const FIELDS: [&'static str; 3] = ["model", "manufacturer", "drivers"];

    #[must_use]
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        Self {
            model: field(pairs, "model"),
            manufacturer: field(pairs, "manufacturer"),
            drivers: fields(pairs, "drivers"),
        }
    }

    pub fn validate(&self) -> Result<CarData, FieldErrors> {
        let mut errors = FieldErrors::new();
        if self.model.is_empty() {
            errors.push("model", "model is required");
        }
        let manufacturer = match ManufacturerId::parse(&self.manufacturer) {
            Ok(v) => Some(v),
            Err(e) => {
                errors.push("manufacturer", e.0);
                None
            }
        };
        let mut drivers = Vec::with_capacity(self.drivers.len());
        for raw in &self.drivers {
            match DriverId::parse(raw) {
                // A repeated id is harmless; keep the first occurrence.
                Ok(v) if !drivers.contains(&v) => drivers.push(v),
                Ok(_) => {}
                Err(e) => errors.push("drivers", e.0),
            }
        }
        errors.into_result()?;
        let manufacturer = manufacturer.ok_or_else(FieldErrors::new)?;
        Ok(CarData {
            model: self.model.clone(),
            manufacturer,
            drivers,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManufacturerForm {
    pub name: String,
    pub country: String,
}

impl ManufacturerForm {
    pub const FIELDS: [&'static str; 2] = ["name", "country"];

    #[must_use]
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        Self {
            name: field(pairs, "name"),
            country: field(pairs, "country"),
        }
    }

    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        if self.name.is_empty() {
            errors.push("name", "name is required");
        }
        if self.country.is_empty() {
            errors.push("country", "country is required");
        }
        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn driver_creation_with_valid_data_yields_typed_record() {
        let form = DriverCreationForm::from_pairs(&pairs(&[
            ("username", "driver1"),
            ("password1", "pass12345"),
            ("password2", "pass12345"),
            ("license_number", "ABC12345"),
            ("first_name", "John"),
            ("last_name", "Doe"),
        ]));
        let data = form.validate().expect("form should validate");
        assert_eq!(data.username, "driver1");
        assert_eq!(data.license_number.as_str(), "ABC12345");
        assert_eq!(data.first_name, "John");
        assert_eq!(data.last_name, "Doe");
    }

    #[test]
    fn driver_creation_rejects_bad_license_on_that_field() {
        let form = DriverCreationForm::from_pairs(&pairs(&[
            ("username", "driver2"),
            ("password1", "pass12345"),
            ("password2", "pass12345"),
            ("license_number", "WRONG123"),
        ]));
        let errors = form.validate().expect_err("license must be rejected");
        assert!(errors.contains("license_number"));
        assert!(!errors.contains("username"));
    }

    #[test]
    fn driver_creation_rejects_mismatched_passwords() {
        let form = DriverCreationForm::from_pairs(&pairs(&[
            ("username", "driver3"),
            ("password1", "pass12345"),
            ("password2", "different1"),
            ("license_number", "ABC12345"),
        ]));
        let errors = form.validate().expect_err("mismatch must be rejected");
        assert!(errors.contains("password2"));
    }

    #[test]
    fn license_update_accepts_valid_and_rejects_invalid() {
        let ok = DriverLicenseUpdateForm {
            license_number: "DEF67890".to_string(),
        };
        assert_eq!(
            ok.validate().map(|l| l.to_string()),
            Ok("DEF67890".to_string())
        );

        let bad = DriverLicenseUpdateForm {
            license_number: "BAD".to_string(),
        };
        let errors = bad.validate().expect_err("short license must fail");
        assert!(errors.contains("license_number"));
    }

    #[test]
    fn car_form_preserves_driver_submission_order() {
        let form = CarForm::from_pairs(&pairs(&[
            ("model", "X5"),
            ("manufacturer", "1"),
            ("drivers", "7"),
            ("drivers", "3"),
            ("drivers", "5"),
        ]));
        let data = form.validate().expect("car form should validate");
        assert_eq!(
            data.drivers,
            vec![DriverId(7), DriverId(3), DriverId(5)]
        );
    }

    #[test]
    fn car_form_drops_repeated_driver_ids() {
        let form = CarForm::from_pairs(&pairs(&[
            ("model", "X5"),
            ("manufacturer", "1"),
            ("drivers", "7"),
            ("drivers", "3"),
            ("drivers", "7"),
        ]));
        let data = form.validate().expect("car form should validate");
        assert_eq!(data.drivers, vec![DriverId(7), DriverId(3)]);
    }

    #[test]
    fn car_form_allows_zero_drivers() {
        let form = CarForm::from_pairs(&pairs(&[("model", "A4"), ("manufacturer", "2")]));
        let data = form.validate().expect("driverless car is valid");
        assert!(data.drivers.is_empty());
    }

    #[test]
    fn car_form_requires_model_and_manufacturer() {
        let form = CarForm::from_pairs(&pairs(&[("drivers", "1")]));
        let errors = form.validate().expect_err("missing fields must fail");
        assert!(errors.contains("model"));
        assert!(errors.contains("manufacturer"));
    }
}
