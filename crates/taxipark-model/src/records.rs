use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use crate::ids::{CarId, DriverId, ManufacturerId};
use crate::license::LicenseNumber;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manufacturer {
    pub id: ManufacturerId,
    pub name: String,
    pub country: String,
}

impl Display for Manufacturer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.name, self.country)
    }
}

/// A driver is both a domain record and an access-control principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Driver {
    pub id: DriverId,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub license_number: LicenseNumber,
    pub is_superuser: bool,
}

impl Display for Driver {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({} {})",
            self.username, self.first_name, self.last_name
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Car {
    pub id: CarId,
    pub model: String,
    pub manufacturer_id: ManufacturerId,
}

impl Display for Car {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.model)
    }
}

/// Car joined with its manufacturer and drivers, drivers in the order they
/// were assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarDetail {
    pub car: Car,
    pub manufacturer: Manufacturer,
    pub drivers: Vec<Driver>,
}

/// Driver joined with the cars they operate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverDetail {
    pub driver: Driver,
    pub cars: Vec<Car>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manufacturer_displays_name_then_country() {
        let m = Manufacturer {
            id: ManufacturerId(1),
            name: "Toyota".to_string(),
            country: "Japan".to_string(),
        };
        assert_eq!(m.to_string(), "Toyota Japan");
    }

    #[test]
    fn driver_displays_username_and_full_name() {
        let d = Driver {
            id: DriverId(1),
            username: "driver1".to_string(),
            first_name: "John".to_string(),
            last_name: "Doe".to_string(),
            license_number: LicenseNumber::parse("ABC12345").expect("valid license"),
            is_superuser: false,
        };
        assert_eq!(d.to_string(), "driver1 (John Doe)");
    }

    #[test]
    fn car_displays_model() {
        let c = Car {
            id: CarId(1),
            model: "X5".to_string(),
            manufacturer_id: ManufacturerId(1),
        };
        assert_eq!(c.to_string(), "X5");
    }
}
