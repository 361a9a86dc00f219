use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use crate::error::ValidationError;

macro_rules! record_id {
    ($name:ident, $label:literal) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            pub fn parse(input: &str) -> Result<Self, ValidationError> {
                let s = input.trim();
                s.parse::<i64>()
                    .ok()
                    .filter(|v| *v > 0)
                    .map(Self)
                    .ok_or_else(|| {
                        ValidationError(format!("{} id must be a positive integer", $label))
                    })
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

record_id!(ManufacturerId, "manufacturer");
record_id!(DriverId, "driver");
record_id!(CarId, "car");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_positive_integers() {
        assert_eq!(DriverId::parse("7"), Ok(DriverId(7)));
        assert_eq!(ManufacturerId::parse(" 12 "), Ok(ManufacturerId(12)));
    }

    #[test]
    fn rejects_zero_negative_and_garbage() {
        assert!(CarId::parse("0").is_err());
        assert!(CarId::parse("-3").is_err());
        assert!(CarId::parse("abc").is_err());
        assert!(CarId::parse("").is_err());
    }
}
