#![forbid(unsafe_code)]

pub const CRATE_NAME: &str = "taxipark-model";

mod error;
mod forms;
mod ids;
mod license;
mod records;

pub use error::{FieldErrors, ValidationError};
pub use forms::{
    CarData, CarForm, DriverChangeData, DriverChangeForm, DriverCreationData, DriverCreationForm,
    DriverLicenseUpdateForm, ManufacturerForm, PASSWORD_MIN_LEN, USERNAME_MAX_LEN,
};
pub use ids::{CarId, DriverId, ManufacturerId};
pub use license::{LicenseNumber, LICENSE_DIGITS, LICENSE_LEN, LICENSE_PREFIX_LEN};
pub use records::{Car, CarDetail, Driver, DriverDetail, Manufacturer};
