use rusqlite::{params, Connection, OptionalExtension, Row};
use taxipark_model::{Car, CarId, Driver, DriverDetail, DriverId, LicenseNumber, ManufacturerId};

use crate::filters::contains_pattern;
use crate::StoreError;

/// Insert payload for a driver; the password is hashed by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDriver {
    pub username: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub license_number: LicenseNumber,
    pub is_superuser: bool,
}

const DRIVER_COLUMNS: &str =
    "id, username, first_name, last_name, license_number, is_superuser";

pub(crate) fn row_to_driver(row: &Row<'_>) -> rusqlite::Result<Driver> {
    let license: String = row.get(4)?;
    let license_number = LicenseNumber::parse(&license).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            4,
            rusqlite::types::Type::Text,
            Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, e.0)),
        )
    })?;
    Ok(Driver {
        id: DriverId(row.get(0)?),
        username: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        license_number,
        is_superuser: row.get::<_, i64>(5)? != 0,
    })
}

/// Map a sqlite uniqueness violation onto the field it guards, so duplicate
/// usernames and license numbers report like validation failures.
fn map_unique_violation(e: rusqlite::Error) -> StoreError {
    if let rusqlite::Error::SqliteFailure(inner, Some(message)) = &e {
        if inner.code == rusqlite::ErrorCode::ConstraintViolation {
            if message.contains("driver.username") {
                return StoreError::constraint("username", "this username is already taken");
            }
            if message.contains("driver.license_number") {
                return StoreError::constraint(
                    "license_number",
                    "this license number is already registered",
                );
            }
        }
    }
    StoreError::from(e)
}

pub fn create(conn: &Connection, new: &NewDriver) -> Result<Driver, StoreError> {
    conn.execute(
        "INSERT INTO driver \
         (username, password_hash, first_name, last_name, license_number, is_superuser) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            new.username,
            new.password_hash,
            new.first_name,
            new.last_name,
            new.license_number.as_str(),
            new.is_superuser as i64,
        ],
    )
    .map_err(map_unique_violation)?;
    get(conn, DriverId(conn.last_insert_rowid()))
}

pub fn get(conn: &Connection, id: DriverId) -> Result<Driver, StoreError> {
    conn.query_row(
        &format!("SELECT {DRIVER_COLUMNS} FROM driver WHERE id = ?1"),
        params![id.0],
        row_to_driver,
    )
    .optional()?
    .ok_or(StoreError::NotFound("driver"))
}

/// Full record plus associated cars for detail rendering.
pub fn detail(conn: &Connection, id: DriverId) -> Result<DriverDetail, StoreError> {
    let driver = get(conn, id)?;
    let mut stmt = conn.prepare(
        "SELECT c.id, c.model, c.manufacturer_id FROM car c \
         JOIN car_driver cd ON cd.car_id = c.id \
         WHERE cd.driver_id = ?1 ORDER BY c.id",
    )?;
    let cars = stmt
        .query_map(params![id.0], |row| {
            Ok(Car {
                id: CarId(row.get(0)?),
                model: row.get(1)?,
                manufacturer_id: ManufacturerId(row.get(2)?),
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(DriverDetail { driver, cars })
}

/// List in id order; `username_filter` applies a case-insensitive substring
/// match when present and non-empty.
pub fn list(conn: &Connection, username_filter: Option<&str>) -> Result<Vec<Driver>, StoreError> {
    let (sql, pattern) = match contains_pattern(username_filter) {
        Some(pattern) => (
            format!(
                "SELECT {DRIVER_COLUMNS} FROM driver \
                 WHERE LOWER(username) LIKE ?1 ESCAPE '!' ORDER BY id"
            ),
            Some(pattern),
        ),
        None => (
            format!("SELECT {DRIVER_COLUMNS} FROM driver ORDER BY id"),
            None,
        ),
    };
    let mut stmt = conn.prepare(&sql)?;
    let rows = match &pattern {
        Some(p) => stmt.query_map(params![p], row_to_driver)?,
        None => stmt.query_map([], row_to_driver)?,
    };
    rows.collect::<rusqlite::Result<Vec<_>>>()
        .map_err(StoreError::from)
}

/// Look up a driver and their password hash for a login attempt.
pub fn find_credentials(
    conn: &Connection,
    username: &str,
) -> Result<Option<(Driver, String)>, StoreError> {
    conn.query_row(
        &format!(
            "SELECT {DRIVER_COLUMNS}, password_hash FROM driver WHERE username = ?1"
        ),
        params![username],
        |row| {
            let driver = row_to_driver(row)?;
            let hash: String = row.get(6)?;
            Ok((driver, hash))
        },
    )
    .optional()
    .map_err(StoreError::from)
}

/// Back-office profile update; the password hash is untouched.
pub fn update_profile(
    conn: &Connection,
    id: DriverId,
    data: &taxipark_model::DriverChangeData,
) -> Result<Driver, StoreError> {
    let changed = conn
        .execute(
            "UPDATE driver SET username = ?1, first_name = ?2, last_name = ?3, \
             license_number = ?4, is_superuser = ?5 WHERE id = ?6",
            params![
                data.username,
                data.first_name,
                data.last_name,
                data.license_number.as_str(),
                data.is_superuser as i64,
                id.0,
            ],
        )
        .map_err(map_unique_violation)?;
    if changed == 0 {
        return Err(StoreError::NotFound("driver"));
    }
    get(conn, id)
}

/// Replace the license number and nothing else.
pub fn update_license(
    conn: &Connection,
    id: DriverId,
    license: &LicenseNumber,
) -> Result<Driver, StoreError> {
    let changed = conn
        .execute(
            "UPDATE driver SET license_number = ?1 WHERE id = ?2",
            params![license.as_str(), id.0],
        )
        .map_err(map_unique_violation)?;
    if changed == 0 {
        return Err(StoreError::NotFound("driver"));
    }
    get(conn, id)
}

pub fn delete(conn: &Connection, id: DriverId) -> Result<(), StoreError> {
    let changed = conn.execute("DELETE FROM driver WHERE id = ?1", params![id.0])?;
    if changed == 0 {
        return Err(StoreError::NotFound("driver"));
    }
    Ok(())
}

pub fn count(conn: &Connection) -> Result<u64, StoreError> {
    let n: i64 = conn.query_row("SELECT COUNT(*) FROM driver", [], |row| row.get(0))?;
    Ok(n as u64)
}

#[cfg(test)]
pub(crate) fn test_driver(conn: &Connection, username: &str, license: &str) -> Driver {
    create(
        conn,
        &NewDriver {
            username: username.to_string(),
            password_hash: "x".to_string(),
            first_name: String::new(),
            last_name: String::new(),
            license_number: LicenseNumber::parse(license).expect("valid license"),
            is_superuser: false,
        },
    )
    .expect("create driver")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_conn;

    #[test]
    fn create_stores_all_submitted_fields() {
        let conn = test_conn();
        let driver = create(
            &conn,
            &NewDriver {
                username: "driver1".to_string(),
                password_hash: "hash".to_string(),
                first_name: "John".to_string(),
                last_name: "Doe".to_string(),
                license_number: LicenseNumber::parse("ABC12345").expect("license"),
                is_superuser: false,
            },
        )
        .expect("create");
        assert_eq!(driver.username, "driver1");
        assert_eq!(driver.first_name, "John");
        assert_eq!(driver.last_name, "Doe");
        assert_eq!(driver.license_number.as_str(), "ABC12345");
        assert_eq!(driver.to_string(), "driver1 (John Doe)");
    }

    #[test]
    fn duplicate_username_reports_on_username_field() {
        let conn = test_conn();
        test_driver(&conn, "driver1", "AAA11111");
        let err = create(
            &conn,
            &NewDriver {
                username: "driver1".to_string(),
                password_hash: "x".to_string(),
                first_name: String::new(),
                last_name: String::new(),
                license_number: LicenseNumber::parse("BBB22222").expect("license"),
                is_superuser: false,
            },
        )
        .expect_err("duplicate must fail");
        match err {
            StoreError::Constraint(errors) => assert!(errors.contains("username")),
            other => panic!("expected constraint error, got {other}"),
        }
    }

    #[test]
    fn duplicate_license_reports_on_license_field() {
        let conn = test_conn();
        test_driver(&conn, "driver1", "AAA11111");
        let err = create(
            &conn,
            &NewDriver {
                username: "driver2".to_string(),
                password_hash: "x".to_string(),
                first_name: String::new(),
                last_name: String::new(),
                license_number: LicenseNumber::parse("AAA11111").expect("license"),
                is_superuser: false,
            },
        )
        .expect_err("duplicate must fail");
        match err {
            StoreError::Constraint(errors) => assert!(errors.contains("license_number")),
            other => panic!("expected constraint error, got {other}"),
        }
    }

    #[test]
    fn update_license_changes_only_that_field() {
        let conn = test_conn();
        let before = create(
            &conn,
            &NewDriver {
                username: "driver1".to_string(),
                password_hash: "hash".to_string(),
                first_name: "John".to_string(),
                last_name: "Doe".to_string(),
                license_number: LicenseNumber::parse("ABC12345").expect("license"),
                is_superuser: false,
            },
        )
        .expect("create");

        let license = LicenseNumber::parse("DEF67890").expect("license");
        let after = update_license(&conn, before.id, &license).expect("update");

        assert_eq!(after.license_number.as_str(), "DEF67890");
        assert_eq!(after.username, before.username);
        assert_eq!(after.first_name, before.first_name);
        assert_eq!(after.last_name, before.last_name);
        assert_eq!(after.is_superuser, before.is_superuser);
    }

    #[test]
    fn list_filters_by_username_substring() {
        let conn = test_conn();
        test_driver(&conn, "john_doe", "AAA11111");
        test_driver(&conn, "alice", "BBB22222");

        let hits: Vec<_> = list(&conn, Some("john"))
            .expect("filter")
            .into_iter()
            .map(|d| d.username)
            .collect();
        assert_eq!(hits, vec!["john_doe".to_string()]);

        assert_eq!(list(&conn, None).expect("unfiltered").len(), 2);
    }

    #[test]
    fn detail_returns_driver_or_not_found() {
        let conn = test_conn();
        let driver = test_driver(&conn, "driver1", "AAA11111");
        let detail = detail(&conn, driver.id).expect("detail");
        assert_eq!(detail.driver, driver);
        assert!(detail.cars.is_empty());

        assert!(matches!(
            super::detail(&conn, DriverId(999)),
            Err(StoreError::NotFound("driver"))
        ));
    }

    #[test]
    fn find_credentials_returns_hash_for_known_username() {
        let conn = test_conn();
        let driver = test_driver(&conn, "driver1", "AAA11111");
        let (found, hash) = find_credentials(&conn, "driver1")
            .expect("query")
            .expect("present");
        assert_eq!(found, driver);
        assert_eq!(hash, "x");
        assert!(find_credentials(&conn, "nobody").expect("query").is_none());
    }
}
