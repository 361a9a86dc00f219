use rusqlite::Connection;

use crate::StoreError;

pub const SCHEMA_VERSION: i64 = 1;

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS manufacturer (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    country TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS driver (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    first_name TEXT NOT NULL DEFAULT '',
    last_name TEXT NOT NULL DEFAULT '',
    license_number TEXT NOT NULL UNIQUE,
    is_superuser INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS car (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    model TEXT NOT NULL,
    manufacturer_id INTEGER NOT NULL REFERENCES manufacturer(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS car_driver (
    car_id INTEGER NOT NULL REFERENCES car(id) ON DELETE CASCADE,
    driver_id INTEGER NOT NULL REFERENCES driver(id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    PRIMARY KEY (car_id, driver_id)
);

CREATE INDEX IF NOT EXISTS idx_car_manufacturer ON car(manufacturer_id);
CREATE INDEX IF NOT EXISTS idx_car_driver_position ON car_driver(car_id, position);
";

pub fn init_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    Ok(())
}

pub fn schema_version(conn: &Connection) -> Result<i64, StoreError> {
    conn.query_row("PRAGMA user_version", [], |row| row.get(0))
        .map_err(StoreError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent_and_stamps_version() {
        let conn = crate::test_conn();
        init_schema(&conn).expect("second init");
        assert_eq!(schema_version(&conn).expect("version"), SCHEMA_VERSION);
    }
}
