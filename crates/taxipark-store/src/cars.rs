use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use taxipark_model::{Car, CarData, CarDetail, CarId, Driver, DriverId, ManufacturerId};

use crate::drivers::row_to_driver;
use crate::filters::contains_pattern;
use crate::{manufacturers, StoreError};

fn row_to_car(row: &Row<'_>) -> rusqlite::Result<Car> {
    Ok(Car {
        id: CarId(row.get(0)?),
        model: row.get(1)?,
        manufacturer_id: ManufacturerId(row.get(2)?),
    })
}

fn check_references(tx: &Transaction<'_>, data: &CarData) -> Result<(), StoreError> {
    let manufacturer_exists: Option<i64> = tx
        .query_row(
            "SELECT 1 FROM manufacturer WHERE id = ?1",
            params![data.manufacturer.0],
            |row| row.get(0),
        )
        .optional()?;
    if manufacturer_exists.is_none() {
        return Err(StoreError::constraint(
            "manufacturer",
            "unknown manufacturer",
        ));
    }
    for driver in &data.drivers {
        let exists: Option<i64> = tx
            .query_row(
                "SELECT 1 FROM driver WHERE id = ?1",
                params![driver.0],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_none() {
            return Err(StoreError::constraint("drivers", "unknown driver"));
        }
    }
    Ok(())
}

fn write_associations(
    tx: &Transaction<'_>,
    car_id: CarId,
    drivers: &[DriverId],
) -> Result<(), StoreError> {
    tx.execute(
        "DELETE FROM car_driver WHERE car_id = ?1",
        params![car_id.0],
    )?;
    // Position records submission order; reads below sort by it. A repeated
    // id keeps its first position instead of tripping the primary key.
    let mut seen: Vec<DriverId> = Vec::with_capacity(drivers.len());
    for driver in drivers {
        if seen.contains(driver) {
            continue;
        }
        tx.execute(
            "INSERT INTO car_driver (car_id, driver_id, position) VALUES (?1, ?2, ?3)",
            params![car_id.0, driver.0, seen.len() as i64],
        )?;
        seen.push(*driver);
    }
    Ok(())
}

pub fn create(conn: &mut Connection, data: &CarData) -> Result<Car, StoreError> {
    let tx = conn.transaction()?;
    check_references(&tx, data)?;
    tx.execute(
        "INSERT INTO car (model, manufacturer_id) VALUES (?1, ?2)",
        params![data.model, data.manufacturer.0],
    )?;
    let id = CarId(tx.last_insert_rowid());
    write_associations(&tx, id, &data.drivers)?;
    tx.commit()?;
    get(conn, id)
}

pub fn update(conn: &mut Connection, id: CarId, data: &CarData) -> Result<Car, StoreError> {
    let tx = conn.transaction()?;
    check_references(&tx, data)?;
    let changed = tx.execute(
        "UPDATE car SET model = ?1, manufacturer_id = ?2 WHERE id = ?3",
        params![data.model, data.manufacturer.0, id.0],
    )?;
    if changed == 0 {
        return Err(StoreError::NotFound("car"));
    }
    write_associations(&tx, id, &data.drivers)?;
    tx.commit()?;
    get(conn, id)
}

pub fn get(conn: &Connection, id: CarId) -> Result<Car, StoreError> {
    conn.query_row(
        "SELECT id, model, manufacturer_id FROM car WHERE id = ?1",
        params![id.0],
        row_to_car,
    )
    .optional()?
    .ok_or(StoreError::NotFound("car"))
}

/// Drivers of a car, in the order they were assigned.
pub fn drivers_of(conn: &Connection, id: CarId) -> Result<Vec<Driver>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT d.id, d.username, d.first_name, d.last_name, d.license_number, d.is_superuser \
         FROM driver d \
         JOIN car_driver cd ON cd.driver_id = d.id \
         WHERE cd.car_id = ?1 ORDER BY cd.position",
    )?;
    let rows = stmt.query_map(params![id.0], row_to_driver)?;
    rows.collect::<rusqlite::Result<Vec<_>>>()
        .map_err(StoreError::from)
}

pub fn detail(conn: &Connection, id: CarId) -> Result<CarDetail, StoreError> {
    let car = get(conn, id)?;
    let manufacturer = manufacturers::get(conn, car.manufacturer_id)?;
    let drivers = drivers_of(conn, id)?;
    Ok(CarDetail {
        car,
        manufacturer,
        drivers,
    })
}

/// List in id order; `model_filter` applies a case-insensitive substring
/// match when present and non-empty.
pub fn list(conn: &Connection, model_filter: Option<&str>) -> Result<Vec<Car>, StoreError> {
    let (sql, pattern) = match contains_pattern(model_filter) {
        Some(pattern) => (
            "SELECT id, model, manufacturer_id FROM car \
             WHERE LOWER(model) LIKE ?1 ESCAPE '!' ORDER BY id",
            Some(pattern),
        ),
        None => ("SELECT id, model, manufacturer_id FROM car ORDER BY id", None),
    };
    let mut stmt = conn.prepare(sql)?;
    let rows = match &pattern {
        Some(p) => stmt.query_map(params![p], row_to_car)?,
        None => stmt.query_map([], row_to_car)?,
    };
    rows.collect::<rusqlite::Result<Vec<_>>>()
        .map_err(StoreError::from)
}

/// Assign the driver if not assigned, remove them otherwise. Returns whether
/// the driver is assigned afterwards. New assignments go to the end of the
/// order.
pub fn toggle_driver(
    conn: &mut Connection,
    car: CarId,
    driver: DriverId,
) -> Result<bool, StoreError> {
    get(conn, car)?;
    let tx = conn.transaction()?;
    let assigned: Option<i64> = tx
        .query_row(
            "SELECT 1 FROM car_driver WHERE car_id = ?1 AND driver_id = ?2",
            params![car.0, driver.0],
            |row| row.get(0),
        )
        .optional()?;
    let now_assigned = if assigned.is_some() {
        tx.execute(
            "DELETE FROM car_driver WHERE car_id = ?1 AND driver_id = ?2",
            params![car.0, driver.0],
        )?;
        false
    } else {
        tx.execute(
            "INSERT INTO car_driver (car_id, driver_id, position) \
             SELECT ?1, ?2, COALESCE(MAX(position) + 1, 0) FROM car_driver WHERE car_id = ?1",
            params![car.0, driver.0],
        )?;
        true
    };
    tx.commit()?;
    Ok(now_assigned)
}

pub fn delete(conn: &Connection, id: CarId) -> Result<(), StoreError> {
    let changed = conn.execute("DELETE FROM car WHERE id = ?1", params![id.0])?;
    if changed == 0 {
        return Err(StoreError::NotFound("car"));
    }
    Ok(())
}

pub fn count(conn: &Connection) -> Result<u64, StoreError> {
    let n: i64 = conn.query_row("SELECT COUNT(*) FROM car", [], |row| row.get(0))?;
    Ok(n as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::test_driver;
    use crate::test_conn;

    fn seed_manufacturer(conn: &Connection) -> ManufacturerId {
        manufacturers::create(conn, "BMW", "Germany")
            .expect("create manufacturer")
            .id
    }

    #[test]
    fn create_persists_drivers_in_submission_order() {
        let mut conn = test_conn();
        let manufacturer = seed_manufacturer(&conn);
        let d1 = test_driver(&conn, "driver1", "AAA11111");
        let d2 = test_driver(&conn, "driver2", "BBB22222");

        let car = create(
            &mut conn,
            &CarData {
                model: "X5".to_string(),
                manufacturer,
                drivers: vec![d1.id, d2.id],
            },
        )
        .expect("create car");

        assert_eq!(car.model, "X5");
        let stored: Vec<_> = drivers_of(&conn, car.id)
            .expect("drivers")
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(stored, vec![d1.id, d2.id]);

        // Reversed submission order must read back reversed.
        let reversed = create(
            &mut conn,
            &CarData {
                model: "X3".to_string(),
                manufacturer,
                drivers: vec![d2.id, d1.id],
            },
        )
        .expect("create car");
        let stored: Vec<_> = drivers_of(&conn, reversed.id)
            .expect("drivers")
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(stored, vec![d2.id, d1.id]);
    }

    #[test]
    fn create_keeps_first_position_of_a_repeated_driver() {
        let mut conn = test_conn();
        let manufacturer = seed_manufacturer(&conn);
        let d1 = test_driver(&conn, "driver1", "AAA11111");
        let d2 = test_driver(&conn, "driver2", "BBB22222");

        let car = create(
            &mut conn,
            &CarData {
                model: "X5".to_string(),
                manufacturer,
                drivers: vec![d1.id, d2.id, d1.id],
            },
        )
        .expect("repeated driver must not fail");

        let stored: Vec<_> = drivers_of(&conn, car.id)
            .expect("drivers")
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(stored, vec![d1.id, d2.id]);
    }

    #[test]
    fn create_rejects_unknown_references_without_partial_state() {
        let mut conn = test_conn();
        let manufacturer = seed_manufacturer(&conn);

        let err = create(
            &mut conn,
            &CarData {
                model: "X5".to_string(),
                manufacturer: ManufacturerId(999),
                drivers: vec![],
            },
        )
        .expect_err("unknown manufacturer must fail");
        assert!(matches!(err, StoreError::Constraint(ref e) if e.contains("manufacturer")));

        let err = create(
            &mut conn,
            &CarData {
                model: "X5".to_string(),
                manufacturer,
                drivers: vec![DriverId(999)],
            },
        )
        .expect_err("unknown driver must fail");
        assert!(matches!(err, StoreError::Constraint(ref e) if e.contains("drivers")));

        assert_eq!(count(&conn).expect("count"), 0);
    }

    #[test]
    fn list_filters_by_model_substring() {
        let mut conn = test_conn();
        let manufacturer = seed_manufacturer(&conn);
        for model in ["X5", "A4"] {
            create(
                &mut conn,
                &CarData {
                    model: model.to_string(),
                    manufacturer,
                    drivers: vec![],
                },
            )
            .expect("create car");
        }

        let hits: Vec<_> = list(&conn, Some("X5"))
            .expect("filter")
            .into_iter()
            .map(|c| c.model)
            .collect();
        assert_eq!(hits, vec!["X5".to_string()]);
        assert_eq!(list(&conn, None).expect("unfiltered").len(), 2);
    }

    #[test]
    fn update_replaces_association_in_new_order() {
        let mut conn = test_conn();
        let manufacturer = seed_manufacturer(&conn);
        let d1 = test_driver(&conn, "driver1", "AAA11111");
        let d2 = test_driver(&conn, "driver2", "BBB22222");
        let d3 = test_driver(&conn, "driver3", "CCC33333");

        let car = create(
            &mut conn,
            &CarData {
                model: "X5".to_string(),
                manufacturer,
                drivers: vec![d1.id, d2.id],
            },
        )
        .expect("create car");

        let updated = update(
            &mut conn,
            car.id,
            &CarData {
                model: "X5M".to_string(),
                manufacturer,
                drivers: vec![d3.id, d1.id],
            },
        )
        .expect("update car");
        assert_eq!(updated.model, "X5M");

        let stored: Vec<_> = drivers_of(&conn, car.id)
            .expect("drivers")
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(stored, vec![d3.id, d1.id]);
    }

    #[test]
    fn toggle_assigns_then_removes() {
        let mut conn = test_conn();
        let manufacturer = seed_manufacturer(&conn);
        let d1 = test_driver(&conn, "driver1", "AAA11111");
        let car = create(
            &mut conn,
            &CarData {
                model: "X5".to_string(),
                manufacturer,
                drivers: vec![],
            },
        )
        .expect("create car");

        assert!(toggle_driver(&mut conn, car.id, d1.id).expect("assign"));
        assert_eq!(drivers_of(&conn, car.id).expect("drivers").len(), 1);
        assert!(!toggle_driver(&mut conn, car.id, d1.id).expect("remove"));
        assert!(drivers_of(&conn, car.id).expect("drivers").is_empty());
    }

    #[test]
    fn detail_joins_manufacturer_and_ordered_drivers() {
        let mut conn = test_conn();
        let manufacturer = seed_manufacturer(&conn);
        let d1 = test_driver(&conn, "driver1", "AAA11111");
        let car = create(
            &mut conn,
            &CarData {
                model: "X5".to_string(),
                manufacturer,
                drivers: vec![d1.id],
            },
        )
        .expect("create car");

        let detail = detail(&conn, car.id).expect("detail");
        assert_eq!(detail.manufacturer.name, "BMW");
        assert_eq!(detail.drivers.len(), 1);
        assert!(matches!(
            super::detail(&conn, CarId(999)),
            Err(StoreError::NotFound("car"))
        ));
    }

    #[test]
    fn deleting_a_driver_cascades_out_of_associations() {
        let mut conn = test_conn();
        let manufacturer = seed_manufacturer(&conn);
        let d1 = test_driver(&conn, "driver1", "AAA11111");
        let car = create(
            &mut conn,
            &CarData {
                model: "X5".to_string(),
                manufacturer,
                drivers: vec![d1.id],
            },
        )
        .expect("create car");

        crate::drivers::delete(&conn, d1.id).expect("delete driver");
        assert!(drivers_of(&conn, car.id).expect("drivers").is_empty());
    }
}
