use rusqlite::{params, Connection, OptionalExtension, Row};
use taxipark_model::{Manufacturer, ManufacturerId};

use crate::filters::contains_pattern;
use crate::StoreError;

fn row_to_manufacturer(row: &Row<'_>) -> rusqlite::Result<Manufacturer> {
    Ok(Manufacturer {
        id: ManufacturerId(row.get(0)?),
        name: row.get(1)?,
        country: row.get(2)?,
    })
}

pub fn create(conn: &Connection, name: &str, country: &str) -> Result<Manufacturer, StoreError> {
    conn.execute(
        "INSERT INTO manufacturer (name, country) VALUES (?1, ?2)",
        params![name, country],
    )?;
    get(conn, ManufacturerId(conn.last_insert_rowid()))
}

pub fn get(conn: &Connection, id: ManufacturerId) -> Result<Manufacturer, StoreError> {
    conn.query_row(
        "SELECT id, name, country FROM manufacturer WHERE id = ?1",
        params![id.0],
        row_to_manufacturer,
    )
    .optional()?
    .ok_or(StoreError::NotFound("manufacturer"))
}

/// List in id order; `name_filter` applies a case-insensitive substring
/// match when present and non-empty.
pub fn list(conn: &Connection, name_filter: Option<&str>) -> Result<Vec<Manufacturer>, StoreError> {
    let (sql, pattern) = match contains_pattern(name_filter) {
        Some(pattern) => (
            "SELECT id, name, country FROM manufacturer \
             WHERE LOWER(name) LIKE ?1 ESCAPE '!' ORDER BY id",
            Some(pattern),
        ),
        None => (
            "SELECT id, name, country FROM manufacturer ORDER BY id",
            None,
        ),
    };
    let mut stmt = conn.prepare(sql)?;
    let rows = match &pattern {
        Some(p) => stmt.query_map(params![p], row_to_manufacturer)?,
        None => stmt.query_map([], row_to_manufacturer)?,
    };
    rows.collect::<rusqlite::Result<Vec<_>>>()
        .map_err(StoreError::from)
}

pub fn update(
    conn: &Connection,
    id: ManufacturerId,
    name: &str,
    country: &str,
) -> Result<Manufacturer, StoreError> {
    let changed = conn.execute(
        "UPDATE manufacturer SET name = ?1, country = ?2 WHERE id = ?3",
        params![name, country, id.0],
    )?;
    if changed == 0 {
        return Err(StoreError::NotFound("manufacturer"));
    }
    get(conn, id)
}

pub fn delete(conn: &Connection, id: ManufacturerId) -> Result<(), StoreError> {
    let changed = conn.execute("DELETE FROM manufacturer WHERE id = ?1", params![id.0])?;
    if changed == 0 {
        return Err(StoreError::NotFound("manufacturer"));
    }
    Ok(())
}

pub fn count(conn: &Connection) -> Result<u64, StoreError> {
    let n: i64 = conn.query_row("SELECT COUNT(*) FROM manufacturer", [], |row| row.get(0))?;
    Ok(n as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_conn;

    #[test]
    fn create_then_get_round_trips() {
        let conn = test_conn();
        let created = create(&conn, "Toyota", "Japan").expect("create");
        let fetched = get(&conn, created.id).expect("get");
        assert_eq!(fetched, created);
        assert_eq!(fetched.to_string(), "Toyota Japan");
    }

    #[test]
    fn list_filters_by_case_insensitive_substring() {
        let conn = test_conn();
        create(&conn, "BMW", "Germany").expect("create BMW");
        create(&conn, "Audi", "Germany").expect("create Audi");

        let all = list(&conn, None).expect("unfiltered");
        assert_eq!(all.len(), 2);

        let bm: Vec<_> = list(&conn, Some("BM"))
            .expect("filter BM")
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(bm, vec!["BMW".to_string()]);

        let au: Vec<_> = list(&conn, Some("Au"))
            .expect("filter Au")
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(au, vec!["Audi".to_string()]);

        let lower: Vec<_> = list(&conn, Some("bmw"))
            .expect("filter bmw")
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(lower, vec!["BMW".to_string()]);
    }

    #[test]
    fn empty_filter_returns_everything() {
        let conn = test_conn();
        create(&conn, "BMW", "Germany").expect("create");
        assert_eq!(list(&conn, Some("")).expect("empty filter").len(), 1);
    }

    #[test]
    fn update_and_delete_report_missing_records() {
        let conn = test_conn();
        let m = create(&conn, "Fiat", "Italy").expect("create");
        let updated = update(&conn, m.id, "Fiat", "Italia").expect("update");
        assert_eq!(updated.country, "Italia");

        delete(&conn, m.id).expect("delete");
        assert!(matches!(
            get(&conn, m.id),
            Err(StoreError::NotFound("manufacturer"))
        ));
        assert!(matches!(
            update(&conn, m.id, "x", "y"),
            Err(StoreError::NotFound("manufacturer"))
        ));
        assert!(matches!(
            delete(&conn, m.id),
            Err(StoreError::NotFound("manufacturer"))
        ));
    }

    #[test]
    fn count_tracks_live_rows() {
        let conn = test_conn();
        assert_eq!(count(&conn).expect("count"), 0);
        let m = create(&conn, "BMW", "Germany").expect("create");
        assert_eq!(count(&conn).expect("count"), 1);
        delete(&conn, m.id).expect("delete");
        assert_eq!(count(&conn).expect("count"), 0);
    }
}
