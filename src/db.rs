use crate::error::Error;

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use std::path::Path;

const SCHEMA: &str = include_str!("../migrations/2024-05-01-000000_create_campus_tables/up.sql");

pub fn connect(db_path: &Path) -> Result<SqliteConnection, Error> {
    let conn = SqliteConnection::establish(&format!("{}", db_path.display()))
        .map_err(Error::DatabaseConnection)?;
    // Concurrent requests each hold their own connection; wait on locks
    // instead of failing with SQLITE_BUSY.
    conn.batch_execute("PRAGMA busy_timeout = 5000;")?;
    Ok(conn)
}

pub fn migrate(conn: &SqliteConnection) -> Result<(), Error> {
    conn.batch_execute(SCHEMA).map_err(Error::Database)
}

#[cfg(test)]
pub fn test_connection() -> SqliteConnection {
    let conn = SqliteConnection::establish(":memory:").unwrap();
    migrate(&conn).unwrap();
    conn
}
