use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id                  INTEGER PRIMARY KEY AUTOINCREMENT,
            name                TEXT NOT NULL,
            email               TEXT NOT NULL UNIQUE,
            password            TEXT NOT NULL,
            reset_token         TEXT,
            reset_token_expiry  INTEGER,
            created_at          TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS profiles (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            bio         TEXT,
            location    TEXT,
            user_id     INTEGER NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS fish (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            species     TEXT NOT NULL UNIQUE
        );

        CREATE TABLE IF NOT EXISTS flies (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            type        TEXT NOT NULL,
            name        TEXT NOT NULL,
            color       TEXT NOT NULL,
            UNIQUE(type, name, color)
        );

        CREATE TABLE IF NOT EXISTS rivers (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            name        TEXT NOT NULL,
            longitude   REAL,
            latitude    REAL,
            stocked     INTEGER NOT NULL DEFAULT 0,
            regulation  TEXT,
            size        TEXT,
            brush       TEXT
        );

        CREATE TABLE IF NOT EXISTS tackle (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            rod_name        TEXT NOT NULL,
            rod_weight      TEXT,
            rod_length_ft   INTEGER,
            rod_length_in   INTEGER,
            user_id         INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_tackle_user ON tackle(user_id);

        CREATE TABLE IF NOT EXISTS trips (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            date            TEXT NOT NULL,
            time_spent      REAL,
            amount_caught   INTEGER,
            average_size    REAL,
            largest_size    REAL,
            river_id        INTEGER REFERENCES rivers(id) ON DELETE SET NULL,
            user_id         INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_trips_user ON trips(user_id, date);

        -- Join tables. Composite keys make a repeated id in an input list a no-op.
        CREATE TABLE IF NOT EXISTS river_fish (
            river_id    INTEGER NOT NULL REFERENCES rivers(id) ON DELETE CASCADE,
            fish_id     INTEGER NOT NULL REFERENCES fish(id) ON DELETE CASCADE,
            PRIMARY KEY (river_id, fish_id)
        );

        CREATE TABLE IF NOT EXISTS river_flies (
            river_id    INTEGER NOT NULL REFERENCES rivers(id) ON DELETE CASCADE,
            fly_id      INTEGER NOT NULL REFERENCES flies(id) ON DELETE CASCADE,
            PRIMARY KEY (river_id, fly_id)
        );

        CREATE TABLE IF NOT EXISTS trip_fish (
            trip_id     INTEGER NOT NULL REFERENCES trips(id) ON DELETE CASCADE,
            fish_id     INTEGER NOT NULL REFERENCES fish(id) ON DELETE CASCADE,
            PRIMARY KEY (trip_id, fish_id)
        );

        CREATE TABLE IF NOT EXISTS trip_flies (
            trip_id     INTEGER NOT NULL REFERENCES trips(id) ON DELETE CASCADE,
            fly_id      INTEGER NOT NULL REFERENCES flies(id) ON DELETE CASCADE,
            PRIMARY KEY (trip_id, fly_id)
        );

        CREATE TABLE IF NOT EXISTS trip_tackle (
            trip_id     INTEGER NOT NULL REFERENCES trips(id) ON DELETE CASCADE,
            tackle_id   INTEGER NOT NULL REFERENCES tackle(id) ON DELETE CASCADE,
            PRIMARY KEY (trip_id, tackle_id)
        );
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
