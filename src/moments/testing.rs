use r2d2::PooledConnection;
use r2d2_sqlite::SqliteConnectionManager;

use crate::config::MomentsConfig;
use crate::db;
use crate::extractors::CurrentUser;
use crate::users;

pub type TestConn = PooledConnection<SqliteConnectionManager>;

/// Migrated in-memory database plus default limits.
pub fn setup() -> (TestConn, MomentsConfig) {
    let pool = db::memory_pool().unwrap();
    db::run_migrations(&pool).unwrap();
    (pool.get().unwrap(), MomentsConfig::default())
}

/// Register a user and return them as the acting user.
pub fn actor(conn: &TestConn, username: &str, department: Option<&str>) -> CurrentUser {
    let user = users::create_user(conn, username, None, department).unwrap();
    CurrentUser {
        id: user.id,
        username: user.username,
        is_admin: user.is_admin,
    }
}
