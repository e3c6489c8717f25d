use regex::Regex;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::LazyLock;

use crate::db;
use crate::db::models::User;
use crate::error::{AppError, AppResult};

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\w{1,32}$").expect("username regex is valid"));

const USER_COLUMNS: &str = "id, username, display_name, department, is_admin, created_at";

pub fn find_by_username(conn: &Connection, username: &str) -> AppResult<Option<User>> {
    let user = conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"),
            params![username],
            User::from_row,
        )
        .optional()?;
    Ok(user)
}

pub fn get_user(conn: &Connection, id: &str) -> AppResult<User> {
    conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
        params![id],
        User::from_row,
    )
    .optional()?
    .ok_or(AppError::NotFound)
}

/// Register a user. The first account on a fresh install becomes admin.
pub fn create_user(
    conn: &Connection,
    username: &str,
    display_name: Option<&str>,
    department: Option<&str>,
) -> AppResult<User> {
    let username = username.trim();
    if !USERNAME_RE.is_match(username) {
        return Err(AppError::BadRequest(
            "Username must be 1-32 letters, digits or underscores".into(),
        ));
    }
    let department = department.map(str::trim).filter(|d| !d.is_empty());
    let display_name = display_name.map(str::trim).filter(|d| !d.is_empty());

    // Admin flag and name uniqueness are settled by the same statement
    let id = uuid::Uuid::now_v7().to_string();
    let is_first: bool = conn
        .query_row(
            "INSERT INTO users (id, username, display_name, department, is_admin)
             SELECT ?1, ?2, ?3, ?4, COUNT(*) = 0 FROM users
             RETURNING is_admin",
            params![id, username, display_name, department],
            |r| r.get(0),
        )
        .map_err(|e| {
            if db::is_constraint_violation(&e) {
                AppError::Conflict(format!("Username {} is already taken", username))
            } else {
                e.into()
            }
        })?;

    tracing::info!(user = %username, admin = is_first, "Registered user");
    get_user(conn, &id)
}

/// Follow another user. Following twice is a no-op.
pub fn follow(conn: &Connection, follower_id: &str, username: &str) -> AppResult<()> {
    let target = find_by_username(conn, username)?.ok_or(AppError::NotFound)?;
    if target.id == follower_id {
        return Err(AppError::BadRequest("You cannot follow yourself".into()));
    }
    conn.execute(
        "INSERT OR IGNORE INTO user_follows (follower_id, following_id) VALUES (?1, ?2)",
        params![follower_id, target.id],
    )?;
    Ok(())
}

pub fn unfollow(conn: &Connection, follower_id: &str, username: &str) -> AppResult<()> {
    let target = find_by_username(conn, username)?.ok_or(AppError::NotFound)?;
    conn.execute(
        "DELETE FROM user_follows WHERE follower_id = ?1 AND following_id = ?2",
        params![follower_id, target.id],
    )?;
    Ok(())
}

pub fn followers(conn: &Connection, user_id: &str) -> AppResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT follower_id FROM user_follows WHERE following_id = ?1 ORDER BY created_at",
    )?;
    let ids = stmt
        .query_map(params![user_id], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn conn() -> r2d2::PooledConnection<r2d2_sqlite::SqliteConnectionManager> {
        let pool = db::memory_pool().unwrap();
        db::run_migrations(&pool).unwrap();
        pool.get().unwrap()
    }

    #[test]
    fn first_user_is_admin() {
        let conn = conn();
        let alice = create_user(&conn, "alice", Some("Alice"), Some("Eng")).unwrap();
        let bob = create_user(&conn, "bob", None, None).unwrap();
        assert!(alice.is_admin);
        assert!(!bob.is_admin);
        assert_eq!(alice.department.as_deref(), Some("Eng"));
        assert_eq!(alice.display_name.as_deref(), Some("Alice"));
    }

    #[test]
    fn blank_department_is_stored_as_null() {
        let conn = conn();
        let user = create_user(&conn, "carol", None, Some("  ")).unwrap();
        assert!(user.department.is_none());
    }

    #[test]
    fn rejects_bad_and_duplicate_usernames() {
        let conn = conn();
        assert!(matches!(
            create_user(&conn, "no spaces", None, None),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            create_user(&conn, "", None, None),
            Err(AppError::BadRequest(_))
        ));
        create_user(&conn, "alice", None, None).unwrap();
        assert!(matches!(
            create_user(&conn, "alice", None, None),
            Err(AppError::Conflict(_))
        ));
    }

    #[test]
    fn follow_is_idempotent_and_reversible() {
        let conn = conn();
        let alice = create_user(&conn, "alice", None, None).unwrap();
        let bob = create_user(&conn, "bob", None, None).unwrap();

        follow(&conn, &bob.id, "alice").unwrap();
        follow(&conn, &bob.id, "alice").unwrap();
        assert_eq!(followers(&conn, &alice.id).unwrap(), vec![bob.id.clone()]);

        unfollow(&conn, &bob.id, "alice").unwrap();
        assert!(followers(&conn, &alice.id).unwrap().is_empty());
    }

    #[test]
    fn cannot_follow_self_or_unknown_user() {
        let conn = conn();
        let alice = create_user(&conn, "alice", None, None).unwrap();
        assert!(matches!(
            follow(&conn, &alice.id, "alice"),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            follow(&conn, &alice.id, "ghost"),
            Err(AppError::NotFound)
        ));
    }
}
