use rand::Rng;
use rusqlite::params;

use crate::error::AppResult;
use crate::state::DbPool;

/// Create a new session for a user. Returns the session token.
pub fn create_session(pool: &DbPool, user_id: &str, hours: u64) -> AppResult<String> {
    let conn = pool.get()?;

    let token = generate_token();
    let id = uuid::Uuid::now_v7().to_string();

    conn.execute(
        "INSERT INTO sessions (id, user_id, token, expires_at) VALUES (?1, ?2, ?3, datetime('now', ?4))",
        params![id, user_id, token, format!("+{} hours", hours)],
    )?;

    Ok(token)
}

/// Delete a session by token.
pub fn delete_session(pool: &DbPool, token: &str) -> AppResult<()> {
    let conn = pool.get()?;
    conn.execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
    Ok(())
}

/// `Set-Cookie` value for a fresh session.
pub fn session_cookie(name: &str, token: &str, hours: u64) -> String {
    format!(
        "{}={}; HttpOnly; SameSite=Strict; Path=/; Max-Age={}",
        name,
        token,
        hours * 3600
    )
}

/// `Set-Cookie` value that clears the session.
pub fn clear_cookie(name: &str) -> String {
    format!("{}=; HttpOnly; SameSite=Strict; Path=/; Max-Age=0", name)
}

/// Generate a cryptographically random 32-byte hex token.
fn generate_token() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    #[test]
    fn generate_token_is_64_hex_chars() {
        let token = generate_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn generate_token_is_unique() {
        let t1 = generate_token();
        let t2 = generate_token();
        assert_ne!(t1, t2);
    }

    #[test]
    fn session_round_trip() {
        let pool = db::memory_pool().unwrap();
        db::run_migrations(&pool).unwrap();
        pool.get()
            .unwrap()
            .execute("INSERT INTO users (id, username) VALUES ('u1', 'alice')", [])
            .unwrap();

        let token = create_session(&pool, "u1", 1).unwrap();
        let count = |pool: &DbPool| -> i64 {
            pool.get()
                .unwrap()
                .query_row("SELECT COUNT(*) FROM sessions", [], |r| r.get(0))
                .unwrap()
        };
        assert_eq!(count(&pool), 1);

        delete_session(&pool, &token).unwrap();
        assert_eq!(count(&pool), 0);
    }

    #[test]
    fn cookie_max_age_follows_hours() {
        let cookie = session_cookie("moments_session", "tok", 2);
        assert!(cookie.starts_with("moments_session=tok;"));
        assert!(cookie.contains("Max-Age=7200"));
        assert!(clear_cookie("moments_session").contains("Max-Age=0"));
    }
}
