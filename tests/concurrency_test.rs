use std::thread;

use moments::config::MomentsConfig;
use moments::db;
use moments::error::AppError;
use moments::extractors::CurrentUser;
use moments::moments::interactions::{add_comment, share_moment};
use moments::moments::lifecycle::create_moment;
use moments::moments::load_moment;
use moments::moments::model::NewMoment;
use moments::state::DbPool;
use moments::users;
use tempfile::TempDir;

const THREADS: usize = 8;
const ROUNDS: usize = 25;

fn setup() -> (TempDir, DbPool) {
    let temp_dir = TempDir::new().unwrap();
    let pool = db::create_pool(&temp_dir.path().join("test.db")).expect("Failed to create test database");
    db::run_migrations(&pool).expect("Failed to run migrations");
    (temp_dir, pool)
}

fn user(pool: &DbPool, username: &str) -> CurrentUser {
    let conn = pool.get().unwrap();
    let user = users::create_user(&conn, username, None, None).unwrap();
    CurrentUser {
        id: user.id,
        username: user.username,
        is_admin: user.is_admin,
    }
}

fn public_moment(pool: &DbPool, author: &CurrentUser) -> String {
    let mut conn = pool.get().unwrap();
    create_moment(
        &mut conn,
        &MomentsConfig::default(),
        author,
        NewMoment {
            content: Some("Release party #friday".to_string()),
            ..Default::default()
        },
    )
    .unwrap()
    .moment_id
}

#[test]
fn parallel_shares_and_comments_all_land() {
    let (_dir, pool) = setup();
    let alice = user(&pool, "alice");
    let id = public_moment(&pool, &alice);
    let cfg = MomentsConfig::default();
    let sharers: Vec<CurrentUser> = (0..THREADS).map(|n| user(&pool, &format!("fan{n}"))).collect();

    let failures: usize = thread::scope(|s| {
        let handles: Vec<_> = sharers
            .iter()
            .map(|sharer| {
                let pool = pool.clone();
                let id = id.as_str();
                let cfg = &cfg;
                s.spawn(move || {
                    let mut conn = pool.get().unwrap();
                    let mut failed = 0;
                    for round in 0..ROUNDS {
                        if share_moment(&mut conn, sharer, id).is_err() {
                            failed += 1;
                        }
                        if add_comment(&mut conn, cfg, sharer, id, &format!("round {round}")).is_err() {
                            failed += 1;
                        }
                    }
                    failed
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).sum()
    });

    assert_eq!(failures, 0);
    let conn = pool.get().unwrap();
    let moment = load_moment(&conn, &id).unwrap();
    assert_eq!(moment.shares_count, (THREADS * ROUNDS) as i64);
    assert_eq!(moment.comments_count, (THREADS * ROUNDS) as i64);

    let notified: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM moment_notifications WHERE user_id = ?1",
            [&alice.id],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(notified, (2 * THREADS * ROUNDS) as i64);
}

#[test]
fn racing_registrations_keep_names_unique() {
    let (_dir, pool) = setup();

    let results: Vec<_> = thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let pool = pool.clone();
                s.spawn(move || {
                    let conn = pool.get().unwrap();
                    users::create_user(&conn, "rush", None, None)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let created: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(created.len(), 1);
    assert!(created[0].is_admin);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| matches!(e, AppError::Conflict(_))));
}

#[test]
fn only_one_of_many_first_sign_ups_is_admin() {
    let (_dir, pool) = setup();

    let admins: usize = thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|n| {
                let pool = pool.clone();
                s.spawn(move || {
                    let conn = pool.get().unwrap();
                    users::create_user(&conn, &format!("early{n}"), None, None)
                        .unwrap()
                        .is_admin as usize
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).sum()
    });

    assert_eq!(admins, 1);
}
