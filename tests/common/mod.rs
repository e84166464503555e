// tests/common/mod.rs
#![allow(dead_code)]

use classroom::{
    config::Config,
    db,
    models::user::{Requester, Role},
    routes,
    state::AppState,
    utils::jwt::sign_jwt,
};
use axum::Router;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use std::path::{Path, PathBuf};

pub const JWT_SECRET: &str = "test_secret_for_integration_tests";

pub struct TestApp {
    pub address: String,
    pub pool: SqlitePool,
    pub client: reqwest::Client,
}

/// Fresh in-memory database with migrations applied.
///
/// A single connection that never idles out, so every query sees the same
/// in-memory database.
pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory SQLite");

    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await
        .expect("Failed to enable foreign keys");

    db::migrate(&pool).await.expect("Failed to migrate database");
    pool
}

/// File-backed database with several connections, for tests that need
/// writers to actually run side by side.
pub async fn file_pool() -> (SqlitePool, PathBuf) {
    let path = std::env::temp_dir().join(format!("classroom-{}.db", uuid::Uuid::new_v4()));
    let pool = db::connect(&format!("sqlite://{}", path.display()))
        .await
        .expect("Failed to open file database");
    db::migrate(&pool).await.expect("Failed to migrate database");
    (pool, path)
}

pub async fn remove_file_pool(pool: SqlitePool, path: &Path) {
    pool.close().await;
    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
    }
}

pub fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: JWT_SECRET.to_string(),
        jwt_expiration: 600,
        rust_log: "error".to_string(),
        server_addr: "127.0.0.1:0".parse().unwrap(),
        allowed_origins: vec!["http://localhost:3000".to_string()],
        seed_demo_data: false,
    }
}

/// The router over a fresh database, for driving requests in-process.
pub async fn test_router() -> (Router, SqlitePool) {
    let pool = test_pool().await;
    let state = AppState {
        pool: pool.clone(),
        config: test_config(),
    };
    (routes::create_router(state), pool)
}

/// Spawns the app on a random port and returns its address and pool.
pub async fn spawn_app() -> TestApp {
    let pool = test_pool().await;

    let state = AppState {
        pool: pool.clone(),
        config: test_config(),
    };
    let app = routes::create_router(state);

    // Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address,
        pool,
        client: reqwest::Client::new(),
    }
}

// --- Seeding helpers (roster management lives outside the service) ---

pub async fn insert_user(pool: &SqlitePool, name: &str, role: Role) -> Requester {
    let personal_id = format!("P-{}", &uuid::Uuid::new_v4().to_string()[..8]);
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO users (name, role, personal_id) VALUES (?, ?, ?) RETURNING id",
    )
    .bind(name)
    .bind(role.as_str())
    .bind(&personal_id)
    .fetch_one(pool)
    .await
    .unwrap();

    Requester {
        id,
        role,
        name: name.to_string(),
    }
}

pub async fn insert_group(pool: &SqlitePool, teacher: &Requester, students: &[&Requester]) -> i64 {
    let group_id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO student_groups (name, teacher_id) VALUES (?, ?) RETURNING id",
    )
    .bind("Mathematics Pioneers")
    .bind(teacher.id)
    .fetch_one(pool)
    .await
    .unwrap();

    for student in students {
        sqlx::query("INSERT INTO group_students (group_id, student_id) VALUES (?, ?)")
            .bind(group_id)
            .bind(student.id)
            .execute(pool)
            .await
            .unwrap();
    }

    group_id
}

pub async fn count(pool: &SqlitePool, sql: &str, id: i64) -> i64 {
    sqlx::query_scalar::<_, i64>(sql)
        .bind(id)
        .fetch_one(pool)
        .await
        .unwrap()
}

pub fn token_for(user: &Requester) -> String {
    sign_jwt(user.id, &user.name, user.role, JWT_SECRET, 600).unwrap()
}

/// A classroom: one teacher, `n` enrolled students and their group.
pub struct Classroom {
    pub teacher: Requester,
    pub students: Vec<Requester>,
    pub group_id: i64,
}

pub async fn classroom(pool: &SqlitePool, n: usize) -> Classroom {
    let teacher = insert_user(pool, "Ada Lovelace", Role::Teacher).await;
    let names = ["Charles Babbage", "Grace Hopper", "Alan Turing", "Edsger Dijkstra"];
    let mut students = Vec::new();
    for i in 0..n {
        let name = names.get(i).copied().unwrap_or("Student");
        students.push(insert_user(pool, name, Role::Student).await);
    }
    let refs: Vec<&Requester> = students.iter().collect();
    let group_id = insert_group(pool, &teacher, &refs).await;

    Classroom {
        teacher,
        students,
        group_id,
    }
}
