// src/main.rs

use classroom::config::Config;
use classroom::db;
use classroom::routes;
use classroom::state::AppState;
use dotenvy::dotenv;
use sqlx::SqlitePool;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenv().ok();

    // Load configuration from environment
    let config = Config::from_env().expect("JWT_SECRET must be set");

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    let pool = db::connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Database connected...");

    // Run Migrations Automatically
    tracing::info!("Running migrations...");
    db::migrate(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Migrations applied successfully.");

    if config.seed_demo_data {
        if let Err(e) = seed_demo_data(&pool).await {
            tracing::error!("Failed to seed demo data: {:?}", e);
        }
    }

    let state = AppState {
        pool: pool.clone(),
        config: config.clone(),
    };

    let app = routes::create_router(state);

    tracing::info!("Listening on {}", config.server_addr);

    let listener = tokio::net::TcpListener::bind(config.server_addr)
        .await
        .expect("Failed to bind server address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // The host owns the store handle: close it once requests have drained.
    pool.close().await;
    tracing::info!("Shutdown complete.");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutdown signal received");
}

/// One teacher, three students and a group, for local development.
async fn seed_demo_data(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let user_count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;
    if user_count > 0 {
        return Ok(());
    }

    tracing::info!("Seeding demo data...");
    let mut tx = pool.begin().await?;

    let teacher_id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO users (name, role, personal_id) VALUES (?, 'teacher', ?) RETURNING id",
    )
    .bind("Ada Lovelace")
    .bind("T01")
    .fetch_one(&mut *tx)
    .await?;

    let group_id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO student_groups (name, teacher_id) VALUES (?, ?) RETURNING id",
    )
    .bind("Mathematics Pioneers")
    .bind(teacher_id)
    .fetch_one(&mut *tx)
    .await?;

    for (name, personal_id) in [
        ("Charles Babbage", "S01"),
        ("Grace Hopper", "S02"),
        ("Alan Turing", "S03"),
    ] {
        let student_id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO users (name, role, personal_id) VALUES (?, 'student', ?) RETURNING id",
        )
        .bind(name)
        .bind(personal_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO group_students (group_id, student_id) VALUES (?, ?)")
            .bind(group_id)
            .bind(student_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    tracing::info!("Demo data seeded.");
    Ok(())
}
