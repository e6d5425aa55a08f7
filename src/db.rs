use sqlx::{postgres::PgPoolOptions, PgPool};

pub struct Database {
    pub pool: PgPool,
}

impl Database {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        sqlx::query("SELECT 1").execute(&pool).await?;

        Ok(Self { pool })
    }
}

/// Creates the application tables if they do not exist yet.
///
/// The `UNIQUE` constraint on `user_profiles.user_id` is what keeps two
/// concurrent first-time profile reads from creating duplicate rows; the
/// lazy-creation path relies on it (see `profile::ProfileService`).
pub async fn init_schema(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS leads (
            id BIGSERIAL PRIMARY KEY,
            age INTEGER,
            job TEXT,
            marital TEXT,
            education TEXT,
            credit_default TEXT,
            housing TEXT,
            loan TEXT,
            contact TEXT,
            month TEXT,
            day_of_week TEXT,
            duration INTEGER,
            campaign INTEGER,
            pdays INTEGER,
            previous INTEGER,
            poutcome TEXT,
            emp_var_rate DOUBLE PRECISION,
            cons_price_idx DOUBLE PRECISION,
            cons_conf_idx DOUBLE PRECISION,
            euribor3m DOUBLE PRECISION,
            nr_employed DOUBLE PRECISION,
            prediction_score DOUBLE PRECISION,
            prediction_label TEXT,
            status TEXT NOT NULL DEFAULT 'new',
            notes TEXT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id BIGSERIAL PRIMARY KEY,
            username TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user_profiles (
            id BIGSERIAL PRIMARY KEY,
            user_id BIGINT NOT NULL UNIQUE REFERENCES users(id),
            name TEXT NOT NULL,
            role TEXT NOT NULL DEFAULT 'Junior Sales',
            email TEXT NOT NULL,
            id_emp TEXT NOT NULL,
            monthly_target DOUBLE PRECISION,
            joined_date TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sessions (
            token_digest TEXT PRIMARY KEY,
            user_id BIGINT NOT NULL REFERENCES users(id),
            expires_at TIMESTAMPTZ NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
