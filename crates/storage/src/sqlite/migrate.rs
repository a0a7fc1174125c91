use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

const SCHEMA_V1: &[&str] = &[
    r"
        CREATE TABLE IF NOT EXISTS packages (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS blocks (
            package_id INTEGER NOT NULL,
            position INTEGER NOT NULL CHECK (position >= 0),
            id INTEGER NOT NULL,
            name TEXT NOT NULL,
            duration_minutes INTEGER NOT NULL CHECK (duration_minutes >= 0),
            PRIMARY KEY (package_id, position),
            UNIQUE (package_id, id),
            FOREIGN KEY (package_id) REFERENCES packages(id) ON DELETE CASCADE
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS block_questions (
            package_id INTEGER NOT NULL,
            block_position INTEGER NOT NULL,
            position INTEGER NOT NULL CHECK (position >= 0),
            question_id INTEGER NOT NULL,
            PRIMARY KEY (package_id, block_position, position),
            UNIQUE (package_id, question_id),
            FOREIGN KEY (package_id, block_position)
                REFERENCES blocks(package_id, position) ON DELETE CASCADE
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS questions (
            id INTEGER PRIMARY KEY,
            text TEXT NOT NULL,
            correct_option_id INTEGER NOT NULL,
            explanation TEXT
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS question_options (
            question_id INTEGER NOT NULL,
            position INTEGER NOT NULL CHECK (position >= 0),
            option_id INTEGER NOT NULL,
            label TEXT NOT NULL,
            text TEXT NOT NULL,
            PRIMARY KEY (question_id, position),
            UNIQUE (question_id, option_id),
            FOREIGN KEY (question_id) REFERENCES questions(id) ON DELETE CASCADE
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS attempts (
            id INTEGER PRIMARY KEY,
            package_id INTEGER NOT NULL,
            started_at TEXT NOT NULL,
            finished_at TEXT NOT NULL,
            reason TEXT NOT NULL CHECK (reason IN ('manual', 'time_up')),
            FOREIGN KEY (package_id) REFERENCES packages(id) ON DELETE CASCADE
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS attempt_block_results (
            attempt_id INTEGER NOT NULL,
            position INTEGER NOT NULL CHECK (position >= 0),
            block_id INTEGER NOT NULL,
            block_name TEXT NOT NULL,
            total_questions INTEGER NOT NULL CHECK (total_questions >= 0),
            answered INTEGER NOT NULL CHECK (answered >= 0),
            blank INTEGER NOT NULL CHECK (blank >= 0),
            doubtful INTEGER NOT NULL CHECK (doubtful >= 0),
            correct INTEGER NOT NULL CHECK (correct >= 0),
            incorrect INTEGER NOT NULL CHECK (incorrect >= 0),
            PRIMARY KEY (attempt_id, position),
            FOREIGN KEY (attempt_id) REFERENCES attempts(id) ON DELETE CASCADE
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS attempt_answers (
            attempt_id INTEGER NOT NULL,
            question_id INTEGER NOT NULL,
            selected_option_id INTEGER,
            status TEXT NOT NULL CHECK (status IN ('unanswered', 'answered', 'doubtful')),
            answered_at TEXT NOT NULL,
            PRIMARY KEY (attempt_id, question_id),
            FOREIGN KEY (attempt_id) REFERENCES attempts(id) ON DELETE CASCADE
        );
    ",
    r"
        CREATE INDEX IF NOT EXISTS idx_attempts_package_finished
            ON attempts (package_id, finished_at);
    ",
];

/// Runs versioned migrations recorded in `schema_migrations`.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    // Version 1: packages, question bank, attempts.
    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        for statement in SCHEMA_V1 {
            sqlx::query(statement).execute(&mut *tx).await?;
        }

        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(1_i64)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
    }

    Ok(())
}
