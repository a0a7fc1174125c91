use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use tryout_core::model::{
    AnswerStatus, BlockResult, FinishReason, PackageId, TryoutAttempt, UserAnswer,
};

use super::SqliteRepository;
use super::mapping::{
    block_id_from_i64, conn, id_i64, invalid, option_id_from_i64, package_id_from_i64,
    question_id_from_i64, ser, u32_from_i64, usize_i64,
};
use crate::repository::{AttemptId, AttemptRepository, AttemptRow, StorageError};

fn count(row: &SqliteRow, field: &'static str) -> Result<u32, StorageError> {
    u32_from_i64(field, row.try_get::<i64, _>(field).map_err(ser)?)
}

fn map_result_row(row: &SqliteRow) -> Result<BlockResult, StorageError> {
    BlockResult::from_persisted(
        block_id_from_i64(row.try_get::<i64, _>("block_id").map_err(ser)?)?,
        row.try_get::<String, _>("block_name").map_err(ser)?,
        count(row, "total_questions")?,
        count(row, "answered")?,
        count(row, "blank")?,
        count(row, "doubtful")?,
        count(row, "correct")?,
        count(row, "incorrect")?,
    )
    .map_err(invalid)
}

fn map_answer_row(row: &SqliteRow) -> Result<UserAnswer, StorageError> {
    let selected_option = row
        .try_get::<Option<i64>, _>("selected_option_id")
        .map_err(ser)?
        .map(option_id_from_i64)
        .transpose()?;
    let status = AnswerStatus::parse(&row.try_get::<String, _>("status").map_err(ser)?)
        .map_err(invalid)?;
    Ok(UserAnswer {
        question_id: question_id_from_i64(row.try_get::<i64, _>("question_id").map_err(ser)?)?,
        selected_option,
        status,
        answered_at: row.try_get::<DateTime<Utc>, _>("answered_at").map_err(ser)?,
    })
}

struct AttemptHeader {
    id: AttemptId,
    package_id: PackageId,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    reason: FinishReason,
}

fn map_header(row: &SqliteRow) -> Result<AttemptHeader, StorageError> {
    Ok(AttemptHeader {
        id: row.try_get::<i64, _>("id").map_err(ser)?,
        package_id: package_id_from_i64(row.try_get::<i64, _>("package_id").map_err(ser)?)?,
        started_at: row.try_get::<DateTime<Utc>, _>("started_at").map_err(ser)?,
        finished_at: row.try_get::<DateTime<Utc>, _>("finished_at").map_err(ser)?,
        reason: FinishReason::parse(&row.try_get::<String, _>("reason").map_err(ser)?)
            .map_err(invalid)?,
    })
}

impl SqliteRepository {
    async fn load_attempt(&self, header: AttemptHeader) -> Result<AttemptRow, StorageError> {
        let result_rows = sqlx::query(
            r"
                SELECT block_id, block_name, total_questions, answered, blank,
                       doubtful, correct, incorrect
                FROM attempt_block_results
                WHERE attempt_id = ?1
                ORDER BY position ASC
            ",
        )
        .bind(header.id)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let answer_rows = sqlx::query(
            r"
                SELECT question_id, selected_option_id, status, answered_at
                FROM attempt_answers
                WHERE attempt_id = ?1
                ORDER BY question_id ASC
            ",
        )
        .bind(header.id)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let results = result_rows
            .iter()
            .map(map_result_row)
            .collect::<Result<Vec<_>, _>>()?;
        let answers = answer_rows
            .iter()
            .map(map_answer_row)
            .collect::<Result<Vec<_>, _>>()?;

        let attempt = TryoutAttempt::new(
            header.package_id,
            header.started_at,
            header.finished_at,
            header.reason,
            results,
            answers,
        )
        .map_err(ser)?;

        Ok(AttemptRow::new(header.id, attempt))
    }
}

#[async_trait::async_trait]
impl AttemptRepository for SqliteRepository {
    async fn append_attempt(&self, attempt: &TryoutAttempt) -> Result<AttemptId, StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;

        let res = sqlx::query(
            r"
                INSERT INTO attempts (package_id, started_at, finished_at, reason)
                VALUES (?1, ?2, ?3, ?4)
            ",
        )
        .bind(id_i64("package_id", attempt.package_id().value())?)
        .bind(attempt.started_at())
        .bind(attempt.finished_at())
        .bind(attempt.reason().as_str())
        .execute(&mut *tx)
        .await
        .map_err(conn)?;
        let attempt_id = res.last_insert_rowid();

        for (position, result) in attempt.results().iter().enumerate() {
            sqlx::query(
                r"
                    INSERT INTO attempt_block_results (
                        attempt_id, position, block_id, block_name, total_questions,
                        answered, blank, doubtful, correct, incorrect
                    )
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                ",
            )
            .bind(attempt_id)
            .bind(usize_i64("result position", position)?)
            .bind(id_i64("block_id", result.block_id().value())?)
            .bind(result.block_name())
            .bind(i64::from(result.total_questions()))
            .bind(i64::from(result.answered()))
            .bind(i64::from(result.blank()))
            .bind(i64::from(result.doubtful()))
            .bind(i64::from(result.correct()))
            .bind(i64::from(result.incorrect()))
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        }

        for answer in attempt.answers() {
            let selected = answer
                .selected_option
                .map(|o| id_i64("selected_option_id", o.value()))
                .transpose()?;
            sqlx::query(
                r"
                    INSERT INTO attempt_answers (
                        attempt_id, question_id, selected_option_id, status, answered_at
                    )
                    VALUES (?1, ?2, ?3, ?4, ?5)
                ",
            )
            .bind(attempt_id)
            .bind(id_i64("question_id", answer.question_id.value())?)
            .bind(selected)
            .bind(answer.status.as_str())
            .bind(answer.answered_at)
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        }

        tx.commit().await.map_err(conn)?;
        Ok(attempt_id)
    }

    async fn get_attempt(&self, id: AttemptId) -> Result<TryoutAttempt, StorageError> {
        let row = sqlx::query(
            r"
                SELECT id, package_id, started_at, finished_at, reason
                FROM attempts
                WHERE id = ?1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?
        .ok_or(StorageError::NotFound)?;

        let header = map_header(&row)?;
        Ok(self.load_attempt(header).await?.attempt)
    }

    async fn list_attempts(
        &self,
        package_id: PackageId,
        limit: u32,
    ) -> Result<Vec<AttemptRow>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, package_id, started_at, finished_at, reason
                FROM attempts
                WHERE package_id = ?1
                ORDER BY finished_at DESC, id DESC
                LIMIT ?2
            ",
        )
        .bind(id_i64("package_id", package_id.value())?)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let headers = rows
            .iter()
            .map(map_header)
            .collect::<Result<Vec<_>, _>>()?;
        let mut out = Vec::with_capacity(headers.len());
        for header in headers {
            out.push(self.load_attempt(header).await?);
        }
        Ok(out)
    }
}
