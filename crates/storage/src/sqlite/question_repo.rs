use sqlx::Row;
use tryout_core::model::{AnswerOption, Question, QuestionId};

use super::SqliteRepository;
use super::mapping::{
    conn, id_i64, invalid, option_id_from_i64, question_id_from_i64, ser, usize_i64,
};
use crate::repository::{QuestionRepository, StorageError};

#[async_trait::async_trait]
impl QuestionRepository for SqliteRepository {
    async fn upsert_question(&self, question: &Question) -> Result<(), StorageError> {
        let question_id = id_i64("question_id", question.id().value())?;
        let mut tx = self.pool.begin().await.map_err(conn)?;

        sqlx::query(
            r"
                INSERT INTO questions (id, text, correct_option_id, explanation)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(id) DO UPDATE SET
                    text = excluded.text,
                    correct_option_id = excluded.correct_option_id,
                    explanation = excluded.explanation
            ",
        )
        .bind(question_id)
        .bind(question.text())
        .bind(id_i64("correct_option_id", question.correct_option().value())?)
        .bind(question.explanation())
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        sqlx::query("DELETE FROM question_options WHERE question_id = ?1")
            .bind(question_id)
            .execute(&mut *tx)
            .await
            .map_err(conn)?;

        for (position, option) in question.options().iter().enumerate() {
            sqlx::query(
                r"
                    INSERT INTO question_options (question_id, position, option_id, label, text)
                    VALUES (?1, ?2, ?3, ?4, ?5)
                ",
            )
            .bind(question_id)
            .bind(usize_i64("option position", position)?)
            .bind(id_i64("option_id", option.id.value())?)
            .bind(option.label.as_str())
            .bind(option.text.as_str())
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        }

        tx.commit().await.map_err(conn)?;
        Ok(())
    }

    async fn get_questions(&self, ids: &[QuestionId]) -> Result<Vec<Question>, StorageError> {
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            let id = id_i64("question_id", id.value())?;
            let Some(row) = sqlx::query(
                r"
                    SELECT id, text, correct_option_id, explanation
                    FROM questions
                    WHERE id = ?1
                ",
            )
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?
            else {
                continue;
            };

            let option_rows = sqlx::query(
                r"
                    SELECT option_id, label, text
                    FROM question_options
                    WHERE question_id = ?1
                    ORDER BY position ASC
                ",
            )
            .bind(id)
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;

            let mut options = Vec::with_capacity(option_rows.len());
            for option in &option_rows {
                options.push(AnswerOption::new(
                    option_id_from_i64(option.try_get::<i64, _>("option_id").map_err(ser)?)?,
                    option.try_get::<String, _>("label").map_err(ser)?,
                    option.try_get::<String, _>("text").map_err(ser)?,
                ));
            }

            let question = Question::new(
                question_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
                row.try_get::<String, _>("text").map_err(ser)?,
                options,
                option_id_from_i64(row.try_get::<i64, _>("correct_option_id").map_err(ser)?)?,
                row.try_get::<Option<String>, _>("explanation").map_err(ser)?,
            )
            .map_err(invalid)?;
            out.push(question);
        }
        Ok(out)
    }
}
