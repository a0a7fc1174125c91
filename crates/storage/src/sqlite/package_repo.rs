use std::collections::BTreeMap;

use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use tryout_core::model::{Block, PackageId, QuestionId, TryoutPackage};

use super::SqliteRepository;
use super::mapping::{
    block_id_from_i64, conn, id_i64, invalid, package_id_from_i64, question_id_from_i64, ser,
    u32_from_i64, usize_i64,
};
use crate::repository::{PackageRepository, StorageError};

impl SqliteRepository {
    async fn load_package(&self, id: i64, title: String) -> Result<TryoutPackage, StorageError> {
        let block_rows = sqlx::query(
            r"
                SELECT position, id, name, duration_minutes
                FROM blocks
                WHERE package_id = ?1
                ORDER BY position ASC
            ",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let question_rows = sqlx::query(
            r"
                SELECT block_position, question_id
                FROM block_questions
                WHERE package_id = ?1
                ORDER BY block_position ASC, position ASC
            ",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut by_block: BTreeMap<i64, Vec<QuestionId>> = BTreeMap::new();
        for row in &question_rows {
            let position: i64 = row.try_get("block_position").map_err(ser)?;
            let question_id =
                question_id_from_i64(row.try_get::<i64, _>("question_id").map_err(ser)?)?;
            by_block.entry(position).or_default().push(question_id);
        }

        let mut blocks = Vec::with_capacity(block_rows.len());
        for row in &block_rows {
            blocks.push(map_block_row(row, &mut by_block)?);
        }

        TryoutPackage::new(package_id_from_i64(id)?, title, blocks).map_err(invalid)
    }
}

fn map_block_row(
    row: &SqliteRow,
    by_block: &mut BTreeMap<i64, Vec<QuestionId>>,
) -> Result<Block, StorageError> {
    let position: i64 = row.try_get("position").map_err(ser)?;
    let block_id = block_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?;
    let name: String = row.try_get("name").map_err(ser)?;
    let minutes = u32_from_i64(
        "duration_minutes",
        row.try_get::<i64, _>("duration_minutes").map_err(ser)?,
    )?;
    let question_ids = by_block.remove(&position).unwrap_or_default();
    Block::new(block_id, name, question_ids, minutes).map_err(invalid)
}

#[async_trait::async_trait]
impl PackageRepository for SqliteRepository {
    async fn upsert_package(&self, package: &TryoutPackage) -> Result<(), StorageError> {
        let package_id = id_i64("package_id", package.id().value())?;
        let mut tx = self.pool.begin().await.map_err(conn)?;

        sqlx::query(
            r"
                INSERT INTO packages (id, title)
                VALUES (?1, ?2)
                ON CONFLICT(id) DO UPDATE SET title = excluded.title
            ",
        )
        .bind(package_id)
        .bind(package.title())
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        // Blocks are replaced wholesale; block_questions cascade.
        sqlx::query("DELETE FROM blocks WHERE package_id = ?1")
            .bind(package_id)
            .execute(&mut *tx)
            .await
            .map_err(conn)?;

        for (position, block) in package.blocks().iter().enumerate() {
            let position = usize_i64("block position", position)?;
            sqlx::query(
                r"
                    INSERT INTO blocks (package_id, position, id, name, duration_minutes)
                    VALUES (?1, ?2, ?3, ?4, ?5)
                ",
            )
            .bind(package_id)
            .bind(position)
            .bind(id_i64("block_id", block.id().value())?)
            .bind(block.name())
            .bind(i64::from(block.duration_minutes()))
            .execute(&mut *tx)
            .await
            .map_err(conn)?;

            for (q_position, question_id) in block.question_ids().iter().enumerate() {
                sqlx::query(
                    r"
                        INSERT INTO block_questions (package_id, block_position, position, question_id)
                        VALUES (?1, ?2, ?3, ?4)
                    ",
                )
                .bind(package_id)
                .bind(position)
                .bind(usize_i64("question position", q_position)?)
                .bind(id_i64("question_id", question_id.value())?)
                .execute(&mut *tx)
                .await
                .map_err(conn)?;
            }
        }

        tx.commit().await.map_err(conn)?;
        Ok(())
    }

    async fn get_package(&self, id: PackageId) -> Result<Option<TryoutPackage>, StorageError> {
        let id = id_i64("package_id", id.value())?;
        let row = sqlx::query("SELECT id, title FROM packages WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        match row {
            Some(row) => {
                let title: String = row.try_get("title").map_err(ser)?;
                self.load_package(id, title).await.map(Some)
            }
            None => Ok(None),
        }
    }

    async fn list_packages(&self, limit: u32) -> Result<Vec<TryoutPackage>, StorageError> {
        let rows = sqlx::query("SELECT id, title FROM packages ORDER BY id ASC LIMIT ?1")
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let id: i64 = row.try_get("id").map_err(ser)?;
            let title: String = row.try_get("title").map_err(ser)?;
            out.push(self.load_package(id, title).await?);
        }
        Ok(out)
    }
}
