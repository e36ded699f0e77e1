use async_trait::async_trait;
use lexi_domain::entities::WordList;
use lexi_domain::error::{Error, Result};
use lexi_domain::ports::repositories::WordListRepository;
use lexi_domain::value_objects::{UserId, WordListId};
use sqlx::{Row, SqlitePool};

use super::row_to_json_error;

/// SQLite-backed [`WordListRepository`]. Global lists have `owner = NULL`
/// and are visible to every caller.
pub struct SqliteWordListRepository {
    pool: SqlitePool,
}

impl SqliteWordListRepository {
    /// Build a new repository over an already-migrated pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WordListRepository for SqliteWordListRepository {
    async fn insert(&self, word_list: &WordList) -> Result<()> {
        let data = serde_json::to_string(word_list)?;
        sqlx::query("INSERT INTO word_lists (id, owner, data) VALUES (?, ?, ?)")
            .bind(word_list.id.to_string())
            .bind(word_list.owner.map(|o| o.to_string()))
            .bind(data)
            .execute(&self.pool)
            .await
            .map_err(|e| row_to_json_error("insert word list", e))?;
        Ok(())
    }

    async fn get(&self, id: WordListId) -> Result<WordList> {
        let row = sqlx::query("SELECT data FROM word_lists WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| row_to_json_error("fetch word list", e))?
            .ok_or_else(|| Error::not_found(format!("word list {id}")))?;
        let data: String = row.get("data");
        Ok(serde_json::from_str(&data)?)
    }

    async fn update(&self, word_list: &WordList) -> Result<()> {
        let data = serde_json::to_string(word_list)?;
        let affected = sqlx::query("UPDATE word_lists SET owner = ?, data = ? WHERE id = ?")
            .bind(word_list.owner.map(|o| o.to_string()))
            .bind(data)
            .bind(word_list.id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| row_to_json_error("update word list", e))?
            .rows_affected();
        if affected == 0 {
            return Err(Error::not_found(format!("word list {}", word_list.id)));
        }
        Ok(())
    }

    async fn delete(&self, id: WordListId) -> Result<()> {
        let affected = sqlx::query("DELETE FROM word_lists WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| row_to_json_error("delete word list", e))?
            .rows_affected();
        if affected == 0 {
            return Err(Error::not_found(format!("word list {id}")));
        }
        Ok(())
    }

    async fn list_visible_to(&self, owner: UserId) -> Result<Vec<WordList>> {
        let rows = sqlx::query("SELECT data FROM word_lists WHERE owner = ? OR owner IS NULL ORDER BY rowid DESC")
            .bind(owner.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| row_to_json_error("list word lists", e))?;
        rows.into_iter()
            .map(|row| {
                let data: String = row.get("data");
                Ok(serde_json::from_str(&data)?)
            })
            .collect()
    }
}
