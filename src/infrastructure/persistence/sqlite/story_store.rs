//! SQLite Story Store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::DbPool;
use crate::application::ports::{
    ChapterRecord, NewChapter, StoreError, StoryPatch, StoryRecord, StoryStorePort,
};

/// SQLite Story Store
pub struct SqliteStoryStore {
    pool: DbPool,
}

impl SqliteStoryStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn db_err(e: sqlx::Error) -> StoreError {
    StoreError::DatabaseError(e.to_string())
}

fn parse_uuid(value: &str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(value).map_err(|e| StoreError::SerializationError(e.to_string()))
}

fn parse_time(value: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StoreError::SerializationError(e.to_string()))
}

const STORY_COLUMNS: &str =
    "id, title, content, genre, tone, author_id, created_at, updated_at, last_saved_at";

#[derive(FromRow)]
struct StoryRow {
    id: String,
    title: String,
    content: String,
    genre: String,
    tone: String,
    author_id: String,
    created_at: String,
    updated_at: String,
    last_saved_at: Option<String>,
}

impl TryFrom<StoryRow> for StoryRecord {
    type Error = StoreError;

    fn try_from(row: StoryRow) -> Result<Self, Self::Error> {
        Ok(StoryRecord {
            id: parse_uuid(&row.id)?,
            title: row.title,
            content: row.content,
            genre: row.genre,
            tone: row.tone,
            author_id: row.author_id,
            created_at: parse_time(&row.created_at)?,
            updated_at: parse_time(&row.updated_at)?,
            last_saved_at: row.last_saved_at.as_deref().map(parse_time).transpose()?,
        })
    }
}

#[derive(FromRow)]
struct ChapterRow {
    id: String,
    story_id: String,
    title: String,
    content: String,
    chapter_number: i64,
    created_at: String,
}

impl TryFrom<ChapterRow> for ChapterRecord {
    type Error = StoreError;

    fn try_from(row: ChapterRow) -> Result<Self, Self::Error> {
        Ok(ChapterRecord {
            id: parse_uuid(&row.id)?,
            story_id: parse_uuid(&row.story_id)?,
            title: row.title,
            content: row.content,
            chapter_number: row.chapter_number as u32,
            created_at: parse_time(&row.created_at)?,
        })
    }
}

#[async_trait]
impl StoryStorePort for SqliteStoryStore {
    async fn get_story(&self, id: Uuid) -> Result<Option<StoryRecord>, StoreError> {
        let row: Option<StoryRow> = sqlx::query_as(&format!(
            "SELECT {} FROM stories WHERE id = ?",
            STORY_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(StoryRecord::try_from).transpose()
    }

    async fn set_story(&self, id: Uuid, patch: StoryPatch) -> Result<(), StoreError> {
        // 读-改-写放在同一事务中，保持 merge 语义
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let existing: Option<StoryRow> = sqlx::query_as(&format!(
            "SELECT {} FROM stories WHERE id = ?",
            STORY_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err)?;

        let now = Utc::now();
        let record = match existing {
            Some(row) => {
                let mut record = StoryRecord::try_from(row)?;
                patch.apply_to(&mut record, now);
                record
            }
            None => patch.into_record(id, now),
        };

        sqlx::query(
            r#"
            INSERT INTO stories (id, title, content, genre, tone, author_id, created_at, updated_at, last_saved_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                content = excluded.content,
                genre = excluded.genre,
                tone = excluded.tone,
                author_id = excluded.author_id,
                updated_at = excluded.updated_at,
                last_saved_at = excluded.last_saved_at
            "#,
        )
        .bind(record.id.to_string())
        .bind(&record.title)
        .bind(&record.content)
        .bind(&record.genre)
        .bind(&record.tone)
        .bind(&record.author_id)
        .bind(record.created_at.to_rfc3339())
        .bind(record.updated_at.to_rfc3339())
        .bind(record.last_saved_at.map(|t| t.to_rfc3339()))
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;
        Ok(())
    }

    async fn delete_story(&self, id: Uuid) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        sqlx::query("DELETE FROM chapters WHERE story_id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        let result = sqlx::query("DELETE FROM stories WHERE id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }

        tx.commit().await.map_err(db_err)?;
        Ok(())
    }

    async fn list_stories(&self, author_id: &str) -> Result<Vec<StoryRecord>, StoreError> {
        let rows: Vec<StoryRow> = sqlx::query_as(&format!(
            "SELECT {} FROM stories WHERE author_id = ? ORDER BY updated_at DESC",
            STORY_COLUMNS
        ))
        .bind(author_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter().map(StoryRecord::try_from).collect()
    }

    async fn list_chapters(&self, story_id: Uuid) -> Result<Vec<ChapterRecord>, StoreError> {
        let rows: Vec<ChapterRow> = sqlx::query_as(
            "SELECT id, story_id, title, content, chapter_number, created_at FROM chapters WHERE story_id = ? ORDER BY chapter_number",
        )
        .bind(story_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter().map(ChapterRecord::try_from).collect()
    }

    async fn create_chapter(
        &self,
        story_id: Uuid,
        chapter: NewChapter,
    ) -> Result<Uuid, StoreError> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO chapters (id, story_id, title, content, chapter_number, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(story_id.to_string())
        .bind(&chapter.title)
        .bind(&chapter.content)
        .bind(chapter.chapter_number as i64)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(id)
    }

    async fn update_chapter(&self, chapter: &ChapterRecord) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE chapters
            SET title = ?, content = ?, chapter_number = ?
            WHERE id = ? AND story_id = ?
            "#,
        )
        .bind(&chapter.title)
        .bind(&chapter.content)
        .bind(chapter.chapter_number as i64)
        .bind(chapter.id.to_string())
        .bind(chapter.story_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(chapter.id.to_string()));
        }
        Ok(())
    }

    async fn delete_chapter(&self, story_id: Uuid, chapter_id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM chapters WHERE id = ? AND story_id = ?")
            .bind(chapter_id.to_string())
            .bind(story_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(chapter_id.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::persistence::sqlite::{create_pool, run_migrations, DatabaseConfig};

    async fn store() -> SqliteStoryStore {
        let pool = create_pool(&DatabaseConfig::in_memory()).await.unwrap();
        run_migrations(&pool).await.unwrap();
        SqliteStoryStore::new(pool)
    }

    fn chapter(number: u32) -> NewChapter {
        NewChapter {
            title: format!("Chapter {}", number),
            content: format!("body {}", number),
            chapter_number: number,
        }
    }

    #[tokio::test]
    async fn test_set_story_creates_then_merges() {
        let store = store().await;
        let id = Uuid::new_v4();

        store
            .set_story(
                id,
                StoryPatch {
                    title: Some("Tale".to_string()),
                    content: Some("v1".to_string()),
                    genre: Some("mystery".to_string()),
                    author_id: Some("alice".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let saved_at = Utc::now();
        store
            .set_story(
                id,
                StoryPatch {
                    content: Some("v2".to_string()),
                    last_saved_at: Some(saved_at),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let story = store.get_story(id).await.unwrap().unwrap();
        assert_eq!(story.title, "Tale");
        assert_eq!(story.genre, "mystery");
        assert_eq!(story.content, "v2");
        assert_eq!(
            story.last_saved_at.map(|t| t.timestamp_millis()),
            Some(saved_at.timestamp_millis())
        );
    }

    #[tokio::test]
    async fn test_list_stories_filters_by_author() {
        let store = store().await;
        for author in ["alice", "alice", "bob"] {
            store
                .set_story(
                    Uuid::new_v4(),
                    StoryPatch {
                        title: Some("t".to_string()),
                        author_id: Some(author.to_string()),
                        ..Default::default()
                    },
                )
                .await
                .unwrap();
        }

        assert_eq!(store.list_stories("alice").await.unwrap().len(), 2);
        assert_eq!(store.list_stories("bob").await.unwrap().len(), 1);
        assert!(store.list_stories("carol").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_chapter_crud_and_cascade() {
        let store = store().await;
        let story_id = Uuid::new_v4();
        store
            .set_story(
                story_id,
                StoryPatch {
                    title: Some("Tale".to_string()),
                    author_id: Some("alice".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        store.create_chapter(story_id, chapter(2)).await.unwrap();
        let first = store.create_chapter(story_id, chapter(1)).await.unwrap();

        let chapters = store.list_chapters(story_id).await.unwrap();
        assert_eq!(chapters.len(), 2);
        assert_eq!(chapters[0].id, first);

        let mut updated = chapters[0].clone();
        updated.content = "rewritten".to_string();
        store.update_chapter(&updated).await.unwrap();
        assert_eq!(
            store.list_chapters(story_id).await.unwrap()[0].content,
            "rewritten"
        );

        store.delete_chapter(story_id, first).await.unwrap();
        assert_eq!(store.list_chapters(story_id).await.unwrap().len(), 1);

        store.delete_story(story_id).await.unwrap();
        assert!(store.get_story(story_id).await.unwrap().is_none());
        assert!(store.list_chapters(story_id).await.unwrap().is_empty());
        assert!(matches!(
            store.delete_story(story_id).await,
            Err(StoreError::NotFound(_))
        ));
    }
}
