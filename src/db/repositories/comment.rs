//! Comment repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

use crate::listing::{BindValue, Selection};
use crate::models::Comment;

/// Comment repository trait
#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn list(&self, selection: &Selection) -> Result<(Vec<Comment>, i64)>;
    async fn create(&self, comment: &str, blog: i64) -> Result<Comment>;
    async fn get(&self, id: i64) -> Result<Option<Comment>>;
    async fn update(&self, comment: &Comment) -> Result<bool>;
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Number of comments attached to a blog
    async fn count_for_blog(&self, blog: i64) -> Result<i64>;
}

/// SQLx-based comment repository
pub struct SqlxCommentRepository {
    pool: SqlitePool,
}

impl SqlxCommentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: SqlitePool) -> Arc<dyn CommentRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl CommentRepository for SqlxCommentRepository {
    async fn list(&self, selection: &Selection) -> Result<(Vec<Comment>, i64)> {
        let count_sql = format!("SELECT COUNT(*) FROM comments{}", selection.where_sql);
        let mut count_query = sqlx::query_scalar(&count_sql);
        for bind in &selection.binds {
            count_query = match bind {
                BindValue::Text(v) => count_query.bind(v),
                BindValue::Int(v) => count_query.bind(v),
            };
        }
        let count: i64 = count_query
            .fetch_one(&self.pool)
            .await
            .context("Failed to count comments")?;

        let sql = format!(
            "SELECT id, comment, blog_id FROM comments{} {} LIMIT ? OFFSET ?",
            selection.where_sql, selection.order_sql
        );
        let mut query = sqlx::query(&sql);
        for bind in &selection.binds {
            query = match bind {
                BindValue::Text(v) => query.bind(v),
                BindValue::Int(v) => query.bind(v),
            };
        }
        let rows = query
            .bind(selection.limit())
            .bind(selection.offset())
            .fetch_all(&self.pool)
            .await
            .context("Failed to list comments")?;

        let comments = rows.iter().map(row_to_comment).collect::<Result<Vec<_>>>()?;
        Ok((comments, count))
    }

    async fn create(&self, comment: &str, blog: i64) -> Result<Comment> {
        let result = sqlx::query("INSERT INTO comments (comment, blog_id) VALUES (?, ?)")
            .bind(comment)
            .bind(blog)
            .execute(&self.pool)
            .await
            .context("Failed to create comment")?;

        Ok(Comment {
            id: result.last_insert_rowid(),
            comment: comment.to_string(),
            blog,
        })
    }

    async fn get(&self, id: i64) -> Result<Option<Comment>> {
        let row = sqlx::query("SELECT id, comment, blog_id FROM comments WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get comment")?;

        match row {
            Some(row) => Ok(Some(row_to_comment(&row)?)),
            None => Ok(None),
        }
    }

    async fn update(&self, comment: &Comment) -> Result<bool> {
        let result = sqlx::query("UPDATE comments SET comment = ?, blog_id = ? WHERE id = ?")
            .bind(&comment.comment)
            .bind(comment.blog)
            .bind(comment.id)
            .execute(&self.pool)
            .await
            .context("Failed to update comment")?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete comment")?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_for_blog(&self, blog: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE blog_id = ?")
            .bind(blog)
            .fetch_one(&self.pool)
            .await
            .context("Failed to count comments for blog")?;
        Ok(count)
    }
}

fn row_to_comment(row: &sqlx::sqlite::SqliteRow) -> Result<Comment> {
    Ok(Comment {
        id: row.get("id"),
        comment: row.get("comment"),
        blog: row.get("blog_id"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::comments::COMMENT_POLICY;
    use crate::db::repositories::{BlogRepository, SqlxBlogRepository};
    use crate::db::{create_test_pool, migrations};
    use std::collections::BTreeMap;

    async fn setup() -> (SqlxCommentRepository, SqlxBlogRepository) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        (
            SqlxCommentRepository::new(pool.clone()),
            SqlxBlogRepository::new(pool),
        )
    }

    fn resolve(pairs: &[(&str, &str)]) -> Selection {
        let params: BTreeMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        COMMENT_POLICY.resolve(&params).expect("resolve failed")
    }

    #[tokio::test]
    async fn test_create_and_get_roundtrip() {
        let (comments, blogs) = setup().await;
        let blog = blogs.create("Post", "body").await.unwrap();

        let created = comments.create("Nice read", blog.id).await.unwrap();
        let found = comments.get(created.id).await.unwrap().unwrap();
        assert_eq!(found, created);
        assert_eq!(found.blog, blog.id);
    }

    #[tokio::test]
    async fn test_create_with_unknown_blog_fails() {
        let (comments, _) = setup().await;
        assert!(comments.create("orphan", 999).await.is_err());
    }

    #[tokio::test]
    async fn test_blog_filter_exact() {
        let (comments, blogs) = setup().await;
        let first = blogs.create("First", "body").await.unwrap();
        let second = blogs.create("Second", "body").await.unwrap();
        comments.create("a", first.id).await.unwrap();
        comments.create("b", first.id).await.unwrap();
        comments.create("c", second.id).await.unwrap();

        let (matched, count) = comments
            .list(&resolve(&[("blog", &first.id.to_string())]))
            .await
            .unwrap();
        assert_eq!(count, 2);
        assert!(matched.iter().all(|c| c.blog == first.id));
    }

    #[tokio::test]
    async fn test_default_ordering_newest_first() {
        let (comments, blogs) = setup().await;
        let blog = blogs.create("Post", "body").await.unwrap();
        comments.create("first", blog.id).await.unwrap();
        let latest = comments.create("second", blog.id).await.unwrap();

        let (listed, _) = comments.list(&resolve(&[])).await.unwrap();
        assert_eq!(listed[0].id, latest.id);
    }

    #[tokio::test]
    async fn test_count_for_blog() {
        let (comments, blogs) = setup().await;
        let blog = blogs.create("Post", "body").await.unwrap();
        assert_eq!(comments.count_for_blog(blog.id).await.unwrap(), 0);
        comments.create("a", blog.id).await.unwrap();
        comments.create("b", blog.id).await.unwrap();
        assert_eq!(comments.count_for_blog(blog.id).await.unwrap(), 2);
    }
}
