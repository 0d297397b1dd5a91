//! Blog repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

use crate::listing::{BindValue, Selection};
use crate::models::Blog;

/// Blog repository trait
#[async_trait]
pub trait BlogRepository: Send + Sync {
    async fn list(&self, selection: &Selection) -> Result<(Vec<Blog>, i64)>;
    async fn create(&self, blog_title: &str, blog_body: &str) -> Result<Blog>;
    async fn get(&self, id: i64) -> Result<Option<Blog>>;
    async fn update(&self, blog: &Blog) -> Result<bool>;
    async fn delete(&self, id: i64) -> Result<bool>;
}

/// SQLx-based blog repository
pub struct SqlxBlogRepository {
    pool: SqlitePool,
}

impl SqlxBlogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: SqlitePool) -> Arc<dyn BlogRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl BlogRepository for SqlxBlogRepository {
    async fn list(&self, selection: &Selection) -> Result<(Vec<Blog>, i64)> {
        let count_sql = format!("SELECT COUNT(*) FROM blogs{}", selection.where_sql);
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
            .context("Failed to count blogs")?;

        let sql = format!(
            "SELECT id, blog_title, blog_body FROM blogs{} {} LIMIT ? OFFSET ?",
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
            .context("Failed to list blogs")?;

        let blogs = rows.iter().map(row_to_blog).collect::<Result<Vec<_>>>()?;
        Ok((blogs, count))
    }

    async fn create(&self, blog_title: &str, blog_body: &str) -> Result<Blog> {
        let result = sqlx::query("INSERT INTO blogs (blog_title, blog_body) VALUES (?, ?)")
            .bind(blog_title)
            .bind(blog_body)
            .execute(&self.pool)
            .await
            .context("Failed to create blog")?;

        Ok(Blog {
            id: result.last_insert_rowid(),
            blog_title: blog_title.to_string(),
            blog_body: blog_body.to_string(),
        })
    }

    async fn get(&self, id: i64) -> Result<Option<Blog>> {
        let row = sqlx::query("SELECT id, blog_title, blog_body FROM blogs WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get blog")?;

        match row {
            Some(row) => Ok(Some(row_to_blog(&row)?)),
            None => Ok(None),
        }
    }

    async fn update(&self, blog: &Blog) -> Result<bool> {
        let result = sqlx::query("UPDATE blogs SET blog_title = ?, blog_body = ? WHERE id = ?")
            .bind(&blog.blog_title)
            .bind(&blog.blog_body)
            .bind(blog.id)
            .execute(&self.pool)
            .await
            .context("Failed to update blog")?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM blogs WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete blog")?;

        Ok(result.rows_affected() > 0)
    }
}

fn row_to_blog(row: &sqlx::sqlite::SqliteRow) -> Result<Blog> {
    Ok(Blog {
        id: row.get("id"),
        blog_title: row.get("blog_title"),
        blog_body: row.get("blog_body"),
    })
}
