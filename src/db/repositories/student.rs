//! Student repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

use crate::listing::{BindValue, Selection};
use crate::models::Student;

/// Student repository trait
#[async_trait]
pub trait StudentRepository: Send + Sync {
    /// List students matching a resolved selection, with the unpaginated
    /// match count
    async fn list(&self, selection: &Selection) -> Result<(Vec<Student>, i64)>;

    /// Insert a new student
    async fn create(&self, name: &str, branch: &str, student_id: &str) -> Result<Student>;

    /// Get a student by database id
    async fn get(&self, id: i64) -> Result<Option<Student>>;

    /// Replace all fields of a student; false when the id does not exist
    async fn update(&self, student: &Student) -> Result<bool>;

    /// Delete a student; false when the id does not exist
    async fn delete(&self, id: i64) -> Result<bool>;
}

/// SQLx-based student repository
pub struct SqlxStudentRepository {
    pool: SqlitePool,
}

impl SqlxStudentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for dependency injection
    pub fn boxed(pool: SqlitePool) -> Arc<dyn StudentRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl StudentRepository for SqlxStudentRepository {
    async fn list(&self, selection: &Selection) -> Result<(Vec<Student>, i64)> {
        let count_sql = format!("SELECT COUNT(*) FROM students{}", selection.where_sql);
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
            .context("Failed to count students")?;

        let sql = format!(
            "SELECT id, name, branch, student_id FROM students{} {} LIMIT ? OFFSET ?",
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
            .context("Failed to list students")?;

        let students = rows.iter().map(row_to_student).collect::<Result<Vec<_>>>()?;
        Ok((students, count))
    }

    async fn create(&self, name: &str, branch: &str, student_id: &str) -> Result<Student> {
        let result = sqlx::query(
            "INSERT INTO students (name, branch, student_id) VALUES (?, ?, ?)",
        )
        .bind(name)
        .bind(branch)
        .bind(student_id)
        .execute(&self.pool)
        .await
        .context("Failed to create student")?;

        Ok(Student {
            id: result.last_insert_rowid(),
            name: name.to_string(),
            branch: branch.to_string(),
            student_id: student_id.to_string(),
        })
    }

    async fn get(&self, id: i64) -> Result<Option<Student>> {
        let row = sqlx::query("SELECT id, name, branch, student_id FROM students WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get student")?;

        match row {
            Some(row) => Ok(Some(row_to_student(&row)?)),
            None => Ok(None),
        }
    }

    async fn update(&self, student: &Student) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE students SET name = ?, branch = ?, student_id = ? WHERE id = ?",
        )
        .bind(&student.name)
        .bind(&student.branch)
        .bind(&student.student_id)
        .bind(student.id)
        .execute(&self.pool)
        .await
        .context("Failed to update student")?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM students WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete student")?;

        Ok(result.rows_affected() > 0)
    }
}

fn row_to_student(row: &sqlx::sqlite::SqliteRow) -> Result<Student> {
    Ok(Student {
        id: row.get("id"),
        name: row.get("name"),
        branch: row.get("branch"),
        student_id: row.get("student_id"),
    })
}
