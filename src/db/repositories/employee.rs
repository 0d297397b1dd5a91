//! Employee repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

use crate::listing::{BindValue, Selection};
use crate::models::Employee;

/// Employee repository trait
#[async_trait]
pub trait EmployeeRepository: Send + Sync {
    async fn list(&self, selection: &Selection) -> Result<(Vec<Employee>, i64)>;
    async fn create(&self, emp_name: &str, designation: &str, emp_id: &str) -> Result<Employee>;
    async fn get(&self, id: i64) -> Result<Option<Employee>>;
    async fn update(&self, employee: &Employee) -> Result<bool>;
    async fn delete(&self, id: i64) -> Result<bool>;
}

/// SQLx-based employee repository
pub struct SqlxEmployeeRepository {
    pool: SqlitePool,
}

impl SqlxEmployeeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: SqlitePool) -> Arc<dyn EmployeeRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl EmployeeRepository for SqlxEmployeeRepository {
    async fn list(&self, selection: &Selection) -> Result<(Vec<Employee>, i64)> {
        let count_sql = format!("SELECT COUNT(*) FROM employees{}", selection.where_sql);
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
            .context("Failed to count employees")?;

        let sql = format!(
            "SELECT id, emp_name, designation, emp_id FROM employees{} {} LIMIT ? OFFSET ?",
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
            .context("Failed to list employees")?;

        let employees = rows.iter().map(row_to_employee).collect::<Result<Vec<_>>>()?;
        Ok((employees, count))
    }

    async fn create(&self, emp_name: &str, designation: &str, emp_id: &str) -> Result<Employee> {
        let result = sqlx::query(
            "INSERT INTO employees (emp_name, designation, emp_id) VALUES (?, ?, ?)",
        )
        .bind(emp_name)
        .bind(designation)
        .bind(emp_id)
        .execute(&self.pool)
        .await
        .context("Failed to create employee")?;

        Ok(Employee {
            id: result.last_insert_rowid(),
            emp_name: emp_name.to_string(),
            designation: designation.to_string(),
            emp_id: emp_id.to_string(),
        })
    }

    async fn get(&self, id: i64) -> Result<Option<Employee>> {
        let row = sqlx::query(
            "SELECT id, emp_name, designation, emp_id FROM employees WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get employee")?;

        match row {
            Some(row) => Ok(Some(row_to_employee(&row)?)),
            None => Ok(None),
        }
    }

    async fn update(&self, employee: &Employee) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE employees SET emp_name = ?, designation = ?, emp_id = ? WHERE id = ?",
        )
        .bind(&employee.emp_name)
        .bind(&employee.designation)
        .bind(&employee.emp_id)
        .bind(employee.id)
        .execute(&self.pool)
        .await
        .context("Failed to update employee")?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM employees WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete employee")?;

        Ok(result.rows_affected() > 0)
    }
}

fn row_to_employee(row: &sqlx::sqlite::SqliteRow) -> Result<Employee> {
    Ok(Employee {
        id: row.get("id"),
        emp_name: row.get("emp_name"),
        designation: row.get("designation"),
        emp_id: row.get("emp_id"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::employees::EMPLOYEE_POLICY;
    use crate::db::{create_test_pool, migrations};
    use std::collections::BTreeMap;

    async fn setup_test_repo() -> SqlxEmployeeRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxEmployeeRepository::new(pool)
    }

    fn resolve(pairs: &[(&str, &str)]) -> Selection {
        let params: BTreeMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        EMPLOYEE_POLICY.resolve(&params).expect("resolve failed")
    }

    #[tokio::test]
    async fn test_create_and_get_roundtrip() {
        let repo = setup_test_repo().await;
        let created = repo
            .create("Grace Hopper", "Engineer", "E-001")
            .await
            .unwrap();
        let found = repo.get(created.id).await.unwrap().unwrap();
        assert_eq!(found, created);
    }

    #[tokio::test]
    async fn test_designation_filter_exact_case_insensitive() {
        let repo = setup_test_repo().await;
        repo.create("Ada", "Manager", "E-1").await.unwrap();
        repo.create("Bob", "manager", "E-2").await.unwrap();
        repo.create("Cleo", "Senior Manager", "E-3").await.unwrap();

        let (_, count) = repo
            .list(&resolve(&[("designation", "MANAGER")]))
            .await
            .unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn test_name_filter_param_matches_emp_name_column() {
        let repo = setup_test_repo().await;
        repo.create("Bob Smith", "Dev", "E-1").await.unwrap();
        repo.create("Alice Jones", "Dev", "E-2").await.unwrap();

        let (employees, count) = repo.list(&resolve(&[("name", "bob")])).await.unwrap();
        assert_eq!(count, 1);
        assert_eq!(employees[0].emp_name, "Bob Smith");
    }

    #[tokio::test]
    async fn test_default_ordering_by_emp_name() {
        let repo = setup_test_repo().await;
        repo.create("Zed", "Dev", "E-1").await.unwrap();
        repo.create("Amy", "Dev", "E-2").await.unwrap();

        let (employees, _) = repo.list(&resolve(&[])).await.unwrap();
        assert_eq!(employees[0].emp_name, "Amy");
    }

    #[tokio::test]
    async fn test_update_missing_returns_false() {
        let repo = setup_test_repo().await;
        let ghost = Employee {
            id: 9,
            emp_name: "x".to_string(),
            designation: "y".to_string(),
            emp_id: "z".to_string(),
        };
        assert!(!repo.update(&ghost).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_then_get_returns_none() {
        let repo = setup_test_repo().await;
        let created = repo.create("Ada", "Dev", "E-1").await.unwrap();
        assert!(repo.delete(created.id).await.unwrap());
        assert!(repo.get(created.id).await.unwrap().is_none());
    }
}
