//! Storage access for schools.
//!
//! Handlers only see [`SchoolRepository`]; the libsql implementation backs the
//! running service and [`MemorySchoolRepository`] stands in for it in tests.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::db::Database;
use crate::model::{NewSchool, School};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] libsql::Error),
    #[error("statement returned no row: {0}")]
    MissingRow(&'static str),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait SchoolRepository: Send + Sync {
    async fn insert(&self, school: &NewSchool) -> Result<School, StoreError>;

    /// All schools, newest first.
    async fn get_all(&self) -> Result<Vec<School>, StoreError>;

    async fn get_by_id(&self, id: i64) -> Result<Option<School>, StoreError>;

    /// Replaces every mutable field of the school. `None` when no row has `id`.
    async fn update(&self, id: i64, school: &NewSchool) -> Result<Option<School>, StoreError>;

    /// Removes the school and hands back what was deleted.
    async fn delete(&self, id: i64) -> Result<Option<School>, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

const SCHOOL_COLUMNS: &str = "id, name, address, latitude, longitude, created_at";

pub struct LibsqlSchoolRepository {
    db: Arc<Database>,
}

impl LibsqlSchoolRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    fn row_to_school(row: &libsql::Row) -> Result<School, StoreError> {
        Ok(School {
            id: row.get(0)?,
            name: row.get(1)?,
            address: row.get(2)?,
            latitude: row.get(3)?,
            longitude: row.get(4)?,
            created_at: row.get(5)?,
        })
    }

    async fn query_one(
        &self,
        query: &str,
        params: impl libsql::params::IntoParams,
    ) -> Result<Option<School>, StoreError> {
        let mut rows = self.db.connection().query(query, params).await?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::row_to_school(&row)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl SchoolRepository for LibsqlSchoolRepository {
    async fn insert(&self, school: &NewSchool) -> Result<School, StoreError> {
        let query = format!(
            r#"
            INSERT INTO schools (name, address, latitude, longitude)
            VALUES (?, ?, ?, ?)
            RETURNING {SCHOOL_COLUMNS}
        "#
        );

        self.query_one(
            &query,
            libsql::params![
                school.name.as_str(),
                school.address.as_str(),
                school.latitude,
                school.longitude
            ],
        )
        .await?
        .ok_or(StoreError::MissingRow("insert"))
    }

    async fn get_all(&self) -> Result<Vec<School>, StoreError> {
        let query = format!("SELECT {SCHOOL_COLUMNS} FROM schools ORDER BY created_at DESC, id DESC");

        let mut rows = self.db.connection().query(&query, ()).await?;
        let mut schools = Vec::new();
        while let Some(row) = rows.next().await? {
            schools.push(Self::row_to_school(&row)?);
        }

        Ok(schools)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<School>, StoreError> {
        let query = format!("SELECT {SCHOOL_COLUMNS} FROM schools WHERE id = ?");
        self.query_one(&query, libsql::params![id]).await
    }

    async fn update(&self, id: i64, school: &NewSchool) -> Result<Option<School>, StoreError> {
        let query = format!(
            r#"
            UPDATE schools
            SET name = ?, address = ?, latitude = ?, longitude = ?
            WHERE id = ?
            RETURNING {SCHOOL_COLUMNS}
        "#
        );

        self.query_one(
            &query,
            libsql::params![
                school.name.as_str(),
                school.address.as_str(),
                school.latitude,
                school.longitude,
                id
            ],
        )
        .await
    }

    async fn delete(&self, id: i64) -> Result<Option<School>, StoreError> {
        let query = format!("DELETE FROM schools WHERE id = ? RETURNING {SCHOOL_COLUMNS}");
        self.query_one(&query, libsql::params![id]).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.db.connection().query("SELECT 1", ()).await?;
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    next_id: i64,
    schools: Vec<School>,
}

/// In-process repository keeping schools in insertion order.
#[derive(Debug, Default)]
pub struct MemorySchoolRepository {
    state: Mutex<MemoryState>,
    unavailable: bool,
}

impl MemorySchoolRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// A repository whose every call fails, for exercising error paths.
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.unavailable {
            return Err(StoreError::Unavailable("memory repository is offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl SchoolRepository for MemorySchoolRepository {
    async fn insert(&self, school: &NewSchool) -> Result<School, StoreError> {
        self.check()?;
        let mut state = self.state.lock().await;
        state.next_id += 1;

        let created = School {
            id: state.next_id,
            name: school.name.clone(),
            address: school.address.clone(),
            latitude: school.latitude,
            longitude: school.longitude,
            created_at: chrono::Utc::now()
                .format("%Y-%m-%dT%H:%M:%S%.3fZ")
                .to_string(),
        };
        state.schools.push(created.clone());
        Ok(created)
    }

    async fn get_all(&self) -> Result<Vec<School>, StoreError> {
        self.check()?;
        let state = self.state.lock().await;
        Ok(state.schools.iter().rev().cloned().collect())
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<School>, StoreError> {
        self.check()?;
        let state = self.state.lock().await;
        Ok(state.schools.iter().find(|s| s.id == id).cloned())
    }

    async fn update(&self, id: i64, school: &NewSchool) -> Result<Option<School>, StoreError> {
        self.check()?;
        let mut state = self.state.lock().await;
        let Some(existing) = state.schools.iter_mut().find(|s| s.id == id) else {
            return Ok(None);
        };

        existing.name = school.name.clone();
        existing.address = school.address.clone();
        existing.latitude = school.latitude;
        existing.longitude = school.longitude;
        Ok(Some(existing.clone()))
    }

    async fn delete(&self, id: i64) -> Result<Option<School>, StoreError> {
        self.check()?;
        let mut state = self.state.lock().await;
        let position = state.schools.iter().position(|s| s.id == id);
        Ok(position.map(|i| state.schools.remove(i)))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn new_school(name: &str, latitude: f64, longitude: f64) -> NewSchool {
        NewSchool {
            name: name.to_string(),
            address: format!("{name} Road"),
            latitude,
            longitude,
        }
    }

    async fn libsql_repo() -> LibsqlSchoolRepository {
        let db = Database::open(Path::new(":memory:")).await.unwrap();
        LibsqlSchoolRepository::new(Arc::new(db))
    }

    async fn exercise_crud(repo: &dyn SchoolRepository) {
        let first = repo.insert(&new_school("Alpha", 10.0, 20.0)).await.unwrap();
        let second = repo.insert(&new_school("Beta", -5.5, 0.0)).await.unwrap();
        assert!(second.id > first.id);
        assert!(!first.created_at.is_empty());

        let fetched = repo.get_by_id(first.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "Alpha");
        assert_eq!(fetched.address, "Alpha Road");
        assert_eq!(fetched.latitude, 10.0);
        assert_eq!(fetched.longitude, 20.0);

        let ids: Vec<i64> = repo.get_all().await.unwrap().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);

        let updated = repo
            .update(first.id, &new_school("Gamma", 1.0, 2.0))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.id, first.id);
        assert_eq!(updated.name, "Gamma");
        assert_eq!(updated.address, "Gamma Road");
        assert_eq!((updated.latitude, updated.longitude), (1.0, 2.0));
        assert_eq!(updated.created_at, first.created_at);

        assert!(repo.update(9999, &new_school("Nope", 0.0, 0.0)).await.unwrap().is_none());

        let deleted = repo.delete(second.id).await.unwrap().unwrap();
        assert_eq!(deleted.name, "Beta");
        assert!(repo.get_by_id(second.id).await.unwrap().is_none());
        assert!(repo.delete(second.id).await.unwrap().is_none());

        repo.ping().await.unwrap();
    }

    #[tokio::test]
    async fn libsql_repository_crud() {
        let repo = libsql_repo().await;
        exercise_crud(&repo).await;
    }

    #[tokio::test]
    async fn memory_repository_crud() {
        let repo = MemorySchoolRepository::new();
        exercise_crud(&repo).await;
    }

    #[tokio::test]
    async fn unavailable_repository_fails_every_call() {
        let repo = MemorySchoolRepository::unavailable();
        assert!(repo.ping().await.is_err());
        assert!(repo.get_all().await.is_err());
        assert!(matches!(
            repo.insert(&new_school("Alpha", 0.0, 0.0)).await,
            Err(StoreError::Unavailable(_))
        ));
    }
}
