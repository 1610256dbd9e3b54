use async_trait::async_trait;
use sqlx::{PgPool, Postgres, query_builder::QueryBuilder, types::Json};

use super::DocumentStore;
use crate::{
    error::StoreError,
    models::{ListOptions, Location, Question, RecordId},
};

const QUESTION_COLUMNS: &str = "id, title, description, options, created_at, updated_at";
const LOCATION_COLUMNS: &str = "id, name, description, scores, images, created_at, updated_at";

/// PostgresRepository
///
/// `DocumentStore` implementation backed by PostgreSQL. Each resource has its own table;
/// nested arrays are stored as JSONB and the unique field carries a `uq_` index
/// (see `migrations/`).
#[derive(Clone)]
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Turns a Postgres unique violation (SQLSTATE 23505) on `field`'s index into a
/// [`StoreError::Conflict`]; anything else is logged and wrapped.
fn classify(err: sqlx::Error, field: &'static str) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        let on_field = db_err
            .constraint()
            .is_none_or(|constraint| constraint.ends_with(field));
        if db_err.is_unique_violation() && on_field {
            return StoreError::Conflict(field);
        }
    }
    tracing::error!(error = %err, field, "Postgres query failed");
    StoreError::Database(err)
}

// Appends ` WHERE <column> = $n` when a filter is present.
fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, column: &str, filter: Option<&str>) {
    if let Some(value) = filter {
        builder.push(format!(" WHERE {column} = "));
        builder.push_bind(value.to_string());
    }
}

fn push_page(builder: &mut QueryBuilder<'_, Postgres>, options: &ListOptions) {
    builder.push(" ORDER BY created_at DESC, id DESC LIMIT ");
    builder.push_bind(options.limit());
    builder.push(" OFFSET ");
    builder.push_bind(options.skip());
}

#[async_trait]
impl DocumentStore<Question> for PostgresRepository {
    async fn find_by_id(&self, id: &RecordId) -> Result<Option<Question>, StoreError> {
        sqlx::query_as::<_, Question>(&format!(
            "SELECT {QUESTION_COLUMNS} FROM questions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| classify(e, "title"))
    }

    async fn list(&self, options: &ListOptions) -> Result<Vec<Question>, StoreError> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {QUESTION_COLUMNS} FROM questions"));
        push_filter(&mut builder, "title", options.filter.as_deref());
        push_page(&mut builder, options);

        builder
            .build_query_as::<Question>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| classify(e, "title"))
    }

    async fn count(&self, filter: Option<&str>) -> Result<i64, StoreError> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("SELECT COUNT(*) FROM questions");
        push_filter(&mut builder, "title", filter);

        builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| classify(e, "title"))
    }

    async fn insert(&self, doc: &Question) -> Result<Question, StoreError> {
        sqlx::query_as::<_, Question>(&format!(
            r#"
            INSERT INTO questions (id, title, description, options, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {QUESTION_COLUMNS}
            "#
        ))
        .bind(&doc.id)
        .bind(&doc.title)
        .bind(&doc.description)
        .bind(Json(&doc.options))
        .bind(doc.created_at)
        .bind(doc.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify(e, "title"))
    }

    async fn upsert(&self, doc: &Question) -> Result<Question, StoreError> {
        // created_at is only written on the insert branch.
        sqlx::query_as::<_, Question>(&format!(
            r#"
            INSERT INTO questions (id, title, description, options, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE
            SET title = EXCLUDED.title,
                description = EXCLUDED.description,
                options = EXCLUDED.options,
                updated_at = EXCLUDED.updated_at
            RETURNING {QUESTION_COLUMNS}
            "#
        ))
        .bind(&doc.id)
        .bind(&doc.title)
        .bind(&doc.description)
        .bind(Json(&doc.options))
        .bind(doc.created_at)
        .bind(doc.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify(e, "title"))
    }

    async fn save(&self, doc: &Question) -> Result<Option<Question>, StoreError> {
        sqlx::query_as::<_, Question>(&format!(
            r#"
            UPDATE questions
            SET title = $2, description = $3, options = $4, updated_at = $5
            WHERE id = $1
            RETURNING {QUESTION_COLUMNS}
            "#
        ))
        .bind(&doc.id)
        .bind(&doc.title)
        .bind(&doc.description)
        .bind(Json(&doc.options))
        .bind(doc.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| classify(e, "title"))
    }

    async fn delete(&self, id: &RecordId) -> Result<bool, StoreError> {
        sqlx::query("DELETE FROM questions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map(|res| res.rows_affected() > 0)
            .map_err(|e| classify(e, "title"))
    }
}

#[async_trait]
impl DocumentStore<Location> for PostgresRepository {
    async fn find_by_id(&self, id: &RecordId) -> Result<Option<Location>, StoreError> {
        sqlx::query_as::<_, Location>(&format!(
            "SELECT {LOCATION_COLUMNS} FROM locations WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| classify(e, "name"))
    }

    async fn list(&self, options: &ListOptions) -> Result<Vec<Location>, StoreError> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {LOCATION_COLUMNS} FROM locations"));
        push_filter(&mut builder, "name", options.filter.as_deref());
        push_page(&mut builder, options);

        builder
            .build_query_as::<Location>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| classify(e, "name"))
    }

    async fn count(&self, filter: Option<&str>) -> Result<i64, StoreError> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("SELECT COUNT(*) FROM locations");
        push_filter(&mut builder, "name", filter);

        builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| classify(e, "name"))
    }

    async fn insert(&self, doc: &Location) -> Result<Location, StoreError> {
        sqlx::query_as::<_, Location>(&format!(
            r#"
            INSERT INTO locations (id, name, description, scores, images, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {LOCATION_COLUMNS}
            "#
        ))
        .bind(&doc.id)
        .bind(&doc.name)
        .bind(&doc.description)
        .bind(Json(&doc.scores))
        .bind(Json(&doc.images))
        .bind(doc.created_at)
        .bind(doc.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify(e, "name"))
    }

    async fn upsert(&self, doc: &Location) -> Result<Location, StoreError> {
        sqlx::query_as::<_, Location>(&format!(
            r#"
            INSERT INTO locations (id, name, description, scores, images, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE
            SET name = EXCLUDED.name,
                description = EXCLUDED.description,
                scores = EXCLUDED.scores,
                images = EXCLUDED.images,
                updated_at = EXCLUDED.updated_at
            RETURNING {LOCATION_COLUMNS}
            "#
        ))
        .bind(&doc.id)
        .bind(&doc.name)
        .bind(&doc.description)
        .bind(Json(&doc.scores))
        .bind(Json(&doc.images))
        .bind(doc.created_at)
        .bind(doc.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify(e, "name"))
    }

    async fn save(&self, doc: &Location) -> Result<Option<Location>, StoreError> {
        sqlx::query_as::<_, Location>(&format!(
            r#"
            UPDATE locations
            SET name = $2, description = $3, scores = $4, images = $5, updated_at = $6
            WHERE id = $1
            RETURNING {LOCATION_COLUMNS}
            "#
        ))
        .bind(&doc.id)
        .bind(&doc.name)
        .bind(&doc.description)
        .bind(Json(&doc.scores))
        .bind(Json(&doc.images))
        .bind(doc.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| classify(e, "name"))
    }

    async fn delete(&self, id: &RecordId) -> Result<bool, StoreError> {
        sqlx::query("DELETE FROM locations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map(|res| res.rows_affected() > 0)
            .map_err(|e| classify(e, "name"))
    }
}
