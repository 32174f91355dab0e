//! Repository for the `projects` table.

use sqlx::{PgPool, Postgres, Transaction};
use worklog_core::editor::ProjectFields;
use worklog_core::search::{like_pattern, page_offset, total_pages};
use worklog_core::slug::{parse_numeric_key, slugify, unique_slug};
use worklog_core::types::DbId;

use crate::models::project::{CreateProject, Project, ProjectPage};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, slug, description, created_at, updated_at";

/// Provides CRUD operations for projects.
pub struct ProjectRepo;

impl ProjectRepo {
    /// Insert a new project with a unique slug derived from its name.
    pub(crate) async fn create_in(
        tx: &mut Transaction<'_, Postgres>,
        input: &CreateProject,
    ) -> Result<Project, sqlx::Error> {
        let slug = Self::free_slug_in(tx, &input.name, None).await?;
        let query = format!(
            "INSERT INTO projects (name, slug, description) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(&input.name)
            .bind(&slug)
            .bind(&input.description)
            .fetch_one(&mut **tx)
            .await
    }

    /// Find a project by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Project>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects WHERE id = $1");
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a project by its slug.
    pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Project>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects WHERE slug = $1");
        sqlx::query_as::<_, Project>(&query)
            .bind(slug)
            .fetch_optional(pool)
            .await
    }

    /// Resolve a path segment that is either a numeric id or a slug.
    ///
    /// Slugs are never purely numeric, so digits are always looked up as an
    /// id.
    pub async fn find_by_key(pool: &PgPool, key: &str) -> Result<Option<Project>, sqlx::Error> {
        match parse_numeric_key(key) {
            Some(id) => Self::find_by_id(pool, id).await,
            None => Self::find_by_slug(pool, key).await,
        }
    }

    /// Lock a project row for the rest of the transaction.
    ///
    /// Every write to a project's task collection goes through this lock, so
    /// concurrent edits and reorders of the same project are serialized.
    pub(crate) async fn lock_in(
        tx: &mut Transaction<'_, Postgres>,
        id: DbId,
    ) -> Result<Option<Project>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await
    }

    /// List one page of projects, most recently created first.
    ///
    /// `search` filters by a case-insensitive substring match on the name.
    pub async fn list_page(
        pool: &PgPool,
        page: i64,
        per_page: i64,
        search: Option<&str>,
    ) -> Result<ProjectPage, sqlx::Error> {
        let pattern = search.map(like_pattern);

        let total_count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM projects WHERE ($1::text IS NULL OR name ILIKE $1)",
        )
        .bind(&pattern)
        .fetch_one(pool)
        .await?;

        let query = format!(
            "SELECT {COLUMNS} FROM projects \
             WHERE ($1::text IS NULL OR name ILIKE $1) \
             ORDER BY created_at DESC, id DESC \
             LIMIT $2 OFFSET $3"
        );
        let projects = sqlx::query_as::<_, Project>(&query)
            .bind(&pattern)
            .bind(per_page)
            .bind(page_offset(page, per_page))
            .fetch_all(pool)
            .await?;

        Ok(ProjectPage {
            projects,
            current_page: page,
            total_pages: total_pages(total_count, per_page),
            total_count,
            per_page,
        })
    }

    /// Overwrite name and description of a locked project.
    ///
    /// The slug is recomputed only when the name changes.
    pub(crate) async fn replace_fields_in(
        tx: &mut Transaction<'_, Postgres>,
        current: &Project,
        fields: &ProjectFields,
    ) -> Result<Project, sqlx::Error> {
        let slug = if fields.name == current.name {
            current.slug.clone()
        } else {
            Self::free_slug_in(tx, &fields.name, Some(current.id)).await?
        };

        let query = format!(
            "UPDATE projects SET name = $2, description = $3, slug = $4 \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(current.id)
            .bind(&fields.name)
            .bind(&fields.description)
            .bind(&slug)
            .fetch_one(&mut **tx)
            .await
    }

    /// Delete a project and, via `ON DELETE CASCADE`, all of its tasks.
    ///
    /// Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Pick an unused slug for `name`, ignoring the project `exclude`.
    async fn free_slug_in(
        tx: &mut Transaction<'_, Postgres>,
        name: &str,
        exclude: Option<DbId>,
    ) -> Result<String, sqlx::Error> {
        let base = slugify(name);
        let taken: Vec<String> = sqlx::query_scalar(
            "SELECT slug FROM projects \
             WHERE (slug = $1 OR slug LIKE $2) \
               AND ($3::bigint IS NULL OR id <> $3)",
        )
        .bind(&base)
        .bind(format!("{base}-%"))
        .bind(exclude)
        .fetch_all(&mut **tx)
        .await?;
        Ok(unique_slug(&base, &taken))
    }
}
