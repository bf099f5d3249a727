use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{
    ContactMethod, Image, NewImage, NewOrderForm, OrderForm, UpdateImageRequest,
    UpdateOrderFormRequest,
};

/// ImageQuery
///
/// Filter, search, ordering and paging options for the admin image listing.
#[derive(Debug, Clone, Default)]
pub struct ImageQuery {
    /// Exact filter on the approval flag.
    pub approved: Option<bool>,
    /// Exact filter on the upload day (the date part of `upload_date`).
    pub upload_date: Option<NaiveDate>,
    /// Case-insensitive substring search over title/original_filename/ip_address.
    pub search: Option<String>,
    /// One of upload_date/id/title, with a `-` prefix for descending.
    pub ordering: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

/// OrderFormQuery
///
/// Filter, search, ordering and paging options for the admin order-form listing.
#[derive(Debug, Clone, Default)]
pub struct OrderFormQuery {
    pub contact_method: Option<ContactMethod>,
    /// Exact filter on the creation day (the date part of `created_at`).
    pub created_at: Option<NaiveDate>,
    /// Case-insensitive substring search over name/phone.
    pub search: Option<String>,
    /// One of created_at/id/name, with a `-` prefix for descending.
    pub ordering: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

/// Repository Trait
///
/// Defines the abstract contract for all persistence operations. This is the core
/// of the Repository Abstraction pattern, allowing the handlers to interact with
/// the data layer without knowing the specific implementation (Postgres, in-memory
/// test double, etc.).
///
/// All methods surface `sqlx::Error` to the caller so that persistence failures
/// become 5xx responses instead of being silently swallowed.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Images: public surface ---

    /// Approved images only, newest upload first.
    async fn list_approved_images(&self) -> sqlx::Result<Vec<Image>>;

    /// True if any image exists for this IP address. The read-then-write pair
    /// around this check is the race-prone half of the one-per-IP rule; see the
    /// insert-side note below.
    async fn ip_has_image(&self, ip: &str) -> sqlx::Result<bool>;

    /// Persists a freshly validated upload with `approved = false`.
    ///
    /// One-per-IP is enforced at the application level only (no unique
    /// constraint), so two concurrent uploads from the same IP can both pass
    /// `ip_has_image` before either commits. Known race, documented rather than
    /// guaranteed.
    async fn insert_image(&self, new: NewImage) -> sqlx::Result<Image>;

    // --- Images: admin surface ---

    /// Filtered/searched/ordered page of images plus the total count for the
    /// filtered set.
    async fn list_images(&self, query: ImageQuery) -> sqlx::Result<(i64, Vec<Image>)>;

    async fn get_image(&self, id: Uuid) -> sqlx::Result<Option<Image>>;

    /// Partial update; only fields present in the request change.
    async fn update_image(
        &self,
        id: Uuid,
        req: UpdateImageRequest,
    ) -> sqlx::Result<Option<Image>>;

    /// Removes the record only. Object-store cleanup is sequenced by the handler
    /// (file first, then record).
    async fn delete_image(&self, id: Uuid) -> sqlx::Result<bool>;

    // --- Order forms ---

    async fn insert_order_form(&self, new: NewOrderForm) -> sqlx::Result<OrderForm>;

    async fn list_order_forms(
        &self,
        query: OrderFormQuery,
    ) -> sqlx::Result<(i64, Vec<OrderForm>)>;

    async fn get_order_form(&self, id: Uuid) -> sqlx::Result<Option<OrderForm>>;

    async fn update_order_form(
        &self,
        id: Uuid,
        req: UpdateOrderFormRequest,
    ) -> sqlx::Result<Option<OrderForm>>;

    async fn delete_order_form(&self, id: Uuid) -> sqlx::Result<bool>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer access across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by PostgreSQL.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const IMAGE_COLUMNS: &str = "id, title, file_key, original_filename, ip_address, upload_date, approved";
const ORDER_FORM_COLUMNS: &str = "id, name, phone, contact_method, created_at";

/// Maps a client-supplied ordering key to a SQL ORDER BY clause through a strict
/// whitelist. Unknown keys fall back to the default ordering.
fn image_order_clause(ordering: Option<&str>) -> &'static str {
    match ordering {
        Some("upload_date") => "upload_date ASC",
        Some("id") => "id ASC",
        Some("-id") => "id DESC",
        Some("title") => "title ASC",
        Some("-title") => "title DESC",
        // "-upload_date" and everything unrecognized: newest first.
        _ => "upload_date DESC",
    }
}

fn order_form_order_clause(ordering: Option<&str>) -> &'static str {
    match ordering {
        Some("created_at") => "created_at ASC",
        Some("id") => "id ASC",
        Some("-id") => "id DESC",
        Some("name") => "name ASC",
        Some("-name") => "name DESC",
        _ => "created_at DESC",
    }
}

/// Appends the WHERE conditions of an image query to a builder. Shared between
/// the COUNT and SELECT queries so both always see the same filtered set.
fn push_image_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &ImageQuery) {
    if let Some(approved) = query.approved {
        builder.push(" AND approved = ");
        builder.push_bind(approved);
    }
    if let Some(day) = query.upload_date {
        builder.push(" AND upload_date::date = ");
        builder.push_bind(day);
    }
    if let Some(ref search) = query.search {
        let pattern = format!("%{}%", search);
        builder.push(" AND (title ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR original_filename ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR ip_address ILIKE ");
        builder.push_bind(pattern);
        builder.push(")");
    }
}

fn push_order_form_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &OrderFormQuery) {
    if let Some(method) = query.contact_method {
        builder.push(" AND contact_method = ");
        builder.push_bind(method);
    }
    if let Some(day) = query.created_at {
        builder.push(" AND created_at::date = ");
        builder.push_bind(day);
    }
    if let Some(ref search) = query.search {
        let pattern = format!("%{}%", search);
        builder.push(" AND (name ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR phone ILIKE ");
        builder.push_bind(pattern);
        builder.push(")");
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn list_approved_images(&self) -> sqlx::Result<Vec<Image>> {
        sqlx::query_as::<_, Image>(&format!(
            "SELECT {IMAGE_COLUMNS} FROM images WHERE approved = true ORDER BY upload_date DESC"
        ))
        .fetch_all(&self.pool)
        .await
    }

    async fn ip_has_image(&self, ip: &str) -> sqlx::Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM images WHERE ip_address = $1)")
                .bind(ip)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn insert_image(&self, new: NewImage) -> sqlx::Result<Image> {
        sqlx::query_as::<_, Image>(&format!(
            "INSERT INTO images (id, title, file_key, original_filename, ip_address, upload_date, approved) \
             VALUES ($1, $2, $3, $4, $5, NOW(), false) \
             RETURNING {IMAGE_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(new.title)
        .bind(new.file_key)
        .bind(new.original_filename)
        .bind(new.ip_address)
        .fetch_one(&self.pool)
        .await
    }

    /// Implements flexible search/filtering using QueryBuilder for safe
    /// parameterization; ordering columns go through a whitelist, never through
    /// client strings.
    async fn list_images(&self, query: ImageQuery) -> sqlx::Result<(i64, Vec<Image>)> {
        let mut count_builder: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM images WHERE 1 = 1");
        push_image_filters(&mut count_builder, &query);
        let count: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {IMAGE_COLUMNS} FROM images WHERE 1 = 1"));
        push_image_filters(&mut builder, &query);
        builder.push(format!(
            " ORDER BY {} LIMIT ",
            image_order_clause(query.ordering.as_deref())
        ));
        builder.push_bind(query.limit);
        builder.push(" OFFSET ");
        builder.push_bind(query.offset);

        let rows = builder
            .build_query_as::<Image>()
            .fetch_all(&self.pool)
            .await?;

        Ok((count, rows))
    }

    async fn get_image(&self, id: Uuid) -> sqlx::Result<Option<Image>> {
        sqlx::query_as::<_, Image>(&format!(
            "SELECT {IMAGE_COLUMNS} FROM images WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Uses COALESCE to only overwrite columns whose request field is `Some`.
    async fn update_image(
        &self,
        id: Uuid,
        req: UpdateImageRequest,
    ) -> sqlx::Result<Option<Image>> {
        sqlx::query_as::<_, Image>(&format!(
            "UPDATE images \
             SET title = COALESCE($2, title), approved = COALESCE($3, approved) \
             WHERE id = $1 \
             RETURNING {IMAGE_COLUMNS}"
        ))
        .bind(id)
        .bind(req.title)
        .bind(req.approved)
        .fetch_optional(&self.pool)
        .await
    }

    async fn delete_image(&self, id: Uuid) -> sqlx::Result<bool> {
        let result = sqlx::query("DELETE FROM images WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_order_form(&self, new: NewOrderForm) -> sqlx::Result<OrderForm> {
        sqlx::query_as::<_, OrderForm>(&format!(
            "INSERT INTO order_forms (id, name, phone, contact_method, created_at) \
             VALUES ($1, $2, $3, $4, NOW()) \
             RETURNING {ORDER_FORM_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(new.name)
        .bind(new.phone)
        .bind(new.contact_method)
        .fetch_one(&self.pool)
        .await
    }

    async fn list_order_forms(
        &self,
        query: OrderFormQuery,
    ) -> sqlx::Result<(i64, Vec<OrderForm>)> {
        let mut count_builder: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM order_forms WHERE 1 = 1");
        push_order_form_filters(&mut count_builder, &query);
        let count: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {ORDER_FORM_COLUMNS} FROM order_forms WHERE 1 = 1"
        ));
        push_order_form_filters(&mut builder, &query);
        builder.push(format!(
            " ORDER BY {} LIMIT ",
            order_form_order_clause(query.ordering.as_deref())
        ));
        builder.push_bind(query.limit);
        builder.push(" OFFSET ");
        builder.push_bind(query.offset);

        let rows = builder
            .build_query_as::<OrderForm>()
            .fetch_all(&self.pool)
            .await?;

        Ok((count, rows))
    }

    async fn get_order_form(&self, id: Uuid) -> sqlx::Result<Option<OrderForm>> {
        sqlx::query_as::<_, OrderForm>(&format!(
            "SELECT {ORDER_FORM_COLUMNS} FROM order_forms WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn update_order_form(
        &self,
        id: Uuid,
        req: UpdateOrderFormRequest,
    ) -> sqlx::Result<Option<OrderForm>> {
        sqlx::query_as::<_, OrderForm>(&format!(
            "UPDATE order_forms \
             SET name = COALESCE($2, name), phone = COALESCE($3, phone), \
                 contact_method = COALESCE($4, contact_method) \
             WHERE id = $1 \
             RETURNING {ORDER_FORM_COLUMNS}"
        ))
        .bind(id)
        .bind(req.name)
        .bind(req.phone)
        .bind(req.contact_method)
        .fetch_optional(&self.pool)
        .await
    }

    async fn delete_order_form(&self, id: Uuid) -> sqlx::Result<bool> {
        let result = sqlx::query("DELETE FROM order_forms WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
