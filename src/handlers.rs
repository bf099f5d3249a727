use axum::extract::{ConnectInfo, Multipart, OriginalUri, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use std::net::SocketAddr;
use uuid::Uuid;

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    models::{
        AdminImageResponse, CreateOrderFormRequest, CreateOrderFormResponse, ImageResponse,
        NewImage, NewOrderForm, OrderForm, UpdateImageRequest, UpdateOrderFormRequest,
        UploadImageResponse,
    },
    pagination::{Page, PageParams},
    repository::{ImageQuery, OrderFormQuery},
    validation,
};

// --- Query Parameter Structs ---

/// AdminImageListQuery
///
/// Accepted query parameters for the admin image listing: approval/date filters,
/// free-text search, whitelist ordering, and pagination.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct AdminImageListQuery {
    /// Filter on the approval flag.
    pub approved: Option<bool>,
    /// Filter on the upload day (YYYY-MM-DD).
    pub upload_date: Option<NaiveDate>,
    /// Substring search over title, original filename, and uploader IP.
    pub search: Option<String>,
    /// upload_date | id | title, `-` prefix for descending. Default `-upload_date`.
    pub ordering: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

/// AdminOrderFormListQuery
///
/// Accepted query parameters for the admin order-form listing.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct AdminOrderFormListQuery {
    /// Filter on the contact method (telegram | whatsapp | both).
    pub contact_method: Option<crate::models::ContactMethod>,
    /// Filter on the creation day (YYYY-MM-DD).
    pub created_at: Option<NaiveDate>,
    /// Substring search over name and phone.
    pub search: Option<String>,
    /// created_at | id | name, `-` prefix for descending. Default `-created_at`.
    pub ordering: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

// --- Public Handlers ---

/// list_images
///
/// [Public Route] Lists approved images only, newest upload first. Unapproved
/// records never leave the repository query, so a forgotten filter elsewhere
/// cannot leak pending uploads.
#[utoipa::path(
    get,
    path = "/images/",
    responses((status = 200, description = "Approved images", body = [ImageResponse]))
)]
pub async fn list_images(State(state): State<AppState>) -> ApiResult<Json<Vec<ImageResponse>>> {
    let images = state.repo.list_approved_images().await?;
    let body = images
        .iter()
        .map(|image| ImageResponse::from_record(image, &state.config))
        .collect();
    Ok(Json(body))
}

/// upload_image
///
/// [Public Route] Accepts a multipart upload with an `image` file field and an
/// optional `title` text field.
///
/// Flow: resolve the client IP (first `x-forwarded-for` entry, else the peer
/// address), reject with 403 when that IP already has an image, then validate
/// the file (presence, declared type, extension, magic bytes, size), store the
/// object under a date-partitioned key, and persist the record with
/// `approved = false`. `ip_address` and `original_filename` are always set
/// server-side; client-supplied values for them are ignored.
///
/// The IP existence check and the insert are not atomic: two simultaneous
/// uploads from one IP can both pass the check. Known race, accepted.
#[utoipa::path(
    post,
    path = "/images/",
    responses(
        (status = 201, description = "Uploaded, pending approval", body = UploadImageResponse),
        (status = 400, description = "Missing or invalid image file"),
        (status = 403, description = "IP address already has an upload")
    )
)]
pub async fn upload_image(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<UploadImageResponse>)> {
    let ip_address = validation::client_ip(&headers, peer);

    if state.repo.ip_has_image(&ip_address).await? {
        return Err(ApiError::DuplicateIpUpload);
    }

    let mut title: Option<String> = None;
    let mut file: Option<(String, Option<String>, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(e.to_string()))?
    {
        match field.name() {
            Some("title") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::Validation(e.to_string()))?;
                if !text.is_empty() {
                    title = Some(text);
                }
            }
            Some("image") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::Validation(e.to_string()))?;
                file = Some((filename, content_type, bytes.to_vec()));
            }
            _ => {}
        }
    }

    let (original_filename, content_type, bytes) = file.ok_or(ApiError::MissingFile)?;

    validation::validate_image(&original_filename, content_type.as_deref(), &bytes)?;

    // Date-partitioned object key derived from the upload time. The extension
    // has already passed the whitelist check above.
    let extension = original_filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    let file_key = format!(
        "images/{}/{}.{}",
        Utc::now().format("%Y/%m/%d"),
        Uuid::new_v4(),
        extension
    );

    state
        .storage
        .put_object(
            &file_key,
            &bytes,
            content_type.as_deref().unwrap_or("application/octet-stream"),
        )
        .await
        .map_err(ApiError::Storage)?;

    let image = state
        .repo
        .insert_image(NewImage {
            title,
            file_key,
            original_filename,
            ip_address,
        })
        .await?;

    tracing::info!(image_id = %image.id, ip = %image.ip_address, "image uploaded, pending approval");

    Ok((
        StatusCode::CREATED,
        Json(UploadImageResponse {
            detail: "Image uploaded successfully! It will be visible after approval.".to_string(),
            data: ImageResponse::from_record(&image, &state.config),
        }),
    ))
}

/// create_order_form
///
/// [Public Route] Validates and persists an order form. The phone number is
/// stripped to digits and must carry at least 13 of them; the normalized value
/// is what gets stored. Returns the created record alongside the confirmation
/// message.
#[utoipa::path(
    post,
    path = "/order-forms/",
    request_body = CreateOrderFormRequest,
    responses(
        (status = 201, description = "Submitted", body = CreateOrderFormResponse),
        (status = 400, description = "Validation failure")
    )
)]
pub async fn create_order_form(
    State(state): State<AppState>,
    Json(payload): Json<CreateOrderFormRequest>,
) -> ApiResult<(StatusCode, Json<CreateOrderFormResponse>)> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::Validation("Name must not be empty.".to_string()));
    }

    let phone = validation::normalize_phone(&payload.phone)?;

    let order = state
        .repo
        .insert_order_form(NewOrderForm {
            name: payload.name,
            phone,
            contact_method: payload.contact_method,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateOrderFormResponse {
            message: "Order form submitted successfully".to_string(),
            data: order,
        }),
    ))
}

// --- Admin Handlers: Images ---

/// admin_list_images
///
/// [Admin Route] Paginated listing of all images regardless of approval state,
/// with filtering, search, and whitelist ordering (default `-upload_date`).
#[utoipa::path(
    get,
    path = "/admin/images/",
    params(AdminImageListQuery),
    responses((status = 200, description = "Page of images"))
)]
pub async fn admin_list_images(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<AdminImageListQuery>,
) -> ApiResult<Json<Page<AdminImageResponse>>> {
    let params = PageParams {
        page: query.page,
        page_size: query.page_size,
    };

    let (count, images) = state
        .repo
        .list_images(ImageQuery {
            approved: query.approved,
            upload_date: query.upload_date,
            search: query.search,
            ordering: query.ordering,
            limit: params.limit(),
            offset: params.offset(),
        })
        .await?;

    let results = images
        .iter()
        .map(|image| AdminImageResponse::from_record(image, &state.config))
        .collect();

    Ok(Json(Page::new(
        uri.path(),
        uri.query(),
        &params,
        count,
        results,
    )))
}

/// admin_get_image
///
/// [Admin Route] Retrieves a single image by id, approved or not.
#[utoipa::path(
    get,
    path = "/admin/images/{id}/",
    params(("id" = Uuid, Path, description = "Image ID")),
    responses(
        (status = 200, description = "Found", body = AdminImageResponse),
        (status = 404, description = "Not Found")
    )
)]
pub async fn admin_get_image(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<AdminImageResponse>> {
    let image = state.repo.get_image(id).await?.ok_or(ApiError::NotFound)?;
    Ok(Json(AdminImageResponse::from_record(&image, &state.config)))
}

/// admin_update_image
///
/// [Admin Route] Partial update of an image: the approval flag (the moderation
/// gate) and the title. The stored file, uploader IP, and upload date are
/// immutable.
#[utoipa::path(
    patch,
    path = "/admin/images/{id}/",
    params(("id" = Uuid, Path, description = "Image ID")),
    request_body = UpdateImageRequest,
    responses(
        (status = 200, description = "Updated", body = AdminImageResponse),
        (status = 404, description = "Not Found")
    )
)]
pub async fn admin_update_image(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateImageRequest>,
) -> ApiResult<Json<AdminImageResponse>> {
    let image = state
        .repo
        .update_image(id, payload)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(AdminImageResponse::from_record(&image, &state.config)))
}

/// admin_delete_image
///
/// [Admin Route] Deletes an image record and its backing file.
///
/// Ordering: the object-store delete runs first (tolerating an already-missing
/// object), then the record delete. The two are not wrapped in a cross-store
/// transaction; a failure in either step is logged with the image id and file
/// key and propagated as a 5xx, possibly leaving the cleanup partial.
#[utoipa::path(
    delete,
    path = "/admin/images/{id}/",
    params(("id" = Uuid, Path, description = "Image ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn admin_delete_image(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let image = state.repo.get_image(id).await?.ok_or(ApiError::NotFound)?;
    let file_key = image.file_key.clone();

    if let Err(e) = state.storage.delete_object(&file_key).await {
        tracing::error!(image_id = %id, file_key = %file_key, error = %e, "error deleting image file");
        return Err(ApiError::Storage(e));
    }

    match state.repo.delete_image(id).await {
        Ok(_) => {
            tracing::info!(image_id = %id, file_key = %file_key, "admin deleted image");
            Ok(StatusCode::NO_CONTENT)
        }
        Err(e) => {
            tracing::error!(image_id = %id, file_key = %file_key, error = ?e, "error deleting image record");
            Err(e.into())
        }
    }
}

// --- Admin Handlers: Order Forms ---

/// admin_list_order_forms
///
/// [Admin Route] Paginated listing of order forms with filtering, search, and
/// whitelist ordering (default `-created_at`).
#[utoipa::path(
    get,
    path = "/admin/order-forms/",
    params(AdminOrderFormListQuery),
    responses((status = 200, description = "Page of order forms"))
)]
pub async fn admin_list_order_forms(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<AdminOrderFormListQuery>,
) -> ApiResult<Json<Page<OrderForm>>> {
    let params = PageParams {
        page: query.page,
        page_size: query.page_size,
    };

    let (count, results) = state
        .repo
        .list_order_forms(OrderFormQuery {
            contact_method: query.contact_method,
            created_at: query.created_at,
            search: query.search,
            ordering: query.ordering,
            limit: params.limit(),
            offset: params.offset(),
        })
        .await?;

    Ok(Json(Page::new(
        uri.path(),
        uri.query(),
        &params,
        count,
        results,
    )))
}

/// admin_get_order_form
///
/// [Admin Route] Retrieves a single order form by id.
#[utoipa::path(
    get,
    path = "/admin/order-forms/{id}/",
    params(("id" = Uuid, Path, description = "Order form ID")),
    responses(
        (status = 200, description = "Found", body = OrderForm),
        (status = 404, description = "Not Found")
    )
)]
pub async fn admin_get_order_form(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<OrderForm>> {
    let order = state
        .repo
        .get_order_form(id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(order))
}

/// admin_update_order_form
///
/// [Admin Route] Partial update of an order form. A provided phone number goes
/// through the same normalization and digit-count validation as on creation, so
/// the persisted value stays digit-only.
#[utoipa::path(
    patch,
    path = "/admin/order-forms/{id}/",
    params(("id" = Uuid, Path, description = "Order form ID")),
    request_body = UpdateOrderFormRequest,
    responses(
        (status = 200, description = "Updated", body = OrderForm),
        (status = 400, description = "Validation failure"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn admin_update_order_form(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(mut payload): Json<UpdateOrderFormRequest>,
) -> ApiResult<Json<OrderForm>> {
    if let Some(ref phone) = payload.phone {
        payload.phone = Some(validation::normalize_phone(phone)?);
    }
    if let Some(ref name) = payload.name {
        if name.trim().is_empty() {
            return Err(ApiError::Validation("Name must not be empty.".to_string()));
        }
    }

    let order = state
        .repo
        .update_order_form(id, payload)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(order))
}

/// admin_delete_order_form
///
/// [Admin Route] Deletes an order form, logging its id and name. Persistence
/// failures are logged with that context and re-raised rather than swallowed.
#[utoipa::path(
    delete,
    path = "/admin/order-forms/{id}/",
    params(("id" = Uuid, Path, description = "Order form ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn admin_delete_order_form(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let order = state
        .repo
        .get_order_form(id)
        .await?
        .ok_or(ApiError::NotFound)?;

    match state.repo.delete_order_form(id).await {
        Ok(_) => {
            tracing::info!(order_id = %id, name = %order.name, "admin deleted order form");
            Ok(StatusCode::NO_CONTENT)
        }
        Err(e) => {
            tracing::error!(order_id = %id, name = %order.name, error = ?e, "error deleting order form");
            Err(e.into())
        }
    }
}
