use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::AppConfig;

// --- Core Application Schemas (Mapped to Database) ---

/// Image
///
/// A user-submitted image record from the `images` table. Uploads start out
/// unapproved and become publicly visible only after a moderator flips the
/// `approved` flag.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Image {
    pub id: Uuid,
    // Optional display title; the only image field a client may set besides the file.
    pub title: Option<String>,
    // Object-store key, date-partitioned: images/YYYY/MM/DD/<uuid>.<ext>.
    pub file_key: String,
    // Filename as sent by the uploading client. Set server-side from the multipart part.
    pub original_filename: String,
    // Uploader address. Set server-side; the one-image-per-IP rule keys off this.
    pub ip_address: String,
    #[ts(type = "string")]
    pub upload_date: DateTime<Utc>,
    pub approved: bool,
}

/// ContactMethod
///
/// Enumerated preference for how an order-form submitter wishes to be reached.
/// Stored in Postgres as the `contact_method` enum type.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, sqlx::Type, Default,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "contact_method", rename_all = "lowercase")]
#[ts(export)]
pub enum ContactMethod {
    Telegram,
    #[default]
    Whatsapp,
    Both,
}

/// OrderForm
///
/// A contact/order submission from the `order_forms` table. The phone number is
/// persisted in normalized form (digits only).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct OrderForm {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub contact_method: ContactMethod,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

// --- Request Payloads (Input Schemas) ---

/// NewImage
///
/// Internal insert payload assembled by the upload handler after validation.
/// Everything except `title` is derived server-side; client-supplied values for
/// these fields are ignored.
#[derive(Debug, Clone)]
pub struct NewImage {
    pub title: Option<String>,
    pub file_key: String,
    pub original_filename: String,
    pub ip_address: String,
}

/// NewOrderForm
///
/// Internal insert payload for an order form, built after phone validation. The
/// phone field always holds the normalized (digit-only) value.
#[derive(Debug, Clone)]
pub struct NewOrderForm {
    pub name: String,
    pub phone: String,
    pub contact_method: ContactMethod,
}

/// UpdateImageRequest
///
/// Partial update payload for the admin image endpoint (PATCH /admin/images/{id}/).
/// Only `title` and `approved` are admin-mutable; omitted fields are left untouched.
/// A JSON `null` deserializes the same as an absent field, so a title cannot be
/// cleared back to null through this endpoint, only replaced.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateImageRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved: Option<bool>,
}

/// CreateOrderFormRequest
///
/// Input payload for the public order-form endpoint (POST /order-forms/).
/// `contact_method` defaults to whatsapp when omitted. The phone number is
/// validated and normalized before persistence.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateOrderFormRequest {
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub contact_method: ContactMethod,
}

/// UpdateOrderFormRequest
///
/// Partial update payload for the admin order-form endpoint
/// (PATCH /admin/order-forms/{id}/). A provided phone number is re-validated and
/// normalized just like on creation.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateOrderFormRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_method: Option<ContactMethod>,
}

// --- Response Schemas (Output) ---

/// ImageResponse
///
/// Public serialization of an image record. Carries a server-resolved absolute
/// URL to the stored file instead of the raw object key.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ImageResponse {
    pub id: Uuid,
    pub title: Option<String>,
    pub original_filename: String,
    #[ts(type = "string")]
    pub upload_date: DateTime<Utc>,
    pub approved: bool,
    pub image_url: String,
}

impl ImageResponse {
    /// Maps a database record to its public representation, resolving the
    /// absolute object URL from the configured storage endpoint.
    pub fn from_record(image: &Image, config: &AppConfig) -> Self {
        Self {
            id: image.id,
            title: image.title.clone(),
            original_filename: image.original_filename.clone(),
            upload_date: image.upload_date,
            approved: image.approved,
            image_url: config.object_url(&image.file_key),
        }
    }
}

/// AdminImageResponse
///
/// Admin serialization of an image record. Unlike the public shape it exposes
/// the uploader's IP address and the raw object key for moderation work.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AdminImageResponse {
    pub id: Uuid,
    pub title: Option<String>,
    pub file_key: String,
    pub original_filename: String,
    pub ip_address: String,
    #[ts(type = "string")]
    pub upload_date: DateTime<Utc>,
    pub approved: bool,
    pub image_url: String,
}

impl AdminImageResponse {
    pub fn from_record(image: &Image, config: &AppConfig) -> Self {
        Self {
            id: image.id,
            title: image.title.clone(),
            file_key: image.file_key.clone(),
            original_filename: image.original_filename.clone(),
            ip_address: image.ip_address.clone(),
            upload_date: image.upload_date,
            approved: image.approved,
            image_url: config.object_url(&image.file_key),
        }
    }
}

/// UploadImageResponse
///
/// Envelope returned by a successful public upload (201): a human-readable
/// confirmation plus the created record.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UploadImageResponse {
    pub detail: String,
    pub data: ImageResponse,
}

/// CreateOrderFormResponse
///
/// Envelope returned by a successful order-form submission (201): a confirmation
/// message plus the created record.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateOrderFormResponse {
    pub message: String,
    pub data: OrderForm,
}
