#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration, Utc};
use photo_wall::{
    AppConfig, AppState, MockStorageService, create_router,
    models::{
        ContactMethod, Image, NewImage, NewOrderForm, OrderForm, UpdateImageRequest,
        UpdateOrderFormRequest,
    },
    repository::{ImageQuery, OrderFormQuery, Repository, RepositoryState},
    storage::StorageState,
};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// MemoryRepository
///
/// In-memory implementation of the `Repository` trait for integration tests.
/// Mirrors the Postgres implementation's filter, search, ordering, and paging
/// semantics over plain vectors, so the full router can be exercised without a
/// database.
#[derive(Default)]
pub struct MemoryRepository {
    pub images: Mutex<Vec<Image>>,
    pub order_forms: Mutex<Vec<OrderForm>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a fully specified image record, bypassing the upload flow.
    pub fn seed_image(&self, image: Image) {
        self.images.lock().unwrap().push(image);
    }

    pub fn seed_order_form(&self, order: OrderForm) {
        self.order_forms.lock().unwrap().push(order);
    }

    pub fn image_count_for_ip(&self, ip: &str) -> usize {
        self.images
            .lock()
            .unwrap()
            .iter()
            .filter(|i| i.ip_address == ip)
            .count()
    }
}

fn sort_images(images: &mut [Image], ordering: Option<&str>) {
    match ordering {
        Some("upload_date") => images.sort_by_key(|i| i.upload_date),
        Some("id") => images.sort_by_key(|i| i.id),
        Some("-id") => {
            images.sort_by_key(|i| i.id);
            images.reverse();
        }
        Some("title") => images.sort_by(|a, b| a.title.cmp(&b.title)),
        Some("-title") => images.sort_by(|a, b| b.title.cmp(&a.title)),
        _ => images.sort_by(|a, b| b.upload_date.cmp(&a.upload_date)),
    }
}

fn sort_order_forms(orders: &mut [OrderForm], ordering: Option<&str>) {
    match ordering {
        Some("created_at") => orders.sort_by_key(|o| o.created_at),
        Some("id") => orders.sort_by_key(|o| o.id),
        Some("-id") => {
            orders.sort_by_key(|o| o.id);
            orders.reverse();
        }
        Some("name") => orders.sort_by(|a, b| a.name.cmp(&b.name)),
        Some("-name") => orders.sort_by(|a, b| b.name.cmp(&a.name)),
        _ => orders.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn list_approved_images(&self) -> sqlx::Result<Vec<Image>> {
        let mut approved: Vec<Image> = self
            .images
            .lock()
            .unwrap()
            .iter()
            .filter(|i| i.approved)
            .cloned()
            .collect();
        sort_images(&mut approved, None);
        Ok(approved)
    }

    async fn ip_has_image(&self, ip: &str) -> sqlx::Result<bool> {
        Ok(self
            .images
            .lock()
            .unwrap()
            .iter()
            .any(|i| i.ip_address == ip))
    }

    async fn insert_image(&self, new: NewImage) -> sqlx::Result<Image> {
        let image = Image {
            id: Uuid::new_v4(),
            title: new.title,
            file_key: new.file_key,
            original_filename: new.original_filename,
            ip_address: new.ip_address,
            upload_date: Utc::now(),
            approved: false,
        };
        self.images.lock().unwrap().push(image.clone());
        Ok(image)
    }

    async fn list_images(&self, query: ImageQuery) -> sqlx::Result<(i64, Vec<Image>)> {
        let mut filtered: Vec<Image> = self
            .images
            .lock()
            .unwrap()
            .iter()
            .filter(|i| query.approved.is_none_or(|a| i.approved == a))
            .filter(|i| {
                query
                    .upload_date
                    .is_none_or(|d| i.upload_date.date_naive() == d)
            })
            .filter(|i| {
                query.search.as_deref().is_none_or(|s| {
                    let needle = s.to_lowercase();
                    i.title
                        .as_deref()
                        .unwrap_or_default()
                        .to_lowercase()
                        .contains(&needle)
                        || i.original_filename.to_lowercase().contains(&needle)
                        || i.ip_address.to_lowercase().contains(&needle)
                })
            })
            .cloned()
            .collect();

        sort_images(&mut filtered, query.ordering.as_deref());
        let count = filtered.len() as i64;
        let page = filtered
            .into_iter()
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .collect();
        Ok((count, page))
    }

    async fn get_image(&self, id: Uuid) -> sqlx::Result<Option<Image>> {
        Ok(self
            .images
            .lock()
            .unwrap()
            .iter()
            .find(|i| i.id == id)
            .cloned())
    }

    async fn update_image(
        &self,
        id: Uuid,
        req: UpdateImageRequest,
    ) -> sqlx::Result<Option<Image>> {
        let mut images = self.images.lock().unwrap();
        let Some(image) = images.iter_mut().find(|i| i.id == id) else {
            return Ok(None);
        };
        if let Some(title) = req.title {
            image.title = Some(title);
        }
        if let Some(approved) = req.approved {
            image.approved = approved;
        }
        Ok(Some(image.clone()))
    }

    async fn delete_image(&self, id: Uuid) -> sqlx::Result<bool> {
        let mut images = self.images.lock().unwrap();
        let before = images.len();
        images.retain(|i| i.id != id);
        Ok(images.len() < before)
    }

    async fn insert_order_form(&self, new: NewOrderForm) -> sqlx::Result<OrderForm> {
        let order = OrderForm {
            id: Uuid::new_v4(),
            name: new.name,
            phone: new.phone,
            contact_method: new.contact_method,
            created_at: Utc::now(),
        };
        self.order_forms.lock().unwrap().push(order.clone());
        Ok(order)
    }

    async fn list_order_forms(
        &self,
        query: OrderFormQuery,
    ) -> sqlx::Result<(i64, Vec<OrderForm>)> {
        let mut filtered: Vec<OrderForm> = self
            .order_forms
            .lock()
            .unwrap()
            .iter()
            .filter(|o| query.contact_method.is_none_or(|m| o.contact_method == m))
            .filter(|o| {
                query
                    .created_at
                    .is_none_or(|d| o.created_at.date_naive() == d)
            })
            .filter(|o| {
                query.search.as_deref().is_none_or(|s| {
                    let needle = s.to_lowercase();
                    o.name.to_lowercase().contains(&needle)
                        || o.phone.to_lowercase().contains(&needle)
                })
            })
            .cloned()
            .collect();

        sort_order_forms(&mut filtered, query.ordering.as_deref());
        let count = filtered.len() as i64;
        let page = filtered
            .into_iter()
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .collect();
        Ok((count, page))
    }

    async fn get_order_form(&self, id: Uuid) -> sqlx::Result<Option<OrderForm>> {
        Ok(self
            .order_forms
            .lock()
            .unwrap()
            .iter()
            .find(|o| o.id == id)
            .cloned())
    }

    async fn update_order_form(
        &self,
        id: Uuid,
        req: UpdateOrderFormRequest,
    ) -> sqlx::Result<Option<OrderForm>> {
        let mut orders = self.order_forms.lock().unwrap();
        let Some(order) = orders.iter_mut().find(|o| o.id == id) else {
            return Ok(None);
        };
        if let Some(name) = req.name {
            order.name = name;
        }
        if let Some(phone) = req.phone {
            order.phone = phone;
        }
        if let Some(method) = req.contact_method {
            order.contact_method = method;
        }
        Ok(Some(order.clone()))
    }

    async fn delete_order_form(&self, id: Uuid) -> sqlx::Result<bool> {
        let mut orders = self.order_forms.lock().unwrap();
        let before = orders.len();
        orders.retain(|o| o.id != id);
        Ok(orders.len() < before)
    }
}

/// Builds an image record for seeding, `age_secs` seconds in the past so tests
/// get a deterministic upload order.
pub fn image_fixture(title: &str, ip: &str, approved: bool, age_secs: i64) -> Image {
    Image {
        id: Uuid::new_v4(),
        title: Some(title.to_string()),
        file_key: format!("images/2026/08/27/{}.png", Uuid::new_v4()),
        original_filename: format!("{title}.png"),
        ip_address: ip.to_string(),
        upload_date: Utc::now() - Duration::seconds(age_secs),
        approved,
    }
}

pub fn order_form_fixture(name: &str, method: ContactMethod, age_secs: i64) -> OrderForm {
    OrderForm {
        id: Uuid::new_v4(),
        name: name.to_string(),
        phone: "3805012345678".to_string(),
        contact_method: method,
        created_at: Utc::now() - Duration::seconds(age_secs),
    }
}

/// Assembles the full application router around the in-memory repository and
/// the mock storage service, mirroring the production wiring.
pub fn test_app() -> (axum::Router, Arc<MemoryRepository>, MockStorageService) {
    app_with_storage(MockStorageService::new())
}

/// Same wiring with storage that fails every operation, for exercising the
/// storage error paths end to end.
pub fn failing_storage_app() -> (axum::Router, Arc<MemoryRepository>, MockStorageService) {
    app_with_storage(MockStorageService::new_failing())
}

fn app_with_storage(
    storage: MockStorageService,
) -> (axum::Router, Arc<MemoryRepository>, MockStorageService) {
    let repo = Arc::new(MemoryRepository::new());

    let state = AppState {
        repo: repo.clone() as RepositoryState,
        storage: Arc::new(storage.clone()) as StorageState,
        config: AppConfig::default(),
    };

    (create_router(state), repo, storage)
}

/// Minimal valid magic-byte payloads. Format sniffing only inspects the file
/// header, so these are enough for validation without shipping binary fixtures.
pub fn png_bytes() -> Vec<u8> {
    let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    bytes.extend_from_slice(&[0x00, 0x00, 0x00, 0x0D]);
    bytes.extend_from_slice(b"IHDR");
    bytes
}

pub fn jpeg_bytes() -> Vec<u8> {
    vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00]
}

pub fn tiff_bytes() -> Vec<u8> {
    vec![0x49, 0x49, 0x2A, 0x00, 0x08, 0x00, 0x00, 0x00]
}

pub const MULTIPART_BOUNDARY: &str = "test-boundary-7MA4YWxkTrZu0gW";

/// Hand-rolls a multipart/form-data body with an `image` file part and an
/// optional `title` text part.
pub fn multipart_body(
    filename: &str,
    content_type: &str,
    bytes: &[u8],
    title: Option<&str>,
) -> Vec<u8> {
    let mut body = Vec::new();
    if let Some(title) = title {
        body.extend_from_slice(
            format!(
                "--{MULTIPART_BOUNDARY}\r\nContent-Disposition: form-data; name=\"title\"\r\n\r\n{title}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(
        format!(
            "--{MULTIPART_BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{MULTIPART_BOUNDARY}--\r\n").as_bytes());
    body
}

/// Content-Type header value matching `multipart_body`.
pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}")
}
