use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Admin Router Module
///
/// Defines the moderation surface, nested under `/admin`. Both resources expose
/// the same verb set: paginated list, retrieve, partial update, delete.
///
/// Access Control:
/// This entire router is wrapped in a middleware layer that runs the `AdminUser`
/// extractor before any handler: a missing/invalid token yields 401, a valid
/// token without the admin role yields 403. Handlers never see unauthenticated
/// requests.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /admin/images/
        // Lists ALL images, approved or pending, with filter/search/ordering and
        // pagination. This is the moderation queue.
        .route("/images/", get(handlers::admin_list_images))
        // GET/PATCH/DELETE /admin/images/{id}/
        // Retrieve, approve/retitle, or remove a single upload. Delete also
        // removes the backing file from the object store (file first, then record).
        .route(
            "/images/{id}/",
            get(handlers::admin_get_image)
                .patch(handlers::admin_update_image)
                .delete(handlers::admin_delete_image),
        )
        // GET /admin/order-forms/
        .route("/order-forms/", get(handlers::admin_list_order_forms))
        // GET/PATCH/DELETE /admin/order-forms/{id}/
        .route(
            "/order-forms/{id}/",
            get(handlers::admin_get_order_form)
                .patch(handlers::admin_update_order_form)
                .delete(handlers::admin_delete_order_form),
        )
}
