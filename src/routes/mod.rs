/// Router Module Index
///
/// Organizes the application's routing logic into security-segregated modules,
/// enforcing access control explicitly at the module level (via Axum layers)
/// rather than inside individual handlers.
///
/// The two modules map directly to the two access tiers.

/// Routes accessible to all clients: the approved-image wall, the upload
/// endpoint, and order-form submission. List handlers must enforce
/// `approved = true` at the Repository level.
pub mod public;

/// Routes restricted to administrators, gated by the `AdminUser` extractor
/// middleware: moderation and CRUD over both resources.
pub mod admin;
