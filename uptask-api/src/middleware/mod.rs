/// Middleware and request guards
///
/// - `security`: security response headers
/// - `validation`: body extraction with field validation
/// - `guard`: project/task resolution and ownership checks

pub mod guard;
pub mod security;
pub mod validation;
