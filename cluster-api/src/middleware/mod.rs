/// HTTP middleware
///
/// - `security`: standard security response headers

pub mod security;
