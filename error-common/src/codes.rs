// Stable, machine-readable error codes exposed to API clients.
// Renaming any of these is a breaking API change.

pub const INVALID_CREDENTIALS: &str = "INVALID_CREDENTIALS";
pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
pub const FORBIDDEN: &str = "FORBIDDEN";
pub const CONFLICT: &str = "CONFLICT";
pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
pub const NOT_FOUND: &str = "NOT_FOUND";
pub const INTERNAL: &str = "INTERNAL";
