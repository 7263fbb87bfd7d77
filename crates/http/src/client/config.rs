//! Backend endpoint configuration

/// Backend used when nothing else is configured
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Auth endpoint paths, relative to the base URL
pub struct Endpoints;

impl Endpoints {
    /// Obtain an access/refresh pair
    pub const LOGIN: &'static str = "/api/auth/token/";

    pub const LOGOUT: &'static str = "/api/auth/logout/";

    pub const REGISTER: &'static str = "/api/auth/register/";

    /// Read (GET) or replace (PUT) the current user's profile
    pub const PROFILE: &'static str = "/api/auth/profile/";

    pub const REFRESH_TOKEN: &'static str = "/api/auth/token/refresh/";
}
