use super::RequestsLoggingLevel;
use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub requests_logging_level: RequestsLoggingLevel,
    pub port: u16,
    /// When set, the frontend is served from `/` and the stats move to `/api/stats`.
    pub frontend_dir_path: Option<String>,
    /// Accept the `X-User-Id` header as proof of identity. Only meant for
    /// deployments behind a proxy that authenticates users itself.
    pub trust_user_id_header: bool,
    /// Base directory for relative audio file paths.
    pub media_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            requests_logging_level: RequestsLoggingLevel::Path,
            port: 8080,
            frontend_dir_path: None,
            trust_user_id_header: false,
            media_path: PathBuf::from("."),
        }
    }
}
