pub mod auth;
mod sqlite_user_store;
mod user_manager;
mod user_store;

pub use auth::{AuthToken, AuthTokenValue, LibraryHasher, UserCredentials};
pub use sqlite_user_store::SqliteUserStore;
pub use user_manager::{
    AuthenticatedUser, LoginError, LoginSession, RegistrationError, UserManager,
    MIN_PASSWORD_LENGTH,
};
pub use user_store::{UserAuthTokenStore, UserStore};
