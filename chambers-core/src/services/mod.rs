//! Service layer for business logic
//!
//! Services are generic over the repository traits and hold the rules that do not
//! belong to any one storage backend.

pub mod contact;
pub mod login_guard;
pub mod password;
pub mod publication;
pub mod session;
pub mod user;

#[cfg(test)]
pub(crate) mod testing;

pub use contact::{ContactNotifier, ContactService, TracingContactNotifier};
pub use login_guard::LoginGuard;
pub use password::{PasswordService, RegistrationPolicy};
pub use publication::PublicationService;
pub use session::SessionService;
pub use user::UserService;
