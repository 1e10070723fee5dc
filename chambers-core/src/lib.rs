//! Core functionality for the chambers site backend
//!
//! This crate contains the domain types shared by every other chambers crate:
//! users and sessions for the admin area, publications and their images, contact
//! form messages, and the [`LoginGuard`] that throttles password logins.
//!
//! Storage is abstracted behind the repository traits in [`repositories`]; the
//! services in [`services`] hold the business rules and are generic over those
//! traits so any backend can be plugged in.
//!
//! See [`User`] for the admin user struct, [`Session`] for sessions, [`Publication`]
//! for articles and [`LoginGuard`] for the failed-login lockout.
pub mod clock;
pub mod contact;
pub mod crypto;
pub mod error;
pub mod id;
pub mod image;
pub mod publication;
pub mod repositories;
pub mod services;
pub mod session;
pub mod slug;
pub mod user;
pub mod validation;

pub use clock::{Clock, ManualClock, SystemClock};
pub use contact::ContactMessage;
pub use error::Error;
pub use image::{ImageStore, ImageUpload, LocalImageStore};
pub use publication::{
    ImageSource, NewPublication, Publication, PublicationId, PublicationRecord, PublicationUpdate,
};
pub use repositories::RepositoryProvider;
pub use services::login_guard::{LockoutStatus, LoginGuard, LoginGuardConfig};
pub use services::{ContactNotifier, RegistrationPolicy, TracingContactNotifier};
pub use session::{Session, SessionToken};
pub use user::{NewUser, User, UserId};
