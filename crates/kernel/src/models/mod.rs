//! Database models.

pub mod admin;
pub mod material;
pub mod progress;
pub mod subject;
pub mod user;

pub use admin::{ManagedUser, PlatformStats};
pub use material::{Access, Material, MaterialStatus};
pub use progress::{FavoriteAction, StudentProgress};
pub use subject::Subject;
pub use user::{Role, User};
