//! Business logic services.

pub mod email;
pub mod notifier;
pub mod scheduler;

pub use email::{EmailService, RenderedEmail};
pub use notifier::Notifier;
