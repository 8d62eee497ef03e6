//! Request handlers.

pub mod auth;
pub mod health;
pub mod jobs;
pub mod outputs;
pub mod videos;

pub use auth::*;
pub use health::*;
pub use jobs::*;
pub use outputs::*;
pub use videos::*;
