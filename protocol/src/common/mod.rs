pub mod auth;
pub mod post;

pub use auth::*;
pub use post::*;
