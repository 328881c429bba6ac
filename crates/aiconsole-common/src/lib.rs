pub mod error;
pub mod user;

pub use error::{Error, Result};
pub use user::UserContext;
