pub mod handlers;
pub mod identity;
pub mod password;
pub mod token;

pub use identity::{require_role, AuthUser};
pub use token::{Claims, TokenKeys};
