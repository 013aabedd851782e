pub use anorm_core::*;
pub use anorm_macros::Entity;
