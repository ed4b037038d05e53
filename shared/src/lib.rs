pub mod duration;
pub mod email;
pub mod models;

pub use duration::*;
pub use email::*;
pub use models::*;
