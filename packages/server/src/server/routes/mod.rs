// HTTP routes
pub mod admin;
pub mod health;
pub mod ideas;
pub mod purchases;
pub mod runs;

pub use admin::*;
pub use health::*;
pub use ideas::*;
pub use purchases::*;
pub use runs::*;
