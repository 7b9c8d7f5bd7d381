mod auth;
mod error;
mod password;
mod policy;
mod routes;
mod token;
mod types;

pub use auth::*;
pub use error::*;
pub use password::*;
pub use policy::*;
pub use routes::*;
pub use token::*;
pub use types::*;
