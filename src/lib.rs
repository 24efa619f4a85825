pub mod config;
pub mod error;
pub mod store;
pub mod telemetry;
pub mod user;

pub use error::{Constraint, FieldViolation, UserError, UserResult};
pub use store::{MemoryUserStore, PgUserStore, UserStore};
pub use user::{Claims, FullName, HashScheme, HashedPassword, NewUser, Select, TokenSigner, User};
