mod model;
pub mod password;
pub mod token;
mod validation;

pub use model::{FullName, NewUser, Select, User};
pub use password::{HashScheme, HashedPassword};
pub use token::{Claims, TokenSigner};
pub use validation::{validate_new_user, MIN_EMAIL_LEN, MIN_NAME_LEN};
