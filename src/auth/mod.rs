mod clock;
mod error;
mod gate;
mod hasher;
mod jwt;
mod session;
pub mod store;
mod types;

pub use error::AuthError;
pub use gate::CredentialGate;
pub use hasher::{BcryptHasher, PasswordHasher, BCRYPT_MAX_BYTES};
pub use jwt::{generate_token, validate_token};
pub use session::SessionRegistry;
pub use store::{CredentialStore, PgCredentialStore, StoreError};
pub use types::{Claims, CredentialRecord, Identity, NewAccount, ROLE_ADMIN, ROLE_USER};

#[cfg(test)]
pub use clock::ManualClock;
