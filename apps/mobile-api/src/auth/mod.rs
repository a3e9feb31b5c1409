//! Token issuance, validation and principal checks.

pub mod claims;
pub mod clock;
pub mod context;
pub mod principal;
pub mod secret;
pub mod token;

pub use claims::{TokenClaims, TokenKind};
pub use clock::{Clock, ManualClock, SystemClock};
pub use context::AuthContext;
pub use principal::{
    CredentialVerifier, InMemoryDirectory, Principal, PrincipalDirectory, ADMIN_CAPABILITY,
    BASELINE_CAPABILITY,
};
pub use secret::SecretStore;
pub use token::{TokenError, TokenPair, TokenService, ValidatedToken};
