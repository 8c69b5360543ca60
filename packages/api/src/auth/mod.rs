//! Authentication: password hashing and policy, bearer tokens, the verification-code
//! lifecycle and the request gate.

mod gate;
mod password;
mod policy;
mod token;
pub mod verification;

pub use gate::{bearer_token, require_bearer, AuthUser};
pub use password::{hash_password, verify_against_dummy, verify_password};
pub use policy::{is_acceptable, SPECIAL_CHARACTERS};
pub use token::{Claims, TokenError, TokenIssuer, TOKEN_TTL_SECS};
pub use verification::{check_code, generate_code, PendingCode, VerificationState};
