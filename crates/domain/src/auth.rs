//! Auth types. Token issuance/verification is an external collaborator
//! (spec §1 Out of scope); only the claims shape the core needs to read the
//! authenticated `user` identity from a bearer token lives here.

use serde::{Deserialize, Serialize};

/// JWT claims.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user_id
    pub exp: u64,    // expiration timestamp
    pub iat: u64,    // issued at
}
