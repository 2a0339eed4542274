use serde::{Deserialize, Serialize};

/// Bearer token claims. Tokens are minted by the identity service.
#[derive(Debug, Deserialize, Serialize)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub exp: usize,
}
