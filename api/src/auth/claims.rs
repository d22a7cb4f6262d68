use db::models::user::Role;
use serde::{Deserialize, Serialize};

/// Claims carried by the identity provider's session JWT.
///
/// The attendance engine trusts `sub` and `role` as already authenticated;
/// verifying passwords and minting these tokens is the provider's job.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: i64,
    pub role: Role,
    pub exp: usize,
}

#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);
