/// Authentication primitives
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and strength checks
/// - [`jwt`]: HS256 access/refresh token issuing and validation
/// - [`middleware`]: bearer-token extraction and the `AuthContext` extension
///
/// # Example
///
/// ```
/// use clearlaunch_shared::auth::jwt::{issue_token_pair, validate_access_token};
/// use clearlaunch_shared::auth::password::{hash_password, verify_password};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("launch2024")?;
/// assert!(verify_password("launch2024", &hash)?);
///
/// let secret = "a-secret-of-at-least-thirty-two-bytes!!";
/// let pair = issue_token_pair(Uuid::new_v4(), secret)?;
/// validate_access_token(&pair.access_token, secret)?;
/// # Ok(())
/// # }
/// ```

pub mod jwt;
pub mod middleware;
pub mod password;
