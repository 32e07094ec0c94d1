//! Accounts, passwords and session tokens.
//!
//! Session tokens are `base64url(claims) "." base64url(HMAC-SHA256(claims))`.
//! They are stateless: verification only needs the signing secret.

use crate::{
    entities::{PasswordReset, Role, User, password_reset, user},
    errors::{Error, Result},
};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use rand_core::{OsRng, RngCore};
use sea_orm::{Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::{debug, info, instrument, warn};

type HmacSha256 = Hmac<Sha256>;

const MIN_PASSWORD_LEN: usize = 8;
const RESET_TOKEN_TTL_MINUTES: i64 = 60;

/// Identity carried by a session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User id
    pub sub: i64,
    pub role: Role,
    /// Expiry as a unix timestamp (seconds)
    pub exp: i64,
}

/// Loose `local@domain` check, enough to catch typos in forms.
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !domain.contains('@') && !email.contains(' ')
        }
        None => false,
    }
}

/// Hashes a plain-text password with Argon2 and a random salt.
pub fn hash_password(password: &str) -> Result<String> {
    if password.is_empty() {
        return Err(Error::invalid_input("Password cannot be empty"));
    }
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::Config {
            message: format!("Password hashing failed: {e}"),
        })
}

/// Checks a password against a stored Argon2 hash. A malformed hash counts as a mismatch.
#[must_use]
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            warn!("Stored password hash could not be parsed: {}", e);
            false
        }
    }
}

fn mac_for(secret: &str, payload: &[u8]) -> Result<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|e| Error::Config {
        message: format!("Invalid session secret: {e}"),
    })?;
    mac.update(payload);
    Ok(mac)
}

fn check_new_password(password: &str) -> Result<()> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(Error::invalid_input(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Issues a signed session token for a user.
pub fn issue_token(secret: &str, user: &user::Model, ttl_hours: i64) -> Result<String> {
    let claims = SessionClaims {
        sub: user.id,
        role: user.role,
        exp: (chrono::Utc::now() + chrono::Duration::hours(ttl_hours)).timestamp(),
    };
    let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?);
    let signature = mac_for(secret, payload.as_bytes())?.finalize().into_bytes();
    Ok(format!("{payload}.{}", URL_SAFE_NO_PAD.encode(signature)))
}

/// Verifies a session token, returning its claims.
///
/// # Errors
/// Returns `Unauthorized` if the token is malformed, its signature does not
/// match, or it has expired.
pub fn verify_token(secret: &str, token: &str) -> Result<SessionClaims> {
    let (payload, signature) = token
        .split_once('.')
        .ok_or_else(|| Error::unauthorized("Malformed session token"))?;
    let signature = URL_SAFE_NO_PAD
        .decode(signature)
        .map_err(|_| Error::unauthorized("Malformed session token"))?;

    mac_for(secret, payload.as_bytes())?
        .verify_slice(&signature)
        .map_err(|_| Error::unauthorized("Invalid session token"))?;

    let claims: SessionClaims = URL_SAFE_NO_PAD
        .decode(payload)
        .ok()
        .and_then(|bytes| serde_json::from_slice(&bytes).ok())
        .ok_or_else(|| Error::unauthorized("Malformed session token"))?;

    if claims.exp < chrono::Utc::now().timestamp() {
        return Err(Error::unauthorized("Session expired"));
    }
    Ok(claims)
}

/// Registers a new client account.
///
/// # Errors
/// Returns `InvalidInput` for an empty name, a malformed email or a short
/// password, and `Conflict` if the email is already registered.
#[instrument(skip(db, password))]
pub async fn sign_up(
    db: &DatabaseConnection,
    name: &str,
    email: &str,
    password: &str,
) -> Result<user::Model> {
    if name.trim().is_empty() {
        return Err(Error::invalid_input("Name cannot be empty"));
    }
    if !is_valid_email(email) {
        return Err(Error::invalid_input("Email address is not valid"));
    }
    check_new_password(password)?;

    let email = email.trim().to_lowercase();
    if find_user_by_email(db, &email).await?.is_some() {
        return Err(Error::Conflict {
            message: "An account with this email already exists".to_string(),
        });
    }

    let user = user::ActiveModel {
        name: Set(name.trim().to_string()),
        email: Set(email),
        password_hash: Set(hash_password(password)?),
        role: Set(Role::User),
        referral_code: Set(None),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(user_id = user.id, "New account registered");
    Ok(user)
}

/// Checks credentials. Unknown emails and wrong passwords fail the same way.
#[instrument(skip(db, password))]
pub async fn log_in(db: &DatabaseConnection, email: &str, password: &str) -> Result<user::Model> {
    let user = find_user_by_email(db, &email.trim().to_lowercase()).await?;
    match user {
        Some(user) if verify_password(password, &user.password_hash) => Ok(user),
        _ => {
            debug!("Rejected login attempt");
            Err(Error::unauthorized("Invalid email or password"))
        }
    }
}

pub async fn find_user_by_id<C>(db: &C, user_id: i64) -> Result<Option<user::Model>>
where
    C: ConnectionTrait,
{
    User::find_by_id(user_id).one(db).await.map_err(Into::into)
}

pub async fn find_user_by_email(db: &DatabaseConnection, email: &str) -> Result<Option<user::Model>> {
    User::find()
        .filter(user::Column::Email.eq(email))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Looks up the partner owning a referral code. Codes are matched case-insensitively.
pub async fn resolve_partner<C>(db: &C, referral_code: Option<&str>) -> Result<Option<user::Model>>
where
    C: ConnectionTrait,
{
    let Some(code) = referral_code.map(str::trim).filter(|c| !c.is_empty()) else {
        return Ok(None);
    };
    User::find()
        .filter(user::Column::ReferralCode.eq(code.to_uppercase()))
        .filter(user::Column::Role.eq(Role::Partner))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Random code of the form `NAC-1A2B3C4D`.
#[must_use]
pub fn generate_referral_code() -> String {
    let mut bytes = [0u8; 4];
    OsRng.fill_bytes(&mut bytes);
    format!("NAC-{}", hex::encode_upper(bytes))
}

/// Changes a user's role. Promoting to partner hands out a referral code if the
/// user does not have one yet.
pub async fn set_user_role(db: &DatabaseConnection, user_id: i64, role: Role) -> Result<user::Model> {
    let user = find_user_by_id(db, user_id)
        .await?
        .ok_or_else(|| Error::not_found("User", user_id))?;

    let needs_code = role == Role::Partner && user.referral_code.is_none();
    let mut active: user::ActiveModel = user.into();
    active.role = Set(role);
    if needs_code {
        active.referral_code = Set(Some(generate_referral_code()));
    }
    let updated = active.update(db).await?;
    info!(user_id, role = ?role, "User role changed");
    Ok(updated)
}

/// Changes a signed-in user's password after checking the current one.
///
/// # Errors
/// `InvalidInput` when a field is missing, the confirmation differs, the new
/// password is too short or the current password is wrong.
#[instrument(skip(db, current, new, confirm))]
pub async fn change_password(
    db: &DatabaseConnection,
    user_id: i64,
    current: &str,
    new: &str,
    confirm: &str,
) -> Result<()> {
    if current.is_empty() || new.is_empty() || confirm.is_empty() {
        return Err(Error::invalid_input("All password fields are required"));
    }
    if new != confirm {
        return Err(Error::invalid_input("New passwords do not match"));
    }
    check_new_password(new)?;

    let user = find_user_by_id(db, user_id)
        .await?
        .ok_or_else(|| Error::not_found("User", user_id))?;
    if !verify_password(current, &user.password_hash) {
        return Err(Error::invalid_input("Current password is incorrect"));
    }

    let mut active: user::ActiveModel = user.into();
    active.password_hash = Set(hash_password(new)?);
    active.update(db).await?;
    info!(user_id, "Password changed");
    Ok(())
}

fn hash_reset_token(token: &str) -> String {
    hex::encode(<Sha256 as sha2::Digest>::digest(token.as_bytes()))
}

/// Issues a one-hour password reset token for the account behind `email`.
///
/// Returns `None` for unknown emails so callers can answer the same way either
/// way. Any older token for the account stops working.
#[instrument(skip(db, email))]
pub async fn request_password_reset(
    db: &DatabaseConnection,
    email: &str,
) -> Result<Option<(user::Model, String)>> {
    if email.trim().is_empty() {
        return Err(Error::invalid_input("Email is required"));
    }
    let Some(user) = find_user_by_email(db, &email.trim().to_lowercase()).await? else {
        debug!("Password reset requested for an unknown email");
        return Ok(None);
    };

    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    let token = hex::encode(bytes);

    let txn = db.begin().await?;
    PasswordReset::delete_many()
        .filter(password_reset::Column::UserId.eq(user.id))
        .exec(&txn)
        .await?;
    password_reset::ActiveModel {
        user_id: Set(user.id),
        token_hash: Set(hash_reset_token(&token)),
        expires_at: Set(chrono::Utc::now() + chrono::Duration::minutes(RESET_TOKEN_TTL_MINUTES)),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    info!(user_id = user.id, "Password reset token issued");
    Ok(Some((user, token)))
}

/// Sets a new password using an emailed reset token. The token is single-use.
///
/// # Errors
/// `InvalidInput` for a short password or an unknown, used or expired token.
#[instrument(skip(db, token, new_password))]
pub async fn reset_password(
    db: &DatabaseConnection,
    token: &str,
    new_password: &str,
) -> Result<user::Model> {
    check_new_password(new_password)?;
    let invalid = || Error::invalid_input("Invalid or expired reset token");

    let txn = db.begin().await?;
    let reset = PasswordReset::find()
        .filter(password_reset::Column::TokenHash.eq(hash_reset_token(token.trim())))
        .one(&txn)
        .await?
        .filter(|r| r.expires_at > chrono::Utc::now())
        .ok_or_else(invalid)?;
    let user = find_user_by_id(&txn, reset.user_id)
        .await?
        .ok_or_else(invalid)?;

    PasswordReset::delete_many()
        .filter(password_reset::Column::UserId.eq(user.id))
        .exec(&txn)
        .await?;
    let mut active: user::ActiveModel = user.into();
    active.password_hash = Set(hash_password(new_password)?);
    let user = active.update(&txn).await?;
    txn.commit().await?;

    info!(user_id = user.id, "Password reset");
    Ok(user)
}
