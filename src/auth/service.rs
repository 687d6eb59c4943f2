use tracing::warn;
use uuid::Uuid;

use crate::auth::tokens::TokenIssuer;
use crate::db::models::{AccountType, User};
use crate::db::operations::DbOperations;
use crate::error::{AppError, AuthError, DatabaseError};

const MIN_PASSWORD_LENGTH: usize = 6;

/// Outcome of register/login/google-login: the authenticated user plus the
/// freshly minted token pair. The refresh token goes into the cookie, the
/// access token into the response body.
pub struct AuthenticatedUser {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
}

/// Outcome of a successful standalone refresh. The body echoes the token the
/// client presented; only the cookie carries the replacement.
pub struct RefreshedTokens {
    pub access_token: String,
    pub presented_token: String,
    pub cookie_token: String,
}

pub struct NewRegistration {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub avatar: Option<String>,
}

pub struct GoogleProfile {
    pub email: Option<String>,
    pub name: Option<String>,
    pub avatar: Option<String>,
}

/// Domain logic for the seven auth operations. Handlers own HTTP shaping
/// (cookies, status codes); this service owns validation, the credential
/// store and the rotation protocol.
pub struct AuthService {
    db: DbOperations,
    tokens: TokenIssuer,
}

impl AuthService {
    pub fn new(db: DbOperations, tokens: TokenIssuer) -> Self {
        Self { db, tokens }
    }

    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    pub async fn register(&self, input: NewRegistration) -> Result<AuthenticatedUser, AppError> {
        let name = required(input.name).ok_or(AuthError::MissingRegistrationFields)?;
        let email = required(input.email).ok_or(AuthError::MissingRegistrationFields)?;
        let password = required(input.password).ok_or(AuthError::MissingRegistrationFields)?;

        if password.len() < MIN_PASSWORD_LENGTH {
            return Err(AuthError::PasswordTooShort.into());
        }

        if self.db.get_user_by_email(&email).await?.is_some() {
            return Err(AuthError::EmailTaken.into());
        }

        let hash = bcrypt::hash(&password, bcrypt::DEFAULT_COST).map_err(AuthError::Hashing)?;
        let mut user = User::new_password_account(name, email, hash, input.avatar);

        let access_token = self.tokens.issue_access_token(user.id)?;
        let refresh_token = self.tokens.issue_refresh_token(user.id)?;
        user.refresh_tokens = vec![refresh_token.clone()];

        // The unique index backstops the pre-check above; a racing duplicate
        // insert surfaces as the same conflict.
        let user = self.db.create_user(&user).await.map_err(|e| match e {
            AppError::Database(DatabaseError::Duplicate) => AuthError::EmailTaken.into(),
            e => e,
        })?;

        Ok(AuthenticatedUser {
            user,
            access_token,
            refresh_token,
        })
    }

    pub async fn login(
        &self,
        email: Option<String>,
        password: Option<String>,
        presented: Option<&str>,
    ) -> Result<AuthenticatedUser, AppError> {
        let email = required(email).ok_or(AuthError::MissingCredentials)?;
        let password = required(password).ok_or(AuthError::MissingCredentials)?;

        let user = self
            .db
            .get_user_by_email(&email)
            .await?
            .ok_or(AuthError::UnknownEmail)?;

        // A google account stores an empty hash; bcrypt simply fails to
        // match, which is the right answer for a password attempt.
        let password_matches = bcrypt::verify(&password, &user.password_hash).unwrap_or(false);
        if !password_matches {
            return Err(AuthError::InvalidCredentials.into());
        }

        self.rotate_for_login(user, presented).await
    }

    pub async fn google_login(
        &self,
        profile: GoogleProfile,
        presented: Option<&str>,
    ) -> Result<AuthenticatedUser, AppError> {
        let email = required(profile.email).ok_or(AuthError::MissingProfileFields)?;
        let name = required(profile.name).ok_or(AuthError::MissingProfileFields)?;
        let avatar = required(profile.avatar).ok_or(AuthError::MissingProfileFields)?;

        let user = match self.db.get_user_by_email(&email).await? {
            Some(user) => {
                if user.account_type == AccountType::Password {
                    return Err(AuthError::EmailUsesPassword.into());
                }
                user
            }
            None => {
                let user = User::new_google_account(name, email, avatar);
                self.db.create_user(&user).await?
            }
        };

        self.rotate_for_login(user, presented).await
    }

    /// The rotation step shared by credential and google login.
    ///
    /// The presented cookie token (if any) is consumed; if no record holds it
    /// any more it was already rotated out, which signals theft, and every
    /// retained token is discarded so only the fresh one survives.
    async fn rotate_for_login(
        &self,
        user: User,
        presented: Option<&str>,
    ) -> Result<AuthenticatedUser, AppError> {
        let access_token = self.tokens.issue_access_token(user.id)?;
        let refresh_token = self.tokens.issue_refresh_token(user.id)?;

        match presented {
            None => {
                self.db
                    .rotate_refresh_token(user.id, None, &refresh_token)
                    .await?;
            }
            Some(token) => {
                if self.db.find_user_by_refresh_token(token).await?.is_none() {
                    warn!(user_id = %user.id, "Refresh token reuse detected at login, revoking all sessions");
                    self.db
                        .replace_refresh_tokens(user.id, &[refresh_token.clone()])
                        .await?;
                } else {
                    self.db
                        .rotate_refresh_token(user.id, Some(token), &refresh_token)
                        .await?;
                }
            }
        }

        Ok(AuthenticatedUser {
            user,
            access_token,
            refresh_token,
        })
    }

    /// Standalone refresh: exchange the cookie token for a new pair.
    /// The presented token is single-use; every branch either consumes it or
    /// proves it was already consumed.
    pub async fn refresh(&self, presented: Option<&str>) -> Result<RefreshedTokens, AppError> {
        let token = presented.ok_or(AuthError::NoRefreshCookie)?;

        let Some(user) = self.db.find_user_by_refresh_token(token).await? else {
            // Nobody holds this token: it was rotated out and replayed.
            // If the signature still resolves to a user, revoke everything
            // they have outstanding and force re-authentication everywhere.
            if let Ok(claims) = self.tokens.verify_refresh_token(token) {
                if let Ok(user_id) = Uuid::parse_str(&claims.data) {
                    if let Some(victim) = self.db.get_user_by_id(user_id).await? {
                        warn!(user_id = %victim.id, "Refresh token reuse detected, revoking all sessions");
                        self.db.clear_refresh_tokens(victim.id).await?;
                    }
                }
            }
            return Err(AuthError::ReuseDetected.into());
        };

        let claims = match self.tokens.verify_refresh_token(token) {
            Ok(claims) => claims,
            Err(_) => {
                // Expired or tampered: the token is consumed permanently.
                self.db.remove_refresh_token(user.id, token).await?;
                return Err(AuthError::InvalidRefreshToken.into());
            }
        };

        if claims.data != user.id.to_string() {
            // Verified but bound to a different record; consume it and never
            // reissue from here.
            self.db.remove_refresh_token(user.id, token).await?;
            return Err(AuthError::TokenOwnerMismatch.into());
        }

        let access_token = self.tokens.issue_access_token(user.id)?;
        let new_refresh = self.tokens.issue_refresh_token(user.id)?;
        self.db
            .rotate_refresh_token(user.id, Some(token), &new_refresh)
            .await?;

        Ok(RefreshedTokens {
            access_token,
            presented_token: token.to_string(),
            cookie_token: new_refresh,
        })
    }

    /// Remove the presented token from whichever record holds it. A token
    /// held by nobody (or no cookie at all) is a silent success: logout is
    /// idempotent from the client's point of view.
    pub async fn logout(&self, presented: Option<&str>) -> Result<(), AppError> {
        if let Some(token) = presented {
            if let Some(user) = self.db.find_user_by_refresh_token(token).await? {
                self.db.remove_refresh_token(user.id, token).await?;
            }
        }
        Ok(())
    }

    /// Resolve the cookie to a logged-in user, if any. Returns the user plus
    /// a fresh access token; any failure short of a store error reads as
    /// "not logged in" and mutates nothing.
    pub async fn check_login(
        &self,
        presented: Option<&str>,
    ) -> Result<Option<(User, String)>, AppError> {
        let Some(token) = presented else {
            return Ok(None);
        };
        let Some(user) = self.db.find_user_by_refresh_token(token).await? else {
            return Ok(None);
        };

        match self.tokens.verify_refresh_token(token) {
            Ok(claims) if claims.data == user.id.to_string() => {
                let access_token = self.tokens.issue_access_token(user.id)?;
                Ok(Some((user, access_token)))
            }
            _ => Ok(None),
        }
    }

    pub async fn get_user(&self, id: Uuid) -> Result<User, AppError> {
        self.db
            .get_user_by_id(id)
            .await?
            .ok_or_else(|| AuthError::UnknownUser.into())
    }
}

/// Treat missing and empty-string inputs the same way, mirroring the falsy
/// checks of the API this replaces.
fn required(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_rejects_empty_and_missing() {
        assert_eq!(required(None), None);
        assert_eq!(required(Some(String::new())), None);
        assert_eq!(required(Some("x".to_string())), Some("x".to_string()));
    }
}
