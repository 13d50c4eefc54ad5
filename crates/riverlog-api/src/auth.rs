use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::{SaltString, rand_core::OsRng}};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::RngCore;
use tracing::{debug, info};

use riverlog_types::api::{Claims, LoginInput, ResetPasswordInput, SignupInput};
use riverlog_types::events::MutationKind;

use crate::error::{ApiError, ApiResult};
use crate::mail::{self, OutgoingMail};
use crate::objects::{AuthPayload, User};
use crate::state::AppStateInner;
use crate::text::to_title_case;

pub const AUTH_REQUIRED: &str = "Authentication required";
const LOGIN_FAILED: &str = "Unable to login";
const BAD_RESET_TOKEN: &str = "Password reset token is invalid or expired.";

const TOKEN_TTL_DAYS: i64 = 30;
const RESET_TOKEN_BYTES: usize = 20;
const RESET_TOKEN_TTL_MS: i64 = 60 * 60 * 1000;

/// The authenticated caller of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: i64,
}

pub fn create_token(secret: &str, user_id: i64) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        exp: (chrono::Utc::now() + chrono::Duration::days(TOKEN_TTL_DAYS)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

/// Decode a bearer token into the caller's identity. A missing token and a
/// bad one are indistinguishable to the caller.
pub fn identify(secret: &str, token: Option<&str>) -> ApiResult<Identity> {
    let token = token.ok_or_else(|| ApiError::auth(AUTH_REQUIRED))?;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        debug!("Rejected bearer token: {}", e);
        ApiError::auth(AUTH_REQUIRED)
    })?;

    Ok(Identity {
        user_id: token_data.claims.sub,
    })
}

/// Argon2id with a fresh random salt, PHC string encoded.
pub fn hash_password(password: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Password hashing failed: {}", e))?
        .to_string();
    Ok(hash)
}

fn verify_password(password: &str, stored: &str) -> ApiResult<bool> {
    let parsed = PasswordHash::new(stored)
        .map_err(|e| anyhow::anyhow!("Stored password hash is malformed: {}", e))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

pub async fn signup(state: &AppStateInner, input: SignupInput) -> ApiResult<User> {
    let name = to_title_case(&input.name);
    let hash = hash_password(&input.password)?;
    let email = input.email;

    let user: User = state
        .store(move |db| db.create_user(&name, &email, &hash))
        .await?
        .into();

    info!("User {} signed up", user.id);
    state.publish(MutationKind::Created, user.clone()).await;
    Ok(user)
}

pub async fn login(state: &AppStateInner, input: LoginInput) -> ApiResult<AuthPayload> {
    let email = input.email;
    let row = state
        .store(move |db| db.get_user_by_email(&email))
        .await?
        .ok_or_else(|| ApiError::auth(LOGIN_FAILED))?;

    if !verify_password(&input.password, &row.password)? {
        return Err(ApiError::auth(LOGIN_FAILED));
    }

    let token = create_token(&state.jwt_secret, row.id)?;
    info!("User {} logged in", row.id);

    Ok(AuthPayload {
        user: row.into(),
        token,
    })
}

/// Issue a one-hour reset token and mail it. Always `true`, whether or not
/// the address belongs to anyone.
pub async fn request_reset_password(state: &AppStateInner, email: String) -> ApiResult<bool> {
    let mut bytes = [0u8; RESET_TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    let token = hex::encode(bytes);
    let expiry = chrono::Utc::now().timestamp_millis() + RESET_TOKEN_TTL_MS;

    let (stored_email, stored_token) = (email.clone(), token.clone());
    let touched = state
        .store(move |db| db.set_reset_token(&stored_email, &stored_token, expiry))
        .await?;

    if touched == 0 {
        debug!("Password reset requested for unknown address");
        return Ok(true);
    }

    mail::dispatch(state.mailer.clone(), OutgoingMail::reset_token(&email, &token));
    info!("Password reset token issued");
    Ok(true)
}

pub async fn reset_password(state: &AppStateInner, input: ResetPasswordInput) -> ApiResult<bool> {
    let hash = hash_password(&input.password)?;
    let now = chrono::Utc::now().timestamp_millis();

    let ResetPasswordInput { email, reset_token, .. } = input;
    let reset = state
        .store(move |db| db.consume_reset_token(&email, &reset_token, now, &hash))
        .await?;

    if !reset {
        return Err(ApiError::token(BAD_RESET_TOKEN));
    }

    info!("Password reset completed");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;
    use futures_util::StreamExt;
    use riverlog_types::events::Topic;

    fn signup_input(name: &str, email: &str, password: &str) -> SignupInput {
        SignupInput {
            name: name.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    fn login_input(email: &str, password: &str) -> LoginInput {
        LoginInput {
            email: email.into(),
            password: password.into(),
        }
    }

    #[test]
    fn tokens_identify_their_subject() {
        let token = create_token("s3cret", 42).unwrap();
        assert_eq!(identify("s3cret", Some(&token)).unwrap(), Identity { user_id: 42 });

        let err = identify("other", Some(&token)).unwrap_err();
        assert_eq!(err.to_string(), AUTH_REQUIRED);

        let err = identify("s3cret", None).unwrap_err();
        assert!(matches!(err, ApiError::Auth(_)));
    }

    #[test]
    fn password_hashes_verify() {
        let hash = hash_password("hunter2").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("hunter2", &hash).unwrap());
        assert!(!verify_password("hunter3", &hash).unwrap());
    }

    #[tokio::test]
    async fn signup_then_login() {
        let (state, _mail) = test_support::state();
        let mut users = state.bus.subscribe(Topic::User).await;

        let user = signup(&state, signup_input("bob smith", "b@x.com", "pw")).await.unwrap();
        assert_eq!(user.name, "Bob Smith");

        let change = users.next().await.unwrap();
        assert_eq!(change.mutation, MutationKind::Created);

        let stored = state.db.get_user_by_email("b@x.com").unwrap().unwrap();
        assert_ne!(stored.password, "pw");

        let payload = login(&state, login_input("b@x.com", "pw")).await.unwrap();
        assert_eq!(payload.user, user);
        let identity = identify(&state.jwt_secret, Some(&payload.token)).unwrap();
        assert_eq!(identity.user_id, user.id);
    }

    #[tokio::test]
    async fn login_failures_look_the_same() {
        let (state, _mail) = test_support::state();
        signup(&state, signup_input("bob", "b@x.com", "pw")).await.unwrap();

        let unknown = login(&state, login_input("nobody@x.com", "pw")).await.unwrap_err();
        let wrong = login(&state, login_input("b@x.com", "nope")).await.unwrap_err();

        assert_eq!(unknown.to_string(), LOGIN_FAILED);
        assert_eq!(wrong.to_string(), unknown.to_string());
    }

    #[tokio::test]
    async fn duplicate_email_is_a_store_error() {
        let (state, _mail) = test_support::state();
        signup(&state, signup_input("bob", "b@x.com", "pw")).await.unwrap();

        let err = signup(&state, signup_input("rob", "b@x.com", "pw")).await.unwrap_err();
        assert!(matches!(err, ApiError::Store(_)));
    }

    #[tokio::test]
    async fn reset_flow_mails_and_consumes_the_token() {
        let (state, mut mail) = test_support::state();
        signup(&state, signup_input("bob", "b@x.com", "old")).await.unwrap();

        assert!(request_reset_password(&state, "b@x.com".into()).await.unwrap());
        let sent = mail.recv().await.unwrap();
        assert_eq!(sent.to, "b@x.com");

        let token = sent.body.rsplit(' ').next().unwrap().to_string();
        assert_eq!(token.len(), RESET_TOKEN_BYTES * 2);

        let input = ResetPasswordInput {
            email: "b@x.com".into(),
            reset_token: token,
            password: "new".into(),
        };
        assert!(reset_password(&state, input.clone()).await.unwrap());
        assert!(login(&state, login_input("b@x.com", "new")).await.is_ok());

        // cleared after use
        let err = reset_password(&state, input).await.unwrap_err();
        assert!(matches!(err, ApiError::Token(_)));
    }

    #[tokio::test]
    async fn reset_for_unknown_email_still_succeeds() {
        let (state, mut mail) = test_support::state();

        assert!(request_reset_password(&state, "ghost@x.com".into()).await.unwrap());
        assert!(mail.try_recv().is_err());
    }

    #[tokio::test]
    async fn expired_reset_token_is_rejected() {
        let (state, _mail) = test_support::state();
        signup(&state, signup_input("bob", "b@x.com", "old")).await.unwrap();

        let past = chrono::Utc::now().timestamp_millis() - 1;
        state.db.set_reset_token("b@x.com", "deadbeef", past).unwrap();

        let input = ResetPasswordInput {
            email: "b@x.com".into(),
            reset_token: "deadbeef".into(),
            password: "new".into(),
        };
        let err = reset_password(&state, input).await.unwrap_err();
        assert_eq!(err.to_string(), BAD_RESET_TOKEN);
        assert!(login(&state, login_input("b@x.com", "old")).await.is_ok());
    }
}
