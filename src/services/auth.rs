use crate::models::auth::{Claims, LoginOutcome, LoginRequest, MAX_PASSWORD_LEN, MAX_USERNAME_LEN};
use crate::models::config::AuthConfig;
use anyhow::{anyhow, Context, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

pub const SESSION_COOKIE: &str = "session";
const SESSION_SUBJECT: &str = "admin";

/// Single-operator credential check and stateless session tokens.
///
/// The configured username and password are only kept as argon2 hashes so
/// that a login attempt costs the same regardless of which field is wrong.
/// Sessions are signed JWTs with an absolute expiry; nothing is stored
/// server-side, so logout is simply dropping the cookie.
pub struct SessionService {
    username_hash: String,
    password_hash: String,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    session_duration: Duration,
}

impl SessionService {
    pub fn new(config: &AuthConfig) -> Result<Self> {
        let username = config
            .username
            .as_deref()
            .context("auth.username is required")?;
        let password = config
            .password
            .as_deref()
            .context("auth.password is required")?;
        let secret = config
            .session_secret
            .as_deref()
            .context("auth.session_secret is required")?;

        Ok(Self {
            username_hash: hash_secret(username)?,
            password_hash: hash_secret(password)?,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            session_duration: Duration::days(config.session_days),
        })
    }

    pub fn login(&self, req: &LoginRequest) -> Result<LoginOutcome> {
        if req.username.len() > MAX_USERNAME_LEN || req.password.len() > MAX_PASSWORD_LEN {
            return Ok(LoginOutcome::Rejected);
        }

        // Both checks always run; `&` does not short-circuit
        let username_ok = verify_secret(&req.username, &self.username_hash)?;
        let password_ok = verify_secret(&req.password, &self.password_hash)?;

        if username_ok & password_ok {
            let token = self.issue_token(Utc::now())?;
            Ok(LoginOutcome::Authenticated { token })
        } else {
            Ok(LoginOutcome::Rejected)
        }
    }

    pub fn issue_token(&self, now: DateTime<Utc>) -> Result<String> {
        let exp = now + self.session_duration;
        let claims = Claims {
            sub: SESSION_SUBJECT.to_string(),
            exp: exp.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(&Header::default(), &claims, &self.encoding_key)?)
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        // Expiry is absolute: no grace period past `exp`
        let mut validation = Validation::default();
        validation.leeway = 0;
        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)?;
        Ok(token_data.claims)
    }

    pub fn session_duration(&self) -> Duration {
        self.session_duration
    }
}

fn hash_secret(value: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(value.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| anyhow!("Credential hashing failed: {:?}", e))
}

fn verify_secret(candidate: &str, hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| anyhow!("Invalid credential hash: {:?}", e))?;
    Ok(Argon2::default()
        .verify_password(candidate.as_bytes(), &parsed)
        .is_ok())
}
