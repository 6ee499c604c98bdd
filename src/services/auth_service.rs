use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use password_hash::rand_core::{OsRng, RngCore};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, Set,
};
use uuid::Uuid;

use crate::{
    audit::record_audit,
    dto::auth::{Claims, LoginRequest, LoginResponse, PasswordResetRequest, Profile, RegisterRequest},
    entity::{
        Builds, Orders, ReturnRequests, Users,
        builds::Column as BuildCol,
        orders::Column as OrderCol,
        return_requests::Column as ReturnCol,
        users::{ActiveModel as UserActive, Column as UserCol, Model as UserModel},
    },
    error::{AppError, AppResult},
    mailer::{self, deliver},
    middleware::auth::AuthUser,
    models::{ROLE_USER, User},
    response::{ApiResponse, Meta},
    services::wallet_service::current_balance,
    state::AppState,
};

const MIN_PASSWORD_LEN: usize = 8;
const RESET_PASSWORD_LEN: usize = 12;
const PASSWORD_ALPHABET: &[u8] =
    b"ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz23456789";

pub(crate) fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

fn random_password() -> String {
    (0..RESET_PASSWORD_LEN)
        .map(|_| {
            let idx = OsRng.next_u32() as usize % PASSWORD_ALPHABET.len();
            PASSWORD_ALPHABET[idx] as char
        })
        .collect()
}

pub async fn register_user(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<User>> {
    let username = payload.username.trim().to_string();
    let email = payload.email.trim().to_lowercase();
    if username.is_empty() {
        return Err(AppError::bad_request("username must not be empty"));
    }
    if username.contains('@') {
        return Err(AppError::bad_request("username must not contain '@'"));
    }
    if !email.contains('@') {
        return Err(AppError::bad_request("a valid email is required"));
    }
    if payload.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::bad_request(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let taken = Users::find()
        .filter(
            Condition::any()
                .add(UserCol::Email.eq(email.clone()))
                .add(UserCol::Username.eq(username.clone())),
        )
        .one(&state.orm)
        .await?;
    if let Some(existing) = taken {
        let field = if existing.email == email {
            "Email"
        } else {
            "Username"
        };
        return Err(AppError::BadRequest(format!("{field} is already taken")));
    }

    let user = UserActive {
        id: Set(Uuid::new_v4()),
        username: Set(username),
        email: Set(email),
        password_hash: Set(hash_password(&payload.password)?),
        role: Set(ROLE_USER.to_string()),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;

    deliver(
        state.mailer.as_ref(),
        mailer::registration(&user.username, &user.email),
    )
    .await;

    record_audit(
        state,
        user.id,
        "user_register",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "User created",
        user_from_entity(user),
        None,
    ))
}

/// A login with `@` is an email address, anything else a username.
fn login_filter(login: &str) -> Condition {
    if login.contains('@') {
        Condition::all().add(UserCol::Email.eq(login.to_lowercase()))
    } else {
        Condition::all().add(UserCol::Username.eq(login))
    }
}

pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let LoginRequest { login, password } = payload;
    let login = login.trim();
    let user = Users::find()
        .filter(login_filter(login))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::bad_request("Invalid login or password"))?;

    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;

    let argon2 = Argon2::default();
    if argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(AppError::bad_request("Invalid login or password"));
    }

    let secret = std::env::var("JWT_SECRET")
        .map_err(|_| AppError::Internal(anyhow::anyhow!("JWT_SECRET is not set")))?;

    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(24))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user.id.to_string(),
        role: user.role.clone(),
        exp: expiration.timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?;

    record_audit(
        state,
        user.id,
        "user_login",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Logged in",
        LoginResponse {
            token: format!("Bearer {}", token),
        },
        Some(Meta::empty()),
    ))
}

pub async fn reset_password(
    state: &AppState,
    payload: PasswordResetRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let email = payload.email.trim().to_lowercase();
    let user = Users::find()
        .filter(UserCol::Email.eq(email))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let password = random_password();
    let (user_id, username, email) = (user.id, user.username.clone(), user.email.clone());
    let mut active: UserActive = user.into();
    active.password_hash = Set(hash_password(&password)?);
    active.update(&state.orm).await?;

    deliver(
        state.mailer.as_ref(),
        mailer::password_reset(&username, &email, &password),
    )
    .await;

    record_audit(
        state,
        user_id,
        "password_reset",
        "users",
        serde_json::json!({ "user_id": user_id }),
    )
    .await;

    Ok(ApiResponse::acknowledged(
        "A new password has been sent to your email",
    ))
}

pub async fn profile(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Profile>> {
    let account = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let builds = Builds::find()
        .filter(BuildCol::UserId.eq(user.user_id))
        .count(&state.orm)
        .await? as i64;
    let orders = Orders::find()
        .filter(OrderCol::UserId.eq(user.user_id))
        .count(&state.orm)
        .await? as i64;
    let returns = ReturnRequests::find()
        .filter(ReturnCol::UserId.eq(user.user_id))
        .count(&state.orm)
        .await? as i64;
    let balance = current_balance(&state.orm, user.user_id).await?;

    Ok(ApiResponse::success(
        "Profile",
        Profile {
            user: user_from_entity(account),
            balance,
            builds,
            orders,
            returns,
        },
        Some(Meta::empty()),
    ))
}

fn user_from_entity(model: UserModel) -> User {
    User {
        id: model.id,
        username: model.username,
        email: model.email,
        role: model.role,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::{DbBackend, QueryTrait};

    use super::*;

    #[test]
    fn logins_with_an_at_sign_match_only_the_email() {
        let by_email = Users::find()
            .filter(login_filter("Ann@Example.com"))
            .build(DbBackend::Postgres)
            .to_string();
        let (_, where_clause) = by_email.split_once("WHERE").unwrap();
        assert_eq!(where_clause.trim(), r#""users"."email" = 'ann@example.com'"#);

        let by_name = Users::find()
            .filter(login_filter("ann"))
            .build(DbBackend::Postgres)
            .to_string();
        let (_, where_clause) = by_name.split_once("WHERE").unwrap();
        assert_eq!(where_clause.trim(), r#""users"."username" = 'ann'"#);
    }

    #[test]
    fn reset_passwords_use_the_safe_alphabet() {
        let password = random_password();
        assert_eq!(password.len(), RESET_PASSWORD_LEN);
        assert!(password.bytes().all(|b| PASSWORD_ALPHABET.contains(&b)));
    }

    #[test]
    fn hashed_passwords_verify() {
        let hash = hash_password("correct horse").unwrap();
        let parsed = PasswordHash::new(&hash).unwrap();
        assert!(
            Argon2::default()
                .verify_password(b"correct horse", &parsed)
                .is_ok()
        );
    }
}
