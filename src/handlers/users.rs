use axum::{extract::State, http::StatusCode, Extension, Form, Json};
use chrono::Utc;

use crate::{
    auth::password::{hash_password, verify_password},
    error::AppError,
    models::user::{AccountStatistics, CreateUser, LoginForm, TokenResponse, UpdateUser, User},
    repository, AppState,
};

fn validate_registration(payload: &CreateUser) -> Result<(), AppError> {
    let email = payload.email.as_str();
    let well_formed = email.split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
    });
    if !well_formed || email.contains(char::is_whitespace) {
        return Err(AppError::Validation("Invalid email address".to_string()));
    }
    if payload.password.is_empty() {
        return Err(AppError::Validation("Password must not be empty".to_string()));
    }
    Ok(())
}

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<CreateUser>,
) -> Result<(StatusCode, Json<User>), AppError> {
    validate_registration(&payload)?;

    // Friendly pre-check; the unique index is what actually guards
    // against a concurrent duplicate.
    if repository::users::find_by_email(&state.db, &payload.email)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("Email already registered"));
    }

    let password_hash = hash_password(&payload.password)?;
    let user = repository::users::create(
        &state.db,
        &payload.email,
        &password_hash,
        &payload.full_name,
    )
    .await?;

    tracing::info!(user_id = user.id, "user registered");
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Json<TokenResponse>, AppError> {
    let user = repository::users::find_by_email(&state.db, &form.username)
        .await?
        .ok_or(AppError::Unauthorized("Incorrect email or password"))?;

    if !verify_password(&form.password, &user.password_hash) {
        return Err(AppError::Unauthorized("Incorrect email or password"));
    }

    let access_token = state.keys.issue(&user.email)?;
    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer",
    }))
}

pub async fn me(Extension(user): Extension<User>) -> Json<User> {
    Json(user)
}

pub async fn update_me(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(patch): Json<UpdateUser>,
) -> Result<Json<User>, AppError> {
    let password_hash = match &patch.password {
        Some(password) if password.is_empty() => {
            return Err(AppError::Validation("Password must not be empty".to_string()))
        }
        Some(password) => Some(hash_password(password)?),
        None => None,
    };

    let updated = repository::users::update(
        &state.db,
        user.id,
        patch.full_name.as_deref(),
        password_hash.as_deref(),
    )
    .await?;
    Ok(Json(updated))
}

pub async fn statistics(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<AccountStatistics>, AppError> {
    let (total_expenses, total_amount) = repository::expenses::totals(&state.db, user.id).await?;
    let average_amount = if total_expenses > 0 {
        total_amount / total_expenses as f64
    } else {
        0.0
    };
    let account_age_days = (Utc::now().naive_utc() - user.created_at).num_days();

    Ok(Json(AccountStatistics {
        total_expenses,
        total_amount,
        average_amount,
        account_age_days,
    }))
}
