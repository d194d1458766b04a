use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use serde_json::{json, Value};

use crate::{
    error::AppError,
    models::{
        expense::{Expense, ExpenseFilter, ExpensePayload, SummaryQuery},
        user::User,
    },
    repository, AppState,
};

pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(filter): Query<ExpenseFilter>,
) -> Result<Json<Vec<Expense>>, AppError> {
    let expenses = repository::expenses::list(&state.db, user.id, &filter).await?;
    Ok(Json(expenses))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<ExpensePayload>,
) -> Result<(StatusCode, Json<Expense>), AppError> {
    let expense = repository::expenses::create(&state.db, user.id, &payload).await?;
    Ok((StatusCode::CREATED, Json(expense)))
}

pub async fn get(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<i64>,
) -> Result<Json<Expense>, AppError> {
    let expense = repository::expenses::get(&state.db, id, user.id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(expense))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<i64>,
    Json(payload): Json<ExpensePayload>,
) -> Result<Json<Expense>, AppError> {
    let expense = repository::expenses::update(&state.db, id, user.id, &payload)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(expense))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    if !repository::expenses::delete(&state.db, id, user.id).await? {
        return Err(AppError::NotFound);
    }
    Ok(Json(json!({ "message": "Expense deleted successfully" })))
}

pub async fn summary(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<Value>, AppError> {
    let since = Utc::now().naive_utc() - query.timeframe.window();
    let summary = repository::expenses::summarize(&state.db, user.id, since).await?;

    Ok(Json(json!({
        "timeframe": query.timeframe,
        "total_expenses": summary.count,
        "total_amount": summary.total,
        "average_amount": summary.average,
        "category_breakdown": summary.by_category,
    })))
}
