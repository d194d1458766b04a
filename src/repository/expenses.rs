use std::collections::HashMap;

use chrono::{NaiveDateTime, Utc};
use sqlx::{sqlite::SqlitePool, QueryBuilder, Sqlite};

use crate::{
    error::AppError,
    models::expense::{Expense, ExpenseFilter, ExpensePayload, ExpenseSummary},
};

/// Lists an owner's expenses with the given filters applied, ordered by
/// ascending id (insertion order).
pub async fn list(
    pool: &SqlitePool,
    owner_id: i64,
    filter: &ExpenseFilter,
) -> Result<Vec<Expense>, AppError> {
    let mut qb = QueryBuilder::<Sqlite>::new("SELECT * FROM expenses WHERE user_id = ");
    qb.push_bind(owner_id);

    if let Some(category) = &filter.category {
        qb.push(" AND category = ").push_bind(category.as_str());
    }
    if let Some(start) = filter.start_date {
        qb.push(" AND date >= ").push_bind(start);
    }
    if let Some(end) = filter.end_date {
        qb.push(" AND date <= ").push_bind(end);
    }
    if let Some(min) = filter.min_amount {
        qb.push(" AND amount >= ").push_bind(min);
    }
    if let Some(max) = filter.max_amount {
        qb.push(" AND amount <= ").push_bind(max);
    }

    qb.push(" ORDER BY id ASC LIMIT ")
        .push_bind(filter.limit)
        .push(" OFFSET ")
        .push_bind(filter.skip);

    let expenses = qb.build_query_as::<Expense>().fetch_all(pool).await?;
    Ok(expenses)
}

/// Fetches one expense, scoped to its owner. A foreign expense returns
/// `None` exactly like a missing one.
pub async fn get(pool: &SqlitePool, id: i64, owner_id: i64) -> Result<Option<Expense>, AppError> {
    let expense = sqlx::query_as::<_, Expense>("SELECT * FROM expenses WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await?;
    Ok(expense)
}

pub async fn create(
    pool: &SqlitePool,
    owner_id: i64,
    payload: &ExpensePayload,
) -> Result<Expense, AppError> {
    let date = payload.date.unwrap_or_else(|| Utc::now().naive_utc());
    let expense = sqlx::query_as::<_, Expense>(
        "INSERT INTO expenses (user_id, date, category, amount, description, payment_method) \
         VALUES (?, ?, ?, ?, ?, ?) RETURNING *",
    )
    .bind(owner_id)
    .bind(date)
    .bind(&payload.category)
    .bind(payload.amount)
    .bind(&payload.description)
    .bind(&payload.payment_method)
    .fetch_one(pool)
    .await?;
    Ok(expense)
}

/// Replaces the mutable fields of an owned expense. `date` is replaced
/// only when the payload carries one; `id` and `user_id` never change.
pub async fn update(
    pool: &SqlitePool,
    id: i64,
    owner_id: i64,
    payload: &ExpensePayload,
) -> Result<Option<Expense>, AppError> {
    let expense = sqlx::query_as::<_, Expense>(
        "UPDATE expenses SET category = ?, amount = ?, description = ?, \
         payment_method = ?, date = COALESCE(?, date) \
         WHERE id = ? AND user_id = ? RETURNING *",
    )
    .bind(&payload.category)
    .bind(payload.amount)
    .bind(&payload.description)
    .bind(&payload.payment_method)
    .bind(payload.date)
    .bind(id)
    .bind(owner_id)
    .fetch_optional(pool)
    .await?;
    Ok(expense)
}

/// Returns true if a row was removed.
pub async fn delete(pool: &SqlitePool, id: i64, owner_id: i64) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM expenses WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(owner_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Count and signed total over an owner's whole ledger.
pub async fn totals(pool: &SqlitePool, owner_id: i64) -> Result<(i64, f64), AppError> {
    let row = sqlx::query_as::<_, (i64, f64)>(
        "SELECT COUNT(*), COALESCE(SUM(amount), 0.0) FROM expenses WHERE user_id = ?",
    )
    .bind(owner_id)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// Aggregates an owner's expenses on or after `since`: count, total,
/// average (0 when empty) and per-category sums.
pub async fn summarize(
    pool: &SqlitePool,
    owner_id: i64,
    since: NaiveDateTime,
) -> Result<ExpenseSummary, AppError> {
    let (count, total) = sqlx::query_as::<_, (i64, f64)>(
        "SELECT COUNT(*), COALESCE(SUM(amount), 0.0) FROM expenses \
         WHERE user_id = ? AND date >= ?",
    )
    .bind(owner_id)
    .bind(since)
    .fetch_one(pool)
    .await?;

    let rows = sqlx::query_as::<_, (String, f64)>(
        "SELECT category, SUM(amount) FROM expenses \
         WHERE user_id = ? AND date >= ? GROUP BY category",
    )
    .bind(owner_id)
    .bind(since)
    .fetch_all(pool)
    .await?;

    let by_category: HashMap<String, f64> = rows.into_iter().collect();
    let average = if count > 0 { total / count as f64 } else { 0.0 };

    Ok(ExpenseSummary {
        count,
        total,
        average,
        by_category,
    })
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::repository::testutil::{seed_user, test_pool};

    fn payload(category: &str, amount: f64) -> ExpensePayload {
        ExpensePayload {
            category: category.to_string(),
            amount,
            description: None,
            payment_method: "card".to_string(),
            date: None,
        }
    }

    #[tokio::test]
    async fn create_defaults_date_to_now() {
        let pool = test_pool().await;
        let user = seed_user(&pool, "alice@example.com").await;

        let expense = create(&pool, user.id, &payload("food", 12.5)).await.unwrap();
        assert_eq!(expense.user_id, user.id);
        let age = Utc::now().naive_utc() - expense.date;
        assert!(age < Duration::minutes(1));

        let when = Utc::now().naive_utc() - Duration::days(3);
        let dated = ExpensePayload {
            date: Some(when),
            ..payload("food", 4.0)
        };
        let expense = create(&pool, user.id, &dated).await.unwrap();
        assert_eq!(expense.date, when);
    }

    #[tokio::test]
    async fn get_is_owner_scoped() {
        let pool = test_pool().await;
        let alice = seed_user(&pool, "alice@example.com").await;
        let bob = seed_user(&pool, "bob@example.com").await;

        let expense = create(&pool, alice.id, &payload("food", 10.0)).await.unwrap();

        assert!(get(&pool, expense.id, alice.id).await.unwrap().is_some());
        // Bob guessing a valid id sees nothing, same as a missing row.
        assert!(get(&pool, expense.id, bob.id).await.unwrap().is_none());
        assert!(get(&pool, 9999, alice.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_is_owner_scoped_and_preserves_identity() {
        let pool = test_pool().await;
        let alice = seed_user(&pool, "alice@example.com").await;
        let bob = seed_user(&pool, "bob@example.com").await;

        let expense = create(&pool, alice.id, &payload("food", 10.0)).await.unwrap();

        let foreign = update(&pool, expense.id, bob.id, &payload("travel", 99.0))
            .await
            .unwrap();
        assert!(foreign.is_none());

        let updated = update(&pool, expense.id, alice.id, &payload("travel", 99.0))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.id, expense.id);
        assert_eq!(updated.user_id, alice.id);
        assert_eq!(updated.category, "travel");
        assert_eq!(updated.amount, 99.0);
        // date kept since the payload carried none
        assert_eq!(updated.date, expense.date);
    }

    #[tokio::test]
    async fn delete_twice_reports_second_as_missing() {
        let pool = test_pool().await;
        let alice = seed_user(&pool, "alice@example.com").await;
        let bob = seed_user(&pool, "bob@example.com").await;

        let expense = create(&pool, alice.id, &payload("food", 10.0)).await.unwrap();

        assert!(!delete(&pool, expense.id, bob.id).await.unwrap());
        assert!(delete(&pool, expense.id, alice.id).await.unwrap());
        assert!(!delete(&pool, expense.id, alice.id).await.unwrap());
    }

    #[tokio::test]
    async fn filters_combine_with_and_semantics() {
        let pool = test_pool().await;
        let alice = seed_user(&pool, "alice@example.com").await;

        create(&pool, alice.id, &payload("food", 10.0)).await.unwrap();
        create(&pool, alice.id, &payload("food", 20.0)).await.unwrap();
        create(&pool, alice.id, &payload("food", -5.0)).await.unwrap();
        create(&pool, alice.id, &payload("travel", 50.0)).await.unwrap();

        let food = ExpenseFilter {
            category: Some("food".to_string()),
            ..Default::default()
        };
        let rows = list(&pool, alice.id, &food).await.unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|e| e.category == "food"));

        let banded = ExpenseFilter {
            category: Some("food".to_string()),
            min_amount: Some(15.0),
            max_amount: Some(25.0),
            ..Default::default()
        };
        let rows = list(&pool, alice.id, &banded).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].amount, 20.0);
    }

    #[tokio::test]
    async fn date_filters_bound_the_window() {
        let pool = test_pool().await;
        let alice = seed_user(&pool, "alice@example.com").await;
        let now = Utc::now().naive_utc();

        for days_ago in [1, 10, 40] {
            let p = ExpensePayload {
                date: Some(now - Duration::days(days_ago)),
                ..payload("food", 1.0)
            };
            create(&pool, alice.id, &p).await.unwrap();
        }

        let recent = ExpenseFilter {
            start_date: Some(now - Duration::days(14)),
            ..Default::default()
        };
        assert_eq!(list(&pool, alice.id, &recent).await.unwrap().len(), 2);

        let middle = ExpenseFilter {
            start_date: Some(now - Duration::days(14)),
            end_date: Some(now - Duration::days(5)),
            ..Default::default()
        };
        assert_eq!(list(&pool, alice.id, &middle).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn list_is_scoped_ordered_and_paginated() {
        let pool = test_pool().await;
        let alice = seed_user(&pool, "alice@example.com").await;
        let bob = seed_user(&pool, "bob@example.com").await;

        for amount in [1.0, 2.0, 3.0, 4.0] {
            create(&pool, alice.id, &payload("food", amount)).await.unwrap();
        }
        create(&pool, bob.id, &payload("food", 100.0)).await.unwrap();

        let rows = list(&pool, alice.id, &ExpenseFilter::default()).await.unwrap();
        assert_eq!(rows.len(), 4);
        assert!(rows.windows(2).all(|w| w[0].id < w[1].id));

        let page = ExpenseFilter {
            skip: 1,
            limit: 2,
            ..Default::default()
        };
        let rows = list(&pool, alice.id, &page).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].amount, 2.0);
        assert_eq!(rows[1].amount, 3.0);
    }

    #[tokio::test]
    async fn summarize_counts_totals_and_breaks_down() {
        let pool = test_pool().await;
        let alice = seed_user(&pool, "alice@example.com").await;
        let bob = seed_user(&pool, "bob@example.com").await;

        for amount in [10.0, 20.0, -5.0] {
            create(&pool, alice.id, &payload("food", amount)).await.unwrap();
        }
        create(&pool, bob.id, &payload("food", 1000.0)).await.unwrap();

        let since = Utc::now().naive_utc() - Duration::days(30);
        let summary = summarize(&pool, alice.id, since).await.unwrap();

        assert_eq!(summary.count, 3);
        assert_eq!(summary.total, 25.0);
        assert!((summary.average - 25.0 / 3.0).abs() < 1e-9);
        assert_eq!(summary.by_category.len(), 1);
        assert_eq!(summary.by_category["food"], 25.0);
    }

    #[tokio::test]
    async fn summarize_excludes_rows_before_window() {
        let pool = test_pool().await;
        let alice = seed_user(&pool, "alice@example.com").await;
        let now = Utc::now().naive_utc();

        create(&pool, alice.id, &payload("food", 10.0)).await.unwrap();
        let old = ExpensePayload {
            date: Some(now - Duration::days(60)),
            ..payload("food", 500.0)
        };
        create(&pool, alice.id, &old).await.unwrap();

        let summary = summarize(&pool, alice.id, now - Duration::days(30)).await.unwrap();
        assert_eq!(summary.count, 1);
        assert_eq!(summary.total, 10.0);
    }

    #[tokio::test]
    async fn summarize_empty_window_has_zero_average() {
        let pool = test_pool().await;
        let alice = seed_user(&pool, "alice@example.com").await;

        let since = Utc::now().naive_utc() - Duration::days(30);
        let summary = summarize(&pool, alice.id, since).await.unwrap();

        assert_eq!(summary.count, 0);
        assert_eq!(summary.total, 0.0);
        assert_eq!(summary.average, 0.0);
        assert!(summary.by_category.is_empty());
    }
}
