//! Voucher stock ledger endpoints.
//!
//! A movement posted without `openingStock` opens at the previous day's
//! closing stock. A movement for a (grade, location, date) that already has an
//! entry is rejected with 409; corrections go through `PUT /api/stock/{id}`.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, put},
};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use booklist_core::{Grade, GradeCatalogue, StockEntry, StockEntryId, StockMovement, ValidationError};

use super::required;
use crate::db::StockRepository;
use crate::db::stock::StockFilter;
use crate::error::AppError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::RequireAuth;
use crate::state::AppState;

/// Build the stock router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/stock", get(list).post(record))
        .route("/api/stock/{id}", put(correct))
        .route("/api/stock/current", get(current))
        .route("/api/stock/previous-closing", get(previous_closing))
        .route("/api/stock/opening", get(opening))
        .route("/api/grades", get(grades))
}

fn parse_grade(label: &str) -> Result<Grade, ValidationError> {
    Grade::parse(label).ok_or(ValidationError::MissingField("grade"))
}

#[derive(Debug, Default, Deserialize)]
pub struct StockQuery {
    pub location: Option<String>,
    pub date: Option<NaiveDate>,
    pub grade: Option<String>,
}

#[instrument(skip(_auth, state))]
pub async fn list(
    RequireAuth(_auth): RequireAuth,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<StockQuery>,
) -> Result<Json<Vec<StockEntry>>, AppError> {
    let filter = StockFilter {
        location: query.location.as_deref().map(str::trim),
        date: query.date,
        grade: query.grade.as_deref().map(str::trim),
    };
    Ok(Json(StockRepository::new(state.pool()).list(&filter).await?))
}

/// Body of `POST /api/stock`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockRequest {
    #[serde(default)]
    pub voucher_id: Option<String>,
    pub grade: String,
    pub location: String,
    pub date: NaiveDate,
    /// Defaults to the previous closing stock.
    #[serde(default)]
    pub opening_stock: Option<i32>,
    #[serde(default)]
    pub received: i32,
    #[serde(default)]
    pub redeemed: i32,
    /// Checked against the computed closing stock when present.
    #[serde(default)]
    pub closing_stock: Option<i32>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[instrument(skip(_auth, state))]
pub async fn record(
    RequireAuth(_auth): RequireAuth,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<StockRequest>,
) -> Result<(StatusCode, Json<StockEntry>), AppError> {
    let grade = parse_grade(&body.grade)?;
    let location = required("location", &body.location)?;
    let repo = StockRepository::new(state.pool());

    let opening_stock = match body.opening_stock {
        Some(opening) => opening,
        None => repo.previous_closing(&grade, location, body.date).await?,
    };

    let movement = StockMovement::new(
        grade.as_str(),
        location,
        body.date,
        opening_stock,
        body.received,
        body.redeemed,
    )?
    .with_voucher_id(body.voucher_id)
    .with_notes(body.notes);
    movement.check_closing(body.closing_stock)?;

    let entry = repo.record(&movement).await?;

    info!(
        entry_id = %entry.id,
        closing_stock = entry.closing_stock,
        "Stock movement recorded"
    );
    Ok((StatusCode::CREATED, Json(entry)))
}

/// Body of `PUT /api/stock/{id}`. Absent fields keep their stored value.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockCorrection {
    pub voucher_id: Option<String>,
    pub opening_stock: Option<i32>,
    pub received: Option<i32>,
    pub redeemed: Option<i32>,
    pub closing_stock: Option<i32>,
    pub notes: Option<String>,
}

#[instrument(skip(_auth, state))]
pub async fn correct(
    RequireAuth(_auth): RequireAuth,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<StockEntryId>,
    ApiJson(body): ApiJson<StockCorrection>,
) -> Result<Json<StockEntry>, AppError> {
    let repo = StockRepository::new(state.pool());
    let existing = repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("stock entry not found".to_owned()))?;

    let movement = StockMovement::new(
        existing.grade.as_str(),
        &existing.location,
        existing.date,
        body.opening_stock.unwrap_or(existing.opening_stock),
        body.received.unwrap_or(existing.received),
        body.redeemed.unwrap_or(existing.redeemed),
    )?
    .with_voucher_id(Some(body.voucher_id.unwrap_or(existing.voucher_id)))
    .with_notes(body.notes.or(existing.notes));
    movement.check_closing(body.closing_stock)?;

    let entry = repo.correct(id, &movement).await?;

    info!(entry_id = %id, closing_stock = entry.closing_stock, "Stock entry corrected");
    Ok(Json(entry))
}

/// A single stock figure for one grade at one location.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockLevel {
    pub grade: Grade,
    pub location: String,
    pub date: NaiveDate,
    pub stock: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentQuery {
    pub grade: String,
    pub location: String,
    /// Defaults to today.
    pub as_of: Option<NaiveDate>,
}

#[instrument(skip(_auth, state))]
pub async fn current(
    RequireAuth(_auth): RequireAuth,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<CurrentQuery>,
) -> Result<Json<StockLevel>, AppError> {
    let grade = parse_grade(&query.grade)?;
    let location = required("location", &query.location)?;
    let date = query.as_of.unwrap_or_else(|| Local::now().date_naive());

    let stock = StockRepository::new(state.pool())
        .current_stock(&grade, location, date)
        .await?;

    Ok(Json(StockLevel {
        grade,
        location: location.to_owned(),
        date,
        stock,
    }))
}

#[derive(Debug, Deserialize)]
pub struct PreviousClosingQuery {
    pub grade: String,
    pub location: String,
    pub before: NaiveDate,
}

#[instrument(skip(_auth, state))]
pub async fn previous_closing(
    RequireAuth(_auth): RequireAuth,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PreviousClosingQuery>,
) -> Result<Json<StockLevel>, AppError> {
    let grade = parse_grade(&query.grade)?;
    let location = required("location", &query.location)?;

    let stock = StockRepository::new(state.pool())
        .previous_closing(&grade, location, query.before)
        .await?;

    Ok(Json(StockLevel {
        grade,
        location: location.to_owned(),
        date: query.before,
        stock,
    }))
}

#[derive(Debug, Deserialize)]
pub struct OpeningQuery {
    pub grade: String,
    pub location: String,
    pub date: NaiveDate,
}

#[instrument(skip(_auth, state))]
pub async fn opening(
    RequireAuth(_auth): RequireAuth,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<OpeningQuery>,
) -> Result<Json<StockLevel>, AppError> {
    let grade = parse_grade(&query.grade)?;
    let location = required("location", &query.location)?;

    let stock = StockRepository::new(state.pool())
        .opening_for(&grade, location, query.date)
        .await?;

    Ok(Json(StockLevel {
        grade,
        location: location.to_owned(),
        date: query.date,
        stock,
    }))
}

/// Grades tracked by day-end reports.
pub async fn grades(
    RequireAuth(_auth): RequireAuth,
    State(state): State<AppState>,
) -> Json<GradeCatalogue> {
    Json(state.grades().clone())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_request_defaults() {
        let body: StockRequest = serde_json::from_value(serde_json::json!({
            "grade": "1",
            "location": "Hithadhoo",
            "date": "2024-01-01",
            "received": 10
        }))
        .unwrap();
        assert_eq!(body.opening_stock, None);
        assert_eq!(body.redeemed, 0);
        assert_eq!(body.closing_stock, None);
    }

    #[test]
    fn test_blank_grade_rejected() {
        assert_eq!(
            parse_grade("  "),
            Err(ValidationError::MissingField("grade"))
        );
    }

    #[test]
    fn test_stock_level_is_camel_case() {
        let level = StockLevel {
            grade: Grade::parse("9 SCI01").unwrap(),
            location: "Feydhoo".to_owned(),
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            stock: 55,
        };
        let json = serde_json::to_value(&level).unwrap();
        assert_eq!(json["grade"], "9 SCI01");
        assert_eq!(json["stock"], 55);
        assert_eq!(json["date"], "2024-01-02");
    }
}
