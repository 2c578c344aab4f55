//! HTTP handlers for reporting endpoints
//!
//! Reports return JSON by default; `?format=csv` streams CSV instead.

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::report::ReportService;
use crate::AppState;
use shared::types::{ApiResponse, DateRangeQuery};

/// Query parameters for report endpoints
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportQuery {
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    /// `csv` to export; JSON otherwise
    pub format: Option<String>,
}

impl ReportQuery {
    fn range(&self) -> DateRangeQuery {
        DateRangeQuery {
            from_date: self.from_date,
            to_date: self.to_date,
        }
    }

    fn wants_csv(&self) -> bool {
        self.format.as_deref() == Some("csv")
    }
}

/// Render report rows as JSON or CSV
fn render<T: Serialize>(rows: Vec<T>, wants_csv: bool) -> AppResult<Response> {
    if wants_csv {
        let csv = ReportService::export_to_csv(&rows)?;
        Ok((
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/csv")],
            csv,
        )
            .into_response())
    } else {
        Ok(Json(ApiResponse::ok(rows)).into_response())
    }
}

/// Current stock levels per material and warehouse
pub async fn current_stock_report(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ReportQuery>,
) -> AppResult<Response> {
    let service = ReportService::new(state.db);
    let rows = service.current_stock(current_user.0.org_id).await?;
    render(rows, query.wants_csv())
}

/// Vendor orders over a date range
pub async fn purchase_report(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ReportQuery>,
) -> AppResult<Response> {
    let service = ReportService::new(state.db);
    let rows = service
        .purchase_report(current_user.0.org_id, &query.range())
        .await?;
    render(rows, query.wants_csv())
}

/// Customer orders over a date range
pub async fn sales_report(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ReportQuery>,
) -> AppResult<Response> {
    let service = ReportService::new(state.db);
    let rows = service
        .sales_report(current_user.0.org_id, &query.range())
        .await?;
    render(rows, query.wants_csv())
}
