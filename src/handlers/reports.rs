use axum::{
    extract::{Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::entities::order::{Channel, OrderStatus, PaymentMethod};
use crate::errors::ServiceError;
use crate::services::reports::{ChannelStats, DailyStats, ProductStats, ReportFilter, SalesAggregate};
use crate::{ApiResponse, ApiResult, AppState};

/// Query-string shape for every report endpoint. Set-valued filters are
/// comma-separated lists of wire values (e.g. `channels=eBay,Facebook`).
#[derive(Debug, Deserialize, IntoParams)]
pub struct ReportQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub channels: Option<String>,
    pub payment_methods: Option<String>,
    pub statuses: Option<String>,
    pub skus: Option<String>,
}

fn parse_channel(value: &str) -> Result<Channel, ServiceError> {
    match value {
        "eBay" => Ok(Channel::Ebay),
        "Facebook" => Ok(Channel::Facebook),
        "saltFish" => Ok(Channel::SaltFish),
        "other" => Ok(Channel::Other),
        other => Err(ServiceError::ValidationError(format!(
            "Unknown channel: {other}"
        ))),
    }
}

fn parse_payment_method(value: &str) -> Result<PaymentMethod, ServiceError> {
    match value {
        "cash" => Ok(PaymentMethod::Cash),
        "payid" => Ok(PaymentMethod::Payid),
        other => Err(ServiceError::ValidationError(format!(
            "Unknown payment method: {other}"
        ))),
    }
}

fn parse_status(value: &str) -> Result<OrderStatus, ServiceError> {
    match value {
        "pending" => Ok(OrderStatus::Pending),
        "done" => Ok(OrderStatus::Done),
        other => Err(ServiceError::ValidationError(format!(
            "Unknown order status: {other}"
        ))),
    }
}

fn parse_set<T>(
    raw: &Option<String>,
    parse: impl Fn(&str) -> Result<T, ServiceError>,
) -> Result<Option<Vec<T>>, ServiceError> {
    match raw {
        None => Ok(None),
        Some(list) => {
            let values = list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(parse)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(if values.is_empty() { None } else { Some(values) })
        }
    }
}

impl TryFrom<ReportQuery> for ReportFilter {
    type Error = ServiceError;

    fn try_from(query: ReportQuery) -> Result<Self, Self::Error> {
        if let (Some(start), Some(end)) = (query.start_date, query.end_date) {
            if start > end {
                return Err(ServiceError::ValidationError(
                    "start_date must not be after end_date".into(),
                ));
            }
        }
        Ok(ReportFilter {
            start_date: query.start_date,
            end_date: query.end_date,
            channels: parse_set(&query.channels, parse_channel)?,
            payment_methods: parse_set(&query.payment_methods, parse_payment_method)?,
            statuses: parse_set(&query.statuses, parse_status)?,
            skus: parse_set(&query.skus, |s| Ok(s.to_string()))?,
        })
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/reports/summary",
    params(ReportQuery),
    responses((status = 200, description = "Sales summary over the filtered order set", body = SalesAggregate))
)]
pub async fn summary(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> ApiResult<SalesAggregate> {
    let filter = ReportFilter::try_from(query)?;
    let summary = state.services.reports.summary(&filter).await?;
    Ok(Json(ApiResponse::success(summary)))
}

#[utoipa::path(
    get,
    path = "/api/v1/reports/channels",
    params(ReportQuery),
    responses((status = 200, description = "Per-channel sales stats, descending by total sales", body = [ChannelStats]))
)]
pub async fn channel_stats(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> ApiResult<Vec<ChannelStats>> {
    let filter = ReportFilter::try_from(query)?;
    let stats = state.services.reports.channel_stats(&filter).await?;
    Ok(Json(ApiResponse::success(stats)))
}

#[utoipa::path(
    get,
    path = "/api/v1/reports/products",
    params(ReportQuery),
    responses((status = 200, description = "Per-product sales stats, descending by total sales", body = [ProductStats]))
)]
pub async fn product_stats(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> ApiResult<Vec<ProductStats>> {
    let filter = ReportFilter::try_from(query)?;
    let stats = state.services.reports.product_stats(&filter).await?;
    Ok(Json(ApiResponse::success(stats)))
}

#[utoipa::path(
    get,
    path = "/api/v1/reports/timeseries",
    params(ReportQuery),
    responses((status = 200, description = "Per-day sales stats, ascending by date", body = [DailyStats]))
)]
pub async fn time_series(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> ApiResult<Vec<DailyStats>> {
    let filter = ReportFilter::try_from(query)?;
    let stats = state.services.reports.time_series(&filter).await?;
    Ok(Json(ApiResponse::success(stats)))
}
