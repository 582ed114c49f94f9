use log::info;

use super::client::{ApiClient, Fetched, RequestContext};
use super::error::ApiError;
use crate::models::requests::{CreateBookingRequest, ListFilters, UpdateBookingStatusRequest};
use crate::models::responses::Booking;

pub async fn list(
    client: &ApiClient,
    ctx: &RequestContext,
    filters: &ListFilters,
) -> Result<Fetched<Vec<Booking>>, ApiError> {
    client.get(ctx, &["bookings"], &filters.to_query()).await
}

pub async fn get(client: &ApiClient, ctx: &RequestContext, id: &str) -> Result<Fetched<Booking>, ApiError> {
    client.get(ctx, &["bookings", id], &[]).await
}

pub async fn create(
    client: &ApiClient,
    ctx: &RequestContext,
    request: &CreateBookingRequest,
) -> Result<Fetched<Booking>, ApiError> {
    let fetched: Fetched<Booking> = client.post(ctx, &["bookings"], request).await?;
    info!(
        "[PHASE: bookings] [STEP: create] booking {} created (correlation_id={})",
        fetched.data.booking_number,
        ctx.correlation_id()
    );
    Ok(fetched)
}

pub async fn update_status(
    client: &ApiClient,
    ctx: &RequestContext,
    id: &str,
    status: &str,
) -> Result<Fetched<Booking>, ApiError> {
    let body = UpdateBookingStatusRequest {
        status: status.to_string(),
    };
    client.patch(ctx, &["bookings", id, "status"], &body).await
}
