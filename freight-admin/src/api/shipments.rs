use log::info;

use super::client::{ApiClient, Fetched, RequestContext};
use super::error::ApiError;
use crate::models::requests::{CreateShipmentRequest, ListFilters};
use crate::models::responses::Shipment;

pub async fn list(
    client: &ApiClient,
    ctx: &RequestContext,
    filters: &ListFilters,
) -> Result<Fetched<Vec<Shipment>>, ApiError> {
    client.get(ctx, &["shipments"], &filters.to_query()).await
}

pub async fn get(client: &ApiClient, ctx: &RequestContext, id: &str) -> Result<Fetched<Shipment>, ApiError> {
    client.get(ctx, &["shipments", id], &[]).await
}

pub async fn create(
    client: &ApiClient,
    ctx: &RequestContext,
    request: &CreateShipmentRequest,
) -> Result<Fetched<Shipment>, ApiError> {
    let fetched: Fetched<Shipment> = client.post(ctx, &["shipments"], request).await?;
    info!(
        "[PHASE: shipments] [STEP: create] shipment {} created for booking {} (correlation_id={})",
        fetched.data.shipment_number,
        request.booking_id,
        ctx.correlation_id()
    );
    Ok(fetched)
}
