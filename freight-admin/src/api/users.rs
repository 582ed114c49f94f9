use log::info;

use super::client::{ApiClient, Fetched, RequestContext};
use super::error::ApiError;
use crate::models::requests::{CreateUserRequest, ListFilters, UpdateUserRequest};
use crate::models::responses::User;
use crate::utils::logging::mask_sensitive;

pub async fn list(
    client: &ApiClient,
    ctx: &RequestContext,
    filters: &ListFilters,
) -> Result<Fetched<Vec<User>>, ApiError> {
    client.get(ctx, &["users"], &filters.to_query()).await
}

pub async fn create(
    client: &ApiClient,
    ctx: &RequestContext,
    request: &CreateUserRequest,
) -> Result<Fetched<User>, ApiError> {
    info!(
        "[PHASE: users] [STEP: create] creating {} account for {} (correlation_id={})",
        request.role,
        mask_sensitive(&request.email),
        ctx.correlation_id()
    );
    client.post(ctx, &["users"], request).await
}

pub async fn update(
    client: &ApiClient,
    ctx: &RequestContext,
    id: &str,
    request: &UpdateUserRequest,
) -> Result<Fetched<User>, ApiError> {
    client.put(ctx, &["users", id], request).await
}

pub async fn delete(client: &ApiClient, ctx: &RequestContext, id: &str) -> Result<(), ApiError> {
    let _: Fetched<Option<serde_json::Value>> = client.delete(ctx, &["users", id]).await?;
    info!(
        "[PHASE: users] [STEP: delete] user {} removed (correlation_id={})",
        id,
        ctx.correlation_id()
    );
    Ok(())
}
