use log::info;

use super::client::{ApiClient, Fetched, RequestContext};
use super::error::ApiError;
use crate::models::requests::{ListFilters, ReceiveShipmentRequest};
use crate::models::responses::WarehouseReceipt;

pub async fn list_receipts(
    client: &ApiClient,
    ctx: &RequestContext,
    filters: &ListFilters,
) -> Result<Fetched<Vec<WarehouseReceipt>>, ApiError> {
    client.get(ctx, &["warehouse", "receipts"], &filters.to_query()).await
}

pub async fn receive(
    client: &ApiClient,
    ctx: &RequestContext,
    request: &ReceiveShipmentRequest,
) -> Result<Fetched<WarehouseReceipt>, ApiError> {
    let fetched: Fetched<WarehouseReceipt> = client.post(ctx, &["warehouse", "receipts"], request).await?;
    info!(
        "[PHASE: warehouse] [STEP: receive] {} received ({} package(s), {}) (correlation_id={})",
        request.tracking_number,
        request.received_packages,
        request.condition,
        ctx.correlation_id()
    );
    Ok(fetched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::{body_of, settings_for, Canned, CannedServer};

    #[tokio::test]
    async fn receive_posts_the_inspection() {
        let server = CannedServer::start(vec![Canned::json(
            200,
            r#"{"success":true,"data":{"id":"r1","trackingNumber":"TRK9","receivedPackages":4,"condition":"good"}}"#,
        )])
        .await;
        let client = ApiClient::new(&settings_for(&server.base_url())).unwrap();
        let request = ReceiveShipmentRequest {
            tracking_number: "TRK9".to_string(),
            received_packages: 4,
            condition: "good".to_string(),
            damage_notes: None,
            storage_location: Some("A-12".to_string()),
        };
        let fetched = receive(&client, &RequestContext::anonymous(), &request).await.unwrap();
        assert_eq!(fetched.data.received_packages, 4);

        let raw = &server.requests()[0];
        assert!(raw.starts_with("POST /api/warehouse/receipts "));
        let body: serde_json::Value = serde_json::from_str(body_of(raw)).unwrap();
        assert_eq!(body["storageLocation"], "A-12");
        assert!(body.get("damageNotes").is_none());
    }
}
