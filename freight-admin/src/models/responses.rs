// API response models
// Shapes returned by the freight backend (camelCase JSON).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =========================
// Generic wrapper (backend envelope)
// =========================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            message: None,
            pagination: None,
        }
    }

    /// Best message for a failed envelope (`error` wins over `message`).
    pub fn failure_message(&self) -> Option<String> {
        self.error
            .clone()
            .or_else(|| self.message.clone())
            .filter(|m| !m.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub total_pages: u32,
}

// =========================
// Bookings
// =========================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    pub company: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub address: String,
}

impl Address {
    /// "City, Country" for list views.
    pub fn short(&self) -> String {
        match (self.city.trim(), self.country.trim()) {
            ("", "") => "-".to_string(),
            (city, "") => city.to_string(),
            ("", country) => country.to_string(),
            (city, country) => format!("{}, {}", city, country),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CargoDetail {
    #[serde(default)]
    pub package_type: String,
    #[serde(default)]
    pub quantity: f64,
    #[serde(default)]
    pub weight: f64,
    pub length: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub volume: Option<f64>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: String,
    #[serde(default)]
    pub booking_number: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub customer: Customer,
    #[serde(default)]
    pub origin: Address,
    #[serde(default)]
    pub destination: Address,
    pub transport_mode: Option<String>,
    pub pickup_date: Option<String>,
    #[serde(default)]
    pub cargo_details: Vec<CargoDetail>,
    pub total_packages: Option<f64>,
    pub total_weight: Option<f64>,
    pub total_volume: Option<f64>,
    pub created_at: Option<DateTime<Utc>>,
}

// =========================
// Shipments
// =========================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransportDetails {
    #[serde(default)]
    pub mode: String,
    #[serde(default)]
    pub carrier: String,
    pub vessel_or_flight: Option<String>,
    pub departure_date: Option<String>,
    pub arrival_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shipment {
    pub id: String,
    #[serde(default)]
    pub shipment_number: String,
    #[serde(default)]
    pub tracking_number: String,
    #[serde(default)]
    pub status: String,
    pub booking_id: Option<String>,
    #[serde(default)]
    pub packages: Vec<CargoDetail>,
    #[serde(default)]
    pub transport: TransportDetails,
    pub created_at: Option<DateTime<Utc>>,
}

// =========================
// Users
// =========================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub role: String,
    pub warehouse_id: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub created_at: Option<DateTime<Utc>>,
}

fn default_true() -> bool {
    true
}

// =========================
// Warehouse
// =========================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarehouseReceipt {
    pub id: String,
    #[serde(default)]
    pub tracking_number: String,
    pub shipment_id: Option<String>,
    #[serde(default)]
    pub received_packages: u32,
    #[serde(default)]
    pub condition: String,
    pub storage_location: Option<String>,
    pub notes: Option<String>,
    pub received_at: Option<DateTime<Utc>>,
}

// =========================
// Auth
// =========================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    #[serde(default)]
    pub otp_required: bool,
    pub otp_expires_in: Option<u32>,
    pub token: Option<String>,
    pub user: Option<User>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthTokenResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpResendResponse {
    #[serde(default)]
    pub otp_expires_in: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booking_tolerates_sparse_payloads() {
        let json = r#"{
            "id": "b-1",
            "bookingNumber": "BK-0001",
            "status": "booking_confirmed",
            "customer": { "name": "Acme", "email": "ops@acme.test" },
            "totalWeight": 120.5
        }"#;
        let booking: Booking = serde_json::from_str(json).unwrap();
        assert_eq!(booking.booking_number, "BK-0001");
        assert!(booking.cargo_details.is_empty());
        assert_eq!(booking.total_weight, Some(120.5));
        assert_eq!(booking.origin.short(), "-");
    }

    #[test]
    fn envelope_prefers_error_over_message() {
        let env: ApiResponse<()> =
            serde_json::from_str(r#"{"success":false,"error":"Booking not found","message":"fail"}"#)
                .unwrap();
        assert_eq!(env.failure_message().as_deref(), Some("Booking not found"));

        let env: ApiResponse<()> = serde_json::from_str(r#"{"success":false,"message":"  "}"#).unwrap();
        assert_eq!(env.failure_message(), None);
    }
}
