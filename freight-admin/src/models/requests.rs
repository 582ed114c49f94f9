// API request models
// Bodies and query filters sent to the freight backend (camelCase JSON).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::responses::{Address, CargoDetail, Customer};

// =========================
// Auth
// =========================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResendOtpRequest {
    pub email: String,
}

// =========================
// Bookings
// =========================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub customer: Customer,
    pub origin: Address,
    pub destination: Address,
    pub transport_mode: String,
    pub pickup_date: NaiveDate,
    pub cargo_details: Vec<CargoDetail>,
    pub total_packages: f64,
    pub total_weight: f64,
    pub total_volume: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBookingStatusRequest {
    pub status: String,
}

/// Server-side list filters. Unset fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl ListFilters {
    /// Query pairs in a stable order.
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(status) = self.status.as_ref().filter(|s| !s.trim().is_empty()) {
            pairs.push(("status", status.trim().to_string()));
        }
        if let Some(search) = self.search.as_ref().filter(|s| !s.trim().is_empty()) {
            pairs.push(("search", search.trim().to_string()));
        }
        if let Some(role) = self.role.as_ref().filter(|s| !s.trim().is_empty()) {
            pairs.push(("role", role.trim().to_string()));
        }
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        pairs
    }
}

// =========================
// Shipments
// =========================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateShipmentRequest {
    pub booking_id: String,
    pub packages: Vec<CargoDetail>,
    pub transport: ShipmentTransport,
    pub total_packages: f64,
    pub total_weight: f64,
    pub total_volume: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentTransport {
    pub mode: String,
    pub carrier: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vessel_or_flight: Option<String>,
    pub departure_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arrival_date: Option<NaiveDate>,
}

// =========================
// Users
// =========================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warehouse_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warehouse_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

// =========================
// Warehouse
// =========================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiveShipmentRequest {
    pub tracking_number: String,
    pub received_packages: u32,
    pub condition: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub damage_notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_location: Option<String>,
}
