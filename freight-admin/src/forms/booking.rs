// Booking creation wizard: customer → route → cargo → review.

use super::packages::{self, PACKAGES, PACKAGE_FIELDS};
use super::record::{FieldPath, FieldValue, FormRecord};
use super::wizard::{FieldKind, FieldSpec, StepDefinition, WizardSchema};
use super::{ErrorMap, FormError};
use crate::models::requests::CreateBookingRequest;
use crate::models::responses::{Address, Customer};
use crate::utils::validation;

pub const TRANSPORT_MODES: &[&str] = &["air", "sea", "road", "rail"];

const CUSTOMER_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("customerName", "Customer name", FieldKind::Text),
    FieldSpec::new("customerEmail", "Email", FieldKind::Text),
    FieldSpec::new("customerPhone", "Phone", FieldKind::Text),
    FieldSpec::new("company", "Company (optional)", FieldKind::Text),
];

const ROUTE_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("origin.country", "Origin country", FieldKind::Location),
    FieldSpec::new("origin.state", "Origin state", FieldKind::Location),
    FieldSpec::new("origin.city", "Origin city", FieldKind::Location),
    FieldSpec::new("origin.address", "Origin address", FieldKind::Text),
    FieldSpec::new("destination.country", "Destination country", FieldKind::Location),
    FieldSpec::new("destination.state", "Destination state", FieldKind::Location),
    FieldSpec::new("destination.city", "Destination city", FieldKind::Location),
    FieldSpec::new("destination.address", "Destination address", FieldKind::Text),
    FieldSpec::new("transport.mode", "Transport mode", FieldKind::Choice(TRANSPORT_MODES)),
    FieldSpec::new("transport.pickupDate", "Pickup date", FieldKind::Date),
];

const CARGO_FIELDS: &[FieldSpec] = &[FieldSpec::new(PACKAGES, "Packages", FieldKind::Items(PACKAGE_FIELDS))];

const REVIEW_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("notes", "Notes", FieldKind::Text),
    FieldSpec::new("termsAccepted", "I confirm the booking details", FieldKind::Toggle),
];

const STEPS: &[StepDefinition] = &[
    StepDefinition {
        id: "customer",
        title: "Customer",
        fields: CUSTOMER_FIELDS,
    },
    StepDefinition {
        id: "route",
        title: "Route & transport",
        fields: ROUTE_FIELDS,
    },
    StepDefinition {
        id: "cargo",
        title: "Cargo",
        fields: CARGO_FIELDS,
    },
    StepDefinition {
        id: "review",
        title: "Review",
        fields: REVIEW_FIELDS,
    },
];

fn address_record() -> FormRecord {
    FormRecord::new()
        .with("country", "")
        .with("state", "")
        .with("city", "")
        .with("address", "")
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BookingSchema;

impl BookingSchema {
    fn validate_customer(record: &FormRecord, errors: &mut ErrorMap) {
        validation::require(errors, "customerName", record.text("customerName"), "Customer name");
        validation::check_email(errors, "customerEmail", record.text("customerEmail"));
        validation::check_phone(errors, "customerPhone", record.text("customerPhone"));
    }

    fn validate_route(record: &FormRecord, errors: &mut ErrorMap) {
        for side in ["origin", "destination"] {
            let label = if side == "origin" { "Origin" } else { "Destination" };
            for field in ["country", "city", "address"] {
                let path = format!("{}.{}", side, field);
                validation::require(errors, &path, record.text(&path), &format!("{} {}", label, field));
            }
        }

        let same_place = |field: &str| {
            let a = record.text(&format!("origin.{}", field)).trim().to_lowercase();
            let b = record.text(&format!("destination.{}", field)).trim().to_lowercase();
            !a.is_empty() && a == b
        };
        if same_place("country") && same_place("city") && same_place("address") {
            errors.insert("destination.address", "Destination must differ from origin");
        }

        let mode = record.text("transport.mode");
        if mode.trim().is_empty() {
            errors.insert("transport.mode", "Select a transport mode");
        } else if !TRANSPORT_MODES.contains(&mode) {
            errors.insert("transport.mode", "Unknown transport mode");
        }
        validation::check_date(errors, "transport.pickupDate", record.text("transport.pickupDate"), "Pickup date");
    }

    fn address(record: &FormRecord, side: &str) -> Address {
        let field = |name: &str| record.text(&format!("{}.{}", side, name)).trim().to_string();
        Address {
            country: field("country"),
            state: field("state"),
            city: field("city"),
            address: field("address"),
        }
    }
}

fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

impl WizardSchema for BookingSchema {
    type Payload = CreateBookingRequest;

    fn title(&self) -> &'static str {
        "New booking"
    }

    fn steps(&self) -> &'static [StepDefinition] {
        STEPS
    }

    fn blank_record(&self) -> FormRecord {
        let mut record = FormRecord::new()
            .with("customerName", "")
            .with("customerEmail", "")
            .with("customerPhone", "")
            .with("company", "")
            .with_record("origin", address_record())
            .with_record("destination", address_record())
            .with_record(
                "transport",
                FormRecord::new().with("mode", "").with("pickupDate", ""),
            )
            .with_list(PACKAGES, packages::package_template())
            .with("notes", "")
            .with("termsAccepted", false);
        // Start with one empty line so the cargo step is not blank.
        let _ = record.push_item(PACKAGES);
        record
    }

    fn validate_step(&self, step: &StepDefinition, record: &FormRecord) -> ErrorMap {
        let mut errors = ErrorMap::new();
        match step.id {
            "customer" => Self::validate_customer(record, &mut errors),
            "route" => Self::validate_route(record, &mut errors),
            "cargo" => packages::validate(record, &mut errors),
            "review" => {
                if !record.flag("termsAccepted") {
                    errors.insert("termsAccepted", "Please confirm the booking details");
                }
            }
            _ => {}
        }
        errors
    }

    fn normalize(&self, path: &FieldPath, value: FieldValue) -> FieldValue {
        packages::normalize(path, value)
    }

    fn derive(&self, changed: &FieldPath, record: &mut FormRecord) {
        packages::derive(changed, record);
    }

    fn build_payload(&self, record: &FormRecord) -> Result<CreateBookingRequest, FormError> {
        let pickup_date = validation::parse_date(record.text("transport.pickupDate"))
            .ok_or_else(|| FormError::Payload("pickup date is not a valid date".to_string()))?;
        let cargo_details = packages::cargo_details(record);
        let sum = packages::totals(&cargo_details);
        Ok(CreateBookingRequest {
            customer: Customer {
                name: record.text("customerName").trim().to_string(),
                email: record.text("customerEmail").trim().to_string(),
                phone: record.text("customerPhone").trim().to_string(),
                company: optional(record.text("company")),
            },
            origin: Self::address(record, "origin"),
            destination: Self::address(record, "destination"),
            transport_mode: record.text("transport.mode").to_string(),
            pickup_date,
            cargo_details,
            total_packages: sum.packages,
            total_weight: sum.weight,
            total_volume: sum.volume,
            notes: optional(record.text("notes")),
        })
    }
}
