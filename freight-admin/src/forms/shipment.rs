// Shipment creation wizard: booking → packages → transport → review.
//
// Picking a booking snapshots it into the record. The shipment never follows
// later changes to the booking on the server.

use log::debug;

use super::packages::{self, PACKAGES, PACKAGE_FIELDS};
use super::record::{FieldPath, FieldValue, FormRecord};
use super::wizard::{FieldKind, FieldSpec, StepDefinition, Wizard, WizardSchema};
use super::{ErrorMap, FormError};
use super::booking::TRANSPORT_MODES;
use crate::models::requests::{CreateShipmentRequest, ShipmentTransport};
use crate::models::responses::{Booking, CargoDetail};
use crate::utils::validation;

const BOOKING_FIELDS: &[FieldSpec] = &[FieldSpec::new("bookingId", "Booking", FieldKind::Text)];

const PACKAGE_STEP_FIELDS: &[FieldSpec] =
    &[FieldSpec::new(PACKAGES, "Packages", FieldKind::Items(PACKAGE_FIELDS))];

const TRANSPORT_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("transport.mode", "Transport mode", FieldKind::Choice(TRANSPORT_MODES)),
    FieldSpec::new("transport.carrier", "Carrier", FieldKind::Text),
    FieldSpec::new("transport.vesselOrFlight", "Vessel / flight (optional)", FieldKind::Text),
    FieldSpec::new("transport.departureDate", "Departure date", FieldKind::Date),
    FieldSpec::new("transport.arrivalDate", "Arrival date (optional)", FieldKind::Date),
];

const REVIEW_FIELDS: &[FieldSpec] = &[FieldSpec::new("notes", "Notes", FieldKind::Text)];

const STEPS: &[StepDefinition] = &[
    StepDefinition {
        id: "booking",
        title: "Booking",
        fields: BOOKING_FIELDS,
    },
    StepDefinition {
        id: "packages",
        title: "Packages",
        fields: PACKAGE_STEP_FIELDS,
    },
    StepDefinition {
        id: "transport",
        title: "Transport",
        fields: TRANSPORT_FIELDS,
    },
    StepDefinition {
        id: "review",
        title: "Review",
        fields: REVIEW_FIELDS,
    },
];

#[derive(Debug, Clone, Copy, Default)]
pub struct ShipmentSchema;

impl ShipmentSchema {
    fn validate_transport(record: &FormRecord, errors: &mut ErrorMap) {
        let mode = record.text("transport.mode");
        if mode.trim().is_empty() {
            errors.insert("transport.mode", "Select a transport mode");
        } else if !TRANSPORT_MODES.contains(&mode) {
            errors.insert("transport.mode", "Unknown transport mode");
        }
        validation::require(errors, "transport.carrier", record.text("transport.carrier"), "Carrier");

        let departure = validation::check_date(
            errors,
            "transport.departureDate",
            record.text("transport.departureDate"),
            "Departure date",
        );
        let arrival_raw = record.text("transport.arrivalDate");
        if arrival_raw.trim().is_empty() {
            return;
        }
        let arrival = validation::check_date(errors, "transport.arrivalDate", arrival_raw, "Arrival date");
        if let (Some(departure), Some(arrival)) = (departure, arrival) {
            if arrival < departure {
                errors.insert(
                    "transport.arrivalDate",
                    "Arrival date cannot be before departure date",
                );
            }
        }
    }
}

impl WizardSchema for ShipmentSchema {
    type Payload = CreateShipmentRequest;

    fn title(&self) -> &'static str {
        "New shipment"
    }

    fn steps(&self) -> &'static [StepDefinition] {
        STEPS
    }

    fn blank_record(&self) -> FormRecord {
        FormRecord::new()
            .with("bookingId", "")
            // Snapshot of the selected booking, shown on the review step.
            .with("bookingNumber", "")
            .with("customerName", "")
            .with("originSummary", "")
            .with("destinationSummary", "")
            .with_list(PACKAGES, packages::package_template())
            .with_record(
                "transport",
                FormRecord::new()
                    .with("mode", "")
                    .with("carrier", "")
                    .with("vesselOrFlight", "")
                    .with("departureDate", "")
                    .with("arrivalDate", ""),
            )
            .with("notes", "")
    }

    fn validate_step(&self, step: &StepDefinition, record: &FormRecord) -> ErrorMap {
        let mut errors = ErrorMap::new();
        match step.id {
            "booking" => {
                if record.text("bookingId").trim().is_empty() {
                    errors.insert("bookingId", "Select a booking");
                }
            }
            "packages" => packages::validate(record, &mut errors),
            "transport" => Self::validate_transport(record, &mut errors),
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

    fn build_payload(&self, record: &FormRecord) -> Result<CreateShipmentRequest, FormError> {
        let departure_date = validation::parse_date(record.text("transport.departureDate"))
            .ok_or_else(|| FormError::Payload("departure date is not a valid date".to_string()))?;
        let arrival_date = validation::parse_date(record.text("transport.arrivalDate"));
        let vessel = record.text("transport.vesselOrFlight").trim();
        let notes = record.text("notes").trim();
        let details = packages::cargo_details(record);
        let sum = packages::totals(&details);
        Ok(CreateShipmentRequest {
            booking_id: record.text("bookingId").to_string(),
            packages: details,
            transport: ShipmentTransport {
                mode: record.text("transport.mode").to_string(),
                carrier: record.text("transport.carrier").trim().to_string(),
                vessel_or_flight: (!vessel.is_empty()).then(|| vessel.to_string()),
                departure_date,
                arrival_date,
            },
            total_packages: sum.packages,
            total_weight: sum.weight,
            total_volume: sum.volume,
            notes: (!notes.is_empty()).then(|| notes.to_string()),
        })
    }
}

/// Package lines to seed from a booking: its cargo details as-is, or a single
/// aggregate line built from the booking totals when it has none.
pub fn booking_packages(booking: &Booking) -> Vec<CargoDetail> {
    if !booking.cargo_details.is_empty() {
        return booking.cargo_details.clone();
    }
    vec![CargoDetail {
        package_type: "mixed".to_string(),
        quantity: booking.total_packages.filter(|n| *n > 0.0).unwrap_or(1.0),
        weight: booking.total_weight.unwrap_or(0.0),
        volume: booking.total_volume,
        description: Some(format!("Consolidated cargo for {}", booking.booking_number)),
        ..Default::default()
    }]
}

/// Copies the booking into the wizard's record (snapshot, not a reference).
pub fn prefill_from_booking(wizard: &mut Wizard<ShipmentSchema>, booking: &Booking) -> Result<(), FormError> {
    wizard.set_field("bookingId", booking.id.as_str())?;
    wizard.set_field("bookingNumber", booking.booking_number.as_str())?;
    wizard.set_field("customerName", booking.customer.name.as_str())?;
    wizard.set_field("originSummary", booking.origin.short())?;
    wizard.set_field("destinationSummary", booking.destination.short())?;
    if let Some(mode) = booking
        .transport_mode
        .as_deref()
        .filter(|m| TRANSPORT_MODES.contains(m))
    {
        wizard.set_field("transport.mode", mode)?;
    }

    let items = booking_packages(booking)
        .iter()
        .map(packages::package_record)
        .collect();
    wizard.replace_items(PACKAGES, items)?;
    debug!(
        "[PHASE: wizard] [STEP: prefill] shipment seeded from booking {} ({} package line(s))",
        booking.booking_number,
        wizard.record().list(PACKAGES).map(|l| l.len()).unwrap_or(0)
    );
    Ok(())
}
