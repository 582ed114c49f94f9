// Warehouse receiving: identify the shipment, then record what arrived.

use super::record::FormRecord;
use super::wizard::{FieldKind, FieldSpec, StepDefinition, WizardSchema};
use super::{ErrorMap, FormError};
use crate::models::requests::ReceiveShipmentRequest;
use crate::utils::validation;

pub const CONDITIONS: &[&str] = &["good", "damaged", "partial"];

const SHIPMENT_FIELDS: &[FieldSpec] = &[FieldSpec::new("trackingNumber", "Tracking number", FieldKind::Text)];

const INSPECTION_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("receivedPackages", "Packages received", FieldKind::Number),
    FieldSpec::new("condition", "Condition", FieldKind::Choice(CONDITIONS)),
    FieldSpec::new("damageNotes", "Damage / shortage notes", FieldKind::Text),
    FieldSpec::new("storageLocation", "Storage location (optional)", FieldKind::Text),
];

const STEPS: &[StepDefinition] = &[
    StepDefinition {
        id: "shipment",
        title: "Shipment",
        fields: SHIPMENT_FIELDS,
    },
    StepDefinition {
        id: "inspection",
        title: "Inspection",
        fields: INSPECTION_FIELDS,
    },
];

#[derive(Debug, Clone, Copy, Default)]
pub struct ReceiveSchema;

fn received_count(record: &FormRecord) -> Option<u32> {
    record
        .number("receivedPackages")
        .filter(|n| *n > 0.0 && n.fract() == 0.0 && *n <= f64::from(u32::MAX))
        .map(|n| n as u32)
}

impl WizardSchema for ReceiveSchema {
    type Payload = ReceiveShipmentRequest;

    fn title(&self) -> &'static str {
        "Receive shipment"
    }

    fn steps(&self) -> &'static [StepDefinition] {
        STEPS
    }

    fn blank_record(&self) -> FormRecord {
        FormRecord::new()
            .with("trackingNumber", "")
            .with("receivedPackages", "")
            .with("condition", "good")
            .with("damageNotes", "")
            .with("storageLocation", "")
    }

    fn validate_step(&self, step: &StepDefinition, record: &FormRecord) -> ErrorMap {
        let mut errors = ErrorMap::new();
        match step.id {
            "shipment" => {
                validation::require(
                    &mut errors,
                    "trackingNumber",
                    record.text("trackingNumber"),
                    "Tracking number",
                );
            }
            "inspection" => {
                if received_count(record).is_none() {
                    errors.insert("receivedPackages", "Enter the number of packages received");
                }
                let condition = record.text("condition");
                if !CONDITIONS.contains(&condition) {
                    errors.insert("condition", "Select the cargo condition");
                } else if condition != "good" && record.text("damageNotes").trim().is_empty() {
                    errors.insert("damageNotes", "Describe the damage or shortage");
                }
            }
            _ => {}
        }
        errors
    }

    fn build_payload(&self, record: &FormRecord) -> Result<ReceiveShipmentRequest, FormError> {
        let received_packages = received_count(record)
            .ok_or_else(|| FormError::Payload("received package count is invalid".to_string()))?;
        let optional = |path: &str| {
            let value = record.text(path).trim();
            (!value.is_empty()).then(|| value.to_string())
        };
        Ok(ReceiveShipmentRequest {
            tracking_number: record.text("trackingNumber").trim().to_uppercase(),
            received_packages,
            condition: record.text("condition").to_string(),
            damage_notes: optional("damageNotes"),
            storage_location: optional("storageLocation"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::{StepOutcome, Wizard};

    fn at_inspection() -> Wizard<ReceiveSchema> {
        let mut wizard = Wizard::new(ReceiveSchema).unwrap();
        wizard.set_field("trackingNumber", " trk-20261019-7 ").unwrap();
        assert_eq!(wizard.advance(), StepOutcome::Advanced(1));
        wizard
    }

    #[test]
    fn damaged_cargo_needs_notes() {
        let mut wizard = at_inspection();
        wizard.set_field("receivedPackages", "3").unwrap();
        wizard.set_field("condition", "damaged").unwrap();
        let (failing, errors) = wizard.validate_all();
        assert_eq!(failing, Some(1));
        assert_eq!(errors.get("damageNotes"), Some("Describe the damage or shortage"));

        wizard.set_field("damageNotes", "Two cartons crushed").unwrap();
        let request = wizard.prepare_submit().unwrap();
        assert_eq!(request.tracking_number, "TRK-20261019-7");
        assert_eq!(request.received_packages, 3);
        assert_eq!(request.storage_location, None);
    }

    #[test]
    fn package_count_must_be_a_positive_whole_number() {
        let mut wizard = at_inspection();
        for bad in ["", "0", "-4", "2.5", "many"] {
            wizard.set_field("receivedPackages", bad).unwrap();
            let (failing, errors) = wizard.validate_all();
            assert_eq!(failing, Some(1), "{:?}", bad);
            assert!(errors.contains("receivedPackages"));
        }
    }
}
