// Package (cargo line) list shared by the booking and shipment wizards.
//
// Quantity and weight are coerced on write. Volume is derived from the three
// dimensions, in cubic metres, and only recomputed when a dimension changes.

use super::record::{FieldPath, FieldValue, FormRecord};
use super::wizard::{FieldKind, FieldSpec};
use super::ErrorMap;
use crate::models::responses::CargoDetail;

pub const PACKAGES: &str = "packages";

pub const PACKAGE_TYPES: &[&str] = &["box", "pallet", "crate", "drum", "bag", "container", "other"];

pub const PACKAGE_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("packageType", "Type", FieldKind::Choice(PACKAGE_TYPES)),
    FieldSpec::new("quantity", "Quantity", FieldKind::Number),
    FieldSpec::new("weight", "Weight (kg)", FieldKind::Number),
    FieldSpec::new("length", "Length (cm)", FieldKind::Number),
    FieldSpec::new("width", "Width (cm)", FieldKind::Number),
    FieldSpec::new("height", "Height (cm)", FieldKind::Number),
    FieldSpec::new("volume", "Volume (m3)", FieldKind::Number),
    FieldSpec::new("description", "Description", FieldKind::Text),
];

const DIMENSIONS: [&str; 3] = ["length", "width", "height"];

/// Blank package line.
pub fn package_template() -> FormRecord {
    FormRecord::new()
        .with("packageType", "")
        .with("quantity", 1.0)
        .with("weight", 0.0)
        .with("length", "")
        .with("width", "")
        .with("height", "")
        .with("volume", 0.0)
        .with("description", "")
}

/// Whole units; zero or unparseable input falls back to 1. Negative counts
/// are kept so validation can flag them.
pub fn coerce_quantity(value: &FieldValue) -> f64 {
    match value.as_number().map(f64::trunc) {
        Some(n) if n != 0.0 => n,
        _ => 1.0,
    }
}

pub fn coerce_weight(value: &FieldValue) -> f64 {
    value.as_number().unwrap_or(0.0)
}

/// Cubic metres from centimetre dimensions, when all three are positive.
pub fn volume_m3(length: f64, width: f64, height: f64) -> Option<f64> {
    if length > 0.0 && width > 0.0 && height > 0.0 {
        Some(length * width * height / 1_000_000.0)
    } else {
        None
    }
}

fn package_field(path: &FieldPath) -> Option<(usize, &str)> {
    path.list_item()
        .filter(|(list, _, _)| *list == PACKAGES)
        .map(|(_, index, field)| (index, field))
}

/// Coercion hook for `packages.N.quantity` / `packages.N.weight`.
pub fn normalize(path: &FieldPath, value: FieldValue) -> FieldValue {
    match package_field(path) {
        Some((_, "quantity")) => FieldValue::Number(coerce_quantity(&value)),
        Some((_, "weight")) => FieldValue::Number(coerce_weight(&value)),
        _ => value,
    }
}

/// Derivation hook: refreshes `packages.N.volume` after a dimension edit.
pub fn derive(path: &FieldPath, record: &mut FormRecord) {
    let Some((index, field)) = package_field(path) else {
        return;
    };
    if !DIMENSIONS.contains(&field) {
        return;
    }
    let Ok(item) = record.item_mut(PACKAGES, index) else {
        return;
    };
    let dims: Vec<Option<f64>> = DIMENSIONS
        .iter()
        .map(|d| item.get(d).and_then(FieldValue::as_number))
        .collect();
    if let [Some(l), Some(w), Some(h)] = dims[..] {
        if let Some(volume) = volume_m3(l, w, h) {
            let _ = item.set("volume", FieldValue::Number(volume));
        }
    }
}

/// Per-line checks, reported at `packages.N.field`.
pub fn validate(record: &FormRecord, errors: &mut ErrorMap) {
    let items = record.list(PACKAGES).map(|l| l.items()).unwrap_or(&[]);
    if items.is_empty() {
        errors.insert(PACKAGES, "Add at least one package");
        return;
    }
    for (i, item) in items.iter().enumerate() {
        let blank_type = item
            .get("packageType")
            .map(FieldValue::is_blank)
            .unwrap_or(true);
        if blank_type {
            errors.insert(format!("{}.{}.packageType", PACKAGES, i), "Package type is required");
        }
        let quantity = item.get("quantity").and_then(FieldValue::as_number).unwrap_or(0.0);
        if quantity <= 0.0 {
            errors.insert(
                format!("{}.{}.quantity", PACKAGES, i),
                "Quantity must be greater than zero",
            );
        }
        let weight = item.get("weight").and_then(FieldValue::as_number).unwrap_or(0.0);
        if weight <= 0.0 {
            errors.insert(
                format!("{}.{}.weight", PACKAGES, i),
                "Weight must be greater than zero",
            );
        }
    }
}

fn positive(item: &FormRecord, name: &str) -> Option<f64> {
    item.get(name)
        .and_then(FieldValue::as_number)
        .filter(|n| *n > 0.0)
}

/// Package lines as wire DTOs.
pub fn cargo_details(record: &FormRecord) -> Vec<CargoDetail> {
    let items = record.list(PACKAGES).map(|l| l.items()).unwrap_or(&[]);
    items
        .iter()
        .map(|item| {
            let description = item
                .get("description")
                .and_then(FieldValue::as_text)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string);
            CargoDetail {
                package_type: item
                    .get("packageType")
                    .map(FieldValue::display)
                    .unwrap_or_default()
                    .trim()
                    .to_string(),
                quantity: item.get("quantity").map(coerce_quantity).unwrap_or(1.0),
                weight: item.get("weight").map(coerce_weight).unwrap_or(0.0),
                length: positive(item, "length"),
                width: positive(item, "width"),
                height: positive(item, "height"),
                volume: positive(item, "volume"),
                description,
            }
        })
        .collect()
}

/// Inverse of [`cargo_details`], used when a record is seeded from a booking.
pub fn package_record(detail: &CargoDetail) -> FormRecord {
    let dim = |v: Option<f64>| v.map(FieldValue::Number).unwrap_or_else(|| "".into());
    FormRecord::new()
        .with("packageType", detail.package_type.as_str())
        .with("quantity", detail.quantity)
        .with("weight", detail.weight)
        .with("length", dim(detail.length))
        .with("width", dim(detail.width))
        .with("height", dim(detail.height))
        .with("volume", detail.volume.unwrap_or(0.0))
        .with("description", detail.description.clone().unwrap_or_default())
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CargoTotals {
    pub packages: f64,
    pub weight: f64,
    pub volume: f64,
}

pub fn totals(details: &[CargoDetail]) -> CargoTotals {
    details.iter().fold(CargoTotals::default(), |acc, d| CargoTotals {
        packages: acc.packages + d.quantity,
        weight: acc.weight + d.weight,
        volume: acc.volume + d.volume.unwrap_or(0.0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_with_one_package() -> FormRecord {
        let mut record = FormRecord::new().with_list(PACKAGES, package_template());
        record.push_item(PACKAGES).unwrap();
        record
    }

    fn write(record: &mut FormRecord, path: &str, value: FieldValue) {
        let path = FieldPath::parse(path);
        let value = normalize(&path, value);
        record.set_path(&path, value).unwrap();
        derive(&path, record);
    }

    #[test]
    fn quantity_falls_back_to_one() {
        assert_eq!(coerce_quantity(&"abc".into()), 1.0);
        assert_eq!(coerce_quantity(&"0".into()), 1.0);
        assert_eq!(coerce_quantity(&"".into()), 1.0);
        assert_eq!(coerce_quantity(&"3.8".into()), 3.0);
        assert_eq!(coerce_quantity(&"-2".into()), -2.0);
    }

    #[test]
    fn weight_falls_back_to_zero() {
        assert_eq!(coerce_weight(&"12.5".into()), 12.5);
        assert_eq!(coerce_weight(&"heavy".into()), 0.0);
    }

    #[test]
    fn volume_is_derived_from_dimensions() {
        let mut record = record_with_one_package();
        write(&mut record, "packages.0.length", "10".into());
        write(&mut record, "packages.0.width", "20".into());
        assert_eq!(record.number("packages.0.volume"), Some(0.0));
        write(&mut record, "packages.0.height", "5".into());
        assert_eq!(record.number("packages.0.volume"), Some(0.001));
    }

    #[test]
    fn description_edit_keeps_volume() {
        let mut record = record_with_one_package();
        write(&mut record, "packages.0.length", "10".into());
        write(&mut record, "packages.0.width", "20".into());
        write(&mut record, "packages.0.height", "5".into());
        write(&mut record, "packages.0.description", "Spare parts".into());
        assert_eq!(record.number("packages.0.volume"), Some(0.001));
    }

    #[test]
    fn clearing_a_dimension_keeps_the_prior_volume() {
        let mut record = record_with_one_package();
        write(&mut record, "packages.0.length", "100".into());
        write(&mut record, "packages.0.width", "100".into());
        write(&mut record, "packages.0.height", "100".into());
        write(&mut record, "packages.0.height", "".into());
        assert_eq!(record.number("packages.0.volume"), Some(1.0));
    }

    #[test]
    fn validation_reports_per_index_paths() {
        let mut record = record_with_one_package();
        record.push_item(PACKAGES).unwrap();
        write(&mut record, "packages.0.packageType", "box".into());
        write(&mut record, "packages.0.weight", "4".into());
        write(&mut record, "packages.1.quantity", "-1".into());

        let mut errors = ErrorMap::new();
        validate(&record, &mut errors);
        assert!(!errors.contains("packages.0.packageType"));
        assert!(!errors.contains("packages.0.weight"));
        assert_eq!(errors.get("packages.1.packageType"), Some("Package type is required"));
        assert_eq!(
            errors.get("packages.1.quantity"),
            Some("Quantity must be greater than zero")
        );
        assert_eq!(
            errors.get("packages.1.weight"),
            Some("Weight must be greater than zero")
        );
    }

    #[test]
    fn empty_list_is_an_error() {
        let record = FormRecord::new().with_list(PACKAGES, package_template());
        let mut errors = ErrorMap::new();
        validate(&record, &mut errors);
        assert_eq!(errors.get(PACKAGES), Some("Add at least one package"));
    }

    #[test]
    fn details_and_totals() {
        let mut record = record_with_one_package();
        record.push_item(PACKAGES).unwrap();
        write(&mut record, "packages.0.packageType", "pallet".into());
        write(&mut record, "packages.0.quantity", "2".into());
        write(&mut record, "packages.0.weight", "150".into());
        write(&mut record, "packages.1.packageType", "box".into());
        write(&mut record, "packages.1.weight", "5".into());

        let details = cargo_details(&record);
        assert_eq!(details.len(), 2);
        assert_eq!(details[0].package_type, "pallet");
        assert_eq!(details[0].length, None);
        assert_eq!(details[1].description, None);

        let sum = totals(&details);
        assert_eq!(sum.packages, 3.0);
        assert_eq!(sum.weight, 155.0);
        assert_eq!(sum.volume, 0.0);
    }
}
