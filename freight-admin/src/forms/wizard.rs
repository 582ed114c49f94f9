// Step sequencer shared by every multi-step form.
//
// The wizard owns its record exclusively. Next validates only the active
// step; Submit re-validates every step and routes back to the first one that
// fails.

use log::debug;

use super::record::{FieldPath, FieldValue, FormRecord};
use super::{ErrorMap, FormError};

/// Input kind of a field, used by the front end to pick an editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Secret,
    Number,
    Date,
    Toggle,
    Choice(&'static [&'static str]),
    /// Location picker backed by the geocoding service.
    Location,
    /// List field; the slice describes the fields of each item.
    Items(&'static [FieldSpec]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Dotted path from the record root (`transport.mode`).
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub const fn new(name: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self { name, label, kind }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepDefinition {
    pub id: &'static str,
    pub title: &'static str,
    pub fields: &'static [FieldSpec],
}

impl StepDefinition {
    /// True when `path` belongs to one of this step's fields (or sits below one).
    pub fn owns(&self, path: &str) -> bool {
        self.fields.iter().any(|f| {
            path == f.name
                || path
                    .strip_prefix(f.name)
                    .is_some_and(|rest| rest.starts_with('.'))
        })
    }
}

/// Describes one wizard: its record shape, steps, rules and payload.
pub trait WizardSchema {
    type Payload;

    fn title(&self) -> &'static str;

    fn steps(&self) -> &'static [StepDefinition];

    fn blank_record(&self) -> FormRecord;

    /// Pure per-step validation over the current record.
    fn validate_step(&self, step: &StepDefinition, record: &FormRecord) -> ErrorMap;

    /// Coerces a raw value before it is written (e.g. quantity fallback).
    fn normalize(&self, _path: &FieldPath, value: FieldValue) -> FieldValue {
        value
    }

    /// Recomputes derived fields after `changed` was written.
    fn derive(&self, _changed: &FieldPath, _record: &mut FormRecord) {}

    fn build_payload(&self, record: &FormRecord) -> Result<Self::Payload, FormError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    Advanced(usize),
    Blocked(ErrorMap),
    /// Next on the final step does nothing; submission is separate.
    AtLastStep,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SubmitError {
    #[error("step {step} has {} invalid field(s)", .errors.len())]
    Invalid { step: usize, errors: ErrorMap },
    #[error(transparent)]
    Form(#[from] FormError),
}

#[derive(Debug, Clone)]
pub struct Wizard<S: WizardSchema> {
    schema: S,
    record: FormRecord,
    active: usize,
    errors: ErrorMap,
}

impl<S: WizardSchema> Wizard<S> {
    pub fn new(schema: S) -> Result<Self, FormError> {
        let record = schema.blank_record();
        Self::with_record(schema, record)
    }

    /// Starts from a pre-seeded record. Every step field must exist in it.
    pub fn with_record(schema: S, record: FormRecord) -> Result<Self, FormError> {
        for step in schema.steps() {
            for field in step.fields {
                let path = FieldPath::parse(field.name);
                let known = path.root().is_some_and(|root| record.contains(root));
                if !known {
                    return Err(FormError::UnknownStepField {
                        step: step.id,
                        field: field.name.to_string(),
                    });
                }
            }
        }
        Ok(Self {
            schema,
            record,
            active: 0,
            errors: ErrorMap::new(),
        })
    }

    pub fn schema(&self) -> &S {
        &self.schema
    }

    pub fn record(&self) -> &FormRecord {
        &self.record
    }

    pub fn errors(&self) -> &ErrorMap {
        &self.errors
    }

    pub fn active_step(&self) -> usize {
        self.active
    }

    pub fn step(&self) -> &'static StepDefinition {
        &self.schema.steps()[self.active]
    }

    pub fn step_count(&self) -> usize {
        self.schema.steps().len()
    }

    pub fn is_last_step(&self) -> bool {
        self.active + 1 >= self.step_count()
    }

    /// Writes one field. Its errors are cleared and derived fields refreshed.
    pub fn set_field(&mut self, path: &str, value: impl Into<FieldValue>) -> Result<(), FormError> {
        let path = FieldPath::parse(path);
        let value = self.schema.normalize(&path, value.into());
        self.record.set_path(&path, value)?;
        self.errors.clear_path(&path);
        self.schema.derive(&path, &mut self.record);
        Ok(())
    }

    pub fn push_item(&mut self, list: &str) -> Result<usize, FormError> {
        let index = self.record.push_item(list)?;
        self.errors.clear_path(&FieldPath::parse(list));
        Ok(index)
    }

    pub fn remove_item(&mut self, list: &str, index: usize) -> Result<(), FormError> {
        self.record.remove_item(list, index)?;
        // Indices shift, so per-item errors no longer line up.
        self.errors.clear_path(&FieldPath::parse(list));
        Ok(())
    }

    pub(crate) fn replace_items(&mut self, list: &str, items: Vec<FormRecord>) -> Result<(), FormError> {
        self.record.replace_items(list, items)?;
        self.errors.clear_path(&FieldPath::parse(list));
        Ok(())
    }

    /// Validates the active step and moves forward when it is clean.
    pub fn advance(&mut self) -> StepOutcome {
        if self.is_last_step() {
            return StepOutcome::AtLastStep;
        }
        let step = self.step();
        let errors = self.schema.validate_step(step, &self.record);
        if errors.is_empty() {
            self.errors.clear();
            self.active += 1;
            debug!(
                "[PHASE: wizard] [STEP: advance] {} moved to step '{}'",
                self.schema.title(),
                self.step().id
            );
            StepOutcome::Advanced(self.active)
        } else {
            debug!(
                "[PHASE: wizard] [STEP: advance] {} blocked on step '{}' ({} error(s))",
                self.schema.title(),
                step.id,
                errors.len()
            );
            self.errors = errors.clone();
            StepOutcome::Blocked(errors)
        }
    }

    /// Moves back one step without validating.
    pub fn retreat(&mut self) -> usize {
        self.active = self.active.saturating_sub(1);
        self.active
    }

    /// Validates every step. Returns the first failing step, if any, and the
    /// combined error map.
    pub fn validate_all(&self) -> (Option<usize>, ErrorMap) {
        let mut first_failing = None;
        let mut all = ErrorMap::new();
        for (index, step) in self.schema.steps().iter().enumerate() {
            let errors = self.schema.validate_step(step, &self.record);
            if !errors.is_empty() && first_failing.is_none() {
                first_failing = Some(index);
            }
            all.extend(errors);
        }
        (first_failing, all)
    }

    /// Submit gate: recomputes the full error set now rather than trusting
    /// whatever was shown last, and jumps to the first failing step.
    pub fn prepare_submit(&mut self) -> Result<S::Payload, SubmitError> {
        let (first_failing, errors) = self.validate_all();
        if let Some(step) = first_failing {
            debug!(
                "[PHASE: wizard] [STEP: submit] {} rejected; first failing step '{}'",
                self.schema.title(),
                self.schema.steps()[step].id
            );
            self.active = step;
            self.errors = errors.clone();
            return Err(SubmitError::Invalid { step, errors });
        }
        self.errors.clear();
        Ok(self.schema.build_payload(&self.record)?)
    }

    pub fn reset(&mut self) {
        self.record = self.schema.blank_record();
        self.active = 0;
        self.errors.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct TwoStep;

    const NAME_STEP: &[FieldSpec] = &[FieldSpec::new("name", "Name", FieldKind::Text)];
    const CITY_STEP: &[FieldSpec] = &[FieldSpec::new("address.city", "City", FieldKind::Text)];
    const STEPS: &[StepDefinition] = &[
        StepDefinition {
            id: "name",
            title: "Name",
            fields: NAME_STEP,
        },
        StepDefinition {
            id: "address",
            title: "Address",
            fields: CITY_STEP,
        },
    ];

    impl WizardSchema for TwoStep {
        type Payload = String;

        fn title(&self) -> &'static str {
            "Two step"
        }

        fn steps(&self) -> &'static [StepDefinition] {
            STEPS
        }

        fn blank_record(&self) -> FormRecord {
            FormRecord::new()
                .with("name", "")
                .with_record("address", FormRecord::new().with("city", ""))
        }

        fn validate_step(&self, step: &StepDefinition, record: &FormRecord) -> ErrorMap {
            let mut errors = ErrorMap::new();
            for field in step.fields {
                if record.text(field.name).trim().is_empty() {
                    errors.insert(field.name, format!("{} is required", field.label));
                }
            }
            errors
        }

        fn build_payload(&self, record: &FormRecord) -> Result<String, FormError> {
            Ok(format!("{}@{}", record.text("name"), record.text("address.city")))
        }
    }

    #[test]
    fn blocked_step_keeps_index_and_reports_field() {
        let mut wizard = Wizard::new(TwoStep).unwrap();
        match wizard.advance() {
            StepOutcome::Blocked(errors) => assert_eq!(errors.get("name"), Some("Name is required")),
            other => panic!("expected Blocked, got {:?}", other),
        }
        assert_eq!(wizard.active_step(), 0);
    }

    #[test]
    fn valid_step_advances_and_last_step_is_a_no_op() {
        let mut wizard = Wizard::new(TwoStep).unwrap();
        wizard.set_field("name", "Ada").unwrap();
        assert_eq!(wizard.advance(), StepOutcome::Advanced(1));
        assert_eq!(wizard.advance(), StepOutcome::AtLastStep);
        assert_eq!(wizard.active_step(), 1);
    }

    #[test]
    fn retreat_is_unconditional_and_bounded() {
        let mut wizard = Wizard::new(TwoStep).unwrap();
        assert_eq!(wizard.retreat(), 0);
        wizard.set_field("name", "Ada").unwrap();
        wizard.advance();
        assert_eq!(wizard.retreat(), 0);
    }

    #[test]
    fn editing_a_field_clears_its_error() {
        let mut wizard = Wizard::new(TwoStep).unwrap();
        wizard.advance();
        assert!(wizard.errors().contains("name"));
        wizard.set_field("name", "A").unwrap();
        assert!(!wizard.errors().contains("name"));
    }

    #[test]
    fn submit_revalidates_everything_and_routes_to_first_failure() {
        let mut wizard = Wizard::new(TwoStep).unwrap();
        wizard.set_field("name", "Ada").unwrap();
        wizard.advance();
        wizard.set_field("address.city", "Lisbon").unwrap();
        // Break an earlier step after having passed it.
        wizard.set_field("name", "").unwrap();

        match wizard.prepare_submit() {
            Err(SubmitError::Invalid { step, errors }) => {
                assert_eq!(step, 0);
                assert!(errors.contains("name"));
            }
            other => panic!("expected Invalid, got {:?}", other),
        }
        assert_eq!(wizard.active_step(), 0);

        wizard.set_field("name", "Ada").unwrap();
        assert_eq!(wizard.prepare_submit().unwrap(), "Ada@Lisbon");
    }

    #[test]
    fn step_fields_must_exist_in_the_record() {
        let err = Wizard::with_record(TwoStep, FormRecord::new().with("name", "")).unwrap_err();
        assert!(matches!(err, FormError::UnknownStepField { step: "address", .. }));
    }

    #[test]
    fn reset_returns_to_a_blank_first_step() {
        let mut wizard = Wizard::new(TwoStep).unwrap();
        wizard.set_field("name", "Ada").unwrap();
        wizard.advance();
        wizard.reset();
        assert_eq!(wizard.active_step(), 0);
        assert_eq!(wizard.record().text("name"), "");
    }

    #[test]
    fn step_ownership_matches_nested_paths() {
        let step = &STEPS[1];
        assert!(step.owns("address.city"));
        assert!(!step.owns("address.cityline"));
        assert!(!step.owns("name"));
    }
}
