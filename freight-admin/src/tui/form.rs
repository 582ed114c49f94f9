// Wizard hosting for the terminal: one object-safe view over every schema,
// a flattened list of editable slots per step, and the line editor.

use crossterm::event::KeyCode;

use crate::forms::booking::BookingSchema;
use crate::forms::shipment::ShipmentSchema;
use crate::forms::staff::UserSchema;
use crate::forms::warehouse::ReceiveSchema;
use crate::forms::{
    ErrorMap, FieldKind, FieldValue, FormError, FormRecord, StepDefinition, StepOutcome, SubmitError, Wizard,
    WizardSchema,
};
use crate::models::requests::{CreateBookingRequest, CreateShipmentRequest, CreateUserRequest, ReceiveShipmentRequest};

pub(crate) struct TextInput {
    pub(crate) value: String,
    cursor: usize,
    masked: bool,
}

impl TextInput {
    pub(crate) fn new(value: impl Into<String>, masked: bool) -> Self {
        let v = value.into();
        Self {
            cursor: v.chars().count(),
            value: v,
            masked,
        }
    }

    pub(crate) fn display(&self) -> String {
        if self.masked {
            "*".repeat(self.value.chars().count())
        } else {
            self.value.clone()
        }
    }

    pub(crate) fn set(&mut self, value: impl Into<String>) {
        self.value = value.into();
        self.cursor = self.value.chars().count();
    }

    pub(crate) fn insert_str(&mut self, text: &str) {
        for c in text.chars().filter(|c| !c.is_control()) {
            self.insert(c);
        }
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_index)
            .map(|(i, _)| i)
            .unwrap_or(self.value.len())
    }

    fn insert(&mut self, c: char) {
        let at = self.byte_index(self.cursor);
        self.value.insert(at, c);
        self.cursor += 1;
    }

    /// Returns true when the key was consumed.
    pub(crate) fn handle_key(&mut self, code: KeyCode) -> bool {
        let len = self.value.chars().count();
        match code {
            KeyCode::Char(c) => {
                self.insert(c);
                true
            }
            KeyCode::Backspace => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    let at = self.byte_index(self.cursor);
                    self.value.remove(at);
                }
                true
            }
            KeyCode::Delete => {
                if self.cursor < len {
                    let at = self.byte_index(self.cursor);
                    self.value.remove(at);
                }
                true
            }
            KeyCode::Left => {
                self.cursor = self.cursor.saturating_sub(1);
                true
            }
            KeyCode::Right => {
                self.cursor = (self.cursor + 1).min(len);
                true
            }
            KeyCode::Home => {
                self.cursor = 0;
                true
            }
            KeyCode::End => {
                self.cursor = len;
                true
            }
            _ => false,
        }
    }
}

/// Object-safe surface of [`Wizard`] used by the front end.
pub(crate) trait FormView {
    fn title(&self) -> &'static str;
    fn steps(&self) -> &'static [StepDefinition];
    fn active_step(&self) -> usize;
    fn is_last_step(&self) -> bool;
    fn record(&self) -> &FormRecord;
    fn errors(&self) -> &ErrorMap;
    fn set_field(&mut self, path: &str, value: FieldValue) -> Result<(), FormError>;
    fn push_item(&mut self, list: &str) -> Result<usize, FormError>;
    fn remove_item(&mut self, list: &str, index: usize) -> Result<(), FormError>;
    fn advance(&mut self) -> StepOutcome;
    fn retreat(&mut self) -> usize;
}

impl<S: WizardSchema> FormView for Wizard<S> {
    fn title(&self) -> &'static str {
        self.schema().title()
    }

    fn steps(&self) -> &'static [StepDefinition] {
        self.schema().steps()
    }

    fn active_step(&self) -> usize {
        Wizard::active_step(self)
    }

    fn is_last_step(&self) -> bool {
        Wizard::is_last_step(self)
    }

    fn record(&self) -> &FormRecord {
        Wizard::record(self)
    }

    fn errors(&self) -> &ErrorMap {
        Wizard::errors(self)
    }

    fn set_field(&mut self, path: &str, value: FieldValue) -> Result<(), FormError> {
        Wizard::set_field(self, path, value)
    }

    fn push_item(&mut self, list: &str) -> Result<usize, FormError> {
        Wizard::push_item(self, list)
    }

    fn remove_item(&mut self, list: &str, index: usize) -> Result<(), FormError> {
        Wizard::remove_item(self, list, index)
    }

    fn advance(&mut self) -> StepOutcome {
        Wizard::advance(self)
    }

    fn retreat(&mut self) -> usize {
        Wizard::retreat(self)
    }
}

pub(crate) enum ActiveForm {
    Booking(Wizard<BookingSchema>),
    Shipment(Wizard<ShipmentSchema>),
    User(Wizard<UserSchema>),
    Receive(Wizard<ReceiveSchema>),
}

/// Validated payload ready to be sent.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SubmitRequest {
    Booking(CreateBookingRequest),
    Shipment(CreateShipmentRequest),
    User(CreateUserRequest),
    Receive(ReceiveShipmentRequest),
}

impl ActiveForm {
    pub(crate) fn view(&self) -> &dyn FormView {
        match self {
            ActiveForm::Booking(w) => w,
            ActiveForm::Shipment(w) => w,
            ActiveForm::User(w) => w,
            ActiveForm::Receive(w) => w,
        }
    }

    pub(crate) fn view_mut(&mut self) -> &mut dyn FormView {
        match self {
            ActiveForm::Booking(w) => w,
            ActiveForm::Shipment(w) => w,
            ActiveForm::User(w) => w,
            ActiveForm::Receive(w) => w,
        }
    }

    pub(crate) fn submit(&mut self) -> Result<SubmitRequest, SubmitError> {
        Ok(match self {
            ActiveForm::Booking(w) => SubmitRequest::Booking(w.prepare_submit()?),
            ActiveForm::Shipment(w) => SubmitRequest::Shipment(w.prepare_submit()?),
            ActiveForm::User(w) => SubmitRequest::User(w.prepare_submit()?),
            ActiveForm::Receive(w) => SubmitRequest::Receive(w.prepare_submit()?),
        })
    }

    pub(crate) fn reset(&mut self) {
        match self {
            ActiveForm::Booking(w) => w.reset(),
            ActiveForm::Shipment(w) => w.reset(),
            ActiveForm::User(w) => w.reset(),
            ActiveForm::Receive(w) => w.reset(),
        }
    }
}

/// One editable cell of the active step. List fields expand to one slot per
/// item field (`packages.0.weight`).
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Slot {
    pub(crate) path: String,
    pub(crate) label: String,
    pub(crate) kind: FieldKind,
}

impl Slot {
    /// Index of the list item this slot edits, if any.
    pub(crate) fn item(&self) -> Option<(&str, usize)> {
        let mut parts = self.path.splitn(3, '.');
        let list = parts.next()?;
        let index = parts.next()?.parse().ok()?;
        parts.next()?;
        Some((list, index))
    }

    pub(crate) fn uses_editor(&self) -> bool {
        matches!(
            self.kind,
            FieldKind::Text | FieldKind::Secret | FieldKind::Number | FieldKind::Date | FieldKind::Location
        )
    }
}

pub(crate) fn step_slots(step: &StepDefinition, record: &FormRecord) -> Vec<Slot> {
    let mut slots = Vec::new();
    for field in step.fields {
        match field.kind {
            FieldKind::Items(item_fields) => {
                let count = record.list(field.name).map(|l| l.len()).unwrap_or(0);
                for index in 0..count {
                    for item_field in item_fields {
                        slots.push(Slot {
                            path: format!("{}.{}.{}", field.name, index, item_field.name),
                            label: format!("#{} {}", index + 1, item_field.label),
                            kind: item_field.kind,
                        });
                    }
                }
            }
            kind => slots.push(Slot {
                path: field.name.to_string(),
                label: field.label.to_string(),
                kind,
            }),
        }
    }
    slots
}

/// Text shown for a slot when it is not being edited.
pub(crate) fn slot_value(record: &FormRecord, slot: &Slot) -> String {
    let value = record.get_path(&crate::forms::FieldPath::parse(&slot.path));
    match (slot.kind, value) {
        (FieldKind::Toggle, Some(v)) => (if v.as_bool().unwrap_or(false) { "[x]" } else { "[ ]" }).to_string(),
        (FieldKind::Secret, Some(v)) => "*".repeat(v.display().chars().count()),
        (_, Some(v)) => v.display(),
        (_, None) => String::new(),
    }
}

/// Next option of a choice list, wrapping, starting from the current value.
pub(crate) fn cycle_choice(options: &[&'static str], current: &str, forward: bool) -> Option<&'static str> {
    if options.is_empty() {
        return None;
    }
    let next = match options.iter().position(|o| *o == current) {
        None if forward => 0,
        None => options.len() - 1,
        Some(i) if forward => (i + 1) % options.len(),
        Some(i) => (i + options.len() - 1) % options.len(),
    };
    Some(options[next])
}

/// State of the wizard screen: the form, the focused slot and its editor.
pub(crate) struct FormState {
    pub(crate) form: ActiveForm,
    pub(crate) focus: usize,
    pub(crate) editor: TextInput,
}

impl FormState {
    pub(crate) fn new(form: ActiveForm) -> Self {
        let mut state = Self {
            form,
            focus: 0,
            editor: TextInput::new("", false),
        };
        state.load_editor();
        state
    }

    pub(crate) fn slots(&self) -> Vec<Slot> {
        let view = self.form.view();
        step_slots(&view.steps()[view.active_step()], view.record())
    }

    pub(crate) fn focused_slot(&self) -> Option<Slot> {
        self.slots().into_iter().nth(self.focus)
    }

    /// Copies the focused slot's value into the editor.
    pub(crate) fn load_editor(&mut self) {
        let slots = self.slots();
        if slots.is_empty() {
            self.focus = 0;
        } else {
            self.focus = self.focus.min(slots.len() - 1);
        }
        match slots.get(self.focus) {
            Some(slot) => {
                let current = self
                    .form
                    .view()
                    .record()
                    .get_path(&crate::forms::FieldPath::parse(&slot.path))
                    .map(FieldValue::display)
                    .unwrap_or_default();
                self.editor = TextInput::new(current, slot.kind == FieldKind::Secret);
            }
            None => self.editor = TextInput::new("", false),
        }
    }

    /// Writes the editor back into the record when the focused slot is a
    /// text-like field.
    pub(crate) fn commit_editor(&mut self) -> Result<(), FormError> {
        let Some(slot) = self.focused_slot() else {
            return Ok(());
        };
        if !slot.uses_editor() {
            return Ok(());
        }
        let value = FieldValue::Text(self.editor.value.clone());
        self.form.view_mut().set_field(&slot.path, value)
    }

    pub(crate) fn move_focus(&mut self, forward: bool) -> Result<(), FormError> {
        self.commit_editor()?;
        let count = self.slots().len();
        if count > 0 {
            self.focus = if forward {
                (self.focus + 1) % count
            } else {
                (self.focus + count - 1) % count
            };
        }
        self.load_editor();
        Ok(())
    }

    /// Moves focus to the first slot carrying an error, if any.
    pub(crate) fn focus_first_error(&mut self) {
        let slots = self.slots();
        let errors = self.form.view().errors();
        if let Some(index) = slots.iter().position(|s| errors.contains(&s.path)) {
            self.focus = index;
        }
        self.load_editor();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::packages::PACKAGES;

    #[test]
    fn package_step_expands_one_slot_per_item_field() {
        let mut wizard = Wizard::new(BookingSchema).unwrap();
        wizard.push_item(PACKAGES).unwrap();
        let cargo = &wizard.schema().steps()[2];
        let slots = step_slots(cargo, wizard.record());
        assert_eq!(slots.len(), 16);
        assert_eq!(slots[0].path, "packages.0.packageType");
        assert_eq!(slots[8].label, "#2 Type");
        assert_eq!(slots[9].item(), Some(("packages", 1)));
        assert_eq!(step_slots(&wizard.schema().steps()[0], wizard.record())[0].item(), None);
    }

    #[test]
    fn editor_commits_on_focus_change() {
        let mut state = FormState::new(ActiveForm::Booking(Wizard::new(BookingSchema).unwrap()));
        state.editor.insert_str("Acme Freight");
        state.move_focus(true).unwrap();
        assert_eq!(state.form.view().record().text("customerName"), "Acme Freight");
        assert_eq!(state.focused_slot().map(|s| s.path), Some("customerEmail".to_string()));

        state.move_focus(false).unwrap();
        assert_eq!(state.editor.value, "Acme Freight");
    }

    #[test]
    fn text_input_handles_multibyte_characters() {
        let mut input = TextInput::new("Sāo", false);
        input.handle_key(KeyCode::Backspace);
        input.handle_key(KeyCode::Home);
        input.handle_key(KeyCode::Delete);
        assert_eq!(input.value, "ā");
        assert!(!input.handle_key(KeyCode::F(9)));
        assert_eq!(TextInput::new("abc", true).display(), "***");
    }

    #[test]
    fn choices_wrap_in_both_directions() {
        let options = &["air", "sea", "road"];
        assert_eq!(cycle_choice(options, "", true), Some("air"));
        assert_eq!(cycle_choice(options, "", false), Some("road"));
        assert_eq!(cycle_choice(options, "road", true), Some("air"));
        assert_eq!(cycle_choice(options, "air", false), Some("road"));
    }
}
