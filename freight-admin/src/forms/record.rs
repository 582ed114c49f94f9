// Form record: ordered field map with fixed keys, nested records and resizable lists.

use indexmap::IndexMap;
use std::fmt;

use super::FormError;

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Bool(bool),
    Record(FormRecord),
    List(ListField),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    fn kind_name(&self) -> &'static str {
        match self {
            FieldValue::Text(_) | FieldValue::Number(_) => "scalar",
            FieldValue::Bool(_) => "boolean",
            FieldValue::Record(_) => "record",
            FieldValue::List(_) => "list",
        }
    }

    /// Text and numbers are interchangeable (input arrives as text and some
    /// fields are coerced to numbers); every other variant keeps its shape.
    fn same_shape(&self, other: &FieldValue) -> bool {
        self.kind_name() == other.kind_name()
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Numeric view; text is parsed after trimming.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) if n.is_finite() => Some(*n),
            FieldValue::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::Number(n) => !n.is_finite(),
            FieldValue::Bool(_) => false,
            FieldValue::Record(r) => r.fields.values().all(FieldValue::is_blank),
            FieldValue::List(l) => l.items.is_empty(),
        }
    }

    /// Display form used by the terminal front end and payload builders.
    pub fn display(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Number(n) => format_number(*n),
            FieldValue::Bool(b) => (if *b { "yes" } else { "no" }).to_string(),
            FieldValue::Record(_) => String::new(),
            FieldValue::List(l) => format!("{} item(s)", l.items.len()),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

/// A list-valued field. Every item has exactly the template's field set.
#[derive(Debug, Clone, PartialEq)]
pub struct ListField {
    template: FormRecord,
    items: Vec<FormRecord>,
}

impl ListField {
    pub fn new(template: FormRecord) -> Self {
        Self {
            template,
            items: Vec::new(),
        }
    }

    pub fn template(&self) -> &FormRecord {
        &self.template
    }

    pub fn items(&self) -> &[FormRecord] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&FormRecord> {
        self.items.get(index)
    }

    fn push_blank(&mut self) -> usize {
        self.items.push(self.template.clone());
        self.items.len() - 1
    }

    /// Replaces all items. Items are rebuilt from the template so stray keys
    /// are dropped and missing keys keep the template default.
    fn replace(&mut self, items: Vec<FormRecord>) -> Result<(), FormError> {
        let mut rebuilt = Vec::with_capacity(items.len());
        for item in items {
            let mut blank = self.template.clone();
            for (name, value) in item.fields {
                if blank.contains(&name) {
                    blank.set(&name, value)?;
                }
            }
            rebuilt.push(blank);
        }
        self.items = rebuilt;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Field(String),
    Index(usize),
}

/// Dotted path into a record, e.g. `packages.0.weight` or `transport.mode`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    segments: Vec<PathSegment>,
}

impl FieldPath {
    pub fn parse(path: &str) -> Self {
        let segments = path
            .split('.')
            .map(|part| match part.parse::<usize>() {
                Ok(index) => PathSegment::Index(index),
                Err(_) => PathSegment::Field(part.to_string()),
            })
            .collect();
        Self { segments }
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// The top-level field this path lives under.
    pub fn root(&self) -> Option<&str> {
        match self.segments.first() {
            Some(PathSegment::Field(name)) => Some(name.as_str()),
            _ => None,
        }
    }

    /// The innermost field name (`weight` for `packages.0.weight`).
    pub fn leaf(&self) -> Option<&str> {
        match self.segments.last() {
            Some(PathSegment::Field(name)) => Some(name.as_str()),
            _ => None,
        }
    }

    /// `(list, index, field)` when the path addresses a field of a list item.
    pub fn list_item(&self) -> Option<(&str, usize, &str)> {
        match self.segments.as_slice() {
            [PathSegment::Field(list), PathSegment::Index(i), PathSegment::Field(field)] => {
                Some((list.as_str(), *i, field.as_str()))
            }
            _ => None,
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            match seg {
                PathSegment::Field(name) => f.write_str(name)?,
                PathSegment::Index(index) => write!(f, "{}", index)?,
            }
        }
        Ok(())
    }
}

/// Ordered mapping of field name → value. Keys are fixed once the record is
/// built; only list fields grow or shrink.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormRecord {
    fields: IndexMap<String, FieldValue>,
}

impl FormRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder used when declaring a blank record.
    pub fn with(mut self, name: &str, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    pub fn with_list(self, name: &str, template: FormRecord) -> Self {
        self.with(name, FieldValue::List(ListField::new(template)))
    }

    pub fn with_record(self, name: &str, record: FormRecord) -> Self {
        self.with(name, FieldValue::Record(record))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Overwrites an existing top-level field.
    pub fn set(&mut self, name: &str, value: FieldValue) -> Result<(), FormError> {
        let slot = self
            .fields
            .get_mut(name)
            .ok_or_else(|| FormError::UnknownField(name.to_string()))?;
        if !slot.same_shape(&value) {
            return Err(FormError::TypeMismatch {
                path: name.to_string(),
                expected: slot.kind_name(),
            });
        }
        *slot = value;
        Ok(())
    }

    pub fn get_path(&self, path: &FieldPath) -> Option<&FieldValue> {
        lookup(self, path.segments())
    }

    pub fn set_path(&mut self, path: &FieldPath, value: FieldValue) -> Result<(), FormError> {
        assign(self, path.segments(), value, path)
    }

    /// Text at `path`, or "" when missing / not text.
    pub fn text(&self, path: &str) -> &str {
        self.get_path(&FieldPath::parse(path))
            .and_then(FieldValue::as_text)
            .unwrap_or("")
    }

    pub fn number(&self, path: &str) -> Option<f64> {
        self.get_path(&FieldPath::parse(path))
            .and_then(FieldValue::as_number)
    }

    pub fn flag(&self, path: &str) -> bool {
        self.get_path(&FieldPath::parse(path))
            .and_then(FieldValue::as_bool)
            .unwrap_or(false)
    }

    pub fn list(&self, name: &str) -> Option<&ListField> {
        match self.fields.get(name) {
            Some(FieldValue::List(list)) => Some(list),
            _ => None,
        }
    }

    fn list_mut(&mut self, name: &str) -> Result<&mut ListField, FormError> {
        match self.fields.get_mut(name) {
            Some(FieldValue::List(list)) => Ok(list),
            Some(_) => Err(FormError::NotAList(name.to_string())),
            None => Err(FormError::UnknownField(name.to_string())),
        }
    }

    pub fn push_item(&mut self, list: &str) -> Result<usize, FormError> {
        Ok(self.list_mut(list)?.push_blank())
    }

    pub fn remove_item(&mut self, list: &str, index: usize) -> Result<FormRecord, FormError> {
        let field = self.list_mut(list)?;
        if index >= field.items.len() {
            return Err(FormError::IndexOutOfRange {
                field: list.to_string(),
                index,
            });
        }
        Ok(field.items.remove(index))
    }

    pub fn replace_items(&mut self, list: &str, items: Vec<FormRecord>) -> Result<(), FormError> {
        self.list_mut(list)?.replace(items)
    }

    pub fn item_mut(&mut self, list: &str, index: usize) -> Result<&mut FormRecord, FormError> {
        let field = self.list_mut(list)?;
        field
            .items
            .get_mut(index)
            .ok_or_else(|| FormError::IndexOutOfRange {
                field: list.to_string(),
                index,
            })
    }
}

fn lookup<'a>(record: &'a FormRecord, segments: &[PathSegment]) -> Option<&'a FieldValue> {
    let (PathSegment::Field(name), rest) = segments.split_first()? else {
        return None;
    };
    let value = record.fields.get(name)?;
    match rest {
        [] => Some(value),
        [PathSegment::Index(index), tail @ ..] => match value {
            FieldValue::List(list) if !tail.is_empty() => lookup(list.items.get(*index)?, tail),
            _ => None,
        },
        [PathSegment::Field(_), ..] => match value {
            FieldValue::Record(inner) => lookup(inner, rest),
            _ => None,
        },
    }
}

fn assign(
    record: &mut FormRecord,
    segments: &[PathSegment],
    value: FieldValue,
    full: &FieldPath,
) -> Result<(), FormError> {
    let unknown = || FormError::UnknownField(full.to_string());
    let Some((PathSegment::Field(name), rest)) = segments.split_first() else {
        return Err(unknown());
    };
    if rest.is_empty() {
        return record.set(name, value).map_err(|e| match e {
            FormError::TypeMismatch { expected, .. } => FormError::TypeMismatch {
                path: full.to_string(),
                expected,
            },
            _ => unknown(),
        });
    }
    let slot = record.fields.get_mut(name).ok_or_else(unknown)?;
    match (slot, rest) {
        (FieldValue::List(list), [PathSegment::Index(index), tail @ ..]) if !tail.is_empty() => {
            let item = list
                .items
                .get_mut(*index)
                .ok_or_else(|| FormError::IndexOutOfRange {
                    field: name.clone(),
                    index: *index,
                })?;
            assign(item, tail, value, full)
        }
        (FieldValue::Record(inner), [PathSegment::Field(_), ..]) => assign(inner, rest, value, full),
        _ => Err(unknown()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FormRecord {
        FormRecord::new()
            .with("name", "")
            .with_record("transport", FormRecord::new().with("mode", "sea"))
            .with_list(
                "packages",
                FormRecord::new().with("weight", 0.0).with("packageType", ""),
            )
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let mut record = sample();
        let err = record.set("nickname", "x".into()).unwrap_err();
        assert_eq!(err, FormError::UnknownField("nickname".to_string()));
        assert!(record.set_path(&FieldPath::parse("transport.vessel"), "x".into()).is_err());
    }

    #[test]
    fn nested_and_list_paths_round_trip() {
        let mut record = sample();
        record
            .set_path(&FieldPath::parse("transport.mode"), "air".into())
            .unwrap();
        assert_eq!(record.text("transport.mode"), "air");

        let idx = record.push_item("packages").unwrap();
        assert_eq!(idx, 0);
        record
            .set_path(&FieldPath::parse("packages.0.weight"), FieldValue::Number(12.5))
            .unwrap();
        assert_eq!(record.number("packages.0.weight"), Some(12.5));
    }

    #[test]
    fn writing_past_the_end_of_a_list_fails() {
        let mut record = sample();
        let err = record
            .set_path(&FieldPath::parse("packages.3.weight"), FieldValue::Number(1.0))
            .unwrap_err();
        assert_eq!(
            err,
            FormError::IndexOutOfRange {
                field: "packages".to_string(),
                index: 3
            }
        );
    }

    #[test]
    fn shape_changes_are_type_errors() {
        let mut record = sample();
        let err = record.set("packages", "oops".into()).unwrap_err();
        assert!(matches!(err, FormError::TypeMismatch { .. }));
        // Text and numbers share a slot.
        record.set("name", FieldValue::Number(3.0)).unwrap();
    }

    #[test]
    fn replaced_items_follow_the_template() {
        let mut record = sample();
        let stray = FormRecord::new().with("weight", 4.0);
        record.replace_items("packages", vec![stray]).unwrap();
        let list = record.list("packages").unwrap();
        assert_eq!(list.len(), 1);
        assert!(list.get(0).unwrap().contains("packageType"));
    }

    #[test]
    fn path_helpers() {
        let path = FieldPath::parse("packages.2.volume");
        assert_eq!(path.root(), Some("packages"));
        assert_eq!(path.leaf(), Some("volume"));
        assert_eq!(path.list_item(), Some(("packages", 2, "volume")));
        assert_eq!(path.to_string(), "packages.2.volume");
    }
}
