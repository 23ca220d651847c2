//! Draft editing and schema validation for create/edit forms.
//!
//! Raw input is coerced on [`FormController::set_field`] according to the
//! field's declared kind. Validation never fails with an error: problems are
//! returned as a list of [`FieldError`] values, one per offending field.

use std::{collections::BTreeMap, fmt};

use chrono::{DateTime, NaiveDate};
use shared::domain::RecordId;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
    Date,
    /// Opaque payload such as an image data URI.
    Blob,
    OptionalText,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Text | Self::OptionalText => "text",
            Self::Integer => "integer",
            Self::Date => "date",
            Self::Blob => "blob",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Date(NaiveDate),
    /// Input that could not be coerced to the field's kind.
    Invalid(String),
}

#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub default: Option<FieldValue>,
}

impl FieldSpec {
    pub fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: true,
            default: None,
        }
    }

    pub fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
            default: None,
        }
    }

    pub fn with_default(mut self, value: FieldValue) -> Self {
        self.default = Some(value);
        self
    }

    fn coerce(&self, raw: &str) -> Option<FieldValue> {
        let trimmed = raw.trim();
        match self.kind {
            FieldKind::Text => Some(FieldValue::Text(raw.to_string())),
            FieldKind::OptionalText | FieldKind::Blob => {
                (!trimmed.is_empty()).then(|| FieldValue::Text(raw.to_string()))
            }
            FieldKind::Integer => {
                if trimmed.is_empty() {
                    return None;
                }
                Some(
                    trimmed
                        .parse::<i64>()
                        .map(FieldValue::Integer)
                        .unwrap_or_else(|_| FieldValue::Invalid(raw.to_string())),
                )
            }
            FieldKind::Date => {
                if trimmed.is_empty() {
                    return None;
                }
                Some(
                    parse_date(trimmed)
                        .map(FieldValue::Date)
                        .unwrap_or_else(|| FieldValue::Invalid(raw.to_string())),
                )
            }
        }
    }

    fn check(&self, value: Option<&FieldValue>) -> Option<FieldErrorReason> {
        let Some(value) = value else {
            return self.required.then_some(FieldErrorReason::Required);
        };
        match (self.kind, value) {
            (FieldKind::Text, FieldValue::Text(text)) if self.required && text.trim().is_empty() => {
                Some(FieldErrorReason::Required)
            }
            (FieldKind::Text | FieldKind::OptionalText | FieldKind::Blob, FieldValue::Text(_))
            | (FieldKind::Integer, FieldValue::Integer(_))
            | (FieldKind::Date, FieldValue::Date(_)) => None,
            (kind, FieldValue::Invalid(raw)) => Some(FieldErrorReason::Expected {
                kind,
                raw: raw.clone(),
            }),
            (kind, other) => Some(FieldErrorReason::Expected {
                kind,
                raw: format!("{other:?}"),
            }),
        }
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|at| at.date_naive()))
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldErrorReason {
    #[error("is required")]
    Required,
    #[error("expected {kind}, got {raw:?}")]
    Expected { kind: FieldKind, raw: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field} {reason}")]
pub struct FieldError {
    pub field: &'static str,
    pub reason: FieldErrorReason,
}

#[derive(Debug, Error)]
pub enum FormError {
    #[error("unknown form field {0:?}")]
    UnknownField(String),
}

/// Typed record that a form can be loaded from and validated into.
pub trait FormRecord: Sized {
    fn schema() -> Vec<FieldSpec>;
    fn identifier(&self) -> Option<&RecordId>;
    fn to_fields(&self) -> Vec<(&'static str, FieldValue)>;
    fn from_fields(id: Option<RecordId>, fields: &ValidFields) -> Result<Self, FieldError>;
}

/// Draft values that passed the schema check.
pub struct ValidFields<'a> {
    values: &'a BTreeMap<&'static str, FieldValue>,
}

impl ValidFields<'_> {
    fn get(&self, name: &'static str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    fn missing(name: &'static str) -> FieldError {
        FieldError {
            field: name,
            reason: FieldErrorReason::Required,
        }
    }

    pub fn text(&self, name: &'static str) -> Result<String, FieldError> {
        self.optional_text(name).ok_or_else(|| Self::missing(name))
    }

    pub fn optional_text(&self, name: &'static str) -> Option<String> {
        match self.get(name) {
            Some(FieldValue::Text(text)) => Some(text.clone()),
            _ => None,
        }
    }

    pub fn integer(&self, name: &'static str) -> Result<i64, FieldError> {
        match self.get(name) {
            Some(FieldValue::Integer(value)) => Ok(*value),
            _ => Err(Self::missing(name)),
        }
    }

    pub fn date(&self, name: &'static str) -> Result<NaiveDate, FieldError> {
        match self.get(name) {
            Some(FieldValue::Date(date)) => Ok(*date),
            _ => Err(Self::missing(name)),
        }
    }
}

pub struct FormController<R: FormRecord> {
    schema: Vec<FieldSpec>,
    id: Option<RecordId>,
    values: BTreeMap<&'static str, FieldValue>,
    _record: std::marker::PhantomData<fn() -> R>,
}

impl<R: FormRecord> Default for FormController<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: FormRecord> FormController<R> {
    pub fn new() -> Self {
        let mut form = Self {
            schema: R::schema(),
            id: None,
            values: BTreeMap::new(),
            _record: std::marker::PhantomData,
        };
        form.reset();
        form
    }

    pub fn schema(&self) -> &[FieldSpec] {
        &self.schema
    }

    /// Persisted identifier of the record being edited; `None` while
    /// creating.
    pub fn identifier(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }

    pub fn set_identifier(&mut self, id: Option<RecordId>) {
        self.id = id;
    }

    pub fn value(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    /// Seeds the draft from a persisted record. `None` leaves the draft as it
    /// is.
    pub fn load(&mut self, record: Option<&R>) {
        let Some(record) = record else {
            debug!("form load skipped: no record");
            return;
        };
        self.reset();
        self.id = record.identifier().cloned();
        for (name, value) in record.to_fields() {
            if self.spec(name).is_some() {
                self.values.insert(name, value);
            }
        }
    }

    /// Back to schema defaults, without identifier.
    pub fn reset(&mut self) {
        self.id = None;
        self.values = self
            .schema
            .iter()
            .filter_map(|spec| spec.default.clone().map(|value| (spec.name, value)))
            .collect();
    }

    pub fn set_field(&mut self, name: &str, raw: &str) -> Result<(), FormError> {
        let spec = self
            .spec(name)
            .ok_or_else(|| FormError::UnknownField(name.to_string()))?;
        let key = spec.name;
        match spec.coerce(raw) {
            Some(value) => {
                self.values.insert(key, value);
            }
            None => {
                self.values.remove(key);
            }
        }
        Ok(())
    }

    pub fn clear_field(&mut self, name: &str) -> Result<(), FormError> {
        let spec = self
            .spec(name)
            .ok_or_else(|| FormError::UnknownField(name.to_string()))?;
        let key = spec.name;
        self.values.remove(key);
        Ok(())
    }

    pub fn validate(&self) -> Result<R, Vec<FieldError>> {
        let errors: Vec<FieldError> = self
            .schema
            .iter()
            .filter_map(|spec| {
                spec.check(self.values.get(spec.name))
                    .map(|reason| FieldError {
                        field: spec.name,
                        reason,
                    })
            })
            .collect();
        if !errors.is_empty() {
            return Err(errors);
        }

        let fields = ValidFields {
            values: &self.values,
        };
        R::from_fields(self.id.clone(), &fields).map_err(|err| vec![err])
    }

    fn spec(&self, name: &str) -> Option<&FieldSpec> {
        self.schema.iter().find(|spec| spec.name == name)
    }
}

#[cfg(test)]
#[path = "tests/form_tests.rs"]
mod tests;
