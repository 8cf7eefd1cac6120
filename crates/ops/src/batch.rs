//! Wire model: an operation batch is a JSON object mapping kind names to
//! arrays of descriptors. Kind order and entry order are both significant and
//! survive decoding (`serde_json` is built with `preserve_order`).

use crate::error::{BatchDecodeError, OperationError};
use crate::kind::OperationKind;
use html::NodeId;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Per-operation record. Well-known routing fields are typed; every other
/// field stays in `fields` untouched so a descriptor re-serializes as it came.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xpath: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select_all: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focus_selector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancel: Option<bool>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    /// Resolved target, set only while this descriptor is being processed.
    #[serde(skip)]
    pub element: Option<NodeId>,
    /// Parsed fragment for merge kinds, set only during processing.
    #[serde(skip)]
    pub content: Option<NodeId>,
}

impl Descriptor {
    /// The selector, treating an empty string like an absent one.
    pub fn selector(&self) -> Option<&str> {
        self.selector.as_deref().filter(|s| !s.is_empty())
    }

    pub fn is_xpath(&self) -> bool {
        self.xpath.unwrap_or(false)
    }

    pub fn is_select_all(&self) -> bool {
        self.select_all.unwrap_or(false)
    }

    pub fn is_canceled(&self) -> bool {
        self.cancel.unwrap_or(false)
    }

    pub fn set_cancel(&mut self, cancel: bool) {
        self.cancel = Some(cancel);
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name).filter(|v| !v.is_null())
    }

    /// A scalar field as text. Numbers and booleans are stringified.
    pub fn text(&self, name: &str) -> Option<String> {
        match self.field(name)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub(crate) fn require_text(
        &self,
        kind: OperationKind,
        name: &'static str,
    ) -> Result<String, OperationError> {
        match self.field(name) {
            None => Err(OperationError::MissingField {
                kind: kind.name(),
                field: name,
            }),
            Some(_) => self.text(name).ok_or_else(|| OperationError::InvalidField {
                kind: kind.name(),
                field: name,
                reason: "must be a string, number or boolean".to_string(),
            }),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct OperationGroup {
    /// Kind name exactly as sent.
    pub name: String,
    /// `None` when the name is not a known operation.
    pub kind: Option<OperationKind>,
    /// Raw entries, decoded into descriptors one at a time by the driver so
    /// a malformed entry fails alone.
    pub entries: Vec<Value>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct OperationBatch {
    groups: Vec<OperationGroup>,
}

impl OperationBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(input: &str) -> Result<Self, BatchDecodeError> {
        let value: Value = serde_json::from_str(input)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, BatchDecodeError> {
        let Value::Object(map) = value else {
            return Err(BatchDecodeError::NotAnObject);
        };
        let mut groups = Vec::with_capacity(map.len());
        for (name, entries) in map {
            let Value::Array(entries) = entries else {
                return Err(BatchDecodeError::NotAnArray(name));
            };
            groups.push(OperationGroup {
                kind: OperationKind::from_name(&name),
                name,
                entries,
            });
        }
        Ok(Self { groups })
    }

    /// Appends one entry, keeping kind groups in first-seen order.
    pub fn push(&mut self, kind: OperationKind, descriptor: &Descriptor) -> Result<(), serde_json::Error> {
        let entry = serde_json::to_value(descriptor)?;
        match self.groups.iter_mut().find(|g| g.name == kind.name()) {
            Some(group) => group.entries.push(entry),
            None => self.groups.push(OperationGroup {
                name: kind.name().to_string(),
                kind: Some(kind),
                entries: vec![entry],
            }),
        }
        Ok(())
    }

    pub fn groups(&self) -> &[OperationGroup] {
        &self.groups
    }

    pub fn is_empty(&self) -> bool {
        self.groups.iter().all(|g| g.entries.is_empty())
    }

    /// Total number of entries across kinds.
    pub fn len(&self) -> usize {
        self.groups.iter().map(|g| g.entries.len()).sum()
    }

    pub fn to_value(&self) -> Value {
        Value::Object(
            self.groups
                .iter()
                .map(|g| (g.name.clone(), Value::Array(g.entries.clone())))
                .collect(),
        )
    }
}

impl Serialize for OperationBatch {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for OperationBatch {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        OperationBatch::from_value(value).map_err(D::Error::custom)
    }
}
