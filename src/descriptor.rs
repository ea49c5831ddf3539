//! In-memory descriptors for schema fields and the user-defined types they
//! reference.
//!
//! A [`FieldDescriptor`] is filled in by a schema loader in two steps: the
//! field's own facts (name, number, label, type tag) first, then, once every
//! enum and message in the schema is known, the resolved [`TypeDescriptor`]
//! for non-scalar fields. Code emitters only read from it.
//!
//! Enum and message descriptors are shared through [`Arc`] so a resolved
//! schema can be handed to several generator threads at once.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::naming::{to_camel_case, to_const_name};
use crate::type_map::{self, NATIVE_INT, ScalarCategory, ScalarType};

/// Field cardinality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Required,
    Optional,
    Repeated,
}

impl Label {
    pub fn as_str(self) -> &'static str {
        match self {
            Label::Required => "required",
            Label::Optional => "optional",
            Label::Repeated => "repeated",
        }
    }
}

impl FromStr for Label {
    type Err = Error;

    /// Accepts `required`, `optional`, `repeated` and the `LABEL_*` forms,
    /// in any case.
    fn from_str(s: &str) -> Result<Self> {
        let lower = s.to_ascii_lowercase();
        match lower.strip_prefix("label_").unwrap_or(&lower) {
            "required" => Ok(Label::Required),
            "optional" => Ok(Label::Optional),
            "repeated" => Ok(Label::Repeated),
            _ => Err(Error::InvalidLabel(s.to_string())),
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named constant inside an enum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValue {
    pub name: String,
    pub number: i32,
}

/// A user-defined enum type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDescriptor {
    name: String,
    namespace: Option<String>,
    values: Vec<EnumValue>,
}

impl EnumDescriptor {
    pub fn new(name: impl Into<String>, namespace: Option<String>) -> Self {
        Self {
            name: name.into(),
            namespace,
            values: Vec::new(),
        }
    }

    pub fn add_value(&mut self, name: impl Into<String>, number: i32) {
        self.values.push(EnumValue {
            name: name.into(),
            number,
        });
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Values in declaration order.
    pub fn values(&self) -> &[EnumValue] {
        &self.values
    }

    /// Look up a value by its exact name.
    pub fn value(&self, name: &str) -> Option<&EnumValue> {
        self.values.iter().find(|v| v.name == name)
    }

    /// Dotted name including the namespace, e.g. `tutorial.Person.PhoneType`.
    pub fn full_name(&self) -> String {
        qualify(self.namespace.as_deref(), &self.name)
    }
}

/// A user-defined message type, as seen from a field that references it.
///
/// Only identity is kept here. The message's own fields live with the
/// schema that owns it, which keeps self-referencing messages representable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageDescriptor {
    name: String,
    namespace: Option<String>,
}

impl MessageDescriptor {
    pub fn new(name: impl Into<String>, namespace: Option<String>) -> Self {
        Self {
            name: name.into(),
            namespace,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn full_name(&self) -> String {
        qualify(self.namespace.as_deref(), &self.name)
    }
}

/// The resolved user-defined type a field refers to.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDescriptor {
    Enum(Arc<EnumDescriptor>),
    Message(Arc<MessageDescriptor>),
}

impl TypeDescriptor {
    pub fn name(&self) -> &str {
        match self {
            TypeDescriptor::Enum(e) => e.name(),
            TypeDescriptor::Message(m) => m.name(),
        }
    }

    pub fn namespace(&self) -> Option<&str> {
        match self {
            TypeDescriptor::Enum(e) => e.namespace(),
            TypeDescriptor::Message(m) => m.namespace(),
        }
    }

    pub fn full_name(&self) -> String {
        qualify(self.namespace(), self.name())
    }

    pub fn as_enum(&self) -> Option<&EnumDescriptor> {
        match self {
            TypeDescriptor::Enum(e) => Some(e),
            TypeDescriptor::Message(_) => None,
        }
    }

    pub fn as_message(&self) -> Option<&MessageDescriptor> {
        match self {
            TypeDescriptor::Message(m) => Some(m),
            TypeDescriptor::Enum(_) => None,
        }
    }
}

/// A field's default value, typed by the field's resolved target type.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    Float(f64),
    Int(i64),
    UInt(u64),
    Bool(bool),
    String(String),
    Enum { name: String, number: i32 },
}

impl fmt::Display for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Float(v) => write!(f, "{v}"),
            DefaultValue::Int(v) => write!(f, "{v}"),
            DefaultValue::UInt(v) => write!(f, "{v}"),
            DefaultValue::Bool(v) => write!(f, "{v}"),
            DefaultValue::String(v) => write!(f, "{v:?}"),
            DefaultValue::Enum { name, .. } => f.write_str(name),
        }
    }
}

/// One schema field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    name: String,
    number: u32,
    label: Label,
    type_: String,
    type_name: Option<String>,
    type_descriptor: Option<TypeDescriptor>,
    namespace: Option<String>,
    default_value: Option<DefaultValue>,
}

impl FieldDescriptor {
    /// Create a field with no declared type name, namespace or default.
    ///
    /// `number` is stored as given; see [`Self::set_number`].
    pub fn new(
        name: impl Into<String>,
        number: u32,
        label: Label,
        type_: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            number,
            label,
            type_: type_.into(),
            type_name: None,
            type_descriptor: None,
            namespace: None,
            default_value: None,
        }
    }

    // ── Setters (loading phase) ────────────────────────────────────────

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Set the wire tag.
    ///
    /// Not range-checked: the caller must pass a value in
    /// `1..=536_870_911`. The schema loader rejects anything else.
    pub fn set_number(&mut self, number: u32) {
        self.number = number;
    }

    pub fn set_label(&mut self, label: Label) {
        self.label = label;
    }

    /// Set the raw type tag.
    ///
    /// Switching to a scalar tag drops any attached type descriptor, since a
    /// scalar field cannot reference a user-defined type.
    pub fn set_type(&mut self, type_: impl Into<String>) {
        self.type_ = type_.into();
        if self.is_protobuf_scalar_type() {
            self.type_descriptor = None;
        }
    }

    /// Set the declared type name.
    ///
    /// An attached type descriptor with a different name is dropped.
    pub fn set_type_name(&mut self, type_name: impl Into<String>) {
        self.type_name = Some(type_name.into());
        self.drop_stale_descriptor();
    }

    /// Set the namespace of the declared type.
    ///
    /// An attached type descriptor from a different namespace is dropped.
    pub fn set_namespace(&mut self, namespace: impl Into<String>) {
        self.namespace = Some(namespace.into());
        self.drop_stale_descriptor();
    }

    pub fn set_default_value(&mut self, default_value: DefaultValue) {
        self.default_value = Some(default_value);
    }

    /// Attach the resolved user-defined type.
    ///
    /// Fails if the field is scalar, or if the descriptor's name and
    /// namespace do not match the field's declared type name and namespace.
    pub fn set_type_descriptor(&mut self, descriptor: TypeDescriptor) -> Result<()> {
        if self.is_protobuf_scalar_type() {
            return Err(Error::ScalarTypeDescriptor {
                field: self.name.clone(),
                type_tag: self.type_.clone(),
            });
        }
        let declared_matches = self.type_name.as_deref() == Some(descriptor.name())
            && self.namespace.as_deref() == descriptor.namespace();
        if !declared_matches {
            return Err(Error::TypeDescriptorMismatch {
                field: self.name.clone(),
                expected: qualify(
                    self.namespace.as_deref(),
                    self.type_name.as_deref().unwrap_or(&self.type_),
                ),
                found: descriptor.full_name(),
            });
        }
        self.type_descriptor = Some(descriptor);
        Ok(())
    }

    // ── Identity ───────────────────────────────────────────────────────

    pub fn name(&self) -> &str {
        &self.name
    }

    /// CamelCase form of the name, used for `get<Name>`/`set<Name>` accessors.
    pub fn camel_case_name(&self) -> String {
        to_camel_case(&self.name)
    }

    /// UPPER_SNAKE form of the name, used for field-number constants.
    pub fn const_name(&self) -> String {
        to_const_name(&self.name)
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    // ── Cardinality ────────────────────────────────────────────────────

    pub fn label(&self) -> Label {
        self.label
    }

    pub fn is_repeated(&self) -> bool {
        self.label == Label::Repeated
    }

    pub fn is_required(&self) -> bool {
        self.label == Label::Required
    }

    pub fn is_optional(&self) -> bool {
        self.label == Label::Optional
    }

    // ── Type queries ───────────────────────────────────────────────────

    /// The raw type tag as set by the loader.
    pub fn type_(&self) -> &str {
        &self.type_
    }

    /// The scalar wire type, if the tag is one.
    pub fn wire_scalar(&self) -> Option<ScalarType> {
        ScalarType::from_tag(&self.type_)
    }

    /// True if the type tag is a wire scalar.
    pub fn is_protobuf_scalar_type(&self) -> bool {
        type_map::scalar_category(&self.type_).is_some()
    }

    /// True if the type tag maps to a native primitive.
    pub fn is_scalar_type(&self) -> bool {
        type_map::native_type(&self.type_).is_some()
    }

    /// Runtime scalar category of the field.
    ///
    /// Only valid for scalar fields; check [`Self::is_protobuf_scalar_type`]
    /// first.
    pub fn scalar_category(&self) -> Result<ScalarCategory> {
        type_map::scalar_category(&self.type_).ok_or_else(|| self.not_scalar())
    }

    /// Native primitive name of a scalar field.
    pub fn native_type(&self) -> Result<&'static str> {
        type_map::native_type(&self.type_).ok_or_else(|| self.not_scalar())
    }

    /// Target type name used in generated signatures.
    ///
    /// Scalars map to their native primitive and enums to the integer
    /// primitive. Messages and unresolved references fall back to the raw
    /// type tag, which is the target type's own identifier.
    pub fn type_name(&self) -> &str {
        if let Some(native) = type_map::native_type(&self.type_) {
            return native;
        }
        match &self.type_descriptor {
            Some(TypeDescriptor::Enum(_)) => NATIVE_INT,
            Some(TypeDescriptor::Message(_)) | None => self.type_.as_str(),
        }
    }

    /// The separately stored declared type name, distinct from the target
    /// name returned by [`Self::type_name`].
    pub fn declared_type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    pub fn type_descriptor(&self) -> Option<&TypeDescriptor> {
        self.type_descriptor.as_ref()
    }

    /// True once a user-defined type descriptor has been attached.
    pub fn is_resolved(&self) -> bool {
        self.type_descriptor.is_some()
    }

    pub fn is_enum(&self) -> bool {
        matches!(self.type_descriptor, Some(TypeDescriptor::Enum(_)))
    }

    pub fn is_message(&self) -> bool {
        matches!(self.type_descriptor, Some(TypeDescriptor::Message(_)))
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn default_value(&self) -> Option<&DefaultValue> {
        self.default_value.as_ref()
    }

    /// Read a schema default literal as this field's target type.
    ///
    /// Enum defaults must name a value of the resolved enum. Message fields,
    /// and user-defined fields that are not yet resolved, have no default.
    pub fn parse_default(&self, text: &str) -> Result<DefaultValue> {
        if let Some(scalar) = self.wire_scalar() {
            return parse_scalar_default(scalar, text)
                .map_err(|reason| self.bad_default(text, reason));
        }
        match &self.type_descriptor {
            Some(TypeDescriptor::Enum(e)) => e
                .value(text)
                .map(|v| DefaultValue::Enum {
                    name: v.name.clone(),
                    number: v.number,
                })
                .ok_or_else(|| {
                    self.bad_default(text, format!("enum '{}' has no such value", e.full_name()))
                }),
            Some(TypeDescriptor::Message(_)) => {
                Err(self.bad_default(text, "message fields cannot have a default".to_string()))
            }
            None => Err(self.bad_default(text, format!("type '{}' is not resolved", self.type_))),
        }
    }

    fn drop_stale_descriptor(&mut self) {
        let stale = self.type_descriptor.as_ref().is_some_and(|d| {
            self.type_name.as_deref() != Some(d.name())
                || self.namespace.as_deref() != d.namespace()
        });
        if stale {
            self.type_descriptor = None;
        }
    }

    fn not_scalar(&self) -> Error {
        Error::NotScalar {
            type_tag: self.type_.clone(),
        }
    }

    fn bad_default(&self, text: &str, reason: String) -> Error {
        Error::InvalidDefault {
            field: self.name.clone(),
            value: text.to_string(),
            reason,
        }
    }
}

fn parse_scalar_default(
    scalar: ScalarType,
    text: &str,
) -> std::result::Result<DefaultValue, String> {
    let value = match scalar {
        ScalarType::Double | ScalarType::Float => {
            DefaultValue::Float(text.parse::<f64>().map_err(|e| e.to_string())?)
        }
        ScalarType::Int32 | ScalarType::Sint32 | ScalarType::Sfixed32 => {
            let v = text.parse::<i32>().map_err(|e| e.to_string())?;
            DefaultValue::Int(i64::from(v))
        }
        ScalarType::Int64 | ScalarType::Sint64 | ScalarType::Sfixed64 => {
            DefaultValue::Int(text.parse::<i64>().map_err(|e| e.to_string())?)
        }
        ScalarType::Uint32 | ScalarType::Fixed32 => {
            let v = text.parse::<u32>().map_err(|e| e.to_string())?;
            DefaultValue::UInt(u64::from(v))
        }
        ScalarType::Uint64 | ScalarType::Fixed64 => {
            DefaultValue::UInt(text.parse::<u64>().map_err(|e| e.to_string())?)
        }
        ScalarType::Bool => match text {
            "true" => DefaultValue::Bool(true),
            "false" => DefaultValue::Bool(false),
            _ => return Err("expected 'true' or 'false'".to_string()),
        },
        ScalarType::String | ScalarType::Bytes => DefaultValue::String(text.to_string()),
    };
    Ok(value)
}

pub(crate) fn qualify(namespace: Option<&str>, name: &str) -> String {
    match namespace {
        Some(ns) if !ns.is_empty() => format!("{ns}.{name}"),
        _ => name.to_string(),
    }
}
