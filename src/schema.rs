//! Schema document types, loading, and cross-reference resolution.
//!
//! This is the reference loader for the descriptor model. It reads a JSON
//! description of a `.proto` file (package, enums, messages, fields) and
//! produces a [`Schema`] whose [`FieldDescriptor`]s are fully populated.
//!
//! Loading runs in two passes. The first registers every enum and message,
//! nested ones included, under its dotted full name. The second builds one
//! field descriptor per field and attaches the referenced type. References
//! are looked up like `protoc` does: a leading `.` makes the name absolute,
//! otherwise the enclosing scopes are tried from innermost to outermost.
//!
//! ```json
//! {
//!   "package": "tutorial",
//!   "messages": [{
//!     "name": "Person",
//!     "fields": [
//!       { "name": "id", "number": 1, "label": "required", "type": "int32" },
//!       { "name": "kind", "number": 2, "type": "Kind", "default": "HUMAN" }
//!     ],
//!     "enums": [{ "name": "Kind", "values": [{ "name": "HUMAN", "number": 0 }] }]
//!   }]
//! }
//! ```
//!
//! A resolved [`Schema`] is never mutated again and can be shared across
//! threads.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::descriptor::{
    EnumDescriptor, FieldDescriptor, Label, MessageDescriptor, TypeDescriptor, qualify,
};
use crate::error::{Error, Result};

/// Highest field number the wire format allows (2^29 - 1).
pub const MAX_FIELD_NUMBER: i64 = 536_870_911;

/// A schema file as written on disk.
#[derive(Debug, Default, Deserialize)]
pub struct SchemaDocument {
    /// Dotted package name (e.g., `"tutorial"`). Absent means the root namespace.
    #[serde(default)]
    pub package: Option<String>,

    /// Top-level enums.
    #[serde(default)]
    pub enums: Vec<EnumDef>,

    /// Top-level messages.
    #[serde(default)]
    pub messages: Vec<MessageDef>,
}

/// An enum definition.
#[derive(Debug, Deserialize)]
pub struct EnumDef {
    pub name: String,

    /// Values in declaration order.
    #[serde(default)]
    pub values: Vec<EnumValueDef>,
}

#[derive(Debug, Deserialize)]
pub struct EnumValueDef {
    pub name: String,
    pub number: i32,
}

/// A message definition, possibly with nested types.
#[derive(Debug, Deserialize)]
pub struct MessageDef {
    pub name: String,

    #[serde(default)]
    pub fields: Vec<FieldDef>,

    /// Enums nested in this message.
    #[serde(default)]
    pub enums: Vec<EnumDef>,

    /// Messages nested in this message.
    #[serde(default)]
    pub messages: Vec<MessageDef>,
}

/// A single field of a message.
#[derive(Debug, Deserialize)]
pub struct FieldDef {
    pub name: String,

    /// Wire tag. Kept signed here so out-of-range input can be reported.
    pub number: i64,

    /// `required`, `optional` or `repeated` (`LABEL_*` also accepted).
    #[serde(default = "default_label")]
    pub label: String,

    /// Scalar tag (`"int32"`) or the target identifier of a user-defined type.
    #[serde(rename = "type")]
    pub type_: String,

    /// Type reference as written in the `.proto` file, when it differs from
    /// `type` (e.g., `".tutorial.Person.PhoneType"`).
    #[serde(default)]
    pub type_name: Option<String>,

    /// Default literal. Strings, numbers and booleans are accepted.
    #[serde(default)]
    pub default: Option<serde_json::Value>,
}

fn default_label() -> String {
    Label::Optional.as_str().to_string()
}

/// A message together with its resolved fields.
#[derive(Debug)]
pub struct Message {
    descriptor: Arc<MessageDescriptor>,
    fields: Vec<FieldDescriptor>,
}

impl Message {
    pub fn descriptor(&self) -> &Arc<MessageDescriptor> {
        &self.descriptor
    }

    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    pub fn full_name(&self) -> String {
        self.descriptor.full_name()
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name() == name)
    }

    pub fn field_by_number(&self, number: u32) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.number() == number)
    }
}

/// A loaded schema with every cross-reference resolved.
#[derive(Debug)]
pub struct Schema {
    package: Option<String>,
    enums: Vec<Arc<EnumDescriptor>>,
    messages: Vec<Message>,
}

impl Schema {
    pub fn package(&self) -> Option<&str> {
        self.package.as_deref()
    }

    /// Every enum, nested ones included, in declaration order.
    pub fn enums(&self) -> &[Arc<EnumDescriptor>] {
        &self.enums
    }

    /// Every message, nested ones following their parent.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Look up a message by dotted full name (`"tutorial.Person"`).
    pub fn message(&self, full_name: &str) -> Option<&Message> {
        let full_name = full_name.strip_prefix('.').unwrap_or(full_name);
        self.messages.iter().find(|m| m.full_name() == full_name)
    }

    /// Count of user-defined fields left without a type descriptor.
    pub fn unresolved_count(&self) -> usize {
        self.messages
            .iter()
            .flat_map(|m| m.fields.iter())
            .filter(|f| !f.is_protobuf_scalar_type() && !f.is_resolved())
            .count()
    }
}

/// Load a schema document from disk and resolve it.
pub fn load_schema(path: &Path) -> Result<Schema> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_schema(&content)
}

/// Parse a schema document from JSON text and resolve it.
pub fn parse_schema(json: &str) -> Result<Schema> {
    let document: SchemaDocument = serde_json::from_str(json)?;
    build_schema(&document)
}

/// Build descriptors for every field in `document` and resolve type references.
pub fn build_schema(document: &SchemaDocument) -> Result<Schema> {
    let package = document.package.clone().filter(|p| !p.is_empty());
    let scope = package.as_deref();

    // Pass one: register every user-defined type.
    let mut registry = TypeRegistry::default();
    for def in &document.enums {
        registry.add_enum(def, scope)?;
    }
    for def in &document.messages {
        registry.add_message(def, scope)?;
    }

    // Pass two: build fields and attach resolved types.
    let mut messages = Vec::new();
    for def in &document.messages {
        build_message(def, scope, &registry, &mut messages)?;
    }

    debug!(
        package = package.as_deref().unwrap_or(""),
        messages = messages.len(),
        enums = registry.enums.len(),
        "schema loaded"
    );

    Ok(Schema {
        package,
        enums: registry.enums,
        messages,
    })
}

// ── Type registry ──────────────────────────────────────────────────────

#[derive(Default)]
struct TypeRegistry {
    by_full_name: BTreeMap<String, TypeDescriptor>,
    enums: Vec<Arc<EnumDescriptor>>,
}

impl TypeRegistry {
    fn insert(&mut self, descriptor: TypeDescriptor) -> Result<()> {
        let full_name = descriptor.full_name();
        if self.by_full_name.contains_key(&full_name) {
            return Err(Error::Schema(format!(
                "type '{full_name}' is defined more than once"
            )));
        }
        self.by_full_name.insert(full_name, descriptor);
        Ok(())
    }

    fn add_enum(&mut self, def: &EnumDef, scope: Option<&str>) -> Result<()> {
        let mut descriptor = EnumDescriptor::new(&def.name, scope.map(str::to_string));
        for value in &def.values {
            descriptor.add_value(&value.name, value.number);
        }
        let descriptor = Arc::new(descriptor);
        self.enums.push(Arc::clone(&descriptor));
        self.insert(TypeDescriptor::Enum(descriptor))
    }

    fn add_message(&mut self, def: &MessageDef, scope: Option<&str>) -> Result<()> {
        let descriptor = MessageDescriptor::new(&def.name, scope.map(str::to_string));
        self.insert(TypeDescriptor::Message(Arc::new(descriptor)))?;

        let inner = qualify(scope, &def.name);
        for nested in &def.enums {
            self.add_enum(nested, Some(&inner))?;
        }
        for nested in &def.messages {
            self.add_message(nested, Some(&inner))?;
        }
        Ok(())
    }

    /// Find `reference` as seen from inside `scope` (a dotted full name).
    fn resolve(&self, reference: &str, scope: &str) -> Option<&TypeDescriptor> {
        if let Some(absolute) = reference.strip_prefix('.') {
            return self.by_full_name.get(absolute);
        }
        let mut current = Some(scope);
        while let Some(scope) = current {
            let candidate = qualify(Some(scope), reference);
            if let Some(found) = self.by_full_name.get(&candidate) {
                return Some(found);
            }
            current = match scope.rsplit_once('.') {
                Some((outer, _)) => Some(outer),
                None if !scope.is_empty() => Some(""),
                None => None,
            };
        }
        None
    }
}

// ── Field construction ─────────────────────────────────────────────────

fn build_message(
    def: &MessageDef,
    scope: Option<&str>,
    registry: &TypeRegistry,
    out: &mut Vec<Message>,
) -> Result<()> {
    let full_name = qualify(scope, &def.name);
    let descriptor = match registry.by_full_name.get(&full_name) {
        Some(TypeDescriptor::Message(m)) => Arc::clone(m),
        _ => {
            return Err(Error::Schema(format!(
                "message '{full_name}' was not registered"
            )));
        }
    };

    let mut names = BTreeSet::new();
    let mut numbers = BTreeSet::new();
    let mut fields = Vec::with_capacity(def.fields.len());
    for field_def in &def.fields {
        if !names.insert(field_def.name.as_str()) {
            return Err(Error::Schema(format!(
                "duplicate field name '{}' in message '{full_name}'",
                field_def.name
            )));
        }
        if !numbers.insert(field_def.number) {
            return Err(Error::Schema(format!(
                "duplicate field number {} in message '{full_name}'",
                field_def.number
            )));
        }
        fields.push(build_field(field_def, &full_name, registry)?);
    }
    out.push(Message { descriptor, fields });

    for nested in &def.messages {
        build_message(nested, Some(&full_name), registry, out)?;
    }
    Ok(())
}

fn build_field(def: &FieldDef, scope: &str, registry: &TypeRegistry) -> Result<FieldDescriptor> {
    if !(1..=MAX_FIELD_NUMBER).contains(&def.number) {
        return Err(Error::Schema(format!(
            "field '{}' in message '{scope}' has number {} (expected 1..={MAX_FIELD_NUMBER})",
            def.name, def.number
        )));
    }
    let number = u32::try_from(def.number)
        .map_err(|e| Error::Schema(format!("field '{}': {e}", def.name)))?;
    let label: Label = def.label.parse()?;

    let mut field = FieldDescriptor::new(&def.name, number, label, &def.type_);

    if field.is_protobuf_scalar_type() {
        if let Some(type_name) = &def.type_name {
            field.set_type_name(type_name);
        }
    } else {
        let reference = def.type_name.as_deref().unwrap_or(&def.type_);
        match registry.resolve(reference, scope) {
            Some(descriptor) => {
                field.set_type_name(descriptor.name());
                if let Some(namespace) = descriptor.namespace() {
                    field.set_namespace(namespace);
                }
                debug!(
                    field = %def.name,
                    scope,
                    target = %descriptor.full_name(),
                    "resolved type reference"
                );
                field.set_type_descriptor(descriptor.clone())?;
            }
            None => {
                let written = reference.trim_start_matches('.');
                match written.rsplit_once('.') {
                    Some((namespace, name)) => {
                        field.set_namespace(namespace);
                        field.set_type_name(name);
                    }
                    None => field.set_type_name(written),
                }
                warn!(
                    field = %def.name,
                    scope,
                    reference,
                    "unresolved type reference, falling back to the raw type name"
                );
            }
        }
    }

    if let Some(raw) = &def.default {
        let text = default_text(&def.name, raw)?;
        let value = field.parse_default(&text)?;
        field.set_default_value(value);
    }

    Ok(field)
}

fn default_text(field: &str, raw: &serde_json::Value) -> Result<String> {
    match raw {
        serde_json::Value::String(s) => Ok(s.clone()),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Bool(b) => Ok(b.to_string()),
        other => Err(Error::Schema(format!(
            "field '{field}' has a default that is not a string, number or boolean: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::DefaultValue;

    /// The classic address book, with one nested message and one nested enum.
    fn address_book_json() -> &'static str {
        r#"{
            "package": "tutorial",
            "messages": [
                {
                    "name": "Person",
                    "fields": [
                        {"name": "name", "number": 1, "label": "required", "type": "string"},
                        {"name": "id", "number": 2, "label": "required", "type": "int32"},
                        {"name": "email", "number": 3, "type": "string"},
                        {"name": "phones", "number": 4, "label": "repeated",
                         "type": "Person_PhoneNumber", "type_name": "PhoneNumber"}
                    ],
                    "enums": [
                        {"name": "PhoneType", "values": [
                            {"name": "MOBILE", "number": 0},
                            {"name": "HOME", "number": 1},
                            {"name": "WORK", "number": 2}
                        ]}
                    ],
                    "messages": [
                        {
                            "name": "PhoneNumber",
                            "fields": [
                                {"name": "number", "number": 1, "label": "required", "type": "string"},
                                {"name": "type", "number": 2, "type": "Person_PhoneType",
                                 "type_name": "PhoneType", "default": "HOME"}
                            ]
                        }
                    ]
                },
                {
                    "name": "AddressBook",
                    "fields": [
                        {"name": "people", "number": 1, "label": "repeated", "type": "Person"}
                    ]
                }
            ]
        }"#
    }

    #[test]
    fn parse_address_book() {
        let schema = parse_schema(address_book_json()).unwrap();
        assert_eq!(schema.package(), Some("tutorial"));
        assert_eq!(schema.messages().len(), 3);
        assert_eq!(schema.enums().len(), 1);
        assert_eq!(schema.enums()[0].full_name(), "tutorial.Person.PhoneType");
        assert_eq!(schema.unresolved_count(), 0);

        let names: Vec<String> = schema.messages().iter().map(Message::full_name).collect();
        assert_eq!(
            names,
            [
                "tutorial.Person",
                "tutorial.Person.PhoneNumber",
                "tutorial.AddressBook"
            ]
        );
    }

    #[test]
    fn nested_message_reference_resolves() {
        let schema = parse_schema(address_book_json()).unwrap();
        let person = schema.message("tutorial.Person").unwrap();
        let phones = person.field("phones").unwrap();

        assert!(phones.is_repeated());
        assert!(phones.is_message());
        assert_eq!(phones.type_name(), "Person_PhoneNumber");
        assert_eq!(phones.declared_type_name(), Some("PhoneNumber"));
        assert_eq!(phones.namespace(), Some("tutorial.Person"));
    }

    #[test]
    fn enum_reference_resolves_from_outer_scope() {
        let schema = parse_schema(address_book_json()).unwrap();
        let phone = schema.message(".tutorial.Person.PhoneNumber").unwrap();
        let kind = phone.field_by_number(2).unwrap();

        assert!(kind.is_enum());
        assert_eq!(kind.type_name(), "int");
        assert_eq!(
            kind.default_value(),
            Some(&DefaultValue::Enum {
                name: "HOME".to_string(),
                number: 1
            })
        );
    }

    #[test]
    fn absolute_reference_resolves() {
        let json = r#"{
            "package": "a.b",
            "enums": [{"name": "Mode", "values": [{"name": "OFF", "number": 0}]}],
            "messages": [{"name": "M", "fields": [
                {"name": "mode", "number": 1, "type": "Mode", "type_name": ".a.b.Mode"}
            ]}]
        }"#;
        let schema = parse_schema(json).unwrap();
        let mode = schema.message("a.b.M").unwrap().field("mode").unwrap();
        assert!(mode.is_enum());
        assert_eq!(mode.declared_type_name(), Some("Mode"));
        assert_eq!(mode.namespace(), Some("a.b"));
    }

    #[test]
    fn self_referencing_message_resolves() {
        let json = r#"{
            "messages": [{"name": "Node", "fields": [
                {"name": "children", "number": 1, "label": "repeated", "type": "Node"}
            ]}]
        }"#;
        let schema = parse_schema(json).unwrap();
        let children = schema.message("Node").unwrap().field("children").unwrap();
        assert!(children.is_message());
        assert_eq!(children.namespace(), None);
        assert_eq!(children.type_name(), "Node");
    }

    #[test]
    fn unresolved_reference_keeps_raw_name() {
        let json = r#"{
            "package": "p",
            "messages": [{"name": "M", "fields": [
                {"name": "ts", "number": 1, "type": "Timestamp",
                 "type_name": ".google.protobuf.Timestamp"}
            ]}]
        }"#;
        let schema = parse_schema(json).unwrap();
        let ts = schema.message("p.M").unwrap().field("ts").unwrap();
        assert!(!ts.is_resolved());
        assert_eq!(ts.type_name(), "Timestamp");
        assert_eq!(ts.declared_type_name(), Some("Timestamp"));
        assert_eq!(ts.namespace(), Some("google.protobuf"));
        assert_eq!(schema.unresolved_count(), 1);
    }

    #[test]
    fn scalar_defaults_accept_json_literals() {
        let json = r#"{
            "messages": [{"name": "Cfg", "fields": [
                {"name": "retries", "number": 1, "type": "uint32", "default": 3},
                {"name": "verbose", "number": 2, "type": "bool", "default": false},
                {"name": "ratio", "number": 3, "type": "double", "default": "0.25"}
            ]}]
        }"#;
        let schema = parse_schema(json).unwrap();
        let cfg = schema.message("Cfg").unwrap();
        assert_eq!(
            cfg.field("retries").unwrap().default_value(),
            Some(&DefaultValue::UInt(3))
        );
        assert_eq!(
            cfg.field("verbose").unwrap().default_value(),
            Some(&DefaultValue::Bool(false))
        );
        assert_eq!(
            cfg.field("ratio").unwrap().default_value(),
            Some(&DefaultValue::Float(0.25))
        );
    }

    #[test]
    fn duplicate_field_number_is_rejected() {
        let json = r#"{"messages": [{"name": "M", "fields": [
            {"name": "a", "number": 1, "type": "int32"},
            {"name": "b", "number": 1, "type": "int32"}
        ]}]}"#;
        let err = parse_schema(json).unwrap_err().to_string();
        assert!(err.contains("duplicate field number 1"), "{err}");
    }

    #[test]
    fn duplicate_field_name_is_rejected() {
        let json = r#"{"messages": [{"name": "M", "fields": [
            {"name": "a", "number": 1, "type": "int32"},
            {"name": "a", "number": 2, "type": "int32"}
        ]}]}"#;
        assert!(matches!(parse_schema(json), Err(Error::Schema(_))));
    }

    #[test]
    fn out_of_range_field_number_is_rejected() {
        for number in ["0", "-4", "536870912"] {
            let json = format!(
                r#"{{"messages": [{{"name": "M", "fields": [
                    {{"name": "a", "number": {number}, "type": "int32"}}
                ]}}]}}"#
            );
            assert!(
                matches!(parse_schema(&json), Err(Error::Schema(_))),
                "number {number} should be rejected"
            );
        }
    }

    #[test]
    fn duplicate_type_is_rejected() {
        let json = r#"{
            "enums": [{"name": "Dup"}],
            "messages": [{"name": "Dup"}]
        }"#;
        let err = parse_schema(json).unwrap_err().to_string();
        assert!(err.contains("'Dup' is defined more than once"), "{err}");
    }

    #[test]
    fn invalid_label_is_rejected() {
        let json = r#"{"messages": [{"name": "M", "fields": [
            {"name": "a", "number": 1, "label": "many", "type": "int32"}
        ]}]}"#;
        assert!(matches!(parse_schema(json), Err(Error::InvalidLabel(_))));
    }

    #[test]
    fn invalid_enum_default_is_rejected() {
        let json = r#"{
            "enums": [{"name": "E", "values": [{"name": "A", "number": 0}]}],
            "messages": [{"name": "M", "fields": [
                {"name": "e", "number": 1, "type": "E", "default": "B"}
            ]}]
        }"#;
        assert!(matches!(
            parse_schema(json),
            Err(Error::InvalidDefault { .. })
        ));
    }

    #[test]
    fn label_defaults_to_optional() {
        let json = r#"{"messages": [{"name": "M", "fields": [
            {"name": "a", "number": 1, "type": "int32"}
        ]}]}"#;
        let schema = parse_schema(json).unwrap();
        assert!(schema.message("M").unwrap().field("a").unwrap().is_optional());
    }

    #[test]
    fn invalid_json_is_reported() {
        assert!(matches!(parse_schema("{"), Err(Error::Json(_))));
    }
}
