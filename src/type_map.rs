//! Maps Protocol Buffer scalar type tags to runtime categories and native types.
//!
//! # Type Category Table
//!
//! | Scalar tag | Category | Native type | Notes |
//! |------------|----------|-------------|-------|
//! | `double` | `double` | `float` | |
//! | `float` | `float` | `float` | Same native type as `double`, distinct category |
//! | `int32`, `int64`, `uint32`, `uint64` | `int` | `int` | Plain varint |
//! | `sint32`, `sint64` | `signed-int` | `int` | Zig-zag varint |
//! | `fixed32`, `sfixed32` | `fixed32` | `int` | |
//! | `fixed64`, `sfixed64` | `fixed64` | `int` | |
//! | `bool` | `bool` | `bool` | |
//! | `string`, `bytes` | `string` | `string` | Text vs raw bytes is decided by the emitter |
//!
//! Tags are matched case-insensitively and may carry the descriptor enum
//! prefix (`TYPE_INT32`). Anything else is not a scalar: enum and message
//! references are resolved through [`crate::descriptor`].

use std::fmt;

use serde::Serialize;

/// One of the fifteen scalar wire types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    Double,
    Float,
    Int32,
    Int64,
    Uint32,
    Uint64,
    Sint32,
    Sint64,
    Fixed32,
    Fixed64,
    Sfixed32,
    Sfixed64,
    Bool,
    String,
    Bytes,
}

/// Abstract category used by the runtime encoder/decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScalarCategory {
    Double,
    Float,
    Int,
    SignedInt,
    Fixed32,
    Fixed64,
    Bool,
    String,
}

impl ScalarType {
    /// Every scalar tag, in descriptor order.
    pub const ALL: [ScalarType; 15] = [
        ScalarType::Double,
        ScalarType::Float,
        ScalarType::Int32,
        ScalarType::Int64,
        ScalarType::Uint32,
        ScalarType::Uint64,
        ScalarType::Sint32,
        ScalarType::Sint64,
        ScalarType::Fixed32,
        ScalarType::Fixed64,
        ScalarType::Sfixed32,
        ScalarType::Sfixed64,
        ScalarType::Bool,
        ScalarType::String,
        ScalarType::Bytes,
    ];

    /// Look up a scalar tag.
    ///
    /// Returns `None` for anything outside the table, including enum and
    /// message type names.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let lower = tag.to_ascii_lowercase();
        let keyword = lower.strip_prefix("type_").unwrap_or(&lower);
        let scalar = match keyword {
            "double" => ScalarType::Double,
            "float" => ScalarType::Float,
            "int32" => ScalarType::Int32,
            "int64" => ScalarType::Int64,
            "uint32" => ScalarType::Uint32,
            "uint64" => ScalarType::Uint64,
            "sint32" => ScalarType::Sint32,
            "sint64" => ScalarType::Sint64,
            "fixed32" => ScalarType::Fixed32,
            "fixed64" => ScalarType::Fixed64,
            "sfixed32" => ScalarType::Sfixed32,
            "sfixed64" => ScalarType::Sfixed64,
            "bool" => ScalarType::Bool,
            "string" => ScalarType::String,
            "bytes" => ScalarType::Bytes,
            _ => return None,
        };
        Some(scalar)
    }

    /// The schema keyword for this tag (`"sfixed64"`).
    pub fn as_str(self) -> &'static str {
        match self {
            ScalarType::Double => "double",
            ScalarType::Float => "float",
            ScalarType::Int32 => "int32",
            ScalarType::Int64 => "int64",
            ScalarType::Uint32 => "uint32",
            ScalarType::Uint64 => "uint64",
            ScalarType::Sint32 => "sint32",
            ScalarType::Sint64 => "sint64",
            ScalarType::Fixed32 => "fixed32",
            ScalarType::Fixed64 => "fixed64",
            ScalarType::Sfixed32 => "sfixed32",
            ScalarType::Sfixed64 => "sfixed64",
            ScalarType::Bool => "bool",
            ScalarType::String => "string",
            ScalarType::Bytes => "bytes",
        }
    }

    pub fn category(self) -> ScalarCategory {
        match self {
            ScalarType::Double => ScalarCategory::Double,
            ScalarType::Float => ScalarCategory::Float,
            ScalarType::Int32 | ScalarType::Int64 | ScalarType::Uint32 | ScalarType::Uint64 => {
                ScalarCategory::Int
            }
            ScalarType::Sint32 | ScalarType::Sint64 => ScalarCategory::SignedInt,
            ScalarType::Fixed32 | ScalarType::Sfixed32 => ScalarCategory::Fixed32,
            ScalarType::Fixed64 | ScalarType::Sfixed64 => ScalarCategory::Fixed64,
            ScalarType::Bool => ScalarCategory::Bool,
            ScalarType::String | ScalarType::Bytes => ScalarCategory::String,
        }
    }

    /// Native primitive name used in generated signatures.
    pub fn native_type(self) -> &'static str {
        match self {
            ScalarType::Double | ScalarType::Float => "float",
            ScalarType::Bool => "bool",
            ScalarType::String | ScalarType::Bytes => "string",
            _ => NATIVE_INT,
        }
    }
}

impl ScalarCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            ScalarCategory::Double => "double",
            ScalarCategory::Float => "float",
            ScalarCategory::Int => "int",
            ScalarCategory::SignedInt => "signed-int",
            ScalarCategory::Fixed32 => "fixed32",
            ScalarCategory::Fixed64 => "fixed64",
            ScalarCategory::Bool => "bool",
            ScalarCategory::String => "string",
        }
    }

    /// Whether values of this category are carried as integers.
    pub fn is_integer(self) -> bool {
        matches!(
            self,
            ScalarCategory::Int
                | ScalarCategory::SignedInt
                | ScalarCategory::Fixed32
                | ScalarCategory::Fixed64
        )
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for ScalarCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Native primitive that integer scalars and enum values map to.
pub const NATIVE_INT: &str = "int";

/// Map a type tag to its runtime scalar category.
///
/// Returns `None` when the tag is not a wire scalar.
pub fn scalar_category(tag: &str) -> Option<ScalarCategory> {
    ScalarType::from_tag(tag).map(ScalarType::category)
}

/// Map a type tag to its native primitive name.
///
/// Returns `None` when the tag has no native primitive. Today this covers the
/// same tags as [`scalar_category`]; the two lookups stay separate so a
/// primitive-backed non-wire type can be added without renaming callers.
pub fn native_type(tag: &str) -> Option<&'static str> {
    ScalarType::from_tag(tag).map(ScalarType::native_type)
}
