//! Field descriptor model for Protocol Buffer code generators.
//!
//! `proto-field-model` is the shared vocabulary between a schema loader and
//! the code emitters that turn `.proto` messages into data-access classes.
//! Emitters never look at raw type tags; they ask a [`FieldDescriptor`] what
//! a field is.
//!
//! # Features
//!
//! - Scalar type table: wire tag → runtime category and native primitive
//! - Enum and message references resolved into a closed [`TypeDescriptor`]
//! - Target type name resolution (scalar, enum as `int`, message by name)
//! - Accessor (`FooBar`) and constant (`FOO_BAR`) name derivation
//! - Typed default values checked against the field's target type
//! - A reference JSON loader with `protoc`-style scope resolution
//!
//! # Usage
//!
//! ```no_run
//! use std::path::Path;
//!
//! let schema = proto_field_model::schema::load_schema(Path::new("addressbook.json"))?;
//! for message in schema.messages() {
//!     for field in message.fields() {
//!         println!(
//!             "{}: const {} = {}; get{}() -> {}",
//!             message.full_name(),
//!             field.const_name(),
//!             field.number(),
//!             field.camel_case_name(),
//!             field.type_name(),
//!         );
//!     }
//! }
//! # Ok::<(), proto_field_model::error::Error>(())
//! ```
//!
//! [`FieldDescriptor`]: descriptor::FieldDescriptor
//! [`TypeDescriptor`]: descriptor::TypeDescriptor

pub mod descriptor;
pub mod error;
pub mod naming;
pub mod schema;
pub mod type_map;
