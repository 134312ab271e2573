//! Relational schema introspection.
//!
//! A [`Connector`] drives one introspection run over an injected
//! [`DialectDriver`] and returns a normalized [`IntrospectionResult`]:
//! tables, columns mapped to canonical [`TypeId`]s, indices in catalog order,
//! and foreign-key relations.

pub mod cli;
pub mod connector;
pub mod defaults;
pub mod dialect;
pub mod error;
pub mod introspect;
pub mod registry;
pub mod result;
pub mod schema;
#[cfg(test)]
mod testutil;
pub mod typemap;

pub use connector::{Connector, IntrospectOptions};
pub use dialect::Dialect;
pub use error::{IntrospectError, QueryError, Step};
pub use introspect::DialectDriver;
pub use registry::DialectRegistry;
pub use schema::{
    Cardinality, Column, EnumType, Index, IntrospectionResult, Relation, Table, TypeId,
};
