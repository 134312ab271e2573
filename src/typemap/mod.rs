pub mod mssql;
pub mod pg;

use serde::{Deserialize, Serialize};

use crate::schema::TypeId;

/// The outcome of mapping a dialect type to its canonical identifier.
///
/// Mapping never fails: an unknown type yields `identifier: None` together
/// with a human-readable `error` and a `comment` asking for manual handling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappedType {
    pub identifier: Option<TypeId>,
    pub comment: Option<String>,
    pub error: Option<String>,
}

impl MappedType {
    pub fn known(identifier: TypeId) -> Self {
        MappedType {
            identifier: Some(identifier),
            comment: None,
            error: None,
        }
    }

    pub fn unsupported(raw_type: &str, column: &str) -> Self {
        MappedType {
            identifier: None,
            comment: Some(format!(
                "Type '{raw_type}' is not yet supported; column '{column}' needs manual handling."
            )),
            error: Some(format!("Not able to handle type '{raw_type}'")),
        }
    }
}
