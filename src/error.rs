//! Failure modes of event selection
//!
//! Configuration and schema errors abort the processing of a whole chunk of
//! events, since they indicate systematic misuse rather than a per-event data
//! problem. Events which lack the objects that a predicate depends on are not
//! errors: they are absorbed via dummy values and vacuous truth, and merely
//! reported as [`DegenerateEvents`].

use std::path::PathBuf;
use thiserror::Error;

/// Errors which can occur while configuring or running a selection
#[derive(Debug, Error)]
pub enum SelectionError {
    /// A configuration key is missing, malformed or out of range
    #[error("invalid configuration of `{key}`: {reason}")]
    Configuration {
        /// Dotted path of the offending configuration key
        key: String,
        /// What is wrong with it
        reason: String,
    },

    /// The event table lacks a collection or attribute which is required
    #[error("event table has no {}", describe_missing(.collection, .attribute.as_deref()))]
    SchemaMismatch {
        /// Name of the collection (or per-event record) which was looked up
        collection: String,
        /// Attribute of that collection, if the collection itself exists
        attribute: Option<String>,
    },

    /// A per-event field was looked up but never added
    #[error("event table has no field `{name}`")]
    MissingField {
        /// Name of the field
        name: String,
    },

    /// An augmentation tried to replace a collection that was ingested
    #[error("refusing to overwrite source collection `{name}`")]
    ReservedName {
        /// Name of the source collection
        name: String,
    },

    /// A channel tried to replace a collection or field of another channel
    #[error("`{name}` belongs to channel `{owner}`, `{writer}` needs another field prefix")]
    NameCollision {
        /// Name of the collection or field
        name: String,
        /// Channel which wrote it first
        owner: String,
        /// Channel which tried to replace it
        writer: String,
    },

    /// A file could not be read
    #[error("failed to read {}", .path.display())]
    Io {
        /// Path of the file
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// A configuration file could not be parsed
    #[error("failed to parse configuration file {}", .path.display())]
    ConfigSyntax {
        /// Path of the file
        path: PathBuf,
        /// Underlying parse failure
        #[source]
        source: toml::de::Error,
    },

    /// An event file could not be parsed
    #[error("failed to parse event file {}", .path.display())]
    EventSyntax {
        /// Path of the file
        path: PathBuf,
        /// Underlying parse failure
        #[source]
        source: serde_json::Error,
    },
}
//
impl SelectionError {
    /// Shorthand for building a configuration error
    pub fn config(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Configuration {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for reporting a missing collection
    pub fn missing_collection(collection: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            collection: collection.into(),
            attribute: None,
        }
    }

    /// Shorthand for reporting a missing attribute of a collection
    pub fn missing_attribute(collection: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            collection: collection.into(),
            attribute: Some(attribute.into()),
        }
    }
}

fn describe_missing(collection: &str, attribute: Option<&str>) -> String {
    match attribute {
        Some(attribute) => format!("attribute `{attribute}` in collection `{collection}`"),
        None => format!("collection `{collection}`"),
    }
}

/// Crate-wide result type
pub type Result<T> = std::result::Result<T, SelectionError>;

/// Non-fatal report of events lacking objects that a predicate depends on
///
/// Such events are handled through the dummy value and vacuous truth
/// conventions, and never interrupt the computation.
///
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DegenerateEvents {
    /// Collection which was empty
    pub collection: String,
    /// Number of events where it was empty
    pub num_events: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_culprit() {
        let err = SelectionError::missing_attribute("Electron", "dxy");
        assert_eq!(
            err.to_string(),
            "event table has no attribute `dxy` in collection `Electron`"
        );
        let err = SelectionError::missing_collection("GenPart");
        assert_eq!(err.to_string(), "event table has no collection `GenPart`");
        let err = SelectionError::MissingField {
            name: "nGoodAK4jets".to_owned(),
        };
        assert_eq!(err.to_string(), "event table has no field `nGoodAK4jets`");
        let err = SelectionError::NameCollision {
            name: "category".to_owned(),
            owner: "semileptonic".to_owned(),
            writer: "fhsl".to_owned(),
        };
        assert_eq!(
            err.to_string(),
            "`category` belongs to channel `semileptonic`, `fhsl` needs another field prefix"
        );
        let err = SelectionError::config("fhsl.jets.pt", "must be finite");
        assert_eq!(
            err.to_string(),
            "invalid configuration of `fhsl.jets.pt`: must be finite"
        );
    }
}
