/*!
 * Error types for the elandoc library and command line tool.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// What kind of identifier a failed lookup was for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    TimeSlot,
    Annotation,
    Tier,
}

impl std::fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReferenceKind::TimeSlot => write!(f, "time slot"),
            ReferenceKind::Annotation => write!(f, "annotation"),
            ReferenceKind::Tier => write!(f, "tier"),
        }
    }
}

/// Errors that can occur while reading, querying or writing an ELAN document
#[derive(Error, Debug)]
pub enum ElanError {
    /// Required structure is missing from the input document
    #[error("Malformed EAF document: {0}")]
    MalformedDocument(String),

    /// The XML text itself could not be parsed
    #[error("Failed to parse XML: {0}")]
    Parse(#[from] roxmltree::Error),

    /// Writing the XML output failed
    #[error("Failed to serialize EAF: {0}")]
    Serialize(#[from] quick_xml::Error),

    /// Serialized output was not valid UTF-8
    #[error("Serialized EAF is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    /// A TIME_VALUE attribute that is present but not a number
    #[error("Invalid TIME_VALUE '{value}' on time slot {slot_id}")]
    InvalidTimeValue {
        /// Id of the offending time slot
        slot_id: String,
        /// Raw attribute text
        value: String,
    },

    /// An id was referenced but nothing in the document carries it
    #[error("Unresolved {kind} reference: {id}")]
    UnresolvedReference {
        /// What the id was expected to name
        kind: ReferenceKind,
        /// The dangling id
        id: String,
    },

    /// No tier with the given id
    #[error("Tier not found: {0}")]
    TierNotFound(String),

    /// A tier is its own ancestor through PARENT_REF links
    #[error("Cyclic tier hierarchy detected at tier {tier_id}")]
    CyclicTierHierarchy {
        /// A tier that takes part in the cycle
        tier_id: String,
    },
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from the document model
    #[error("Document error: {0}")]
    Elan(#[from] ElanError),

    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::Config(error.to_string())
    }
}
