/*!
 * # elandoc - ELAN annotation documents in Rust
 *
 * A library for reading, editing and writing ELAN Annotation Format (EAF)
 * documents: time-aligned tiers of linguistic annotations.
 *
 * ## Features
 *
 * - Import EAF XML (seconds or milliseconds) into an in-memory tier graph
 * - Alignable and referential annotations, hierarchical tiers
 * - Query valid time slots, annotation intervals and display ordering
 * - Create tiers and annotations with automatic time slot reuse
 * - Export back to EAF with stable, monotonically increasing ids
 * - On-demand strict validation of every cross reference
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `elan`: The document model:
 *   - `elan::model`: Time slots, annotations, tiers and the document
 *   - `elan::import`: EAF XML import
 *   - `elan::export`: EAF XML export
 *   - `elan::tree`: Tier hierarchy
 *   - `elan::validation`: Reference validation
 * - `app_config`: Configuration management
 * - `file_utils`: File system operations
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod elan;
pub mod errors;
pub mod file_utils;

// Re-export main types for easier usage
pub use app_config::Config;
pub use elan::{Annotation, AnnotationKind, ElanDocument, Tier, TimeSlot};
pub use errors::{AppError, ElanError};
