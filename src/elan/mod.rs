/*!
 * ELAN annotation document model.
 *
 * - `model`: time slots, annotations, tiers and the owning document
 * - `ids`: id minting and counter resync
 * - `import`: EAF XML to document
 * - `export`: document to EAF XML
 * - `tree`: parent/child tier hierarchy
 * - `validation`: on-demand reference checking
 */

pub mod export;
pub mod ids;
pub mod import;
pub mod model;
pub mod tree;
pub mod validation;

pub use export::{ExportOptions, EAF_URN};
pub use ids::{IdCounters, IdKind};
pub use import::{ImportOptions, ImportSummary};
pub use model::{AlignedAnnotation, Annotation, AnnotationKind, DocumentSummary, ElanDocument, Tier, TimeSlot};
pub use tree::{tier_tree, TierNode};
pub use validation::{validate_references, ReferenceIssue, ValidationReport};
