//! # MAAP Snapshot
//!
//! Reconciles a teammate's stored MAAP state (position, assignments,
//! abilities, aspirations) with a submitted set of proposed check-in changes
//! and produces an immutable snapshot document.
//!
//! Pipeline:
//! 1. [`reader::read_current_state`] derives the baseline from stored records
//! 2. [`overlay::parse_overlays`] resolves every payload key to exactly one
//!    [`model::DimensionKey`]
//! 3. [`merge::merge_check_in`] combines one record with its own overlay
//! 4. [`assembler::assemble`] walks the baseline and builds the document
//!
//! [`finalize::FinalizationProcessor`] wraps the pipeline with database
//! loading and snapshot persistence.

pub mod assembler;
pub mod db;
pub mod document;
pub mod finalize;
pub mod merge;
pub mod model;
pub mod overlay;
pub mod reader;

pub use assembler::{assemble, Assembly, AssemblyReport};
pub use document::SnapshotDocument;
pub use finalize::{ready_for_finalization, FinalizationOutcome, FinalizationProcessor, FinalizationRequest};
pub use merge::MergeContext;
pub use model::{DimensionKey, DimensionKind, SubjectRecords, SubjectScope};
