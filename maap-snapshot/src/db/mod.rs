//! Database access for subject records and stored snapshots

pub mod records;
pub mod snapshots;

pub use records::load_subject_records;
pub use snapshots::{
    build_snapshot_row, insert_snapshot, list_snapshots, load_snapshot, SnapshotMeta,
    StoredSnapshot,
};
