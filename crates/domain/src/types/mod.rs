//! Domain types and models

pub mod assignment;
pub mod oplog;
pub mod project;
pub mod status;
pub mod task;

// Re-export entity types for convenience
pub use assignment::{
    AssignmentActuals, AssignmentKey, EbsResourceAssignment, NewEbsAssignment,
    P6ResourceAssignment,
};
pub use oplog::{NewSyncOperation, SyncOperation, SyncOperationStatus, SyncOperationUpdate};
pub use project::{
    EbsProject, EbsProjectFields, EpsNode, NewP6Project, ObsNode, P6Project, P6ProjectFields,
};
pub use status::{EbsStatus, P6Status};
pub use task::{
    EbsTask, EbsTaskFields, NewWbsNode, P6Activity, TaskProgressUpdate, WbsFields, WbsNode,
};
