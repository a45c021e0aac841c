mod operation;
mod orchestrator;
mod validate;

pub use operation::{
    OperationError, OperationEvent, OperationKey, OperationKind, OperationPhase, OperationState,
    OperationTarget,
};
pub use orchestrator::{CrudOrchestrator, DeleteConfirmation, ImportReport};
pub use validate::{validate_draft, validate_patch};
