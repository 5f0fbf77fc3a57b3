use crate::model::task::{TaskId, ValidationError};
use crate::store::StoreError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type EngineResult<T> = Result<T, EngineError>;

/// Which user operation a remote failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Create,
    Edit,
    Delete,
    Transition,
    Load,
}

impl Display for OperationKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Create => "create",
            Self::Edit => "edit",
            Self::Delete => "delete",
            Self::Transition => "transition",
            Self::Load => "load",
        };
        f.write_str(label)
    }
}

#[derive(Debug)]
pub enum EngineError {
    /// Rejected locally; no remote call was made.
    Validation(ValidationError),
    /// Target record is not in the loaded page.
    NotFound(TaskId),
    /// The remote call failed. Create/edit/transition were rolled back.
    OperationFailed {
        kind: OperationKind,
        source: StoreError,
    },
}

impl EngineError {
    pub fn kind(&self) -> Option<OperationKind> {
        match self {
            Self::OperationFailed { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

impl Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "task {id} is not on the current page"),
            Self::OperationFailed { kind, source } => write!(f, "{kind} failed: {source}"),
        }
    }
}

impl Error for EngineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::NotFound(_) => None,
            Self::OperationFailed { source, .. } => Some(source),
        }
    }
}

impl From<ValidationError> for EngineError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}
