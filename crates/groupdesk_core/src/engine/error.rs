//! Save failures and save progress tracking.

use crate::model::draft::ChildCollection;
use crate::model::ids::RowId;
use crate::repo::common::RepoError;
use crate::validation::ValidationReport;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Step of a save during which a persistence call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStage {
    CreateGroup,
    DeleteChildren(ChildCollection),
    InsertChildren(ChildCollection),
    ReloadAggregate,
    UpdateChildren(ChildCollection),
    UpdateGroup,
}

impl Display for SaveStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CreateGroup => write!(f, "create_group"),
            Self::DeleteChildren(collection) => write!(f, "delete_{collection}"),
            Self::InsertChildren(collection) => write!(f, "insert_{collection}"),
            Self::ReloadAggregate => write!(f, "reload_aggregate"),
            Self::UpdateChildren(collection) => write!(f, "update_{collection}"),
            Self::UpdateGroup => write!(f, "update_group"),
        }
    }
}

/// The working aggregate disagrees with what storage holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsistencyFailure {
    /// The draft claims to exist in storage but carries no group id.
    MissingGroupId,
    /// A modified row is absent from the re-read collection.
    ChildVanished {
        collection: ChildCollection,
        row: RowId,
    },
}

impl Display for ConsistencyFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingGroupId => write!(f, "existing group has no identifier"),
            Self::ChildVanished { collection, row } => {
                write!(f, "modified row {row} no longer exists in {collection}")
            }
        }
    }
}

/// Count of mutations committed so far in one save.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveProgress {
    applied: usize,
}

impl SaveProgress {
    pub fn applied(&self) -> usize {
        self.applied
    }

    pub(crate) fn record(&mut self) {
        self.applied += 1;
    }
}

/// Terminal failure of a save.
///
/// Mutations counted in `applied_mutations` stay applied: storage offers no
/// transaction across calls and the engine does not compensate.
#[derive(Debug)]
pub enum SaveError {
    /// Fields relevant to the save failed validation; storage untouched.
    Validation(ValidationReport),
    Consistency {
        failure: ConsistencyFailure,
        applied_mutations: usize,
    },
    Persistence {
        stage: SaveStage,
        applied_mutations: usize,
        source: RepoError,
    },
}

impl SaveError {
    pub(crate) fn persistence(
        stage: SaveStage,
        progress: &SaveProgress,
        source: RepoError,
    ) -> Self {
        Self::Persistence {
            stage,
            applied_mutations: progress.applied(),
            source,
        }
    }

    pub(crate) fn consistency(failure: ConsistencyFailure, progress: &SaveProgress) -> Self {
        Self::Consistency {
            failure,
            applied_mutations: progress.applied(),
        }
    }

    /// Mutations that reached storage before the failure.
    pub fn applied_mutations(&self) -> usize {
        match self {
            Self::Validation(_) => 0,
            Self::Consistency {
                applied_mutations, ..
            }
            | Self::Persistence {
                applied_mutations, ..
            } => *applied_mutations,
        }
    }

    /// Whether storage may now hold a half-saved aggregate.
    pub fn is_partial(&self) -> bool {
        self.applied_mutations() > 0
    }

    /// Stable machine-readable code for logs.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_failed",
            Self::Consistency { .. } => "consistency_failed",
            Self::Persistence { .. } => "persistence_failed",
        }
    }
}

impl Display for SaveError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(report) => write!(f, "{report}"),
            Self::Consistency {
                failure,
                applied_mutations,
            } => write!(
                f,
                "save incomplete after {applied_mutations} applied change(s): {failure}"
            ),
            Self::Persistence {
                stage,
                applied_mutations,
                source,
            } => write!(
                f,
                "save incomplete: {stage} failed after {applied_mutations} applied change(s): {source}"
            ),
        }
    }
}

impl Error for SaveError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(report) => Some(report),
            Self::Consistency { .. } => None,
            Self::Persistence { source, .. } => Some(source),
        }
    }
}

impl From<ValidationReport> for SaveError {
    fn from(value: ValidationReport) -> Self {
        Self::Validation(value)
    }
}
