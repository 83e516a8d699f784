//! Group edit use-cases: begin, save and undo an edit session.
//!
//! # Responsibility
//! - Hand out working drafts for new and existing groups.
//! - Persist a draft as one ordered call sequence across the group, album
//!   and artist repositories.
//! - Throw away staged edits by re-reading the aggregate.
//!
//! # Invariants
//! - Validation failures reach no repository and leave the draft intact.
//! - A new group is created before any child call so children can carry
//!   its id.
//! - Albums are reconciled before artists; the group row is updated last.
//! - A failed save is not compensated; the error says how much was applied.

use crate::engine::error::{ConsistencyFailure, SaveError, SaveProgress, SaveStage};
use crate::engine::reconcile::{reconcile_tracked, ChildStore};
use crate::model::draft::{AlbumFields, ArtistFields, ChildFields, GroupDraft};
use crate::model::group::{MusicGroup, NewMusicGroup};
use crate::model::ids::GroupId;
use crate::repo::album_repo::AlbumRepository;
use crate::repo::artist_repo::ArtistRepository;
use crate::repo::common::{EntityKind, RepoError};
use crate::repo::group_repo::MusicGroupRepository;
use crate::validation::{validate_partial, FieldPath, ValidationRules};
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Whether a save created the group or edited an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveKind {
    Created,
    Updated,
}

impl SaveKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
        }
    }
}

/// Result of a successful save.
///
/// Both kinds continue into the view flow of `group_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOutcome {
    pub group_id: GroupId,
    pub kind: SaveKind,
    /// Aggregate as storage holds it after the final group update.
    pub group: MusicGroup,
}

/// Errors from loading a draft.
#[derive(Debug)]
pub enum GroupEditError {
    /// Target group does not exist.
    GroupNotFound(GroupId),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for GroupEditError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GroupNotFound(group_id) => write!(f, "music group not found: {group_id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for GroupEditError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::GroupNotFound(_) => None,
        }
    }
}

impl From<RepoError> for GroupEditError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound {
                entity: EntityKind::MusicGroup,
                id,
            } => Self::GroupNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Edit session facade over the three persistence services.
pub struct GroupEditService<G, A, R>
where
    G: MusicGroupRepository,
    A: AlbumRepository,
    R: ArtistRepository,
{
    groups: G,
    albums: A,
    artists: R,
}

impl<G, A, R> GroupEditService<G, A, R>
where
    G: MusicGroupRepository,
    A: AlbumRepository,
    R: ArtistRepository,
{
    /// Creates a service using the provided repository implementations.
    pub fn new(groups: G, albums: A, artists: R) -> Self {
        Self {
            groups,
            albums,
            artists,
        }
    }

    /// Opens an edit session.
    ///
    /// `None` yields an empty draft for a new group with no genre picked.
    pub fn begin_edit(&self, group_id: Option<GroupId>) -> Result<GroupDraft, GroupEditError> {
        match group_id {
            Some(group_id) => self.load_draft(group_id),
            None => Ok(GroupDraft::new_group()),
        }
    }

    /// Discards every staged edit and returns a draft of the stored group.
    pub fn undo(&self, group_id: GroupId) -> Result<GroupDraft, GroupEditError> {
        let draft = self.load_draft(group_id)?;
        info!(
            "event=group_undo module=service status=ok group_id={} albums={} artists={}",
            group_id,
            draft.albums().len(),
            draft.artists().len()
        );
        Ok(draft)
    }

    /// Persists `draft`.
    ///
    /// On success `draft` mirrors the stored aggregate and every row is
    /// `Unchanged`. On validation failure `draft` is untouched. On any other
    /// failure `draft` keeps the ids already assigned by storage.
    pub fn save(
        &self,
        draft: &mut GroupDraft,
        rules: &ValidationRules,
    ) -> Result<SaveOutcome, SaveError> {
        let started_at = Instant::now();
        let kind = if draft.is_new() {
            SaveKind::Created
        } else {
            SaveKind::Updated
        };
        info!(
            "event=group_save module=service status=start kind={} albums={} artists={}",
            kind.as_str(),
            draft.albums().len(),
            draft.artists().len()
        );

        let mut progress = SaveProgress::default();
        let result = self.save_inner(draft, rules, kind, &mut progress);
        match &result {
            Ok(outcome) => info!(
                "event=group_save module=service status=ok kind={} group_id={} applied={} duration_ms={}",
                outcome.kind.as_str(),
                outcome.group_id,
                progress.applied(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=group_save module=service status=error kind={} applied={} partial={} duration_ms={} error_code={} error={}",
                kind.as_str(),
                err.applied_mutations(),
                err.is_partial(),
                started_at.elapsed().as_millis(),
                err.code(),
                err
            ),
        }
        result
    }

    fn save_inner(
        &self,
        draft: &mut GroupDraft,
        rules: &ValidationRules,
        kind: SaveKind,
        progress: &mut SaveProgress,
    ) -> Result<SaveOutcome, SaveError> {
        let report = validate_partial(draft, &FieldPath::group_save(), rules);
        let genre = match (report.is_ok(), draft.genre) {
            (true, Some(genre)) => genre,
            _ => return Err(SaveError::Validation(report)),
        };

        let group_id = match kind {
            SaveKind::Created => {
                let created = self
                    .groups
                    .create_group(&NewMusicGroup {
                        name: draft.name.clone(),
                        established_year: draft.established_year,
                        genre,
                        seeded: false,
                    })
                    .map_err(|err| SaveError::persistence(SaveStage::CreateGroup, progress, err))?;
                progress.record();
                draft.assign_group_id(created.group_id);
                created.group_id
            }
            SaveKind::Updated => draft.group_id().ok_or_else(|| {
                SaveError::consistency(ConsistencyFailure::MissingGroupId, progress)
            })?,
        };

        self.reconcile_rows::<AlbumFields, _>(draft, group_id, &self.albums, progress)?;
        self.reconcile_rows::<ArtistFields, _>(draft, group_id, &self.artists, progress)?;

        let mut fresh = self
            .groups
            .get_group(group_id)
            .and_then(|group| {
                group.ok_or(RepoError::not_found(EntityKind::MusicGroup, group_id))
            })
            .map_err(|err| SaveError::persistence(SaveStage::ReloadAggregate, progress, err))?;
        fresh.name = draft.name.clone();
        fresh.established_year = draft.established_year;
        fresh.genre = genre;

        let saved = self
            .groups
            .update_group(&fresh)
            .map_err(|err| SaveError::persistence(SaveStage::UpdateGroup, progress, err))?;
        progress.record();

        *draft = GroupDraft::from_group(&saved);
        Ok(SaveOutcome {
            group_id,
            kind,
            group: saved,
        })
    }

    fn reconcile_rows<F, S>(
        &self,
        draft: &mut GroupDraft,
        group_id: GroupId,
        store: &S,
        progress: &mut SaveProgress,
    ) -> Result<(), SaveError>
    where
        F: ChildFields,
        S: ChildStore<F>,
    {
        let rows = F::rows_mut(draft);
        let fresh =
            reconcile_tracked(rows.as_mut_slice(), group_id, store, &self.groups, progress)?;
        *rows = fresh;
        Ok(())
    }

    fn load_draft(&self, group_id: GroupId) -> Result<GroupDraft, GroupEditError> {
        let group = self
            .groups
            .get_group(group_id)?
            .ok_or(GroupEditError::GroupNotFound(group_id))?;
        Ok(GroupDraft::from_group(&group))
    }
}

#[cfg(test)]
mod tests {
    use super::{GroupEditError, SaveKind};
    use crate::repo::common::{EntityKind, RepoError};
    use uuid::Uuid;

    #[test]
    fn group_not_found_maps_from_repo_error() {
        let id = Uuid::new_v4();
        let err = GroupEditError::from(RepoError::not_found(EntityKind::MusicGroup, id));
        assert!(matches!(err, GroupEditError::GroupNotFound(found) if found == id));
    }

    #[test]
    fn child_not_found_stays_a_repo_error() {
        let err = GroupEditError::from(RepoError::not_found(EntityKind::Album, Uuid::new_v4()));
        assert!(matches!(err, GroupEditError::Repo(_)));
    }

    #[test]
    fn save_kind_text_form() {
        assert_eq!(SaveKind::Created.as_str(), "created");
        assert_eq!(SaveKind::Updated.as_str(), "updated");
    }
}
