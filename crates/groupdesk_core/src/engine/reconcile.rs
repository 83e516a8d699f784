//! Child collection reconciler.
//!
//! # Responsibility
//! - Partition an edited collection by change tag.
//! - Apply deletes, then inserts, then re-read the aggregate, then apply
//!   updates against the re-read rows.
//!
//! # Invariants
//! - Unchanged rows and deleted rows that never reached storage issue no
//!   calls.
//! - Insert payloads never carry the row's temporary id; the storage id
//!   replaces it in the working row.
//! - A modified row missing from the re-read collection is a consistency
//!   failure, never silently skipped.

use crate::engine::error::{ConsistencyFailure, SaveError, SaveProgress, SaveStage};
use crate::model::change::ChangeTag;
use crate::model::draft::{AlbumFields, ArtistFields, ChildFields, EditableRecord};
use crate::model::group::{Album, Artist, NewAlbum, NewArtist};
use crate::model::ids::GroupId;
use crate::repo::album_repo::AlbumRepository;
use crate::repo::artist_repo::ArtistRepository;
use crate::repo::common::{EntityKind, RepoError, RepoResult};
use crate::repo::group_repo::MusicGroupRepository;
use log::{error, info};
use std::time::Instant;
use uuid::Uuid;

/// Persistence calls the reconciler needs for one child collection.
pub trait ChildStore<F: ChildFields> {
    /// Creates a child owned by `parent` from its edited fields.
    fn create_child(&self, parent: GroupId, fields: &F) -> RepoResult<F::Record>;
    fn update_child(&self, record: &F::Record) -> RepoResult<F::Record>;
    fn delete_child(&self, id: Uuid) -> RepoResult<()>;
}

impl<A: AlbumRepository + ?Sized> ChildStore<AlbumFields> for A {
    fn create_child(&self, parent: GroupId, fields: &AlbumFields) -> RepoResult<Album> {
        self.create_album(&NewAlbum {
            music_group_id: parent,
            name: fields.name.clone(),
            release_year: fields.release_year,
            copies_sold: fields.copies_sold,
            seeded: false,
        })
    }

    fn update_child(&self, record: &Album) -> RepoResult<Album> {
        self.update_album(record)
    }

    fn delete_child(&self, id: Uuid) -> RepoResult<()> {
        self.delete_album(id)
    }
}

impl<R: ArtistRepository + ?Sized> ChildStore<ArtistFields> for R {
    fn create_child(&self, parent: GroupId, fields: &ArtistFields) -> RepoResult<Artist> {
        self.create_artist(&NewArtist {
            music_group_ids: vec![parent],
            first_name: fields.first_name.clone(),
            last_name: fields.last_name.clone(),
            birth_day: fields.birth_day.clone(),
            seeded: false,
        })
    }

    fn update_child(&self, record: &Artist) -> RepoResult<Artist> {
        self.update_artist(record)
    }

    fn delete_child(&self, id: Uuid) -> RepoResult<()> {
        self.delete_artist(id)
    }
}

/// Calls one reconciliation will issue, derived from row tags alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcilePlan {
    /// Storage ids to delete.
    pub deletes: Vec<Uuid>,
    /// Row positions to create.
    pub inserts: Vec<usize>,
    /// Row positions to update after the re-read.
    pub updates: Vec<usize>,
    /// Deleted rows that never reached storage.
    pub discarded: usize,
}

impl ReconcilePlan {
    /// Partitions `rows` by change tag.
    pub fn for_rows<F>(rows: &[EditableRecord<F>]) -> Self
    where
        F: Clone,
    {
        let mut plan = Self::default();
        for (index, row) in rows.iter().enumerate() {
            match row.tag() {
                ChangeTag::Unchanged => {}
                ChangeTag::Inserted => plan.inserts.push(index),
                ChangeTag::Modified => plan.updates.push(index),
                ChangeTag::Deleted => match row.id().persisted() {
                    Some(id) => plan.deletes.push(id),
                    None => plan.discarded += 1,
                },
            }
        }
        plan
    }

    /// Whether applying the plan would touch storage at all.
    pub fn is_empty(&self) -> bool {
        self.deletes.is_empty() && self.inserts.is_empty() && self.updates.is_empty()
    }
}

/// Reconciles one child collection of the group `parent`.
///
/// Returns the collection as storage now holds it. `rows` is updated in
/// place: inserted rows receive their storage ids.
pub fn reconcile<F, S, G>(
    rows: &mut [EditableRecord<F>],
    parent: GroupId,
    store: &S,
    groups: &G,
) -> Result<Vec<EditableRecord<F>>, SaveError>
where
    F: ChildFields,
    S: ChildStore<F> + ?Sized,
    G: MusicGroupRepository + ?Sized,
{
    let mut progress = SaveProgress::default();
    reconcile_tracked(rows, parent, store, groups, &mut progress)
}

/// Same as [`reconcile`], counting applied mutations into `progress`.
pub fn reconcile_tracked<F, S, G>(
    rows: &mut [EditableRecord<F>],
    parent: GroupId,
    store: &S,
    groups: &G,
    progress: &mut SaveProgress,
) -> Result<Vec<EditableRecord<F>>, SaveError>
where
    F: ChildFields,
    S: ChildStore<F> + ?Sized,
    G: MusicGroupRepository + ?Sized,
{
    let started_at = Instant::now();
    let collection = F::COLLECTION;
    let plan = ReconcilePlan::for_rows(rows);
    info!(
        "event=reconcile module=engine status=start collection={} group_id={} deletes={} inserts={} updates={} discarded={}",
        collection,
        parent,
        plan.deletes.len(),
        plan.inserts.len(),
        plan.updates.len(),
        plan.discarded
    );

    if plan.is_empty() {
        return Ok(rows
            .iter()
            .filter(|row| row.tag().is_visible())
            .cloned()
            .collect());
    }

    let result = apply_plan(&plan, rows, parent, store, groups, progress);
    match &result {
        Ok(fresh) => info!(
            "event=reconcile module=engine status=ok collection={} group_id={} rows={} duration_ms={}",
            collection,
            parent,
            fresh.len(),
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event=reconcile module=engine status=error collection={} group_id={} applied={} duration_ms={} error_code={} error={}",
            collection,
            parent,
            progress.applied(),
            started_at.elapsed().as_millis(),
            err.code(),
            err
        ),
    }
    result
}

fn apply_plan<F, S, G>(
    plan: &ReconcilePlan,
    rows: &mut [EditableRecord<F>],
    parent: GroupId,
    store: &S,
    groups: &G,
    progress: &mut SaveProgress,
) -> Result<Vec<EditableRecord<F>>, SaveError>
where
    F: ChildFields,
    S: ChildStore<F> + ?Sized,
    G: MusicGroupRepository + ?Sized,
{
    let collection = F::COLLECTION;

    for id in &plan.deletes {
        match store.delete_child(*id) {
            Ok(()) => progress.record(),
            Err(err) if err.is_not_found() => {}
            Err(err) => {
                return Err(SaveError::persistence(
                    SaveStage::DeleteChildren(collection),
                    progress,
                    err,
                ))
            }
        }
    }

    for &index in &plan.inserts {
        let created = store
            .create_child(parent, rows[index].current())
            .map_err(|err| {
                SaveError::persistence(SaveStage::InsertChildren(collection), progress, err)
            })?;
        rows[index].assign_persisted_id(F::record_id(&created));
        progress.record();
    }

    // Create/delete responses say nothing about the rest of the collection.
    let group = groups
        .get_group(parent)
        .and_then(|group| group.ok_or(RepoError::not_found(EntityKind::MusicGroup, parent)))
        .map_err(|err| SaveError::persistence(SaveStage::ReloadAggregate, progress, err))?;
    let mut fresh = F::children(&group).to_vec();

    for &index in &plan.updates {
        let row = &rows[index];
        let position = row
            .id()
            .persisted()
            .and_then(|id| fresh.iter().position(|record| F::record_id(record) == id))
            .ok_or_else(|| {
                SaveError::consistency(
                    ConsistencyFailure::ChildVanished {
                        collection,
                        row: row.id(),
                    },
                    progress,
                )
            })?;

        let mut record = fresh[position].clone();
        row.current().overlay(&mut record);
        let updated = store.update_child(&record).map_err(|err| {
            SaveError::persistence(SaveStage::UpdateChildren(collection), progress, err)
        })?;
        progress.record();
        fresh[position] = updated;
    }

    Ok(fresh
        .iter()
        .map(|record| EditableRecord::loaded(F::record_id(record), F::from_record(record)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::ReconcilePlan;
    use crate::model::change::ChangeTag;
    use crate::model::draft::{AlbumFields, EditableRecord};
    use uuid::Uuid;

    fn fields(name: &str) -> AlbumFields {
        AlbumFields {
            name: name.to_string(),
            release_year: 2000,
            copies_sold: 0,
        }
    }

    #[test]
    fn plan_partitions_rows_by_tag() {
        let kept = EditableRecord::loaded(Uuid::new_v4(), fields("kept"));
        let mut removed = EditableRecord::loaded(Uuid::new_v4(), fields("removed"));
        removed.mark_deleted();
        let mut edited = EditableRecord::loaded(Uuid::new_v4(), fields("edited"));
        edited.pending.name = "edited again".to_string();
        edited.mark_modified_if_needed();
        let added = EditableRecord::mark_inserted(fields("added"));
        let removed_id = removed.id().persisted();

        let rows = vec![kept, removed, edited, added];
        let plan = ReconcilePlan::for_rows(&rows);
        assert_eq!(plan.deletes, removed_id.into_iter().collect::<Vec<_>>());
        assert_eq!(plan.updates, vec![2]);
        assert_eq!(plan.inserts, vec![3]);
        assert_eq!(plan.discarded, 0);
    }

    #[test]
    fn deleted_inserted_rows_are_discarded() {
        let mut added = EditableRecord::mark_inserted(fields("short lived"));
        added.mark_deleted();
        assert_eq!(added.tag(), ChangeTag::Deleted);

        let plan = ReconcilePlan::for_rows(&[added]);
        assert!(plan.is_empty());
        assert_eq!(plan.discarded, 1);
    }

    #[test]
    fn unchanged_rows_produce_empty_plan() {
        let rows = vec![
            EditableRecord::loaded(Uuid::new_v4(), fields("a")),
            EditableRecord::loaded(Uuid::new_v4(), fields("b")),
        ];
        assert!(ReconcilePlan::for_rows(&rows).is_empty());
    }
}
