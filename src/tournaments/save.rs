//! Saving a whole tournament tree.
//!
//! A save runs in two passes over a fixed sequence of stages. The first
//! pass sanitizes and validates every stage without touching the store, so
//! a single bad record anywhere in the tree means nothing is written. The
//! second pass reconciles each stage against what was stored before:
//! updates and creates in stage order, then deletes in reverse stage order,
//! stopping at the first store error.

use std::{collections::HashSet, fmt};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    reconcile::write_changes,
    record::Record,
    store::{RecordStore, StoreError, TreeStore},
    tournaments::{
        SquadEntries, TmntTree, Tournament,
        brackets::Bracket,
        divisions::Division,
        eliminations::Elimination,
        entries::{DivEntry, ElimEntry},
        events::Event,
        lanes::{Lane, lanes_match_squad},
        players::{Player, validate_players},
        pots::Pot,
        sanitize_tmnt,
        squads::Squad,
        validate_opt_tmnt,
    },
    validation::{ErrorCode, validate_records},
};

/// One collection (or the tournament itself) in the order trees are saved.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum Stage {
    Tmnt,
    Events,
    Divs,
    Squads,
    Lanes,
    Pots,
    Brkts,
    Elims,
    Players,
    DivEntries,
    ElimEntries,
}

impl Stage {
    /// Stages of [`save_all_data_for_tmnt`], parents before children.
    pub const SAVE_ORDER: [Stage; 8] = [
        Stage::Tmnt,
        Stage::Events,
        Stage::Divs,
        Stage::Squads,
        Stage::Lanes,
        Stage::Pots,
        Stage::Brkts,
        Stage::Elims,
    ];

    /// Stages of [`save_squad_entries`].
    pub const ENTRY_ORDER: [Stage; 3] =
        [Stage::Players, Stage::DivEntries, Stage::ElimEntries];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Tmnt => "tmnt",
            Stage::Events => "events",
            Stage::Divs => "divs",
            Stage::Squads => "squads",
            Stage::Lanes => "lanes",
            Stage::Pots => "pots",
            Stage::Brkts => "brkts",
            Stage::Elims => "elims",
            Stage::Players => "players",
            Stage::DivEntries => "divEntries",
            Stage::ElimEntries => "elimEntries",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum SaveError {
    /// A stage failed validation. Nothing was written.
    #[error("{stage} failed validation: {code}")]
    Invalid { stage: Stage, code: ErrorCode },
    /// The store failed while a stage was being written.
    #[error("could not save {stage}: {source}")]
    Io { stage: Stage, source: StoreError },
}

impl SaveError {
    pub fn stage(&self) -> Stage {
        match self {
            SaveError::Invalid { stage, .. } | SaveError::Io { stage, .. } => {
                *stage
            }
        }
    }
}

fn at(stage: Stage) -> impl FnOnce(StoreError) -> SaveError {
    move |source| SaveError::Io { stage, source }
}

fn invalid(stage: Stage, code: ErrorCode) -> SaveError {
    tracing::debug!(%stage, %code, "stage rejected");
    SaveError::Invalid { stage, code }
}

fn ids<R: Record>(records: &[R]) -> HashSet<&str> {
    records.iter().map(Record::id).collect()
}

/// Sanitizes and validates one stage, a batch per parent. With `parents`
/// given, every parent has to be one of them.
fn check<R: Record>(
    stage: Stage,
    records: &[R],
    parents: Option<&HashSet<&str>>,
) -> Result<Vec<R>, SaveError> {
    let sanitized = records.iter().map(R::sanitized).collect::<Vec<_>>();

    let mut batches: IndexMap<&str, Vec<R>> = IndexMap::new();
    for record in &sanitized {
        batches
            .entry(record.parent_id())
            .or_default()
            .push(record.clone());
    }

    for (parent_id, batch) in &batches {
        let validated = validate_records(batch);
        if !validated.is_ok() {
            return Err(invalid(stage, validated.error_code));
        }
        if parents.is_some_and(|parents| !parents.contains(parent_id)) {
            tracing::debug!(%stage, parent_id, "parent is not part of the tree");
            return Err(invalid(stage, ErrorCode::InvalidData));
        }
    }

    Ok(sanitized)
}

/// Checks references other than the parent (a pot's division, say).
fn check_refs<'a>(
    stage: Stage,
    mut refs: impl Iterator<Item = &'a str>,
    known: &HashSet<&str>,
) -> Result<(), SaveError> {
    match refs.find(|id| !known.contains(id)) {
        Some(id) => {
            tracing::debug!(%stage, id, "reference to a record outside the tree");
            Err(invalid(stage, ErrorCode::InvalidData))
        }
        None => Ok(()),
    }
}

/// The first pass: the sanitized tree, or the first stage that is wrong.
fn validate_tree(
    original: &TmntTree,
    current: &TmntTree,
) -> Result<(Tournament, TmntTree), SaveError> {
    let Some(tmnt) = current.tmnt.as_ref().map(sanitize_tmnt) else {
        return Err(invalid(Stage::Tmnt, validate_opt_tmnt(None)));
    };
    let code = validate_opt_tmnt(Some(&tmnt));
    if !code.is_ok() {
        return Err(invalid(Stage::Tmnt, code));
    }
    if original.tmnt_id().is_some_and(|id| id != tmnt.id) {
        return Err(invalid(Stage::Tmnt, ErrorCode::InvalidData));
    }

    let tmnt_ids = HashSet::from([tmnt.id.as_str()]);
    let events = check(Stage::Events, &current.events, Some(&tmnt_ids))?;
    let divs = check(Stage::Divs, &current.divs, Some(&tmnt_ids))?;
    let event_ids = ids(&events);
    let div_ids = ids(&divs);

    let squads = check(Stage::Squads, &current.squads, Some(&event_ids))?;
    let squad_ids = ids(&squads);

    let lanes = check(Stage::Lanes, &current.lanes, Some(&squad_ids))?;
    for squad in &squads {
        let own = lanes
            .iter()
            .filter(|lane| lane.squad_id == squad.id)
            .cloned()
            .collect::<Vec<_>>();
        if !lanes_match_squad(squad, &own) {
            tracing::debug!(squad = %squad.id, "lanes don't cover the squad");
            return Err(invalid(Stage::Lanes, ErrorCode::InvalidData));
        }
    }

    let pots = check(Stage::Pots, &current.pots, Some(&squad_ids))?;
    check_refs(Stage::Pots, pots.iter().map(|pot| pot.div_id.as_str()), &div_ids)?;

    let brkts = check(Stage::Brkts, &current.brkts, Some(&squad_ids))?;
    check_refs(
        Stage::Brkts,
        brkts.iter().map(|brkt| brkt.div_id.as_str()),
        &div_ids,
    )?;

    let elims = check(Stage::Elims, &current.elims, Some(&squad_ids))?;
    check_refs(
        Stage::Elims,
        elims.iter().map(|elim| elim.div_id.as_str()),
        &div_ids,
    )?;

    let tree = TmntTree {
        tmnt: Some(tmnt.clone()),
        events,
        divs,
        squads,
        lanes,
        pots,
        brkts,
        elims,
    };
    Ok((tmnt, tree))
}

/// Writes the tournament itself. Returns the stored tournament and whether
/// this call created it.
fn write_tmnt<S: TreeStore + ?Sized>(
    store: &mut S,
    tmnt: &Tournament,
    original: &TmntTree,
) -> Result<(Tournament, bool), SaveError> {
    match &original.tmnt {
        None => RecordStore::<Tournament>::post(store, tmnt)
            .map(|stored| (stored, true))
            .map_err(at(Stage::Tmnt)),
        Some(stored) if stored == tmnt => Ok((tmnt.clone(), false)),
        Some(_) => RecordStore::<Tournament>::put(store, tmnt)
            .map(|stored| (stored, false))
            .map_err(at(Stage::Tmnt)),
    }
}

/// The second pass: writes every collection in stage order, then deletes
/// what was removed in reverse stage order.
///
/// Removed children are deleted (or have been moved) before their parent
/// goes, so deleting a parent never takes an edited child with it.
fn write_collections<S: TreeStore + ?Sized>(
    store: &mut S,
    tmnt: Tournament,
    original: &TmntTree,
    current: &TmntTree,
) -> Result<TmntTree, SaveError> {
    let mut events = write_changes(store, &original.events, &current.events)
        .map_err(at(Stage::Events))?;
    let mut divs = write_changes(store, &original.divs, &current.divs)
        .map_err(at(Stage::Divs))?;
    let mut squads = write_changes(store, &original.squads, &current.squads)
        .map_err(at(Stage::Squads))?;
    let mut lanes = write_changes(store, &original.lanes, &current.lanes)
        .map_err(at(Stage::Lanes))?;
    let mut pots = write_changes(store, &original.pots, &current.pots)
        .map_err(at(Stage::Pots))?;
    let mut brkts = write_changes(store, &original.brkts, &current.brkts)
        .map_err(at(Stage::Brkts))?;
    let mut elims = write_changes(store, &original.elims, &current.elims)
        .map_err(at(Stage::Elims))?;

    elims.delete_removed(store).map_err(at(Stage::Elims))?;
    brkts.delete_removed(store).map_err(at(Stage::Brkts))?;
    pots.delete_removed(store).map_err(at(Stage::Pots))?;
    lanes.delete_removed(store).map_err(at(Stage::Lanes))?;
    squads.delete_removed(store).map_err(at(Stage::Squads))?;
    divs.delete_removed(store).map_err(at(Stage::Divs))?;
    events.delete_removed(store).map_err(at(Stage::Events))?;

    Ok(TmntTree {
        tmnt: Some(tmnt),
        events: events.finish().records,
        divs: divs.finish().records,
        squads: squads.finish().records,
        lanes: lanes.finish().records,
        pots: pots.finish().records,
        brkts: brkts.finish().records,
        elims: elims.finish().records,
    })
}

/// Saves `current`, given that `original` is what the store holds (a blank
/// tree for a tournament which has never been saved).
///
/// Either the whole tree is valid and gets written, or
/// [`SaveError::Invalid`] names the first stage which isn't and the store is
/// left alone. If the store fails part way through a save which created the
/// tournament, whatever was written is deleted again (as far as the store
/// lets us). A tournament this call didn't create is never deleted: a failed
/// edit is reported as it is, and saving the same trees again picks up
/// where it stopped.
#[tracing::instrument(skip_all, fields(tmnt_id = current.tmnt_id()))]
pub fn save_all_data_for_tmnt<S: TreeStore + ?Sized>(
    store: &mut S,
    original: &TmntTree,
    current: &TmntTree,
) -> Result<TmntTree, SaveError> {
    let (tmnt, checked) = validate_tree(original, current)?;

    let (stored, created) = write_tmnt(store, &tmnt, original).inspect_err(
        |err| tracing::warn!(%err, "tournament save failed"),
    )?;

    match write_collections(store, stored, original, &checked) {
        Ok(saved) => {
            tracing::info!("saved tournament");
            Ok(saved)
        }
        Err(err) => {
            tracing::warn!(%err, "tournament save failed");
            if created {
                if let Err(cleanup) = delete_all_data_for_tmnt(store, &tmnt.id) {
                    tracing::error!(
                        %cleanup,
                        "could not remove partly saved tournament"
                    );
                }
            }
            Err(err)
        }
    }
}

/// How many records of each kind [`delete_all_data_for_tmnt`] removed.
#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeleteCounts {
    pub elim_entries: usize,
    pub elims: usize,
    pub brkts: usize,
    pub pots: usize,
    pub lanes: usize,
    pub div_entries: usize,
    pub players: usize,
    pub squads: usize,
    pub divs: usize,
    pub events: usize,
    pub tmnts: usize,
}

impl DeleteCounts {
    pub fn total(&self) -> usize {
        self.elim_entries
            + self.elims
            + self.brkts
            + self.pots
            + self.lanes
            + self.div_entries
            + self.players
            + self.squads
            + self.divs
            + self.events
            + self.tmnts
    }
}

fn children<R, S>(
    store: &mut S,
    stage: Stage,
    parent_ids: &[String],
) -> Result<Vec<R>, SaveError>
where
    R: Record,
    S: RecordStore<R> + ?Sized,
{
    let mut records = Vec::new();
    for parent_id in parent_ids {
        records.extend(store.get_many(parent_id).map_err(at(stage))?);
    }
    Ok(records)
}

fn purge<R, S>(
    store: &mut S,
    stage: Stage,
    parent_ids: &[String],
) -> Result<usize, SaveError>
where
    R: Record,
    S: RecordStore<R> + ?Sized,
{
    let mut deleted = 0;
    for parent_id in parent_ids {
        deleted += store.delete_many(parent_id).map_err(at(stage))?;
    }
    Ok(deleted)
}

fn owned_ids<R: Record>(records: &[R]) -> Vec<String> {
    records.iter().map(|record| record.id().to_string()).collect()
}

/// Deletes a tournament and everything under it, children before parents.
/// Deleting a tournament which doesn't exist (or has already been partly
/// deleted) is not an error.
#[tracing::instrument(skip(store))]
pub fn delete_all_data_for_tmnt<S: TreeStore + ?Sized>(
    store: &mut S,
    tmnt_id: &str,
) -> Result<DeleteCounts, SaveError> {
    let tmnt_ids = [tmnt_id.to_string()];
    let event_ids =
        owned_ids(&children::<Event, _>(store, Stage::Events, &tmnt_ids)?);
    let div_ids = owned_ids(&children::<Division, _>(store, Stage::Divs, &tmnt_ids)?);
    let squad_ids =
        owned_ids(&children::<Squad, _>(store, Stage::Squads, &event_ids)?);
    let elim_ids =
        owned_ids(&children::<Elimination, _>(store, Stage::Elims, &squad_ids)?);

    let counts = DeleteCounts {
        elim_entries: purge::<ElimEntry, _>(store, Stage::ElimEntries, &elim_ids)?,
        elims: purge::<Elimination, _>(store, Stage::Elims, &squad_ids)?,
        brkts: purge::<Bracket, _>(store, Stage::Brkts, &squad_ids)?,
        pots: purge::<Pot, _>(store, Stage::Pots, &squad_ids)?,
        lanes: purge::<Lane, _>(store, Stage::Lanes, &squad_ids)?,
        div_entries: purge::<DivEntry, _>(store, Stage::DivEntries, &div_ids)?,
        players: purge::<Player, _>(store, Stage::Players, &squad_ids)?,
        squads: purge::<Squad, _>(store, Stage::Squads, &event_ids)?,
        divs: purge::<Division, _>(store, Stage::Divs, &tmnt_ids)?,
        events: purge::<Event, _>(store, Stage::Events, &tmnt_ids)?,
        tmnts: RecordStore::<Tournament>::delete(store, tmnt_id)
            .map_err(at(Stage::Tmnt))?,
    };
    tracing::info!(deleted = counts.total(), "deleted tournament");
    Ok(counts)
}

/// Reads a stored tournament back as a tree.
#[tracing::instrument(skip(store))]
pub fn load_all_data_for_tmnt<S: TreeStore + ?Sized>(
    store: &mut S,
    tmnt_id: &str,
) -> Result<TmntTree, SaveError> {
    let tmnt =
        RecordStore::<Tournament>::get(store, tmnt_id).map_err(at(Stage::Tmnt))?;
    let tmnt_ids = [tmnt.id.clone()];
    let events = children::<Event, _>(store, Stage::Events, &tmnt_ids)?;
    let divs = children::<Division, _>(store, Stage::Divs, &tmnt_ids)?;
    let squads = children::<Squad, _>(store, Stage::Squads, &owned_ids(&events))?;
    let squad_ids = owned_ids(&squads);

    Ok(TmntTree {
        tmnt: Some(tmnt),
        events,
        divs,
        lanes: children(store, Stage::Lanes, &squad_ids)?,
        pots: children(store, Stage::Pots, &squad_ids)?,
        brkts: children(store, Stage::Brkts, &squad_ids)?,
        elims: children(store, Stage::Elims, &squad_ids)?,
        squads,
    })
}

/// Saves the players of one squad and their entries, the same way
/// [`save_all_data_for_tmnt`] saves a tree: everything is validated before
/// anything is written.
///
/// The squad, divisions and eliminations entered must already be stored;
/// a missing one is reported by the store.
#[tracing::instrument(skip_all, fields(players = current.players.len()))]
pub fn save_squad_entries<S: TreeStore + ?Sized>(
    store: &mut S,
    original: &SquadEntries,
    current: &SquadEntries,
) -> Result<SquadEntries, SaveError> {
    // One batch, so every player must be in the same squad.
    let players = validate_players(&current.players);
    if !players.is_ok() {
        return Err(invalid(Stage::Players, players.error_code));
    }
    let players = players.records;
    let player_ids = ids(&players);
    let squad_ids = players
        .iter()
        .map(|player| player.squad_id.as_str())
        .collect::<HashSet<_>>();

    let div_entries = check(Stage::DivEntries, &current.div_entries, None)?;
    check_refs(
        Stage::DivEntries,
        div_entries.iter().map(|entry| entry.player_id.as_str()),
        &player_ids,
    )?;
    check_refs(
        Stage::DivEntries,
        div_entries.iter().map(|entry| entry.squad_id.as_str()),
        &squad_ids,
    )?;

    let elim_entries = check(Stage::ElimEntries, &current.elim_entries, None)?;
    check_refs(
        Stage::ElimEntries,
        elim_entries.iter().map(|entry| entry.player_id.as_str()),
        &player_ids,
    )?;

    let mut players = write_changes(store, &original.players, &players)
        .map_err(at(Stage::Players))?;
    let mut div_entries =
        write_changes(store, &original.div_entries, &div_entries)
            .map_err(at(Stage::DivEntries))?;
    let mut elim_entries =
        write_changes(store, &original.elim_entries, &elim_entries)
            .map_err(at(Stage::ElimEntries))?;

    elim_entries
        .delete_removed(store)
        .map_err(at(Stage::ElimEntries))?;
    div_entries
        .delete_removed(store)
        .map_err(at(Stage::DivEntries))?;
    players.delete_removed(store).map_err(at(Stage::Players))?;

    let saved = SquadEntries {
        players: players.finish().records,
        div_entries: div_entries.finish().records,
        elim_entries: elim_entries.finish().records,
    };
    tracing::info!("saved squad entries");
    Ok(saved)
}
