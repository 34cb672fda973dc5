//! What each player has entered: a division (and so the squad they bowl it
//! in) and any number of eliminations.

use diesel::{prelude::*, sqlite::Sqlite};
use serde::{Deserialize, Serialize};

use crate::{
    ids::{IdKind, is_valid_id, kind_of},
    record::Record,
    sanitize::{sanitize_currency, sanitize_id},
    schema::{div_entries, elim_entries},
    validation::{
        ErrorCode, Validated, classify, is_blank, is_missing_money,
        is_valid_fee, validate_records,
    },
};

#[derive(
    Queryable,
    Selectable,
    Insertable,
    AsChangeset,
    Serialize,
    Deserialize,
    Debug,
    Clone,
    PartialEq,
)]
#[diesel(table_name = div_entries)]
#[diesel(check_for_backend(Sqlite))]
pub struct DivEntry {
    pub id: String,
    pub div_id: String,
    pub squad_id: String,
    pub player_id: String,
    pub fee: String,
}

pub fn sanitize_div_entry(entry: &DivEntry) -> DivEntry {
    DivEntry {
        id: sanitize_id(&entry.id, IdKind::DivEntry),
        div_id: sanitize_id(&entry.div_id, IdKind::Div),
        squad_id: sanitize_id(&entry.squad_id, IdKind::Squad),
        player_id: sanitize_id(&entry.player_id, IdKind::Player),
        fee: sanitize_currency(&entry.fee),
    }
}

/// Only real players enter divisions; byes exist to fill out eliminations
/// and brackets.
pub fn validate_div_entry(entry: &DivEntry) -> ErrorCode {
    classify(
        is_blank(&entry.id)
            || is_blank(&entry.div_id)
            || is_blank(&entry.squad_id)
            || is_blank(&entry.player_id)
            || is_missing_money(&entry.fee),
        || {
            is_valid_id(&entry.id, IdKind::DivEntry)
                && is_valid_id(&entry.div_id, IdKind::Div)
                && is_valid_id(&entry.squad_id, IdKind::Squad)
                && is_valid_id(&entry.player_id, IdKind::Player)
                && is_valid_fee(&entry.fee)
        },
    )
}

pub fn validate_div_entries(entries: &[DivEntry]) -> Validated<DivEntry> {
    validate_records(entries)
}

impl Record for DivEntry {
    const KIND: IdKind = IdKind::DivEntry;
    const PARENT_KIND: IdKind = IdKind::Div;
    const PATH: &'static str = "divEntries";

    fn id(&self) -> &str {
        &self.id
    }

    fn parent_id(&self) -> &str {
        &self.div_id
    }

    /// Entries have no order of their own.
    fn sort_key(&self) -> i64 {
        0
    }

    fn sanitized(&self) -> Self {
        sanitize_div_entry(self)
    }

    fn validate(&self) -> ErrorCode {
        validate_div_entry(self)
    }
}

#[derive(
    Queryable,
    Selectable,
    Insertable,
    AsChangeset,
    Serialize,
    Deserialize,
    Debug,
    Clone,
    PartialEq,
)]
#[diesel(table_name = elim_entries)]
#[diesel(check_for_backend(Sqlite))]
pub struct ElimEntry {
    pub id: String,
    pub elim_id: String,
    pub player_id: String,
    pub fee: String,
}

fn is_entrant(id: &str) -> bool {
    matches!(kind_of(id), Some(IdKind::Player | IdKind::ByePlayer))
}

pub fn sanitize_elim_entry(entry: &ElimEntry) -> ElimEntry {
    ElimEntry {
        id: sanitize_id(&entry.id, IdKind::ElimEntry),
        elim_id: sanitize_id(&entry.elim_id, IdKind::Elim),
        player_id: if is_entrant(&entry.player_id) {
            entry.player_id.clone()
        } else {
            String::new()
        },
        fee: sanitize_currency(&entry.fee),
    }
}

pub fn validate_elim_entry(entry: &ElimEntry) -> ErrorCode {
    classify(
        is_blank(&entry.id)
            || is_blank(&entry.elim_id)
            || is_blank(&entry.player_id)
            || is_missing_money(&entry.fee),
        || {
            is_valid_id(&entry.id, IdKind::ElimEntry)
                && is_valid_id(&entry.elim_id, IdKind::Elim)
                && is_entrant(&entry.player_id)
                && is_valid_fee(&entry.fee)
        },
    )
}

pub fn validate_elim_entries(entries: &[ElimEntry]) -> Validated<ElimEntry> {
    validate_records(entries)
}

impl Record for ElimEntry {
    const KIND: IdKind = IdKind::ElimEntry;
    const PARENT_KIND: IdKind = IdKind::Elim;
    const PATH: &'static str = "elimEntries";

    fn id(&self) -> &str {
        &self.id
    }

    fn parent_id(&self) -> &str {
        &self.elim_id
    }

    fn sort_key(&self) -> i64 {
        0
    }

    fn sanitized(&self) -> Self {
        sanitize_elim_entry(self)
    }

    fn validate(&self) -> ErrorCode {
        validate_elim_entry(self)
    }
}
