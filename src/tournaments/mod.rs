use chrono::{Datelike, NaiveDate};
use diesel::{prelude::*, sqlite::Sqlite};
use serde::{Deserialize, Serialize};

use crate::{
    ids::{IdKind, is_valid_id},
    record::Record,
    sanitize::{sanitize, sanitize_id},
    schema::tmnts,
    validation::{
        ErrorCode, classify, is_blank, is_missing, is_valid_date,
        is_valid_name,
    },
};

pub mod brackets;
pub mod divisions;
pub mod eliminations;
pub mod entries;
pub mod events;
pub mod lanes;
pub mod players;
pub mod pots;
pub mod save;
pub mod squads;

use brackets::Bracket;
use divisions::Division;
use eliminations::Elimination;
use entries::{DivEntry, ElimEntry};
use events::Event;
use lanes::Lane;
use players::Player;
use pots::Pot;
use squads::Squad;

pub const MAX_TMNT_NAME_LEN: usize = 100;

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
#[diesel(table_name = tmnts)]
#[diesel(check_for_backend(Sqlite))]
pub struct Tournament {
    pub id: String,
    pub user_id: String,
    pub bowl_id: String,
    pub tmnt_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

pub fn sanitize_tmnt(tmnt: &Tournament) -> Tournament {
    Tournament {
        id: sanitize_id(&tmnt.id, IdKind::Tmnt),
        user_id: sanitize_id(&tmnt.user_id, IdKind::User),
        bowl_id: sanitize_id(&tmnt.bowl_id, IdKind::Bowl),
        tmnt_name: sanitize(&tmnt.tmnt_name),
        start_date: tmnt.start_date,
        end_date: tmnt.end_date,
    }
}

pub fn validate_tmnt(tmnt: &Tournament) -> ErrorCode {
    classify(
        is_blank(&tmnt.id)
            || is_blank(&tmnt.user_id)
            || is_blank(&tmnt.bowl_id)
            || is_missing(&tmnt.tmnt_name),
        || {
            is_valid_id(&tmnt.id, IdKind::Tmnt)
                && is_valid_id(&tmnt.user_id, IdKind::User)
                && is_valid_id(&tmnt.bowl_id, IdKind::Bowl)
                && is_valid_name(&tmnt.tmnt_name, MAX_TMNT_NAME_LEN)
                && is_valid_date(tmnt.start_date)
                && is_valid_date(tmnt.end_date)
                && tmnt.start_date <= tmnt.end_date
        },
    )
}

/// An absent tournament is reported as invalid, the same as a malformed one.
pub fn validate_opt_tmnt(tmnt: Option<&Tournament>) -> ErrorCode {
    tmnt.map_or(ErrorCode::InvalidData, validate_tmnt)
}

impl Record for Tournament {
    const KIND: IdKind = IdKind::Tmnt;
    const PARENT_KIND: IdKind = IdKind::User;
    const PATH: &'static str = "tmnts";

    fn id(&self) -> &str {
        &self.id
    }

    fn parent_id(&self) -> &str {
        &self.user_id
    }

    fn sort_key(&self) -> i64 {
        self.start_date.num_days_from_ce() as i64
    }

    fn sanitized(&self) -> Self {
        sanitize_tmnt(self)
    }

    fn validate(&self) -> ErrorCode {
        validate_tmnt(self)
    }
}

/// A tournament and every collection that hangs off it.
///
/// A blank tree (no tournament) stands for a tournament that has never been
/// saved.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct TmntTree {
    pub tmnt: Option<Tournament>,
    pub events: Vec<Event>,
    pub divs: Vec<Division>,
    pub squads: Vec<Squad>,
    pub lanes: Vec<Lane>,
    pub pots: Vec<Pot>,
    pub brkts: Vec<Bracket>,
    pub elims: Vec<Elimination>,
}

impl TmntTree {
    pub fn blank() -> Self {
        Self::default()
    }

    pub fn is_blank(&self) -> bool {
        self.tmnt.is_none()
    }

    pub fn tmnt_id(&self) -> Option<&str> {
        self.tmnt.as_ref().map(|tmnt| tmnt.id.as_str())
    }
}

/// The entries made for a single squad: its players and what each of them
/// has entered.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct SquadEntries {
    pub players: Vec<Player>,
    pub div_entries: Vec<DivEntry>,
    pub elim_entries: Vec<ElimEntry>,
}
