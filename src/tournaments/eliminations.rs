use diesel::{prelude::*, sqlite::Sqlite};
use serde::{Deserialize, Serialize};

use crate::{
    ids::{IdKind, is_valid_id},
    record::Record,
    sanitize::{sanitize_currency, sanitize_id},
    schema::elims,
    validation::{
        ErrorCode, MAX_GAMES, Validated, classify, is_blank, is_missing_money,
        is_valid_fee, is_valid_int, is_valid_sort_order, validate_records,
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
#[diesel(table_name = elims)]
#[diesel(check_for_backend(Sqlite))]
pub struct Elimination {
    pub id: String,
    pub squad_id: String,
    pub div_id: String,
    pub start: i64,
    pub games: i64,
    pub fee: String,
    pub sort_order: i64,
}

pub fn sanitize_elim(elim: &Elimination) -> Elimination {
    Elimination {
        id: sanitize_id(&elim.id, IdKind::Elim),
        squad_id: sanitize_id(&elim.squad_id, IdKind::Squad),
        div_id: sanitize_id(&elim.div_id, IdKind::Div),
        start: elim.start,
        games: elim.games,
        fee: sanitize_currency(&elim.fee),
        sort_order: elim.sort_order,
    }
}

pub fn validate_elim(elim: &Elimination) -> ErrorCode {
    classify(
        is_blank(&elim.id)
            || is_blank(&elim.squad_id)
            || is_blank(&elim.div_id)
            || is_missing_money(&elim.fee),
        || {
            is_valid_id(&elim.id, IdKind::Elim)
                && is_valid_id(&elim.squad_id, IdKind::Squad)
                && is_valid_id(&elim.div_id, IdKind::Div)
                && is_valid_int(elim.start, 1, MAX_GAMES)
                && is_valid_int(elim.games, 1, MAX_GAMES)
                && elim.start + elim.games - 1 <= MAX_GAMES
                && is_valid_fee(&elim.fee)
                && is_valid_sort_order(elim.sort_order)
        },
    )
}

pub fn validate_elims(elims: &[Elimination]) -> Validated<Elimination> {
    validate_records(elims)
}

impl Record for Elimination {
    const KIND: IdKind = IdKind::Elim;
    const PARENT_KIND: IdKind = IdKind::Squad;
    const PATH: &'static str = "elims";

    fn id(&self) -> &str {
        &self.id
    }

    fn parent_id(&self) -> &str {
        &self.squad_id
    }

    fn sort_key(&self) -> i64 {
        self.sort_order
    }

    fn sanitized(&self) -> Self {
        sanitize_elim(self)
    }

    fn validate(&self) -> ErrorCode {
        validate_elim(self)
    }
}
