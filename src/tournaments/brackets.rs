use diesel::{prelude::*, sqlite::Sqlite};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    ids::{IdKind, is_valid_id},
    record::Record,
    sanitize::{sanitize_currency, sanitize_id},
    schema::brkts,
    validation::{
        ErrorCode, MAX_GAMES, Validated, classify, is_blank, is_even,
        is_missing_money, is_valid_amount, is_valid_fee, is_valid_int,
        is_valid_sort_order, parse_money, validate_records,
    },
};

pub const MAX_BRKT_PLAYERS: i64 = 32;

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
#[diesel(table_name = brkts)]
#[diesel(check_for_backend(Sqlite))]
pub struct Bracket {
    pub id: String,
    pub squad_id: String,
    pub div_id: String,
    /// First game of the squad this bracket is bowled over.
    pub start: i64,
    pub games: i64,
    pub players: i64,
    pub fee: String,
    pub first: String,
    pub second: String,
    pub admin: String,
    /// First + second + admin; what the whole bracket takes in.
    pub fsa: String,
    pub sort_order: i64,
}

impl Bracket {
    fn payouts(&self) -> [&str; 3] {
        [&self.first, &self.second, &self.admin]
    }

    /// The payouts must account for every fee paid into the bracket.
    fn payouts_balance(&self) -> bool {
        let parsed = (
            parse_money(&self.fee),
            parse_money(&self.fsa),
            self.payouts()
                .into_iter()
                .map(parse_money)
                .collect::<Option<Vec<_>>>(),
        );
        let (Some(fee), Some(fsa), Some(payouts)) = parsed else {
            return false;
        };

        payouts.into_iter().sum::<Decimal>() == fsa
            && fee * Decimal::from(self.players) == fsa
    }
}

pub fn sanitize_brkt(brkt: &Bracket) -> Bracket {
    Bracket {
        id: sanitize_id(&brkt.id, IdKind::Brkt),
        squad_id: sanitize_id(&brkt.squad_id, IdKind::Squad),
        div_id: sanitize_id(&brkt.div_id, IdKind::Div),
        start: brkt.start,
        games: brkt.games,
        players: brkt.players,
        fee: sanitize_currency(&brkt.fee),
        first: sanitize_currency(&brkt.first),
        second: sanitize_currency(&brkt.second),
        admin: sanitize_currency(&brkt.admin),
        fsa: sanitize_currency(&brkt.fsa),
        sort_order: brkt.sort_order,
    }
}

pub fn validate_brkt(brkt: &Bracket) -> ErrorCode {
    classify(
        is_blank(&brkt.id)
            || is_blank(&brkt.squad_id)
            || is_blank(&brkt.div_id)
            || is_missing_money(&brkt.fee)
            || is_missing_money(&brkt.fsa)
            || brkt.payouts().into_iter().any(is_missing_money),
        || {
            is_valid_id(&brkt.id, IdKind::Brkt)
                && is_valid_id(&brkt.squad_id, IdKind::Squad)
                && is_valid_id(&brkt.div_id, IdKind::Div)
                && is_valid_int(brkt.start, 1, MAX_GAMES)
                && is_valid_int(brkt.games, 1, MAX_GAMES)
                && brkt.start + brkt.games - 1 <= MAX_GAMES
                && is_valid_int(brkt.players, 2, MAX_BRKT_PLAYERS)
                && is_even(brkt.players)
                && is_valid_fee(&brkt.fee)
                && is_valid_fee(&brkt.fsa)
                && brkt.payouts().into_iter().all(is_valid_amount)
                && brkt.payouts_balance()
                && is_valid_sort_order(brkt.sort_order)
        },
    )
}

pub fn validate_brkts(brkts: &[Bracket]) -> Validated<Bracket> {
    validate_records(brkts)
}

impl Record for Bracket {
    const KIND: IdKind = IdKind::Brkt;
    const PARENT_KIND: IdKind = IdKind::Squad;
    const PATH: &'static str = "brkts";

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
        sanitize_brkt(self)
    }

    fn validate(&self) -> ErrorCode {
        validate_brkt(self)
    }
}
