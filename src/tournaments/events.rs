use diesel::{prelude::*, sqlite::Sqlite};
use serde::{Deserialize, Serialize};

use crate::{
    ids::{IdKind, is_valid_id},
    record::Record,
    sanitize::{sanitize, sanitize_currency, sanitize_id},
    schema::events,
    validation::{
        ErrorCode, MAX_GAMES, Validated, classify, is_blank, is_missing,
        is_missing_money, is_valid_amount, is_valid_fee, is_valid_int,
        is_valid_name, is_valid_sort_order, parse_money, validate_records,
    },
};

pub const MAX_EVENT_NAME_LEN: usize = 20;
pub const MAX_TEAM_SIZE: i64 = 5;

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
#[diesel(table_name = events)]
#[diesel(check_for_backend(Sqlite))]
pub struct Event {
    pub id: String,
    pub tmnt_id: String,
    pub event_name: String,
    pub team_size: i64,
    pub games: i64,
    pub entry_fee: String,
    pub lineage: String,
    pub prize_fund: String,
    pub other: String,
    pub expenses: String,
    pub added_money: String,
    pub sort_order: i64,
}

impl Event {
    fn breakdown(&self) -> [&str; 4] {
        [&self.lineage, &self.prize_fund, &self.other, &self.expenses]
    }

    /// The entry fee has to be exactly what lineage, prize fund, other and
    /// expenses add up to.
    fn fee_matches_breakdown(&self) -> bool {
        let (Some(entry_fee), Some(parts)) = (
            parse_money(&self.entry_fee),
            self.breakdown()
                .into_iter()
                .map(parse_money)
                .collect::<Option<Vec<_>>>(),
        ) else {
            return false;
        };

        parts.into_iter().sum::<rust_decimal::Decimal>() == entry_fee
    }
}

pub fn sanitize_event(event: &Event) -> Event {
    Event {
        id: sanitize_id(&event.id, IdKind::Event),
        tmnt_id: sanitize_id(&event.tmnt_id, IdKind::Tmnt),
        event_name: sanitize(&event.event_name),
        team_size: event.team_size,
        games: event.games,
        entry_fee: sanitize_currency(&event.entry_fee),
        lineage: sanitize_currency(&event.lineage),
        prize_fund: sanitize_currency(&event.prize_fund),
        other: sanitize_currency(&event.other),
        expenses: sanitize_currency(&event.expenses),
        added_money: sanitize_currency(&event.added_money),
        sort_order: event.sort_order,
    }
}

pub fn validate_event(event: &Event) -> ErrorCode {
    classify(
        is_blank(&event.id)
            || is_blank(&event.tmnt_id)
            || is_missing(&event.event_name)
            || is_missing_money(&event.entry_fee)
            || is_missing_money(&event.added_money)
            || event.breakdown().into_iter().any(is_missing_money),
        || {
            is_valid_id(&event.id, IdKind::Event)
                && is_valid_id(&event.tmnt_id, IdKind::Tmnt)
                && is_valid_name(&event.event_name, MAX_EVENT_NAME_LEN)
                && is_valid_int(event.team_size, 1, MAX_TEAM_SIZE)
                && is_valid_int(event.games, 1, MAX_GAMES)
                && is_valid_fee(&event.entry_fee)
                && is_valid_amount(&event.added_money)
                && event.breakdown().into_iter().all(is_valid_amount)
                && event.fee_matches_breakdown()
                && is_valid_sort_order(event.sort_order)
        },
    )
}

pub fn validate_events(events: &[Event]) -> Validated<Event> {
    validate_records(events)
}

impl Record for Event {
    const KIND: IdKind = IdKind::Event;
    const PARENT_KIND: IdKind = IdKind::Tmnt;
    const PATH: &'static str = "events";

    fn id(&self) -> &str {
        &self.id
    }

    fn parent_id(&self) -> &str {
        &self.tmnt_id
    }

    fn sort_key(&self) -> i64 {
        self.sort_order
    }

    fn sanitized(&self) -> Self {
        sanitize_event(self)
    }

    fn validate(&self) -> ErrorCode {
        validate_event(self)
    }
}
