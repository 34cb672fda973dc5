use chrono::NaiveDate;
use diesel::{prelude::*, sqlite::Sqlite};
use serde::{Deserialize, Serialize};

use crate::{
    ids::{IdKind, is_valid_id},
    record::Record,
    sanitize::{sanitize, sanitize_id, sanitize_time},
    schema::squads,
    validation::{
        ErrorCode, MAX_GAMES, MAX_LANE, Validated, classify, is_blank, is_even,
        is_missing, is_odd, is_valid_date, is_valid_int, is_valid_name,
        is_valid_sort_order, is_valid_time, validate_records,
    },
};

pub const MAX_SQUAD_NAME_LEN: usize = 30;

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
#[diesel(table_name = squads)]
#[diesel(check_for_backend(Sqlite))]
#[diesel(treat_none_as_null = true)]
pub struct Squad {
    pub id: String,
    pub event_id: String,
    pub squad_name: String,
    pub games: i64,
    pub lane_count: i64,
    pub starting_lane: i64,
    pub squad_date: NaiveDate,
    pub squad_time: Option<String>,
    pub sort_order: i64,
}

impl Squad {
    /// The lane numbers this squad bowls on.
    pub fn lane_numbers(&self) -> std::ops::Range<i64> {
        self.starting_lane..self.starting_lane + self.lane_count
    }

    /// Lanes are handed out in pairs, an odd lane followed by an even one,
    /// and the whole run must fit in the house.
    fn lanes_fit(&self) -> bool {
        is_valid_int(self.lane_count, 2, MAX_LANE)
            && is_even(self.lane_count)
            && is_valid_int(self.starting_lane, 1, MAX_LANE - 1)
            && is_odd(self.starting_lane)
            && self.starting_lane + self.lane_count - 1 <= MAX_LANE
    }
}

pub fn sanitize_squad(squad: &Squad) -> Squad {
    Squad {
        id: sanitize_id(&squad.id, IdKind::Squad),
        event_id: sanitize_id(&squad.event_id, IdKind::Event),
        squad_name: sanitize(&squad.squad_name),
        games: squad.games,
        lane_count: squad.lane_count,
        starting_lane: squad.starting_lane,
        squad_date: squad.squad_date,
        squad_time: sanitize_time(squad.squad_time.as_deref()),
        sort_order: squad.sort_order,
    }
}

pub fn validate_squad(squad: &Squad) -> ErrorCode {
    classify(
        is_blank(&squad.id)
            || is_blank(&squad.event_id)
            || is_missing(&squad.squad_name),
        || {
            is_valid_id(&squad.id, IdKind::Squad)
                && is_valid_id(&squad.event_id, IdKind::Event)
                && is_valid_name(&squad.squad_name, MAX_SQUAD_NAME_LEN)
                && is_valid_int(squad.games, 1, MAX_GAMES)
                && squad.lanes_fit()
                && is_valid_date(squad.squad_date)
                && squad.squad_time.as_deref().is_none_or(is_valid_time)
                && is_valid_sort_order(squad.sort_order)
        },
    )
}

pub fn validate_squads(squads: &[Squad]) -> Validated<Squad> {
    validate_records(squads)
}

impl Record for Squad {
    const KIND: IdKind = IdKind::Squad;
    const PARENT_KIND: IdKind = IdKind::Event;
    const PATH: &'static str = "squads";

    fn id(&self) -> &str {
        &self.id
    }

    fn parent_id(&self) -> &str {
        &self.event_id
    }

    fn sort_key(&self) -> i64 {
        self.sort_order
    }

    fn sanitized(&self) -> Self {
        sanitize_squad(self)
    }

    fn validate(&self) -> ErrorCode {
        validate_squad(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::fixtures;

    fn squad() -> Squad {
        fixtures::tree().squads.remove(0)
    }

    #[test]
    fn valid_squads() {
        for squad in fixtures::tree().squads {
            assert_eq!(validate_squad(&squad), ErrorCode::None);
            assert_eq!(sanitize_squad(&squad), squad);
        }
    }

    #[test]
    fn odd_lane_count_is_invalid() {
        let mut squad = squad();
        squad.lane_count = 11;
        assert_eq!(validate_squad(&squad), ErrorCode::InvalidData);
    }

    #[test]
    fn even_starting_lane_is_invalid() {
        let mut squad = squad();
        squad.starting_lane = 2;
        assert_eq!(validate_squad(&squad), ErrorCode::InvalidData);
    }

    #[test]
    fn lanes_must_fit_in_the_house() {
        let mut squad = squad();
        squad.starting_lane = 191;
        squad.lane_count = 10;
        assert_eq!(validate_squad(&squad), ErrorCode::None);
        squad.lane_count = 12;
        assert_eq!(validate_squad(&squad), ErrorCode::InvalidData);
    }

    #[test]
    fn time_is_optional_but_must_be_well_formed() {
        let mut squad = squad();
        squad.squad_time = None;
        assert_eq!(validate_squad(&squad), ErrorCode::None);
        squad.squad_time = Some("25:00".to_string());
        assert_eq!(validate_squad(&squad), ErrorCode::InvalidData);
        squad.squad_time = Some("  ".to_string());
        assert_eq!(sanitize_squad(&squad).squad_time, None);
    }

    #[test]
    fn lane_numbers_cover_the_run() {
        let mut squad = squad();
        squad.starting_lane = 5;
        squad.lane_count = 4;
        assert_eq!(squad.lane_numbers().collect::<Vec<_>>(), vec![5, 6, 7, 8]);
    }
}
