use diesel::{prelude::*, sqlite::Sqlite};
use serde::{Deserialize, Serialize};

use crate::{
    ids::{IdKind, is_valid_id},
    record::Record,
    sanitize::sanitize_id,
    schema::lanes,
    tournaments::squads::Squad,
    validation::{
        ErrorCode, MAX_LANE, Validated, classify, is_blank, is_valid_int,
        validate_records,
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
#[diesel(table_name = lanes)]
#[diesel(check_for_backend(Sqlite))]
pub struct Lane {
    pub id: String,
    pub squad_id: String,
    pub lane_number: i64,
    pub in_use: bool,
}

pub fn sanitize_lane(lane: &Lane) -> Lane {
    Lane {
        id: sanitize_id(&lane.id, IdKind::Lane),
        squad_id: sanitize_id(&lane.squad_id, IdKind::Squad),
        lane_number: lane.lane_number,
        in_use: lane.in_use,
    }
}

pub fn validate_lane(lane: &Lane) -> ErrorCode {
    classify(is_blank(&lane.id) || is_blank(&lane.squad_id), || {
        is_valid_id(&lane.id, IdKind::Lane)
            && is_valid_id(&lane.squad_id, IdKind::Squad)
            && is_valid_int(lane.lane_number, 1, MAX_LANE)
    })
}

pub fn validate_lanes(lanes: &[Lane]) -> Validated<Lane> {
    validate_records(lanes)
}

/// Checks that a squad's lanes are exactly the contiguous run of lanes the
/// squad was given.
pub fn lanes_match_squad(squad: &Squad, lanes: &[Lane]) -> bool {
    let mut numbers = lanes
        .iter()
        .filter(|lane| lane.squad_id == squad.id)
        .map(|lane| lane.lane_number)
        .collect::<Vec<_>>();
    numbers.sort_unstable();

    numbers.len() == lanes.len()
        && numbers.into_iter().eq(squad.lane_numbers())
}

/// Builds the lanes for a squad which doesn't have any yet.
pub fn lanes_for_squad(squad: &Squad) -> Vec<Lane> {
    squad
        .lane_numbers()
        .map(|lane_number| Lane {
            id: crate::ids::new_id(IdKind::Lane),
            squad_id: squad.id.clone(),
            lane_number,
            in_use: true,
        })
        .collect()
}

impl Record for Lane {
    const KIND: IdKind = IdKind::Lane;
    const PARENT_KIND: IdKind = IdKind::Squad;
    const PATH: &'static str = "lanes";

    fn id(&self) -> &str {
        &self.id
    }

    fn parent_id(&self) -> &str {
        &self.squad_id
    }

    fn sort_key(&self) -> i64 {
        self.lane_number
    }

    fn sanitized(&self) -> Self {
        sanitize_lane(self)
    }

    fn validate(&self) -> ErrorCode {
        validate_lane(self)
    }
}
