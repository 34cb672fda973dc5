use diesel::{prelude::*, sqlite::Sqlite};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{
    ids::{IdKind, is_valid_id, kind_of},
    record::Record,
    sanitize::{sanitize, sanitize_id, sanitize_opt},
    schema::players,
    validation::{
        ErrorCode, MAX_AVERAGE, MAX_LANE, Validated, classify, is_blank,
        is_missing, is_missing_opt, is_valid_int, is_valid_name,
        is_valid_opt_int, validate_records,
    },
};

pub const MAX_PLAYER_NAME_LEN: usize = 20;
pub const BYE_NAME: &str = "Bye";

static POSITION: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z]$").unwrap());

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
#[diesel(table_name = players)]
#[diesel(check_for_backend(Sqlite))]
#[diesel(treat_none_as_null = true)]
pub struct Player {
    pub id: String,
    pub squad_id: String,
    pub first_name: String,
    pub last_name: Option<String>,
    pub average: i64,
    pub lane: Option<i64>,
    /// Seat on the lane, a single capital letter.
    pub position: Option<String>,
}

/// A player, classified by the rules it has to follow. Bye players fill an
/// empty slot in a bracket or elimination and are told apart from real
/// players by their identifier.
#[derive(Debug, Clone, Copy)]
pub enum PlayerRecord<'a> {
    Regular(&'a Player),
    Bye(&'a Player),
}

impl<'a> PlayerRecord<'a> {
    pub fn of(player: &'a Player) -> Self {
        match kind_of(&player.id) {
            Some(IdKind::ByePlayer) => PlayerRecord::Bye(player),
            _ => PlayerRecord::Regular(player),
        }
    }

    pub fn validate(&self) -> ErrorCode {
        match self {
            PlayerRecord::Regular(player) => validate_regular(player),
            PlayerRecord::Bye(player) => validate_bye(player),
        }
    }
}

fn validate_regular(player: &Player) -> ErrorCode {
    classify(
        is_blank(&player.id)
            || is_blank(&player.squad_id)
            || is_missing(&player.first_name)
            || is_missing_opt(player.last_name.as_deref())
            || player.lane.is_none()
            || is_missing_opt(player.position.as_deref()),
        || {
            is_valid_id(&player.id, IdKind::Player)
                && is_valid_id(&player.squad_id, IdKind::Squad)
                && is_valid_name(&player.first_name, MAX_PLAYER_NAME_LEN)
                && player
                    .last_name
                    .as_deref()
                    .is_some_and(|name| is_valid_name(name, MAX_PLAYER_NAME_LEN))
                && is_valid_int(player.average, 0, MAX_AVERAGE)
                && is_valid_opt_int(player.lane, 1, MAX_LANE)
                && player
                    .position
                    .as_deref()
                    .is_some_and(|position| POSITION.is_match(position))
        },
    )
}

fn validate_bye(player: &Player) -> ErrorCode {
    classify(is_blank(&player.id) || is_blank(&player.squad_id), || {
        is_valid_id(&player.id, IdKind::ByePlayer)
            && is_valid_id(&player.squad_id, IdKind::Squad)
            && player.first_name == BYE_NAME
            && player.last_name.is_none()
            && player.average == 0
            && player.lane.is_none()
            && player.position.is_none()
    })
}

pub fn sanitize_player(player: &Player) -> Player {
    let id_kind = match kind_of(&player.id) {
        Some(IdKind::ByePlayer) => IdKind::ByePlayer,
        _ => IdKind::Player,
    };

    Player {
        id: sanitize_id(&player.id, id_kind),
        squad_id: sanitize_id(&player.squad_id, IdKind::Squad),
        first_name: sanitize(&player.first_name),
        last_name: sanitize_opt(player.last_name.as_deref()),
        average: player.average,
        lane: player.lane,
        position: sanitize_opt(player.position.as_deref()),
    }
}

pub fn validate_player(player: &Player) -> ErrorCode {
    PlayerRecord::of(player).validate()
}

pub fn validate_players(players: &[Player]) -> Validated<Player> {
    validate_records(players)
}

/// A bye player for the given squad.
pub fn bye_player(squad_id: &str) -> Player {
    Player {
        id: crate::ids::new_id(IdKind::ByePlayer),
        squad_id: squad_id.to_string(),
        first_name: BYE_NAME.to_string(),
        last_name: None,
        average: 0,
        lane: None,
        position: None,
    }
}

impl Record for Player {
    const KIND: IdKind = IdKind::Player;
    const PARENT_KIND: IdKind = IdKind::Squad;
    const PATH: &'static str = "players";

    fn id(&self) -> &str {
        &self.id
    }

    fn parent_id(&self) -> &str {
        &self.squad_id
    }

    /// Players sit in lane order, then by position on the lane. Byes go last.
    fn sort_key(&self) -> i64 {
        let seat = self
            .position
            .as_deref()
            .and_then(|position| position.bytes().next())
            .map_or(0, i64::from);
        self.lane.map_or(i64::MAX, |lane| lane * 256 + seat)
    }

    fn accepts_id(id: &str) -> bool {
        matches!(kind_of(id), Some(IdKind::Player | IdKind::ByePlayer))
    }

    fn sanitized(&self) -> Self {
        sanitize_player(self)
    }

    fn validate(&self) -> ErrorCode {
        validate_player(self)
    }
}
