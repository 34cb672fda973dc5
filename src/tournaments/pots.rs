use diesel::{prelude::*, sqlite::Sqlite};
use serde::{Deserialize, Serialize};

use crate::{
    ids::{IdKind, is_valid_id},
    record::Record,
    sanitize::{sanitize, sanitize_currency, sanitize_id},
    schema::pots,
    validation::{
        ErrorCode, Validated, classify, is_blank, is_missing, is_missing_money,
        is_valid_fee, is_valid_sort_order, validate_records,
    },
};

pub const POT_TYPES: [&str; 3] = ["Game", "Last Game", "Series"];

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
#[diesel(table_name = pots)]
#[diesel(check_for_backend(Sqlite))]
pub struct Pot {
    pub id: String,
    pub squad_id: String,
    pub div_id: String,
    pub pot_type: String,
    pub fee: String,
    pub sort_order: i64,
}

pub fn sanitize_pot(pot: &Pot) -> Pot {
    Pot {
        id: sanitize_id(&pot.id, IdKind::Pot),
        squad_id: sanitize_id(&pot.squad_id, IdKind::Squad),
        div_id: sanitize_id(&pot.div_id, IdKind::Div),
        pot_type: sanitize(&pot.pot_type),
        fee: sanitize_currency(&pot.fee),
        sort_order: pot.sort_order,
    }
}

pub fn validate_pot(pot: &Pot) -> ErrorCode {
    classify(
        is_blank(&pot.id)
            || is_blank(&pot.squad_id)
            || is_blank(&pot.div_id)
            || is_missing(&pot.pot_type)
            || is_missing_money(&pot.fee),
        || {
            is_valid_id(&pot.id, IdKind::Pot)
                && is_valid_id(&pot.squad_id, IdKind::Squad)
                && is_valid_id(&pot.div_id, IdKind::Div)
                && POT_TYPES.contains(&pot.pot_type.as_str())
                && is_valid_fee(&pot.fee)
                && is_valid_sort_order(pot.sort_order)
        },
    )
}

pub fn validate_pots(pots: &[Pot]) -> Validated<Pot> {
    validate_records(pots)
}

impl Record for Pot {
    const KIND: IdKind = IdKind::Pot;
    const PARENT_KIND: IdKind = IdKind::Squad;
    const PATH: &'static str = "pots";

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
        sanitize_pot(self)
    }

    fn validate(&self) -> ErrorCode {
        validate_pot(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::fixtures;

    #[test]
    fn valid_pots() {
        for pot in fixtures::tree().pots {
            assert_eq!(validate_pot(&pot), ErrorCode::None);
            assert_eq!(sanitize_pot(&pot), pot);
        }
    }

    #[test]
    fn fee_must_be_positive() {
        let mut pot = fixtures::tree().pots.remove(0);
        pot.fee = "0".to_string();
        assert_eq!(validate_pot(&pot), ErrorCode::InvalidData);
        pot.fee = "1000000".to_string();
        assert_eq!(validate_pot(&pot), ErrorCode::InvalidData);
        pot.fee = "".to_string();
        assert_eq!(validate_pot(&pot), ErrorCode::MissingData);
    }

    #[test]
    fn unknown_pot_type() {
        let mut pot = fixtures::tree().pots.remove(0);
        pot.pot_type = "Frame".to_string();
        assert_eq!(validate_pot(&pot), ErrorCode::InvalidData);
    }
}
