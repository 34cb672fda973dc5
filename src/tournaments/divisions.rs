use diesel::{prelude::*, sqlite::Sqlite};
use serde::{Deserialize, Serialize};

use crate::{
    ids::{IdKind, is_valid_id},
    record::Record,
    sanitize::{sanitize, sanitize_id},
    schema::divs,
    validation::{
        ErrorCode, MAX_AVERAGE, Validated, classify, is_blank, is_missing,
        is_valid_int, is_valid_name, is_valid_sort_order, validate_records,
    },
};

pub const MAX_DIV_NAME_LEN: usize = 20;
pub const HDCP_FOR: [&str; 2] = ["Game", "Series"];

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
#[diesel(table_name = divs)]
#[diesel(check_for_backend(Sqlite))]
pub struct Division {
    pub id: String,
    pub tmnt_id: String,
    pub div_name: String,
    /// Fraction of the difference to `hdcp_from` given as handicap.
    pub hdcp_per: f64,
    pub hdcp_from: i64,
    pub int_hdcp: bool,
    pub hdcp_for: String,
    pub sort_order: i64,
}

pub fn sanitize_div(div: &Division) -> Division {
    Division {
        id: sanitize_id(&div.id, IdKind::Div),
        tmnt_id: sanitize_id(&div.tmnt_id, IdKind::Tmnt),
        div_name: sanitize(&div.div_name),
        hdcp_per: div.hdcp_per,
        hdcp_from: div.hdcp_from,
        int_hdcp: div.int_hdcp,
        hdcp_for: sanitize(&div.hdcp_for),
        sort_order: div.sort_order,
    }
}

pub fn validate_div(div: &Division) -> ErrorCode {
    classify(
        is_blank(&div.id)
            || is_blank(&div.tmnt_id)
            || is_missing(&div.div_name)
            || is_missing(&div.hdcp_for),
        || {
            is_valid_id(&div.id, IdKind::Div)
                && is_valid_id(&div.tmnt_id, IdKind::Tmnt)
                && is_valid_name(&div.div_name, MAX_DIV_NAME_LEN)
                && (0.0..=1.0).contains(&div.hdcp_per)
                && is_valid_int(div.hdcp_from, 0, MAX_AVERAGE)
                && HDCP_FOR.contains(&div.hdcp_for.as_str())
                && is_valid_sort_order(div.sort_order)
        },
    )
}

pub fn validate_divs(divs: &[Division]) -> Validated<Division> {
    validate_records(divs)
}

impl Record for Division {
    const KIND: IdKind = IdKind::Div;
    const PARENT_KIND: IdKind = IdKind::Tmnt;
    const PATH: &'static str = "divs";

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
        sanitize_div(self)
    }

    fn validate(&self) -> ErrorCode {
        validate_div(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::fixtures;

    #[test]
    fn valid_divs() {
        for div in fixtures::tree().divs {
            assert_eq!(validate_div(&div), ErrorCode::None);
            assert_eq!(sanitize_div(&div), div);
        }
    }

    #[test]
    fn hdcp_per_must_be_a_fraction() {
        let mut div = fixtures::tree().divs.remove(0);
        div.hdcp_per = 1.01;
        assert_eq!(validate_div(&div), ErrorCode::InvalidData);
        div.hdcp_per = -0.1;
        assert_eq!(validate_div(&div), ErrorCode::InvalidData);
        div.hdcp_per = f64::NAN;
        assert_eq!(validate_div(&div), ErrorCode::InvalidData);
    }

    #[test]
    fn hdcp_from_is_non_negative() {
        let mut div = fixtures::tree().divs.remove(0);
        div.hdcp_from = -1;
        assert_eq!(validate_div(&div), ErrorCode::InvalidData);
    }

    #[test]
    fn hdcp_for_is_game_or_series() {
        let mut div = fixtures::tree().divs.remove(0);
        div.hdcp_for = "Frame".to_string();
        assert_eq!(validate_div(&div), ErrorCode::InvalidData);
        div.hdcp_for = String::new();
        assert_eq!(validate_div(&div), ErrorCode::MissingData);
    }

    #[test]
    fn blank_name_in_batch() {
        let mut divs = fixtures::tree().divs;
        let last = divs.len() - 1;
        divs[last].div_name = " ".to_string();
        let validated = validate_divs(&divs);
        assert_eq!(validated.error_code, ErrorCode::MissingData);
        assert!(validated.records.is_empty());
    }
}
