//! Typed identifiers. Every persisted record is keyed by a string of the
//! form `<tag>_<32 lowercase hex digits>`, where the tag names the kind of
//! record the key belongs to.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize, Deserialize, Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum IdKind {
    User,
    Bowl,
    Tmnt,
    Event,
    Div,
    Squad,
    Lane,
    Pot,
    Brkt,
    Elim,
    Player,
    ByePlayer,
    DivEntry,
    ElimEntry,
}

impl IdKind {
    pub const ALL: [IdKind; 14] = [
        IdKind::User,
        IdKind::Bowl,
        IdKind::Tmnt,
        IdKind::Event,
        IdKind::Div,
        IdKind::Squad,
        IdKind::Lane,
        IdKind::Pot,
        IdKind::Brkt,
        IdKind::Elim,
        IdKind::Player,
        IdKind::ByePlayer,
        IdKind::DivEntry,
        IdKind::ElimEntry,
    ];

    pub fn tag(&self) -> &'static str {
        match self {
            IdKind::User => "usr",
            IdKind::Bowl => "bwl",
            IdKind::Tmnt => "tmt",
            IdKind::Event => "evt",
            IdKind::Div => "div",
            IdKind::Squad => "sqd",
            IdKind::Lane => "lan",
            IdKind::Pot => "pot",
            IdKind::Brkt => "brk",
            IdKind::Elim => "elm",
            IdKind::Player => "ply",
            IdKind::ByePlayer => "byp",
            IdKind::DivEntry => "den",
            IdKind::ElimEntry => "een",
        }
    }

    fn of_tag(tag: &str) -> Option<IdKind> {
        IdKind::ALL.into_iter().find(|kind| kind.tag() == tag)
    }
}

impl std::fmt::Display for IdKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

static ID_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([a-z]{3})_([0-9a-f]{32})$").unwrap());

/// Generates a fresh identifier for a record of the given kind.
pub fn new_id(kind: IdKind) -> String {
    format!("{}_{}", kind.tag(), Uuid::new_v4().simple())
}

/// Returns the kind encoded in a well-formed identifier, or `None` if the
/// identifier is malformed or carries an unknown tag.
pub fn kind_of(id: &str) -> Option<IdKind> {
    let captures = ID_SHAPE.captures(id)?;
    IdKind::of_tag(captures.get(1)?.as_str())
}

/// Checks that `id` is a well-formed identifier for a record of `kind`. An
/// identifier that is well-formed for some other kind of record is invalid.
pub fn is_valid_id(id: &str, kind: IdKind) -> bool {
    kind_of(id) == Some(kind)
}

/// Like [`is_valid_id`], but for optional values (absent is invalid).
pub fn is_valid_opt_id(id: Option<&str>, kind: IdKind) -> bool {
    id.is_some_and(|id| is_valid_id(id, kind))
}
