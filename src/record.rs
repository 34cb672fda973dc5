use std::fmt::Debug;

use serde::{Serialize, de::DeserializeOwned};

use crate::{ids::IdKind, validation::ErrorCode};

/// A persisted member of a tournament tree.
pub trait Record:
    Clone + PartialEq + Debug + Serialize + DeserializeOwned + Send + 'static
{
    /// The kind of identifier this record is keyed by.
    const KIND: IdKind;
    /// The kind of identifier the record's parent is keyed by.
    const PARENT_KIND: IdKind;
    /// Path segment under which the record is served by the api.
    const PATH: &'static str;

    fn id(&self) -> &str;

    /// The parent this record is grouped under when stored and validated in
    /// bulk.
    fn parent_id(&self) -> &str;

    /// Key giving the natural order of a collection of these records.
    fn sort_key(&self) -> i64;

    /// Whether `id` may key a record of this type.
    fn accepts_id(id: &str) -> bool {
        crate::ids::is_valid_id(id, Self::KIND)
    }

    fn sanitized(&self) -> Self;

    fn validate(&self) -> ErrorCode;
}
