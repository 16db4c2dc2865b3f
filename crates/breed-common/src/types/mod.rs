//! Common types used across the breed inquiry workspace

use serde::de::{IgnoredAny, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// A breed as stored in the catalog
///
/// Read-only projection of a row in the `breed` table. `remark` is always
/// serialized, as `null` when the column is null.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Breed {
    pub id: String,
    pub name_th: String,
    pub name_en: String,
    pub short_name: String,
    pub remark: Option<String>,
}

/// Filter request for the breed inquiry endpoint
///
/// Every field is optional on the wire. Missing, unknown and `null` fields
/// bind to their zero value, and an all-empty query matches every breed.
///
/// Keys match case-insensitively (`ShortNames`, `IDS` and `shortnames` all
/// bind), and a repeated key overwrites the earlier one. A `null` list
/// clears it; a `null` keyword leaves it unchanged. Serialization always
/// writes camelCase keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreedQuery {
    /// Restrict to breeds whose `id` is one of these
    pub ids: Vec<String>,

    /// Restrict to breeds whose `shortName` is one of these
    pub short_names: Vec<String>,

    /// Restrict to breeds whose `nameTh` or `nameEn` contains this text
    pub keyword: String,
}

impl BreedQuery {
    /// True when no filter is set
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty() && self.short_names.is_empty() && self.keyword.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QueryField {
    Ids,
    ShortNames,
    Keyword,
    Other,
}

impl QueryField {
    fn from_key(key: &str) -> Self {
        if key.eq_ignore_ascii_case("ids") {
            Self::Ids
        } else if key.eq_ignore_ascii_case("shortNames") {
            Self::ShortNames
        } else if key.eq_ignore_ascii_case("keyword") {
            Self::Keyword
        } else {
            Self::Other
        }
    }
}

impl<'de> Deserialize<'de> for QueryField {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let key = std::borrow::Cow::<'de, str>::deserialize(deserializer)?;
        Ok(Self::from_key(&key))
    }
}

struct BreedQueryVisitor;

impl<'de> Visitor<'de> for BreedQueryVisitor {
    type Value = BreedQuery;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a breed query object")
    }

    fn visit_map<A>(self, mut map: A) -> Result<BreedQuery, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut query = BreedQuery::default();

        while let Some(field) = map.next_key::<QueryField>()? {
            match field {
                QueryField::Ids => {
                    query.ids = map.next_value::<Option<Vec<String>>>()?.unwrap_or_default();
                }
                QueryField::ShortNames => {
                    query.short_names = map.next_value::<Option<Vec<String>>>()?.unwrap_or_default();
                }
                QueryField::Keyword => {
                    if let Some(keyword) = map.next_value::<Option<String>>()? {
                        query.keyword = keyword;
                    }
                }
                QueryField::Other => {
                    map.next_value::<IgnoredAny>()?;
                }
            }
        }

        Ok(query)
    }
}

impl<'de> Deserialize<'de> for BreedQuery {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(BreedQueryVisitor)
    }
}
