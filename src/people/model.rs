//! Person entity as exchanged with the HTTP layer and stored in the graph.

use serde::{Deserialize, Serialize};

pub const FACTSET_AUTHORITY: &str = "http://api.ft.com/system/FACTSET-PPL";
pub const TME_AUTHORITY: &str = "http://api.ft.com/system/FT-TME";

/// Graph label for identifiers issued by a known authority
pub fn identifier_label(authority: &str) -> Option<&'static str> {
    match authority {
        FACTSET_AUTHORITY => Some("FactsetIdentifier"),
        TME_AUTHORITY => Some("TMEIdentifier"),
        _ => None,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub uuid: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_year: Option<i32>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub salutation: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifiers: Vec<Identifier>,
}

/// Ordered by authority, then value
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identifier {
    pub authority: String,
    pub identifier_value: String,
}

impl Identifier {
    pub fn new(authority: impl Into<String>, identifier_value: impl Into<String>) -> Self {
        Self {
            authority: authority.into(),
            identifier_value: identifier_value.into(),
        }
    }
}

impl Person {
    pub fn sort_identifiers(&mut self) {
        self.identifiers.sort();
    }
}

/// Shape of a row returned by the person read statement
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct PersonRow {
    pub uuid: Option<String>,
    pub name: Option<String>,
    pub birth_year: Option<i32>,
    pub salutation: Option<String>,
    pub aliases: Option<Vec<String>>,
    pub identifiers: Option<Vec<IdentifierRow>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct IdentifierRow {
    pub authority: Option<String>,
    pub identifier_value: Option<String>,
}

impl From<PersonRow> for Person {
    fn from(row: PersonRow) -> Self {
        // The optional identifier match yields one all-null entry when a
        // person has no identifiers
        let identifiers = row
            .identifiers
            .unwrap_or_default()
            .into_iter()
            .filter_map(|identifier| match identifier.identifier_value {
                Some(value) if !value.is_empty() => Some(Identifier::new(
                    identifier.authority.unwrap_or_default(),
                    value,
                )),
                _ => None,
            })
            .collect();

        let mut person = Person {
            uuid: row.uuid.unwrap_or_default(),
            name: row.name.unwrap_or_default(),
            birth_year: row.birth_year.filter(|year| *year != 0),
            salutation: row.salutation.unwrap_or_default(),
            aliases: row.aliases.unwrap_or_default(),
            identifiers,
        };
        person.sort_identifiers();
        person
    }
}
