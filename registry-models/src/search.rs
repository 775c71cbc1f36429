use serde::{Deserialize, Serialize};

/// The closed set of fields `search_artifacts`/`search_groups`/`search_versions`
/// may filter or order on (§4.B). Adding a field means extending this enum and
/// the matching match-arm in `registry-store`, never accepting an arbitrary
/// column name from a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchField {
    Name,
    Group,
    Description,
    Labels,
    GlobalId,
    ContentId,
    Owner,
    /// `properties.<k>`; the key itself travels in `SearchFilter::value`
    /// encoded as `"<k>=<v>"` since this enum has no payload slot for it.
    Properties,
}

/// Whether a filter field is matched by equality or substring containment.
/// This is a property of the field, not a per-call choice (§4.B).
impl SearchField {
    pub fn match_mode(self) -> MatchMode {
        match self {
            SearchField::Name
            | SearchField::Description
            | SearchField::Labels
            | SearchField::Owner
            | SearchField::Properties => MatchMode::Substring,
            SearchField::Group | SearchField::GlobalId | SearchField::ContentId => {
                MatchMode::Equals
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    Equals,
    Substring,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilter {
    pub field: SearchField,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OrderDirection {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchQuery {
    pub filters: Vec<SearchFilter>,
    pub order_by: SearchField,
    pub order_dir: OrderDirection,
    pub offset: i64,
    pub limit: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResults<T> {
    pub items: Vec<T>,
    pub count: i64,
}
