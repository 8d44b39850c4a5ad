use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use traits_core::SearchKind;

/// Document field every lookup filters on.
pub const LOOKUP_FIELD: &str = "Document name";

/// The three trait collections in the document store.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Collection {
    PerVernacularName,
    PerScientificName,
    PhylogeneticTree,
}

impl Collection {
    /// Collection holding records for the given search.
    ///
    /// The scientific-name flag only matters for species searches.
    pub fn for_search(kind: SearchKind, is_scientific: bool) -> Self {
        match (kind, is_scientific) {
            (SearchKind::Species, false) => Collection::PerVernacularName,
            (SearchKind::Species, true) => Collection::PerScientificName,
            (SearchKind::Phylo, _) => Collection::PhylogeneticTree,
        }
    }
}
