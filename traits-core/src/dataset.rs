use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Keys of the three pre-built JSON datasets exposed by `GET /api/data/{type}`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DatasetKind {
    Vernacular,
    Scientific,
    Phylo,
}

impl DatasetKind {
    pub const ALL: [DatasetKind; 3] =
        [DatasetKind::Vernacular, DatasetKind::Scientific, DatasetKind::Phylo];
}
