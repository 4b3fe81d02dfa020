use crate::models::GameInfo;
use crate::variant::VariantKind;
use std::collections::BTreeMap;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct GameVariant {
    pub kind: VariantKind,
    pub name: String,
    pub icon: String,
    pub description: String,
    /// Reps to reach, or seconds to hold for [`VariantKind::PlankTimer`].
    pub target_score: u32,
    pub time_limit: u32,
}

impl GameVariant {
    pub fn from_info(kind: VariantKind, info: GameInfo) -> Self {
        Self {
            kind,
            name: info.name,
            icon: info.icon,
            description: info.description,
            target_score: info.target_score,
            time_limit: info.time_limit,
        }
    }
}

/// Read-only table of the games offered by the server, fetched once.
#[derive(Debug, Clone, Default)]
pub struct GameCatalog {
    variants: BTreeMap<VariantKind, GameVariant>,
}

impl GameCatalog {
    pub fn new(variants: impl IntoIterator<Item = GameVariant>) -> Self {
        Self {
            variants: variants.into_iter().map(|v| (v.kind, v)).collect(),
        }
    }

    /// Builds the catalog from the raw `game_data` document.
    ///
    /// Unknown game ids and entries that do not decode (or carry a zero
    /// target or time limit) are left out, so looking them up later fails.
    pub fn from_raw(raw: BTreeMap<String, serde_json::Value>) -> Self {
        let mut variants = BTreeMap::new();
        for (id, value) in raw {
            let Ok(kind) = id.parse::<VariantKind>() else {
                debug!("ignoring unknown game type '{id}' in catalog");
                continue;
            };
            match serde_json::from_value::<GameInfo>(value) {
                Ok(info) if info.target_score > 0 && info.time_limit > 0 => {
                    variants.insert(kind, GameVariant::from_info(kind, info));
                }
                Ok(_) => warn!("catalog entry '{id}' has a zero target or time limit"),
                Err(err) => warn!("malformed catalog entry '{id}': {err}"),
            }
        }
        Self { variants }
    }

    pub fn get(&self, kind: VariantKind) -> Option<&GameVariant> {
        self.variants.get(&kind)
    }

    /// Resolves a wire id such as `squat_tap`.
    pub fn lookup(&self, variant_id: &str) -> Option<&GameVariant> {
        variant_id
            .parse::<VariantKind>()
            .ok()
            .and_then(|kind| self.get(kind))
    }

    pub fn variants(&self) -> impl Iterator<Item = &GameVariant> {
        self.variants.values()
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }
}
