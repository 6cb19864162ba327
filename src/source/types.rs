// Metadata schema types.
// Typed views of the versions index and per-version summary files.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Release channel of a version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionType {
    Snapshot,
    Release,
}

/// One entry of the versions index, also the contents of `version.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    pub id: String,
    pub name: String,
    pub release_target: Option<String>,
    #[serde(rename = "type")]
    pub version_type: VersionType,
    pub stable: bool,
    pub data_version: u32,
    pub protocol_version: u32,
    pub data_pack_version: u32,
    pub resource_pack_version: u32,
    pub build_time: DateTime<FixedOffset>,
    pub release_time: DateTime<FixedOffset>,
    pub sha1: String,
}

/// Properties of one block and their default state.
///
/// Stored in the summary as a two-element array:
/// `[{property: [values...]}, {property: default}]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BlockStatesRepr", into = "BlockStatesRepr")]
pub struct BlockStates {
    /// Every property and the values it may take.
    pub properties: BTreeMap<String, Vec<String>>,
    /// Value of each property in the default block state.
    pub default: BTreeMap<String, String>,
}

type BlockStatesRepr = (BTreeMap<String, Vec<String>>, BTreeMap<String, String>);

impl From<BlockStatesRepr> for BlockStates {
    fn from((properties, default): BlockStatesRepr) -> Self {
        Self { properties, default }
    }
}

impl From<BlockStates> for BlockStatesRepr {
    fn from(states: BlockStates) -> Self {
        (states.properties, states.default)
    }
}

/// Block id (without namespace) to its states.
pub type Blocks = BTreeMap<String, BlockStates>;
