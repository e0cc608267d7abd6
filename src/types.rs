use geo::MultiPolygon;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Display marker for a field that has no value.
pub const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Team {
    #[default]
    Script,
    Editor,
    Launch,
}

impl Team {
    pub const ALL: [Team; 3] = [Team::Script, Team::Editor, Team::Launch];

    pub fn as_str(&self) -> &'static str {
        match self {
            Team::Script => "script",
            Team::Editor => "editor",
            Team::Launch => "launch",
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Team {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "script" => Ok(Team::Script),
            "editor" => Ok(Team::Editor),
            "launch" => Ok(Team::Launch),
            other => Err(anyhow::anyhow!("Unknown team: {}", other)),
        }
    }
}

/// One normalized spreadsheet row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub region_code: String, // trimmed + uppercased, never empty
    pub city: Option<String>,
    pub person_name: Option<String>,
    pub status: Option<String>,
}

impl Record {
    /// Code present and every label resolved. Only these rows reach the table.
    pub fn is_complete(&self) -> bool {
        !self.region_code.is_empty()
            && self.city.is_some()
            && self.person_name.is_some()
            && self.status.is_some()
    }
}

pub fn display_or_na(value: Option<&str>) -> &str {
    value.unwrap_or(NOT_AVAILABLE)
}

#[derive(Debug, Clone)]
pub struct GeometryFeature {
    /// Uppercased join property, `None` when the feature has no usable name.
    pub join_key: Option<String>,
    pub geometry: MultiPolygon<f64>,
}

/// Everything fetched at startup. Never mutated after construction.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    datasets: BTreeMap<Team, Vec<Record>>,
    pub geometry: Vec<GeometryFeature>,
}

impl Snapshot {
    pub fn new(datasets: BTreeMap<Team, Vec<Record>>, geometry: Vec<GeometryFeature>) -> Self {
        Self { datasets, geometry }
    }

    /// Records for a team; empty when the team's source failed to load.
    pub fn dataset(&self, team: Team) -> &[Record] {
        self.datasets.get(&team).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[cfg(test)]
pub(crate) fn record(code: &str, city: Option<&str>, name: Option<&str>, status: Option<&str>) -> Record {
    Record {
        region_code: code.to_string(),
        city: city.map(str::to_string),
        person_name: name.map(str::to_string),
        status: status.map(str::to_string),
    }
}
