use crate::types::Team;
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub default_team: Team,
    pub sources: SourcesConfig,
    pub geometry: GeometryConfig,
    #[serde(default)]
    pub map: MapConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Every team needs a sheet; a missing table fails deserialization.
#[derive(Debug, Deserialize, Clone)]
pub struct SourcesConfig {
    pub script: SourceConfig,
    pub editor: SourceConfig,
    pub launch: SourceConfig,
}

/// One team spreadsheet: where to fetch it and which column holds the person.
#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    pub url: String,
    pub name_column: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeometryConfig {
    pub url: String,
    #[serde(default = "default_join_property")]
    pub join_property: String,
}

fn default_join_property() -> String {
    "assem_name".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct MapConfig {
    pub width: u32,
    pub height: u32,
    pub padding: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self { width: 960, height: 720, padding: 16.0 }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    pub html: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { html: PathBuf::from("dashboard.html") }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 3000 }
    }
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(content)
            .with_context(|| "Failed to parse TOML configuration")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.map.width == 0 || self.map.height == 0 {
            return Err(anyhow!("Map width and height must be non-zero"));
        }
        Ok(())
    }

    pub fn source(&self, team: Team) -> &SourceConfig {
        match team {
            Team::Script => &self.sources.script,
            Team::Editor => &self.sources.editor,
            Team::Launch => &self.sources.launch,
        }
    }
}

#[cfg(test)]
pub(crate) const SAMPLE: &str = r#"
[sources.script]
url = "script.csv"
name_column = "Scriptwriter Name"

[sources.editor]
url = "editor.csv"
name_column = "Editor Name"

[sources.launch]
url = "launch.csv"
name_column = "Launch PoC Name"

[geometry]
url = "ap_assembly.geojson"
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn fills_defaults_for_optional_tables() {
        let config = AppConfig::from_toml(SAMPLE).unwrap();
        assert_eq!(config.default_team, Team::Script);
        assert_eq!(config.geometry.join_property, "assem_name");
        assert_eq!(config.source(Team::Launch).name_column, "Launch PoC Name");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.output.html, PathBuf::from("dashboard.html"));
    }

    #[test]
    fn rejects_missing_team_source() {
        let partial = SAMPLE.replace("[sources.launch]", "[unused]");
        let err = AppConfig::from_toml(&partial).unwrap_err();
        assert!(format!("{:#}", err).contains("missing field `launch`"));
    }

    #[test]
    fn each_team_resolves_its_own_sheet() {
        let config = AppConfig::from_toml(SAMPLE).unwrap();
        let urls: Vec<&str> = Team::ALL.iter().map(|&t| config.source(t).url.as_str()).collect();
        assert_eq!(urls, vec!["script.csv", "editor.csv", "launch.csv"]);
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "default_team = \"editor\"\n{}", SAMPLE).unwrap();
        let config = AppConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.default_team, Team::Editor);
    }
}
