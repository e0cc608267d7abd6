use crate::config::AppConfig;
use crate::fetch::Fetcher;
use crate::normalize::parse_table;
use crate::types::{GeometryFeature, Record, Snapshot, Team};
use anyhow::{anyhow, Context, Result};
use geo::MultiPolygon;
use geojson::GeoJson;
use std::collections::BTreeMap;
use std::convert::TryInto;
use tracing::{debug, error, info};

pub const GEOMETRY_NOTICE: &str = "Failed to load GeoJSON. Check file path or console for details.";

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// Boundaries are required to draw anything, so this stops initialization.
    #[error("{}", GEOMETRY_NOTICE)]
    Geometry(#[source] anyhow::Error),
}

/// Fetch every team sheet and the boundaries concurrently and assemble the snapshot.
///
/// A failing team sheet degrades to an empty dataset. A failing boundary
/// document fails the whole load.
pub async fn load_snapshot(config: &AppConfig, fetcher: &dyn Fetcher) -> Result<Snapshot, LoadError> {
    info!("Loading data...");

    let (script, editor, launch, geometry) = tokio::join!(
        load_team(config, fetcher, Team::Script),
        load_team(config, fetcher, Team::Editor),
        load_team(config, fetcher, Team::Launch),
        load_geometry(config, fetcher),
    );

    let mut datasets = BTreeMap::new();
    for (team, records) in [(Team::Script, script), (Team::Editor, editor), (Team::Launch, launch)] {
        info!(team = %team, records = records.len(), "Loaded team dataset");
        datasets.insert(team, records);
    }

    let geometry = geometry.map_err(|e| {
        error!("GeoJSON failed: {:#}", e);
        LoadError::Geometry(e)
    })?;
    info!("Loaded geometry for {} areas", geometry.len());
    debug!(
        "GeoJSON {} values: {:?}",
        config.geometry.join_property,
        geometry.iter().map(|f| f.join_key.as_deref()).collect::<Vec<_>>()
    );

    Ok(Snapshot::new(datasets, geometry))
}

async fn load_team(config: &AppConfig, fetcher: &dyn Fetcher, team: Team) -> Vec<Record> {
    match fetch_team(config, fetcher, team).await {
        Ok(records) => records,
        Err(e) => {
            error!("{} CSV failed: {:#}", team, e);
            Vec::new()
        }
    }
}

async fn fetch_team(config: &AppConfig, fetcher: &dyn Fetcher, team: Team) -> Result<Vec<Record>> {
    let source = config.source(team);
    let text = fetcher.fetch_text(&source.url).await?;
    parse_table(&text, &source.name_column)
}

async fn load_geometry(config: &AppConfig, fetcher: &dyn Fetcher) -> Result<Vec<GeometryFeature>> {
    let text = fetcher.fetch_text(&config.geometry.url).await?;
    parse_features(&text, &config.geometry.join_property)
}

pub fn parse_features(text: &str, join_property: &str) -> Result<Vec<GeometryFeature>> {
    let geojson: GeoJson = text.parse().context("Failed to parse GeoJSON")?;

    let collection = match geojson {
        GeoJson::FeatureCollection(fc) => fc,
        _ => return Err(anyhow!("GeoJSON must be a FeatureCollection")),
    };

    let mut features = Vec::with_capacity(collection.features.len());

    for feature in collection.features {
        let join_key = match feature.properties.as_ref().and_then(|props| props.get(join_property)) {
            Some(serde_json::Value::String(s)) => Some(s.to_uppercase()),
            Some(serde_json::Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };

        let geometry = match feature.geometry {
            Some(geom) => {
                let valid_geo: geo::Geometry<f64> = geom
                    .value
                    .try_into()
                    .map_err(|e| anyhow!("Failed to convert geojson geometry: {:?}", e))?;

                match valid_geo {
                    geo::Geometry::MultiPolygon(mp) => mp,
                    geo::Geometry::Polygon(p) => MultiPolygon::new(vec![p]),
                    _ => {
                        debug!("Skipping non-polygon feature {:?}", join_key);
                        continue;
                    }
                }
            }
            None => {
                debug!("Skipping feature without geometry {:?}", join_key);
                continue;
            }
        };

        features.push(GeometryFeature { join_key, geometry });
    }

    Ok(features)
}

#[cfg(test)]
pub(crate) const SAMPLE_GEOJSON: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {"type": "Feature", "properties": {"assem_name": "pk01"},
     "geometry": {"type": "Polygon", "coordinates": [[[80.0, 15.0], [81.0, 15.0], [81.0, 16.0], [80.0, 16.0], [80.0, 15.0]]]}},
    {"type": "Feature", "properties": {"assem_name": "PK02"},
     "geometry": {"type": "MultiPolygon", "coordinates": [[[[81.0, 15.0], [82.0, 15.0], [82.0, 16.0], [81.0, 16.0], [81.0, 15.0]]]]}},
    {"type": "Feature", "properties": {"assem_name": "PK03"},
     "geometry": {"type": "Point", "coordinates": [80.5, 15.5]}},
    {"type": "Feature", "properties": {}, "geometry": null}
  ]
}"#;
