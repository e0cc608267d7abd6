use crate::aggregate::{counts_for, CountMap};
use crate::config::MapConfig;
use crate::map::{MapSurface, Tooltip};
use crate::table::TableView;
use crate::types::{Snapshot, Team};
use serde::Serialize;
use tracing::{debug, info};

/// Owns the loaded snapshot and the view derived from the selected team.
pub struct Dashboard {
    snapshot: Snapshot,
    current_team: Team,
    counts: CountMap,
    map: MapSurface,
    table: TableView,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegionView {
    pub region_code: Option<String>,
    pub count: u32,
    pub fill: String,
    pub hover_fill: String,
    pub path: String,
    pub tooltip: Tooltip,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub team: Team,
    pub max_count: u32,
    pub regions: Vec<RegionView>,
    pub table: TableView,
}

impl Dashboard {
    pub fn new(snapshot: Snapshot, map_config: &MapConfig, default_team: Team) -> Self {
        let mut dashboard = Self {
            snapshot,
            current_team: default_team,
            counts: CountMap::default(),
            map: MapSurface::new(map_config),
            table: TableView::Empty { message: String::new() },
        };
        dashboard.select_team(default_team);
        dashboard
    }

    /// Recount, redraw the map, rebuild the table.
    pub fn select_team(&mut self, team: Team) {
        let records = self.snapshot.dataset(team);
        self.current_team = team;
        self.counts = counts_for(records);
        debug!("Count map for {}: {:?}", team, self.counts.iter().collect::<Vec<_>>());

        self.map.draw(&self.snapshot.geometry, records, &self.counts);
        self.table = TableView::build(team, records);

        info!(
            team = %team,
            regions = self.map.layers().len(),
            table_rows = self.table.rows().len(),
            "Dashboard updated"
        );
    }

    pub fn current_team(&self) -> Team {
        self.current_team
    }

    pub fn counts(&self) -> &CountMap {
        &self.counts
    }

    pub fn map(&self) -> &MapSurface {
        &self.map
    }

    pub fn table(&self) -> &TableView {
        &self.table
    }

    pub fn view(&self) -> DashboardView {
        DashboardView {
            team: self.current_team,
            max_count: self.counts.max_count(),
            regions: self
                .map
                .layers()
                .iter()
                .map(|layer| RegionView {
                    region_code: layer.join_key.clone(),
                    count: layer.count,
                    fill: layer.base_fill.to_hex(),
                    hover_fill: layer.hover_fill.to_hex(),
                    path: layer.path().to_string(),
                    tooltip: layer.tooltip().clone(),
                })
                .collect(),
            table: self.table.clone(),
        }
    }
}
