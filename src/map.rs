use crate::aggregate::CountMap;
use crate::color::{ColorScale, Rgb};
use crate::config::MapConfig;
use crate::page::escape_html;
use crate::types::{display_or_na, GeometryFeature, Record};
use geo::algorithm::bounding_rect::BoundingRect;
use geo::algorithm::contains::Contains;
use geo::{LineString, MultiPolygon, Point, Rect};
use rstar::{RTree, RTreeObject, AABB};
use serde::Serialize;
use std::f64::consts::PI;
use std::fmt::Write as _;
use tracing::debug;

pub const NO_DATA_LINE: &str = "No additional data available.";
const HOVER_DARKEN: f64 = 1.0;

// Web Mercator at unit scale: x and y both in [0, 1].
fn mercator(lon: f64, lat: f64) -> (f64, f64) {
    let x = (lon + 180.0) / 360.0;
    let lat_rad = lat.to_radians();
    let y = (1.0 - (lat_rad.tan() + (1.0 / lat_rad.cos())).ln() / PI) / 2.0;
    (x, y)
}

/// Lon/lat to SVG pixels, fitted to a bounding box.
#[derive(Debug, Clone, Copy)]
pub struct Projection {
    scale: f64,
    offset_x: f64,
    offset_y: f64,
}

impl Projection {
    pub fn fit(bounds: Rect<f64>, width: u32, height: u32, padding: f64) -> Self {
        let (x0, y0) = mercator(bounds.min().x, bounds.max().y);
        let (x1, y1) = mercator(bounds.max().x, bounds.min().y);
        let (w, h) = (x1 - x0, y1 - y0);

        let avail_w = (width as f64 - 2.0 * padding).max(1.0);
        let avail_h = (height as f64 - 2.0 * padding).max(1.0);
        let scale = match (w > 0.0, h > 0.0) {
            (true, true) => (avail_w / w).min(avail_h / h),
            (true, false) => avail_w / w,
            (false, true) => avail_h / h,
            (false, false) => 1.0,
        };

        Self {
            scale,
            offset_x: padding + (avail_w - w * scale) / 2.0 - x0 * scale,
            offset_y: padding + (avail_h - h * scale) / 2.0 - y0 * scale,
        }
    }

    pub fn project(&self, lon: f64, lat: f64) -> (f64, f64) {
        let (x, y) = mercator(lon, lat);
        (x * self.scale + self.offset_x, y * self.scale + self.offset_y)
    }
}

fn bounds_of(features: &[GeometryFeature]) -> Option<Rect<f64>> {
    features
        .iter()
        .filter_map(|f| f.geometry.bounding_rect())
        .reduce(|a, b| {
            Rect::new(
                geo::Coord { x: a.min().x.min(b.min().x), y: a.min().y.min(b.min().y) },
                geo::Coord { x: a.max().x.max(b.max().x), y: a.max().y.max(b.max().y) },
            )
        })
}

fn push_ring(d: &mut String, ring: &LineString<f64>, projection: &Projection) {
    for (i, coord) in ring.coords().enumerate() {
        let (x, y) = projection.project(coord.x, coord.y);
        let cmd = if i == 0 { 'M' } else { 'L' };
        let _ = write!(d, "{}{:.2},{:.2}", cmd, x, y);
    }
    d.push('Z');
}

fn svg_path(geometry: &MultiPolygon<f64>, projection: &Projection) -> String {
    let mut d = String::new();
    for polygon in geometry {
        push_ring(&mut d, polygon.exterior(), projection);
        for interior in polygon.interiors() {
            push_ring(&mut d, interior, projection);
        }
    }
    d
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TooltipDetail {
    pub city: String,
    pub name: String,
    pub status: String,
}

/// Hover text for one region. Built from the first matching record only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tooltip {
    pub region_code: String,
    pub entries: u32,
    pub detail: Option<TooltipDetail>,
}

impl Tooltip {
    pub fn new(join_key: Option<&str>, entries: u32, first_match: Option<&Record>) -> Self {
        Self {
            region_code: display_or_na(join_key).to_string(),
            entries,
            detail: first_match.map(|r| TooltipDetail {
                city: display_or_na(r.city.as_deref()).to_string(),
                name: display_or_na(r.person_name.as_deref()).to_string(),
                status: display_or_na(r.status.as_deref()).to_string(),
            }),
        }
    }

    pub fn to_html(&self) -> String {
        let mut html = format!(
            "<strong>AC:</strong> {}<br><strong>Entries:</strong> {}",
            escape_html(&self.region_code),
            self.entries
        );
        match &self.detail {
            Some(d) => {
                let _ = write!(
                    html,
                    "<br><strong>City/Town/Village:</strong> {}<br><strong>Name:</strong> {}<br><strong>Status:</strong> {}",
                    escape_html(&d.city),
                    escape_html(&d.name),
                    escape_html(&d.status)
                );
            }
            None => {
                html.push_str("<br>");
                html.push_str(NO_DATA_LINE);
            }
        }
        html
    }
}

/// One drawn constituency. The page script swaps between the two fills on hover.
#[derive(Debug, Clone)]
pub struct RegionLayer {
    pub join_key: Option<String>,
    pub count: u32,
    pub base_fill: Rgb,
    pub hover_fill: Rgb,
    tooltip: Tooltip,
    path: String,
    geometry: MultiPolygon<f64>,
}

impl RegionLayer {
    pub fn tooltip(&self) -> &Tooltip {
        &self.tooltip
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

struct LayerIndex {
    index: usize,
    aabb: AABB<[f64; 2]>,
}

impl RTreeObject for LayerIndex {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        self.aabb
    }
}

/// The drawable map: region layers plus a spatial index for hit testing.
pub struct MapSurface {
    width: u32,
    height: u32,
    padding: f64,
    layers: Vec<RegionLayer>,
    tree: RTree<LayerIndex>,
}

impl MapSurface {
    pub fn new(config: &MapConfig) -> Self {
        Self {
            width: config.width,
            height: config.height,
            padding: config.padding,
            layers: Vec::new(),
            tree: RTree::new(),
        }
    }

    pub fn clear(&mut self) {
        self.layers.clear();
        self.tree = RTree::new();
    }

    /// Replace every layer with one per feature, coloured by its count.
    pub fn draw(&mut self, features: &[GeometryFeature], records: &[Record], counts: &CountMap) {
        self.clear();

        let scale = ColorScale::sequential_greens(counts.scale_domain());
        let projection = match bounds_of(features) {
            Some(bounds) => Projection::fit(bounds, self.width, self.height, self.padding),
            None => return,
        };

        for feature in features {
            let join_key = feature.join_key.as_deref();
            let count = join_key.map(|k| counts.get(k)).unwrap_or(0);
            let first_match = join_key.and_then(|k| records.iter().find(|r| r.region_code == k));
            if first_match.is_none() {
                debug!("No data for {}", display_or_na(join_key));
            }

            let base_fill = scale.color(count);
            self.layers.push(RegionLayer {
                join_key: feature.join_key.clone(),
                count,
                base_fill,
                hover_fill: base_fill.darker(HOVER_DARKEN),
                tooltip: Tooltip::new(join_key, count, first_match),
                path: svg_path(&feature.geometry, &projection),
                geometry: feature.geometry.clone(),
            });
        }

        let items = self
            .layers
            .iter()
            .enumerate()
            .filter_map(|(index, layer)| {
                layer.geometry.bounding_rect().map(|rect| LayerIndex {
                    index,
                    aabb: AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]),
                })
            })
            .collect();
        self.tree = RTree::bulk_load(items);
    }

    pub fn layers(&self) -> &[RegionLayer] {
        &self.layers
    }

    /// Index of the layer whose polygon contains the point.
    pub fn index_at(&self, lon: f64, lat: f64) -> Option<usize> {
        let point = Point::new(lon, lat);
        let envelope = AABB::from_point([lon, lat]);
        self.tree
            .locate_in_envelope_intersecting(&envelope)
            .map(|candidate| candidate.index)
            .find(|&i| self.layers[i].geometry.contains(&point))
    }

    pub fn region_at(&self, lon: f64, lat: f64) -> Option<&RegionLayer> {
        self.index_at(lon, lat).map(|i| &self.layers[i])
    }

    pub fn to_svg(&self) -> String {
        let mut svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" class="map" viewBox="0 0 {w} {h}" width="{w}" height="{h}">"#,
            w = self.width,
            h = self.height
        );
        for layer in &self.layers {
            let _ = write!(
                svg,
                r##"<path class="region" d="{d}" fill="{fill}" fill-opacity="0.7" stroke="#ffffff" stroke-width="2" fill-rule="evenodd" data-fill="{base}" data-hover-fill="{hover}" data-tooltip="{tooltip}"></path>"##,
                d = layer.path,
                fill = layer.base_fill,
                base = layer.base_fill,
                hover = layer.hover_fill,
                tooltip = escape_html(&layer.tooltip.to_html()),
            );
        }
        svg.push_str("</svg>");
        svg
    }
}

impl Default for MapSurface {
    fn default() -> Self {
        Self::new(&MapConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::counts_for;
    use crate::data::{parse_features, SAMPLE_GEOJSON};
    use crate::types::record;
    use pretty_assertions::assert_eq;

    fn features() -> Vec<GeometryFeature> {
        parse_features(SAMPLE_GEOJSON, "assem_name").unwrap()
    }

    fn records() -> Vec<Record> {
        vec![
            record("PK01", Some("Guntur"), Some("Alice"), Some("Done")),
            record("PK01", None, Some("Bob"), None),
            record("PK01", Some("Tenali"), Some("Cy"), Some("Open")),
        ]
    }

    #[test]
    fn counts_every_matching_record() {
        let records = records();
        let mut map = MapSurface::default();
        map.draw(&features(), &records, &counts_for(&records));

        let pk01 = &map.layers()[0];
        assert_eq!(pk01.count, 3);
        assert_eq!(pk01.tooltip().detail.as_ref().unwrap().name, "Alice");
        assert_eq!(pk01.base_fill.to_hex(), "#00441b");
    }

    #[test]
    fn unmatched_region_reads_no_data() {
        let records = records();
        let mut map = MapSurface::default();
        map.draw(&features(), &records, &counts_for(&records));

        let pk02 = &map.layers()[1];
        assert_eq!(pk02.count, 0);
        assert_eq!(
            pk02.tooltip().to_html(),
            "<strong>AC:</strong> PK02<br><strong>Entries:</strong> 0<br>No additional data available."
        );
    }

    #[test]
    fn redraw_replaces_layers() {
        let records = records();
        let mut map = MapSurface::default();
        map.draw(&features(), &records, &counts_for(&records));
        map.draw(&features(), &[], &counts_for(&[]));

        assert_eq!(map.layers().len(), 2);
        assert!(map.layers().iter().all(|l| l.count == 0));
    }

    fn attribute<'a>(element: &'a str, name: &str) -> &'a str {
        let key = format!(" {}=\"", name);
        let start = element.find(&key).map(|i| i + key.len()).unwrap();
        let end = start + element[start..].find('"').unwrap();
        &element[start..end]
    }

    #[test]
    fn svg_carries_base_and_hover_fills() {
        let records = records();
        let mut map = MapSurface::default();
        map.draw(&features(), &records, &counts_for(&records));
        let svg = map.to_svg();

        let paths: Vec<&str> = svg.split("<path").skip(1).collect();
        assert_eq!(paths.len(), map.layers().len());
        for (element, layer) in paths.iter().zip(map.layers()) {
            assert_eq!(attribute(element, "fill"), layer.base_fill.to_hex());
            assert_eq!(attribute(element, "data-fill"), layer.base_fill.to_hex());
            assert_eq!(attribute(element, "data-hover-fill"), layer.base_fill.darker(1.0).to_hex());
            assert_ne!(attribute(element, "data-hover-fill"), attribute(element, "data-fill"));
        }
        assert!(!svg.contains("<title>"));
    }

    #[test]
    fn svg_tooltip_attribute_is_escaped_markup() {
        let records = records();
        let mut map = MapSurface::default();
        map.draw(&features(), &records, &counts_for(&records));
        let svg = map.to_svg();

        let first = svg.split("<path").nth(1).unwrap();
        assert_eq!(
            attribute(first, "data-tooltip"),
            escape_html(&map.layers()[0].tooltip().to_html())
        );
    }

    #[test]
    fn hit_test_finds_containing_region() {
        let mut map = MapSurface::default();
        map.draw(&features(), &[], &counts_for(&[]));

        assert_eq!(map.region_at(81.5, 15.5).and_then(|l| l.join_key.as_deref()), Some("PK02"));
        assert!(map.region_at(70.0, 10.0).is_none());
    }

    #[test]
    fn projection_stays_inside_viewport() {
        let mut map = MapSurface::default();
        map.draw(&features(), &[], &counts_for(&[]));
        let svg = map.to_svg();

        assert_eq!(svg.matches("<path").count(), 2);
        let bounds = bounds_of(&features()).unwrap();
        let projection = Projection::fit(bounds, 960, 720, 16.0);
        let (x, y) = projection.project(bounds.min().x, bounds.max().y);
        assert!(x >= 15.9 && y >= 15.9);
        let (x, y) = projection.project(bounds.max().x, bounds.min().y);
        assert!(x <= 944.1 && y <= 704.1);
    }

    #[test]
    fn tooltip_text_is_escaped() {
        let tooltip = Tooltip::new(Some("PK01"), 1, Some(&record("PK01", Some("<b>"), Some("A&B"), None)));
        let html = tooltip.to_html();
        assert!(html.contains("&lt;b&gt;"));
        assert!(html.contains("A&amp;B"));
        assert!(html.contains("<strong>Status:</strong> N/A"));
    }
}
