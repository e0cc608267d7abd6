use std::fmt;

/// ColorBrewer "Greens", light to dark.
const GREENS: [&str; 9] = [
    "#f7fcf5", "#e5f5e0", "#c7e9c0", "#a1d99b", "#74c476", "#41ab5d", "#238b45", "#006d2c", "#00441b",
];

const DARKER: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Rgb {
    pub fn from_hex(hex: &str) -> Self {
        let hex = hex.trim_start_matches('#');
        let channel = |range: std::ops::Range<usize>| {
            hex.get(range)
                .and_then(|s| u8::from_str_radix(s, 16).ok())
                .unwrap_or(0) as f64
        };
        Rgb { r: channel(0..2), g: channel(2..4), b: channel(4..6) }
    }

    pub fn darker(&self, k: f64) -> Self {
        let factor = DARKER.powf(k);
        Rgb { r: self.r * factor, g: self.g * factor, b: self.b * factor }
    }

    pub fn to_hex(&self) -> String {
        let clamp = |v: f64| if v.is_finite() { v.round().clamp(0.0, 255.0) as u8 } else { 0 };
        format!("#{:02x}{:02x}{:02x}", clamp(self.r), clamp(self.g), clamp(self.b))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

// Uniform cubic B-spline weight for one segment.
fn basis(t1: f64, v0: f64, v1: f64, v2: f64, v3: f64) -> f64 {
    let t2 = t1 * t1;
    let t3 = t2 * t1;
    ((1.0 - 3.0 * t1 + 3.0 * t2 - t3) * v0
        + (4.0 - 6.0 * t2 + 3.0 * t3) * v1
        + (1.0 + 3.0 * t1 + 3.0 * t2 - 3.0 * t3) * v2
        + t3 * v3)
        / 6.0
}

fn spline(values: &[f64], t: f64) -> f64 {
    let n = values.len() - 1;
    let t = t.clamp(0.0, 1.0);
    let i = if t >= 1.0 { n - 1 } else { (t * n as f64).floor() as usize };
    let v1 = values[i];
    let v2 = values[i + 1];
    let v0 = if i > 0 { values[i - 1] } else { 2.0 * v1 - v2 };
    let v3 = if i < n - 1 { values[i + 2] } else { 2.0 * v2 - v1 };
    basis((t - i as f64 / n as f64) * n as f64, v0, v1, v2, v3)
}

/// Sequential count to colour mapping over `[min, max]`.
#[derive(Debug, Clone)]
pub struct ColorScale {
    domain: (f64, f64),
    stops: Vec<Rgb>,
}

impl ColorScale {
    pub fn sequential_greens(domain: (u32, u32)) -> Self {
        Self {
            domain: (domain.0 as f64, domain.1 as f64),
            stops: GREENS.iter().map(|hex| Rgb::from_hex(hex)).collect(),
        }
    }

    pub fn color(&self, value: u32) -> Rgb {
        let (lo, hi) = self.domain;
        let span = hi - lo;
        let t = if span > 0.0 { (value as f64 - lo) / span } else { 0.0 };

        let channel = |pick: fn(&Rgb) -> f64| {
            let values: Vec<f64> = self.stops.iter().map(pick).collect();
            spline(&values, t)
        };
        Rgb { r: channel(|c| c.r), g: channel(|c| c.g), b: channel(|c| c.b) }
    }
}
