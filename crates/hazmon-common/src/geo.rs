use regex::Regex;
use std::sync::LazyLock;

/// Mean Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two points in kilometers (haversine).
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
}

static COORDINATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d+(?:\.\d+)?)\s*°?\s*([NSns])\s*,\s*(\d+(?:\.\d+)?)\s*°?\s*([EWew])\s*$")
        .expect("coordinate pattern is valid")
});

/// Parse an admin-entered coordinate pair such as `"23.8041° N, 90.4152° E"`
/// into decimal `(latitude, longitude)`.
///
/// The degree sign is optional. Latitude must be within ±90 and longitude
/// within ±180; anything else is rejected with a descriptive message so the
/// CRUD boundary can surface it as a 400.
///
/// # Examples
///
/// ```
/// use hazmon_common::geo::parse_coordinates;
///
/// let (lat, lon) = parse_coordinates("23.8041° N, 90.4152° E").unwrap();
/// assert!((lat - 23.8041).abs() < 1e-9);
/// assert!((lon - 90.4152).abs() < 1e-9);
/// ```
pub fn parse_coordinates(input: &str) -> Result<(f64, f64), String> {
    let caps = COORDINATE_RE.captures(input).ok_or_else(|| {
        format!("invalid coordinate format '{input}', expected e.g. \"23.8041° N, 90.4152° E\"")
    })?;

    let lat: f64 = caps[1]
        .parse()
        .map_err(|_| format!("invalid latitude in '{input}'"))?;
    let lon: f64 = caps[3]
        .parse()
        .map_err(|_| format!("invalid longitude in '{input}'"))?;

    let lat = if caps[2].eq_ignore_ascii_case("S") {
        -lat
    } else {
        lat
    };
    let lon = if caps[4].eq_ignore_ascii_case("W") {
        -lon
    } else {
        lon
    };

    if !(-90.0..=90.0).contains(&lat) {
        return Err(format!("latitude {lat} out of range (-90..=90)"));
    }
    if !(-180.0..=180.0).contains(&lon) {
        return Err(format!("longitude {lon} out of range (-180..=180)"));
    }
    Ok((lat, lon))
}

/// Format decimal coordinates back into the admin display form.
pub fn format_coordinates(lat: f64, lon: f64) -> String {
    let ns = if lat < 0.0 { 'S' } else { 'N' };
    let ew = if lon < 0.0 { 'W' } else { 'E' };
    format!("{:.4}° {}, {:.4}° {}", lat.abs(), ns, lon.abs(), ew)
}
