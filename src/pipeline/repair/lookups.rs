//! Fixed lookup tables used by the field repairer.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeSet, HashMap, HashSet};

pub const UNITED_STATES: &str = "United States";
pub const PUERTO_RICO: &str = "Puerto Rico";

/// Malformed or non-English country tokens seen in the export, mapped to canonical names.
static COUNTRY_FIXES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    [
        ("EE. UU.", UNITED_STATES),
        ("EE.UU.", UNITED_STATES),
        ("Estados Unidos", UNITED_STATES),
        ("USA", UNITED_STATES),
        ("Alemania", "Germany"),
        ("Brasil", "Brazil"),
        ("Canadá", "Canada"),
        ("Corea del Sur", "South Korea"),
        ("España", "Spain"),
        ("Filipinas", "Philippines"),
        ("Francia", "France"),
        ("Italia", "Italy"),
        ("Japón", "Japan"),
        ("Marruecos", "Morocco"),
        ("México", "Mexico"),
        ("Países Bajos", "Netherlands"),
        ("Pakistán", "Pakistan"),
        ("Perú", "Peru"),
        ("Reino Unido", "United Kingdom"),
        ("República Dominicana", "Dominican Republic"),
        ("Rusia", "Russia"),
        ("Sudáfrica", "South Africa"),
        ("Suecia", "Sweden"),
        ("Suiza", "Switzerland"),
        ("Turquía", "Turkey"),
    ]
    .into_iter()
    .collect()
});

pub static US_STATE_CODES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "AL", "AK", "AZ", "AR", "CA", "CO", "CT", "DE", "DC", "FL", "GA", "HI", "ID", "IL", "IN",
        "IA", "KS", "KY", "LA", "ME", "MD", "MA", "MI", "MN", "MS", "MO", "MT", "NE", "NV", "NH",
        "NJ", "NM", "NY", "NC", "ND", "OH", "OK", "OR", "PA", "PR", "RI", "SC", "SD", "TN", "TX",
        "UT", "VT", "VA", "WA", "WV", "WI", "WY",
    ]
    .into_iter()
    .collect()
});

static ZIP_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{5}$").expect("valid regex"));

/// First-three-digit ZIP ranges, inclusive.
const ZIP3_RANGES: &[(u16, u16, &str)] = &[
    (5, 5, "NY"),
    (6, 7, "PR"),
    (9, 9, "PR"),
    (10, 27, "MA"),
    (28, 29, "RI"),
    (30, 38, "NH"),
    (39, 49, "ME"),
    (50, 59, "VT"),
    (60, 69, "CT"),
    (70, 89, "NJ"),
    (100, 149, "NY"),
    (150, 196, "PA"),
    (197, 199, "DE"),
    (200, 205, "DC"),
    (206, 219, "MD"),
    (220, 246, "VA"),
    (247, 268, "WV"),
    (270, 289, "NC"),
    (290, 299, "SC"),
    (300, 319, "GA"),
    (320, 349, "FL"),
    (350, 369, "AL"),
    (370, 385, "TN"),
    (386, 397, "MS"),
    (398, 399, "GA"),
    (400, 427, "KY"),
    (430, 459, "OH"),
    (460, 479, "IN"),
    (480, 499, "MI"),
    (500, 528, "IA"),
    (530, 549, "WI"),
    (550, 567, "MN"),
    (570, 577, "SD"),
    (580, 588, "ND"),
    (590, 599, "MT"),
    (600, 629, "IL"),
    (630, 658, "MO"),
    (660, 679, "KS"),
    (680, 693, "NE"),
    (700, 714, "LA"),
    (716, 729, "AR"),
    (730, 749, "OK"),
    (750, 799, "TX"),
    (800, 816, "CO"),
    (820, 831, "WY"),
    (832, 838, "ID"),
    (840, 847, "UT"),
    (850, 865, "AZ"),
    (870, 884, "NM"),
    (885, 885, "TX"),
    (889, 898, "NV"),
    (900, 961, "CA"),
    (967, 968, "HI"),
    (970, 979, "OR"),
    (980, 994, "WA"),
    (995, 999, "AK"),
];

/// Known customer cities and every state they occur in.
static CITY_STATES: Lazy<HashMap<&'static str, Vec<&'static str>>> = Lazy::new(|| {
    let mut map: HashMap<&'static str, Vec<&'static str>> = HashMap::new();
    for (city, state) in [
        ("Caguas", "PR"),
        ("San Juan", "PR"),
        ("Bayamon", "PR"),
        ("Los Angeles", "CA"),
        ("San Diego", "CA"),
        ("San Jose", "CA"),
        ("San Francisco", "CA"),
        ("Sacramento", "CA"),
        ("Fresno", "CA"),
        ("Elk Grove", "CA"),
        ("El Monte", "CA"),
        ("Santa Ana", "CA"),
        ("Chicago", "IL"),
        ("New York", "NY"),
        ("Brooklyn", "NY"),
        ("Bronx", "NY"),
        ("Philadelphia", "PA"),
        ("Houston", "TX"),
        ("Dallas", "TX"),
        ("San Antonio", "TX"),
        ("Phoenix", "AZ"),
        ("Denver", "CO"),
        ("Miami", "FL"),
        ("Seattle", "WA"),
        ("Detroit", "MI"),
        ("Columbus", "OH"),
        ("Columbus", "GA"),
        ("Springfield", "IL"),
        ("Springfield", "MA"),
        ("Springfield", "MO"),
        ("Portland", "OR"),
        ("Portland", "ME"),
    ] {
        map.entry(city).or_default().push(state);
    }
    map
});

/// Plausible replacement cities for a row whose city field holds its state code.
static CITY_CANDIDATES: Lazy<HashMap<&'static str, Vec<&'static str>>> = Lazy::new(|| {
    [
        (
            "CA",
            vec![
                "Los Angeles",
                "San Diego",
                "San Jose",
                "San Francisco",
                "Sacramento",
                "Fresno",
                "Elk Grove",
                "El Monte",
            ],
        ),
        ("NY", vec!["New York", "Brooklyn", "Bronx"]),
        ("TX", vec!["Houston", "Dallas", "San Antonio"]),
        ("IL", vec!["Chicago", "Springfield"]),
        ("PR", vec!["Caguas", "San Juan", "Bayamon"]),
    ]
    .into_iter()
    .collect()
});

pub fn canonical_country(value: &str) -> Option<&'static str> {
    COUNTRY_FIXES.get(value.trim()).copied()
}

pub fn is_malformed_country(value: &str) -> bool {
    canonical_country(value).is_some()
}

/// Exactly five ASCII digits.
pub fn is_zip_like(value: &str) -> bool {
    ZIP_PATTERN.is_match(value.trim())
}

pub fn is_state_code(value: &str) -> bool {
    as_state_code(value).is_some()
}

pub fn as_state_code(value: &str) -> Option<&'static str> {
    US_STATE_CODES.get(value.trim()).copied()
}

/// State for a ZIP code by its three-digit prefix.
pub fn state_for_zip(zip: &str) -> Option<&'static str> {
    let zip = zip.trim();
    if !is_zip_like(zip) {
        return None;
    }
    let prefix: u16 = zip[..3].parse().ok()?;
    ZIP3_RANGES
        .iter()
        .find(|(lo, hi, _)| (*lo..=*hi).contains(&prefix))
        .map(|(_, _, state)| *state)
}

/// Every state a city name is known to occur in. Empty when unknown.
pub fn states_for_city(city: &str) -> BTreeSet<&'static str> {
    CITY_STATES
        .get(city.trim())
        .map(|states| states.iter().copied().collect())
        .unwrap_or_default()
}

pub fn city_candidates(state: &str) -> Option<&'static [&'static str]> {
    CITY_CANDIDATES.get(state.trim()).map(|c| c.as_slice())
}

pub fn is_us_country(country: &str) -> bool {
    matches!(country.trim(), UNITED_STATES | PUERTO_RICO)
}
