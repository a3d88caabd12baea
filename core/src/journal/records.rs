//! Typed payloads for the journal event kinds the core understands.
//!
//! Field names follow the game's PascalCase journal keys. Every field that the
//! game may omit is an `Option` (or defaults to empty) so a sparse record
//! still decodes; unknown keys are ignored.

use serde::{Deserialize, Deserializer};

// ─────────────────────────────────────────────────────────────────────────────
// Parent references
// ─────────────────────────────────────────────────────────────────────────────

/// One entry of a scan's `Parents` list, nearest ancestor first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParentRef {
    Star(i64),
    Planet(i64),
    Ring(i64),
    /// Barycenter (shared orbital centre of mass).
    Null(i64),
}

impl ParentRef {
    pub fn id(&self) -> i64 {
        match *self {
            ParentRef::Star(id)
            | ParentRef::Planet(id)
            | ParentRef::Ring(id)
            | ParentRef::Null(id) => id,
        }
    }
}

/// Raw `{"Null": 1}` style object. An entry naming none of the known keys is
/// dropped rather than failing the whole scan.
#[derive(Deserialize)]
struct RawParent {
    #[serde(rename = "Star")]
    star: Option<i64>,
    #[serde(rename = "Planet")]
    planet: Option<i64>,
    #[serde(rename = "Ring")]
    ring: Option<i64>,
    #[serde(rename = "Null")]
    null: Option<i64>,
}

impl RawParent {
    fn into_ref(self) -> Option<ParentRef> {
        self.star
            .map(ParentRef::Star)
            .or(self.planet.map(ParentRef::Planet))
            .or(self.ring.map(ParentRef::Ring))
            .or(self.null.map(ParentRef::Null))
    }
}

fn deserialize_parents<'de, D>(deserializer: D) -> Result<Vec<ParentRef>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Vec<RawParent>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(RawParent::into_ref)
        .collect())
}

// ─────────────────────────────────────────────────────────────────────────────
// Exploration
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RingInfo {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "RingClass")]
    pub ring_class: Option<String>,
    #[serde(rename = "MassMT")]
    pub mass_mt: Option<f64>,
    #[serde(rename = "InnerRad")]
    pub inner_radius: Option<f64>,
    #[serde(rename = "OuterRad")]
    pub outer_radius: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MaterialShare {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Percent")]
    pub percent: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Composition {
    #[serde(rename = "Ice", default)]
    pub ice: f64,
    #[serde(rename = "Rock", default)]
    pub rock: f64,
    #[serde(rename = "Metal", default)]
    pub metal: f64,
}

/// Orbital elements shared by every orbiting body.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Orbit {
    #[serde(rename = "SemiMajorAxis")]
    pub semi_major_axis: Option<f64>,
    #[serde(rename = "Eccentricity")]
    pub eccentricity: Option<f64>,
    #[serde(rename = "OrbitalInclination")]
    pub inclination: Option<f64>,
    #[serde(rename = "Periapsis")]
    pub periapsis: Option<f64>,
    #[serde(rename = "OrbitalPeriod")]
    pub orbital_period: Option<f64>,
    #[serde(rename = "RotationPeriod")]
    pub rotation_period: Option<f64>,
    #[serde(rename = "AxialTilt")]
    pub axial_tilt: Option<f64>,
}

/// A detailed or automatic scan of one celestial body.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScanEvent {
    #[serde(rename = "ScanType")]
    pub scan_type: Option<String>,
    #[serde(rename = "BodyName")]
    pub body_name: String,
    #[serde(rename = "BodyID")]
    pub body_id: i64,
    #[serde(rename = "StarSystem")]
    pub star_system: Option<String>,
    #[serde(rename = "SystemAddress")]
    pub system_address: Option<u64>,
    #[serde(rename = "DistanceFromArrivalLS", default)]
    pub distance_from_arrival_ls: f64,
    #[serde(rename = "Parents", default, deserialize_with = "deserialize_parents")]
    pub parents: Vec<ParentRef>,

    // Stars
    #[serde(rename = "StarType")]
    pub star_type: Option<String>,
    #[serde(rename = "Subclass")]
    pub subclass: Option<i32>,
    #[serde(rename = "StellarMass")]
    pub stellar_mass: Option<f64>,
    #[serde(rename = "AbsoluteMagnitude")]
    pub absolute_magnitude: Option<f64>,
    #[serde(rename = "Age_MY")]
    pub age_my: Option<f64>,
    #[serde(rename = "Luminosity")]
    pub luminosity: Option<String>,

    // Planets
    #[serde(rename = "PlanetClass")]
    pub planet_class: Option<String>,
    #[serde(rename = "TerraformState")]
    pub terraform_state: Option<String>,
    #[serde(rename = "Atmosphere")]
    pub atmosphere: Option<String>,
    #[serde(rename = "AtmosphereType")]
    pub atmosphere_type: Option<String>,
    #[serde(rename = "Volcanism")]
    pub volcanism: Option<String>,
    #[serde(rename = "MassEM")]
    pub mass_em: Option<f64>,
    #[serde(rename = "SurfaceGravity")]
    pub surface_gravity: Option<f64>,
    #[serde(rename = "SurfacePressure")]
    pub surface_pressure: Option<f64>,
    #[serde(rename = "Landable")]
    pub landable: Option<bool>,
    #[serde(rename = "TidalLock")]
    pub tidal_lock: Option<bool>,
    #[serde(rename = "Materials", default)]
    pub materials: Vec<MaterialShare>,
    #[serde(rename = "Composition")]
    pub composition: Option<Composition>,

    // Shared
    #[serde(rename = "Radius")]
    pub radius: Option<f64>,
    #[serde(rename = "SurfaceTemperature")]
    pub surface_temperature: Option<f64>,
    #[serde(rename = "Rings", default)]
    pub rings: Vec<RingInfo>,
    #[serde(rename = "ReserveLevel")]
    pub reserve_level: Option<String>,
    #[serde(flatten)]
    pub orbit: Orbit,
    #[serde(rename = "WasDiscovered")]
    pub was_discovered: Option<bool>,
    #[serde(rename = "WasMapped")]
    pub was_mapped: Option<bool>,
}

impl ScanEvent {
    /// Barycenter ids referenced anywhere in this body's ancestry.
    pub fn barycenter_ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.parents.iter().filter_map(|p| match p {
            ParentRef::Null(id) => Some(*id),
            _ => None,
        })
    }

    /// Nearest ancestor entry, if any.
    pub fn direct_parent(&self) -> Option<ParentRef> {
        self.parents.first().copied()
    }
}

/// A signal source found by the full spectrum scanner.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SignalEvent {
    #[serde(rename = "SystemAddress")]
    pub system_address: Option<u64>,
    #[serde(rename = "SignalName")]
    pub signal_name: String,
    #[serde(rename = "SignalName_Localised")]
    pub signal_name_localised: Option<String>,
    #[serde(rename = "SignalType")]
    pub signal_type: Option<String>,
    #[serde(rename = "IsStation")]
    pub is_station: Option<bool>,
    #[serde(rename = "USSType_Localised")]
    pub uss_type_localised: Option<String>,
    #[serde(rename = "ThreatLevel")]
    pub threat_level: Option<i32>,
    #[serde(rename = "TimeRemaining")]
    pub time_remaining: Option<f64>,
}

impl SignalEvent {
    pub fn display_name(&self) -> &str {
        self.signal_name_localised
            .as_deref()
            .unwrap_or(&self.signal_name)
    }
}

/// Shared payload of `Location`, `FSDJump` and `CarrierJump`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LocationEvent {
    #[serde(rename = "StarSystem")]
    pub star_system: String,
    #[serde(rename = "SystemAddress")]
    pub system_address: u64,
    #[serde(rename = "StarPos")]
    pub star_pos: Option<[f64; 3]>,
    #[serde(rename = "Body")]
    pub body: Option<String>,
    #[serde(rename = "BodyID")]
    pub body_id: Option<i64>,
    #[serde(rename = "BodyType")]
    pub body_type: Option<String>,
    #[serde(rename = "Docked")]
    pub docked: Option<bool>,
    #[serde(rename = "StationName")]
    pub station_name: Option<String>,
    #[serde(rename = "JumpDist")]
    pub jump_dist: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DiscoveryScanEvent {
    #[serde(rename = "SystemName")]
    pub system_name: Option<String>,
    #[serde(rename = "SystemAddress")]
    pub system_address: Option<u64>,
    #[serde(rename = "Progress")]
    pub progress: Option<f64>,
    #[serde(rename = "BodyCount", default)]
    pub body_count: u32,
    #[serde(rename = "NonBodyCount", default)]
    pub non_body_count: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AllBodiesFoundEvent {
    #[serde(rename = "SystemName")]
    pub system_name: Option<String>,
    #[serde(rename = "SystemAddress")]
    pub system_address: Option<u64>,
    #[serde(rename = "Count", default)]
    pub count: u32,
}

// ─────────────────────────────────────────────────────────────────────────────
// Session and commander
// ─────────────────────────────────────────────────────────────────────────────

/// First line of every journal file. Its keys are lowercase.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FileHeaderEvent {
    pub part: Option<u32>,
    pub language: Option<String>,
    #[serde(rename = "gameversion")]
    pub game_version: Option<String>,
    pub build: Option<String>,
    #[serde(rename = "Odyssey")]
    pub odyssey: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CommanderEvent {
    #[serde(rename = "FID")]
    pub fid: Option<String>,
    #[serde(rename = "Name")]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoadGameEvent {
    #[serde(rename = "FID")]
    pub fid: Option<String>,
    #[serde(rename = "Commander")]
    pub commander: String,
    #[serde(rename = "Ship")]
    pub ship: Option<String>,
    #[serde(rename = "ShipName")]
    pub ship_name: Option<String>,
    #[serde(rename = "GameMode")]
    pub game_mode: Option<String>,
    #[serde(rename = "Credits")]
    pub credits: Option<i64>,
}

/// Rank levels (`Rank`) or progress towards the next level in percent
/// (`Progress`); both events share the same keys.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RankEvent {
    #[serde(rename = "Combat")]
    pub combat: Option<u32>,
    #[serde(rename = "Trade")]
    pub trade: Option<u32>,
    #[serde(rename = "Explore")]
    pub explore: Option<u32>,
    #[serde(rename = "Soldier")]
    pub soldier: Option<u32>,
    #[serde(rename = "Exobiologist")]
    pub exobiologist: Option<u32>,
    #[serde(rename = "Empire")]
    pub empire: Option<u32>,
    #[serde(rename = "Federation")]
    pub federation: Option<u32>,
    #[serde(rename = "CQC")]
    pub cqc: Option<u32>,
}

impl RankEvent {
    /// `(career, value)` pairs for every career present in the record.
    pub fn entries(&self) -> Vec<(&'static str, u32)> {
        [
            ("Combat", self.combat),
            ("Trade", self.trade),
            ("Explore", self.explore),
            ("Soldier", self.soldier),
            ("Exobiologist", self.exobiologist),
            ("Empire", self.empire),
            ("Federation", self.federation),
            ("CQC", self.cqc),
        ]
        .into_iter()
        .filter_map(|(career, value)| value.map(|v| (career, v)))
        .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CargoItem {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Name_Localised")]
    pub name_localised: Option<String>,
    #[serde(rename = "Count", default)]
    pub count: u32,
    #[serde(rename = "Stolen", default)]
    pub stolen: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CargoEvent {
    #[serde(rename = "Vessel")]
    pub vessel: Option<String>,
    #[serde(rename = "Count", default)]
    pub count: u32,
    /// Omitted by the game when the manifest is only written to `Cargo.json`.
    #[serde(rename = "Inventory")]
    pub inventory: Option<Vec<CargoItem>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MaterialCount {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Name_Localised")]
    pub name_localised: Option<String>,
    #[serde(rename = "Count", default)]
    pub count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MaterialsEvent {
    #[serde(rename = "Raw", default)]
    pub raw: Vec<MaterialCount>,
    #[serde(rename = "Manufactured", default)]
    pub manufactured: Vec<MaterialCount>,
    #[serde(rename = "Encoded", default)]
    pub encoded: Vec<MaterialCount>,
}
