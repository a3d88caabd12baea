//! Reconstructed scene-graph nodes.
//!
//! Every node is one [`CelestialBody`]: a [`BodyKind`] tag plus a shared
//! [`BodyAttributes`] record of optional kind-specific fields. Display text is
//! computed by pure functions matching on the kind.

use starlog_types::DisplayContext;
use starlog_types::formatting::{
    format_decimal_f64, format_distance_ls, format_radius_km, format_temperature_k,
};

use crate::journal::{ScanEvent, SignalEvent};

/// Body id of nodes that were not produced by a scan (root, stations, signals).
pub const SYNTHETIC_BODY_ID: i64 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StationKind {
    Coriolis,
    Orbis,
    Cylinder,
    Ocellus,
    AsteroidBase,
    Outpost,
    Settlement,
    Megaship,
    FleetCarrier,
    Unknown,
}

impl StationKind {
    pub fn label(self) -> &'static str {
        match self {
            StationKind::Coriolis => "Coriolis starport",
            StationKind::Orbis => "Orbis starport",
            StationKind::Cylinder => "Cylinder starport",
            StationKind::Ocellus => "Ocellus starport",
            StationKind::AsteroidBase => "Asteroid base",
            StationKind::Outpost => "Outpost",
            StationKind::Settlement => "Settlement",
            StationKind::Megaship => "Megaship",
            StationKind::FleetCarrier => "Fleet carrier",
            StationKind::Unknown => "Station",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    ConflictZone,
    ResourceExtraction,
    NavBeacon,
    TouristBeacon,
    Installation,
    UnknownSignal,
    Titan,
    PointOfInterest,
}

impl SignalKind {
    pub fn label(self) -> &'static str {
        match self {
            SignalKind::ConflictZone => "Conflict zone",
            SignalKind::ResourceExtraction => "Resource extraction site",
            SignalKind::NavBeacon => "Nav beacon",
            SignalKind::TouristBeacon => "Tourist beacon",
            SignalKind::Installation => "Installation",
            SignalKind::UnknownSignal => "Unidentified signal source",
            SignalKind::Titan => "Titan",
            SignalKind::PointOfInterest => "Point of interest",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyKind {
    SystemRoot { address: u64 },
    Star,
    Planet,
    Ring,
    BeltCluster,
    Station(StationKind),
    Signal(SignalKind),
    Generic,
}

/// Kind-specific fields mirrored from the originating event. Fields that do
/// not apply to a kind stay `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BodyAttributes {
    pub distance_ls: Option<f64>,
    pub star_type: Option<String>,
    pub subclass: Option<i32>,
    pub luminosity: Option<String>,
    pub stellar_mass: Option<f64>,
    pub age_my: Option<f64>,
    pub planet_class: Option<String>,
    pub atmosphere: Option<String>,
    pub terraform_state: Option<String>,
    pub volcanism: Option<String>,
    pub mass_em: Option<f64>,
    pub radius_m: Option<f64>,
    pub surface_gravity: Option<f64>,
    pub surface_temperature: Option<f64>,
    pub landable: Option<bool>,
    pub ring_count: usize,
    pub reserve_level: Option<String>,
    pub was_discovered: Option<bool>,
    pub was_mapped: Option<bool>,
    pub signal_type: Option<String>,
    pub threat_level: Option<i32>,
}

impl From<&ScanEvent> for BodyAttributes {
    fn from(scan: &ScanEvent) -> Self {
        Self {
            distance_ls: Some(scan.distance_from_arrival_ls),
            star_type: scan.star_type.clone(),
            subclass: scan.subclass,
            luminosity: scan.luminosity.clone(),
            stellar_mass: scan.stellar_mass,
            age_my: scan.age_my,
            planet_class: scan.planet_class.clone(),
            atmosphere: scan.atmosphere.clone().filter(|a| !a.is_empty()),
            terraform_state: scan.terraform_state.clone().filter(|t| !t.is_empty()),
            volcanism: scan.volcanism.clone().filter(|v| !v.is_empty()),
            mass_em: scan.mass_em,
            radius_m: scan.radius,
            surface_gravity: scan.surface_gravity,
            surface_temperature: scan.surface_temperature,
            landable: scan.landable,
            ring_count: scan.rings.len(),
            reserve_level: scan.reserve_level.clone(),
            was_discovered: scan.was_discovered,
            was_mapped: scan.was_mapped,
            ..Default::default()
        }
    }
}

impl From<&SignalEvent> for BodyAttributes {
    fn from(signal: &SignalEvent) -> Self {
        Self {
            signal_type: signal.signal_type.clone(),
            threat_level: signal.threat_level,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CelestialBody {
    pub body_id: i64,
    pub name: String,
    pub kind: BodyKind,
    pub attributes: BodyAttributes,
    pub children: Vec<CelestialBody>,
}

impl CelestialBody {
    pub fn system_root(name: &str, address: u64) -> Self {
        Self {
            body_id: SYNTHETIC_BODY_ID,
            name: name.to_string(),
            kind: BodyKind::SystemRoot { address },
            attributes: BodyAttributes::default(),
            children: Vec::new(),
        }
    }

    pub fn from_scan(scan: &ScanEvent, kind: BodyKind) -> Self {
        Self {
            body_id: scan.body_id,
            name: scan.body_name.clone(),
            kind,
            attributes: BodyAttributes::from(scan),
            children: Vec::new(),
        }
    }

    pub fn from_signal(signal: &SignalEvent, kind: BodyKind) -> Self {
        Self {
            body_id: SYNTHETIC_BODY_ID,
            name: signal.display_name().to_string(),
            kind,
            attributes: BodyAttributes::from(signal),
            children: Vec::new(),
        }
    }

    pub fn is_synthetic(&self) -> bool {
        self.body_id == SYNTHETIC_BODY_ID
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(CelestialBody::node_count).sum::<usize>()
    }

    /// Depth-first search by body id.
    pub fn find(&self, body_id: i64) -> Option<&CelestialBody> {
        if self.body_id == body_id {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(body_id))
    }

    /// Pre-order walk of the subtree with each node's depth.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a CelestialBody, usize)) {
        self.walk_at(0, visit);
    }

    fn walk_at<'a>(&'a self, depth: usize, visit: &mut impl FnMut(&'a CelestialBody, usize)) {
        visit(self, depth);
        for child in &self.children {
            child.walk_at(depth + 1, visit);
        }
    }

    pub fn child_ids(&self) -> Vec<i64> {
        self.children.iter().map(|c| c.body_id).collect()
    }

    /// Short type label, e.g. `"K star"` or `"High metal content body"`.
    pub fn type_label(&self) -> String {
        let a = &self.attributes;
        match self.kind {
            BodyKind::SystemRoot { .. } => "Star system".to_string(),
            BodyKind::Star => match &a.star_type {
                Some(t) => format!("{} star", t),
                None => "Star".to_string(),
            },
            BodyKind::Planet => a
                .planet_class
                .clone()
                .unwrap_or_else(|| "Planet".to_string()),
            BodyKind::Ring => "Ring".to_string(),
            BodyKind::BeltCluster => "Belt cluster".to_string(),
            BodyKind::Station(kind) => kind.label().to_string(),
            BodyKind::Signal(kind) => kind.label().to_string(),
            BodyKind::Generic => a
                .signal_type
                .clone()
                .unwrap_or_else(|| "Signal".to_string()),
        }
    }

    /// One-line detail text for the node.
    pub fn summary(&self, ctx: &DisplayContext) -> String {
        let a = &self.attributes;
        let eu = ctx.european;
        let mut parts: Vec<String> = Vec::new();

        match self.kind {
            BodyKind::SystemRoot { address } => {
                parts.push(format!("{} bodies", self.node_count() - 1));
                parts.push(format!("address {}", address));
            }
            BodyKind::Star => {
                let class = match (&a.star_type, a.subclass, &a.luminosity) {
                    (Some(t), Some(sub), Some(lum)) => Some(format!("Class {}{} {}", t, sub, lum)),
                    (Some(t), Some(sub), None) => Some(format!("Class {}{}", t, sub)),
                    (Some(t), None, _) => Some(format!("Class {}", t)),
                    _ => None,
                };
                parts.extend(class);
                if let Some(mass) = a.stellar_mass {
                    parts.push(format!("{} solar masses", format_decimal_f64(mass, 2, eu)));
                }
                if let Some(age) = a.age_my {
                    parts.push(format!("{} My", format_decimal_f64(age, 0, eu)));
                }
            }
            BodyKind::Planet => {
                if let Some(mass) = a.mass_em {
                    parts.push(format!("{} EM", format_decimal_f64(mass, 2, eu)));
                }
                if let Some(radius) = a.radius_m {
                    parts.push(format_radius_km(radius, eu));
                }
                if let Some(temp) = a.surface_temperature {
                    parts.push(format_temperature_k(temp));
                }
                if a.landable == Some(true) {
                    parts.push("Landable".to_string());
                }
                if let Some(state) = &a.terraform_state {
                    parts.push(state.clone());
                }
            }
            BodyKind::Ring | BodyKind::BeltCluster => {
                parts.extend(a.reserve_level.clone());
            }
            BodyKind::Station(_) | BodyKind::Signal(_) | BodyKind::Generic => {
                if let Some(threat) = a.threat_level.filter(|t| *t > 0) {
                    parts.push(format!("Threat {}", threat));
                }
            }
        }

        if let Some(distance) = a.distance_ls {
            parts.push(format_distance_ls(distance, eu));
        }
        parts.join(" · ")
    }
}

/// A ring or belt cluster whose parent is known but which is not placed in
/// the hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub struct DetachedBody {
    pub body: CelestialBody,
    pub parent_id: Option<i64>,
}

/// Result of one hierarchy rebuild.
#[derive(Debug, Clone, PartialEq)]
pub struct SystemTree {
    pub root: CelestialBody,
    pub detached: Vec<DetachedBody>,
}

impl SystemTree {
    pub fn system_address(&self) -> Option<u64> {
        match self.root.kind {
            BodyKind::SystemRoot { address } => Some(address),
            _ => None,
        }
    }

    /// Scanned bodies held by this tree, placed or detached.
    pub fn body_count(&self) -> usize {
        self.root.node_count() - 1 + self.detached.len()
    }

    pub fn find(&self, body_id: i64) -> Option<&CelestialBody> {
        self.root
            .children
            .iter()
            .find_map(|c| c.find(body_id))
            .or_else(|| {
                self.detached
                    .iter()
                    .map(|d| &d.body)
                    .find(|b| b.body_id == body_id)
            })
    }

    /// Indented outline of the hierarchy, one node per line.
    pub fn outline(&self, ctx: &DisplayContext) -> String {
        let mut out = String::new();
        self.root.walk(&mut |body, depth| {
            let summary = body.summary(ctx);
            out.push_str(&"  ".repeat(depth));
            out.push_str(&body.name);
            out.push_str(" [");
            out.push_str(&body.type_label());
            out.push(']');
            if !summary.is_empty() {
                out.push_str(" ");
                out.push_str(&summary);
            }
            out.push('\n');
        });
        out
    }
}
