use std::sync::Arc;

use hashbrown::{HashMap, HashSet};

use crate::journal::{ParentRef, ScanEvent, SignalEvent};

use super::body::{CelestialBody, DetachedBody, SystemTree};
use super::classify::{ScanClass, SignalBucket, classify_scan, classify_signal};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MapState {
    /// No system established yet.
    #[default]
    Empty,
    /// A location event fixed the system; nothing accepted since.
    Rooted,
    /// Scans or signals accepted since the last rebuild.
    Populated,
    /// Hierarchy rebuilt from the current tables.
    Hierarchical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    Accepted(ScanClass),
    RejectedNoSystem,
    RejectedForeignSystem,
    RejectedDuplicate,
}

impl ScanOutcome {
    pub fn is_accepted(self) -> bool {
        matches!(self, ScanOutcome::Accepted(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalOutcome {
    Accepted(SignalBucket),
    RejectedNoSystem,
    RejectedForeignSystem,
}

impl SignalOutcome {
    pub fn is_accepted(self) -> bool {
        matches!(self, SignalOutcome::Accepted(_))
    }
}

#[derive(Debug, Clone)]
struct RootInfo {
    name: String,
    address: u64,
}

#[derive(Debug, Clone)]
struct ScanEntry {
    scan: ScanEvent,
    class: ScanClass,
}

/// Accumulates the scans and signals of one star system and derives the
/// body hierarchy from them.
///
/// All per-system tables are dropped by [`establish_root`](Self::establish_root).
/// Trees already handed out as `Arc<SystemTree>` are unaffected.
#[derive(Debug, Default)]
pub struct SystemMapBuilder {
    root: Option<RootInfo>,
    state: MapState,

    scans: HashMap<i64, ScanEntry>,
    /// Body ids in acceptance order.
    accepted: Vec<i64>,

    stations: HashMap<String, CelestialBody>,
    signals: HashMap<String, CelestialBody>,
    generic: HashMap<String, CelestialBody>,

    /// Resolved parent of every non-star body, filled by the last rebuild.
    parents: HashMap<i64, i64>,

    dirty: bool,
    tree: Option<Arc<SystemTree>>,
}

impl SystemMapBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MapState {
        self.state
    }

    pub fn system_address(&self) -> Option<u64> {
        self.root.as_ref().map(|r| r.address)
    }

    pub fn system_name(&self) -> Option<&str> {
        self.root.as_ref().map(|r| r.name.as_str())
    }

    pub fn scan_count(&self) -> usize {
        self.accepted.len()
    }

    /// True when something was accepted since the last rebuild.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Most recently built tree. May belong to the previous system until the
    /// next rebuild replaces it.
    pub fn tree(&self) -> Option<Arc<SystemTree>> {
        self.tree.clone()
    }

    /// Parent resolved for `body_id` by the last rebuild.
    pub fn parent_of(&self, body_id: i64) -> Option<i64> {
        self.parents.get(&body_id).copied()
    }

    pub fn stations(&self) -> Vec<&CelestialBody> {
        sorted_by_name(&self.stations)
    }

    pub fn signals(&self) -> Vec<&CelestialBody> {
        sorted_by_name(&self.signals)
    }

    pub fn generic_signals(&self) -> Vec<&CelestialBody> {
        sorted_by_name(&self.generic)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accumulation
    // ─────────────────────────────────────────────────────────────────────────

    /// Start a new epoch for `address`. Always resets, even when the address
    /// is unchanged.
    pub fn establish_root(&mut self, name: &str, address: u64) {
        self.root = Some(RootInfo {
            name: name.to_string(),
            address,
        });
        self.scans.clear();
        self.accepted.clear();
        self.stations.clear();
        self.signals.clear();
        self.generic.clear();
        self.parents.clear();
        self.dirty = false;
        self.state = MapState::Rooted;
        tracing::debug!(system = name, address, "System root established");
    }

    pub fn add_scan(&mut self, scan: ScanEvent) -> ScanOutcome {
        let Some(root) = &self.root else {
            tracing::debug!(body = %scan.body_name, "Scan before any location, ignored");
            return ScanOutcome::RejectedNoSystem;
        };
        if !belongs_to_root(root, &scan) {
            tracing::debug!(
                body = %scan.body_name,
                body_id = scan.body_id,
                scan_address = ?scan.system_address,
                system = %root.name,
                "Scan for a different system, ignored"
            );
            return ScanOutcome::RejectedForeignSystem;
        }
        if self.scans.contains_key(&scan.body_id) {
            tracing::debug!(
                body = %scan.body_name,
                body_id = scan.body_id,
                "Duplicate scan, keeping first"
            );
            return ScanOutcome::RejectedDuplicate;
        }

        let class = classify_scan(&scan);
        self.accepted.push(scan.body_id);
        self.scans.insert(scan.body_id, ScanEntry { scan, class });
        self.mark_populated();
        ScanOutcome::Accepted(class)
    }

    pub fn add_signal(&mut self, signal: &SignalEvent) -> SignalOutcome {
        let Some(root) = &self.root else {
            return SignalOutcome::RejectedNoSystem;
        };
        if signal.system_address.is_some_and(|a| a != root.address) {
            tracing::debug!(
                signal = %signal.signal_name,
                signal_address = ?signal.system_address,
                system = %root.name,
                "Signal for a different system, ignored"
            );
            return SignalOutcome::RejectedForeignSystem;
        }

        let bucket = classify_signal(signal);
        let key = signal.signal_name.clone();
        let node = CelestialBody::from_signal(signal, bucket.body_kind());

        // A name lives in exactly one table
        self.stations.remove(&key);
        self.signals.remove(&key);
        self.generic.remove(&key);
        let table = match bucket {
            SignalBucket::Station(_) => &mut self.stations,
            SignalBucket::Signal(_) => &mut self.signals,
            SignalBucket::Generic => &mut self.generic,
        };
        table.insert(key, node);
        self.mark_populated();
        SignalOutcome::Accepted(bucket)
    }

    fn mark_populated(&mut self) {
        self.dirty = true;
        self.state = MapState::Populated;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Hierarchy
    // ─────────────────────────────────────────────────────────────────────────

    /// Re-derive the tree from the accumulated tables.
    ///
    /// The result depends only on the set of accepted scans and their
    /// acceptance order, so repeated calls yield identical trees. Returns
    /// `None` before any system is established.
    pub fn rebuild_hierarchy(&mut self) -> Option<Arc<SystemTree>> {
        let root_info = self.root.as_ref()?;

        let mut stars: Vec<i64> = self.ids_of(ScanClass::Star).collect();
        stars.sort_unstable();
        let lowest_star = stars.first().copied();

        let mut parents: HashMap<i64, i64> = HashMap::new();
        for &id in &self.accepted {
            let Some(entry) = self.scans.get(&id) else {
                continue;
            };
            if entry.class == ScanClass::Star {
                continue;
            }
            if let Some(parent) = self.resolve_parent(&entry.scan, &stars) {
                parents.insert(id, parent);
            }
        }

        // Planet edges that can be placed as-is: star parents, and planet
        // parents that do not loop back
        let planets: Vec<i64> = self.ids_of(ScanClass::Planet).collect();
        let planet_edges: HashMap<i64, i64> = planets
            .iter()
            .filter_map(|id| {
                let parent = *parents.get(id)?;
                (self.class_of(parent) == Some(ScanClass::Planet)).then_some((*id, parent))
            })
            .collect();

        let mut children: HashMap<i64, Vec<i64>> = HashMap::new();
        let mut root_planets: Vec<i64> = Vec::new();
        for &id in &planets {
            let placed = match parents.get(&id).map(|p| (*p, self.class_of(*p))) {
                Some((p, Some(ScanClass::Star))) => Some(p),
                Some((p, Some(ScanClass::Planet))) if !loops_back(id, &planet_edges) => Some(p),
                _ => lowest_star,
            };
            match placed {
                Some(parent) => {
                    parents.insert(id, parent);
                    let siblings = children.entry(parent).or_default();
                    if self.class_of(parent) == Some(ScanClass::Star) {
                        let at = siblings
                            .iter()
                            .take_while(|s| self.class_of(**s) == Some(ScanClass::Planet))
                            .count();
                        siblings.insert(at, id);
                    } else {
                        siblings.push(id);
                    }
                }
                None => {
                    parents.remove(&id);
                    root_planets.push(id);
                }
            }
        }

        let mut root = CelestialBody::system_root(&root_info.name, root_info.address);
        root.children = stars
            .iter()
            .chain(root_planets.iter())
            .filter_map(|id| self.materialize(*id, &children))
            .collect();

        let detached = self
            .accepted
            .iter()
            .filter_map(|id| self.scans.get(id))
            .filter(|e| matches!(e.class, ScanClass::Ring | ScanClass::BeltCluster))
            .map(|e| DetachedBody {
                body: CelestialBody::from_scan(&e.scan, e.class.body_kind()),
                parent_id: parents.get(&e.scan.body_id).copied(),
            })
            .collect();

        let tree = Arc::new(SystemTree { root, detached });
        self.parents = parents;
        self.tree = Some(tree.clone());
        self.dirty = false;
        self.state = MapState::Hierarchical;
        Some(tree)
    }

    /// Direct parent by the nearest parent entry, then any other listed
    /// known star, planet or ring in that order, else barycenter
    /// disambiguation among the known stars.
    fn resolve_parent(&self, scan: &ScanEvent, stars: &[i64]) -> Option<i64> {
        let listed = || {
            scan.parents
                .iter()
                .filter(|p| !matches!(p, ParentRef::Null(_)))
                .map(ParentRef::id)
        };
        let placeable = |id: i64| {
            matches!(
                self.class_of(id),
                Some(ScanClass::Star | ScanClass::Planet | ScanClass::Ring)
            )
        };

        if let Some(direct) = scan.direct_parent() {
            if !matches!(direct, ParentRef::Null(_)) && placeable(direct.id()) {
                return Some(direct.id());
            }
        }
        for wanted in [ScanClass::Star, ScanClass::Planet, ScanClass::Ring] {
            if let Some(id) = listed().find(|id| self.class_of(*id) == Some(wanted)) {
                return Some(id);
            }
        }
        self.disambiguate_barycenter(scan, stars)
    }

    /// `stars` must be sorted ascending.
    fn disambiguate_barycenter(&self, scan: &ScanEvent, stars: &[i64]) -> Option<i64> {
        match stars {
            [] => None,
            [only] => Some(*only),
            _ => {
                let wanted: HashSet<i64> = scan.barycenter_ids().collect();
                let mut any_star_data = false;
                let mut lowest_match = None;
                for &star in stars {
                    let Some(entry) = self.scans.get(&star) else {
                        continue;
                    };
                    let ids: Vec<i64> = entry.scan.barycenter_ids().collect();
                    any_star_data |= !ids.is_empty();
                    if lowest_match.is_none() && ids.iter().any(|id| wanted.contains(id)) {
                        lowest_match = Some(star);
                    }
                }
                if any_star_data {
                    lowest_match
                } else {
                    stars.first().copied()
                }
            }
        }
    }

    fn materialize(&self, id: i64, children: &HashMap<i64, Vec<i64>>) -> Option<CelestialBody> {
        let entry = self.scans.get(&id)?;
        let mut node = CelestialBody::from_scan(&entry.scan, entry.class.body_kind());
        if let Some(kids) = children.get(&id) {
            node.children = kids
                .iter()
                .filter_map(|kid| self.materialize(*kid, children))
                .collect();
        }
        Some(node)
    }

    fn class_of(&self, body_id: i64) -> Option<ScanClass> {
        self.scans.get(&body_id).map(|e| e.class)
    }

    fn ids_of(&self, class: ScanClass) -> impl Iterator<Item = i64> + '_ {
        self.accepted
            .iter()
            .copied()
            .filter(move |id| self.class_of(*id) == Some(class))
    }
}

/// Address match, or for records without one, the body name starting with
/// the system name.
fn belongs_to_root(root: &RootInfo, scan: &ScanEvent) -> bool {
    if scan.system_address == Some(root.address) {
        return true;
    }
    let system = root.name.to_lowercase();
    let body = scan.body_name.to_lowercase();
    match body.strip_prefix(&system) {
        Some(rest) => rest.is_empty() || rest.starts_with(' '),
        None => false,
    }
}

/// Whether following planet-to-planet edges from `start` returns to it.
fn loops_back(start: i64, edges: &HashMap<i64, i64>) -> bool {
    let mut seen = HashSet::new();
    let mut current = start;
    while let Some(&next) = edges.get(&current) {
        if next == start {
            return true;
        }
        if !seen.insert(next) {
            return false;
        }
        current = next;
    }
    false
}

fn sorted_by_name(table: &HashMap<String, CelestialBody>) -> Vec<&CelestialBody> {
    let mut entries: Vec<(&String, &CelestialBody)> = table.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    entries.into_iter().map(|(_, body)| body).collect()
}
