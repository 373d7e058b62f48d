//! Disruption impacts and the generation-arena store.
//!
//! Impacts are owned by a central [`ImpactStore`] and handed out as
//! [`WeakImpact`] handles: a slot id plus the generation the handle was
//! minted at. Discarding an impact bumps its slot's generation, so stale
//! handles fail to [`upgrade`](ImpactStore::upgrade) and every consumer
//! treats the failure as "impact absent, skip". The slot id doubles as
//! the Impact kind's dense index.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDateTime;

use crate::indexes::Idx;
use crate::period::TimePeriod;

/// Effect of an impact on the informed entities (GTFS-RT alert effects).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    NoService,
    ReducedService,
    SignificantDelays,
    Detour,
    AdditionalService,
    ModifiedService,
    OtherEffect,
    UnknownEffect,
    StopMoved,
}

/// How serious an impact is. `priority` orders severities in reports,
/// smaller is more severe; severities without one are ignored there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Severity {
    pub name: String,
    pub priority: Option<i32>,
    pub effect: Effect,
}

/// The parent disruption of one or more impacts, carrying the window
/// during which they may be shown to the public.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disruption {
    pub uri: String,
    pub publication_period: TimePeriod,
}

impl Disruption {
    /// Whether the disruption may be published at `now`.
    pub fn is_publishable(&self, now: NaiveDateTime) -> bool {
        self.publication_period.contains(now)
    }
}

/// A tagged reference to the entity an impact applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PtObjRef {
    /// Target the producer could not resolve against the dataset.
    Unknown,
    Network(Idx),
    StopArea(Idx),
    StopPoint(Idx),
    /// A section of a line between two stop areas.
    LineSection { line: Idx, start: Idx, end: Idx },
    Line(Idx),
    Route(Idx),
    MetaVehicleJourney(Idx),
}

/// One concrete alteration caused by a disruption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Impact {
    pub uri: String,
    pub disruption: Disruption,
    pub severity: Severity,
    /// When the alteration applies (half-open intervals).
    pub application_periods: Vec<TimePeriod>,
    pub informed_entities: Vec<PtObjRef>,
}

/// Stable slot id of an impact; also its dense index as the Impact kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ImpactId(pub Idx);

/// A weak handle: upgradable only while the slot generation matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeakImpact {
    pub id: ImpactId,
    generation: u32,
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    impact: Option<Arc<Impact>>,
}

/// Arena of impacts with generation-checked weak handles.
#[derive(Debug, Default)]
pub struct ImpactStore {
    slots: Vec<Slot>,
}

impl ImpactStore {
    pub fn new() -> Self {
        ImpactStore { slots: Vec::new() }
    }

    /// Store an impact in a fresh slot and return a live handle to it.
    pub fn insert(&mut self, impact: Impact) -> WeakImpact {
        let id = ImpactId(self.slots.len() as Idx);
        self.slots.push(Slot { generation: 0, impact: Some(Arc::new(impact)) });
        WeakImpact { id, generation: 0 }
    }

    /// Drop the impact at `id`, invalidating every handle minted for it.
    /// Returns whether a live impact was discarded. The slot itself stays,
    /// so the Impact index space never shrinks.
    pub fn discard(&mut self, id: ImpactId) -> bool {
        match self.slots.get_mut(id.0 as usize) {
            Some(slot) if slot.impact.is_some() => {
                slot.impact = None;
                slot.generation += 1;
                true
            }
            _ => false,
        }
    }

    /// Upgrade a weak handle. `None` when the impact was discarded.
    pub fn upgrade(&self, weak: &WeakImpact) -> Option<Arc<Impact>> {
        let slot = self.slots.get(weak.id.0 as usize)?;
        if slot.generation != weak.generation {
            return None;
        }
        slot.impact.clone()
    }

    /// The live impact at a slot, if any.
    pub fn get(&self, id: ImpactId) -> Option<Arc<Impact>> {
        self.slots.get(id.0 as usize)?.impact.clone()
    }

    /// A weak handle per slot, in slot order. Handles to discarded slots
    /// are included and fail to upgrade, mirroring how a consumer sees a
    /// store that raced with a rebuild.
    pub fn weak_impacts(&self) -> Vec<WeakImpact> {
        self.slots
            .iter()
            .enumerate()
            .map(|(i, slot)| WeakImpact { id: ImpactId(i as Idx), generation: slot.generation })
            .collect()
    }

    /// Number of slots (live or discarded); the Impact index space.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// An ordered, duplicate-free collection of upgraded impacts, keyed by
/// their stable slot id.
#[derive(Debug, Clone, Default)]
pub struct ImpactSet {
    inner: BTreeMap<ImpactId, Arc<Impact>>,
}

impl ImpactSet {
    pub fn new() -> Self {
        ImpactSet { inner: BTreeMap::new() }
    }

    pub fn insert(&mut self, id: ImpactId, impact: Arc<Impact>) {
        self.inner.insert(id, impact);
    }

    /// Merge another batch of impacts into the set (set union).
    pub fn extend(&mut self, impacts: impl IntoIterator<Item = (ImpactId, Arc<Impact>)>) {
        self.inner.extend(impacts);
    }

    /// Union with another set.
    pub fn merge(&mut self, other: &ImpactSet) {
        for (id, impact) in other.iter() {
            self.inner.insert(id, impact.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (ImpactId, &Arc<Impact>)> {
        self.inner.iter().map(|(id, impact)| (*id, impact))
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
