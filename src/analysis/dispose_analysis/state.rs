use crate::analysis::dispose_analysis::types::{
    AbstractLocation, DisposeAbstractValue, DisposeAbstractValueKind, LocationId, LocationOrigin,
};
use rustc_hash::FxHashMap;

/// Interned locations of one method body, addressed by dense ids in insertion order.
#[derive(Debug, Clone, Default)]
pub struct LocationLayout {
    locations: Vec<AbstractLocation>,
    index_by_origin: FxHashMap<LocationOrigin, LocationId>,
}

impl LocationLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the existing id when the origin was already interned
    pub fn intern(&mut self, location: AbstractLocation) -> LocationId {
        if let Some(existing) = self.index_by_origin.get(&location.origin) {
            return *existing;
        }

        let id = LocationId(self.locations.len() as u32);
        self.index_by_origin.insert(location.origin, id);
        self.locations.push(location);
        id
    }

    /// `None` for ids this layout never handed out
    pub fn get(&self, id: LocationId) -> Option<&AbstractLocation> {
        self.locations.get(id.index())
    }

    pub fn is_disposable(&self, id: LocationId) -> bool {
        self.get(id).is_some_and(|location| location.disposable)
    }

    pub fn id_of(&self, origin: LocationOrigin) -> Option<LocationId> {
        self.index_by_origin.get(&origin).copied()
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (LocationId, &AbstractLocation)> {
        self.locations
            .iter()
            .enumerate()
            .map(|(index, location)| (LocationId(index as u32), location))
    }
}

/// Location → value map for one program point.
///
/// Dense over the layout; an absent entry is the bottom of the lattice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisposeState {
    values: Vec<Option<DisposeAbstractValue>>,
}

impl DisposeState {
    pub fn empty(location_count: usize) -> Self {
        Self {
            values: vec![None; location_count],
        }
    }

    pub fn get(&self, location: LocationId) -> Option<&DisposeAbstractValue> {
        self.values.get(location.index()).and_then(Option::as_ref)
    }

    pub fn kind(&self, location: LocationId) -> DisposeAbstractValueKind {
        self.get(location)
            .map(DisposeAbstractValue::kind)
            .unwrap_or(DisposeAbstractValueKind::Unknown)
    }

    pub(crate) fn value_or_unknown(&self, location: LocationId) -> DisposeAbstractValue {
        self.get(location)
            .cloned()
            .unwrap_or_else(DisposeAbstractValue::unknown)
    }

    pub(crate) fn set(&mut self, location: LocationId, value: DisposeAbstractValue) {
        let index = location.index();
        if index >= self.values.len() {
            self.values.resize(index + 1, None);
        }

        self.values[index] = Some(value);
    }

    pub fn join(&self, other: &Self) -> Self {
        let length = self.values.len().max(other.values.len());
        let mut values = Vec::with_capacity(length);

        for index in 0..length {
            let left = self.values.get(index).and_then(Option::as_ref);
            let right = other.values.get(index).and_then(Option::as_ref);

            let joined = match (left, right) {
                (Some(left), Some(right)) => {
                    debug_assert!(
                        !is_disposability_mismatch(left.kind(), right.kind()),
                        "location loc{index} is tracked both as disposable and not disposable"
                    );
                    Some(left.join(right))
                }
                (Some(value), None) | (None, Some(value)) => Some(value.clone()),
                (None, None) => None,
            };

            values.push(joined);
        }

        Self { values }
    }

    pub fn is_less_or_equal(&self, other: &Self) -> bool {
        &self.join(other) == other
    }

    /// Present entries in location order
    pub fn iter(&self) -> impl Iterator<Item = (LocationId, &DisposeAbstractValue)> {
        self.values
            .iter()
            .enumerate()
            .filter_map(|(index, value)| value.as_ref().map(|value| (LocationId(index as u32), value)))
    }

    pub fn tracked_count(&self) -> usize {
        self.values.iter().filter(|value| value.is_some()).count()
    }
}

fn is_disposability_mismatch(
    left: DisposeAbstractValueKind,
    right: DisposeAbstractValueKind,
) -> bool {
    let informative = |kind: DisposeAbstractValueKind| kind != DisposeAbstractValueKind::Unknown;

    informative(left)
        && informative(right)
        && ((left == DisposeAbstractValueKind::NotDisposable)
            != (right == DisposeAbstractValueKind::NotDisposable))
}
