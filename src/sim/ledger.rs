//! Resource ledger
//!
//! Named numeric counters (health, oxygen, ammo, currency, ...) that gameplay
//! events mutate and the phase logic reads. Every mutation clamps to
//! `[0, max]` (or `[0, inf)` when uncapped) before returning, so no other
//! system can ever observe an out-of-range value.

use serde::{Deserialize, Serialize};

use super::event::Rejection;

/// Counter names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resource {
    Health,
    Oxygen,
    Battery,
    Integrity,
    AmmoLight,
    AmmoHeavy,
    Currency,
    Corruption,
    ActionPoints,
}

/// A single clamped counter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Counter {
    pub resource: Resource,
    pub value: f32,
    /// Value restored by [`ResourceLedger::reset`]
    pub initial: f32,
    pub max: Option<f32>,
    /// Passive decay per second (0 = none)
    #[serde(default)]
    pub drain_per_sec: f32,
}

impl Counter {
    fn clamp(&self, v: f32) -> f32 {
        let v = v.max(0.0);
        match self.max {
            Some(max) => v.min(max),
            None => v,
        }
    }

    fn assign(&mut self, v: f32) -> f32 {
        let before = self.value;
        if !v.is_nan() {
            self.value = self.clamp(v);
        }
        self.value - before
    }
}

/// The set of counters for one run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceLedger {
    counters: Vec<Counter>,
}

impl ResourceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare (or redeclare) a counter
    pub fn define(&mut self, resource: Resource, initial: f32, max: Option<f32>) -> &mut Self {
        let max = max.map(|m| m.max(0.0));
        let mut counter = Counter {
            resource,
            value: 0.0,
            initial: 0.0,
            max,
            drain_per_sec: 0.0,
        };
        counter.initial = counter.clamp(initial);
        counter.value = counter.initial;
        match self.counter_mut(resource) {
            Some(existing) => *existing = counter,
            None => self.counters.push(counter),
        }
        self
    }

    /// Attach a passive drain rate to an existing counter
    pub fn with_drain(&mut self, resource: Resource, per_sec: f32) -> &mut Self {
        if let Some(c) = self.counter_mut(resource) {
            c.drain_per_sec = per_sec.max(0.0);
        }
        self
    }

    pub fn is_defined(&self, resource: Resource) -> bool {
        self.counter(resource).is_some()
    }

    /// Current value (0 for undefined counters)
    pub fn get(&self, resource: Resource) -> f32 {
        self.counter(resource).map(|c| c.value).unwrap_or(0.0)
    }

    pub fn max(&self, resource: Resource) -> Option<f32> {
        self.counter(resource).and_then(|c| c.max)
    }

    /// Add `amount` (may be negative). Returns the change actually applied.
    pub fn add(&mut self, resource: Resource, amount: f32) -> f32 {
        match self.counter_mut(resource) {
            Some(c) => {
                let target = c.value + amount;
                c.assign(target)
            }
            None => {
                log::warn!("Mutation of undefined counter {:?}", resource);
                0.0
            }
        }
    }

    /// Subtract `amount`. Returns the (non-positive) change applied.
    pub fn sub(&mut self, resource: Resource, amount: f32) -> f32 {
        self.add(resource, -amount)
    }

    pub fn set(&mut self, resource: Resource, value: f32) -> f32 {
        match self.counter_mut(resource) {
            Some(c) => c.assign(value),
            None => 0.0,
        }
    }

    /// Change the cap; the current value is re-clamped
    pub fn set_max(&mut self, resource: Resource, max: Option<f32>) {
        if let Some(c) = self.counter_mut(resource) {
            c.max = max.map(|m| m.max(0.0));
            let v = c.value;
            c.assign(v);
        }
    }

    /// Spend exactly `amount` or nothing
    pub fn try_spend(&mut self, resource: Resource, amount: f32) -> Result<(), Rejection> {
        let available = self.get(resource);
        if !self.is_defined(resource) || available < amount {
            return Err(match resource {
                Resource::Currency => Rejection::InsufficientFunds,
                Resource::AmmoLight | Resource::AmmoHeavy => Rejection::OutOfAmmo,
                other => Rejection::Insufficient(other),
            });
        }
        self.sub(resource, amount);
        Ok(())
    }

    /// Fill to max (no-op for uncapped counters)
    pub fn refill(&mut self, resource: Resource) {
        if let Some(max) = self.max(resource) {
            self.set(resource, max);
        }
    }

    pub fn is_full(&self, resource: Resource) -> bool {
        match self.counter(resource) {
            Some(Counter { value, max: Some(max), .. }) => value >= max,
            _ => false,
        }
    }

    /// Defined and at zero
    pub fn is_depleted(&self, resource: Resource) -> bool {
        self.counter(resource).is_some_and(|c| c.value <= 0.0)
    }

    /// Restore every counter to its initial value, within the current cap
    pub fn reset(&mut self) {
        for c in &mut self.counters {
            c.value = c.clamp(c.initial);
        }
    }

    /// First counter whose value lies outside `[0, max]`, if any.
    ///
    /// Mutations through the ledger never produce one; only data built
    /// elsewhere (a decoded save) can.
    pub fn out_of_range(&self) -> Option<Resource> {
        self.counters
            .iter()
            .find(|c| {
                !c.value.is_finite()
                    || c.value != c.clamp(c.value)
                    || c.max.is_some_and(|m| m.is_nan() || m < 0.0)
            })
            .map(|c| c.resource)
    }

    /// Apply passive drains for `dt` seconds.
    ///
    /// Returns the counters that hit zero during this call.
    pub fn drain(&mut self, dt: f32) -> Vec<Resource> {
        let mut depleted = Vec::new();
        for c in &mut self.counters {
            if c.drain_per_sec <= 0.0 || c.value <= 0.0 {
                continue;
            }
            let target = c.value - c.drain_per_sec * dt;
            c.assign(target);
            if c.value <= 0.0 {
                depleted.push(c.resource);
            }
        }
        depleted
    }

    pub fn counters(&self) -> &[Counter] {
        &self.counters
    }

    fn counter(&self, resource: Resource) -> Option<&Counter> {
        self.counters.iter().find(|c| c.resource == resource)
    }

    fn counter_mut(&mut self, resource: Resource) -> Option<&mut Counter> {
        self.counters.iter_mut().find(|c| c.resource == resource)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ledger() -> ResourceLedger {
        let mut l = ResourceLedger::new();
        l.define(Resource::Health, 100.0, Some(100.0))
            .define(Resource::Currency, 0.0, None)
            .define(Resource::Oxygen, 60.0, Some(60.0))
            .with_drain(Resource::Oxygen, 1.0);
        l
    }

    #[test]
    fn test_add_clamps_to_cap() {
        let mut l = ledger();
        assert_eq!(l.add(Resource::Health, 50.0), 0.0);
        assert_eq!(l.get(Resource::Health), 100.0);
        assert_eq!(l.sub(Resource::Health, 250.0), -100.0);
        assert_eq!(l.get(Resource::Health), 0.0);
        assert!(l.is_depleted(Resource::Health));
    }

    #[test]
    fn test_try_spend_is_all_or_nothing() {
        let mut l = ledger();
        l.add(Resource::Currency, 30.0);
        assert_eq!(l.try_spend(Resource::Currency, 50.0), Err(Rejection::InsufficientFunds));
        assert_eq!(l.get(Resource::Currency), 30.0);
        assert_eq!(l.try_spend(Resource::Currency, 30.0), Ok(()));
        assert_eq!(l.get(Resource::Currency), 0.0);
    }

    #[test]
    fn test_drain_reports_depletion_once() {
        let mut l = ledger();
        assert!(l.drain(30.0).is_empty());
        assert_eq!(l.get(Resource::Oxygen), 30.0);
        assert_eq!(l.drain(45.0), vec![Resource::Oxygen]);
        assert!(l.drain(1.0).is_empty());
        assert_eq!(l.get(Resource::Oxygen), 0.0);
    }

    #[test]
    fn test_set_max_reclamps() {
        let mut l = ledger();
        l.set_max(Resource::Health, Some(40.0));
        assert_eq!(l.get(Resource::Health), 40.0);
        l.set_max(Resource::Health, Some(120.0));
        l.refill(Resource::Health);
        assert_eq!(l.get(Resource::Health), 120.0);
    }

    #[test]
    fn test_reset_restores_initial_values() {
        let mut l = ledger();
        l.sub(Resource::Health, 10.0);
        l.add(Resource::Currency, 99.0);
        l.reset();
        assert_eq!(l.get(Resource::Health), 100.0);
        assert_eq!(l.get(Resource::Currency), 0.0);
    }

    #[test]
    fn test_reset_respects_lowered_cap() {
        let mut l = ledger();
        l.set_max(Resource::Health, Some(40.0));
        l.reset();
        assert_eq!(l.get(Resource::Health), 40.0);
        assert_eq!(l.out_of_range(), None);
    }

    #[test]
    fn test_out_of_range_flags_foreign_values() {
        let mut l = ledger();
        assert_eq!(l.out_of_range(), None);
        l.counters[0].value = -50.0;
        assert_eq!(l.out_of_range(), Some(Resource::Health));
        l.counters[0].value = 150.0;
        assert_eq!(l.out_of_range(), Some(Resource::Health));
        l.counters[0].value = 100.0;
        l.counters[1].value = f32::INFINITY;
        assert_eq!(l.out_of_range(), Some(Resource::Currency));
    }

    #[test]
    fn test_nan_is_ignored() {
        let mut l = ledger();
        l.add(Resource::Health, f32::NAN);
        assert_eq!(l.get(Resource::Health), 100.0);
    }

    #[derive(Debug, Clone, Copy)]
    enum Op {
        Add(f32),
        Set(f32),
        Spend(f32),
        Drain(f32),
        SetMax(Option<f32>),
        Reset,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (-500.0f32..500.0).prop_map(Op::Add),
            (-500.0f32..500.0).prop_map(Op::Set),
            (0.0f32..200.0).prop_map(Op::Spend),
            (0.0f32..10.0).prop_map(Op::Drain),
            proptest::option::of(0.0f32..300.0).prop_map(Op::SetMax),
            Just(Op::Reset),
        ]
    }

    proptest! {
        #[test]
        fn prop_counters_stay_in_range(ops in proptest::collection::vec(op(), 1..64)) {
            let mut l = ledger();
            for op in ops {
                for r in [Resource::Health, Resource::Currency, Resource::Oxygen] {
                    match op {
                        Op::Add(a) => { l.add(r, a); }
                        Op::Set(v) => { l.set(r, v); }
                        Op::Spend(a) => { let _ = l.try_spend(r, a); }
                        Op::Drain(dt) => { l.drain(dt); }
                        Op::SetMax(m) => l.set_max(r, m),
                        Op::Reset => l.reset(),
                    }
                    let v = l.get(r);
                    prop_assert!(v >= 0.0);
                    if let Some(max) = l.max(r) {
                        prop_assert!(v <= max);
                    }
                }
                prop_assert_eq!(l.out_of_range(), None);
            }
        }
    }
}
