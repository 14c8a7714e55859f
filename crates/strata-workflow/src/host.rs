//! Capabilities that differ between host versions, resolved once.

use strata_voxel::Position;

/// Answers questions about the running host at startup.
pub trait HostProbe {
    /// Whether positions carry a dimension tag the host understands.
    fn supports_dimensions(&self) -> bool;
}

/// How positions handed in by the host are interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PositionStrategy {
    /// Keep the dimension tag.
    DimensionAware,
    /// Hosts without dimensions: everything lives in dimension 0.
    Legacy,
}

impl PositionStrategy {
    pub fn probe(host: &dyn HostProbe) -> Self {
        let strategy = if host.supports_dimensions() {
            PositionStrategy::DimensionAware
        } else {
            PositionStrategy::Legacy
        };
        tracing::debug!("host position strategy: {:?}", strategy);
        strategy
    }

    pub fn resolve(self, position: Position) -> Position {
        match self {
            PositionStrategy::DimensionAware => position,
            PositionStrategy::Legacy => position.with_dimension(0),
        }
    }
}

/// Hunger state of an actor, as far as building cares.
pub trait ActorVitals {
    fn saturation(&self) -> f32;
    fn set_saturation(&mut self, value: f32);
    /// Resets the sprint counter so the lost saturation is not refunded.
    fn reset_sprint_counter(&mut self);
}

/// Lowers saturation by `amount`, never below zero, without touching health.
pub fn reduce_only_saturation(vitals: &mut dyn ActorVitals, amount: f32) {
    let next = (vitals.saturation() - amount).max(0.0);
    vitals.set_saturation(next);
    vitals.reset_sprint_counter();
}

/// Vitals for actors the host does not track hunger for.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoVitals;

impl ActorVitals for NoVitals {
    fn saturation(&self) -> f32 {
        0.0
    }

    fn set_saturation(&mut self, _value: f32) {}

    fn reset_sprint_counter(&mut self) {}
}
