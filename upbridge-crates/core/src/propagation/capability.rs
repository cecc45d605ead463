use enum_map::Enum;
use enumset::EnumSet;
use enumset::EnumSetType;

/// The closed set of optional notifications a user propagator can ask for.
///
/// Scope changes and forks are always delivered and therefore have no capability.
#[derive(EnumSetType, Debug, Enum, Hash)]
pub enum Capability {
    Fixed,
    Final,
    Eq,
    Diseq,
    Created,
    Decide,
    OnBinding,
}

pub type CapabilitySet = EnumSet<Capability>;

impl Capability {
    pub fn name(self) -> &'static str {
        match self {
            Capability::Fixed => "fixed",
            Capability::Final => "final",
            Capability::Eq => "eq",
            Capability::Diseq => "diseq",
            Capability::Created => "created",
            Capability::Decide => "decide",
            Capability::OnBinding => "on_binding",
        }
    }
}

/// Every kind of event the router dispatches, including the mandatory ones.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Enum)]
pub enum EventKind {
    Push,
    Pop,
    Fresh,
    Fixed,
    Final,
    Eq,
    Diseq,
    Created,
    Decide,
    OnBinding,
}

impl EventKind {
    /// The capability which must be implemented for the event to reach the handler; `None` for
    /// the mandatory events.
    pub fn capability(self) -> Option<Capability> {
        match self {
            EventKind::Push | EventKind::Pop | EventKind::Fresh => None,
            EventKind::Fixed => Some(Capability::Fixed),
            EventKind::Final => Some(Capability::Final),
            EventKind::Eq => Some(Capability::Eq),
            EventKind::Diseq => Some(Capability::Diseq),
            EventKind::Created => Some(Capability::Created),
            EventKind::Decide => Some(Capability::Decide),
            EventKind::OnBinding => Some(Capability::OnBinding),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            EventKind::Push => "push",
            EventKind::Pop => "pop",
            EventKind::Fresh => "fresh",
            other => other
                .capability()
                .map(Capability::name)
                .unwrap_or("unknown"),
        }
    }
}

impl From<Capability> for EventKind {
    fn from(capability: Capability) -> Self {
        match capability {
            Capability::Fixed => EventKind::Fixed,
            Capability::Final => EventKind::Final,
            Capability::Eq => EventKind::Eq,
            Capability::Diseq => EventKind::Diseq,
            Capability::Created => EventKind::Created,
            Capability::Decide => EventKind::Decide,
            Capability::OnBinding => EventKind::OnBinding,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_capability_maps_back_to_itself() {
        for capability in CapabilitySet::all() {
            assert_eq!(Some(capability), EventKind::from(capability).capability());
        }
    }

    #[test]
    fn mandatory_events_have_no_capability() {
        assert_eq!(None, EventKind::Push.capability());
        assert_eq!(None, EventKind::Pop.capability());
        assert_eq!(None, EventKind::Fresh.capability());
    }
}
