/// Local state of one like/save relation.
///
/// The displayed value flips as soon as a toggle begins. While the remote
/// write is in flight the toggle is pending and further toggles are refused;
/// a rejected write restores the prior value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleState {
    Settled(bool),
    Pending { prior: bool, target: bool },
}

/// Handle for an in-flight toggle, consumed by [`RelationToggle::finish`]
#[derive(Debug, PartialEq, Eq)]
#[must_use]
pub struct PendingToggle {
    pub target: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationToggle {
    state: ToggleState,
}

impl RelationToggle {
    pub fn new(initial: bool) -> Self {
        Self {
            state: ToggleState::Settled(initial),
        }
    }

    pub fn state(&self) -> ToggleState {
        self.state
    }

    /// The value to display
    pub fn is_on(&self) -> bool {
        match self.state {
            ToggleState::Settled(value) => value,
            ToggleState::Pending { target, .. } => target,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, ToggleState::Pending { .. })
    }

    /// Replace the settled value with the one read from the store.
    /// Ignored while a toggle is pending.
    pub fn load(&mut self, value: bool) {
        if let ToggleState::Settled(_) = self.state {
            self.state = ToggleState::Settled(value);
        }
    }

    /// Flip optimistically. `None` when a toggle is already pending.
    pub fn begin(&mut self) -> Option<PendingToggle> {
        match self.state {
            ToggleState::Pending { .. } => None,
            ToggleState::Settled(prior) => {
                let target = !prior;
                self.state = ToggleState::Pending { prior, target };
                Some(PendingToggle { target })
            }
        }
    }

    /// Settle after the remote write; returns the resulting value
    pub fn finish(&mut self, pending: PendingToggle, accepted: bool) -> bool {
        let value = match self.state {
            ToggleState::Pending { prior, target } if target == pending.target => {
                if accepted {
                    target
                } else {
                    prior
                }
            }
            // Stale handle; keep what we have
            _ => self.is_on(),
        };
        self.state = ToggleState::Settled(value);
        value
    }
}
