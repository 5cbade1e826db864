//! Per-task optimistic toggle state machine.
//!
//! A toggle applies its predicted value locally before the remote service
//! acknowledges. While the update is in flight the prediction is overlaid
//! on every incoming snapshot, so the compensating flip on failure always
//! acts on the live displayed value — a snapshot interleaved between the
//! flip and the failure can never cause a double inversion.
//!
//! Transitions:
//!
//! ```text
//! Synced(completed) --begin--> Optimistic(!completed)
//! Optimistic(p)     --confirm--> Synced(p)
//! Optimistic(p)     --fail-----> Synced(!p)
//! ```

/// State of one task's `completed` field with respect to the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleState {
    /// The local value matches the last confirmed snapshot.
    Synced {
        /// Confirmed value.
        completed: bool,
    },
    /// A flip to `predicted` is in flight and overlaid locally.
    Optimistic {
        /// The value sent to the service and currently displayed.
        predicted: bool,
    },
}

impl ToggleState {
    /// The value the materialized list should currently display.
    #[must_use]
    pub const fn display(self) -> bool {
        match self {
            Self::Synced { completed } => completed,
            Self::Optimistic { predicted } => predicted,
        }
    }

    /// Begins an optimistic flip and returns the predicted value to send.
    ///
    /// Returns `None` when a flip is already in flight: at most one
    /// in-flight mutation per task may be overlaid, and a queued second
    /// flip would make the compensation ambiguous.
    pub const fn begin(&mut self) -> Option<bool> {
        match *self {
            Self::Synced { completed } => {
                let predicted = !completed;
                *self = Self::Optimistic { predicted };
                Some(predicted)
            }
            Self::Optimistic { .. } => None,
        }
    }

    /// The remote service acknowledged the flip.
    pub const fn confirm(&mut self) {
        if let Self::Optimistic { predicted } = *self {
            *self = Self::Synced {
                completed: predicted,
            };
        }
    }

    /// The remote service rejected the flip. Compensates from the live
    /// overlaid value and returns the restored value.
    pub const fn fail(&mut self) -> bool {
        match *self {
            Self::Optimistic { predicted } => {
                let restored = !predicted;
                *self = Self::Synced {
                    completed: restored,
                };
                restored
            }
            Self::Synced { completed } => completed,
        }
    }
}
