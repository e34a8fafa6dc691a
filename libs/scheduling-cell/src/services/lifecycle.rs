// libs/scheduling-cell/src/services/lifecycle.rs
use tracing::{debug, warn};

use crate::models::{ActorRole, AppointmentStatus, NotificationKind, SchedulingError};

use AppointmentStatus::{Cancelled, Completed, Confirmed, Pending};

/// The complete legal-transition set, in one place. Anything absent is
/// illegal; the roles listed are the only ones that may invoke it.
const TRANSITIONS: &[(AppointmentStatus, AppointmentStatus, &[ActorRole])] = &[
    (
        Pending,
        Confirmed,
        &[
            ActorRole::Provider,
            ActorRole::Receptionist,
            ActorRole::Administrator,
        ],
    ),
    (
        Pending,
        Cancelled,
        &[
            ActorRole::Provider,
            ActorRole::Receptionist,
            ActorRole::Administrator,
            ActorRole::Subject,
        ],
    ),
    (
        Confirmed,
        Cancelled,
        &[
            ActorRole::Provider,
            ActorRole::Receptionist,
            ActorRole::Administrator,
        ],
    ),
    (
        Confirmed,
        Completed,
        &[
            ActorRole::Provider,
            ActorRole::Receptionist,
            ActorRole::Administrator,
        ],
    ),
];

/// Table-driven status state machine.
pub struct StatusStateMachine;

impl StatusStateMachine {
    pub fn new() -> Self {
        Self
    }

    /// Validate a requested transition for the invoking role.
    ///
    /// Terminal states reject everything with TerminalState. A request
    /// for the current status is not an idempotent no-op; it fails with
    /// IllegalTransition like any other unlisted pair.
    pub fn authorize_transition(
        &self,
        from: AppointmentStatus,
        to: AppointmentStatus,
        role: ActorRole,
    ) -> Result<(), SchedulingError> {
        debug!("Validating status transition {} -> {} by {}", from, to, role);

        if from.is_terminal() {
            return Err(SchedulingError::TerminalState(from));
        }

        let Some((_, _, roles)) = TRANSITIONS
            .iter()
            .find(|(f, t, _)| *f == from && *t == to)
        else {
            warn!("Illegal status transition attempted: {} -> {}", from, to);
            return Err(SchedulingError::IllegalTransition { from, to });
        };

        if !roles.contains(&role) {
            warn!("Role {} not authorized for {} -> {}", role, from, to);
            return Err(SchedulingError::Forbidden);
        }

        Ok(())
    }

    /// Legal next statuses from a given status, role-independent.
    pub fn valid_targets(&self, from: AppointmentStatus) -> Vec<AppointmentStatus> {
        TRANSITIONS
            .iter()
            .filter(|(f, _, _)| *f == from)
            .map(|(_, t, _)| *t)
            .collect()
    }

    /// The notification a committed transition emits to the subject,
    /// if any. Completion unlocks billing instead of notifying.
    pub fn notification_for(&self, to: AppointmentStatus) -> Option<NotificationKind> {
        match to {
            Confirmed => Some(NotificationKind::AppointmentConfirmed),
            Cancelled => Some(NotificationKind::AppointmentCancelled),
            Pending | Completed => None,
        }
    }
}

impl Default for StatusStateMachine {
    fn default() -> Self {
        Self::new()
    }
}
