// libs/scheduling-cell/src/models.rs
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ==============================================================================
// SLOT MODEL
// ==============================================================================

/// A wall-clock time span on a single calendar day, minute precision.
///
/// The clinic operates in a single timezone; comparisons never convert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl Interval {
    /// Build an interval, enforcing start < end.
    pub fn new(
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
    ) -> Result<Self, SchedulingError> {
        if start_time >= end_time {
            return Err(SchedulingError::InvalidInterval(
                "start time must be before end time".to_string(),
            ));
        }
        Ok(Self {
            date,
            start_time,
            end_time,
        })
    }

    /// Half-open overlap: same date, a.start < b.end AND b.start < a.end.
    /// Edge-adjacent intervals (09:00-09:30 vs 09:30-10:00) do not overlap.
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.date == other.date
            && self.start_time < other.end_time
            && other.start_time < self.end_time
    }

    /// Whether a point in time falls inside this interval (half-open).
    pub fn contains(&self, date: NaiveDate, time: NaiveTime) -> bool {
        self.date == date && self.start_time <= time && time < self.end_time
    }

    /// Whether the whole interval sits inside configured clinic hours.
    pub fn within_hours(&self, hours: &ClinicHours) -> bool {
        self.start_time >= hours.open && self.end_time <= hours.close
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end_time - self.start_time).num_minutes()
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}-{}",
            self.date,
            self.start_time.format("%H:%M"),
            self.end_time.format("%H:%M")
        )
    }
}

/// Fixed clinic operating hours and slot granularity, externally
/// configured. Appointment durations must be a multiple of
/// `slot_minutes`; provider blocks are free-form.
#[derive(Debug, Clone, Copy)]
pub struct ClinicHours {
    pub open: NaiveTime,
    pub close: NaiveTime,
    pub slot_minutes: u32,
}

impl Default for ClinicHours {
    fn default() -> Self {
        Self {
            open: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            close: NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
            slot_minutes: 30,
        }
    }
}

/// Inclusive calendar date range used by schedule views.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }
}

// ==============================================================================
// CORE SCHEDULING ENTITIES
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub subject_id: Uuid,
    pub interval: Interval,
    pub status: AppointmentStatus,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    /// A non-cancelled appointment occupies its slot for conflict purposes.
    pub fn occupies_slot(&self) -> bool {
        self.status != AppointmentStatus::Cancelled
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl AppointmentStatus {
    /// CANCELLED and COMPLETED admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Cancelled | AppointmentStatus::Completed
        )
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Pending => write!(f, "pending"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
            AppointmentStatus::Completed => write!(f, "completed"),
        }
    }
}

/// Provider-declared unavailability, independent of any appointment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockedInterval {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub interval: Interval,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bill {
    pub appointment_id: Uuid,
    pub amount: f64,
    pub description: String,
    pub status: BillStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BillStatus {
    Issued,
    Paid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub appointment_id: Uuid,
    pub kind: NotificationKind,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    BookingRequested,
    AppointmentConfirmed,
    AppointmentCancelled,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationKind::BookingRequested => write!(f, "booking_requested"),
            NotificationKind::AppointmentConfirmed => write!(f, "appointment_confirmed"),
            NotificationKind::AppointmentCancelled => write!(f, "appointment_cancelled"),
        }
    }
}

// ==============================================================================
// ROLES
// ==============================================================================

/// Who is invoking an operation. Resolved by the external auth
/// collaborator; the engine only gates on it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    Provider,
    Receptionist,
    Administrator,
    Subject,
}

impl fmt::Display for ActorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActorRole::Provider => write!(f, "provider"),
            ActorRole::Receptionist => write!(f, "receptionist"),
            ActorRole::Administrator => write!(f, "administrator"),
            ActorRole::Subject => write!(f, "subject"),
        }
    }
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub provider_id: Uuid,
    pub subject_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub reason: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockIntervalRequest {
    pub provider_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionRequest {
    pub target: AppointmentStatus,
    pub actor_role: ActorRole,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelAppointmentRequest {
    pub actor_role: ActorRole,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateBillRequest {
    pub amount: f64,
    pub description: String,
}

/// Read-only composite schedule view; enforces nothing by itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityView {
    pub blocked_intervals: Vec<BlockedInterval>,
    pub appointments: Vec<Appointment>,
}

// ==============================================================================
// ERROR TAXONOMY
// ==============================================================================

/// Deterministic, locally-detected failures returned synchronously to
/// the caller. Nothing here is retried inside the engine.
#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum SchedulingError {
    #[error("invalid interval: {0}")]
    InvalidInterval(String),

    #[error("slot is not available")]
    SlotUnavailable,

    #[error("interval conflicts with a live appointment")]
    Conflict,

    #[error("role is not authorized for this operation")]
    Forbidden,

    #[error("no transition from {from} to {to}")]
    IllegalTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("appointment is in terminal status {0}")]
    TerminalState(AppointmentStatus),

    #[error("not found")]
    NotFound,

    #[error("appointment is not billable before completion")]
    NotEligible,
}
