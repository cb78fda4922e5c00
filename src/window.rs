//! Event time window.
//!
//! Done records get a grace period after the event end, since volunteers
//! often mark their work done shortly after finishing it. Transcriptions are
//! judged by the time the comment was posted and get no grace period.

use chrono::{DateTime, Duration, Utc};

use crate::constants::DONE_GRACE_PERIOD_HOURS;
use crate::done::DoneRecord;
use crate::transcription::Transcription;

/// Start and end of an event. A missing boundary is unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventWindow {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl EventWindow {
    #[must_use]
    pub fn new(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        Self { start, end }
    }

    /// Whether a done record at `time` counts for the event.
    #[must_use]
    pub fn accepts_done(&self, time: DateTime<Utc>) -> bool {
        let grace = Duration::hours(DONE_GRACE_PERIOD_HOURS);
        self.start.map_or(true, |start| time > start) && self.end.map_or(true, |end| time < end + grace)
    }

    /// Whether a transcription posted at `time` counts for the event.
    #[must_use]
    pub fn accepts_transcription(&self, time: DateTime<Utc>) -> bool {
        self.start.map_or(true, |start| time > start) && self.end.map_or(true, |end| time < end)
    }

    #[must_use]
    pub fn filter_dones(&self, dones: Vec<DoneRecord>) -> Vec<DoneRecord> {
        dones
            .into_iter()
            .filter(|done| self.accepts_done(done.time))
            .collect()
    }

    #[must_use]
    pub fn filter_transcriptions(&self, transcriptions: Vec<Transcription>) -> Vec<Transcription> {
        transcriptions
            .into_iter()
            .filter(|tr| self.accepts_transcription(tr.time))
            .collect()
    }
}
