//! The seams between this skill, its host and its calendar stores

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};

use crate::dialog::DialogData;
use crate::error::StoreError;
use crate::event::Event;

/// Read access to the per-instance settings that the host stores for this skill
pub trait SettingsSource {
    /// Returns the value of a setting, or `None` if it is not set
    fn setting(&self, key: &str) -> Option<String>;
}

/// What the skill needs from the voice-assistant runtime that hosts it
pub trait SkillHost {
    /// Speak the dialog identified by `key`, filled with `data`
    fn speak_dialog(&self, key: &str, data: &DialogData);

    /// Speak the dialog identified by `key` and wait for the user's answer.
    ///
    /// Returns `None` when the user did not answer (e.g. the host prompt timed out)
    fn get_response(&self, key: &str, data: &DialogData) -> Option<String>;
}

/// A place where events are stored
#[async_trait]
pub trait EventStore: Send {
    /// Returns the events that start on the given day, in the order the store yields them.
    ///
    /// An empty list means there is nothing on that day. Failing to reach the store is an `Err`.
    async fn events_on(&mut self, day: NaiveDate) -> Result<Vec<Event>, StoreError>;

    /// Returns at most `limit` events that start at or after `after`, sorted by start time
    async fn upcoming_events(&mut self, after: NaiveDateTime, limit: usize) -> Result<Vec<Event>, StoreError>;

    /// Add a new event to the store
    async fn add_event(&mut self, event: Event) -> Result<(), StoreError>;
}
