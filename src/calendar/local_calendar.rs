//! A calendar stored in a single iCal file on this device

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};

use crate::error::StoreError;
use crate::event::Event;
use crate::traits::EventStore;


/// A calendar that stores its events in a local `.ics` file.
///
/// There is no locking: the last writer wins.
#[derive(Debug, PartialEq)]
pub struct LocalCalendar {
    backing_file: PathBuf,
    events: Vec<Event>,
    /// Components of the file that are not events (time zones, tasks...), kept as raw text
    other_components: Vec<String>,
}

impl LocalCalendar {
    /// Initialize a calendar from the content of a valid backing file if it exists.
    /// Returns an error otherwise
    pub fn from_file(path: &Path) -> Result<Self, StoreError> {
        let content = std::fs::read_to_string(path)
            .map_err(|err| StoreError::io(path, err))?;

        let events = crate::ical::parse_calendar(&content)
            .map_err(|err| StoreError::InvalidData(format!("{:?}: {}", path, err)))?;
        let other_components = crate::ical::other_components(&content);
        log::debug!("Loaded {} events and {} other components from {:?}", events.len(), other_components.len(), path);

        Ok(Self {
            backing_file: PathBuf::from(path),
            events,
            other_components,
        })
    }

    /// Initialize an empty calendar. Nothing is written until [`Self::save_to_file`]
    pub fn new(path: &Path) -> Self {
        Self {
            backing_file: PathBuf::from(path),
            events: Vec::new(),
            other_components: Vec::new(),
        }
    }

    /// Open the calendar at `path`, creating an empty calendar file (and its parent folders) if it does not exist yet
    pub fn load_or_create(path: &Path) -> Result<Self, StoreError> {
        if path.exists() {
            log::info!("Local calendar exists at {:?}", path);
            return Self::from_file(path);
        }

        log::info!("Local calendar does not exist at {:?}, creating one", path);
        let calendar = Self::new(path);
        calendar.save_to_file()?;
        Ok(calendar)
    }

    /// Store the current calendar to its backing file
    pub fn save_to_file(&self) -> Result<(), StoreError> {
        let path = &self.backing_file;
        if let Some(parent) = path.parent() {
            if parent.as_os_str().is_empty() == false {
                std::fs::create_dir_all(parent)
                    .map_err(|err| StoreError::io(parent, err))?;
            }
        }

        let content = crate::ical::build_calendar_with(&self.events, &self.other_components);
        std::fs::write(path, content)
            .map_err(|err| StoreError::io(path, err))
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }
}

#[async_trait]
impl EventStore for LocalCalendar {
    async fn events_on(&mut self, day: NaiveDate) -> Result<Vec<Event>, StoreError> {
        Ok(self.events.iter()
            .filter(|event| event.starts_on(day))
            .cloned()
            .collect())
    }

    async fn upcoming_events(&mut self, after: NaiveDateTime, limit: usize) -> Result<Vec<Event>, StoreError> {
        Ok(upcoming(self.events.iter().cloned(), after, limit))
    }

    async fn add_event(&mut self, event: Event) -> Result<(), StoreError> {
        log::debug!("Adding event {} ({}) to {:?}", event.name(), event.uid(), self.backing_file);
        self.events.push(event);
        self.save_to_file()
    }
}

/// Keep the events that start at or after `after`, sorted by start, at most `limit` of them.
///
/// All-day events are kept for the whole day they happen on.
pub(crate) fn upcoming<I>(events: I, after: NaiveDateTime, limit: usize) -> Vec<Event>
where
    I: Iterator<Item = Event>,
{
    let mut result: Vec<Event> = events
        .filter(|event| {
            if event.all_day() {
                event.start().date() >= after.date()
            } else {
                event.start().as_datetime() >= after
            }
        })
        .collect();
    result.sort_by_key(|event| event.start().as_datetime());
    result.truncate(limit);
    result
}
