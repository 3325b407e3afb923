//! Calendar events (iCal `VEVENT` item)

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use uuid::Uuid;

/// When an event starts.
///
/// Times are "floating", i.e. expressed in the local time of the device the skill runs on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum EventTime {
    /// An all-day event
    Date(NaiveDate),
    /// An event that starts at a given time
    DateTime(NaiveDateTime),
}

impl EventTime {
    pub fn date(&self) -> NaiveDate {
        match self {
            EventTime::Date(d) => *d,
            EventTime::DateTime(dt) => dt.date(),
        }
    }

    /// The start as a date-time. All-day events start at midnight.
    pub fn as_datetime(&self) -> NaiveDateTime {
        match self {
            EventTime::Date(d) => d.and_time(NaiveTime::MIN),
            EventTime::DateTime(dt) => *dt,
        }
    }
}

/// An iCal property that this crate does not interpret, kept as-is so that it can be written back
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtraProperty {
    pub name: String,
    pub params: Vec<(String, Vec<String>)>,
    pub value: String,
}

impl From<&ical::property::Property> for ExtraProperty {
    fn from(prop: &ical::property::Property) -> Self {
        Self {
            name: prop.name.clone(),
            params: prop.params.clone().unwrap_or_default(),
            value: prop.value.clone().unwrap_or_default(),
        }
    }
}

/// A calendar event
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    /// Persistent, globally unique identifier for the calendar component
    uid: String,
    /// The display name of the event (its `SUMMARY`)
    name: String,
    start: EventTime,
    /// The `DTSTART` as it was read, when `start` cannot express it (a `TZID` or a UTC time).
    /// It is written back unchanged
    original_start: Option<ExtraProperty>,

    /// Extra properties that have not been parsed from the iCal file (because they're not used by this crate).
    /// They are needed to serialize this item into an equivalent iCal file
    extra_properties: Vec<ExtraProperty>,
}

impl Event {
    /// Create a brand new Event that is not stored anywhere yet.
    /// This will pick a new (random) UID.
    pub fn new(name: String, start: EventTime) -> Self {
        let uid = Uuid::new_v4().to_hyphenated().to_string();
        Self::new_with_parameters(uid, name, start, Vec::new())
    }

    /// Create a new Event instance, that may already be stored somewhere
    pub fn new_with_parameters(uid: String, name: String, start: EventTime, extra_properties: Vec<ExtraProperty>) -> Self {
        Self { uid, name, start, original_start: None, extra_properties }
    }

    /// Keep the `DTSTART` property this event was read from
    pub fn with_original_start(mut self, original_start: ExtraProperty) -> Self {
        self.original_start = Some(original_start);
        self
    }

    pub fn uid(&self) -> &str           { &self.uid }
    pub fn name(&self) -> &str          { &self.name }
    pub fn start(&self) -> &EventTime   { &self.start }
    pub fn all_day(&self) -> bool       { matches!(self.start, EventTime::Date(_)) }
    pub fn original_start(&self) -> Option<&ExtraProperty> { self.original_start.as_ref() }
    pub fn extra_properties(&self) -> &[ExtraProperty] { &self.extra_properties }

    /// Whether this event starts on the given day
    pub fn starts_on(&self, day: NaiveDate) -> bool {
        self.start.date() == day
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_day_events_start_at_midnight() {
        let day = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let event = Event::new("Holidays".to_string(), EventTime::Date(day));
        assert!(event.all_day());
        assert!(event.starts_on(day));
        assert_eq!(event.start().as_datetime(), day.and_hms_opt(0, 0, 0).unwrap());
    }

    #[test]
    fn new_events_get_distinct_uids() {
        let start = EventTime::DateTime(NaiveDate::from_ymd_opt(2026, 10, 19).unwrap().and_hms_opt(15, 0, 0).unwrap());
        let a = Event::new("a".to_string(), start);
        let b = Event::new("b".to_string(), start);
        assert_ne!(a.uid(), b.uid());
        assert_eq!(a.all_day(), false);
    }
}
