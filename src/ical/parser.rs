//! A module to parse ICal files

use std::error::Error;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use ical::parser::ical::component::{IcalCalendar, IcalEvent};
use ical::property::Property;
use uuid::Uuid;

use crate::event::{Event, EventTime, ExtraProperty};

/// Properties that are mapped to fields of [`Event`], and are thus not kept as "extra" properties
const HANDLED_PROPERTIES: [&str; 4] = ["UID", "SUMMARY", "DTSTART", "DTSTAMP"];

/// Parse an iCal file that contains a single event
pub fn parse(content: &str) -> Result<Event, Box<dyn Error>> {
    let mut events = parse_calendar(content)?;
    match events.len() {
        1 => Ok(events.remove(0)),
        0 => Err("No event in this iCal data".into()),
        _ => Err("Parsing multiple items are not supported".into()),
    }
}

/// Parse every `VEVENT` of an iCal file, in the order they appear.
///
/// Other components (`VTODO`, `VJOURNAL`...) are ignored. Events without a start date are skipped.
pub fn parse_calendar(content: &str) -> Result<Vec<Event>, Box<dyn Error>> {
    let reader = ical::IcalParser::new(content.as_bytes());

    let mut events = Vec::new();
    for calendar in reader {
        let calendar: IcalCalendar = match calendar {
            Err(err) => return Err(format!("Unable to parse iCal data: {}", err).into()),
            Ok(cal) => cal,
        };

        for ical_event in &calendar.events {
            match parse_event(ical_event) {
                Ok(event) => events.push(event),
                Err(err) => log::warn!("Ignoring an invalid event: {}", err),
            }
        }
    }

    Ok(events)
}

/// The raw text of the top-level components that are not events (`VTIMEZONE`, `VTODO`...), with CRLF line endings.
///
/// They can be written back with [`crate::ical::build_calendar_with`].
pub fn other_components(content: &str) -> Vec<String> {
    let mut components = Vec::new();
    let mut current: Option<String> = None;
    let mut depth = 0usize;

    for line in content.lines() {
        let upper = line.trim_end().to_ascii_uppercase();
        if upper.starts_with("BEGIN:") {
            depth += 1;
            // Depth 1 is the VCALENDAR itself
            if depth == 2 && upper != "BEGIN:VEVENT" {
                current = Some(String::new());
            }
        }
        if let Some(component) = current.as_mut() {
            component.push_str(line);
            component.push_str("\r\n");
        }
        if upper.starts_with("END:") {
            if depth == 2 {
                if let Some(component) = current.take() {
                    components.push(component);
                }
            }
            depth = depth.saturating_sub(1);
        }
    }

    components
}

fn parse_event(ical_event: &IcalEvent) -> Result<Event, Box<dyn Error>> {
    let mut uid = None;
    let mut name = None;
    let mut start = None;
    let mut original_start = None;
    let mut extra_properties = Vec::new();

    for prop in &ical_event.properties {
        match prop.name.as_str() {
            "UID" => uid = prop.value.clone(),
            "SUMMARY" => name = prop.value.as_deref().map(unescape_text),
            "DTSTART" => {
                start = Some(parse_event_time(prop)?);
                if is_zoned(prop) {
                    original_start = Some(ExtraProperty::from(prop));
                }
            },
            _ => {
                if HANDLED_PROPERTIES.contains(&prop.name.as_str()) == false {
                    extra_properties.push(ExtraProperty::from(prop));
                }
            },
        }
    }

    let start = match start {
        Some(start) => start,
        None => return Err(format!("Missing DTSTART for event {:?}", uid).into()),
    };
    let uid = match uid {
        Some(uid) => uid,
        None => {
            let generated = Uuid::new_v4().to_hyphenated().to_string();
            log::debug!("Event has no UID, using {}", generated);
            generated
        },
    };
    let name = name.unwrap_or_default();

    let event = Event::new_with_parameters(uid, name, start, extra_properties);
    Ok(match original_start {
        Some(prop) => event.with_original_start(prop),
        None => event,
    })
}

/// Whether a date-time property is bound to a time zone, which a floating [`EventTime`] loses
fn is_zoned(prop: &Property) -> bool {
    let utc = prop.value.as_deref().map(|v| v.trim().ends_with('Z')).unwrap_or(false);
    utc || param_value(prop, "TZID").is_some()
}

/// Parse a `DTSTART` property.
///
/// UTC times are converted to the local time. Times with a `TZID` are read as floating times.
pub(crate) fn parse_event_time(prop: &Property) -> Result<EventTime, Box<dyn Error>> {
    let value = match &prop.value {
        None => return Err(format!("Empty {} property", prop.name).into()),
        Some(v) => v.trim(),
    };

    let is_date = param_value(prop, "VALUE") == Some("DATE") || value.len() == 8;
    if is_date {
        let date = NaiveDate::parse_from_str(value, "%Y%m%d")
            .map_err(|err| format!("Invalid date {:?}: {}", value, err))?;
        return Ok(EventTime::Date(date));
    }

    if let Some(utc_value) = value.strip_suffix('Z') {
        let naive = NaiveDateTime::parse_from_str(utc_value, "%Y%m%dT%H%M%S")
            .map_err(|err| format!("Invalid date-time {:?}: {}", value, err))?;
        let utc: DateTime<Utc> = Utc.from_utc_datetime(&naive);
        return Ok(EventTime::DateTime(utc.with_timezone(&Local).naive_local()));
    }

    if let Some(tzid) = param_value(prop, "TZID") {
        log::debug!("Reading {} (TZID={}) as a floating time", value, tzid);
    }
    let naive = NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%S")
        .map_err(|err| format!("Invalid date-time {:?}: {}", value, err))?;
    Ok(EventTime::DateTime(naive))
}

fn param_value<'a>(prop: &'a Property, key: &str) -> Option<&'a str> {
    prop.params.as_ref()?
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .and_then(|(_, values)| values.first())
        .map(|v| v.as_str())
}

/// Undo the RFC5545 TEXT escaping
fn unescape_text(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => result.push('\n'),
            Some(other) => result.push(other),
            None => result.push('\\'),
        }
    }
    result
}
