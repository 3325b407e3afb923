//! The replies of the skill.
//!
//! The skill only emits dialog keys and their data. Voice-assistant hosts map the keys to their own (localized) dialog files,
//! simpler hosts (like the console binary of this crate) can use the English templates of this module.

use std::collections::HashMap;

use once_cell::sync::Lazy;

/// Values that fill the `{placeholders}` of a dialog
pub type DialogData = HashMap<String, String>;

pub const DAY: &str = "day";
pub const DAY_FOLLOWED: &str = "day.followed";
pub const NO_EVENTS: &str = "no.events";
pub const NO_EVENTS_FOUND: &str = "no.events.found";
pub const NUM_EVENT: &str = "num.event";
pub const NUM_EVENTS: &str = "num.events";
pub const NEXT_EVENT: &str = "next.event";
pub const NEXT_ALL_DAY_EVENT: &str = "next.all.day.event";
pub const NEW_EVENT_NAME: &str = "new.event.name";
pub const NEW_EVENT_DATE: &str = "new.event.date";
pub const NEW_EVENT_TIME: &str = "new.event.time";
pub const NEW_EVENT_SUMMARY: &str = "new.event.summary";
pub const SETUP: &str = "setup";
pub const ERROR_LOGGING_IN: &str = "error.logging.in";
pub const ERROR_CONNECTION: &str = "error.connection";
pub const ERROR_CALENDAR_NOT_FOUND: &str = "error.calendar.not.found";
pub const ERROR_CALENDAR_DATA: &str = "error.calendar.data";
pub const ERROR_LOCAL_CALENDAR: &str = "error.local.calendar";

static TEMPLATES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut t = HashMap::new();
    t.insert(DAY, "You have {num_events} appointments {when}. The first one is {event}, {time}.");
    t.insert(DAY_FOLLOWED, "Then {event}, {time}.");
    t.insert(NO_EVENTS, "You have no appointments {when}.");
    t.insert(NO_EVENTS_FOUND, "You have no upcoming appointments.");
    t.insert(NUM_EVENT, "You have one appointment {when}.");
    t.insert(NUM_EVENTS, "You have {num_events} appointments {when}.");
    t.insert(NEXT_EVENT, "Your next appointment is {event}, {date} at {time}.");
    t.insert(NEXT_ALL_DAY_EVENT, "Your next appointment is {event}, all day {date}.");
    t.insert(NEW_EVENT_NAME, "What is the name of the appointment?");
    t.insert(NEW_EVENT_DATE, "When is it?");
    t.insert(NEW_EVENT_TIME, "At what time is {event}?");
    t.insert(NEW_EVENT_SUMMARY, "I added {event} to your calendar.");
    t.insert(SETUP, "Your calendar server is not set up yet. Please enter your username and password in the skill settings.");
    t.insert(ERROR_LOGGING_IN, "I could not log in to your calendar server. Please check your username and password.");
    t.insert(ERROR_CONNECTION, "I could not reach your calendar server.");
    t.insert(ERROR_CALENDAR_NOT_FOUND, "I could not find your calendar on the server.");
    t.insert(ERROR_CALENDAR_DATA, "Your calendar sent something I do not understand.");
    t.insert(ERROR_LOCAL_CALENDAR, "I could not open the calendar file on this device.");
    t
});

/// The English template of a dialog, if this key is known
pub fn template(key: &str) -> Option<&'static str> {
    TEMPLATES.get(key).copied()
}

/// Fill the English template of `key` with `data`.
///
/// Placeholders that have no value in `data` are kept as they are. Unknown keys are rendered as the key itself.
pub fn render(key: &str, data: &DialogData) -> String {
    let template = match template(key) {
        Some(t) => t,
        None => {
            log::warn!("No template for dialog {:?}", key);
            return key.to_string();
        },
    };

    let mut rendered = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        rendered.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => {
                let name = &after[..close];
                match data.get(name) {
                    Some(value) => rendered.push_str(value),
                    None => {
                        rendered.push('{');
                        rendered.push_str(name);
                        rendered.push('}');
                    },
                }
                rest = &after[close + 1..];
            },
            None => {
                rendered.push_str(&rest[open..]);
                rest = "";
            },
        }
    }
    rendered.push_str(rest);
    rendered
}

/// Convenience to build dialog data from pairs
pub fn dialog_data<K: ToString, V: ToString>(pairs: &[(K, V)]) -> DialogData {
    pairs.iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
