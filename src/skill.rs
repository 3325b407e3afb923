//! The calendar skill: intent handlers that answer the user about their appointments, and add new ones.

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::backend::BackendState;
use crate::config::{CalendarConfig, TimeFormat};
use crate::datetime::{extract_datetime, has_time, nice_date, nice_time, resolve_day};
use crate::dialog::{self, dialog_data, DialogData};
use crate::error::StoreError;
use crate::event::{Event, EventTime};
use crate::traits::{EventStore, SettingsSource, SkillHost};

/// How many upcoming events are considered when looking for the next appointment
pub const NEXT_EVENTS_LOOKAHEAD: usize = 100;

/// An intent, as routed by the host
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// What the user said
    pub utterance: String,
    /// The name of the appointment, if the host extracted one
    #[serde(default)]
    pub event: Option<String>,
    /// The spoken date, if the host extracted one
    #[serde(default)]
    pub when: Option<String>,
}

impl Message {
    pub fn new<S: ToString>(utterance: S) -> Self {
        Self { utterance: utterance.to_string(), event: None, when: None }
    }

    pub fn with_event<S: ToString>(mut self, event: S) -> Self {
        self.event = Some(event.to_string());
        self
    }

    pub fn with_when<S: ToString>(mut self, when: S) -> Self {
        self.when = Some(when.to_string());
        self
    }

    /// The text a date should be looked for in
    fn when_text(&self) -> &str {
        match &self.when {
            Some(when) if when.trim().is_empty() == false => when,
            _ => &self.utterance,
        }
    }
}

/// The calendar skill.
///
/// The host capabilities are injected: `H` speaks and prompts, `S` provides the skill settings.
pub struct CalendarSkill<H, S> {
    host: H,
    settings: S,
    clock: Box<dyn Fn() -> NaiveDateTime + Send + Sync>,
}

impl<H: SkillHost, S: SettingsSource> CalendarSkill<H, S> {
    pub fn new(host: H, settings: S) -> Self {
        Self {
            host,
            settings,
            clock: Box::new(|| Local::now().naive_local()),
        }
    }

    /// Replace the clock that tells the current (local) time
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> NaiveDateTime + Send + Sync + 'static,
    {
        self.clock = Box::new(clock);
        self
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn settings(&self) -> &S {
        &self.settings
    }

    fn now(&self) -> NaiveDateTime {
        (self.clock)()
    }

    /// "What's on my calendar tomorrow?"
    pub async fn handle_day_appointment(&self, message: &Message) {
        let (config, mut store) = match self.open_store() {
            Some(s) => s,
            None => return,
        };

        let now = self.now();
        let day = resolve_day(message.when_text(), now);
        let events = match store.events_on(day).await {
            Ok(events) => events,
            Err(err) => return self.report_error(&err),
        };

        let when = nice_date(day, now.date());
        let first = match events.first() {
            None => {
                self.speak(dialog::NO_EVENTS, dialog_data(&[("when", when)]));
                return;
            },
            Some(first) => first,
        };

        self.speak(dialog::DAY, dialog_data(&[
            ("num_events", events.len().to_string()),
            ("event", first.name().to_string()),
            ("when", when),
            ("time", spoken_start(first, config.time_format)),
        ]));
        for event in events.iter().skip(1) {
            self.speak(dialog::DAY_FOLLOWED, dialog_data(&[
                ("event", event.name().to_string()),
                ("time", spoken_start(event, config.time_format)),
            ]));
        }
    }

    /// "How many appointments do I have today?"
    pub async fn handle_num_appointments(&self, message: &Message) {
        let (_config, mut store) = match self.open_store() {
            Some(s) => s,
            None => return,
        };

        let now = self.now();
        let day = resolve_day(message.when_text(), now);
        let events = match store.events_on(day).await {
            Ok(events) => events,
            Err(err) => return self.report_error(&err),
        };
        log::debug!("{} events on {}", events.len(), day);

        let when = nice_date(day, now.date());
        match events.len() {
            0 => self.speak(dialog::NO_EVENTS, dialog_data(&[("when", when)])),
            1 => self.speak(dialog::NUM_EVENT, dialog_data(&[("when", when)])),
            n => self.speak(dialog::NUM_EVENTS, dialog_data(&[("num_events", n.to_string()), ("when", when)])),
        }
    }

    /// "What is my next appointment?"
    ///
    /// An appointment at a given time is preferred over an all-day one, even a sooner one.
    pub async fn handle_next_appointment(&self, _message: &Message) {
        let (config, mut store) = match self.open_store() {
            Some(s) => s,
            None => return,
        };

        let now = self.now();
        let events = match store.upcoming_events(now, NEXT_EVENTS_LOOKAHEAD).await {
            Ok(events) => events,
            Err(err) => return self.report_error(&err),
        };

        if let Some(timed) = events.iter().find(|event| event.all_day() == false) {
            let start = timed.start().as_datetime();
            self.speak(dialog::NEXT_EVENT, dialog_data(&[
                ("event", timed.name().to_string()),
                ("date", nice_date(start.date(), now.date())),
                ("time", nice_time(start.time(), config.time_format)),
            ]));
        } else if let Some(all_day) = events.first() {
            self.speak(dialog::NEXT_ALL_DAY_EVENT, dialog_data(&[
                ("event", all_day.name().to_string()),
                ("date", nice_date(all_day.start().date(), now.date())),
            ]));
        } else {
            self.speak(dialog::NO_EVENTS_FOUND, DialogData::new());
        }
    }

    /// "Add an appointment called dentist tomorrow at 3pm"
    ///
    /// Whatever is missing (name, date, time) is asked to the user. A prompt left unanswered cancels the request.
    pub async fn handle_add_appointment(&self, message: &Message) {
        let (_config, mut store) = match self.open_store() {
            Some(s) => s,
            None => return,
        };

        let name = match self.event_name(message) {
            Some(name) => name,
            None => {
                log::info!("No event name given, not adding anything");
                return;
            },
        };
        let now = self.now();
        let mut when = match self.event_datetime(&message.utterance, now) {
            Some(when) => when,
            None => {
                log::info!("No date given, not adding {:?}", name);
                return;
            },
        };
        let name = clean_event_name(&name, now);

        if has_time(&when) == false {
            let time = match self.event_time(&name, now) {
                Some(time) => time,
                None => {
                    log::info!("No time given, not adding {:?}", name);
                    return;
                },
            };
            when = when.date().and_time(time.time());
        }

        log::info!("New event {:?} at {}", name, when);
        let event = Event::new(name.clone(), EventTime::DateTime(when));
        if let Err(err) = store.add_event(event).await {
            return self.report_error(&err);
        }
        self.speak(dialog::NEW_EVENT_SUMMARY, dialog_data(&[("event", name)]));
    }

    /// Select and open the store of this request, or tell the user why it is not possible
    fn open_store(&self) -> Option<(CalendarConfig, Box<dyn EventStore>)> {
        let config = CalendarConfig::load(&self.settings);
        match BackendState::select(&config).open() {
            Ok(Some(store)) => Some((config, store)),
            Ok(None) => {
                self.speak(dialog::SETUP, DialogData::new());
                None
            },
            Err(err) => {
                self.report_error(&err);
                None
            },
        }
    }

    fn event_name(&self, message: &Message) -> Option<String> {
        if let Some(event) = &message.event {
            if event.trim().is_empty() == false {
                return Some(event.trim().to_string());
            }
        }

        loop {
            let answer = self.host.get_response(dialog::NEW_EVENT_NAME, &DialogData::new())?;
            if answer.trim().is_empty() == false {
                return Some(answer.trim().to_string());
            }
        }
    }

    /// Look for a date in `utterance`, and keep asking until the user gives one
    fn event_datetime(&self, utterance: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
        let mut text = utterance.to_string();
        loop {
            match extract_datetime(&text, now) {
                Some(extraction) => return Some(extraction.when),
                None => {
                    log::debug!("No date in {:?}, asking for one", text);
                    text = self.host.get_response(dialog::NEW_EVENT_DATE, &DialogData::new())?;
                },
            }
        }
    }

    /// Keep asking until the user gives a time
    fn event_time(&self, name: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
        let data = dialog_data(&[("event", name)]);
        loop {
            let answer = self.host.get_response(dialog::NEW_EVENT_TIME, &data)?;
            if let Some(extraction) = extract_datetime(&answer, now) {
                if extraction.has_time() {
                    return Some(extraction.when);
                }
            }
        }
    }

    fn speak(&self, key: &str, data: DialogData) {
        self.host.speak_dialog(key, &data);
    }

    fn report_error(&self, err: &StoreError) {
        log::error!("Calendar error: {}", err);
        self.speak(error_dialog(err), DialogData::new());
    }
}

/// The dialog that tells the user about a store error
pub fn error_dialog(err: &StoreError) -> &'static str {
    match err {
        StoreError::Auth(_) => dialog::ERROR_LOGGING_IN,
        StoreError::Connection(_) => dialog::ERROR_CONNECTION,
        StoreError::NotFound(_) => dialog::ERROR_CALENDAR_NOT_FOUND,
        StoreError::UnexpectedStatus(_) | StoreError::InvalidData(_) => dialog::ERROR_CALENDAR_DATA,
        StoreError::Io { .. } => dialog::ERROR_LOCAL_CALENDAR,
    }
}

/// Remove the date words from an event name ("dentist tomorrow" becomes "dentist")
fn clean_event_name(name: &str, now: NaiveDateTime) -> String {
    match extract_datetime(name, now) {
        Some(extraction) if extraction.stripped.trim().is_empty() == false => extraction.stripped,
        _ => name.to_string(),
    }
}

fn spoken_start(event: &Event, format: TimeFormat) -> String {
    match event.start() {
        EventTime::Date(_) => "all day".to_string(),
        EventTime::DateTime(dt) => nice_time(dt.time(), format),
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap().and_hms_opt(10, 0, 0).unwrap()
    }

    #[test]
    fn event_names_lose_their_dates() {
        assert_eq!(clean_event_name("dentist tomorrow", now()), "dentist");
        assert_eq!(clean_event_name("Lunch with Sam", now()), "Lunch with Sam");
        // Nothing would be left
        assert_eq!(clean_event_name("tomorrow", now()), "tomorrow");
    }

    #[test]
    fn errors_have_distinct_dialogs() {
        assert_eq!(error_dialog(&StoreError::Auth(401)), dialog::ERROR_LOGGING_IN);
        assert_eq!(error_dialog(&StoreError::NotFound("x".into())), dialog::ERROR_CALENDAR_NOT_FOUND);
        assert_eq!(error_dialog(&StoreError::InvalidData("x".into())), dialog::ERROR_CALENDAR_DATA);
        let io = StoreError::io(std::path::Path::new("/x"), std::io::Error::new(std::io::ErrorKind::Other, "boom"));
        assert_eq!(error_dialog(&io), dialog::ERROR_LOCAL_CALENDAR);
    }

    #[test]
    fn when_slot_wins_over_utterance() {
        let msg = Message::new("what do I have on friday").with_when("tomorrow");
        assert_eq!(msg.when_text(), "tomorrow");
        assert_eq!(Message::new("what do I have").with_when(" ").when_text(), "what do I have");
    }

    #[test]
    fn messages_from_json() {
        let msg: Message = serde_json::from_str(r#"{"utterance": "add dentist", "event": "dentist"}"#).unwrap();
        assert_eq!(msg, Message::new("add dentist").with_event("dentist"));
    }
}
