//! A module to build ICal files

use chrono::{NaiveDate, NaiveDateTime, Utc};
use ics::properties::{DtStart, Summary};
use ics::ICalendar;
use ics::components::{Parameter, Property};

use crate::event::{Event, EventTime, ExtraProperty};

/// Create an iCal file that contains a single event, as it is stored on a CalDAV server
pub fn build_from(event: &Event) -> String {
    build_calendar(std::slice::from_ref(event))
}

/// Create an iCal file that contains every given event, in order
pub fn build_calendar(events: &[Event]) -> String {
    let dtstamp = format!("{}Z", format_date_time(&Utc::now().naive_utc()));
    let prod_id = crate::ical::default_prod_id();

    let mut calendar = ICalendar::new("2.0", prod_id);
    for event in events {
        calendar.add_event(build_event(event, &dtstamp));
    }

    calendar.to_string()
}

/// Create an iCal file with the given events, followed by raw components (see [`crate::ical::other_components`])
pub fn build_calendar_with(events: &[Event], other_components: &[String]) -> String {
    let content = build_calendar(events);
    let end = match content.rfind("END:VCALENDAR") {
        Some(end) if other_components.is_empty() == false => end,
        _ => return content,
    };

    let mut result = String::with_capacity(content.len() + other_components.iter().map(String::len).sum::<usize>());
    result.push_str(&content[..end]);
    for component in other_components {
        result.push_str(component);
    }
    result.push_str(&content[end..]);
    result
}

fn build_event<'a>(event: &'a Event, dtstamp: &str) -> ics::Event<'a> {
    let mut ical_event = ics::Event::new(event.uid(), dtstamp.to_string());

    match (event.original_start(), event.start()) {
        (Some(original), _) => ical_event.push(raw_property(original)),
        (None, EventTime::Date(date)) => {
            let mut dtstart = DtStart::new(format_date(date));
            dtstart.add(Parameter::new("VALUE", "DATE"));
            ical_event.push(dtstart);
        },
        (None, EventTime::DateTime(dt)) => ical_event.push(DtStart::new(format_date_time(dt))),
    }
    ical_event.push(Summary::new(ics::escape_text(event.name())));

    for prop in event.extra_properties() {
        ical_event.push(raw_property(prop));
    }

    ical_event
}

fn raw_property(prop: &ExtraProperty) -> Property<'_> {
    let mut raw = Property::new(prop.name.as_str(), prop.value.as_str());
    for (key, values) in &prop.params {
        raw.add(Parameter::new(key.as_str(), values.join(",")));
    }
    raw
}

fn format_date_time(dt: &NaiveDateTime) -> String {
    dt.format("%Y%m%dT%H%M%S").to_string()
}

fn format_date(date: &NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{read_global, ORG_NAME, PRODUCT_NAME};

    #[test]
    fn test_ical_from_event() {
        let start = NaiveDate::from_ymd_opt(2026, 10, 20).unwrap().and_hms_opt(15, 0, 0).unwrap();
        let event = Event::new(String::from("Lunch with ÜTF-8 friends, at noon"), EventTime::DateTime(start));

        let ical = build_from(&event);
        let expected_start = "BEGIN:VCALENDAR\r\n\
            VERSION:2.0\r\n".to_string()
            + &format!("PRODID:-//{}//{}//EN\r\n", read_global(&ORG_NAME), read_global(&PRODUCT_NAME))
            + "BEGIN:VEVENT\r\n"
            + &format!("UID:{}\r\n", event.uid());
        assert!(ical.starts_with(&expected_start), "{}", ical);
        assert!(ical.contains("DTSTART:20261020T150000\r\n"));
        assert!(ical.contains("SUMMARY:Lunch with ÜTF-8 friends\\, at noon\r\n"));
        assert!(ical.ends_with("END:VEVENT\r\nEND:VCALENDAR\r\n"));
    }

    #[test]
    fn test_all_day_event_and_round_trip() {
        let date = NaiveDate::from_ymd_opt(2026, 12, 25).unwrap();
        let event = Event::new(String::from("Christmas"), EventTime::Date(date));

        let ical = build_from(&event);
        assert!(ical.contains("DTSTART;VALUE=DATE:20261225\r\n"));

        let parsed = crate::ical::parse(&ical).unwrap();
        assert_eq!(parsed, event);
    }

    #[test]
    fn test_extra_properties_survive() {
        let content = "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:-//test//EN\r\n\
            BEGIN:VEVENT\r\nUID:abc\r\nDTSTART:20260101T100000\r\nSUMMARY:Meeting\r\n\
            LOCATION;LANGUAGE=en:Room 4\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n";
        let events = crate::ical::parse_calendar(content).unwrap();

        let rebuilt = build_calendar(&events);
        assert!(rebuilt.contains("LOCATION;LANGUAGE=en:Room 4\r\n"), "{}", rebuilt);
        assert_eq!(crate::ical::parse_calendar(&rebuilt).unwrap(), events);
    }

    #[test]
    fn test_zoned_start_and_other_components_are_written_back() {
        let content = "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:-//test//EN\r\n\
            BEGIN:VTODO\r\nUID:todo\r\nSUMMARY:Chores\r\nEND:VTODO\r\n\
            BEGIN:VEVENT\r\nUID:abc\r\nDTSTART;TZID=Europe/Paris:20260101T100000\r\nSUMMARY:Meeting\r\nEND:VEVENT\r\n\
            END:VCALENDAR\r\n";
        let events = crate::ical::parse_calendar(content).unwrap();
        let others = crate::ical::other_components(content);
        assert_eq!(others, vec!["BEGIN:VTODO\r\nUID:todo\r\nSUMMARY:Chores\r\nEND:VTODO\r\n".to_string()]);

        let rebuilt = build_calendar_with(&events, &others);
        assert!(rebuilt.contains("DTSTART;TZID=Europe/Paris:20260101T100000\r\n"), "{}", rebuilt);
        assert!(rebuilt.ends_with("END:VEVENT\r\nBEGIN:VTODO\r\nUID:todo\r\nSUMMARY:Chores\r\nEND:VTODO\r\nEND:VCALENDAR\r\n"), "{}", rebuilt);
        assert_eq!(crate::ical::parse_calendar(&rebuilt).unwrap(), events);
    }
}
