use chrono::{Local, NaiveDateTime, TimeZone, Utc};
use reqwest::{header::CONTENT_TYPE, header::CONTENT_LENGTH};

use crate::calendar::CalendarId;
use crate::calendar::SupportedComponents;
use crate::error::StoreError;
use crate::event::Event;
use crate::resource::Resource;
use crate::utils::find_elem;


/// A CalDAV calendar created by a [`Client`](crate::client::Client).
#[derive(Clone, Debug)]
pub struct RemoteCalendar {
    name: String,
    resource: Resource,
    supported_components: SupportedComponents,
}

impl RemoteCalendar {
    pub fn new(name: String, resource: Resource, supported_components: SupportedComponents) -> Self {
        Self { name, resource, supported_components }
    }

    pub fn name(&self) -> &str { &self.name }
    pub fn id(&self) -> &CalendarId { self.resource.url() }
    pub fn supported_components(&self) -> SupportedComponents {
        self.supported_components
    }

    /// Fetch the events of this calendar that overlap the given (local time) range.
    ///
    /// A missing bound means the range is open on that side. Recurring events are not expanded.
    pub async fn get_events_between(&self, start: Option<NaiveDateTime>, end: Option<NaiveDateTime>) -> Result<Vec<Event>, StoreError> {
        let body = events_query_body(start, end);
        let responses = crate::client::sub_request_and_extract_elems(&self.resource, "REPORT", body, "response").await?;

        let mut events = Vec::new();
        for response in responses {
            let ical_text = match find_elem(&response, "calendar-data") {
                None => {
                    log::warn!("No calendar data in a response from {}, ignoring it", self.name);
                    continue;
                },
                Some(data) => data.text(),
            };

            let parsed = crate::ical::parse_calendar(&ical_text)
                .map_err(|err| StoreError::InvalidData(format!("in calendar {}: {}", self.name, err)))?;
            events.extend(parsed);
        }

        log::debug!("Calendar {} returned {} events", self.name, events.len());
        Ok(events)
    }

    /// Upload a new event into this calendar
    pub async fn add_event(&self, event: &Event) -> Result<(), StoreError> {
        let ical_text = crate::ical::build_from(event);
        let file_name = format!("{}.ics", sanitize_filename::sanitize(event.uid()));
        let item = self.resource.join(&file_name)
            .map_err(|err| StoreError::InvalidData(format!("invalid event URL {}: {}", file_name, err)))?;

        let response = reqwest::Client::new()
            .put(item.url().clone())
            .header("If-None-Match", "*")
            .header(CONTENT_TYPE, "text/calendar")
            .header(CONTENT_LENGTH, ical_text.len())
            .basic_auth(item.username(), Some(item.password()))
            .body(ical_text)
            .send()
            .await?;

        if response.status().is_success() == false {
            return Err(StoreError::from_status(response.status(), item.url()));
        }

        Ok(())
    }
}

fn events_query_body(start: Option<NaiveDateTime>, end: Option<NaiveDateTime>) -> String {
    let time_range = match (start, end) {
        (None, None) => String::new(),
        (start, end) => {
            let mut range = String::from("<c:time-range");
            if let Some(start) = start {
                range.push_str(&format!(r#" start="{}""#, format_utc(&start)));
            }
            if let Some(end) = end {
                range.push_str(&format!(r#" end="{}""#, format_utc(&end)));
            }
            range.push_str("/>");
            range
        },
    };

    format!(r#"
    <c:calendar-query xmlns:d="DAV:" xmlns:c="urn:ietf:params:xml:ns:caldav">
        <d:prop>
            <d:getetag />
            <c:calendar-data />
        </d:prop>
        <c:filter>
            <c:comp-filter name="VCALENDAR">
                <c:comp-filter name="VEVENT">{}</c:comp-filter>
            </c:comp-filter>
        </c:filter>
    </c:calendar-query>
"#, time_range)
}

/// Format a local time as an iCal UTC timestamp
fn format_utc(local: &NaiveDateTime) -> String {
    let utc = match Local.from_local_datetime(local).earliest() {
        Some(dt) => dt.with_timezone(&Utc),
        // This local time does not exist (DST gap)
        None => Utc.from_utc_datetime(local),
    };
    utc.format("%Y%m%dT%H%M%SZ").to_string()
}


#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn query_body_has_time_range() {
        let start = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let body = events_query_body(Some(start), None);
        assert!(body.contains(&format!(r#"<c:time-range start="{}"/>"#, format_utc(&start))));
        assert!(body.contains(r#"<c:comp-filter name="VEVENT">"#));

        let unbounded = events_query_body(None, None);
        assert!(unbounded.contains("time-range") == false);
    }
}
