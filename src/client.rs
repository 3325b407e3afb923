//! This module provides a client to connect to a CalDAV server

use std::convert::TryFrom;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use reqwest::Method;
use reqwest::header::CONTENT_TYPE;
use minidom::Element;
use url::Url;

use crate::calendar::SupportedComponents;
use crate::calendar::local_calendar::upcoming;
use crate::calendar::remote_calendar::RemoteCalendar;
use crate::error::StoreError;
use crate::event::Event;
use crate::resource::Resource;
use crate::traits::EventStore;
use crate::utils::{find_elem, find_elems};


static DAVCLIENT_BODY: &str = r#"
    <d:propfind xmlns:d="DAV:">
       <d:prop>
           <d:current-user-principal />
       </d:prop>
    </d:propfind>
"#;

static HOMESET_BODY: &str = r#"
    <d:propfind xmlns:d="DAV:" xmlns:c="urn:ietf:params:xml:ns:caldav" >
      <d:self/>
      <d:prop>
        <c:calendar-home-set />
      </d:prop>
    </d:propfind>
"#;

static CAL_BODY: &str = r#"
    <d:propfind xmlns:d="DAV:" xmlns:c="urn:ietf:params:xml:ns:caldav" >
       <d:prop>
         <d:displayname />
         <d:resourcetype />
         <c:supported-calendar-component-set />
       </d:prop>
    </d:propfind>
"#;


/// Send a WebDAV request and return the body of the answer
pub(crate) async fn sub_request(resource: &Resource, method: &str, body: String, depth: u32) -> Result<String, StoreError> {
    let method = Method::from_bytes(method.as_bytes())
        .map_err(|err| StoreError::InvalidData(format!("invalid HTTP method {:?}: {}", method, err)))?;

    let res = reqwest::Client::new()
        .request(method, resource.url().clone())
        .header("Depth", depth)
        .header(CONTENT_TYPE, "application/xml")
        .basic_auth(resource.username(), Some(resource.password()))
        .body(body)
        .send()
        .await?;

    if res.status().is_success() == false {
        return Err(StoreError::from_status(res.status(), resource.url()));
    }

    let text = res.text().await?;
    Ok(text)
}

/// Send a WebDAV request and return every element with the given name in the answer
pub(crate) async fn sub_request_and_extract_elems(resource: &Resource, method: &str, body: String, item: &str) -> Result<Vec<Element>, StoreError> {
    let text = sub_request(resource, method, body, 1).await?;

    let element: Element = parse_xml(&text)?;
    Ok(find_elems(&element, item)
        .iter()
        .map(|elem| (*elem).clone())
        .collect())
}

/// Send a depth-0 PROPFIND and return the text of the element found after walking `items`
async fn sub_request_and_extract_elem(resource: &Resource, body: String, items: &[&str]) -> Result<String, StoreError> {
    let text = sub_request(resource, "PROPFIND", body, 0).await?;

    let root = parse_xml(&text)?;
    let mut current_element: &Element = &root;
    for item in items {
        current_element = match find_elem(current_element, item) {
            Some(elem) => elem,
            None => return Err(StoreError::InvalidData(format!("missing <{}> in the answer from {}", item, resource.url()))),
        };
    }

    Ok(current_element.text())
}

fn parse_xml(text: &str) -> Result<Element, StoreError> {
    text.parse()
        .map_err(|err| StoreError::InvalidData(format!("invalid XML: {}", err)))
}


/// A CalDAV source that fetches its data from a CalDAV server
pub struct Client {
    resource: Resource,

    principal: Option<Resource>,
    calendar_home_set: Option<Resource>,
    calendars: Option<Vec<RemoteCalendar>>,
}

impl Client {
    /// Create a client. This does not start a connection
    pub fn new<S: AsRef<str>, T: ToString, U: ToString>(url: S, username: T, password: U) -> Result<Self, url::ParseError> {
        let url = Url::parse(url.as_ref())?;

        Ok(Self::from_resource(Resource::new(url, username.to_string(), password.to_string())))
    }

    /// Create a client for an already known server. This does not start a connection
    pub fn from_resource(resource: Resource) -> Self {
        Self {
            resource,
            principal: None,
            calendar_home_set: None,
            calendars: None,
        }
    }

    /// Return the Principal URL, or fetch it from server if not known yet
    async fn get_principal(&mut self) -> Result<Resource, StoreError> {
        if let Some(p) = &self.principal {
            return Ok(p.clone());
        }

        let href = sub_request_and_extract_elem(&self.resource, DAVCLIENT_BODY.into(), &["current-user-principal", "href"]).await?;
        let principal = self.resource.combine(&href);
        self.principal = Some(principal.clone());
        log::debug!("Principal URL is {}", href);

        Ok(principal)
    }

    /// Return the Homeset URL, or fetch it from server if not known yet
    async fn get_cal_home_set(&mut self) -> Result<Resource, StoreError> {
        if let Some(h) = &self.calendar_home_set {
            return Ok(h.clone());
        }
        let principal = self.get_principal().await?;

        let href = sub_request_and_extract_elem(&principal, HOMESET_BODY.into(), &["calendar-home-set", "href"]).await?;
        let chs = self.resource.combine(&href);
        self.calendar_home_set = Some(chs.clone());
        log::debug!("Calendar home set URL is {:?}", chs.url().path());

        Ok(chs)
    }

    /// Return the calendars of the account, in the order the server lists them.
    /// They are fetched from the server if not known yet
    pub async fn get_calendars(&mut self) -> Result<&[RemoteCalendar], StoreError> {
        if self.calendars.is_none() {
            let calendars = self.fetch_calendars().await?;
            self.calendars = Some(calendars);
        }
        Ok(self.calendars.as_deref().unwrap_or(&[]))
    }

    async fn fetch_calendars(&mut self) -> Result<Vec<RemoteCalendar>, StoreError> {
        let cal_home_set = self.get_cal_home_set().await?;

        let reps = sub_request_and_extract_elems(&cal_home_set, "PROPFIND", CAL_BODY.to_string(), "response").await?;
        let mut calendars = Vec::new();
        for rep in reps {
            let display_name = find_elem(&rep, "displayname").map(|e| e.text()).unwrap_or("<no name>".to_string());
            log::debug!("Considering calendar {}", display_name);

            // We filter out non-calendar items
            let resource_types = match find_elem(&rep, "resourcetype") {
                None => continue,
                Some(rt) => rt,
            };
            let found_calendar_type = resource_types.children().any(|rt| rt.name() == "calendar");
            if found_calendar_type == false {
                continue;
            }

            // We filter out the root calendar collection, that has an empty supported-calendar-component-set
            let el_supported_comps = match find_elem(&rep, "supported-calendar-component-set") {
                None => continue,
                Some(comps) => comps,
            };
            if el_supported_comps.children().count() == 0 {
                continue;
            }

            let calendar_href = match find_elem(&rep, "href") {
                None => {
                    log::warn!("Calendar {} has no URL! Ignoring it.", display_name);
                    continue;
                },
                Some(h) => h.text(),
            };

            let supported_components = match SupportedComponents::try_from(el_supported_comps.clone()) {
                Err(err) => {
                    log::warn!("Calendar {} has invalid supported components ({})! Ignoring it.", display_name, err);
                    continue;
                },
                Ok(sc) => sc,
            };
            let this_calendar = RemoteCalendar::new(display_name, cal_home_set.combine(&calendar_href), supported_components);
            log::info!("Found calendar {}", this_calendar.name());
            calendars.push(this_calendar);
        }

        Ok(calendars)
    }

    /// The calendars that can hold events (task lists are left out)
    async fn get_event_calendars(&mut self) -> Result<Vec<&RemoteCalendar>, StoreError> {
        Ok(self.get_calendars().await?
            .iter()
            .filter(|cal| {
                let can_hold_events = cal.supported_components().contains(SupportedComponents::EVENT);
                if can_hold_events == false {
                    log::debug!("Calendar {} cannot hold events, skipping it", cal.name());
                }
                can_hold_events
            })
            .collect())
    }
}

#[async_trait]
impl EventStore for Client {
    async fn events_on(&mut self, day: NaiveDate) -> Result<Vec<Event>, StoreError> {
        let start = day.and_time(NaiveTime::MIN);
        let end = start + Duration::days(1);

        let mut events = Vec::new();
        for calendar in self.get_event_calendars().await? {
            let found = calendar.get_events_between(Some(start), Some(end)).await?;
            events.extend(found.into_iter().filter(|event| event.starts_on(day)));
        }
        Ok(events)
    }

    async fn upcoming_events(&mut self, after: NaiveDateTime, limit: usize) -> Result<Vec<Event>, StoreError> {
        let mut events = Vec::new();
        for calendar in self.get_event_calendars().await? {
            events.extend(calendar.get_events_between(Some(after), None).await?);
        }
        Ok(upcoming(events.into_iter(), after, limit))
    }

    /// Add the event to every calendar of the account
    async fn add_event(&mut self, event: Event) -> Result<(), StoreError> {
        let calendars = self.get_event_calendars().await?;
        if calendars.is_empty() {
            return Err(StoreError::NotFound("no calendar that can hold events in this account".to_string()));
        }

        for calendar in calendars {
            calendar.add_event(&event).await?;
            log::info!("Added event {} to calendar {}", event.name(), calendar.name());
        }
        Ok(())
    }
}
