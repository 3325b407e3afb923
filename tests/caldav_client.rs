//! Tests of the CalDAV client against a fake server

use chrono::{NaiveDate, NaiveDateTime};
use mockito::{Matcher, Server, ServerGuard};

use calendar_skill::calendar::SupportedComponents;
use calendar_skill::client::Client;
use calendar_skill::traits::EventStore;
use calendar_skill::{Event, EventTime, StoreError};

fn at(m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, m, d).unwrap().and_hms_opt(h, min, 0).unwrap()
}

fn multistatus(responses: &str) -> String {
    format!(r#"<d:multistatus xmlns:d="DAV:" xmlns:c="urn:ietf:params:xml:ns:caldav">{}</d:multistatus>"#, responses)
}

fn calendar_response(href: &str, name: &str, components: &[&str]) -> String {
    let comps: String = components.iter()
        .map(|c| format!(r#"<c:comp name="{}"/>"#, c))
        .collect();
    format!(r#"
    <d:response>
        <d:href>{}</d:href>
        <d:propstat>
            <d:prop>
                <d:displayname>{}</d:displayname>
                <d:resourcetype><d:collection/><c:calendar/></d:resourcetype>
                <c:supported-calendar-component-set>{}</c:supported-calendar-component-set>
            </d:prop>
            <d:status>HTTP/1.1 200 OK</d:status>
        </d:propstat>
    </d:response>"#, href, name, comps)
}

/// A server with a principal, a calendar home set, two event calendars and a task list
async fn discovery_mocks(server: &mut ServerGuard) -> Vec<mockito::Mock> {
    let principal = server.mock("PROPFIND", "/")
        .match_body(Matcher::Regex("current-user-principal".to_string()))
        .with_status(207)
        .with_body(multistatus(r#"
            <d:response>
                <d:href>/</d:href>
                <d:propstat>
                    <d:prop><d:current-user-principal><d:href>/principals/alice/</d:href></d:current-user-principal></d:prop>
                    <d:status>HTTP/1.1 200 OK</d:status>
                </d:propstat>
            </d:response>"#))
        .create_async()
        .await;

    let home_set = server.mock("PROPFIND", "/principals/alice/")
        .match_body(Matcher::Regex("calendar-home-set".to_string()))
        .with_status(207)
        .with_body(multistatus(r#"
            <d:response>
                <d:href>/principals/alice/</d:href>
                <d:propstat>
                    <d:prop><c:calendar-home-set><d:href>/calendars/alice/</d:href></c:calendar-home-set></d:prop>
                    <d:status>HTTP/1.1 200 OK</d:status>
                </d:propstat>
            </d:response>"#))
        .create_async()
        .await;

    let home = r#"
    <d:response>
        <d:href>/calendars/alice/</d:href>
        <d:propstat>
            <d:prop>
                <d:resourcetype><d:collection/></d:resourcetype>
            </d:prop>
            <d:status>HTTP/1.1 200 OK</d:status>
        </d:propstat>
    </d:response>"#;
    let body = multistatus(&format!("{}{}{}{}",
        home,
        calendar_response("/calendars/alice/personal/", "Personal", &["VEVENT", "VTODO"]),
        calendar_response("/calendars/alice/work/", "Work", &["VEVENT"]),
        calendar_response("/calendars/alice/tasks/", "Tasks", &["VTODO"]),
    ));
    let calendars = server.mock("PROPFIND", "/calendars/alice/")
        .with_status(207)
        .with_body(body)
        .create_async()
        .await;

    vec![principal, home_set, calendars]
}

fn ical_event(uid: &str, start: &str, summary: &str) -> String {
    [
        "BEGIN:VCALENDAR",
        "VERSION:2.0",
        "PRODID:-//Test//Server//EN",
        "BEGIN:VEVENT",
        &format!("UID:{}", uid),
        "DTSTAMP:20261001T000000Z",
        &format!("DTSTART:{}", start),
        &format!("SUMMARY:{}", summary),
        "END:VEVENT",
        "END:VCALENDAR",
    ].join("\n")
}

fn report_body(events: &[String]) -> String {
    let responses: String = events.iter().enumerate()
        .map(|(i, ical)| format!(r#"
    <d:response>
        <d:href>/calendars/alice/event-{}.ics</d:href>
        <d:propstat>
            <d:prop><d:getetag>"{}"</d:getetag><c:calendar-data>{}</c:calendar-data></d:prop>
            <d:status>HTTP/1.1 200 OK</d:status>
        </d:propstat>
    </d:response>"#, i, i, ical))
        .collect();
    multistatus(&responses)
}


#[tokio::test]
async fn discovers_calendars() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut server = Server::new_async().await;
    let mocks = discovery_mocks(&mut server).await;

    let mut client = Client::new(format!("{}/", server.url()), "alice", "secret").unwrap();
    let calendars = client.get_calendars().await.unwrap();

    let names: Vec<&str> = calendars.iter().map(|cal| cal.name()).collect();
    assert_eq!(names, vec!["Personal", "Work", "Tasks"]);
    assert_eq!(calendars[1].id().path(), "/calendars/alice/work/");
    assert_eq!(calendars[0].supported_components(), SupportedComponents::EVENT | SupportedComponents::TODO);
    assert_eq!(calendars[2].supported_components(), SupportedComponents::TODO);

    // Discovery results are kept
    let _ = client.get_calendars().await.unwrap();
    for mock in mocks {
        mock.assert_async().await;
    }
}

#[tokio::test]
async fn events_of_a_day() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut server = Server::new_async().await;
    let _mocks = discovery_mocks(&mut server).await;

    let personal = server.mock("REPORT", "/calendars/alice/personal/")
        .match_body(Matcher::Regex("time-range".to_string()))
        .with_status(207)
        .with_body(report_body(&[
            ical_event("a", "20261020T090000", "Standup"),
            // Servers may send events that only overlap the range
            ical_event("b", "20261019T230000", "Late show"),
        ]))
        .create_async()
        .await;
    let work = server.mock("REPORT", "/calendars/alice/work/")
        .with_status(207)
        .with_body(report_body(&[ical_event("c", "20261020", "Conference")]))
        .create_async()
        .await;

    let mut client = Client::new(format!("{}/", server.url()), "alice", "secret").unwrap();
    let events = client.events_on(NaiveDate::from_ymd_opt(2026, 10, 20).unwrap()).await.unwrap();

    let names: Vec<&str> = events.iter().map(|e| e.name()).collect();
    assert_eq!(names, vec!["Standup", "Conference"]);
    assert_eq!(events[0].start(), &EventTime::DateTime(at(10, 20, 9, 0)));
    assert!(events[1].all_day());

    personal.assert_async().await;
    work.assert_async().await;
}

#[tokio::test]
async fn empty_calendars_are_not_an_error() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut server = Server::new_async().await;
    let _mocks = discovery_mocks(&mut server).await;

    let _reports = server.mock("REPORT", Matcher::Regex(r"^/calendars/alice/.*/$".to_string()))
        .with_status(207)
        .with_body(multistatus(""))
        .expect(2)
        .create_async()
        .await;

    let mut client = Client::new(format!("{}/", server.url()), "alice", "secret").unwrap();
    let events = client.events_on(NaiveDate::from_ymd_opt(2026, 10, 20).unwrap()).await.unwrap();
    assert!(events.is_empty());
}

#[tokio::test]
async fn new_events_go_to_every_calendar() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut server = Server::new_async().await;
    let _mocks = discovery_mocks(&mut server).await;

    let personal = server.mock("PUT", Matcher::Regex(r"^/calendars/alice/personal/.*\.ics$".to_string()))
        .match_header("If-None-Match", "*")
        .match_body(Matcher::Regex("SUMMARY:Dentist".to_string()))
        .with_status(201)
        .expect(1)
        .create_async()
        .await;
    let work = server.mock("PUT", Matcher::Regex(r"^/calendars/alice/work/.*\.ics$".to_string()))
        .match_body(Matcher::Regex("DTSTART:20261020T150000".to_string()))
        .with_status(201)
        .expect(1)
        .create_async()
        .await;
    let tasks = server.mock("PUT", Matcher::Regex(r"^/calendars/alice/tasks/.*".to_string()))
        .expect(0)
        .create_async()
        .await;

    let mut client = Client::new(format!("{}/", server.url()), "alice", "secret").unwrap();
    client.add_event(Event::new("Dentist".to_string(), EventTime::DateTime(at(10, 20, 15, 0)))).await.unwrap();

    personal.assert_async().await;
    work.assert_async().await;
    tasks.assert_async().await;
}

#[tokio::test]
async fn a_refused_upload_stops_the_broadcast() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut server = Server::new_async().await;
    let _mocks = discovery_mocks(&mut server).await;

    let personal = server.mock("PUT", Matcher::Regex(r"^/calendars/alice/personal/.*\.ics$".to_string()))
        .with_status(201)
        .expect(1)
        .create_async()
        .await;
    let work = server.mock("PUT", Matcher::Regex(r"^/calendars/alice/work/.*\.ics$".to_string()))
        .with_status(500)
        .expect(1)
        .create_async()
        .await;

    let mut client = Client::new(format!("{}/", server.url()), "alice", "secret").unwrap();
    match client.add_event(Event::new("Dentist".to_string(), EventTime::DateTime(at(10, 20, 15, 0)))).await {
        Err(StoreError::UnexpectedStatus(500)) => (),
        other => panic!("unexpected result {:?}", other),
    }

    personal.assert_async().await;
    work.assert_async().await;
}

#[tokio::test]
async fn failures_are_typed() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut server = Server::new_async().await;
    let _unauthorized = server.mock("PROPFIND", "/")
        .with_status(401)
        .create_async()
        .await;

    let mut client = Client::new(format!("{}/", server.url()), "alice", "wrong").unwrap();
    match client.events_on(NaiveDate::from_ymd_opt(2026, 10, 20).unwrap()).await {
        Err(StoreError::Auth(401)) => (),
        other => panic!("unexpected result {:?}", other),
    }

    let mut server = Server::new_async().await;
    let _garbage = server.mock("PROPFIND", "/")
        .with_status(207)
        .with_body("this is not XML")
        .create_async()
        .await;
    let mut client = Client::new(format!("{}/", server.url()), "alice", "secret").unwrap();
    match client.upcoming_events(at(10, 20, 0, 0), 10).await {
        Err(StoreError::InvalidData(_)) => (),
        other => panic!("unexpected result {:?}", other),
    }
}
