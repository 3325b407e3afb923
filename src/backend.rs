//! Choosing where the calendar lives.
//!
//! The choice is made again for every request, from the configuration of that request. It is never stored.

use std::path::PathBuf;

use url::Url;

use crate::calendar::local_calendar::LocalCalendar;
use crate::client::Client;
use crate::config::{CalendarConfig, ServerSettings, ServerType};
use crate::error::StoreError;
use crate::resource::Resource;
use crate::traits::EventStore;

/// The calendar store a request should use
#[derive(Clone, Debug, PartialEq)]
pub enum BackendState {
    /// An iCal file on this device
    Local { path: PathBuf },
    /// A CalDAV server, with everything needed to log in
    RemoteWithCreds(Resource),
    /// A CalDAV server was chosen, but the configuration lacks credentials or an address
    RemoteNeedsSetup,
}

impl BackendState {
    pub fn select(config: &CalendarConfig) -> Self {
        match config.server_type {
            ServerType::Local => BackendState::Local { path: config.local_ics_location.clone() },
            ServerType::Server => {
                let server = &config.server;
                if server.username.trim().is_empty() || server.server_address.trim().is_empty() {
                    log::info!("The calendar server is not configured yet");
                    return BackendState::RemoteNeedsSetup;
                }

                match server_url(server) {
                    Ok(url) => BackendState::RemoteWithCreds(Resource::new(url, server.username.clone(), server.password.clone())),
                    Err(err) => {
                        log::error!("Invalid calendar server address {:?}: {}", server.server_address, err);
                        BackendState::RemoteNeedsSetup
                    },
                }
            },
        }
    }

    /// Open the store of this state.
    ///
    /// Returns `Ok(None)` when the store cannot be used until the user completes the configuration.
    /// A local calendar file (and its folders) is created if it does not exist yet.
    pub fn open(&self) -> Result<Option<Box<dyn EventStore>>, StoreError> {
        match self {
            BackendState::Local { path } => {
                let calendar = LocalCalendar::load_or_create(path)?;
                Ok(Some(Box::new(calendar)))
            },
            BackendState::RemoteWithCreds(resource) => {
                log::debug!("Using the calendar server at {}", resource.url());
                Ok(Some(Box::new(Client::from_resource(resource.clone()))))
            },
            BackendState::RemoteNeedsSetup => Ok(None),
        }
    }
}

/// `http://address:port/`, unless the address already has a scheme
fn server_url(server: &ServerSettings) -> Result<Url, url::ParseError> {
    let address = server.server_address.trim();
    let port = server.port.trim();

    if address.contains("://") {
        let mut url = Url::parse(address)?;
        if port.is_empty() == false && url.port().is_none() {
            let port: u16 = port.parse().map_err(|_| url::ParseError::InvalidPort)?;
            url.set_port(Some(port)).map_err(|_| url::ParseError::InvalidPort)?;
        }
        return Ok(url);
    }

    let address = address.trim_end_matches('/');
    if port.is_empty() {
        Url::parse(&format!("http://{}/", address))
    } else {
        Url::parse(&format!("http://{}:{}/", address, port))
    }
}
