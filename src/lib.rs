//! This crate provides a calendar skill for voice assistants.
//!
//! The skill answers questions about the user's appointments and adds new ones. It is driven by a host (the voice-assistant runtime),
//! that routes intents to the handlers of a [`CalendarSkill`], and provides it with the [`SkillHost`](traits::SkillHost)
//! and [`SettingsSource`](traits::SettingsSource) capabilities.
//!
//! Appointments are stored either in a local iCal file (see [`LocalCalendar`](calendar::local_calendar::LocalCalendar)),
//! or on a CalDAV server, through the client of the [`client`] module. The [`backend`] module chooses between the two for every request. \
//! Dates are found in what the user says by the [`datetime`] module.

pub mod traits;

pub mod calendar;
mod event;
pub use event::{Event, EventTime, ExtraProperty};
pub mod ical;

pub mod client;
pub mod backend;
pub use backend::BackendState;

pub mod config;
pub mod settings;
pub mod error;
pub use error::StoreError;
pub mod resource;

pub mod datetime;
pub mod dialog;
pub mod skill;
pub use skill::{CalendarSkill, Message};

pub mod utils;
