//! This module handles conversion between iCal files and internal representations
//!
//! It is a wrapper around different Rust third-party libraries, since I haven't find any complete library that is able to parse _and_ generate iCal files

mod parser;
pub use parser::{other_components, parse, parse_calendar};
mod builder;
pub use builder::{build_calendar, build_calendar_with, build_from};

use crate::config::{ORG_NAME, PRODUCT_NAME};

pub fn default_prod_id() -> String {
    format!("-//{}//{}//EN", crate::config::read_global(&ORG_NAME), crate::config::read_global(&PRODUCT_NAME))
}
