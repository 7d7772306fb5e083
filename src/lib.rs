//! A terminal row picker for a fixed table of line items.
//!
//! The grid core ([`grid::Grid`]) combines a filter, a stable single-column
//! sort, pagination and per-row selection into one projection of visible rows.
//! The selected rows can be sent to a host application as a JSON payload
//! ([`export::SelectionPayload`]) through a [`host::Host`].

pub mod controller;
pub mod dataset;
pub mod domain;
pub mod export;
pub mod grid;
pub mod host;
pub mod inputter;
pub mod loader;
pub mod model;
pub mod projection;
pub mod selection;
pub mod ui;
pub mod view;
