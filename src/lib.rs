//! Core library for the sheet-config-tools command line application.
//!
//! Configuration workbooks describe each sheet with four header rows
//! (comment, field name, type tag, routing tag) followed by data rows. The
//! library turns every data row into typed client and server records:
//! [`classify`] detects numeric text shapes, [`convert`] holds the type-tag
//! converters, [`extract`] applies the header contract and merged-cell
//! fallback to one sheet, and [`run`] walks workbooks and sheets. Workbook
//! reading and record writing live under [`io`], the YAML settings in
//! [`config`].

pub mod classify;
pub mod config;
pub mod convert;
pub mod error;
pub mod extract;
pub mod io;
pub mod model;
pub mod run;

pub use error::{Result, ToolError};
