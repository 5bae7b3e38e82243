//! A terminal data grid: user records with add/edit/delete rows, dynamically
//! added columns, a status filter and a toggled numeric sort.
//!
//! The [`grid`] module holds the data model; everything else hosts it in a
//! terminal.

pub mod controller;
pub mod domain;
pub mod form;
pub mod grid;
pub mod inputter;
pub mod logging;
pub mod model;
pub mod ui;
