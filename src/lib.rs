//! tracegrid - column configuration engine for trace/thread data grids.
//!
//! This library provides:
//! - `column` - column descriptors, dynamic (per-name) columns, the threads catalog
//! - `view` - persisted per-view state (selection, order, widths, sort, paging)
//! - `storage` - view-state stores (in-memory, JSON files)
//! - `materialize` - descriptors + view state -> columns to render
//! - `filter`, `export` - row filters and CSV export of selected rows
//! - `render`, `fmt` - cell renderers and formatting helpers
//! - `model`, `provider` - record types and data-source traits
//! - `grid` - a session tying all of the above together for one view

pub mod column;
pub mod config;
pub mod export;
pub mod filter;
pub mod fmt;
pub mod grid;
pub mod materialize;
pub mod model;
pub mod provider;
pub mod render;
pub mod storage;
pub mod view;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
