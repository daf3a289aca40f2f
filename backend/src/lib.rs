//! # Biomass Explorer
//!
//! Client-side engine for exploring satellite vegetation and drought indices
//! over an agricultural field.
//!
//! The heavy lifting (scene search, cloud masking, index math, tile rendering)
//! happens on a remote analysis service. This crate keeps everything around it:
//! the area of interest, the analysis request and its result, the overlay
//! layers for the map, chart data and local persistence. The optional
//! `biomass-server` binary exposes it as a small JSON API.
//!
//! ## Features
//!
//! - **Area of interest**: cadastral parcel search and locate, pasted polygon
//!   coordinates, saved fields
//! - **Analysis**: period summaries with condition classes, missing-data
//!   warnings, time-series chart data
//! - **Map overlays**: concurrent per-date layer requests with partial-failure
//!   accounting and deterministic ordering
//! - **Pixel inspector**: index values at a clicked location
//! - **Persistence**: saved fields and preferences in a JSON file store
//!
//! ## Architecture
//!
//! - [`api`]: wire and domain types shared by every layer
//! - [`models`]: index catalog, AOI geometry, date ranges
//! - [`remote`]: backend trait and its HTTP and in-memory implementations
//! - [`storage`]: key-value store, saved fields, preferences
//! - [`services`]: session state and the operations on it
//! - [`config`]: TOML and environment configuration
//! - [`http`]: Axum router and handlers (feature `http-server`)

pub mod api;
pub mod config;
pub mod models;
pub mod remote;
pub mod services;
pub mod storage;

#[cfg(feature = "http-server")]
pub mod http;
