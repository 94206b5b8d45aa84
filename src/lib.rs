//! Data plane of an e-commerce sales dashboard: ingest and clean an invoice
//! CSV, filter it by country / date range / minimum quantity, aggregate KPIs
//! and chart breakdowns, and export the filtered view.
//!
//! The flow is linear: [`ingest`] once per source (memoized via [`cache`]),
//! [`filter`] on every parameter change, [`metrics`] on the filtered result.
//! Rendering is the caller's concern.

pub mod cache;
pub mod export;
pub mod filter;
pub mod ingest;
pub mod metrics;
