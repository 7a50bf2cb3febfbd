//! Camera journey statistics server.
//!
//! Answers questions about vehicle journeys recorded by a network of
//! roadside cameras: which journeys followed a given route, how long that
//! stretch took, and how the results break down by hour, vehicle class
//! or site.

pub mod aggregate;
pub mod cache;
pub mod config;
pub mod domain;
pub mod export;
pub mod filter;
pub mod route;
pub mod search;
pub mod store;
pub mod web;
