//! Core types and rules for the Local Gems location store.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! It holds the proximity filter, the points and badges engine, input
//! validation, and the traits a persistence backend implements.

#![allow(async_fn_in_trait)]

pub mod award;
pub mod badge;
pub mod collection;
pub mod error;
pub mod geo;
pub mod location;
pub mod points;
pub mod store;
pub mod user;
pub mod validate;

pub use error::{Error, Result};
