//! HTTP request handlers.
//!
//! This module contains all the endpoint handlers for the gateway API.

pub mod accounts;
pub mod health;
pub mod oauth;
