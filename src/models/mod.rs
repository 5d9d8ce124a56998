//! Request and Response models for the cache server API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! deserializing query strings and serializing HTTP response bodies.

pub mod requests;
pub mod responses;

pub use requests::{InvalidateQuery, InvalidateTarget, KeyQuery, SetQuery};
pub use responses::{
    ErrorResponse, GetResponse, HealthResponse, InvalidateResponse, SetResponse, StatsResponse,
};
