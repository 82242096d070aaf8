//! Client-side draft and submission engine for student program
//! applications, exposed over HTTP to the surrounding UI.

pub mod application;
pub mod config;
pub mod error;
pub mod telemetry;
