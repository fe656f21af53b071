//! # IO Module
//!
//! Interface layer between presentation code and the finance store. The
//! only protocol is the localhost REST API in [`rest`]; handlers translate
//! JSON to store calls and store errors to HTTP status codes, nothing more.

pub mod rest;
