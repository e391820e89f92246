//! Integration tests for Exam-Harvest
//!
//! These tests run the HTTP client and the full harvest against wiremock
//! servers standing in for the catalog API.

mod client_tests;
mod harvest_tests;
