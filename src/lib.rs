//! Project Intake - Conversational Project Creation
//!
//! Streams an LLM reply to the browser as Server-Sent Events while pulling a
//! fenced JSON block of project fields out of the same reply, so the prose
//! reaches the user and the structured data reaches the form.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
