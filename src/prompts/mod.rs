//! Prompt module for LLM-based operations.
//!
//! This module provides prompt templates for the survey composer.

pub mod survey;

pub use survey::*;
