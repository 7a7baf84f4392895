// ABOUTME: System prompts for LLM interactions loaded at compile time
// ABOUTME: Provides the task assistant system prompt used for every agent run
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # System Prompts
//!
//! Prompts are loaded at compile time from markdown files for easy
//! maintenance.

/// Task management assistant system prompt
///
/// Contains instructions for the assistant including tool-usage rules,
/// language handling, and presentation guidelines.
pub const ASSISTANT_SYSTEM_PROMPT: &str = include_str!("assistant_system.md");

/// Get the system prompt for the task assistant
#[must_use]
pub const fn assistant_system_prompt() -> &'static str {
    ASSISTANT_SYSTEM_PROMPT
}
