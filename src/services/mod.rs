// ABOUTME: Service layer coordinating the agent, history shaping, and persistence
// ABOUTME: Routes stay thin; the behavior of a chat turn lives here
//
// SPDX-License-Identifier: MIT OR Apache-2.0

/// Agent orchestration: provider fallback, retry, and the tool loop
pub mod agent;
/// Conversation load/create and turn persistence policy
pub mod chat_orchestration;
/// Prompt history formatting and error-sentinel filtering
pub mod history;

pub use agent::{AgentOutcome, AgentService};
pub use chat_orchestration::ChatOrchestrationService;
