//! # agent-core
//!
//! Runtime contract for conversational agents: provider-agnostic LLM
//! abstraction, ordered skill sets, and the reasoning loop.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Agent                                 │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────┐  │
//! │  │  Reasoning  │  │  SkillSet   │  │   LlmProvider       │  │
//! │  │    Loop     │──│  (ordered)  │──│   (Strategy)        │  │
//! │  └─────────────┘  └─────────────┘  └─────────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! An [`Agent`] is bound to one provider, one skill set and one system
//! prompt at construction and never switches afterwards.

pub mod error;
pub mod message;
pub mod provider;
pub mod reasoning;
pub mod tool;

pub use error::{AgentError, Result};
pub use message::{Conversation, Message, Role};
pub use provider::{CompletionStream, GenerationOptions, LlmProvider, StreamChunk};
pub use reasoning::{Agent, AgentBuilder, AgentOptions};
pub use tool::{ParameterSchema, SkillSet, Tool, ToolCall, ToolResult, ToolSchema};
