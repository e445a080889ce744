//! Generation backend integration for the Knowhow copilot.
//!
//! This crate provides a provider-agnostic abstraction over text-generation
//! backends. The answer synthesizer, follow-up generator, document analyzer
//! and connection monitor all speak to backends through the [`Generator`]
//! trait; the concrete variant is chosen once, at construction time.
//!
//! # Providers
//! - **Ollama**: local in-process LLM runtime (default)
//! - **OpenAI**: remote HTTP-backed chat-completion endpoint
//!
//! # Example
//! ```no_run
//! use knowhow_llm::{create_generator, GenerationRequest, Generator, GeneratorConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let generator = create_generator(&GeneratorConfig::local("llama3.2"))?;
//! let request = GenerationRequest::new("Hello, world!");
//! let response = generator.generate(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod status;

// Re-export main types
pub use client::{GenerationRequest, GenerationResponse, Generator};
pub use factory::{create_generator, GeneratorConfig, ProviderKind};
pub use status::{ConnectionState, ConnectionStatus};
