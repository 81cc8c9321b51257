//! # execgate — command execution safety gateway
//!
//! `execgate` mediates shell commands issued by an autonomous coding agent,
//! enforcing a layered sandbox policy before anything reaches the
//! operating-system shell.
//!
//! ## Highlights
//!
//! - **Heredoc-aware checking**: literal heredoc bodies are never treated as
//!   executable command text, while everything after a closing delimiter is.
//! - **Danger detection**: an exact blocklist of destructive programs plus a
//!   pattern table for dangerous command shapes, evaluated per chain segment
//!   (`&&`, `||`, `;` — never bare `|`).
//! - **Workspace containment for `rm`**: destructive filesystem operations
//!   require a workspace root inside a git repository, and every explicit or
//!   wildcard-expanded target must canonicalize (symlinks resolved) inside
//!   that root.
//! - **Bounded result shaping**: output is truncated from the tail and shaped
//!   per a command classification strategy so build logs stay out of the
//!   agent's context on success.
//! - **Injected collaborators**: process running, glob expansion, workspace
//!   resolution, repository probing, and canonicalization are all traits, so
//!   the validation logic stays pure and fake-testable.
//!
//! ## Architecture
//!
//! - `command_safety/`: heredoc segmentation, danger rules, output
//!   classification, and the safety audit trail.
//! - `workspace/`: path containment, wildcard expansion, and the `rm` guard.
//! - `exec/`: the process-runner boundary, background supervision, and
//!   outcome formatting.
//! - `gateway/`: the [`CommandGateway`] orchestrator tying the stages
//!   together.
//!
//! ## Quickstart
//!
//! ```rust,ignore
//! use execgate::{CommandGateway, CommandRequest};
//!
//! #[tokio::main]
//! async fn main() {
//!     let gateway = CommandGateway::with_os_defaults(Some("/path/to/workspace".into()));
//!     let outcome = gateway
//!         .execute(CommandRequest::new("git status", "task-1", "tool-1"))
//!         .await;
//!     println!("{}", outcome.message);
//! }
//! ```

pub mod command_safety;
pub mod config;
pub mod error;
pub mod exec;
pub mod gateway;
pub mod workspace;

pub use command_safety::classifier::OutputStrategy;
pub use config::GatewayConfig;
pub use error::BlockedReason;
pub use gateway::{CheckedCommand, CommandGateway, CommandOutcome, CommandRequest, ExecutionMode};
