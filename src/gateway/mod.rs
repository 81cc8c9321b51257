//! The command execution safety gateway.
//!
//! [`CommandGateway`] ties the stages together: heredoc segmentation →
//! danger detection → `rm` containment → execution → result shaping. Every
//! blocked verdict resolves entirely inside this module and never invokes the
//! process runner — that is the load-bearing security property.
//!
//! The gateway is stateless per call: requests are validated against a
//! freshly-resolved workspace view, and the only shared structure is the
//! append-only audit trail.

mod types;

use std::path::PathBuf;
use std::sync::Arc;

use uuid::Uuid;

use crate::command_safety::{
    classify_command, evaluate_command, AuditEntry, SafetyAuditLogger,
};
use crate::config::GatewayConfig;
use crate::error::BlockedReason;
use crate::exec::{
    shape_outcome, BackgroundTaskSupervisor, ProcessRunner, TokioBackgroundSupervisor,
    TokioProcessRunner,
};
use crate::workspace::{
    check_rm_containment, sanitize_working_dir, FilesystemResolver, GitWorkTreeProbe, GlobSearch,
    GlobWalker, OsFilesystemResolver, RepositoryCheck, StaticWorkspaceResolver, WorkspaceContext,
    WorkspaceRootResolver,
};

pub use types::{CheckedCommand, CommandOutcome, CommandRequest, ExecutionMode};

/// Mediates every shell command an agent issues.
pub struct CommandGateway {
    config: GatewayConfig,
    runner: Arc<dyn ProcessRunner>,
    search: Arc<dyn GlobSearch>,
    roots: Arc<dyn WorkspaceRootResolver>,
    repository: Arc<dyn RepositoryCheck>,
    supervisor: Arc<dyn BackgroundTaskSupervisor>,
    resolver: Arc<dyn FilesystemResolver>,
    audit: SafetyAuditLogger,
}

impl CommandGateway {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: GatewayConfig,
        runner: Arc<dyn ProcessRunner>,
        search: Arc<dyn GlobSearch>,
        roots: Arc<dyn WorkspaceRootResolver>,
        repository: Arc<dyn RepositoryCheck>,
        supervisor: Arc<dyn BackgroundTaskSupervisor>,
        resolver: Arc<dyn FilesystemResolver>,
    ) -> Self {
        let audit = SafetyAuditLogger::new(config.audit_enabled);
        Self {
            config,
            runner,
            search,
            roots,
            repository,
            supervisor,
            resolver,
            audit,
        }
    }

    /// Production wiring: OS canonicalization, `glob` expansion, a real git
    /// probe, and a fixed workspace root for every task.
    pub fn with_os_defaults(workspace_root: Option<PathBuf>) -> Self {
        Self::new(
            GatewayConfig::default(),
            Arc::new(TokioProcessRunner),
            Arc::new(GlobWalker),
            Arc::new(StaticWorkspaceResolver::new(workspace_root)),
            Arc::new(GitWorkTreeProbe),
            Arc::new(TokioBackgroundSupervisor::new()),
            Arc::new(OsFilesystemResolver),
        )
    }

    /// The recorded allow/block decisions.
    pub fn audit(&self) -> &SafetyAuditLogger {
        &self.audit
    }

    /// Validates and runs a command, blocking until it finishes or times
    /// out. Background-mode requests delegate to
    /// [`CommandGateway::execute_in_background`].
    pub async fn execute(&self, request: CommandRequest) -> CommandOutcome {
        if request.mode == ExecutionMode::Background {
            return self.execute_in_background(request).await;
        }

        let checked = CheckedCommand::parse(&request.command);
        let strategy = classify_command(&request.command);

        let workspace = match self.validate(&checked, &request).await {
            Ok(workspace) => workspace,
            Err(reason) => return self.block(&request, reason).await,
        };

        let cwd = match self.working_dir(&workspace, &request).await {
            Ok(cwd) => cwd,
            Err(reason) => return self.block(&request, reason).await,
        };

        let timeout_ms = request.max_timeout_ms.unwrap_or(self.config.max_timeout_ms);
        let idle_timeout_ms = request
            .idle_timeout_ms
            .unwrap_or(self.config.idle_timeout_ms);

        // The runner gets the ORIGINAL command text; the heredoc-filtered
        // form exists only for checking.
        match self
            .runner
            .run(&checked.raw, cwd.as_deref(), timeout_ms, idle_timeout_ms)
            .await
        {
            Ok(raw) => {
                self.record(&request, true, "executed", format!("exit {}", raw.exit_code))
                    .await;
                shape_outcome(&raw, strategy)
            }
            Err(err) => {
                let message = format!("Failed to execute command: {err:#}");
                self.record(&request, true, "runner-error", message.clone())
                    .await;
                CommandOutcome::execution_error(message)
            }
        }
    }

    /// Same validation prefix as [`CommandGateway::execute`], then hands the
    /// command to the background supervisor and returns its handle
    /// immediately; the pid is unknown until the caller polls.
    pub async fn execute_in_background(&self, request: CommandRequest) -> CommandOutcome {
        let checked = CheckedCommand::parse(&request.command);

        let workspace = match self.validate(&checked, &request).await {
            Ok(workspace) => workspace,
            Err(reason) => return self.block(&request, reason).await,
        };

        let cwd = match self.working_dir(&workspace, &request).await {
            Ok(cwd) => cwd,
            Err(reason) => return self.block(&request, reason).await,
        };

        let tool_id = if request.tool_id.trim().is_empty() {
            Uuid::new_v4().to_string()
        } else {
            request.tool_id.clone()
        };

        match self
            .supervisor
            .spawn(
                &checked.raw,
                &request.task_id,
                &tool_id,
                cwd.as_deref(),
                request.max_timeout_ms,
            )
            .await
        {
            Ok(handle) => {
                self.record(&request, true, "background", format!("task {handle}"))
                    .await;
                CommandOutcome {
                    success: true,
                    message: format!("Command started in background (task {handle})"),
                    output: None,
                    error: None,
                    exit_code: None,
                    timed_out: false,
                    idle_timed_out: false,
                    pid: None,
                    background_task_id: Some(handle),
                }
            }
            Err(err) => {
                let message = format!("Failed to start background command: {err:#}");
                self.record(&request, true, "supervisor-error", message.clone())
                    .await;
                CommandOutcome::execution_error(message)
            }
        }
    }

    /// The shared validation prefix: danger detection on the heredoc-filtered
    /// text, then `rm` containment against a freshly-resolved workspace.
    async fn validate(
        &self,
        checked: &CheckedCommand,
        request: &CommandRequest,
    ) -> Result<WorkspaceContext, BlockedReason> {
        let verdict = evaluate_command(&checked.checked);
        if verdict.dangerous {
            let reason = verdict
                .reason
                .unwrap_or_else(|| "matches a dangerous pattern".to_string());
            return Err(BlockedReason::Dangerous { reason });
        }

        let workspace = WorkspaceContext::resolve(self.roots.as_ref(), &request.task_id).await;
        check_rm_containment(
            &checked.segments,
            workspace.root.as_deref(),
            self.repository.as_ref(),
            self.search.as_ref(),
            self.resolver.as_ref(),
            self.config.max_glob_matches,
        )
        .await?;

        Ok(workspace)
    }

    async fn working_dir(
        &self,
        workspace: &WorkspaceContext,
        request: &CommandRequest,
    ) -> Result<Option<PathBuf>, BlockedReason> {
        match &workspace.root {
            Some(root) => {
                let dir = sanitize_working_dir(
                    self.resolver.as_ref(),
                    root,
                    request.working_dir.as_deref(),
                )
                .await?;
                Ok(Some(dir))
            }
            None => Ok(None),
        }
    }

    async fn block(&self, request: &CommandRequest, reason: BlockedReason) -> CommandOutcome {
        tracing::debug!(
            command = %request.command,
            task_id = %request.task_id,
            reason = %reason,
            "command blocked"
        );
        self.record(request, false, "validation", reason.to_string())
            .await;
        CommandOutcome::blocked(&reason)
    }

    async fn record(&self, request: &CommandRequest, allowed: bool, stage: &str, reason: String) {
        self.audit
            .log(AuditEntry::new(
                request.command.clone(),
                request.task_id.clone(),
                allowed,
                stage.to_string(),
                reason,
            ))
            .await;
    }
}
