//! Provisioning step abstraction
//!
//! Every resource kind goes through the same pipeline:
//!
//! ```text
//! plan ──► invoke tool (optional) ──► confirm ──► publish
//! ```
//!
//! A step only supplies the per-kind policy: what to ask the control plane
//! before invoking, which arguments to pass, and how to read back the
//! canonical record. The driver owns invocation, cancellation, error
//! annotation and publishing.

use crate::control_plane::{ControlPlane, ControlPlaneError};
use crate::env_store::EnvStore;
use crate::error::{ProvisionError, Result};
use crate::kind::ResourceKind;
use crate::publish::publish;
use crate::scope::Scope;
use crate::tool::{ToolBridge, ToolOutput, ToolProgram};
use async_trait::async_trait;
use std::future::Future;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// A tool invocation decided by a step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: ToolProgram,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new(program: ToolProgram, args: Vec<String>) -> Self {
        Self { program, args }
    }
}

/// Outcome of planning: the step's decision and the invocation, if any
#[derive(Debug, Clone)]
pub struct Planned<D> {
    pub decision: D,
    pub invocation: Option<Invocation>,
}

impl<D> Planned<D> {
    pub fn invoke(decision: D, invocation: Invocation) -> Self {
        Self {
            decision,
            invocation: Some(invocation),
        }
    }

    pub fn skip(decision: D) -> Self {
        Self {
            decision,
            invocation: None,
        }
    }
}

/// Collaborators available to a running step
pub struct StepContext<'a> {
    pub scope: &'a Scope,
    pub control_plane: &'a dyn ControlPlane,
    pub tools: &'a dyn ToolBridge,
    pub env: &'a dyn EnvStore,
    pub cancel: &'a CancellationToken,
}

impl StepContext<'_> {
    /// Await `fut` unless the context is cancelled first.
    ///
    /// On cancellation the future is dropped, which aborts the in-flight call.
    pub async fn cancellable<T, F>(&self, kind: ResourceKind, name: &str, fut: F) -> Result<T>
    where
        F: Future<Output = T> + Send,
    {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ProvisionError::Cancelled {
                kind,
                name: name.to_string(),
            }),
            value = fut => Ok(value),
        }
    }

    /// Control-plane read annotated with the step's kind and name
    pub async fn read<T, F>(&self, kind: ResourceKind, name: &str, fut: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, ControlPlaneError>> + Send,
    {
        self.cancellable(kind, name, fut)
            .await?
            .map_err(|source| ProvisionError::ControlPlane {
                kind,
                name: name.to_string(),
                source,
            })
    }

    /// Run a tool invocation; any failure is fatal
    pub async fn invoke(
        &self,
        kind: ResourceKind,
        name: &str,
        invocation: &Invocation,
    ) -> Result<ToolOutput> {
        self.cancellable(
            kind,
            name,
            self.tools.run(invocation.program, &invocation.args),
        )
        .await?
        .map_err(|source| ProvisionError::ToolInvocation {
            kind,
            name: name.to_string(),
            source,
        })
    }
}

/// Per-kind provisioning policy
#[async_trait]
pub trait ProvisionStep: Send + Sync {
    /// Whatever `plan` learned that `confirm` needs (e.g. the version created)
    type Decision: Send;

    /// Canonical record returned to the caller
    type Output: Send;

    fn kind(&self) -> ResourceKind;

    /// Resolved resource name, used for logging and error context
    fn name(&self) -> &str;

    /// Consult the control plane or a probe and decide what to invoke
    async fn plan(&self, cx: &StepContext<'_>) -> Result<Planned<Self::Decision>>;

    /// Produce the canonical record after the invocation (if any) completed
    async fn confirm(
        &self,
        cx: &StepContext<'_>,
        decision: Self::Decision,
        output: Option<ToolOutput>,
    ) -> Result<Self::Output>;

    /// Identifiers to publish once the record is confirmed
    fn published(&self) -> Vec<(&'static str, String)>;
}

/// Drive a step through plan → invoke → confirm → publish
pub async fn execute<S>(step: &S, cx: &StepContext<'_>) -> Result<S::Output>
where
    S: ProvisionStep,
{
    let kind = step.kind();
    let name = step.name();
    let span = tracing::info_span!("provision", kind = %kind, name = %name, scope = %cx.scope);

    async move {
        let planned = step.plan(cx).await?;

        let output = match planned.invocation {
            Some(invocation) => {
                tracing::debug!(
                    "Running: {} {}",
                    invocation.program,
                    invocation.args.join(" ")
                );
                Some(cx.invoke(kind, name, &invocation).await?)
            }
            None => {
                tracing::info!("{} '{}' already exists, skipping tool invocation", kind, name);
                None
            }
        };

        let record = step.confirm(cx, planned.decision, output).await?;

        publish(cx.env, &step.published())?;
        tracing::info!("{} '{}' provisioned", kind, name);

        Ok(record)
    }
    .instrument(span)
    .await
}
