use crate::batch::{Descriptor, OperationBatch};
use crate::catalog::{self, Ctx, Outcome};
use crate::config::{BatchOptions, EngineConfig};
use crate::env::{Environment, MemoryEnvironment};
use crate::error::{Diagnostic, OperationError, PerformError, Severity, panic_message};
use crate::events::EventBus;
use crate::hooks::HookRegistry;
use crate::kind::OperationKind;
use crate::resolve::{describe_node, resolve};
use html::{Document, NodeId};
use morph::{KeyedMorph, MergeEngine};
use serde_json::Value;
use std::panic::{AssertUnwindSafe, catch_unwind};

/// What one driver pass did. Entries that failed are listed in `diagnostics`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchReport {
    /// Operation instances whose effect ran.
    pub applied: usize,
    /// Operation instances stopped by a before-event listener.
    pub canceled: usize,
    /// Entries dropped because nothing matched and warnings were off.
    pub skipped: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl BatchReport {
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    fn record(&mut self, kind: &str, selector: Option<&str>, result: Result<Outcome, OperationError>) {
        match result {
            Ok(Outcome::Applied) => self.applied += 1,
            Ok(Outcome::Canceled) => self.canceled += 1,
            Err(OperationError::MissingElement) => {
                log::warn!(
                    target: "ops.driver",
                    "{kind} failed due to missing DOM element for selector {:?}",
                    selector.unwrap_or_default()
                );
                self.push(kind, selector, Severity::Resolution, OperationError::MissingElement);
            }
            Err(err) => {
                log::error!(target: "ops.driver", "error in {kind}: {err}");
                self.push(kind, selector, Severity::Execution, err);
            }
        }
    }

    fn push(&mut self, kind: &str, selector: Option<&str>, severity: Severity, err: OperationError) {
        self.diagnostics.push(Diagnostic {
            kind: kind.to_string(),
            selector: selector.map(str::to_string),
            severity,
            message: err.to_string(),
        });
    }
}

/// Applies operation batches to a document.
///
/// The engine owns the document together with everything handlers touch:
/// listeners, merge hooks, the environment and the merge algorithm.
pub struct Engine<E = MemoryEnvironment> {
    document: Document,
    events: EventBus,
    hooks: HookRegistry,
    environment: E,
    merge: Box<dyn MergeEngine>,
    config: EngineConfig,
}

impl Engine<MemoryEnvironment> {
    pub fn in_memory(document: Document) -> Self {
        Self::new(document, MemoryEnvironment::new())
    }
}

impl<E: Environment> Engine<E> {
    pub fn new(document: Document, environment: E) -> Self {
        Self {
            document,
            events: EventBus::new(),
            hooks: HookRegistry::new(),
            environment,
            merge: Box::new(KeyedMorph),
            config: EngineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_hooks(mut self, hooks: HookRegistry) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_merge_engine(mut self, merge: impl MergeEngine + 'static) -> Self {
        self.merge = Box::new(merge);
        self
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    pub fn events(&mut self) -> &mut EventBus {
        &mut self.events
    }

    pub fn hooks(&mut self) -> &mut HookRegistry {
        &mut self.hooks
    }

    pub fn environment(&self) -> &E {
        &self.environment
    }

    pub fn environment_mut(&mut self) -> &mut E {
        &mut self.environment
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Batch options derived from the engine config.
    pub fn default_options(&self) -> BatchOptions {
        BatchOptions::from(&self.config)
    }

    /// Applies every entry in order: kinds as they appear, entries within a
    /// kind by index. A failing entry, including one whose listener or merge
    /// hook panics, is reported and the pass moves on.
    ///
    /// Nodes left detached by the pass are freed before it returns, together
    /// with any listeners registered on them.
    pub fn perform(&mut self, batch: &OperationBatch, options: BatchOptions) -> BatchReport {
        let mut report = BatchReport::default();
        for group in batch.groups() {
            for entry in &group.entries {
                self.perform_entry(&group.name, group.kind, entry, options, &mut report);
            }
        }
        let freed = self.document.collect_garbage();
        let document = &self.document;
        let dropped = self.events.retain_nodes(|node| document.contains(node));
        log::debug!(
            target: "ops.driver",
            "batch done: applied={} canceled={} skipped={} diagnostics={} freed={freed} listeners_dropped={dropped}",
            report.applied,
            report.canceled,
            report.skipped,
            report.diagnostics.len()
        );
        report
    }

    /// [`Engine::perform`] as a future. Resolves with the report, or with
    /// [`PerformError`] if a panic unwinds past per-entry isolation.
    pub async fn perform_async(
        &mut self,
        batch: &OperationBatch,
        options: BatchOptions,
    ) -> Result<BatchReport, PerformError> {
        catch_unwind(AssertUnwindSafe(|| self.perform(batch, options))).map_err(PerformError::from_panic)
    }

    fn perform_entry(
        &mut self,
        name: &str,
        kind: Option<OperationKind>,
        entry: &Value,
        options: BatchOptions,
        report: &mut BatchReport,
    ) {
        let selector = entry.get("selector").and_then(Value::as_str);
        let Some(kind) = kind else {
            report.record(name, selector, Err(OperationError::UnknownOperation(name.to_string())));
            return;
        };
        let descriptor: Descriptor = match serde_json::from_value(entry.clone()) {
            Ok(d) => d,
            Err(err) => {
                report.record(name, selector, Err(OperationError::InvalidDescriptor(err.to_string())));
                return;
            }
        };

        let targets = resolve(&self.document, &descriptor);
        if targets.is_empty() {
            if !options.emit_missing_element_warnings {
                log::trace!(target: "ops.driver", "{kind}: nothing matched {selector:?}, skipped");
                report.skipped += 1;
                return;
            }
            // Global kinds still run, against the document, but the miss is
            // reported all the same.
            if kind.is_global() {
                report.record(name, selector, Err(OperationError::MissingElement));
            }
            let result = self.run_instance(kind, descriptor, None);
            report.record(name, selector, result);
            return;
        }
        for target in targets {
            log::trace!(
                target: "ops.driver",
                "{kind} on {}",
                describe_node(&self.document, target)
            );
            let result = self.run_instance(kind, descriptor.clone(), Some(target));
            report.record(name, selector, result);
        }
    }

    // Listeners and merge hooks can only fail by panicking; the unwind stops
    // here so the remaining entries still run.
    fn run_instance(
        &mut self,
        kind: OperationKind,
        mut descriptor: Descriptor,
        element: Option<NodeId>,
    ) -> Result<Outcome, OperationError> {
        let mut ctx = Ctx {
            doc: &mut self.document,
            events: &mut self.events,
            hooks: &mut self.hooks,
            env: &mut self.environment,
            merge: self.merge.as_ref(),
            config: &self.config,
        };
        catch_unwind(AssertUnwindSafe(|| {
            catalog::execute(&mut ctx, kind, &mut descriptor, element)
        }))
        .unwrap_or_else(|payload| Err(OperationError::Panicked(panic_message(payload))))
    }
}
