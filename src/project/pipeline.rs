//! End-to-end pipeline: units or IR in, identity-assigned model and XMI out.

use std::path::Path;

use rayon::prelude::*;

use super::builder::ModelBuilder;
use super::config::PipelineConfig;
use crate::hir::{Diagnostic, Severity};
use crate::interchange::ir::{self, IrModel};
use crate::interchange::{
    IdentityAssigner, InterchangeError, Model, XmiWriter, canonicalize, detect_format,
};
use crate::syntax::SourceUnit;

/// Result of one pipeline invocation.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub model: Model,
    /// UTF-8 XMI document.
    pub xmi: Vec<u8>,
    /// Sorted by code, referenced name, message, owner and context.
    pub diagnostics: Vec<Diagnostic>,
}

impl PipelineOutput {
    pub fn xmi_text(&self) -> &str {
        std::str::from_utf8(&self.xmi).unwrap_or_default()
    }

    /// Did any reference fail to resolve? Processing still completed.
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Error)
    }

    /// Write the model in the format implied by the file extension.
    pub fn write_to(&self, path: &Path) -> Result<(), InterchangeError> {
        let format = detect_format(path).ok_or_else(|| {
            InterchangeError::unsupported(format!("no format for {}", path.display()))
        })?;
        let bytes = format.write(&self.model)?;
        std::fs::write(path, bytes)?;
        tracing::debug!("[PIPELINE] wrote {} as {}", path.display(), format.name());
        Ok(())
    }
}

/// Runs build, identity assignment, canonical ordering and XMI output.
///
/// Every invocation is independent; a `Pipeline` can be shared across threads.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Identity-assigned, canonically ordered model.
    pub fn build_model(&self, units: &[SourceUnit]) -> Model {
        self.finish(ModelBuilder::new(&self.config).build(units))
    }

    pub fn run(&self, units: &[SourceUnit]) -> Result<PipelineOutput, InterchangeError> {
        self.output(self.build_model(units))
    }

    /// Build from an IR document.
    pub fn run_ir(&self, document: &IrModel) -> Result<PipelineOutput, InterchangeError> {
        let bridge = ir::to_source_units(document);
        tracing::debug!(
            "[PIPELINE] IR: {} classifiers, {} carried relations",
            bridge.units.len(),
            bridge.relations.len()
        );
        let model = ModelBuilder::new(&self.config)
            .with_carried_relations(bridge.relations)
            .build(&bridge.units);
        self.output(self.finish(model))
    }

    /// Parse and build an IR JSON document.
    pub fn run_ir_json(&self, input: &[u8]) -> Result<PipelineOutput, InterchangeError> {
        self.run_ir(&IrModel::from_json(input)?)
    }

    /// Run independent projects in parallel. Results keep input order.
    pub fn run_batch(
        &self,
        projects: &[Vec<SourceUnit>],
    ) -> Vec<Result<PipelineOutput, InterchangeError>> {
        projects.par_iter().map(|units| self.run(units)).collect()
    }

    fn finish(&self, model: Model) -> Model {
        let model = IdentityAssigner::new(self.config.identity).assign(model);
        canonicalize(model)
    }

    fn output(&self, model: Model) -> Result<PipelineOutput, InterchangeError> {
        let xmi = XmiWriter::new().write(&model)?;
        let diagnostics = model.diagnostics.clone();
        tracing::info!(
            "[PIPELINE] {}: {} elements, {} annotations, {} diagnostics ({})",
            model.name,
            model.element_count(),
            model.annotations.len(),
            diagnostics.len(),
            self.config.relationship_policy.as_str()
        );
        Ok(PipelineOutput {
            model,
            xmi,
            diagnostics,
        })
    }
}
