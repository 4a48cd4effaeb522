//! Per-file build pipeline and the hook that names loader modules.
use crate::error::Result;
use crate::module::{transform, TransformOptions};
use crate::naming::ModuleIdentifier;
use crate::swc_utils;

/// Hook invoked once per emitted chunk.
pub trait RenderHook: Send + Sync {
    /// Rewrite `code` for `module_id`, `None` when no change is needed.
    fn render_chunk(
        &self,
        code: &str,
        module_id: &ModuleIdentifier,
    ) -> Result<Option<String>>;
}

/// Hook rewriting chunks into named loader calls.
#[derive(Debug, Clone, Default)]
pub struct AmdHook {
    options: TransformOptions,
}

impl AmdHook {
    /// Create a hook using the given formatting options.
    pub fn new(options: TransformOptions) -> Self {
        Self { options }
    }
}

impl RenderHook for AmdHook {
    fn render_chunk(
        &self,
        code: &str,
        module_id: &ModuleIdentifier,
    ) -> Result<Option<String>> {
        let result = transform(code, module_id, &self.options)?;
        if result.code == code {
            Ok(None)
        } else {
            Ok(Some(result.code))
        }
    }
}

/// Produces the final text for one module.
pub trait Pipeline: Send + Sync {
    /// Build `source` for `identifier`, running `hook` before emitting.
    fn build(
        &self,
        source: &str,
        identifier: &ModuleIdentifier,
        hook: &dyn RenderHook,
    ) -> Result<String>;
}

/// Pipeline that renders through the hook and minifies with swc.
#[derive(Debug, Clone)]
pub struct SwcPipeline {
    minify: bool,
}

impl SwcPipeline {
    /// Create a pipeline, optionally skipping minification.
    pub fn new(minify: bool) -> Self {
        Self { minify }
    }
}

impl Default for SwcPipeline {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Pipeline for SwcPipeline {
    fn build(
        &self,
        source: &str,
        identifier: &ModuleIdentifier,
        hook: &dyn RenderHook,
    ) -> Result<String> {
        let code = match hook.render_chunk(source, identifier)? {
            Some(code) => code,
            None => source.to_string(),
        };
        if !self.minify {
            return Ok(code);
        }
        swc_utils::minify(&code, &identifier.to_string())
    }
}
