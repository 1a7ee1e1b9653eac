//! Build-tool integration helpers
//!
//! Bundler shims expose the pipeline output under two agreed module names:
//! the component wrapper and the generated icon data. Loader-style hosts
//! instead ship a stub module whose placeholder body gets replaced.

use crate::error::IconpackResult;
use crate::pipeline::{CompileOutput, Pipeline};
use tracing::warn;

/// Module name of the component wrapper
pub const COMPONENT_MODULE: &str = "react-iconpack";

/// Module name of the generated icon data
pub const ICONS_MODULE: &str = "react-iconpack-icons";

/// Placeholder body of the icon data stub shipped with the component
pub const STUB_PLACEHOLDER: &str = "module.exports = {react_iconpack_icons: {}};";

/// A module injected into the host build's module graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualModule {
    pub id: String,
    pub source: String,
}

/// Recognise an import of one of the agreed module names
///
/// Returns the canonical id for hosts that resolve imports through a hook.
pub fn resolve_id(specifier: &str) -> Option<&'static str> {
    match specifier {
        COMPONENT_MODULE => Some(COMPONENT_MODULE),
        ICONS_MODULE => Some(ICONS_MODULE),
        _ => None,
    }
}

/// Wrap generated source as the icon data module
pub fn icons_module(source: impl Into<String>) -> VirtualModule {
    VirtualModule {
        id: ICONS_MODULE.to_string(),
        source: source.into(),
    }
}

/// Replace the placeholder body of `stub` with `generated`
///
/// A stub without the placeholder is returned unchanged.
pub fn splice_stub(stub: &str, generated: &str) -> String {
    if !stub.contains(STUB_PLACEHOLDER) {
        warn!(
            "Icon data stub has no placeholder; leaving it unchanged ({})",
            ICONS_MODULE
        );
        return stub.to_string();
    }
    stub.replacen(STUB_PLACEHOLDER, generated.trim_end(), 1)
}

/// Compile `pipeline` and package the result for the host build
pub async fn compile_icons_module(
    pipeline: &Pipeline,
) -> IconpackResult<(VirtualModule, CompileOutput)> {
    let output = pipeline.compile().await?;
    Ok((icons_module(output.source.clone()), output))
}
