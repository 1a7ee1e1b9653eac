//! Generated module source
//!
//! Serializes completed icon records into a CommonJS module. Output is a
//! pure function of the ordered records and the mode, so identical inputs
//! always produce identical bytes.
//!
//! Vector mode:
//!
//! ```text
//! module.exports = {
//!     mode: "vector",
//!     icons: {
//!         "ui/close": {
//!             props: {viewBox: "0 0 24 24"},
//!             data: "<path d=\"...\"/>"
//!         }
//!     }
//! };
//! ```
//!
//! Raster mode maps each key to its base64 PNG string instead.

use crate::config::Mode;
use crate::error::{IconpackError, IconpackResult};
use crate::registry::ResourceRecord;
use crate::transform::TransformResult;
use std::fmt::Write;

/// First line of every generated module
pub const HEADER: &str = "// Generated by iconpack. Do not edit.";

const INDENT: &str = "    ";

/// Render `records` (already in output order) as module source
pub fn emit(records: &[&ResourceRecord], mode: Mode) -> IconpackResult<String> {
    let mut out = String::new();
    write_module(&mut out, records, mode).map_err(|e| IconpackError::Generation(e.to_string()))?;
    Ok(out)
}

/// Failure while rendering
#[derive(Debug)]
struct EmitError(String);

impl std::fmt::Display for EmitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<std::fmt::Error> for EmitError {
    fn from(_: std::fmt::Error) -> Self {
        Self("formatter error".to_string())
    }
}

fn write_module(out: &mut String, records: &[&ResourceRecord], mode: Mode) -> Result<(), EmitError> {
    writeln!(out, "{}", HEADER)?;
    writeln!(out, "module.exports = {{")?;
    writeln!(out, "{}mode: {},", INDENT, js_string(&mode.to_string())?)?;

    if records.is_empty() {
        writeln!(out, "{}icons: {{}}", INDENT)?;
        writeln!(out, "}};")?;
        return Ok(());
    }

    writeln!(out, "{}icons: {{", INDENT)?;
    for (i, record) in records.iter().enumerate() {
        let separator = if i + 1 < records.len() { "," } else { "" };
        let key = js_string(&record.key)?;
        let result = record
            .transformed
            .as_ref()
            .ok_or_else(|| EmitError(format!("icon '{}' has no transform result", record.key)))?;

        match (mode, result) {
            (Mode::Vector, TransformResult::Vector { markup, view_box }) => {
                let view_box = match view_box {
                    Some(v) => js_string(v)?,
                    None => "null".to_string(),
                };
                writeln!(out, "{0}{0}{1}: {{", INDENT, key)?;
                writeln!(out, "{0}{0}{0}props: {{viewBox: {1}}},", INDENT, view_box)?;
                writeln!(out, "{0}{0}{0}data: {1}", INDENT, js_string(markup)?)?;
                writeln!(out, "{0}{0}}}{1}", INDENT, separator)?;
            }
            (Mode::Raster, TransformResult::Raster { base64 }) => {
                writeln!(out, "{0}{0}{1}: {2}{3}", INDENT, key, js_string(base64)?, separator)?;
            }
            (mode, result) => {
                return Err(EmitError(format!(
                    "icon '{}' holds a {} result in {} mode",
                    record.key,
                    result.mode(),
                    mode
                )));
            }
        }
    }
    writeln!(out, "{}}}", INDENT)?;
    writeln!(out, "}};")?;
    Ok(())
}

/// Quote `value` as a JavaScript string literal
///
/// JSON string syntax is valid JavaScript except for raw U+2028/U+2029,
/// which older engines treat as line terminators; those are escaped too.
/// `</` is split so the module can also be inlined in a `<script>` tag.
fn js_string(value: &str) -> Result<String, EmitError> {
    let quoted = serde_json::to_string(value).map_err(|e| EmitError(e.to_string()))?;
    Ok(quoted
        .replace('\u{2028}', "\\u2028")
        .replace('\u{2029}', "\\u2029")
        .replace("</", "<\\/"))
}
