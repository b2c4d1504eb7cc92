//! Byte-document (PDF) export.

use crate::compiler::DocumentCompiler;
use anyhow::{Context, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

pub const DEFAULT_EXPORT_STEM: &str = "typst-output";

static NAME_BINDING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"#let\s+name\s*=\s*"(.+?)""#).expect("static export-name pattern")
});

/// File name for an export of `source`: the first word of a `#let name = "..."`
/// binding, or `typst-output`, with a `.pdf` extension.
pub fn export_file_name(source: &str) -> String {
    let stem = NAME_BINDING
        .captures(source)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().split(' ').next())
        .map(|word| word.replace(['/', '\\'], "-"))
        .filter(|word| !word.is_empty() && word != "." && word != "..")
        .unwrap_or_else(|| DEFAULT_EXPORT_STEM.to_string());
    format!("{stem}.pdf")
}

/// Compile `source` to bytes and write them into `out_dir`.
pub async fn export_pdf<C: DocumentCompiler>(
    compiler: &C,
    source: &str,
    out_dir: &Path,
) -> Result<PathBuf> {
    let bytes = compiler
        .render_bytes(source)
        .await
        .context("Export failed")?;
    tokio::fs::create_dir_all(out_dir)
        .await
        .with_context(|| format!("creating {}", out_dir.display()))?;
    let path = out_dir.join(export_file_name(source));
    tokio::fs::write(&path, &bytes)
        .await
        .with_context(|| format!("writing {}", path.display()))?;
    tracing::info!(
        target: "pipeline.export",
        path = %path.display(),
        size_bytes = bytes.len(),
        "export_written"
    );
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_binding_first_word() {
        let src = "#let name = \"Jane Doe\"\n= CV";
        assert_eq!(export_file_name(src), "Jane.pdf");
        assert_eq!(export_file_name("#let   name=\"report\""), "report.pdf");
    }

    #[test]
    fn falls_back_without_binding() {
        assert_eq!(export_file_name("= Title"), "typst-output.pdf");
        assert_eq!(export_file_name("#let title = \"x\""), "typst-output.pdf");
        assert_eq!(export_file_name("#let name = \" lead\""), "typst-output.pdf");
    }

    #[test]
    fn separators_never_leave_the_directory() {
        assert_eq!(export_file_name("#let name = \"../x\""), "..-x.pdf");
        assert_eq!(export_file_name("#let name = \"..\""), "typst-output.pdf");
    }
}
