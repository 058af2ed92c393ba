//! Stylesheet shared by the index and mail pages.

use std::path::Path;

use super::ArchiveLayout;

/// Built-in stylesheet, used unless the configuration names another file.
pub const DEFAULT_CSS: &str = r#"body {
  font-family: -apple-system, "Segoe UI", Helvetica, Arial, sans-serif;
  margin: 2em auto;
  max-width: 60em;
  color: #222;
}
details { margin-left: 1em; }
summary { cursor: pointer; font-weight: bold; }
.bordermeta {
  border: 1px solid #888;
  border-radius: 4px;
  padding: 0.5em 1em;
  background: #f4f4f4;
}
.bordermail {
  border: 1px solid #ccc;
  border-radius: 4px;
  margin-top: 1em;
  padding: 1em;
  overflow-wrap: anywhere;
}
"#;

/// Write the stylesheet into the archive, copying `custom` when given.
pub fn write_stylesheet(layout: &ArchiveLayout, custom: Option<&Path>) -> anyhow::Result<()> {
    let dest = layout.stylesheet_path();
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)?;
    }
    match custom {
        Some(src) => {
            std::fs::copy(src, &dest)?;
        }
        None => std::fs::write(&dest, DEFAULT_CSS)?,
    }
    Ok(())
}
