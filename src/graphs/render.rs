//! Rendering is delegated to graphviz as an external black box. A missing
//! `dot` binary only costs the PNGs; the `.gv` files are always written and
//! remain the source of truth.

use std::path::Path;
use std::process::Command;
use tracing::warn;

/// Run `dot -Tpng` over an already-written `.gv` file. Returns whether a PNG
/// was produced.
pub fn render_png(dot_program: &str, gv_path: &Path, png_path: &Path) -> bool {
    match Command::new(dot_program)
        .arg("-Tpng")
        .arg(gv_path)
        .arg("-o")
        .arg(png_path)
        .status()
    {
        Ok(status) if status.success() => true,
        Ok(status) => {
            warn!(
                target: "render",
                "{dot_program} exited with {status} for {}",
                gv_path.display()
            );
            false
        }
        Err(err) => {
            warn!(target: "render", "could not run {dot_program}: {err}");
            false
        }
    }
}

/// The per-function HTML shim the listing's function headers link to.
pub fn graph_page(base: &str, func: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8" />
    <title>fn {func}</title>
  </head>
  <body>
    <h2>fn {func}</h2>
    <h3>Control-flow graph</h3>
    <img src="cfgraph_{base}_{func}.png" alt="control-flow graph of {func}" />
    <h3>Structural-dependency graph</h3>
    <img src="sdgraph_{base}_{func}.png" alt="structural-dependency graph of {func}" />
  </body>
</html>
"#
    )
}

#[test]
fn graph_page_references_both_images() {
    let page = graph_page("demo", "main");
    assert!(page.contains("cfgraph_demo_main.png"));
    assert!(page.contains("sdgraph_demo_main.png"));
    assert!(page.contains("<title>fn main</title>"));
}

#[test]
fn missing_renderer_degrades_gracefully() {
    let dir = tempfile::tempdir().unwrap();
    let gv = dir.path().join("g.gv");
    std::fs::write(&gv, "digraph F {}\n").unwrap();
    let ok = render_png(
        "definitely-not-a-real-graphviz-binary",
        &gv,
        &dir.path().join("g.png"),
    );
    assert!(!ok);
}
