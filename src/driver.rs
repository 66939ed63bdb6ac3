//! Per-file pipeline: parse, analyze, write the listing, and on a clean
//! analysis emit the graph bundle. Each file gets fresh analyzer and builder
//! instances; nothing is shared between files.

use crate::analyzer::Analyzer;
use crate::errors::{IplResult, ParseError};
use crate::graphs::{cfg, dot, render, sdg};
use crate::listing;
use crate::parser::parse_unit;
use crate::utils::Config;
use console::style;
use std::fs::{self, OpenOptions};
use std::io::Write as _;
use std::path::Path;

const ERR_LOG: &str = "err.log";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    Clean,
    SemanticErrors,
    ParseFailed,
}

impl FileStatus {
    pub fn code(self) -> u8 {
        match self {
            FileStatus::Clean => 0,
            FileStatus::SemanticErrors => 2,
            FileStatus::ParseFailed => 3,
        }
    }
}

pub fn process_file(path: &Path, config: &Config) -> IplResult<FileStatus> {
    tracing::debug!("processing {}", path.display());
    let source = fs::read_to_string(path)?;
    let base = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "input".to_owned());
    let out_dir = Path::new(&config.output.out_dir);
    fs::create_dir_all(out_dir)?;

    let unit = match parse_unit(&source) {
        Ok(unit) => unit,
        Err(err) => {
            append_parse_failure(Path::new(ERR_LOG), path, &err)?;
            if !config.output.quiet {
                eprintln!("==> '{}' {}!", path.display(), style("failed").red().bold());
            }
            return Ok(FileStatus::ParseFailed);
        }
    };

    let mut analyzer = Analyzer::new();
    analyzer.analyze(&unit);
    let has_errors = analyzer.has_errors();
    let html = analyzer.into_html();

    let listing_path = out_dir.join(format!("output_{base}.html"));

    if has_errors {
        fs::write(&listing_path, &html)?;
        if !config.output.quiet {
            eprintln!(
                "==> '{}' {}...\nhowever, there were {} detected!\n{} graph generation...",
                path.display(),
                style("passed").green().bold(),
                style("errors").red().bold(),
                style("skipping").cyan().bold()
            );
        }
        return Ok(FileStatus::SemanticErrors);
    }

    let cfgs = cfg::build(&unit);
    let sdgs = sdg::build(&unit);

    for (func, graph) in &cfgs {
        let gv = out_dir.join(format!("cfgraph_{base}_{func}.gv"));
        fs::write(&gv, dot::to_dot(graph, None))?;
        if config.graphviz.render_png {
            let png = out_dir.join(format!("cfgraph_{base}_{func}.png"));
            render::render_png(&config.graphviz.dot_program, &gv, &png);
        }
    }
    for (func, graph) in &sdgs {
        let gv = out_dir.join(format!("sdgraph_{base}_{func}.gv"));
        fs::write(&gv, dot::to_dot(graph, Some("LR")))?;
        if config.graphviz.render_png {
            let png = out_dir.join(format!("sdgraph_{base}_{func}.png"));
            render::render_png(&config.graphviz.dot_program, &gv, &png);
        }
    }

    let names: Vec<String> = cfgs.keys().cloned().collect();
    for func in &names {
        let page = out_dir.join(format!("graphs_{base}_{func}.html"));
        fs::write(&page, render::graph_page(&base, func))?;
    }

    let linked = listing::link_function_headers(&html, &base, &names);
    fs::write(&listing_path, linked)?;

    if !config.output.quiet {
        eprintln!("==> '{}' {}!", path.display(), style("passed").green().bold());
    }
    Ok(FileStatus::Clean)
}

fn append_parse_failure(log_path: &Path, src_path: &Path, err: &ParseError) -> IplResult<()> {
    let mut log = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)?;
    writeln!(log, "{} failed: {err}", src_path.display())?;
    Ok(())
}

// -------------------------------------------------------------------------

#[cfg(test)]
fn quiet_config(out_dir: &Path) -> Config {
    let mut config = Config::default();
    config.output.out_dir = out_dir.to_string_lossy().into_owned();
    config.output.quiet = true;
    config.graphviz.render_png = false;
    config
}

#[test]
fn clean_file_writes_listing_and_graph_bundle() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("demo.ipl");
    fs::write(
        &src,
        "fn h(){ let a: array<int, 3> = {1,2,3}; a[0] = 9; }\n",
    )
    .unwrap();
    let out = dir.path().join("out");
    let config = quiet_config(&out);

    let status = process_file(&src, &config).unwrap();
    assert_eq!(status, FileStatus::Clean);

    assert!(out.join("output_demo.html").is_file());
    assert!(out.join("cfgraph_demo_h.gv").is_file());
    assert!(out.join("sdgraph_demo_h.gv").is_file());
    assert!(out.join("graphs_demo_h.html").is_file());

    let html = fs::read_to_string(out.join("output_demo.html")).unwrap();
    assert!(html.contains("fn <a href=\"graphs_demo_h.html\">h</a>("));
}

#[test]
fn semantic_errors_skip_graph_generation() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("bad.ipl");
    fs::write(&src, "fn g() -> int { return 1.0; }\n").unwrap();
    let out = dir.path().join("out");
    let config = quiet_config(&out);

    let status = process_file(&src, &config).unwrap();
    assert_eq!(status, FileStatus::SemanticErrors);

    let html = fs::read_to_string(out.join("output_bad.html")).unwrap();
    assert!(html.contains("Mismatched types in return statement"));
    // no hyperlinked header and no graphs for an erroneous file
    assert!(!html.contains("<a href="));
    assert!(!out.join("cfgraph_bad_g.gv").exists());
}

#[test]
fn parse_failure_reports_status_three() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("broken.ipl");
    fs::write(&src, "fn f( {\n").unwrap();
    let out = dir.path().join("out");
    let config = quiet_config(&out);

    let status = process_file(&src, &config).unwrap();
    assert_eq!(status, FileStatus::ParseFailed);
    assert!(!out.join("output_broken.html").exists());
}

#[test]
fn parse_failures_are_appended_to_the_log() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("err.log");
    let err = ParseError::new(3, "expected ')'");

    append_parse_failure(&log, Path::new("a.ipl"), &err).unwrap();
    append_parse_failure(&log, Path::new("b.ipl"), &err).unwrap();

    let contents = fs::read_to_string(&log).unwrap();
    assert_eq!(contents.lines().count(), 2);
    assert!(contents.contains("a.ipl failed: line 3: expected ')'"));
    assert!(contents.contains("b.ipl failed"));
}

#[test]
fn status_codes_follow_the_contract() {
    assert_eq!(FileStatus::Clean.code(), 0);
    assert_eq!(FileStatus::SemanticErrors.code(), 2);
    assert_eq!(FileStatus::ParseFailed.code(), 3);
}
