//! The annotated program listing. Code lines accumulate into an HTML
//! document; a staged error message wraps the next flushed line in a
//! hoverable `.error` span. Only one message can be pending at a time and
//! the first one staged wins.

const PREAMBLE: &str = r#"<!DOCTYPE html>
<html>
  <style>
    .error {
      position: relative;
      display: inline-block;
      border-bottom: 1px dotted black;
      color: red;
    }
    .code {
      position: relative;
      display: inline-block;
    }
    .error .errortext {
      visibility: hidden;
      width: 700px;
      background-color: #555;
      color: #fff;
      text-align: center;
      border-radius: 6px;
      padding: 5px 0;
      position: absolute;
      z-index: 1;
      bottom: 125%;
      left: 50%;
      margin-left: -40px;
      opacity: 0;
      transition: opacity 0.3s;
    }
    .error .errortext::after {
      content: "";
      position: absolute;
      top: 100%;
      left: 20%;
      margin-left: -5px;
      border-width: 5px;
      border-style: solid;
      border-color: #555 transparent transparent transparent;
    }
    .error:hover .errortext {
      visibility: visible;
      opacity: 1;
    }
  </style>
  <head>
    <meta charset="utf-8" />
    <title>Code Analysis</title>
    <link rel="stylesheet" href="https://www.w3schools.com/w3css/4/w3.css" />
  </head>

  <body>
    <h2>Code Analysis</h2>
    <div class="w3-code"><pre>
"#;

const POSTAMBLE: &str = "</pre></div></body></html>";

const INDENT_WIDTH: usize = 4;

pub fn escape(code: &str) -> String {
    code.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[derive(Debug)]
pub struct Listing {
    buf: String,
    indent: String,
    pending: Option<&'static str>,
    has_errors: bool,
}

impl Listing {
    pub fn new() -> Self {
        Self {
            buf: PREAMBLE.to_owned(),
            indent: String::new(),
            pending: None,
            has_errors: false,
        }
    }

    pub fn indent(&mut self) {
        self.indent.push_str(&" ".repeat(INDENT_WIDTH));
    }

    pub fn dedent(&mut self) {
        let len = self.indent.len().saturating_sub(INDENT_WIDTH);
        self.indent.truncate(len);
    }

    pub fn indent_str(&self) -> &str {
        &self.indent
    }

    /// Indentation one level shallower than the current one. The `for`
    /// header prints at the enclosing level even though its scope is
    /// already open.
    pub fn parent_indent(&self) -> &str {
        let len = self.indent.len().saturating_sub(INDENT_WIDTH);
        &self.indent[..len]
    }

    /// Stage an error for the line being built. A no-op when a message is
    /// already pending.
    pub fn stage(&mut self, msg: &'static str) {
        if self.pending.is_none() {
            self.pending = Some(msg);
            self.has_errors = true;
        }
    }

    /// Emit one finished line, wrapping it in the error markup when a
    /// message is pending. The pending slot is cleared either way.
    pub fn flush(&mut self, code: &str) {
        match self.pending.take() {
            Some(msg) => {
                self.buf.push_str("<div class=\"error\">");
                self.buf.push_str(&escape(code));
                self.buf.push_str("<span class=\"errortext\">");
                self.buf.push_str(&escape(msg));
                self.buf.push_str("</span></div>\n");
            }
            None => {
                self.buf.push_str(&escape(code));
                self.buf.push('\n');
            }
        }
    }

    /// Emit a line that can never carry an error (closers, `else`/`of`
    /// openers).
    pub fn write_line(&mut self, code: &str) {
        self.buf.push_str(&escape(code));
        self.buf.push('\n');
    }

    pub fn blank_line(&mut self) {
        self.buf.push('\n');
    }

    pub fn has_errors(&self) -> bool {
        self.has_errors
    }

    pub fn finish(mut self) -> String {
        self.buf.push_str(POSTAMBLE);
        self.buf
    }
}

impl Default for Listing {
    fn default() -> Self {
        Self::new()
    }
}

/// Rewrite `fn NAME(` headers so they link to the function's graph bundle.
/// Runs only on clean listings, after the graphs have been written.
pub fn link_function_headers(html: &str, base: &str, names: &[String]) -> String {
    let mut out = String::with_capacity(html.len());
    for line in html.split_inclusive('\n') {
        let mut rewritten = None;
        for name in names {
            let prefix = format!("fn {name}(");
            if let Some(rest) = line.strip_prefix(prefix.as_str()) {
                rewritten = Some(format!(
                    "fn <a href=\"graphs_{base}_{name}.html\">{name}</a>({rest}"
                ));
                break;
            }
        }
        match rewritten {
            Some(l) => out.push_str(&l),
            None => out.push_str(line),
        }
    }
    out
}

#[test]
fn flush_without_pending_emits_plain_line() {
    let mut l = Listing::new();
    l.flush("let x: int = 1;");
    let html = l.finish();
    assert!(html.contains("let x: int = 1;\n"));
    assert!(!html.contains("class=\"error\""));
}

#[test]
fn staged_error_wraps_the_next_line_only() {
    let mut l = Listing::new();
    l.stage("Mismatched types");
    l.flush("let x: int = 1.0;");
    l.flush("let y: int = 2;");
    let html = l.finish();
    assert!(html.contains(
        "<div class=\"error\">let x: int = 1.0;<span class=\"errortext\">Mismatched types</span></div>"
    ));
    assert!(html.contains("\nlet y: int = 2;\n"));
}

#[test]
fn first_staged_error_wins() {
    let mut l = Listing::new();
    l.stage("first");
    l.stage("second");
    l.flush("code;");
    assert!(l.has_errors());
    let html = l.finish();
    assert!(html.contains("first"));
    assert!(!html.contains("second"));
}

#[test]
fn has_errors_latches_across_clean_lines() {
    let mut l = Listing::new();
    l.stage("boom");
    l.flush("bad;");
    l.flush("good;");
    assert!(l.has_errors());
}

#[test]
fn markup_characters_are_escaped() {
    let mut l = Listing::new();
    l.flush("fn f() -> tuple<int, bool> {");
    l.flush("    let b: bool = true && false;");
    let html = l.finish();
    assert!(html.contains("fn f() -&gt; tuple&lt;int, bool&gt; {"));
    assert!(html.contains("true &amp;&amp; false"));
}

#[test]
fn function_headers_get_linked() {
    let html = "fn foo(a: int){\n}\n\nfn foobar(){\n}\n";
    let linked = link_function_headers(html, "demo", &["foo".into(), "foobar".into()]);
    assert!(linked.contains("fn <a href=\"graphs_demo_foo.html\">foo</a>(a: int){"));
    assert!(linked.contains("fn <a href=\"graphs_demo_foobar.html\">foobar</a>(){"));
}
