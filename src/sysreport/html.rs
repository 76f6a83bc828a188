//! HTML overview written into the system report archive.

use super::{escape_html, Section, SystemReport, STYLE_FILE};

/// Stylesheet shipped next to the overview.
pub(super) const STYLE: &str = "\
body { font-family: sans-serif; margin: 2em auto; max-width: 60em; color: #222; }
h1 { border-bottom: 2px solid #444; padding-bottom: 0.3em; }
nav ul { list-style: none; padding: 0; }
nav li { display: inline-block; margin-right: 1em; }
section { border: 1px solid #ccc; border-radius: 4px; margin: 1.5em 0; padding: 0 1em 1em; }
.failed { color: #a00; }
pre { background: #f4f4f4; padding: 0.5em; overflow-x: auto; white-space: pre-wrap; }
";

/// Render the overview: one section per completed command, failed ones listed at the end.
pub(super) fn render(report: &SystemReport) -> String {
    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    out.push_str("<title>System report</title>\n");
    out.push_str(&format!("<link rel=\"stylesheet\" href=\"{}\">\n", STYLE_FILE));
    out.push_str("</head>\n<body>\n<h1>System report</h1>\n");

    out.push_str("<nav>\n<ul>\n");
    for section in report.sections() {
        let name = escape_html(&section.name);
        out.push_str(&format!("<li><a href=\"#{}\">{}</a></li>\n", name, name));
    }
    out.push_str("</ul>\n</nav>\n");

    for section in report.sections() {
        render_section(&mut out, section);
    }

    let failed: Vec<&str> = report
        .entries
        .iter()
        .filter(|e| e.section.is_none())
        .map(|e| e.name.as_str())
        .collect();
    if !failed.is_empty() {
        out.push_str("<h2 class=\"failed\">Failed commands</h2>\n<ul class=\"failed\">\n");
        for name in failed {
            out.push_str(&format!("<li>{}</li>\n", escape_html(name)));
        }
        out.push_str("</ul>\n");
    }

    out.push_str("</body>\n</html>\n");
    out
}

fn render_section(out: &mut String, section: &Section) {
    let name = escape_html(&section.name);
    let file = escape_html(&section.output_file);
    out.push_str(&format!("<section id=\"{}\">\n<h2>{}</h2>\n", name, name));
    out.push_str(&format!("<p>Full output: <a href=\"{}\">{}</a></p>\n", file, file));
    for summary in &section.summaries {
        out.push_str(&format!(
            "<h3>{}</h3>\n<pre>{}</pre>\n",
            escape_html(&summary.title),
            escape_html(&summary.content)
        ));
    }
    out.push_str("</section>\n");
}
