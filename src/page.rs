//! Self-contained HTML rendering of the dashboard.
//!
//! Every team's map and table is rendered up front; the inline script only
//! toggles which section is visible and drives hover styling and tooltips.

use crate::dashboard::Dashboard;
use crate::types::Team;
use std::fmt::Write as _;

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render the full dashboard page. The dashboard ends on the team it started on.
pub fn render_dashboard(dashboard: &mut Dashboard) -> String {
    let selected = dashboard.current_team();

    let mut options = String::new();
    let mut sections = String::new();
    for team in Team::ALL {
        dashboard.select_team(team);
        let _ = write!(
            options,
            r#"<option value="{t}"{sel}>{t}</option>"#,
            t = team,
            sel = if team == selected { " selected" } else { "" }
        );
        let _ = write!(
            sections,
            r#"<section class="team" data-team="{t}"{hidden}><div class="map-wrap">{map}</div><div class="table-wrap">{table}</div></section>"#,
            t = team,
            hidden = if team == selected { "" } else { " hidden" },
            map = dashboard.map().to_svg(),
            table = dashboard.table().to_html(),
        );
    }
    dashboard.select_team(selected);

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Constituency Dashboard</title>
    <style>{css}</style>
</head>
<body>
    <header>
        <label for="teamSelector">Team</label>
        <select id="teamSelector">{options}</select>
    </header>
    <main>{sections}</main>
    <div id="tooltip" class="tooltip" hidden></div>
    <script>{js}</script>
</body>
</html>"#,
        css = inline_css(),
        js = inline_javascript(),
        options = options,
        sections = sections,
    )
}

/// Blocking notice shown instead of the dashboard when boundaries failed to load.
pub fn render_notice(message: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Constituency Dashboard</title>
    <style>{css}</style>
</head>
<body>
    <div class="notice" role="alert">{message}</div>
</body>
</html>"#,
        css = inline_css(),
        message = escape_html(message),
    )
}

fn inline_css() -> &'static str {
    r#"
body { font-family: system-ui, sans-serif; margin: 0; padding: 1rem; background: #fafafa; }
header { margin-bottom: 1rem; }
.team { display: flex; flex-wrap: wrap; gap: 1rem; }
.team[hidden] { display: none; }
.map { background: #eef3f7; max-width: 100%; height: auto; }
.region { cursor: pointer; }
table { border-collapse: collapse; font-size: 0.9rem; }
th, td { border: 1px solid #ccc; padding: 0.25rem 0.5rem; text-align: left; }
th { background: #e5f5e0; }
.empty { color: #666; }
.tooltip { position: fixed; pointer-events: none; background: rgba(255,255,255,0.9); border: 1px solid #999; padding: 0.4rem; font-size: 0.85rem; }
.notice { padding: 1rem; border: 1px solid #c00; background: #fee; color: #900; }
"#
}

fn inline_javascript() -> &'static str {
    r#"
(function () {
  var tip = document.getElementById("tooltip");
  document.getElementById("teamSelector").addEventListener("change", function (e) {
    document.querySelectorAll("section.team").forEach(function (s) {
      s.hidden = s.dataset.team !== e.target.value;
    });
    tip.hidden = true;
  });
  document.querySelectorAll("path.region").forEach(function (p) {
    p.addEventListener("mouseenter", function () {
      p.setAttribute("fill", p.dataset.hoverFill);
      tip.innerHTML = p.dataset.tooltip;
      tip.hidden = false;
    });
    p.addEventListener("mousemove", function (e) {
      tip.style.left = (e.clientX + 12) + "px";
      tip.style.top = (e.clientY + 12) + "px";
    });
    p.addEventListener("mouseleave", function () {
      p.setAttribute("fill", p.dataset.fill);
      tip.hidden = true;
    });
  });
})();
"#
}
