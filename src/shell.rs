// Presentation shell
//
// Static page layout plus an explicit callback registry: each callback names
// the input controls it listens to and the display region it fills. When a
// control changes, the page posts the current value of every control and the
// shell runs the subscribed callbacks synchronously.

use crate::context::DashboardContext;
use crate::error::{DashboardError, Result};
use crate::graph::Canvas;
use crate::palette::to_hex;
use crate::query::Selection;
use crate::{OutputFormat, RenderOptions};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

pub const THEME_INPUT: &str = "select_theme";
pub const XAXIS_INPUT: &str = "select_xaxis_feature";
pub const YAXIS_INPUT: &str = "select_yaxis_feature";
pub const GRAPH_OUTPUT: &str = "graph";

/// Current control values posted by the page
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateRequest {
    /// Control that triggered the update; `None` on first page load
    #[serde(default)]
    pub changed: Option<String>,
    #[serde(default)]
    pub inputs: HashMap<String, Value>,
}

/// Fresh markup keyed by display region id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateResponse {
    pub outputs: BTreeMap<String, String>,
}

pub type Handler = Box<dyn Fn(&DashboardContext, &[&Value]) -> Result<String> + Send + Sync>;

/// A named handler subscribed to a named set of inputs
pub struct Callback {
    pub output: String,
    pub inputs: Vec<String>,
    pub handler: Handler,
}

impl Callback {
    pub fn new<F>(output: &str, inputs: &[&str], handler: F) -> Self
    where
        F: Fn(&DashboardContext, &[&Value]) -> Result<String> + Send + Sync + 'static,
    {
        Self {
            output: output.to_string(),
            inputs: inputs.iter().map(|s| s.to_string()).collect(),
            handler: Box::new(handler),
        }
    }

    fn listens_to(&self, changed: Option<&str>) -> bool {
        match changed {
            Some(id) => self.inputs.iter().any(|i| i == id),
            None => true,
        }
    }
}

#[derive(Default)]
pub struct Shell {
    callbacks: Vec<Callback>,
}

impl Shell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shell wired with the theme/axis -> graph callback
    pub fn with_default_callbacks() -> Self {
        let mut shell = Self::new();
        shell.register(Callback::new(
            GRAPH_OUTPUT,
            &[THEME_INPUT, XAXIS_INPUT, YAXIS_INPUT],
            update_graph,
        ));
        shell
    }

    pub fn register(&mut self, callback: Callback) {
        debug!("Registering callback {} <- {:?}", callback.output, callback.inputs);
        self.callbacks.push(callback);
    }

    /// Run every callback subscribed to the changed input
    pub fn dispatch(&self, ctx: &DashboardContext, request: &UpdateRequest) -> Result<UpdateResponse> {
        let changed = request.changed.as_deref();
        if let Some(id) = changed {
            if !self.callbacks.iter().any(|c| c.listens_to(Some(id))) {
                return Err(DashboardError::InvalidRequest(format!("Unknown input '{}'", id)));
            }
        }

        let mut response = UpdateResponse::default();
        for callback in self.callbacks.iter().filter(|c| c.listens_to(changed)) {
            let values = callback
                .inputs
                .iter()
                .map(|id| {
                    request
                        .inputs
                        .get(id)
                        .ok_or_else(|| DashboardError::InvalidRequest(format!("Missing value for input '{}'", id)))
                })
                .collect::<Result<Vec<&Value>>>()?;
            let markup = (callback.handler)(ctx, &values)?;
            response.outputs.insert(callback.output.clone(), markup);
        }
        Ok(response)
    }
}

/// Build a selection from the three control values (themes, x, y)
pub fn selection_from_values(values: &[&Value]) -> Result<Selection> {
    let [themes, x, y] = values else {
        return Err(DashboardError::InvalidRequest(format!(
            "Expected 3 input values, got {}",
            values.len()
        )));
    };

    let themes: Vec<String> = match themes {
        Value::Null => Vec::new(),
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items
            .iter()
            .map(|v| {
                v.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| DashboardError::InvalidRequest("Theme values must be strings".to_string()))
            })
            .collect::<Result<_>>()?,
        _ => {
            return Err(DashboardError::InvalidRequest(
                "Theme selection must be a list of strings".to_string(),
            ))
        }
    };

    Ok(Selection::new(themes, axis_value(x, XAXIS_INPUT)?, axis_value(y, YAXIS_INPUT)?))
}

fn axis_value<'a>(value: &'a Value, id: &str) -> Result<&'a str> {
    value
        .as_str()
        .ok_or_else(|| DashboardError::InvalidRequest(format!("Input '{}' must be a string", id)))
}

fn update_graph(ctx: &DashboardContext, values: &[&Value]) -> Result<String> {
    let selection = selection_from_values(values)?;
    let spec = ctx.query(&selection)?;
    debug!("Rendering {} points for {:?}", spec.points.len(), selection);

    let options = RenderOptions {
        format: OutputFormat::Svg,
        ..RenderOptions::default()
    };
    Canvas::for_chart(&spec, &options)
        .render_svg(&spec, &ctx.colors)
        .map_err(|e| DashboardError::RenderError(format!("{:#}", e)))
}

/// Render the full page shell
pub fn render_page(ctx: &DashboardContext) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>LEGO Analysis</title>
    <style>{css}</style>
</head>
<body>
    {navbar}
    <main class="container">
        {intro}
        {controls}
    </main>
    <script>{js}</script>
</body>
</html>"#,
        css = inline_css(),
        navbar = render_navbar(),
        intro = render_intro(),
        controls = render_controls(ctx),
        js = inline_javascript(),
    )
}

fn render_navbar() -> String {
    r##"<nav class="navbar"><a class="brand" href="#">LEGO Analysis</a></nav>"##.to_string()
}

fn render_intro() -> String {
    r#"<section class="intro">
        <h2>LEGO Analysis</h2>
        <p>Visually analyse sets of your favourite LEGO themes. Pick one or more
        themes and the two features to compare; every set is drawn as one
        point, sized by its number of parts.</p>
        <p>Data from <a href="https://brickset.com/" target="_blank">Brickset.com</a>.</p>
    </section>"#
        .to_string()
}

fn render_controls(ctx: &DashboardContext) -> String {
    let theme_options: String = ctx
        .colors
        .themes()
        .iter()
        .map(|theme| {
            format!(
                r#"<option value="{value}" style="color: {color}">{value}</option>"#,
                value = html_escape(theme),
                color = to_hex(ctx.colors.color_or_fallback(theme)),
            )
        })
        .collect();

    let field_options = |selected: &str| -> String {
        ctx.labels
            .iter()
            .map(|entry| {
                format!(
                    r#"<option value="{value}"{sel}>{label}</option>"#,
                    value = entry.field.as_str(),
                    sel = if entry.field.as_str() == selected { " selected" } else { "" },
                    label = html_escape(&entry.label),
                )
            })
            .collect()
    };

    let defaults = Selection::default();
    format!(
        r#"<section class="controls">
        <label for="{theme_id}">Select LEGO themes</label>
        <select id="{theme_id}" class="control" multiple size="{size}">{theme_options}</select>
        <label for="{x_id}">Select x-axis</label>
        <select id="{x_id}" class="control">{x_options}</select>
        <label for="{y_id}">Select y-axis</label>
        <select id="{y_id}" class="control">{y_options}</select>
        <div id="{graph_id}" class="graph"></div>
    </section>"#,
        theme_id = THEME_INPUT,
        size = ctx.colors.len().max(1),
        theme_options = theme_options,
        x_id = XAXIS_INPUT,
        x_options = field_options(&defaults.x),
        y_id = YAXIS_INPUT,
        y_options = field_options(&defaults.y),
        graph_id = GRAPH_OUTPUT,
    )
}

fn inline_css() -> &'static str {
    r#"
body { margin: 0; font-family: system-ui, -apple-system, sans-serif; color: #212529; }
.navbar { position: sticky; top: 0; padding: 12px 24px; background: #343a40; }
.navbar .brand { color: #fff; font-size: 20px; text-decoration: none; }
.container { display: flex; gap: 32px; padding: 24px; }
.intro { flex: 0 0 25%; }
.controls { flex: 1; display: flex; flex-direction: column; gap: 8px; }
.control { padding: 4px; font-size: 14px; }
.graph { margin-top: 16px; min-height: 600px; }
"#
}

fn inline_javascript() -> String {
    format!(
        r#"
const INPUTS = ["{theme}", "{x}", "{y}"];

function currentValues() {{
    const values = {{}};
    for (const id of INPUTS) {{
        const el = document.getElementById(id);
        values[id] = el.multiple
            ? Array.from(el.selectedOptions).map(o => o.value)
            : el.value;
    }}
    return values;
}}

async function update(changed) {{
    const response = await fetch("/_update", {{
        method: "POST",
        headers: {{ "Content-Type": "application/json" }},
        body: JSON.stringify({{ changed: changed, inputs: currentValues() }}),
    }});
    const body = await response.json();
    if (!response.ok) {{
        console.error(body.error);
        return;
    }}
    for (const [id, markup] of Object.entries(body.outputs)) {{
        document.getElementById(id).innerHTML = markup;
    }}
}}

for (const id of INPUTS) {{
    document.getElementById(id).addEventListener("change", () => update(id));
}}
update(null);
"#,
        theme = THEME_INPUT,
        x = XAXIS_INPUT,
        y = YAXIS_INPUT,
    )
}

/// Escape HTML special characters
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
