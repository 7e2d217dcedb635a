/*!
`tools.rs`

Implements the `tools` subcommand: print the tools this server registers,
without starting a transport or running `studio`.

JSON Output Shape:
{
  "server": "studio",
  "count": 7,
  "tools": [
    { "name": "studio_site_list", "description": "...", "params": ["format"], "required": [] }
  ]
}
*/

use anyhow::{Context, Result};
use clap::Args;
use rmcp::model::Tool;

use crate::cmd::format::{Role, StyleOptions, TableOpts, box_header, color, emoji, table};
use crate::config::StudioConfig;
use crate::server::{SERVER_NAME, StudioServer};

/// CLI arguments for `studio-mcp tools`
#[derive(Args, Debug)]
pub struct ToolsArgs {
    /// Output JSON instead of human-readable text
    #[arg(long)]
    pub json: bool,
}

/// Flattened view of one tool definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSummary {
    pub name: String,
    pub description: String,
    pub params: Vec<String>,
    pub required: Vec<String>,
}

impl ToolSummary {
    pub fn from_tool(tool: &Tool) -> Self {
        let schema = &tool.input_schema;
        let params = schema
            .get("properties")
            .and_then(|v| v.as_object())
            .map(|props| props.keys().cloned().collect())
            .unwrap_or_default();
        let required = schema
            .get("required")
            .and_then(|v| v.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();
        Self {
            name: tool.name.to_string(),
            description: tool
                .description
                .as_deref()
                .unwrap_or_default()
                .to_string(),
            params,
            required,
        }
    }

    /// `host*, confirm*` style parameter column (`*` = required).
    fn params_cell(&self) -> String {
        self.params
            .iter()
            .map(|p| {
                if self.required.contains(p) {
                    format!("{p}*")
                } else {
                    p.clone()
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "name": self.name,
            "description": self.description,
            "params": self.params,
            "required": self.required,
        })
    }
}

/// Registered tools, sorted by name.
pub fn collect_summaries(server: &StudioServer) -> Vec<ToolSummary> {
    let mut summaries: Vec<ToolSummary> = server.tools().iter().map(ToolSummary::from_tool).collect();
    summaries.sort_by(|a, b| a.name.cmp(&b.name));
    summaries
}

pub fn render_json(summaries: &[ToolSummary]) -> Result<String> {
    let body = serde_json::json!({
        "server": SERVER_NAME,
        "count": summaries.len(),
        "tools": summaries.iter().map(ToolSummary::to_json).collect::<Vec<_>>(),
    });
    serde_json::to_string_pretty(&body).context("failed to serialize tool list")
}

pub fn render_human(summaries: &[ToolSummary], style: &StyleOptions) -> String {
    let header = box_header(
        format!("{} Tools ({})", emoji("tool", style), summaries.len()).trim(),
        Some(format!("server={SERVER_NAME}")),
        style,
    );
    let rows: Vec<Vec<String>> = summaries
        .iter()
        .map(|s| vec![s.name.clone(), s.params_cell(), s.description.clone()])
        .collect();
    let body = table(
        &["NAME", "PARAMS", "DESCRIPTION"],
        &rows,
        TableOpts::default(),
        style,
    );
    let footer = format!(
        "{} {}",
        emoji("info", style),
        color(Role::Dim, "* = required parameter", style)
    );
    format!("{header}\n{body}\n\n{}", footer.trim_start())
}

/// Entry point for the tools subcommand.
pub fn execute_tools(args: ToolsArgs, config: StudioConfig) -> Result<()> {
    let server = StudioServer::new(config);
    let summaries = collect_summaries(&server);
    if args.json {
        println!("{}", render_json(&summaries)?);
    } else {
        println!("{}", render_human(&summaries, &StyleOptions::detect()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summaries() -> Vec<ToolSummary> {
        collect_summaries(&StudioServer::new(StudioConfig::default()))
    }

    #[test]
    fn summaries_are_sorted_and_complete() {
        let list = summaries();
        assert_eq!(list.len(), 7);
        assert_eq!(list[0].name, "studio_auth_logout");
        assert!(list.windows(2).all(|w| w[0].name < w[1].name));
    }

    #[test]
    fn update_tool_params() {
        let list = summaries();
        let update = list
            .iter()
            .find(|s| s.name == "studio_preview_update")
            .unwrap();
        for p in ["host", "path", "overwrite"] {
            assert!(update.params.iter().any(|x| x == p), "missing {p}");
        }
        assert!(update.required.iter().any(|x| x == "host"));
        assert!(!update.required.iter().any(|x| x == "overwrite"));
        assert!(update.params_cell().contains("host*"));
    }

    #[test]
    fn json_output_shape() {
        let out = render_json(&summaries()).unwrap();
        let v: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(v["server"], "studio");
        assert_eq!(v["count"], 7);
        assert_eq!(v["tools"].as_array().unwrap().len(), 7);
    }

    #[test]
    fn human_output_mentions_each_tool() {
        let text = render_human(&summaries(), &StyleOptions::plain(200));
        assert!(text.contains("Tools (7)"));
        assert!(text.contains("studio_preview_delete"));
        assert!(text.contains("required parameter"));
    }
}
