//! MCP server: the tool registry, resources and server info.
//!
//! `StudioServer` is built once at startup from a resolved `StudioConfig`
//! and handed to the transport. Every tool call is independent: build the
//! argument vector, run `studio` once, render the output.

mod params;

pub use params::{
    PreviewDeleteInput, PreviewUpdateInput, SiteListFormat, SiteListInput, SitePathInput,
};

use std::sync::Arc;

use rmcp::ErrorData as McpError;
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    AnnotateAble, CallToolResult, Content, Implementation, ListResourcesResult,
    PaginatedRequestParam, ProtocolVersion, RawResource, ReadResourceRequestParam,
    ReadResourceResult, ResourceContents, ServerCapabilities, ServerInfo, Tool,
};
use rmcp::service::{RequestContext, RoleServer};
use rmcp::{tool, tool_handler, tool_router};
use serde_json::{Value, json};

use crate::config::StudioConfig;
use crate::studio::{
    CliOutput, ProcessRunner, StudioRunner, extract_preview_url, format_cli_failure, text_or,
};

pub const SERVER_NAME: &str = "studio";

pub const SITES_RESOURCE_URI: &str = "studio://sites";
pub const AUTH_STATUS_RESOURCE_URI: &str = "studio://auth/status";

const LABEL_SITE_LIST: &str = "studio site list";
const LABEL_PREVIEW_LIST: &str = "studio preview list";
const LABEL_PREVIEW_CREATE: &str = "studio preview create";
const LABEL_PREVIEW_UPDATE: &str = "studio preview update";
const LABEL_PREVIEW_DELETE: &str = "studio preview delete";
const LABEL_AUTH_STATUS: &str = "studio auth status";
const LABEL_AUTH_LOGOUT: &str = "studio auth logout";

const NO_SITES: &str = "No local sites found.";
const NO_PREVIEWS: &str = "No preview sites found.";
const NO_AUTH_STATUS: &str = "No authentication status reported.";
const LOGGED_OUT: &str = "Logged out of WordPress.com.";

fn args(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

fn text_reply(text: impl Into<String>) -> CallToolResult {
    CallToolResult::success(vec![Content::text(text.into())])
}

/// Parse `site list --format=json` output. Blank output means no sites.
fn parse_sites(stdout: &str) -> Result<Value, serde_json::Error> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Ok(Value::Array(Vec::new()));
    }
    serde_json::from_str(trimmed)
}

/// Structured `{ "sites": [...] }` reply with the same JSON as pretty text.
fn render_sites(res: &CliOutput) -> CallToolResult {
    let sites = match parse_sites(&res.stdout) {
        Ok(sites) => sites,
        Err(e) => {
            tracing::warn!(error = %e, "site list returned invalid JSON");
            return CallToolResult::error(vec![Content::text(format!(
                "Failed to parse JSON output from `{LABEL_SITE_LIST}`: {e}"
            ))]);
        }
    };
    let structured = json!({ "sites": sites });
    let pretty = serde_json::to_string_pretty(&structured).unwrap_or_else(|_| structured.to_string());
    let mut result = CallToolResult::structured(structured);
    result.content = vec![Content::text(pretty)];
    result
}

/// Auth status is reported on stderr by the CLI.
fn render_auth_status(res: &CliOutput) -> String {
    text_or(&res.stderr, NO_AUTH_STATUS)
}

#[derive(Clone)]
pub struct StudioServer {
    config: Arc<StudioConfig>,
    runner: Arc<dyn StudioRunner>,
    tool_router: ToolRouter<Self>,
}

impl StudioServer {
    /// Server backed by real `studio` subprocesses.
    pub fn new(config: StudioConfig) -> Self {
        let runner = ProcessRunner::new(config.command.clone(), config.timeout);
        Self::with_runner(config, Arc::new(runner))
    }

    pub fn with_runner(config: StudioConfig, runner: Arc<dyn StudioRunner>) -> Self {
        Self {
            config: Arc::new(config),
            runner,
            tool_router: Self::tool_router(),
        }
    }

    /// Registered tool definitions (name, description, input schema).
    pub fn tools(&self) -> Vec<Tool> {
        self.tool_router.list_all()
    }

    pub fn instructions(&self) -> String {
        [
            format!(
                "Studio sites MUST be stored in {}/<site-name>, unless the user explicitly provided a custom path.",
                self.config.sites_dir.display()
            ),
            "Always use studio_site_list to discover existing sites and their paths before operating on them."
                .to_string(),
            format!(
                "Some features, such as creating preview sites, require authentication. Ask the user to run \"{}\" in their terminal, as the login flow requires a browser interaction that the AI Assistant cannot perform.",
                self.config.login_command()
            ),
        ]
        .join(" ")
    }

    /// Run `studio` and hand back the output only when it exited with 0.
    ///
    /// Launch failures become an error result; non-zero exits become the
    /// canonical failure text as a normal result.
    async fn run_checked(
        &self,
        label: &str,
        args: Vec<String>,
    ) -> Result<CliOutput, CallToolResult> {
        match self.runner.run(&args).await {
            Ok(res) if res.success() => Ok(res),
            Ok(res) => {
                tracing::warn!(command = label, exit_code = res.exit_code, "studio exited non-zero");
                Err(text_reply(format_cli_failure(label, &res)))
            }
            Err(e) => {
                tracing::warn!(command = label, error = %e, "studio could not be run");
                Err(CallToolResult::error(vec![Content::text(format!(
                    "`{label}` could not be run: {e}"
                ))]))
            }
        }
    }

    /// `run_checked`, then `render` the output of a successful run.
    async fn run_then(
        &self,
        label: &str,
        args: Vec<String>,
        render: impl FnOnce(CliOutput) -> CallToolResult,
    ) -> CallToolResult {
        match self.run_checked(label, args).await {
            Ok(res) => render(res),
            Err(reply) => reply,
        }
    }

    /// Resource flavour of `run_checked`: every failure is a protocol error.
    async fn run_for_resource(&self, label: &str, args: Vec<String>) -> Result<CliOutput, McpError> {
        let res = self
            .runner
            .run(&args)
            .await
            .map_err(|e| McpError::internal_error(format!("`{label}` could not be run: {e}"), None))?;
        if !res.success() {
            return Err(McpError::internal_error(format_cli_failure(label, &res), None));
        }
        Ok(res)
    }
}

#[tool_router]
impl StudioServer {
    #[tool(
        description = "List all local WordPress Studio sites (wraps `studio site list`). Returns each site's name, path and status."
    )]
    async fn studio_site_list(
        &self,
        Parameters(input): Parameters<SiteListInput>,
    ) -> Result<CallToolResult, McpError> {
        let format = input.format.unwrap_or_default();
        tracing::info!(tool = "studio_site_list", ?format, "tool call");

        let reply = match format {
            SiteListFormat::Table => {
                self.run_then(LABEL_SITE_LIST, args(&["site", "list"]), |res| {
                    text_reply(text_or(&res.stdout, NO_SITES))
                })
                .await
            }
            SiteListFormat::Json => {
                self.run_then(
                    LABEL_SITE_LIST,
                    args(&["site", "list", "--format=json"]),
                    |res| render_sites(&res),
                )
                .await
            }
        };
        Ok(reply)
    }

    #[tool(
        description = "List the hosted preview sites created from a local Studio site (wraps `studio preview list`)."
    )]
    async fn studio_preview_list(
        &self,
        Parameters(input): Parameters<SitePathInput>,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!(tool = "studio_preview_list", path = %input.path, "tool call");
        let argv = args(&["preview", "list", "--path", input.path.as_str()]);
        Ok(self
            .run_then(LABEL_PREVIEW_LIST, argv, |res| {
                text_reply(text_or(&res.stdout, NO_PREVIEWS))
            })
            .await)
    }

    #[tool(
        description = "Create a publicly reachable preview site from a local Studio site (wraps `studio preview create`). Requires authentication."
    )]
    async fn studio_preview_create(
        &self,
        Parameters(input): Parameters<SitePathInput>,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!(tool = "studio_preview_create", path = %input.path, "tool call");
        let argv = args(&["preview", "create", "--path", input.path.as_str()]);
        Ok(self
            .run_then(LABEL_PREVIEW_CREATE, argv, |res| {
                // The CLI reports the new URL in its progress output on stderr.
                text_reply(match extract_preview_url(&res.stderr) {
                    Some(url) => format!("Preview site created: {url}"),
                    None => text_or(&res.stdout, "Preview site created."),
                })
            })
            .await)
    }

    #[tool(
        description = "Update an existing preview site with the current content of a local Studio site (wraps `studio preview update`). Requires authentication."
    )]
    async fn studio_preview_update(
        &self,
        Parameters(input): Parameters<PreviewUpdateInput>,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!(
            tool = "studio_preview_update",
            host = %input.host,
            path = %input.path,
            overwrite = input.overwrite,
            "tool call"
        );
        let host = input.host.as_str();
        let mut argv = args(&["preview", "update", host, "--path", input.path.as_str()]);
        if input.overwrite {
            argv.push("--overwrite".to_string());
        }
        Ok(self
            .run_then(LABEL_PREVIEW_UPDATE, argv, |res| {
                text_reply(match extract_preview_url(&res.stderr) {
                    Some(url) => format!("Preview site {host} updated: {url}"),
                    None => text_or(&res.stdout, &format!("Preview site {host} updated.")),
                })
            })
            .await)
    }

    #[tool(
        description = "Delete a preview site (wraps `studio preview delete`). Irreversible: only call with confirm=true after the user explicitly confirmed."
    )]
    async fn studio_preview_delete(
        &self,
        Parameters(input): Parameters<PreviewDeleteInput>,
    ) -> Result<CallToolResult, McpError> {
        let host = input.host.as_str();
        tracing::info!(tool = "studio_preview_delete", host = %host, confirm = input.confirm, "tool call");
        if !input.confirm {
            return Ok(text_reply(format!(
                "Refusing to delete preview site {host} without confirmation. Ask the user to confirm, then call again with confirm=true."
            )));
        }

        let argv = args(&["preview", "delete", host]);
        Ok(self
            .run_then(LABEL_PREVIEW_DELETE, argv, |_| {
                text_reply(format!("Deleted preview site {host}."))
            })
            .await)
    }

    #[tool(description = "Show whether the Studio CLI is authenticated with WordPress.com (wraps `studio auth status`).")]
    async fn studio_auth_status(&self) -> Result<CallToolResult, McpError> {
        tracing::info!(tool = "studio_auth_status", "tool call");
        Ok(self
            .run_then(LABEL_AUTH_STATUS, args(&["auth", "status"]), |res| {
                text_reply(render_auth_status(&res))
            })
            .await)
    }

    #[tool(description = "Log the Studio CLI out of WordPress.com (wraps `studio auth logout`).")]
    async fn studio_auth_logout(&self) -> Result<CallToolResult, McpError> {
        tracing::info!(tool = "studio_auth_logout", "tool call");
        Ok(self
            .run_then(LABEL_AUTH_LOGOUT, args(&["auth", "logout"]), |res| {
                let text = if res.stdout.trim().is_empty() {
                    text_or(&res.stderr, LOGGED_OUT)
                } else {
                    text_or(&res.stdout, LOGGED_OUT)
                };
                text_reply(text)
            })
            .await)
    }
}

#[tool_handler]
impl rmcp::ServerHandler for StudioServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            server_info: Implementation {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Implementation::from_build_env()
            },
            instructions: Some(self.instructions()),
        }
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        let mut sites = RawResource::new(SITES_RESOURCE_URI, "sites");
        sites.description = Some("Local Studio sites as reported by `studio site list`".into());
        sites.mime_type = Some("application/json".into());

        let mut auth = RawResource::new(AUTH_STATUS_RESOURCE_URI, "auth-status");
        auth.description = Some("WordPress.com authentication status of the Studio CLI".into());
        auth.mime_type = Some("text/plain".into());

        Ok(ListResourcesResult::with_all_items(vec![
            sites.no_annotation(),
            auth.no_annotation(),
        ]))
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        let uri = request.uri.as_str();
        tracing::debug!(uri, "read resource");

        let text = match uri {
            SITES_RESOURCE_URI => {
                let res = self
                    .run_for_resource(LABEL_SITE_LIST, args(&["site", "list", "--format=json"]))
                    .await?;
                let sites = parse_sites(&res.stdout).map_err(|e| {
                    McpError::internal_error(
                        format!("Failed to parse JSON output from `{LABEL_SITE_LIST}`: {e}"),
                        None,
                    )
                })?;
                serde_json::to_string_pretty(&sites)
                    .map_err(|e| McpError::internal_error(e.to_string(), None))?
            }
            AUTH_STATUS_RESOURCE_URI => {
                let res = self
                    .run_for_resource(LABEL_AUTH_STATUS, args(&["auth", "status"]))
                    .await?;
                render_auth_status(&res)
            }
            other => {
                return Err(McpError::resource_not_found(
                    format!("unknown resource: {other}"),
                    None,
                ));
            }
        };

        Ok(ReadResourceResult {
            contents: vec![ResourceContents::text(text, uri)],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::studio::runner::RunError;
    use rmcp::ServiceExt;
    use rmcp::model::{CallToolRequestParam, RawContent};
    use std::collections::VecDeque;
    use std::path::PathBuf;
    use std::sync::Mutex;

    /// Replays canned outputs and records every argument vector it was given.
    #[derive(Default)]
    struct ScriptedRunner {
        replies: Mutex<VecDeque<Result<CliOutput, RunError>>>,
        calls: Mutex<Vec<Vec<String>>>,
    }

    impl ScriptedRunner {
        fn replying(outputs: Vec<CliOutput>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(outputs.into_iter().map(Ok).collect()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn failing(err: RunError) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(VecDeque::from([Err(err)])),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<Vec<String>> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl StudioRunner for ScriptedRunner {
        async fn run(&self, args: &[String]) -> Result<CliOutput, RunError> {
            self.calls.lock().unwrap().push(args.to_vec());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(CliOutput::default()))
        }
    }

    fn out(stdout: &str, stderr: &str, exit_code: i32) -> CliOutput {
        CliOutput {
            stdout: stdout.into(),
            stderr: stderr.into(),
            exit_code,
        }
    }

    fn test_config() -> StudioConfig {
        StudioConfig {
            sites_dir: PathBuf::from("/home/tester/Studio"),
            ..StudioConfig::default()
        }
    }

    fn server(runner: Arc<ScriptedRunner>) -> StudioServer {
        StudioServer::with_runner(test_config(), runner)
    }

    fn text_of(result: &CallToolResult) -> String {
        match &result.content[0].raw {
            RawContent::Text(t) => t.text.clone(),
            other => panic!("expected text content, got {other:?}"),
        }
    }

    fn strings(parts: &[&str]) -> Vec<String> {
        args(parts)
    }

    #[test]
    fn registers_every_tool() {
        let srv = server(ScriptedRunner::replying(vec![]));
        let mut names: Vec<String> = srv.tools().iter().map(|t| t.name.to_string()).collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                "studio_auth_logout",
                "studio_auth_status",
                "studio_preview_create",
                "studio_preview_delete",
                "studio_preview_list",
                "studio_preview_update",
                "studio_site_list",
            ]
        );
    }

    #[test]
    fn delete_schema_requires_confirm() {
        let srv = server(ScriptedRunner::replying(vec![]));
        let tool = srv
            .tools()
            .into_iter()
            .find(|t| t.name == "studio_preview_delete")
            .unwrap();
        let required = tool.input_schema.get("required").cloned().unwrap_or_default();
        assert!(required.as_array().unwrap().contains(&json!("confirm")));
        assert!(required.as_array().unwrap().contains(&json!("host")));
    }

    #[test]
    fn info_carries_instructions() {
        use rmcp::ServerHandler;

        let srv = server(ScriptedRunner::replying(vec![]));
        let info = srv.get_info();
        assert_eq!(info.server_info.name, SERVER_NAME);
        assert_eq!(info.protocol_version, ProtocolVersion::LATEST);
        assert!(info.capabilities.tools.is_some());
        assert!(info.capabilities.resources.is_some());
        assert!(info.capabilities.prompts.is_none());
        let instructions = info.instructions.unwrap();
        assert!(instructions.contains("/home/tester/Studio/<site-name>"));
        assert!(instructions.contains("studio_site_list"));
        assert!(instructions.contains("\"studio auth login\""));
    }

    #[tokio::test]
    async fn site_list_structured_matches_stdout() {
        let stdout = r#"[{"name":"My Site","path":"/home/tester/Studio/my-site","running":true}]"#;
        let runner = ScriptedRunner::replying(vec![out(stdout, "", 0)]);
        let srv = server(runner.clone());

        let result = srv
            .studio_site_list(Parameters(SiteListInput::default()))
            .await
            .unwrap();

        assert_eq!(runner.calls(), vec![strings(&["site", "list", "--format=json"])]);
        let expected: Value = serde_json::from_str(stdout).unwrap();
        let structured = result.structured_content.clone().unwrap();
        assert_eq!(structured["sites"], expected);
        let text: Value = serde_json::from_str(&text_of(&result)).unwrap();
        assert_eq!(text, structured);
    }

    #[tokio::test]
    async fn site_list_empty_stdout_is_empty_array() {
        let srv = server(ScriptedRunner::replying(vec![out("\n", "", 0)]));
        let result = srv
            .studio_site_list(Parameters(SiteListInput::default()))
            .await
            .unwrap();
        assert_eq!(result.structured_content.unwrap()["sites"], json!([]));
    }

    #[tokio::test]
    async fn site_list_invalid_json_is_error_result() {
        let srv = server(ScriptedRunner::replying(vec![out("not json", "", 0)]));
        let result = srv
            .studio_site_list(Parameters(SiteListInput::default()))
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(true));
        assert!(text_of(&result).contains(LABEL_SITE_LIST));
    }

    #[tokio::test]
    async fn site_list_table_passes_stdout() {
        let runner = ScriptedRunner::replying(vec![out("NAME  PATH\nblog  ~/Studio/blog\n", "", 0)]);
        let srv = server(runner.clone());
        let result = srv
            .studio_site_list(Parameters(SiteListInput {
                format: Some(SiteListFormat::Table),
            }))
            .await
            .unwrap();
        assert_eq!(runner.calls(), vec![strings(&["site", "list"])]);
        assert_eq!(text_of(&result), "NAME  PATH\nblog  ~/Studio/blog");
        assert!(result.structured_content.is_none());
    }

    #[tokio::test]
    async fn site_list_failure_names_label_and_code() {
        let srv = server(ScriptedRunner::replying(vec![out("", "Error: boom", 4)]));
        let result = srv
            .studio_site_list(Parameters(SiteListInput::default()))
            .await
            .unwrap();
        let text = text_of(&result);
        assert!(text.contains("studio site list"));
        assert!(text.contains("exit code 4"));
        assert!(text.contains("Error: boom"));
        assert_ne!(result.is_error, Some(true));
    }

    #[tokio::test]
    async fn preview_list_builds_args_and_falls_back() {
        let runner = ScriptedRunner::replying(vec![out("", "", 0)]);
        let srv = server(runner.clone());
        let result = srv
            .studio_preview_list(Parameters(SitePathInput {
                path: "/home/tester/Studio/blog".into(),
            }))
            .await
            .unwrap();
        assert_eq!(
            runner.calls(),
            vec![strings(&["preview", "list", "--path", "/home/tester/Studio/blog"])]
        );
        assert_eq!(text_of(&result), NO_PREVIEWS);
    }

    #[tokio::test]
    async fn preview_create_surfaces_url_from_stderr() {
        let stderr = "- Creating a zip archive\n✔ Preview site available at https://cheerful-panda.wp.build\n";
        let srv = server(ScriptedRunner::replying(vec![out("ignored", stderr, 0)]));
        let result = srv
            .studio_preview_create(Parameters(SitePathInput {
                path: "/sites/blog".into(),
            }))
            .await
            .unwrap();
        let text = text_of(&result);
        assert!(text.contains("https://cheerful-panda.wp.build"));
        assert!(!text.contains("ignored"));
    }

    #[tokio::test]
    async fn preview_create_finds_url_in_colored_stderr() {
        let stderr = "\x1b[32m✔\x1b[39m Preview site available at \x1b[36mhttps://brave-otter.wp.build\x1b[39m\n";
        let srv = server(ScriptedRunner::replying(vec![out("fallback", stderr, 0)]));
        let result = srv
            .studio_preview_create(Parameters(SitePathInput {
                path: "/sites/blog".into(),
            }))
            .await
            .unwrap();
        assert_eq!(
            text_of(&result),
            "Preview site created: https://brave-otter.wp.build"
        );
    }

    #[tokio::test]
    async fn preview_create_falls_back_to_stdout() {
        let srv = server(ScriptedRunner::replying(vec![out(
            "  Created preview\n",
            "uploading... see https://example.com/docs",
            0,
        )]));
        let result = srv
            .studio_preview_create(Parameters(SitePathInput {
                path: "/sites/blog".into(),
            }))
            .await
            .unwrap();
        assert_eq!(text_of(&result), "Created preview");
    }

    #[tokio::test]
    async fn preview_create_placeholder_when_silent() {
        let srv = server(ScriptedRunner::replying(vec![out("", "", 0)]));
        let result = srv
            .studio_preview_create(Parameters(SitePathInput {
                path: "/sites/blog".into(),
            }))
            .await
            .unwrap();
        assert_eq!(text_of(&result), "Preview site created.");
    }

    #[tokio::test]
    async fn preview_update_overwrite_flag_is_conditional() {
        let runner = ScriptedRunner::replying(vec![out("", "", 0), out("", "", 0)]);
        let srv = server(runner.clone());
        for overwrite in [false, true] {
            srv.studio_preview_update(Parameters(PreviewUpdateInput {
                host: "calm-fox.wp.build".into(),
                path: "/sites/blog".into(),
                overwrite,
            }))
            .await
            .unwrap();
        }
        assert_eq!(
            runner.calls(),
            vec![
                strings(&["preview", "update", "calm-fox.wp.build", "--path", "/sites/blog"]),
                strings(&[
                    "preview",
                    "update",
                    "calm-fox.wp.build",
                    "--path",
                    "/sites/blog",
                    "--overwrite"
                ]),
            ]
        );
    }

    #[tokio::test]
    async fn preview_update_placeholder_names_host() {
        let srv = server(ScriptedRunner::replying(vec![out("", "", 0)]));
        let result = srv
            .studio_preview_update(Parameters(PreviewUpdateInput {
                host: "calm-fox.wp.build".into(),
                path: "/sites/blog".into(),
                overwrite: false,
            }))
            .await
            .unwrap();
        assert_eq!(text_of(&result), "Preview site calm-fox.wp.build updated.");
    }

    #[tokio::test]
    async fn delete_without_confirm_never_runs() {
        let runner = ScriptedRunner::replying(vec![]);
        let srv = server(runner.clone());
        let result = srv
            .studio_preview_delete(Parameters(PreviewDeleteInput {
                host: "doomed-owl.wp.build".into(),
                confirm: false,
            }))
            .await
            .unwrap();
        assert!(runner.calls().is_empty());
        let text = text_of(&result);
        assert!(text.contains("Refusing"));
        assert!(text.contains("doomed-owl.wp.build"));
    }

    #[tokio::test]
    async fn delete_with_confirm_reports_exact_host() {
        let runner = ScriptedRunner::replying(vec![out("", "", 0)]);
        let srv = server(runner.clone());
        let result = srv
            .studio_preview_delete(Parameters(PreviewDeleteInput {
                host: "doomed-owl.wp.build".into(),
                confirm: true,
            }))
            .await
            .unwrap();
        assert_eq!(
            runner.calls(),
            vec![strings(&["preview", "delete", "doomed-owl.wp.build"])]
        );
        assert_eq!(text_of(&result), "Deleted preview site doomed-owl.wp.build.");
    }

    #[tokio::test]
    async fn delete_failure_is_reported() {
        let srv = server(ScriptedRunner::replying(vec![out("", "Preview not found", 1)]));
        let result = srv
            .studio_preview_delete(Parameters(PreviewDeleteInput {
                host: "gone.wp.build".into(),
                confirm: true,
            }))
            .await
            .unwrap();
        let text = text_of(&result);
        assert!(text.contains("studio preview delete"));
        assert!(text.contains("exit code 1"));
        assert!(!text.contains("Deleted"));
    }

    #[tokio::test]
    async fn auth_status_reads_stderr() {
        let runner = ScriptedRunner::replying(vec![
            out("stdout noise", "Authenticated as tester\n", 0),
            out("", "", 0),
        ]);
        let srv = server(runner.clone());
        let first = srv.studio_auth_status().await.unwrap();
        assert_eq!(text_of(&first), "Authenticated as tester");
        let second = srv.studio_auth_status().await.unwrap();
        assert_eq!(text_of(&second), NO_AUTH_STATUS);
        assert_eq!(runner.calls()[0], strings(&["auth", "status"]));
    }

    #[tokio::test]
    async fn auth_logout_prefers_stdout_then_stderr() {
        let runner = ScriptedRunner::replying(vec![
            out("", "Successfully logged out\n", 0),
            out("", "", 0),
        ]);
        let srv = server(runner.clone());
        assert_eq!(
            text_of(&srv.studio_auth_logout().await.unwrap()),
            "Successfully logged out"
        );
        assert_eq!(text_of(&srv.studio_auth_logout().await.unwrap()), LOGGED_OUT);
        assert_eq!(runner.calls()[0], strings(&["auth", "logout"]));
    }

    #[tokio::test]
    async fn launch_failure_is_error_result() {
        let runner = ScriptedRunner::failing(RunError::Spawn {
            program: "studio".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        });
        let srv = server(runner);
        let result = srv.studio_auth_status().await.unwrap();
        assert_eq!(result.is_error, Some(true));
        let text = text_of(&result);
        assert!(text.contains("studio auth status"));
        assert!(text.contains("could not be run"));
    }

    #[tokio::test]
    async fn round_trip_over_duplex_transport() -> anyhow::Result<()> {
        let runner = ScriptedRunner::replying(vec![out(r#"[{"name":"blog"}]"#, "", 0)]);
        let srv = server(runner.clone());

        let (server_io, client_io) = tokio::io::duplex(64 * 1024);
        let server_task = tokio::spawn(async move {
            let running = srv.serve(server_io).await?;
            running.waiting().await?;
            anyhow::Ok(())
        });

        let client = ().serve(client_io).await?;

        let tools = client.list_tools(Default::default()).await?;
        assert_eq!(tools.tools.len(), 7);

        let refused = client
            .call_tool(CallToolRequestParam {
                name: "studio_preview_delete".into(),
                arguments: json!({ "host": "keep-me.wp.build", "confirm": false })
                    .as_object()
                    .cloned(),
            })
            .await?;
        assert!(text_of(&refused).contains("keep-me.wp.build"));

        let listed = client
            .call_tool(CallToolRequestParam {
                name: "studio_site_list".into(),
                arguments: None,
            })
            .await?;
        assert_eq!(
            listed.structured_content.unwrap()["sites"],
            json!([{ "name": "blog" }])
        );
        assert_eq!(runner.calls(), vec![strings(&["site", "list", "--format=json"])]);

        client.cancel().await?;
        let _ = server_task.await;
        Ok(())
    }

    #[tokio::test]
    async fn resources_over_duplex_transport() -> anyhow::Result<()> {
        let runner = ScriptedRunner::replying(vec![out("", "Logged in as tester\n", 0)]);
        let srv = server(runner.clone());

        let (server_io, client_io) = tokio::io::duplex(64 * 1024);
        let server_task = tokio::spawn(async move {
            let running = srv.serve(server_io).await?;
            running.waiting().await?;
            anyhow::Ok(())
        });
        let client = ().serve(client_io).await?;

        let listed = client.list_resources(Default::default()).await?;
        let uris: Vec<&str> = listed.resources.iter().map(|r| r.raw.uri.as_str()).collect();
        assert_eq!(uris, vec![SITES_RESOURCE_URI, AUTH_STATUS_RESOURCE_URI]);

        let status = client
            .read_resource(ReadResourceRequestParam {
                uri: AUTH_STATUS_RESOURCE_URI.into(),
            })
            .await?;
        match &status.contents[0] {
            ResourceContents::TextResourceContents { text, .. } => {
                assert_eq!(text, "Logged in as tester")
            }
            other => panic!("expected text resource, got {other:?}"),
        }
        assert_eq!(runner.calls(), vec![strings(&["auth", "status"])]);

        let missing = client
            .read_resource(ReadResourceRequestParam {
                uri: "studio://nope".into(),
            })
            .await;
        assert!(missing.is_err());

        client.cancel().await?;
        let _ = server_task.await;
        Ok(())
    }
}
