//! Tool input schemas.

use rmcp::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SiteListFormat {
    /// Machine readable list (structured reply)
    #[default]
    Json,
    /// The CLI's human readable table
    Table,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SiteListInput {
    #[schemars(description = "Output format: 'json' (default, structured) or 'table'")]
    #[serde(default)]
    pub format: Option<SiteListFormat>,
}

/// Input for tools that operate on one local site directory.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SitePathInput {
    #[schemars(description = "Absolute path of the local Studio site directory")]
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PreviewUpdateInput {
    #[schemars(description = "Hostname of the preview site to update (e.g. brave-otter.wp.build)")]
    pub host: String,

    #[schemars(description = "Absolute path of the local Studio site directory")]
    pub path: String,

    #[schemars(
        description = "Allow updating a preview that was created from a different local site"
    )]
    #[serde(default)]
    pub overwrite: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PreviewDeleteInput {
    #[schemars(description = "Hostname of the preview site to delete")]
    pub host: String,

    #[schemars(
        description = "Must be true. Only set after the user explicitly confirmed the deletion"
    )]
    pub confirm: bool,
}
