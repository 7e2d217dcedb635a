/*!
Subcommands of the `studio-mcp` binary.

  serve  (default) run the MCP server on stdio; lives in main.rs
  tools  print the registered tools without starting a transport

Each subcommand module exposes one `execute_*` function returning
`anyhow::Result<()>`; argument structs derive `clap::Args`.
*/

pub mod format;
pub mod tools;

pub use tools::{ToolsArgs, execute_tools};
