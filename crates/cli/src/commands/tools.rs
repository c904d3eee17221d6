use procura_agent::subagents::{default_subagents, task_tool_definition};
use procura_agent::ToolRegistry;
use procura_core::Catalogs;

use crate::commands::CommandResult;

/// Tool definitions exactly as the main agent offers them to the model.
pub fn run() -> CommandResult {
    let mut definitions = ToolRegistry::procurement(&Catalogs::seeded()).definitions();
    definitions.push(task_tool_definition(&default_subagents()));

    match serde_json::to_string_pretty(&definitions) {
        Ok(output) => CommandResult { exit_code: 0, output },
        Err(error) => CommandResult::failure("tools", "serialization", error.to_string(), 1),
    }
}
