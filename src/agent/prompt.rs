//! System prompt template for the agent.

use crate::tools::ToolRegistry;

/// Build the system prompt with tool descriptions.
pub fn build_system_prompt(tools: &ToolRegistry) -> String {
    let tool_descriptions = tools
        .list_tools()
        .iter()
        .map(|t| format!("- **{}**: {}", t.name, t.description))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are a helpful assistant that can call tools.

## Available Tools
{tool_descriptions}

## Rules
1. Call a tool when it gives a better answer than your own knowledge: search for current or uncertain facts, multiply instead of doing arithmetic in your head.
2. Call tools with exactly the arguments their schema declares.
3. If a tool returns an error, read it and either fix the call or answer without that tool.
4. When you have what you need, reply to the user directly and concisely."#,
        tool_descriptions = tool_descriptions
    )
}
