use std::collections::BTreeMap;

use crate::agent::Agent;
use crate::task::Task;

/// Values substituted for `{name}` placeholders in agent and task text.
pub type Inputs = BTreeMap<String, String>;

pub const FORCE_FINAL_ANSWER: &str = "You ran out of tool calls for this task. \
Do not call any more tools. Give your best complete final answer now, using only what you have gathered so far.";

/// Replaces every `{key}` present in `inputs`. Unknown placeholders are kept as-is.
pub fn interpolate(template: &str, inputs: &Inputs) -> String {
    inputs.iter().fold(template.to_string(), |text, (key, value)| {
        text.replace(&format!("{{{}}}", key), value)
    })
}

pub fn system_prompt(agent: &Agent, has_tools: bool) -> String {
    let mut prompt = format!(
        "You are {}. {}\nYour personal goal is: {}",
        agent.role, agent.backstory, agent.goal
    );
    if has_tools {
        prompt.push_str(
            "\nUse the tools available to you whenever they help. \
             Once you know the complete answer, reply with it directly without calling any tool.",
        );
    }
    prompt
}

pub fn task_prompt(task: &Task, context: Option<&str>) -> String {
    let mut prompt = format!(
        "Current Task: {}\n\nThis is the expected criteria for your final answer: {}\n\
         You MUST return the actual complete content as the final answer, not a summary.",
        task.description, task.expected_output
    );

    if let Some(schema) = &task.output_json {
        let schema = serde_json::to_string_pretty(schema).unwrap_or_else(|_| schema.to_string());
        prompt.push_str(&format!(
            "\n\nFormat your final answer as a JSON array of objects. Every object must follow this JSON schema:\n{}",
            schema
        ));
    }

    if let Some(context) = context.filter(|c| !c.trim().is_empty()) {
        prompt.push_str(&format!(
            "\n\nThis is the context you're working with:\n{}",
            context
        ));
    }

    prompt.push_str("\n\nBegin! Use the tools available and give your best final answer.");
    prompt
}

/// Prompt handed to a coworker when another agent delegates to it.
pub fn delegated_prompt(task: &str, context: &str) -> String {
    let mut prompt = format!(
        "Current Task: {}\n\nYou MUST return the actual complete content as the final answer, not a summary.",
        task
    );
    if !context.trim().is_empty() {
        prompt.push_str(&format!(
            "\n\nThis is the context you're working with:\n{}",
            context
        ));
    }
    prompt
}
