//! Prompt strategies
//!
//! A closed registry of prompt templates. The name given in a suite's config
//! is resolved once, when the runner is built, so a typo fails the suite
//! before any request is sent.

use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::error::BenchError;
use crate::tasks::TaskInstance;

/// Output key for patch-producing strategies
pub const PATCH_KEY: &str = "model_patch";
/// Output key for free-form completions
pub const COMPLETION_KEY: &str = "completion";
/// Output key recording the model that produced the text
pub const MODEL_NAME_KEY: &str = "model_name";

/// An instance could not be turned into a prompt
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PromptError {
    #[error("malformed prompt: instance is missing field '{0}'")]
    MissingField(&'static str),
}

/// How a task instance is turned into a prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PromptStrategy {
    #[default]
    Minimal,
    Structured,
    FewShot,
    ChainOfThought,
    AgentStyle,
    Direct,
    Template,
    ZeroShotCot,
    BestPractice,
    /// Sends the instance's `prompt` field verbatim
    Passthrough,
}

impl PromptStrategy {
    pub const ALL: [PromptStrategy; 10] = [
        PromptStrategy::Minimal,
        PromptStrategy::Structured,
        PromptStrategy::FewShot,
        PromptStrategy::ChainOfThought,
        PromptStrategy::AgentStyle,
        PromptStrategy::Direct,
        PromptStrategy::Template,
        PromptStrategy::ZeroShotCot,
        PromptStrategy::BestPractice,
        PromptStrategy::Passthrough,
    ];

    /// Registry name
    pub fn name(&self) -> &'static str {
        match self {
            PromptStrategy::Minimal => "minimal",
            PromptStrategy::Structured => "structured",
            PromptStrategy::FewShot => "few_shot",
            PromptStrategy::ChainOfThought => "chain_of_thought",
            PromptStrategy::AgentStyle => "agent_style",
            PromptStrategy::Direct => "direct",
            PromptStrategy::Template => "template",
            PromptStrategy::ZeroShotCot => "zero_shot_cot",
            PromptStrategy::BestPractice => "best_practice",
            PromptStrategy::Passthrough => "passthrough",
        }
    }

    /// One-line description for listings
    pub fn description(&self) -> &'static str {
        match self {
            PromptStrategy::Minimal => "Short instruction, lets the model pick the format",
            PromptStrategy::Structured => "Explicit sections and diff format rules",
            PromptStrategy::FewShot => "One worked example before the task",
            PromptStrategy::ChainOfThought => "Step-by-step analysis before the patch",
            PromptStrategy::AgentStyle => "XML-tagged role, task and requirements",
            PromptStrategy::Direct => "Imperative instructions, primes the diff header",
            PromptStrategy::Template => "Fill-in-the-blanks patch skeleton",
            PromptStrategy::ZeroShotCot => "\"Let's think step by step\" trigger",
            PromptStrategy::BestPractice => "Tagged description, instructions and format",
            PromptStrategy::Passthrough => "Uses the instance's `prompt` field as is",
        }
    }

    /// Comma separated list of every registry name
    pub fn available() -> String {
        Self::ALL
            .iter()
            .map(|s| s.name())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Whether the output is a unified diff
    pub fn produces_patch(&self) -> bool {
        !matches!(self, PromptStrategy::Passthrough)
    }

    /// Key under which the generated text is stored
    pub fn output_key(&self) -> &'static str {
        if self.produces_patch() {
            PATCH_KEY
        } else {
            COMPLETION_KEY
        }
    }

    /// Render the prompt for one instance
    pub fn build_prompt(&self, instance: &TaskInstance) -> Result<String, PromptError> {
        if let PromptStrategy::Passthrough = self {
            return required(instance, "prompt").map(str::to_string);
        }

        let id = &instance.instance_id;
        let repo = required(instance, "repo")?;
        let problem = required(instance, "problem_statement")?;
        let hints = hints_block(instance);

        let prompt = match self {
            PromptStrategy::Minimal => format!(
                "You are an expert software engineer. Fix the following GitHub issue by \
                 generating a code patch.\n\n\
                 Repository: {repo}\n\
                 Issue: {problem}\n{hints}\n\
                 Generate a git diff patch to fix this issue. Provide only the patch code."
            ),
            PromptStrategy::Structured => format!(
                "You are a software engineer tasked with fixing a GitHub issue.\n\n\
                 REPOSITORY: {repo}\n\
                 ISSUE ID: {id}\n\n\
                 PROBLEM DESCRIPTION:\n{problem}\n{hints}\n\
                 TASK:\n\
                 Generate a unified diff patch that fixes this issue. The patch must:\n\
                 1. Be in valid unified diff format\n\
                 2. Start with 'diff --git a/path b/path'\n\
                 3. Include proper line numbers with @@ markers\n\
                 4. Show context lines around changes\n\
                 5. Be complete and applicable\n\n\
                 OUTPUT FORMAT:\n\
                 Generate ONLY the patch code. No explanations or comments.\n\n\
                 PATCH:\n"
            ),
            PromptStrategy::FewShot => format!(
                "Fix GitHub issues by generating unified diff patches.\n\n\
                 EXAMPLE:\n\
                 Issue: Function returns None instead of empty list\n\
                 Patch:\n\
                 diff --git a/utils.py b/utils.py\n\
                 --- a/utils.py\n\
                 +++ b/utils.py\n\
                 @@ -10,7 +10,7 @@ def get_items():\n\
                 \x20    if not items:\n\
                 -        return None\n\
                 +        return []\n\
                 \x20    return items\n\n\
                 ---\n\n\
                 NOW FIX THIS ISSUE:\n\n\
                 Repository: {repo}\n\
                 Issue ID: {id}\n\n\
                 Problem:\n{problem}\n{hints}\n\
                 Generate the patch (unified diff format only):\n"
            ),
            PromptStrategy::ChainOfThought => format!(
                "You are an expert software engineer. Fix the following GitHub issue using \
                 step-by-step reasoning.\n\n\
                 Repository: {repo}\n\
                 Issue: {id}\n\n\
                 Problem Description:\n{problem}\n{hints}\n\
                 Instructions:\n\
                 1. First, analyze what the issue is asking for\n\
                 2. Identify which files likely need changes\n\
                 3. Determine the specific code changes needed\n\
                 4. Generate a unified diff patch\n\n\
                 Think through the problem, then provide ONLY the final patch in unified \
                 diff format.\n\n\
                 Analysis and Patch:\n"
            ),
            PromptStrategy::AgentStyle => format!(
                "<role>\nYou are a senior software engineer with expertise in debugging and \
                 fixing code issues.\n</role>\n\n\
                 <task>\nFix the GitHub issue below by generating a precise code patch.\n</task>\n\n\
                 <repository>\n{repo}\n</repository>\n\n\
                 <issue_id>\n{id}\n</issue_id>\n\n\
                 <problem>\n{problem}\n</problem>\n{hints}\n\
                 <requirements>\n\
                 - Output ONLY a unified diff patch\n\
                 - Use proper diff format: diff --git a/file b/file\n\
                 - Include @@ line markers\n\
                 - Show 3 lines of context before/after changes\n\
                 - No explanations, just the patch\n\
                 </requirements>\n\n\
                 <output>\n"
            ),
            PromptStrategy::Direct => format!(
                "Generate a unified diff patch to fix this issue.\n\n\
                 Repo: {repo}\n\
                 Issue: {id}\n\n\
                 {problem}\n{hints}\n\
                 Requirements:\n\
                 - Valid unified diff format\n\
                 - Start with: diff --git a/<file> b/<file>\n\
                 - Include @@ line numbers\n\
                 - Show context lines\n\n\
                 Patch:\n{DIFF_HEADER}"
            ),
            PromptStrategy::Template => format!(
                "Complete this patch template to fix the GitHub issue.\n\n\
                 Issue Information:\n\
                 - Repository: {repo}\n\
                 - Issue ID: {id}\n\
                 - Problem: {problem}\n{hints}\n\
                 Patch Template (fill in the changes):\n\n\
                 diff --git a/[FILE_PATH] b/[FILE_PATH]\n\
                 --- a/[FILE_PATH]\n\
                 +++ b/[FILE_PATH]\n\
                 @@ -[START_LINE],[NUM_LINES] +[START_LINE],[NUM_LINES] @@\n\
                 [CONTEXT_LINE]\n\
                 -[OLD_CODE_LINE]\n\
                 +[NEW_CODE_LINE]\n\
                 [CONTEXT_LINE]\n\n\
                 Generate the complete patch:\n"
            ),
            PromptStrategy::ZeroShotCot => format!(
                "Fix the following GitHub issue. Let's think step by step.\n\n\
                 Repository: {repo}\n\
                 Issue: {problem}\n{hints}\n\
                 Generate a unified diff patch to resolve this. Let's approach this \
                 systematically:\n\n\
                 1. Understand the problem\n\
                 2. Identify the fix\n\
                 3. Generate the patch\n\n\
                 Patch:\n"
            ),
            PromptStrategy::BestPractice => format!(
                "Fix the GitHub issue below by generating a git diff patch.\n\n\
                 <repository>{repo}</repository>\n\
                 <issue>{id}</issue>\n\n\
                 <description>\n{problem}\n</description>\n{hints}\n\
                 <instructions>\n\
                 1. Analyze the issue carefully\n\
                 2. Generate a unified diff patch that fixes it\n\
                 3. Ensure the patch is in valid git diff format\n\
                 4. Include only the necessary changes\n\
                 </instructions>\n\n\
                 <format>\n\
                 diff --git a/path/to/file.py b/path/to/file.py\n\
                 --- a/path/to/file.py\n\
                 +++ b/path/to/file.py\n\
                 @@ -line,count +line,count @@\n\
                 \x20context\n\
                 -old code\n\
                 +new code\n\
                 \x20context\n\
                 </format>\n\n\
                 Generate the patch now (patch only, no explanation):\n"
            ),
            PromptStrategy::Passthrough => required(instance, "prompt")?.to_string(),
        };

        Ok(prompt)
    }

    /// Clean up raw model text before it is stored
    pub fn postprocess(&self, text: &str) -> String {
        if !self.produces_patch() {
            return text.to_string();
        }

        let mut patch = extract_fenced_diff(text).unwrap_or(text).trim().to_string();

        // The direct prompt ends with the diff header, so the model continues
        // after it.
        if *self == PromptStrategy::Direct && !patch.starts_with("diff ") && !patch.starts_with("---")
        {
            patch = format!("{} {}", DIFF_HEADER, patch);
        }

        if !patch.ends_with('\n') {
            patch.push('\n');
        }
        patch
    }

    /// Output mapping stored in a successful task result
    pub fn build_output(&self, text: &str, model_name: &str) -> Map<String, Value> {
        let mut output = Map::new();
        output.insert(
            self.output_key().to_string(),
            Value::String(self.postprocess(text)),
        );
        output.insert(
            MODEL_NAME_KEY.to_string(),
            Value::String(model_name.to_string()),
        );
        output
    }
}

const DIFF_HEADER: &str = "diff --git";

fn required<'a>(instance: &'a TaskInstance, key: &'static str) -> Result<&'a str, PromptError> {
    instance
        .field(key)
        .filter(|v| !v.trim().is_empty())
        .ok_or(PromptError::MissingField(key))
}

fn hints_block(instance: &TaskInstance) -> String {
    match instance.field("hints_text").map(str::trim) {
        Some(hints) if !hints.is_empty() => format!("\nHints:\n{}\n", hints),
        _ => String::new(),
    }
}

/// Body of the first ```diff or ```patch fence, if any
fn extract_fenced_diff(text: &str) -> Option<&str> {
    let start = ["```diff", "```patch"]
        .iter()
        .find_map(|fence| text.find(fence).map(|i| i + fence.len()))?;
    let body = &text[start..];
    let body = body.strip_prefix('\n').unwrap_or(body);
    let end = body.find("```").unwrap_or(body.len());
    Some(&body[..end])
}

impl fmt::Display for PromptStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PromptStrategy {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|strategy| strategy.name() == s)
            .ok_or_else(|| BenchError::UnknownStrategy {
                name: s.to_string(),
                available: Self::available(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instance() -> TaskInstance {
        TaskInstance::new("astropy__astropy-12907")
            .with_field("repo", "astropy/astropy")
            .with_field("problem_statement", "separability_matrix is wrong for nested models")
    }

    #[test]
    fn test_every_name_round_trips() {
        for strategy in PromptStrategy::ALL {
            assert_eq!(strategy.name().parse::<PromptStrategy>().unwrap(), strategy);
        }
    }

    #[test]
    fn test_unknown_name_lists_available() {
        let err = "fancy".parse::<PromptStrategy>().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("'fancy'"));
        assert!(message.contains("best_practice"));
        assert!(message.contains("passthrough"));
    }

    #[test]
    fn test_all_patch_prompts_include_instance_fields() {
        let instance = instance();
        for strategy in PromptStrategy::ALL.iter().filter(|s| s.produces_patch()) {
            let prompt = strategy.build_prompt(&instance).unwrap();
            assert!(prompt.contains("astropy/astropy"), "{}", strategy);
            assert!(prompt.contains("separability_matrix"), "{}", strategy);
        }
    }

    #[test]
    fn test_missing_field_is_error() {
        let instance = TaskInstance::new("x").with_field("repo", "a/b");
        assert_eq!(
            PromptStrategy::Minimal.build_prompt(&instance),
            Err(PromptError::MissingField("problem_statement"))
        );
        assert_eq!(
            PromptStrategy::Passthrough.build_prompt(&instance),
            Err(PromptError::MissingField("prompt"))
        );
    }

    #[test]
    fn test_hints_included_when_present() {
        let with_hints = instance().with_field("hints_text", "Look at _cstack");
        let prompt = PromptStrategy::Structured.build_prompt(&with_hints).unwrap();
        assert!(prompt.contains("Hints:\nLook at _cstack"));

        let prompt = PromptStrategy::Structured.build_prompt(&instance()).unwrap();
        assert!(!prompt.contains("Hints:"));
    }

    #[test]
    fn test_passthrough_uses_prompt_field() {
        let instance = TaskInstance::new("q1").with_field("prompt", "What is 2+2?");
        assert_eq!(
            PromptStrategy::Passthrough.build_prompt(&instance).unwrap(),
            "What is 2+2?"
        );
        let output = PromptStrategy::Passthrough.build_output(" 4", "m");
        assert_eq!(output.get(COMPLETION_KEY), Some(&Value::from(" 4")));
        assert_eq!(output.get(MODEL_NAME_KEY), Some(&Value::from("m")));
    }

    #[test]
    fn test_postprocess_extracts_fenced_diff() {
        let raw = "Here is the fix:\n```diff\ndiff --git a/x.py b/x.py\n-a\n+b\n```\nDone.";
        assert_eq!(
            PromptStrategy::Minimal.postprocess(raw),
            "diff --git a/x.py b/x.py\n-a\n+b\n"
        );
    }

    #[test]
    fn test_postprocess_direct_restores_header() {
        let raw = " a/x.py b/x.py\n--- a/x.py\n+++ b/x.py";
        assert_eq!(
            PromptStrategy::Direct.postprocess(raw),
            "diff --git a/x.py b/x.py\n--- a/x.py\n+++ b/x.py\n"
        );
        assert!(
            PromptStrategy::Direct
                .build_prompt(&instance())
                .unwrap()
                .ends_with("Patch:\ndiff --git")
        );
    }

    #[test]
    fn test_patch_output_shape() {
        let output = PromptStrategy::BestPractice.build_output("diff --git a/f b/f", "qwen");
        assert_eq!(output.get(PATCH_KEY), Some(&Value::from("diff --git a/f b/f\n")));
        assert_eq!(output.get(MODEL_NAME_KEY), Some(&Value::from("qwen")));
    }
}
