/// Task copy prompt
///
/// Generates the prompt for one task's copy. Two output modes exist:
///
/// - **Strategy**: an HTML-ish outline with five fixed `<b>Heading</b>`
///   sections, each followed by a blank line and `- ` bullets.
/// - **Content**: a JSON object keyed by the launch's selected platforms,
///   plus visual direction, CTA options and hashtags.
///
/// Mode selection is a keyword heuristic over the task's phase, title and
/// category. See [`classify_copy_mode`] for the exact precedence.

use super::LaunchContext;
use crate::models::task::Task;
use regex::Regex;
use serde::Serialize;
use std::fmt::Write;
use std::sync::OnceLock;

/// Output mode of a copy prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CopyMode {
    Strategy,
    Content,
}

/// A built prompt and the mode it was built for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskCopyPrompt {
    pub mode: CopyMode,
    pub text: String,
}

/// Headings of a strategy outline, in order
pub const STRATEGY_SECTIONS: [&str; 5] = [
    "Summary",
    "Framework",
    "Decision prompts",
    "Deliverables",
    "Checklist",
];

fn strategy_keywords() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)\b(brand(ing)?|persona|pricing|price|tracking|analytics|audit|strategy|positioning|competitors?|budget|kpis?|goals?|funnel|messaging|offer)\b",
        )
        .ok()
    })
    .as_ref()
}

fn content_keywords() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)\b(posts?|reels?|carousels?|story|stories|tiktoks?|videos?|emails?|newsletters?|captions?|teasers?|announcements?|blog|threads?|giveaways?|lives?|ads?)\b",
        )
        .ok()
    })
    .as_ref()
}

/// Picks strategy or content mode for a task
///
/// ```text
/// research_phase   = phase mentions "research" or "setup"
/// strategy_keyword = title matches the strategy keyword list
/// content_keyword  = title matches the content keyword list
///
/// is_strategy = (research_phase || strategy_keyword) && !(content_keyword && !research_phase)
/// is_content  = !is_strategy && (category is marketing/content || content_keyword)
/// ```
///
/// Anything that is not content falls through to strategy.
pub fn classify_copy_mode(task: &Task) -> CopyMode {
    let phase = task.phase.as_deref().unwrap_or_default().to_lowercase();
    let category = task.category.as_deref().unwrap_or_default().trim().to_lowercase();

    let research_phase = phase.contains("research") || phase.contains("setup");
    let strategy_keyword = strategy_keywords().is_some_and(|re| re.is_match(&task.title));
    let content_keyword = content_keywords().is_some_and(|re| re.is_match(&task.title));

    let is_strategy = (research_phase || strategy_keyword) && !(content_keyword && !research_phase);
    let is_content = !is_strategy
        && (category == "marketing" || category == "content" || content_keyword);

    if is_content {
        CopyMode::Content
    } else {
        CopyMode::Strategy
    }
}

/// JSON keys a content response may contain for the selected platforms
pub fn content_platform_keys(platforms: &[String]) -> Vec<&'static str> {
    let has = |name: &str| platforms.iter().any(|p| p.trim().eq_ignore_ascii_case(name));

    let mut keys = Vec::new();
    if has("instagram") {
        keys.push("Instagram_Reel");
        keys.push("Instagram_Carousel");
    }
    if has("tiktok") {
        keys.push("TikTok");
    }
    if has("email") {
        keys.push("Email");
    }
    keys
}

fn platform_key_shape(key: &str) -> &'static str {
    match key {
        "Instagram_Reel" => r#""Instagram_Reel": { "hook": "...", "script": "...", "caption": "..." }"#,
        "Instagram_Carousel" => r#""Instagram_Carousel": { "slides": ["..."], "caption": "..." }"#,
        "TikTok" => r#""TikTok": { "hook": "...", "script": "...", "caption": "..." }"#,
        "Email" => r#""Email": { "subject": "...", "body": "..." }"#,
        _ => "",
    }
}

fn write_task(out: &mut String, task: &Task) {
    let _ = writeln!(out, "## Task");
    let _ = writeln!(out, "- Title: {}", task.title);
    if let Some(description) = task.description.as_deref() {
        let _ = writeln!(out, "- Description: {}", description);
    }
    if let Some(phase) = task.phase.as_deref() {
        let _ = writeln!(out, "- Phase: {}", phase);
    }
    if let Some(platform) = task.platform.as_deref() {
        let _ = writeln!(out, "- Platform: {}", platform);
    }
    let _ = writeln!(out);
}

fn strategy_prompt(ctx: &LaunchContext, task: &Task) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "You are a launch strategist. Write a working outline the founder can act on today."
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "## Business and launch");
    out.push_str(&ctx.describe());
    let _ = writeln!(out);
    write_task(&mut out, task);

    let _ = writeln!(out, "## Format");
    let _ = writeln!(
        out,
        "Use exactly these five sections, in this order. Each section is a bold heading written as <b>Heading</b>, then one blank line, then bullet lines that start with \"- \"."
    );
    for section in STRATEGY_SECTIONS {
        let _ = writeln!(out, "<b>{}</b>", section);
        let _ = writeln!(out);
        let _ = writeln!(out, "- ...");
        let _ = writeln!(out);
    }
    let _ = writeln!(
        out,
        "Do not use markdown headings, numbered lists or any other markup. Do not wrap the answer in code fences."
    );

    out
}

fn content_prompt(ctx: &LaunchContext, task: &Task) -> String {
    let keys = content_platform_keys(&ctx.platforms);

    let mut out = String::new();
    let _ = writeln!(
        out,
        "You are a social media copywriter. Write ready-to-publish launch copy in the brand's voice."
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "## Business and launch");
    out.push_str(&ctx.describe());
    let _ = writeln!(out);
    write_task(&mut out, task);

    let _ = writeln!(out, "## Output");
    let _ = writeln!(out, "Respond with a single JSON object and nothing else:");
    let _ = writeln!(out, "{{");
    for key in &keys {
        let _ = writeln!(out, "  {},", platform_key_shape(key));
    }
    let _ = writeln!(out, "  \"visual_direction\": \"...\",");
    let _ = writeln!(out, "  \"cta_options\": [\"...\"],");
    let _ = writeln!(out, "  \"hashtags\": [\"...\"]");
    let _ = writeln!(out, "}}");
    if keys.is_empty() {
        let _ = writeln!(out, "No platforms are selected: do not include any platform keys.");
    } else {
        let _ = writeln!(
            out,
            "Only include these platform keys: {}. Do not add keys for other platforms.",
            keys.join(", ")
        );
    }

    out
}

/// Builds the copy prompt for a task
pub fn build_task_copy_prompt(ctx: &LaunchContext, task: &Task) -> TaskCopyPrompt {
    let mode = classify_copy_mode(task);
    let text = match mode {
        CopyMode::Strategy => strategy_prompt(ctx, task),
        CopyMode::Content => content_prompt(ctx, task),
    };

    TaskCopyPrompt { mode, text }
}
