/// Launch plan prompt
///
/// Builds the instruction string that asks the LLM for a complete, scheduled
/// task plan. The output contract is a JSON object `{ "summary": ..., "tasks": [...] }`.
///
/// The prompt states the constraints the plan must satisfy (task count for
/// the runway band, front-loading, beat coverage, ordering, platform rotation).
/// None of them are checked locally; see [`super::generated`] for parsing.

use super::templates::LaunchTemplate;
use super::LaunchContext;
use crate::models::task::Task;
use serde::Serialize;
use std::fmt::Write;

/// Launch length bucket used to size the plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunwayBand {
    /// Up to 21 days
    ShortSprint,

    /// 22 to 56 days
    MediumRunway,

    /// More than 56 days
    FullRunway,
}

impl RunwayBand {
    /// Buckets a launch window length; upper bounds are inclusive
    pub fn classify(runway_days: i64) -> Self {
        if runway_days <= 21 {
            RunwayBand::ShortSprint
        } else if runway_days <= 56 {
            RunwayBand::MediumRunway
        } else {
            RunwayBand::FullRunway
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RunwayBand::ShortSprint => "Short Sprint",
            RunwayBand::MediumRunway => "Medium Runway",
            RunwayBand::FullRunway => "Full Runway",
        }
    }

    /// Inclusive task-count range requested for this band
    pub fn task_range(&self) -> (u32, u32) {
        match self {
            RunwayBand::ShortSprint => (10, 15),
            RunwayBand::MediumRunway => (20, 25),
            RunwayBand::FullRunway => (30, 40),
        }
    }

    pub fn min_tasks(&self) -> u32 {
        self.task_range().0
    }
}

const TASK_SCHEMA: &str = r#"{
  "summary": "2-3 sentence overview of the plan",
  "tasks": [
    {
      "title": "Short imperative task title",
      "description": "What to do and why, 1-3 sentences",
      "category": "strategy | marketing | content | ops",
      "phase": "Phase name",
      "platform": "Platform name or null",
      "day_offset": 0,
      "beat_code": "beat code from the list above"
    }
  ]
}"#;

fn write_beats(out: &mut String, template: &LaunchTemplate) {
    let _ = writeln!(out, "Template: {} ({})", template.name, template.id);
    let _ = writeln!(out, "{}", template.description);
    let _ = writeln!(out);
    let _ = writeln!(out, "Beats (code | label | phase | default day offset | recommended platforms):");
    for beat in template.beats {
        let platforms = if beat.recommended_platforms.is_empty() {
            "-".to_string()
        } else {
            beat.recommended_platforms.join(", ")
        };
        let _ = writeln!(
            out,
            "- {} | {} | {} | day {} | {}",
            beat.code, beat.label, beat.phase, beat.default_day_offset, platforms
        );
    }
}

fn write_generic_structure(out: &mut String) {
    let _ = writeln!(out, "No template was selected. Structure the plan in these phases, in order:");
    let _ = writeln!(out, "- Research & Setup: audience, offer, positioning, tracking");
    let _ = writeln!(out, "- Pre-Launch: teasers, waitlist or lead capture, behind-the-scenes content");
    let _ = writeln!(out, "- Launch: announcement, launch-day content, direct outreach");
    let _ = writeln!(out, "- Post-Launch: follow-up, social proof, retrospective");
    let _ = writeln!(
        out,
        "Use a short kebab-case beat_code that names the milestone (e.g. \"teaser\", \"drop-day\")."
    );
}

/// Builds the full-plan prompt
///
/// `runway_days` is the length of the launch window; it selects the
/// [`RunwayBand`] and the midpoint used for front-loading.
pub fn build_launch_plan_prompt(
    ctx: &LaunchContext,
    runway_days: i64,
    template: Option<&LaunchTemplate>,
) -> String {
    let runway_days = runway_days.max(1);
    let band = RunwayBand::classify(runway_days);
    let (min_tasks, max_tasks) = band.task_range();
    let midpoint = runway_days / 2;

    let mut out = String::new();
    let _ = writeln!(
        out,
        "You are a launch strategist for small businesses. Create a day-by-day launch plan."
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "## Business and launch");
    out.push_str(&ctx.describe());
    let _ = writeln!(out);

    let _ = writeln!(out, "## Runway");
    let _ = writeln!(
        out,
        "The launch window is {} days: a {} plan of {} to {} tasks.",
        runway_days,
        band.label(),
        min_tasks,
        max_tasks
    );
    let _ = writeln!(out, "day_offset 0 is the first day of the window.");
    let _ = writeln!(out);

    let _ = writeln!(out, "## Structure");
    match template {
        Some(template) => write_beats(&mut out, template),
        None => write_generic_structure(&mut out),
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "## Requirements");
    let _ = writeln!(out, "1. Return at least {} tasks and no more than {}.", min_tasks, max_tasks);
    let _ = writeln!(
        out,
        "2. At least 60% of tasks must have a day_offset before day {} (the midpoint).",
        midpoint
    );
    if template.is_some() {
        let _ = writeln!(out, "3. Every beat_code listed above must appear on at least one task.");
    } else {
        let _ = writeln!(out, "3. Every phase listed above must appear on at least one task.");
    }
    let _ = writeln!(out, "4. Order tasks by ascending day_offset.");
    if ctx.platforms.is_empty() {
        let _ = writeln!(out, "5. Use platform null for every task; no platforms were selected.");
    } else {
        let _ = writeln!(
            out,
            "5. Only use these platforms: {}. Rotate between them so no platform gets two content tasks in a row when another is available.",
            ctx.platforms.join(", ")
        );
    }
    let _ = writeln!(
        out,
        "6. Write in the brand's tone of voice{}.",
        ctx.tone_of_voice
            .as_deref()
            .map(|t| format!(" ({})", t))
            .unwrap_or_default()
    );
    let _ = writeln!(out);

    let _ = writeln!(out, "## Output");
    let _ = writeln!(out, "Respond with a single JSON object and nothing else, matching:");
    out.push_str(TASK_SCHEMA);
    out.push('\n');

    out
}

/// Builds the prompt that replaces one task of an existing plan
///
/// The response contract is a single task object with the same fields as a
/// plan task.
pub fn build_regenerate_task_prompt(ctx: &LaunchContext, task: &Task, runway_days: i64) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "You are a launch strategist. Rewrite one task of an existing launch plan so it is more specific and actionable."
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "## Business and launch");
    out.push_str(&ctx.describe());
    let _ = writeln!(
        out,
        "- Runway: {} days ({})",
        runway_days.max(1),
        RunwayBand::classify(runway_days).label()
    );
    let _ = writeln!(out);

    let _ = writeln!(out, "## Current task");
    let _ = writeln!(out, "- Title: {}", task.title);
    if let Some(description) = task.description.as_deref() {
        let _ = writeln!(out, "- Description: {}", description);
    }
    if let Some(phase) = task.phase.as_deref() {
        let _ = writeln!(out, "- Phase: {}", phase);
    }
    if let Some(category) = task.category.as_deref() {
        let _ = writeln!(out, "- Category: {}", category);
    }
    if let Some(platform) = task.platform.as_deref() {
        let _ = writeln!(out, "- Platform: {}", platform);
    }
    if let Some(beat) = task.beat_code.as_deref() {
        let _ = writeln!(out, "- Beat: {}", beat);
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "## Requirements");
    let _ = writeln!(out, "- Keep the same phase and beat_code.");
    let _ = writeln!(out, "- Do not repeat the current title.");
    if !ctx.platforms.is_empty() {
        let _ = writeln!(out, "- platform must be one of: {}, or null.", ctx.platforms.join(", "));
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "## Output");
    let _ = writeln!(
        out,
        "Respond with a single JSON object and nothing else: {{\"title\", \"description\", \"category\", \"phase\", \"platform\", \"day_offset\", \"beat_code\"}}."
    );

    out
}
