/// Parsing and scheduling of LLM output
///
/// Completions are expected to be a JSON object, but models routinely wrap it
/// in code fences or lead with a sentence of prose. [`extract_json_object`]
/// finds the outermost object before deserializing.
///
/// Scheduling turns generated tasks into insertable [`NewTask`] rows: sorted
/// by `day_offset`, due at noon UTC on `start + day_offset`, with canonical
/// beat codes and sequential order.

use super::task_copy_prompt::CopyMode;
use super::templates::LaunchTemplate;
use crate::models::task::NewTask;
use chrono::{Days, NaiveDate, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Error parsing a completion
#[derive(Debug, thiserror::Error)]
pub enum PlanParseError {
    /// No `{ ... }` found in the completion
    #[error("Completion did not contain a JSON object")]
    NoJson,

    /// JSON found but did not match the expected shape
    #[error("Completion JSON did not match the expected shape: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Parsed fine but produced nothing usable
    #[error("Completion contained no tasks")]
    Empty,
}

/// One task as returned by the planner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedTask {
    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub category: Option<String>,

    #[serde(default)]
    pub phase: Option<String>,

    #[serde(default, deserialize_with = "lenient_platform")]
    pub platform: Option<String>,

    /// Days after launch start; accepts integers, floats and numeric strings
    #[serde(default, alias = "dayOffset", deserialize_with = "lenient_offset")]
    pub day_offset: i64,

    #[serde(default, alias = "beatCode")]
    pub beat_code: Option<String>,
}

/// A full plan as returned by the planner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedPlan {
    #[serde(default)]
    pub summary: Option<String>,

    pub tasks: Vec<GeneratedTask>,
}

fn lenient_offset<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.round() as i64))
            .unwrap_or(0),
        Value::String(s) => s.trim().parse::<f64>().map(|f| f.round() as i64).unwrap_or(0),
        _ => 0,
    })
}

fn lenient_platform<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("null") && !s.eq_ignore_ascii_case("none")))
}

/// Finds the outermost JSON object in a completion
pub fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}

/// Parses a full-plan completion
pub fn parse_generated_plan(raw: &str) -> Result<GeneratedPlan, PlanParseError> {
    let json = extract_json_object(raw).ok_or(PlanParseError::NoJson)?;
    let mut plan: GeneratedPlan = serde_json::from_str(json)?;

    plan.tasks.retain(|t| !t.title.trim().is_empty());
    if plan.tasks.is_empty() {
        return Err(PlanParseError::Empty);
    }

    Ok(plan)
}

/// Parses a single-task completion
///
/// Accepts either a bare task object or one wrapped as `{"task": {...}}`.
pub fn parse_generated_task(raw: &str) -> Result<GeneratedTask, PlanParseError> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Shape {
        Wrapped { task: GeneratedTask },
        Bare(GeneratedTask),
    }

    let json = extract_json_object(raw).ok_or(PlanParseError::NoJson)?;
    let task = match serde_json::from_str::<Shape>(json) {
        Ok(Shape::Wrapped { task }) | Ok(Shape::Bare(task)) => task,
        Err(_) => serde_json::from_str::<GeneratedTask>(json)?,
    };

    if task.title.trim().is_empty() {
        return Err(PlanParseError::Empty);
    }

    Ok(task)
}

/// Normalizes copy output before it is stored as a task outline
///
/// Content copy must be a JSON object and is re-serialized pretty-printed.
/// Strategy copy is stored as text with surrounding code fences removed.
pub fn normalize_copy_output(mode: CopyMode, raw: &str) -> Result<String, PlanParseError> {
    match mode {
        CopyMode::Content => {
            let json = extract_json_object(raw).ok_or(PlanParseError::NoJson)?;
            let value: Value = serde_json::from_str(json)?;
            if !value.is_object() {
                return Err(PlanParseError::NoJson);
            }
            Ok(serde_json::to_string_pretty(&value)?)
        }
        CopyMode::Strategy => {
            let text = raw
                .trim()
                .trim_start_matches("```html")
                .trim_start_matches("```")
                .trim_end_matches("```")
                .trim();
            if text.is_empty() {
                return Err(PlanParseError::Empty);
            }
            Ok(text.to_string())
        }
    }
}

/// Default publish time for scheduled tasks (UTC)
pub fn default_due_time() -> NaiveTime {
    NaiveTime::from_hms_opt(12, 0, 0).unwrap_or_default()
}

/// Converts one generated task to an insertable row
///
/// `sort_order` is left at zero; the caller assigns it.
pub fn to_new_task(
    task: GeneratedTask,
    start: NaiveDate,
    template: Option<&LaunchTemplate>,
) -> NewTask {
    let offset = task.day_offset.max(0) as u64;
    let due_date = start
        .checked_add_days(Days::new(offset))
        .map(|d| d.and_time(default_due_time()).and_utc());

    let beat_code = match template {
        Some(template) => template
            .canonical_beat_code(task.beat_code.as_deref(), task.phase.as_deref())
            .map(str::to_string),
        None => task
            .beat_code
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty()),
    };

    NewTask {
        title: task.title.trim().to_string(),
        description: task.description,
        category: task.category.map(|c| c.trim().to_lowercase()),
        phase: task.phase,
        platform: task.platform,
        due_date,
        post_time: None,
        outline: None,
        ai_generated: true,
        beat_code,
        sort_order: 0,
    }
}

/// Orders and schedules a generated plan
///
/// Tasks are stably sorted by `day_offset` and numbered from 1.
pub fn schedule_generated_tasks(
    mut tasks: Vec<GeneratedTask>,
    start: NaiveDate,
    template: Option<&LaunchTemplate>,
) -> Vec<NewTask> {
    tasks.sort_by_key(|t| t.day_offset);

    tasks
        .into_iter()
        .enumerate()
        .map(|(i, task)| NewTask {
            sort_order: i as i32 + 1,
            ..to_new_task(task, start, template)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planning::templates::find_template;
    use chrono::{TimeZone, Utc};

    const PLAN: &str = r#"Sure! Here is your plan:
```json
{
  "summary": "Two weeks of teasing, then a loud drop.",
  "tasks": [
    {"title": "Drop announcement", "phase": "Launch", "platform": "Instagram", "day_offset": 14, "beat_code": "drop_day"},
    {"title": "Research audience", "phase": "Research & Setup", "platform": null, "day_offset": 0, "beat_code": "research"},
    {"title": "Teaser reel", "category": "Content", "phase": "Pre-Launch", "platform": "none", "dayOffset": "5", "beat_code": "Teaser Campaign"}
  ]
}
```"#;

    #[test]
    fn test_extract_json_object() {
        assert_eq!(extract_json_object("x {\"a\":1} y"), Some("{\"a\":1}"));
        assert_eq!(extract_json_object("no json"), None);
        assert_eq!(extract_json_object("} backwards {"), None);
    }

    #[test]
    fn test_parse_generated_plan_tolerates_prose_and_fences() {
        let plan = parse_generated_plan(PLAN).unwrap();

        assert_eq!(plan.summary.as_deref(), Some("Two weeks of teasing, then a loud drop."));
        assert_eq!(plan.tasks.len(), 3);
        assert_eq!(plan.tasks[2].day_offset, 5);
        assert_eq!(plan.tasks[1].platform, None);
        assert_eq!(plan.tasks[2].platform, None);
    }

    #[test]
    fn test_parse_generated_plan_errors() {
        assert!(matches!(parse_generated_plan("nothing here"), Err(PlanParseError::NoJson)));
        assert!(matches!(
            parse_generated_plan(r#"{"items": []}"#),
            Err(PlanParseError::Malformed(_))
        ));
        assert!(matches!(
            parse_generated_plan(r#"{"tasks": [{"title": "  "}]}"#),
            Err(PlanParseError::Empty)
        ));
    }

    #[test]
    fn test_parse_generated_task_shapes() {
        let bare = parse_generated_task(r#"{"title": "New teaser", "day_offset": 3.6}"#).unwrap();
        assert_eq!(bare.title, "New teaser");
        assert_eq!(bare.day_offset, 4);

        let wrapped = parse_generated_task(r#"{"task": {"title": "Wrapped"}}"#).unwrap();
        assert_eq!(wrapped.title, "Wrapped");
    }

    #[test]
    fn test_schedule_sorts_and_numbers() {
        let plan = parse_generated_plan(PLAN).unwrap();
        let template = find_template("product-launch");
        let start = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();

        let tasks = schedule_generated_tasks(plan.tasks, start, template);

        let titles: Vec<_> = tasks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["Research audience", "Teaser reel", "Drop announcement"]);
        assert_eq!(tasks.iter().map(|t| t.sort_order).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert!(tasks.iter().all(|t| t.ai_generated));

        assert_eq!(tasks[1].beat_code.as_deref(), Some("teaser"));
        assert_eq!(tasks[2].beat_code.as_deref(), Some("drop-day"));
        assert_eq!(tasks[1].category.as_deref(), Some("content"));
        assert_eq!(
            tasks[2].due_date,
            Some(Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_negative_offset_clamped_to_start() {
        let task = GeneratedTask {
            title: "Early".to_string(),
            description: None,
            category: None,
            phase: None,
            platform: None,
            day_offset: -3,
            beat_code: Some(" custom-beat ".to_string()),
        };
        let start = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let new_task = to_new_task(task, start, None);

        assert_eq!(
            new_task.due_date,
            Some(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap())
        );
        assert_eq!(new_task.beat_code.as_deref(), Some("custom-beat"));
    }

    #[test]
    fn test_normalize_copy_output() {
        let content = normalize_copy_output(CopyMode::Content, "```json\n{\"hashtags\": [\"#glow\"]}\n```").unwrap();
        assert!(content.contains("\"hashtags\""));
        assert!(normalize_copy_output(CopyMode::Content, "plain text").is_err());

        let strategy = normalize_copy_output(CopyMode::Strategy, "```\n<b>Summary</b>\n\n- Do it\n```").unwrap();
        assert_eq!(strategy, "<b>Summary</b>\n\n- Do it");
        assert!(matches!(
            normalize_copy_output(CopyMode::Strategy, "   "),
            Err(PlanParseError::Empty)
        ));
    }
}
