/// Launch planning
///
/// Pure, deterministic building blocks around the LLM:
///
/// - [`templates`]: the static launch template catalogue
/// - [`launch_plan_prompt`]: full-plan and single-task prompts, runway bands
/// - [`task_copy_prompt`]: strategy/content copy prompts for one task
/// - [`generated`]: parsing and scheduling of LLM output
/// - [`health`]: plan health metrics from an in-memory task list
///
/// Nothing in this module touches the database or the network.

pub mod generated;
pub mod health;
pub mod launch_plan_prompt;
pub mod task_copy_prompt;
pub mod templates;

use crate::models::business_profile::BusinessProfile;
use crate::models::launch::{Launch, LaunchType};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Everything a prompt needs to know about the business and the launch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LaunchContext {
    pub company_name: String,
    pub brand_description: Option<String>,
    pub industry: Option<String>,
    pub target_audience: Option<String>,
    pub tone_of_voice: Option<String>,

    /// Platforms selected for this launch
    pub platforms: Vec<String>,

    pub launch_name: String,
    pub launch_description: Option<String>,
    pub launch_type: LaunchType,
    pub launch_start: Option<NaiveDate>,
    pub launch_end: Option<NaiveDate>,
    pub target_date: Option<NaiveDate>,
}

impl LaunchContext {
    /// Builds a context from stored rows
    ///
    /// The launch's own platform selection wins; the profile's platforms are
    /// used when the launch has none.
    pub fn from_parts(
        profile: Option<&BusinessProfile>,
        launch: &Launch,
        launch_platforms: Vec<String>,
    ) -> Self {
        let platforms = if launch_platforms.is_empty() {
            profile.map(|p| p.platforms.clone()).unwrap_or_default()
        } else {
            launch_platforms
        };

        LaunchContext {
            company_name: profile
                .map(|p| p.company_name.clone())
                .unwrap_or_else(|| "the business".to_string()),
            brand_description: profile.and_then(|p| p.brand_description.clone()),
            industry: profile.and_then(|p| p.industry.clone()),
            target_audience: profile.and_then(|p| p.target_audience.clone()),
            tone_of_voice: profile.and_then(|p| p.tone_of_voice.clone()),
            platforms,
            launch_name: launch.name.clone(),
            launch_description: launch.description.clone(),
            launch_type: launch.kind(),
            launch_start: launch.launch_start,
            launch_end: launch.launch_end,
            target_date: launch.target_date,
        }
    }

    /// Whether `platform` is part of the selection (case-insensitive)
    pub fn has_platform(&self, platform: &str) -> bool {
        self.platforms
            .iter()
            .any(|p| p.trim().eq_ignore_ascii_case(platform))
    }

    /// Renders the shared "about the business" block used by every prompt
    pub(crate) fn describe(&self) -> String {
        fn line(out: &mut String, label: &str, value: Option<&str>) {
            if let Some(v) = value.map(str::trim).filter(|v| !v.is_empty()) {
                out.push_str(&format!("- {}: {}\n", label, v));
            }
        }

        let mut out = String::new();
        line(&mut out, "Company", Some(&self.company_name));
        line(&mut out, "Brand", self.brand_description.as_deref());
        line(&mut out, "Industry", self.industry.as_deref());
        line(&mut out, "Target audience", self.target_audience.as_deref());
        line(&mut out, "Tone of voice", self.tone_of_voice.as_deref());
        line(&mut out, "Launch", Some(&self.launch_name));
        line(&mut out, "Launch type", Some(self.launch_type.as_str()));
        line(&mut out, "Launch description", self.launch_description.as_deref());

        let platforms = if self.platforms.is_empty() {
            "none selected".to_string()
        } else {
            self.platforms.join(", ")
        };
        line(&mut out, "Platforms", Some(&platforms));

        if let (Some(start), Some(end)) = (self.launch_start, self.launch_end) {
            out.push_str(&format!("- Launch window: {} to {}\n", start, end));
        }
        if let Some(target) = self.target_date {
            out.push_str(&format!("- Target launch date: {}\n", target));
        }

        out
    }
}
