/// Launch template catalogue
///
/// Static, in-memory list of launch templates. A template is an ordered list
/// of beats: phase-anchored milestones with a default day offset from the
/// start of the launch window and the platforms they usually run on.
///
/// Templates seed the plan prompt and map generated tasks back to canonical
/// beat codes. They are never persisted.

use crate::models::launch::LaunchType;
use serde::Serialize;

/// One milestone of a template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Beat {
    /// Stable identifier, kebab-case
    pub code: &'static str,

    /// Display label
    pub label: &'static str,

    /// Phase the beat belongs to
    pub phase: &'static str,

    /// Days after the launch start this beat usually lands
    pub default_day_offset: u32,

    /// Platforms this beat is usually published on
    pub recommended_platforms: &'static [&'static str],
}

/// A named sequence of beats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LaunchTemplate {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub beats: &'static [Beat],
}

const PRODUCT_BEATS: &[Beat] = &[
    Beat {
        code: "research",
        label: "Audience & Offer Research",
        phase: "Research & Setup",
        default_day_offset: 0,
        recommended_platforms: &[],
    },
    Beat {
        code: "positioning",
        label: "Positioning & Messaging",
        phase: "Research & Setup",
        default_day_offset: 3,
        recommended_platforms: &[],
    },
    Beat {
        code: "teaser",
        label: "Teaser Campaign",
        phase: "Pre-Launch",
        default_day_offset: 7,
        recommended_platforms: &["Instagram", "TikTok"],
    },
    Beat {
        code: "waitlist",
        label: "Waitlist Push",
        phase: "Pre-Launch",
        default_day_offset: 11,
        recommended_platforms: &["Email", "Instagram"],
    },
    Beat {
        code: "behind-the-scenes",
        label: "Behind the Scenes",
        phase: "Pre-Launch",
        default_day_offset: 15,
        recommended_platforms: &["Instagram", "TikTok"],
    },
    Beat {
        code: "countdown",
        label: "Countdown",
        phase: "Launch Week",
        default_day_offset: 18,
        recommended_platforms: &["Instagram", "Email"],
    },
    Beat {
        code: "drop-day",
        label: "Drop Day",
        phase: "Launch",
        default_day_offset: 21,
        recommended_platforms: &["Instagram", "TikTok", "Email"],
    },
    Beat {
        code: "social-proof",
        label: "Follow-up & Social Proof",
        phase: "Post-Launch",
        default_day_offset: 25,
        recommended_platforms: &["Email", "Instagram"],
    },
];

const COURSE_BEATS: &[Beat] = &[
    Beat {
        code: "research",
        label: "Student Research",
        phase: "Research & Setup",
        default_day_offset: 0,
        recommended_platforms: &[],
    },
    Beat {
        code: "curriculum",
        label: "Curriculum Outline",
        phase: "Research & Setup",
        default_day_offset: 4,
        recommended_platforms: &[],
    },
    Beat {
        code: "lead-magnet",
        label: "Free Lesson / Lead Magnet",
        phase: "Pre-Launch",
        default_day_offset: 10,
        recommended_platforms: &["Email", "YouTube"],
    },
    Beat {
        code: "workshop",
        label: "Live Workshop",
        phase: "Pre-Launch",
        default_day_offset: 17,
        recommended_platforms: &["Email", "Instagram"],
    },
    Beat {
        code: "cart-open",
        label: "Cart Open",
        phase: "Launch",
        default_day_offset: 21,
        recommended_platforms: &["Email", "Instagram", "TikTok"],
    },
    Beat {
        code: "cart-close",
        label: "Cart Close",
        phase: "Launch",
        default_day_offset: 26,
        recommended_platforms: &["Email"],
    },
    Beat {
        code: "onboarding",
        label: "Student Onboarding",
        phase: "Post-Launch",
        default_day_offset: 28,
        recommended_platforms: &["Email"],
    },
];

const SERVICE_BEATS: &[Beat] = &[
    Beat {
        code: "research",
        label: "Client Research",
        phase: "Research & Setup",
        default_day_offset: 0,
        recommended_platforms: &[],
    },
    Beat {
        code: "offer",
        label: "Offer & Pricing",
        phase: "Research & Setup",
        default_day_offset: 3,
        recommended_platforms: &[],
    },
    Beat {
        code: "case-study",
        label: "Case Study",
        phase: "Pre-Launch",
        default_day_offset: 8,
        recommended_platforms: &["LinkedIn", "Email"],
    },
    Beat {
        code: "authority",
        label: "Authority Content",
        phase: "Pre-Launch",
        default_day_offset: 12,
        recommended_platforms: &["LinkedIn", "Instagram"],
    },
    Beat {
        code: "booking-open",
        label: "Booking Opens",
        phase: "Launch",
        default_day_offset: 18,
        recommended_platforms: &["Email", "LinkedIn"],
    },
    Beat {
        code: "testimonials",
        label: "Testimonials",
        phase: "Post-Launch",
        default_day_offset: 24,
        recommended_platforms: &["Instagram", "LinkedIn"],
    },
];

const TEMPLATES: &[LaunchTemplate] = &[
    LaunchTemplate {
        id: "product-launch",
        name: "Product Launch",
        description: "Tease, build a waitlist and drop a physical or digital product.",
        beats: PRODUCT_BEATS,
    },
    LaunchTemplate {
        id: "course-launch",
        name: "Course Launch",
        description: "Lead magnet, live workshop and an open/close cart window.",
        beats: COURSE_BEATS,
    },
    LaunchTemplate {
        id: "service-launch",
        name: "Service Launch",
        description: "Build authority with proof, then open bookings.",
        beats: SERVICE_BEATS,
    },
];

/// All catalogue templates, in display order
pub fn all_templates() -> &'static [LaunchTemplate] {
    TEMPLATES
}

/// Finds a template by ID
pub fn find_template(id: &str) -> Option<&'static LaunchTemplate> {
    TEMPLATES.iter().find(|t| t.id == id)
}

/// Default template for a launch type, if the catalogue has one
pub fn default_template_for(launch_type: LaunchType) -> Option<&'static LaunchTemplate> {
    match launch_type {
        LaunchType::Product => find_template("product-launch"),
        LaunchType::Course => find_template("course-launch"),
        LaunchType::Service => find_template("service-launch"),
        LaunchType::Other => None,
    }
}

fn normalize(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

impl LaunchTemplate {
    /// Finds a beat by exact code
    pub fn beat(&self, code: &str) -> Option<&'static Beat> {
        self.beats.iter().find(|b| b.code == code)
    }

    /// Maps a generated beat code and phase back to a canonical beat code
    ///
    /// Tries, in order: the normalized code, the normalized label, then the
    /// first beat whose phase matches. Returns `None` if nothing matches.
    pub fn canonical_beat_code(&self, raw_code: Option<&str>, phase: Option<&str>) -> Option<&'static str> {
        if let Some(raw) = raw_code.map(normalize).filter(|s| !s.is_empty()) {
            if let Some(beat) = self
                .beats
                .iter()
                .find(|b| b.code == raw || normalize(b.label) == raw)
            {
                return Some(beat.code);
            }
        }

        let phase = phase.map(normalize).filter(|s| !s.is_empty())?;
        self.beats
            .iter()
            .find(|b| normalize(b.phase) == phase)
            .map(|b| b.code)
    }

    /// Distinct phases in beat order
    pub fn phases(&self) -> Vec<&'static str> {
        let mut phases: Vec<&'static str> = Vec::new();
        for beat in self.beats {
            if !phases.contains(&beat.phase) {
                phases.push(beat.phase);
            }
        }
        phases
    }
}
