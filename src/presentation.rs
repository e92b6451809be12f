use serde::Serialize;

use crate::config::PresentationConfig;
use crate::error::WorkflowError;
use crate::session::{AnalysisResult, UV_UNAVAILABLE};

pub const COLOR_INFO: &str = "#0080FF";
pub const COLOR_SUCCESS: &str = "#00B300";
pub const COLOR_ERROR: &str = "#FF0000";

/// One update of the user-visible status area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusEvent {
    pub message: String,
    pub color: String,
}

impl StatusEvent {
    pub fn new(message: impl Into<String>, color: Option<&str>) -> Self {
        Self {
            message: message.into(),
            color: color.unwrap_or(COLOR_INFO).to_string(),
        }
    }

    pub fn progress(message: impl Into<String>) -> Self {
        Self::new(message, Some(COLOR_INFO))
    }

    pub fn failure(error: &WorkflowError) -> Self {
        let color = match error {
            WorkflowError::Backend {
                color: Some(color), ..
            } => color.as_str(),
            _ => COLOR_ERROR,
        };
        Self::new(error.to_string(), Some(color))
    }
}

/// Renders a UV reading, substituting the unavailable sentinel.
pub fn format_uv_index(uv_index: Option<f64>, unavailable_text: &str) -> String {
    match uv_index {
        Some(uv) if uv != UV_UNAVAILABLE => format_number(uv),
        _ => unavailable_text.to_string(),
    }
}

// Whole numbers keep one decimal, as the backend prints them ("3.0").
fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresentedResult {
    pub message: String,
    pub color: String,
    pub uv_index: String,
    pub markup: String,
}

pub fn present(result: &AnalysisResult, config: &PresentationConfig) -> PresentedResult {
    let sentinel = result.uv_index.is_none_or(|uv| uv == UV_UNAVAILABLE);
    let markup = if sentinel {
        substitute_uv_line(&result.result_markup, config)
    } else {
        result.result_markup.clone()
    };
    PresentedResult {
        message: result.message.clone(),
        color: result.severity_color.clone(),
        uv_index: format_uv_index(result.uv_index, &config.unavailable_text),
        markup,
    }
}

/// Replaces the markup line that carries the UV label and the sentinel value
/// with `<label> <unavailable>`. Other lines are untouched.
fn substitute_uv_line(markup: &str, config: &PresentationConfig) -> String {
    let sentinel = format_number(UV_UNAVAILABLE);
    markup
        .split('\n')
        .map(|line| match line.find(&config.uv_label) {
            Some(start) if line[start..].contains(&sentinel) => {
                let replaced = line[start..].replacen(&sentinel, &config.unavailable_text, 1);
                format!("{}{}", &line[..start], replaced)
            }
            _ => line.to_string(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}
