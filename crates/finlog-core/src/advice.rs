//! Narrow seam to an external text-generation capability.
//!
//! The advisor is loaded per call and dropped before the call returns.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{CoreError, CoreResult, FinanceReport, PeriodAnalysis};

/// Everything an [`AdvisorLoader`] needs to construct an advisor. Built from
/// the configured advice settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdviceOptions {
    pub model_path: PathBuf,
    pub default_system_prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// `0` lets the backend pick its own context size.
    pub n_ctx: u32,
    pub n_threads: u32,
}

pub trait Advisor {
    fn generate_advice(&mut self, report: &FinanceReport, system_prompt: &str)
        -> CoreResult<String>;
}

pub trait AdvisorLoader {
    fn load(&self, options: &AdviceOptions) -> CoreResult<Box<dyn Advisor>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptSource {
    Custom,
    Default,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdviceResponse {
    pub advice: String,
    pub prompt_source: PromptSource,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AdviceOutcome {
    NoData,
    Advice(AdviceResponse),
}

pub struct AdviceService;

impl AdviceService {
    /// Picks the system prompt: a non-blank override wins over the configured default.
    pub fn select_prompt<'a>(
        options: &'a AdviceOptions,
        prompt_override: Option<&'a str>,
    ) -> (&'a str, PromptSource) {
        match prompt_override {
            Some(prompt) if !prompt.trim().is_empty() => (prompt, PromptSource::Custom),
            _ => (options.default_system_prompt.as_str(), PromptSource::Default),
        }
    }

    pub fn advise(
        loader: &dyn AdvisorLoader,
        options: &AdviceOptions,
        analysis: &PeriodAnalysis,
        prompt_override: Option<&str>,
    ) -> CoreResult<AdviceOutcome> {
        let report = match analysis {
            PeriodAnalysis::NoData => {
                tracing::info!("no data for advice, advisor not loaded");
                return Ok(AdviceOutcome::NoData);
            }
            PeriodAnalysis::Report(report) => report,
        };

        let (system_prompt, prompt_source) = Self::select_prompt(options, prompt_override);
        tracing::info!(
            model = %options.model_path.display(),
            ?prompt_source,
            "loading advisor"
        );
        let mut advisor = loader.load(options).map_err(|err| match err {
            err @ CoreError::Advice(_) => err,
            other => CoreError::Advice(format!("failed to load advisor: {other}")),
        })?;
        let result = advisor.generate_advice(report, system_prompt);
        drop(advisor);
        tracing::debug!("advisor released");

        let advice = result.map_err(|err| match err {
            err @ CoreError::Advice(_) => err,
            other => CoreError::Advice(other.to_string()),
        })?;
        Ok(AdviceOutcome::Advice(AdviceResponse {
            advice,
            prompt_source,
        }))
    }
}

/// Renders the report into the user message handed to the advisor.
pub fn build_user_prompt(report: &FinanceReport) -> String {
    let structure = serde_json::to_string_pretty(&report.expenditure_structure)
        .unwrap_or_else(|_| "[]".into());

    let mut lines = vec![
        "Give three concrete suggestions for improving the finances below.".to_string(),
        String::new(),
        "[Key metrics]".to_string(),
        format!("- Total income: {}", report.metrics.total_income),
        format!("- Total expense: {}", report.metrics.total_expense),
        format!("- Savings rate: {}", report.metrics.savings_rate),
        String::new(),
        "[Expenditure structure]".to_string(),
        structure,
        String::new(),
        "[Anomalies and behaviour]".to_string(),
    ];
    if report.anomalies.is_empty() {
        lines.push("- Anomalies: none".to_string());
    } else {
        lines.extend(report.anomalies.iter().map(|anomaly| {
            format!(
                "- Anomaly: {} {} ({})",
                anomaly.category,
                anomaly.amount,
                anomaly.note.as_deref().unwrap_or("no note")
            )
        }));
    }
    let frequent: Vec<String> = report
        .consumption_behavior
        .high_frequency_categories
        .iter()
        .map(|entry| format!("{} x{}", entry.category, entry.count))
        .collect();
    lines.push(format!(
        "- High-frequency categories: {}",
        if frequent.is_empty() {
            "none".to_string()
        } else {
            frequent.join(", ")
        }
    ));
    let mut prompt = lines.join("\n");
    prompt.push('\n');
    prompt
}
