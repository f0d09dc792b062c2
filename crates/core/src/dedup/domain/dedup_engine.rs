use crate::shared::sentence::word_count;
use crate::shared::settings::DedupSettings;
use crate::shared::warning::Warning;

use super::dedup_strategy::{DedupMode, DedupStrategy};
use super::exact_line_dedup::ExactLineDedup;
use super::marker_dedup::MarkerDedup;
use super::sentence_dedup::{BoundaryDedup, GeneralDedup};

/// Result of a dedup pass.
#[derive(Debug, Clone, PartialEq)]
pub struct DedupOutcome {
    pub text: String,
    /// Sentences or lines dropped; zero when the pass was rolled back.
    pub removed: usize,
    /// Fraction of words the strategy proposed to drop.
    pub removal_fraction: f64,
    /// False when the ceiling rejected the proposal.
    pub applied: bool,
    pub warnings: Vec<Warning>,
}

/// Runs a dedup strategy and enforces the removal ceiling.
///
/// If a pass would drop more than the configured fraction of the input's
/// words, the input is returned byte-for-byte and a warning is attached.
/// Callers may rely on this bound.
pub struct DedupEngine {
    boundary: BoundaryDedup,
    general: GeneralDedup,
    exact_line: ExactLineDedup,
    marker: MarkerDedup,
    max_removal_fraction: f64,
    marker_max_removal_fraction: f64,
}

impl DedupEngine {
    pub fn new(settings: &DedupSettings) -> Self {
        Self {
            boundary: BoundaryDedup::new(settings.boundary_threshold, settings.lookahead),
            general: GeneralDedup::new(settings.general_threshold),
            exact_line: ExactLineDedup,
            marker: MarkerDedup::new(settings.marker.clone()),
            max_removal_fraction: settings.max_removal_fraction,
            marker_max_removal_fraction: settings.marker_max_removal_fraction,
        }
    }

    pub fn dedupe(&self, text: &str, mode: DedupMode) -> DedupOutcome {
        let (strategy, ceiling): (&dyn DedupStrategy, f64) = match mode {
            DedupMode::Boundary => (&self.boundary, self.max_removal_fraction),
            DedupMode::General => (&self.general, self.max_removal_fraction),
            DedupMode::ExactLine => (&self.exact_line, self.max_removal_fraction),
            DedupMode::Marker => (&self.marker, self.marker_max_removal_fraction),
        };
        apply_with_ceiling(strategy, text, ceiling)
    }

    pub fn marker(&self) -> &MarkerDedup {
        &self.marker
    }
}

impl Default for DedupEngine {
    fn default() -> Self {
        Self::new(&DedupSettings::default())
    }
}

fn apply_with_ceiling(strategy: &dyn DedupStrategy, text: &str, ceiling: f64) -> DedupOutcome {
    let mode = strategy.mode();
    let pass = strategy.apply(text);
    let mut warnings = pass.warnings;

    if pass.removed == 0 {
        return DedupOutcome {
            text: text.to_string(),
            removed: 0,
            removal_fraction: 0.0,
            applied: true,
            warnings,
        };
    }

    let before = word_count(text);
    let after = word_count(&pass.text);
    let removal_fraction = if before == 0 {
        0.0
    } else {
        before.saturating_sub(after) as f64 / before as f64
    };

    if removal_fraction > ceiling {
        log::warn!(
            "{} dedup would remove {:.1}% of words (max {:.1}%); keeping original text",
            mode.as_str(),
            removal_fraction * 100.0,
            ceiling * 100.0
        );
        warnings.push(Warning::SafetyCeilingTripped {
            mode: mode.as_str(),
            removal_fraction,
            ceiling,
        });
        return DedupOutcome {
            text: text.to_string(),
            removed: 0,
            removal_fraction,
            applied: false,
            warnings,
        };
    }

    log::info!(
        "{} dedup removed {} segments ({:.1}% of words)",
        mode.as_str(),
        pass.removed,
        removal_fraction * 100.0
    );
    DedupOutcome {
        text: pass.text,
        removed: pass.removed,
        removal_fraction,
        applied: true,
        warnings,
    }
}
