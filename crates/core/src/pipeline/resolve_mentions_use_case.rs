use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::resolution::domain::entity::{Mention, Resolution, ResolvedEntity, UnresolvedReason};
use crate::resolution::domain::entity_resolver::EntityResolver;
use crate::shared::warning::Warning;

use super::pipeline_logger::PipelineLogger;

/// Per-job resolution results, in mention order.
#[derive(Debug, Clone, PartialEq)]
pub struct MentionReport {
    pub resolutions: Vec<Resolution>,
    pub persisted: usize,
    pub warnings: Vec<Warning>,
}

impl MentionReport {
    pub fn entities(&self) -> impl Iterator<Item = &ResolvedEntity> {
        self.resolutions.iter().filter_map(Resolution::entity)
    }

    pub fn unresolved(&self) -> usize {
        self.resolutions.iter().filter(|r| !r.is_resolved()).count()
    }
}

/// Resolves a job's extracted mentions one at a time.
///
/// Cancellation is checked between mentions. Unresolved and ambiguous
/// mentions become warnings; their text is left for the caller to keep.
/// Lookups skipped by an exhausted request budget are reported once, as a
/// count.
pub struct ResolveMentionsUseCase {
    resolver: Arc<EntityResolver>,
    cancelled: Arc<AtomicBool>,
}

impl ResolveMentionsUseCase {
    pub fn new(resolver: Arc<EntityResolver>, cancelled: Option<Arc<AtomicBool>>) -> Self {
        Self {
            resolver,
            cancelled: cancelled.unwrap_or_else(|| Arc::new(AtomicBool::new(false))),
        }
    }

    pub fn execute(&self, mentions: &[Mention], logger: &mut dyn PipelineLogger) -> MentionReport {
        let started = Instant::now();
        let total = mentions.len();
        let mut resolutions = Vec::with_capacity(total);
        let mut warnings = Vec::new();
        let mut persisted = 0;
        let mut budget_skipped = 0;

        for mention in mentions {
            if self.cancelled.load(Ordering::Relaxed) {
                log::info!("Resolution cancelled after {}/{total} mentions", resolutions.len());
                warnings.push(Warning::Cancelled {
                    completed: resolutions.len(),
                    total,
                });
                break;
            }

            let report = self.resolver.resolve_with_report(mention);
            if report.persisted {
                persisted += 1;
            }
            warnings.extend(report.warnings);
            match &report.resolution {
                Resolution::Resolved(_) => {}
                Resolution::Unresolved {
                    reason: UnresolvedReason::BudgetExhausted,
                    ..
                } => budget_skipped += 1,
                Resolution::Unresolved {
                    mention,
                    reason: UnresolvedReason::Ambiguous { candidates },
                } => warnings.push(Warning::AmbiguousMention {
                    mention: mention.clone(),
                    candidates: candidates.clone(),
                }),
                Resolution::Unresolved { mention, reason } => {
                    warnings.push(Warning::UnresolvedMention {
                        mention: mention.clone(),
                        reason: reason.to_string(),
                    })
                }
            }
            resolutions.push(report.resolution);
            logger.progress(resolutions.len(), total);
        }

        if budget_skipped > 0 {
            warnings.push(Warning::RequestBudgetExhausted {
                skipped: budget_skipped,
            });
        }

        let report = MentionReport {
            resolutions,
            persisted,
            warnings,
        };
        logger.timing("resolve", started.elapsed().as_secs_f64() * 1000.0);
        logger.metric("unresolved", report.unresolved() as f64);
        logger.metric("persisted", persisted as f64);
        report
    }
}
