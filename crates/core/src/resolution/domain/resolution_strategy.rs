use super::entity::{Category, Mention, Resolution, UnresolvedReason};

/// Facts one stage hands to the stages after it.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionState {
    pub category: Category,
    /// Why the most recent stage declined, reported if nothing resolves.
    pub rejection: Option<UnresolvedReason>,
}

impl Default for ResolutionState {
    fn default() -> Self {
        Self {
            category: Category::Unknown,
            rejection: None,
        }
    }
}

/// One stage of the resolver cascade.
///
/// `None` passes the mention to the next stage. `Some` ends the cascade,
/// whether resolved or deliberately unresolved (for example ambiguous).
pub trait ResolutionStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn resolve(&self, mention: &Mention, state: &mut ResolutionState) -> Option<Resolution>;
}
