//! Decision state accumulator and result summary

use serde::{Deserialize, Serialize};

/// Mutable state threaded through one decision run.
///
/// Each stage writes exactly one field and no stage ever observes a field
/// written by a later stage. The instance is created fresh per run and
/// discarded once the summary has been extracted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecisionState {
    /// The original decision query from the caller
    query: String,

    /// Identified trigger for the decision (opportunity, problem, crisis)
    trigger: String,

    /// Root cause analysis of the trigger
    root_cause: String,

    /// What is in and out of scope for the decision
    scope: String,

    /// Initial drafted decision document
    draft: String,

    /// Goals and success metrics for the drafted decision
    goals: String,

    /// Additional information the draft still needs, or "none"
    information_needs: String,

    /// Retrieved complementary information (unset when the branch is skipped)
    retrieved_info: Option<String>,

    /// Draft revised with the retrieved information (unset when skipped)
    updated_draft: Option<String>,

    /// Generated alternative options
    alternatives: String,

    /// The selected decision option
    selected: String,

    /// Why the selected option won
    selected_comment: String,

    /// The runner-up option
    alternative: String,

    /// Why the runner-up is worth keeping in mind
    alternative_comment: String,
}

impl DecisionState {
    /// Create a fresh state for the given query
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn trigger(&self) -> &str {
        &self.trigger
    }

    pub fn root_cause(&self) -> &str {
        &self.root_cause
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn goals(&self) -> &str {
        &self.goals
    }

    pub fn information_needs(&self) -> &str {
        &self.information_needs
    }

    pub fn retrieved_info(&self) -> Option<&str> {
        self.retrieved_info.as_deref()
    }

    pub fn updated_draft(&self) -> Option<&str> {
        self.updated_draft.as_deref()
    }

    pub fn alternatives(&self) -> &str {
        &self.alternatives
    }

    pub fn selected(&self) -> &str {
        &self.selected
    }

    pub fn alternative(&self) -> &str {
        &self.alternative
    }

    /// The most recent draft: the updated one when the information branch
    /// ran, the original otherwise.
    pub fn current_draft(&self) -> &str {
        self.updated_draft.as_deref().unwrap_or(&self.draft)
    }

    /// Whether the information-needs answer asks for anything.
    ///
    /// An empty answer or one that amounts to "none" means the retrieval
    /// and update-draft stages are skipped. Evaluated once, never revisited.
    pub fn needs_more_information(&self) -> bool {
        let needs = self.information_needs.trim();
        !(needs.is_empty() || needs.to_lowercase().starts_with("none"))
    }

    // Setters, one per stage

    pub(crate) fn set_trigger(&mut self, value: String) {
        self.trigger = value;
    }

    pub(crate) fn set_root_cause(&mut self, value: String) {
        self.root_cause = value;
    }

    pub(crate) fn set_scope(&mut self, value: String) {
        self.scope = value;
    }

    pub(crate) fn set_draft(&mut self, value: String) {
        self.draft = value;
    }

    pub(crate) fn set_goals(&mut self, value: String) {
        self.goals = value;
    }

    pub(crate) fn set_information_needs(&mut self, value: String) {
        self.information_needs = value;
    }

    pub(crate) fn set_retrieved_info(&mut self, value: String) {
        self.retrieved_info = Some(value);
    }

    pub(crate) fn set_updated_draft(&mut self, value: String) {
        self.updated_draft = Some(value);
    }

    pub(crate) fn set_alternatives(&mut self, value: String) {
        self.alternatives = value;
    }

    pub(crate) fn set_selection(&mut self, selection: Selection) {
        self.selected = selection.selected_decision;
        self.selected_comment = selection.selected_decision_comment;
        self.alternative = selection.alternative_decision;
        self.alternative_comment = selection.alternative_decision_comment;
    }

    /// Flatten the final state into the persisted summary
    pub fn into_summary(self) -> DecisionSummary {
        DecisionSummary {
            selected_decision: self.selected,
            selected_decision_comment: self.selected_comment,
            alternative_decision: self.alternative,
            alternative_decision_comment: self.alternative_comment,
            trigger: self.trigger,
            root_cause: self.root_cause,
            scope: self.scope,
            draft: self.draft,
            goals: self.goals,
            information_needs: self.information_needs,
            retrieved_info: self.retrieved_info,
            updated_draft: self.updated_draft,
            alternatives: self.alternatives,
        }
    }
}

/// Structured output of the finishing selection stage
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Selection {
    /// The selected option for the decision
    pub selected_decision: String,

    /// Comment on the selection
    pub selected_decision_comment: String,

    /// The best alternative option
    pub alternative_decision: String,

    /// Comment on the alternative
    pub alternative_decision_comment: String,
}

/// Flattened summary of a completed run, stored in the run record.
///
/// Round-trips losslessly through serde_json; the two skippable fields are
/// absent (not empty) when the information branch did not run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DecisionSummary {
    pub selected_decision: String,
    pub selected_decision_comment: String,
    pub alternative_decision: String,
    pub alternative_decision_comment: String,
    pub trigger: String,
    pub root_cause: String,
    pub scope: String,
    pub draft: String,
    pub goals: String,
    pub information_needs: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub retrieved_info: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_draft: Option<String>,

    pub alternatives: String,
}
