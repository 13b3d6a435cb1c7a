//! Decision stages: prompt assembly and state merging
//!
//! Each stage consumes the accumulated [`DecisionState`] and produces one
//! answer that is merged back into its designated field. The prompt for a
//! stage only ever references fields written by earlier stages.

use super::state::DecisionState;

/// The evaluator-gated stages of the decision workflow, in execution order.
///
/// `RetrieveInformation` and `UpdateDraft` only run when the
/// information-needs answer asks for something.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    IdentifyTrigger,
    AnalyzeRootCause,
    DefineScope,
    DraftDecision,
    EstablishGoals,
    IdentifyInformationNeeds,
    RetrieveInformation,
    UpdateDraft,
    GenerateAlternatives,
}

/// Stages that always run, before the optional information branch
pub const ANALYSIS_STAGES: [Stage; 6] = [
    Stage::IdentifyTrigger,
    Stage::AnalyzeRootCause,
    Stage::DefineScope,
    Stage::DraftDecision,
    Stage::EstablishGoals,
    Stage::IdentifyInformationNeeds,
];

/// The optional information branch
pub const RETRIEVAL_STAGES: [Stage; 2] = [Stage::RetrieveInformation, Stage::UpdateDraft];

impl Stage {
    /// Stable stage name, used in logs and error messages
    pub fn name(&self) -> &'static str {
        match self {
            Self::IdentifyTrigger => "identify_trigger",
            Self::AnalyzeRootCause => "analyze_root_cause",
            Self::DefineScope => "define_scope",
            Self::DraftDecision => "draft_decision",
            Self::EstablishGoals => "establish_goals",
            Self::IdentifyInformationNeeds => "identify_information_needs",
            Self::RetrieveInformation => "retrieve_information",
            Self::UpdateDraft => "update_draft",
            Self::GenerateAlternatives => "generate_alternatives",
        }
    }

    /// System prompt for the stage call
    pub fn system_prompt(&self) -> &'static str {
        match self {
            Self::IdentifyTrigger => {
                "You are a decision analyst. Identify what triggered the decision the \
                 user is facing: an opportunity, a problem, or a crisis. Answer with a \
                 short analysis of the trigger."
            }
            Self::AnalyzeRootCause => {
                "You are a decision analyst. Given a decision and its trigger, analyze \
                 the root cause behind the trigger using a technique such as 5 Whys. \
                 Answer with the root cause analysis."
            }
            Self::DefineScope => {
                "You are a decision analyst. Define the scope of the decision: what is \
                 in scope, what is out of scope, and which constraints apply."
            }
            Self::DraftDecision => {
                "You are a decision analyst. Draft a concise decision document from the \
                 analysis so far: the decision to make, the key considerations, and the \
                 recommended direction."
            }
            Self::EstablishGoals => {
                "You are a decision analyst. Establish the goals and success metrics \
                 for the drafted decision, in SMART form where possible."
            }
            Self::IdentifyInformationNeeds => {
                "You are a decision analyst. List the additional information still \
                 needed to make this decision well. If the draft is already \
                 self-contained, answer exactly 'none'."
            }
            Self::RetrieveInformation => {
                "You are a research assistant. Provide the requested complementary \
                 information for the decision as concretely as you can."
            }
            Self::UpdateDraft => {
                "You are a decision analyst. Revise the decision draft to incorporate \
                 the complementary information. Answer with the full updated draft."
            }
            Self::GenerateAlternatives => {
                "You are a decision analyst. Generate distinct, viable alternatives \
                 for the drafted decision, each with a short evaluation against the \
                 goals."
            }
        }
    }

    /// Build the stage prompt from the accumulated state.
    ///
    /// On a retry the evaluator's feedback is appended so the stage can
    /// correct its previous answer.
    pub fn prompt(&self, state: &DecisionState, feedback: Option<&str>) -> String {
        let mut prompt = String::new();

        match self {
            Self::IdentifyTrigger => {
                push_section(&mut prompt, "Decision requested by the user", state.query());
            }
            Self::AnalyzeRootCause => {
                push_section(&mut prompt, "Decision requested by the user", state.query());
                push_section(&mut prompt, "Identified trigger", state.trigger());
            }
            Self::DefineScope => {
                push_section(&mut prompt, "Decision requested by the user", state.query());
                push_section(&mut prompt, "Identified trigger", state.trigger());
                push_section(&mut prompt, "Root cause analysis", state.root_cause());
            }
            Self::DraftDecision => {
                push_section(&mut prompt, "Decision requested by the user", state.query());
                push_section(&mut prompt, "Identified trigger", state.trigger());
                push_section(&mut prompt, "Root cause analysis", state.root_cause());
                push_section(&mut prompt, "Scope definition", state.scope());
            }
            Self::EstablishGoals => {
                push_section(&mut prompt, "Drafted decision", state.draft());
            }
            Self::IdentifyInformationNeeds => {
                push_section(&mut prompt, "Drafted decision", state.draft());
                push_section(&mut prompt, "Established goals", state.goals());
            }
            Self::RetrieveInformation => {
                push_section(&mut prompt, "Drafted decision", state.draft());
                push_section(&mut prompt, "Information needed", state.information_needs());
            }
            Self::UpdateDraft => {
                push_section(&mut prompt, "Drafted decision", state.draft());
                if let Some(info) = state.retrieved_info() {
                    push_section(&mut prompt, "Complementary information", info);
                }
            }
            Self::GenerateAlternatives => {
                push_section(&mut prompt, "Decision draft", state.current_draft());
                push_section(&mut prompt, "Established goals", state.goals());
            }
        }

        if let Some(feedback) = feedback {
            prompt.push_str(
                "\nYour previous answer was rejected by review. Reviewer comments:\n",
            );
            prompt.push_str(feedback);
            prompt.push_str("\nPlease correct the answer.\n");
        }

        prompt
    }

    /// Build the evaluation prompt: the stage answer in its surrounding context
    pub fn evaluation_prompt(&self, state: &DecisionState, answer: &str) -> String {
        let mut prompt = String::new();

        push_section(&mut prompt, "Decision requested by the user", state.query());

        match self {
            Self::IdentifyTrigger => {}
            Self::AnalyzeRootCause => {
                push_section(&mut prompt, "Identified trigger", state.trigger());
            }
            Self::DefineScope => {
                push_section(&mut prompt, "Identified trigger", state.trigger());
                push_section(&mut prompt, "Root cause analysis", state.root_cause());
            }
            Self::DraftDecision => {
                push_section(&mut prompt, "Identified trigger", state.trigger());
                push_section(&mut prompt, "Root cause analysis", state.root_cause());
                push_section(&mut prompt, "Scope definition", state.scope());
            }
            Self::EstablishGoals | Self::IdentifyInformationNeeds | Self::UpdateDraft => {
                push_section(&mut prompt, "Drafted decision", state.draft());
            }
            Self::RetrieveInformation => {
                push_section(&mut prompt, "Drafted decision", state.draft());
                push_section(&mut prompt, "Information needed", state.information_needs());
            }
            Self::GenerateAlternatives => {
                push_section(&mut prompt, "Decision draft", state.current_draft());
            }
        }

        push_section(
            &mut prompt,
            &format!("Answer under review ({})", self.name()),
            answer,
        );

        prompt
    }

    /// Merge a passing answer into the state field this stage owns
    pub fn apply(&self, state: &mut DecisionState, answer: String) {
        match self {
            Self::IdentifyTrigger => state.set_trigger(answer),
            Self::AnalyzeRootCause => state.set_root_cause(answer),
            Self::DefineScope => state.set_scope(answer),
            Self::DraftDecision => state.set_draft(answer),
            Self::EstablishGoals => state.set_goals(answer),
            Self::IdentifyInformationNeeds => state.set_information_needs(answer),
            Self::RetrieveInformation => state.set_retrieved_info(answer),
            Self::UpdateDraft => state.set_updated_draft(answer),
            Self::GenerateAlternatives => state.set_alternatives(answer),
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

fn push_section(prompt: &mut String, label: &str, value: &str) {
    prompt.push_str(label);
    prompt.push_str(":\n");
    prompt.push_str(value);
    prompt.push_str("\n\n");
}
