//! Stop/resume command grammar matched against direct-message replies.

use crate::types::{CommandAction, CommandIntent, CommandScope, EvaluationContext};

/// Matches one message against the recognized stop/resume command set.
///
/// Matching is case-insensitive against the trimmed full message text;
/// partial or substring matches are not recognized. Principal-scoped
/// commands only match when the context carries a principal. Anything else
/// yields `None` and is ignored.
pub fn command_intent(text: &str, context: &EvaluationContext) -> Option<CommandIntent> {
    let trimmed = text.trim();
    let principal = context.principal.as_deref();
    let is = |pattern: &str| trimmed.eq_ignore_ascii_case(pattern);

    if is("resume") {
        return Some(intent(CommandAction::Resume, CommandScope::Global));
    }
    if let Some(principal) = principal {
        if is(&format!("resume principal={principal}")) {
            return Some(intent(CommandAction::Resume, CommandScope::ByPrincipal));
        }
    }
    if is(&format!("resume event={}", context.event.as_str())) {
        return Some(intent(CommandAction::Resume, CommandScope::ByEvent));
    }
    if is(&format!("resume state={}", context.state)) {
        return Some(intent(CommandAction::Resume, CommandScope::ByState));
    }
    if is("stop") {
        return Some(intent(CommandAction::Stop, CommandScope::Global));
    }
    if let Some(principal) = principal {
        if is(&format!("stop principal={principal}")) {
            return Some(intent(CommandAction::Stop, CommandScope::ByPrincipal));
        }
    }
    if is(&format!("stop event={}", context.event.as_str())) {
        return Some(intent(CommandAction::Stop, CommandScope::ByEvent));
    }
    if is(&format!("stop state={}", context.state)) {
        return Some(intent(CommandAction::Stop, CommandScope::ByState));
    }
    None
}

fn intent(action: CommandAction, scope: CommandScope) -> CommandIntent {
    CommandIntent { action, scope }
}
