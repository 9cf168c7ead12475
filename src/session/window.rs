//! Context windower for prompt-mode requests.

use crate::types::Message;

/// Number of prior messages carried with each prompt-mode request.
pub const PRIOR_CONTEXT_MESSAGES: usize = 3;

/// Build the conversation window for a new user message.
///
/// Returns up to [`PRIOR_CONTEXT_MESSAGES`] of the most recent prior
/// messages, oldest first, followed by `new_message`. Only the message count
/// is bounded; content is never truncated.
pub fn conversation_window(prior: &[Message], new_message: Message) -> Vec<Message> {
    let start = prior.len().saturating_sub(PRIOR_CONTEXT_MESSAGES);
    let mut window = Vec::with_capacity(prior.len() - start + 1);
    window.extend_from_slice(&prior[start..]);
    window.push(new_message);
    window
}
