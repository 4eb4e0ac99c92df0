use serde::{Deserialize, Serialize};

/// One utterance in a step's conversation transcript.
///
/// The tracker never talks to the conversational agent itself; it records
/// the role-tagged transcript that the conversation service hands back so a
/// session can be resumed with its dialogue history intact.
///
/// # Examples
///
/// ```
/// use storypath::message::Message;
///
/// let question = Message::agent("What is your hero's name?");
/// let answer = Message::user("Луна the space cat!");
///
/// assert!(question.has_role(Message::AGENT));
/// assert!(answer.has_role(Message::USER));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Message {
    /// Who said it: `"user"`, `"agent"`, or `"system"`.
    pub role: String,
    /// The utterance text.
    pub content: String,
}

impl Message {
    /// The child (or caregiver) speaking into the widget.
    pub const USER: &'static str = "user";
    /// The external conversational agent conducting the step.
    pub const AGENT: &'static str = "agent";
    /// Instructions or notices injected around the dialogue.
    pub const SYSTEM: &'static str = "system";

    /// Creates a message with an arbitrary role.
    #[must_use]
    pub fn new(role: &str, content: &str) -> Self {
        Self {
            role: role.to_string(),
            content: content.to_string(),
        }
    }

    /// Creates a user utterance.
    #[must_use]
    pub fn user(content: &str) -> Self {
        Self::new(Self::USER, content)
    }

    /// Creates an agent utterance.
    #[must_use]
    pub fn agent(content: &str) -> Self {
        Self::new(Self::AGENT, content)
    }

    /// Creates a system message.
    #[must_use]
    pub fn system(content: &str) -> Self {
        Self::new(Self::SYSTEM, content)
    }

    /// Returns `true` if this message carries the given role.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.role == role
    }
}
