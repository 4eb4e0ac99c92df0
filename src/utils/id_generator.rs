//! Session id generation.

use uuid::Uuid;

/// Generates the opaque ids used to key sessions in storage.
///
/// # Examples
///
/// ```rust
/// use storypath::utils::id_generator::IdGenerator;
///
/// let id = IdGenerator::new().generate_session_id();
/// assert!(id.starts_with("session-"));
/// ```
#[derive(Clone, Debug, Default)]
pub struct IdGenerator;

impl IdGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// A fresh session id, e.g. `session-67e55044-10b1-426f-9247-bb680e5fe0c8`.
    #[must_use]
    pub fn generate_session_id(&self) -> String {
        format!("session-{}", Uuid::new_v4())
    }
}
