//! Confirmation gate policy.

/// Importance of a confirmation gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptLevel {
    /// Informational checkpoint, usually skipped.
    Optional,
    /// Safety checkpoint before a commanded motion.
    Required,
}

impl PromptLevel {
    /// Lowercase identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Optional => "optional",
            Self::Required => "required",
        }
    }
}

/// Session-wide switch for confirmation gates.
///
/// A disabled gate passes through without suspending the queue.
///
/// # Example
///
/// ```
/// use manip_tasks::{PromptLevel, PromptPolicy};
///
/// let policy = PromptPolicy::default();
/// assert!(!policy.is_enabled(PromptLevel::Optional));
/// assert!(policy.is_enabled(PromptLevel::Required));
///
/// assert!(!PromptPolicy::unattended().is_enabled(PromptLevel::Required));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PromptPolicy {
    /// Whether optional gates ask.
    pub optional_enabled: bool,
    /// Whether required gates ask.
    pub required_enabled: bool,
}

impl Default for PromptPolicy {
    fn default() -> Self {
        Self {
            optional_enabled: false,
            required_enabled: true,
        }
    }
}

impl PromptPolicy {
    /// Every gate asks.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            optional_enabled: true,
            required_enabled: true,
        }
    }

    /// No gate asks.
    #[must_use]
    pub const fn unattended() -> Self {
        Self {
            optional_enabled: false,
            required_enabled: false,
        }
    }

    /// Sets whether optional gates ask.
    #[must_use]
    pub const fn with_optional(mut self, enabled: bool) -> Self {
        self.optional_enabled = enabled;
        self
    }

    /// Sets whether required gates ask.
    #[must_use]
    pub const fn with_required(mut self, enabled: bool) -> Self {
        self.required_enabled = enabled;
        self
    }

    /// Returns `true` if gates of `level` ask.
    #[must_use]
    pub const fn is_enabled(&self, level: PromptLevel) -> bool {
        match level {
            PromptLevel::Optional => self.optional_enabled,
            PromptLevel::Required => self.required_enabled,
        }
    }
}

/// Interprets an operator answer. Only `y` (any case, surrounding
/// whitespace ignored) means yes.
///
/// # Example
///
/// ```
/// use manip_tasks::parse_answer;
///
/// assert!(parse_answer(" Y\n"));
/// assert!(!parse_answer("yes"));
/// assert!(!parse_answer(""));
/// ```
#[must_use]
pub fn parse_answer(input: &str) -> bool {
    input.trim().eq_ignore_ascii_case("y")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_builders() {
        let policy = PromptPolicy::unattended().with_optional(true);
        assert!(policy.is_enabled(PromptLevel::Optional));
        assert!(!policy.is_enabled(PromptLevel::Required));
        assert_eq!(PromptPolicy::all().with_required(false), policy);
    }

    #[test]
    fn test_parse_answer_rejects_anything_else() {
        for answer in ["n", "N", "no", "yy", "1", "ok"] {
            assert!(!parse_answer(answer), "{answer:?} should decline");
        }
        assert!(parse_answer("y"));
    }
}
