//! Viewer - セッションの閲覧者（特権の有無）

use serde::{Deserialize, Serialize};

/// Who is looking at the view.
///
/// Privileged viewers hold an auth token: they see unapproved comments and
/// get the moderation actions. Fixed for the lifetime of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Viewer {
    privileged: bool,
}

impl Viewer {
    /// Derive the identity from the channel token, if any. Blank tokens do not count.
    pub fn from_token(token: Option<&str>) -> Self {
        Self {
            privileged: token.is_some_and(|t| !t.trim().is_empty()),
        }
    }

    pub fn privileged() -> Self {
        Self { privileged: true }
    }

    pub fn anonymous() -> Self {
        Self { privileged: false }
    }

    pub fn is_privileged(&self) -> bool {
        self.privileged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::no_token(None, false)]
    #[case::empty(Some(""), false)]
    #[case::blank(Some("   "), false)]
    #[case::token(Some("SFMyNTY.g3QAAAAC"), true)]
    fn privilege_comes_from_token(#[case] token: Option<&str>, #[case] privileged: bool) {
        assert_eq!(Viewer::from_token(token).is_privileged(), privileged);
    }
}
