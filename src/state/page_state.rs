/// Page state definitions for tracking discovery progress
///
/// A page moves `Queued → Fetched → ArtifactStripped → LinkExtracted → Stored`
/// or leaves the queue through one of the terminal skip/failure states.
use std::fmt;

/// Represents the current state of a page in the discovery process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PageState {
    // ===== Active States =====
    /// Page is waiting in the work queue
    Queued,

    /// Raw page content was retrieved from the archive
    Fetched,

    /// Archive toolbar, scripts and wrapped URLs were removed
    ArtifactStripped,

    /// Asset references and page links were extracted
    LinkExtracted,

    // ===== Terminal Success States =====
    /// Page was recorded and registered in the URL table
    Stored,

    /// Page maps to a local path another stored page already owns
    Aliased,

    // ===== Terminal Skip States =====
    /// Page is not on the mirrored site
    OffSite,

    // ===== Terminal Error States =====
    /// Archive returned no content for the page
    FetchFailed,
}

impl PageState {
    /// Returns true if this is a terminal state (no further processing needed)
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Stored | Self::Aliased | Self::OffSite | Self::FetchFailed
        )
    }

    /// Returns true if a page in this state may move to `next`
    pub fn can_transition_to(&self, next: PageState) -> bool {
        if self.is_terminal() {
            return false;
        }
        matches!(
            (self, next),
            (
                Self::Queued,
                Self::Fetched | Self::FetchFailed | Self::OffSite | Self::Aliased
            ) | (Self::Fetched, Self::ArtifactStripped)
                | (Self::ArtifactStripped, Self::LinkExtracted)
                | (Self::LinkExtracted, Self::Stored)
        )
    }

    /// Short lowercase name used in logs and summaries
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Fetched => "fetched",
            Self::ArtifactStripped => "artifact_stripped",
            Self::LinkExtracted => "link_extracted",
            Self::Stored => "stored",
            Self::Aliased => "aliased",
            Self::OffSite => "off_site",
            Self::FetchFailed => "fetch_failed",
        }
    }
}

impl fmt::Display for PageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_terminal() {
        assert!(!PageState::Queued.is_terminal());
        assert!(!PageState::Fetched.is_terminal());
        assert!(!PageState::ArtifactStripped.is_terminal());
        assert!(!PageState::LinkExtracted.is_terminal());

        assert!(PageState::Stored.is_terminal());
        assert!(PageState::Aliased.is_terminal());
        assert!(PageState::OffSite.is_terminal());
        assert!(PageState::FetchFailed.is_terminal());
    }

    #[test]
    fn test_happy_path_transitions() {
        let path = [
            PageState::Queued,
            PageState::Fetched,
            PageState::ArtifactStripped,
            PageState::LinkExtracted,
            PageState::Stored,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_invalid_transitions() {
        assert!(!PageState::Queued.can_transition_to(PageState::Stored));
        assert!(!PageState::Fetched.can_transition_to(PageState::LinkExtracted));
        assert!(!PageState::Stored.can_transition_to(PageState::Queued));
        assert!(!PageState::FetchFailed.can_transition_to(PageState::Fetched));
    }

    #[test]
    fn test_display() {
        assert_eq!(PageState::ArtifactStripped.to_string(), "artifact_stripped");
        assert_eq!(PageState::OffSite.to_string(), "off_site");
    }
}
