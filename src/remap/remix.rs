use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use super::{RemapAction, Remapper};
use crate::types::{ExtendedCategory, ReleaseBundle};

static REMIX_TITLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(remix(es|ed)?|rmx|rework(ed)?|re-edit|vip\s+mix|flip)\b")
        .expect("remix title pattern is valid")
});

/// Remix releases in any native group.
pub struct RemixRemapper;

impl RemixRemapper {
    pub fn has_remix_title(title: &str) -> bool {
        REMIX_TITLE.is_match(title)
    }

    /// A release is a remix if its title says so, or if every one of its
    /// tracks does.
    pub fn is_remix(bundle: &ReleaseBundle) -> bool {
        Self::has_remix_title(&bundle.release.name)
            || (!bundle.tracks.is_empty()
                && bundle.tracks.iter().all(|t| Self::has_remix_title(&t.name)))
    }
}

#[async_trait]
impl Remapper for RemixRemapper {
    fn target_category(&self) -> ExtendedCategory {
        ExtendedCategory::Remix
    }

    fn applies_to(&self, source: ExtendedCategory) -> bool {
        matches!(
            source,
            ExtendedCategory::Album
                | ExtendedCategory::Single
                | ExtendedCategory::Compilation
                | ExtendedCategory::AppearsOn
        )
    }

    async fn classify(&self, bundle: &ReleaseBundle) -> RemapAction {
        if Self::is_remix(bundle) {
            RemapAction::Remap
        } else {
            RemapAction::None
        }
    }
}
