use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use super::{RemapAction, Remapper};
use crate::types::{ExtendedCategory, ReleaseBundle};

static EP_TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bE\W?P\b").expect("EP title pattern is valid"));

const MIN_TRACKS: usize = 5;
const MIN_DURATION_MS: u64 = 20 * 60 * 1000;
const SHORT_MIN_TRACKS: usize = 3;
const SHORT_MIN_DURATION_MS: u64 = 10 * 60 * 1000;

/// Singles that are really EPs.
pub struct EpRemapper;

impl EpRemapper {
    pub fn is_ep(bundle: &ReleaseBundle) -> bool {
        let tracks = bundle.tracks.len();
        let duration = bundle.total_duration_ms();

        EP_TITLE.is_match(&bundle.release.name)
            || tracks >= MIN_TRACKS
            || duration >= MIN_DURATION_MS
            || (tracks >= SHORT_MIN_TRACKS && duration >= SHORT_MIN_DURATION_MS)
    }
}

#[async_trait]
impl Remapper for EpRemapper {
    fn target_category(&self) -> ExtendedCategory {
        ExtendedCategory::Ep
    }

    fn applies_to(&self, source: ExtendedCategory) -> bool {
        source == ExtendedCategory::Single
    }

    async fn classify(&self, bundle: &ReleaseBundle) -> RemapAction {
        if Self::is_ep(bundle) {
            RemapAction::Remap
        } else {
            RemapAction::None
        }
    }
}
