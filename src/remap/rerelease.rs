use async_trait::async_trait;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use super::{RemapAction, Remapper};
use crate::{
    types::{ExtendedCategory, ReleaseBundle},
    utils,
};

static RERELEASE_TITLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(anniversary|re-?issue[ds]?|remaster(s|ed)?|re-?record(s|ed|ing)?|\d+\s+years?)\b",
    )
    .expect("re-release title pattern is valid")
});

/// Separates re-released albums from genuinely new ones.
///
/// Old albums reach this remapper because the date filter lets albums pass
/// when re-release separation is enabled. See [`rerelease_action`] for the
/// decision.
pub struct ReReleaseRemapper {
    market: String,
    today: NaiveDate,
    lookback_days: u32,
}

impl ReReleaseRemapper {
    pub fn new(market: String, today: NaiveDate, lookback_days: u32) -> Self {
        Self {
            market,
            today,
            lookback_days,
        }
    }

    pub fn has_rerelease_title(title: &str) -> bool {
        RERELEASE_TITLE.is_match(title)
    }
}

/// Decision table of the re-release remapper.
///
/// - `normal`: the title carries no reissue vocabulary
/// - `complete`: every track is playable in the configured market
/// - `recent`: the release date lies inside the lookback window
pub fn rerelease_action(normal: bool, complete: bool, recent: bool) -> RemapAction {
    match (normal, complete, recent) {
        (true, true, true) => RemapAction::None,
        (true, true, false) => RemapAction::Remap,
        (true, false, true) => RemapAction::None,
        (true, false, false) => RemapAction::Erase,
        (false, true, true) => RemapAction::Remap,
        (false, true, false) => RemapAction::Remap,
        (false, false, true) => RemapAction::Remap,
        (false, false, false) => RemapAction::Erase,
    }
}

#[async_trait]
impl Remapper for ReReleaseRemapper {
    fn target_category(&self) -> ExtendedCategory {
        ExtendedCategory::ReRelease
    }

    fn applies_to(&self, source: ExtendedCategory) -> bool {
        source == ExtendedCategory::Album
    }

    async fn classify(&self, bundle: &ReleaseBundle) -> RemapAction {
        let release = &bundle.release;
        let normal = !Self::has_rerelease_title(&release.name);
        let complete = bundle
            .tracks
            .iter()
            .all(|t| t.available_markets.contains(&self.market));
        let recent = utils::is_within_lookback(
            &release.release_date,
            release.date_precision,
            self.today,
            self.lookback_days,
        );

        rerelease_action(normal, complete, recent)
    }
}
