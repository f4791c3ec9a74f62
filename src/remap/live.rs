use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use super::{RemapAction, Remapper};
use crate::{
    spotify::{Gateway, MAX_AUDIO_FEATURE_IDS, SpotifyApi},
    types::{ExtendedCategory, ReleaseBundle},
    warning,
};

static LIVE_TITLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\(live\)|\[live\]|\blive\s+(at|from|in|on)\b|-\s*live\b|\bunplugged\b|\blive\s+sessions?\b)")
        .expect("live title pattern is valid")
});

/// Mean liveness from which a release counts as recorded live.
pub const LIVENESS_THRESHOLD: f32 = 0.8;

/// Live recordings among albums, singles and compilations.
///
/// The title is checked first. When audio features are enabled, releases
/// with an unremarkable title are judged by the mean liveness of their tracks.
pub struct LiveRemapper {
    features: Option<(Arc<dyn SpotifyApi>, Gateway)>,
}

impl LiveRemapper {
    pub fn new(features: Option<(Arc<dyn SpotifyApi>, Gateway)>) -> Self {
        Self { features }
    }

    pub fn has_live_title(title: &str) -> bool {
        LIVE_TITLE.is_match(title)
    }

    async fn mean_liveness(&self, bundle: &ReleaseBundle) -> Option<f32> {
        let (api, gateway) = self.features.as_ref()?;
        let ids = bundle.tracks.iter().map(|t| t.id.clone()).collect::<Vec<_>>();

        let mut total = 0.0;
        let mut count = 0;
        for chunk in ids.chunks(MAX_AUDIO_FEATURE_IDS) {
            match gateway.call(|| api.get_audio_features(chunk)).await {
                Ok(features) => {
                    total += features.iter().map(|f| f.liveness).sum::<f32>();
                    count += features.len();
                }
                Err(e) => {
                    warning!("No audio features for '{}': {}", bundle.release.name, e);
                    return None;
                }
            }
        }

        (count > 0).then(|| total / count as f32)
    }
}

#[async_trait]
impl Remapper for LiveRemapper {
    fn target_category(&self) -> ExtendedCategory {
        ExtendedCategory::Live
    }

    fn applies_to(&self, source: ExtendedCategory) -> bool {
        matches!(
            source,
            ExtendedCategory::Album | ExtendedCategory::Single | ExtendedCategory::Compilation
        )
    }

    async fn classify(&self, bundle: &ReleaseBundle) -> RemapAction {
        if Self::has_live_title(&bundle.release.name) {
            return RemapAction::Remap;
        }

        match self.mean_liveness(bundle).await {
            Some(liveness) if liveness >= LIVENESS_THRESHOLD => RemapAction::Remap,
            _ => RemapAction::None,
        }
    }
}
