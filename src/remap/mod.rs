//! # Remapping Engine
//!
//! Spotify only knows four album groups. The remappers refine them into the
//! extended categories EP, remix, live and re-release before routing:
//!
//! ```text
//! album ─┐
//! single ├─ ReRelease → Remix → Live → Ep ─→ route → write batches
//! compilation
//! appears_on ┘
//! ```
//!
//! Every bundle sits in exactly one bucket of a [`Buckets`] map. A remapper
//! looks at the buckets it applies to and either leaves a bundle in place,
//! moves it into its own target bucket or erases it.

mod ep;
mod live;
mod remix;
mod rerelease;

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::{
    config::Config,
    spotify::{Gateway, SpotifyApi},
    types::{ExtendedCategory, PlaylistTarget, ReleaseBundle},
    warning,
};

pub use ep::EpRemapper;
pub use live::LiveRemapper;
pub use remix::RemixRemapper;
pub use rerelease::{ReReleaseRemapper, rerelease_action};

pub type Buckets = BTreeMap<ExtendedCategory, Vec<ReleaseBundle>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemapAction {
    /// Leave the bundle where it is.
    None,
    /// Move the bundle into the remapper's target category.
    Remap,
    /// Drop the bundle.
    Erase,
}

#[async_trait]
pub trait Remapper: Send + Sync {
    fn target_category(&self) -> ExtendedCategory;

    fn applies_to(&self, source: ExtendedCategory) -> bool;

    async fn classify(&self, bundle: &ReleaseBundle) -> RemapAction;
}

/// Ordered list of active remappers for one crawl.
pub struct RemapEngine {
    remappers: Vec<Box<dyn Remapper>>,
}

impl RemapEngine {
    pub fn new(remappers: Vec<Box<dyn Remapper>>) -> Self {
        Self { remappers }
    }

    /// Builds the remappers in their fixed order: re-release, remix, live, EP.
    ///
    /// A remapper is only active when its target category has a playlist.
    /// The re-release remapper runs whenever `separate_rereleases` is set,
    /// since the date filter lets albums through unchecked; without a
    /// re-release playlist its remapped bundles are dropped by [`route`].
    pub fn from_config(
        config: &Config,
        enabled: &BTreeSet<ExtendedCategory>,
        today: NaiveDate,
        api: Arc<dyn SpotifyApi>,
        gateway: Gateway,
    ) -> Self {
        let mut remappers: Vec<Box<dyn Remapper>> = Vec::new();

        if config.separate_rereleases {
            remappers.push(Box::new(ReReleaseRemapper::new(
                config.market.clone().unwrap_or_default(),
                today,
                config.lookback_days,
            )));
        }
        if enabled.contains(&ExtendedCategory::Remix) {
            remappers.push(Box::new(RemixRemapper));
        }
        if enabled.contains(&ExtendedCategory::Live) {
            let features = config.live_audio_features.then_some((api, gateway));
            remappers.push(Box::new(LiveRemapper::new(features)));
        }
        if enabled.contains(&ExtendedCategory::Ep) {
            remappers.push(Box::new(EpRemapper));
        }

        Self { remappers }
    }

    pub fn len(&self) -> usize {
        self.remappers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.remappers.is_empty()
    }

    pub async fn apply(&self, buckets: &mut Buckets) {
        for remapper in &self.remappers {
            let target = remapper.target_category();
            let mut moved = Vec::new();

            for source in ExtendedCategory::ALL {
                if source == target || !remapper.applies_to(source) {
                    continue;
                }
                let Some(bundles) = buckets.remove(&source) else {
                    continue;
                };

                let mut kept = Vec::with_capacity(bundles.len());
                for bundle in bundles {
                    match remapper.classify(&bundle).await {
                        RemapAction::None => kept.push(bundle),
                        RemapAction::Remap => moved.push(bundle),
                        RemapAction::Erase => {}
                    }
                }
                if !kept.is_empty() {
                    buckets.insert(source, kept);
                }
            }

            if !moved.is_empty() {
                buckets.entry(target).or_default().extend(moved);
            }
        }
    }
}

/// Sorts bundles into the bucket of their native album group.
pub fn bucketize(bundles: Vec<ReleaseBundle>) -> Buckets {
    let mut buckets = Buckets::new();
    for bundle in bundles {
        buckets
            .entry(ExtendedCategory::from(bundle.release.group))
            .or_default()
            .push(bundle);
    }
    buckets
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoutedBundle {
    pub category: ExtendedCategory,
    pub bundle: ReleaseBundle,
}

/// Everything going into one playlist during a crawl.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteBatch {
    pub playlist_id: String,
    pub categories: Vec<ExtendedCategory>,
    pub bundles: Vec<RoutedBundle>,
}

impl WriteBatch {
    pub fn track_uris(&self) -> Vec<String> {
        self.bundles
            .iter()
            .flat_map(|b| b.bundle.tracks.iter())
            .map(|t| t.uri.clone())
            .collect()
    }

    pub fn track_count(&self) -> usize {
        self.bundles.iter().map(|b| b.bundle.tracks.len()).sum()
    }
}

/// Routes the buckets to their playlists.
///
/// Categories sharing a playlist are merged into one batch; inside a batch
/// the newest release comes first. Buckets of a category without a playlist
/// are dropped.
pub fn route(buckets: Buckets, targets: &[PlaylistTarget]) -> Vec<WriteBatch> {
    let mut batches: Vec<WriteBatch> = Vec::new();

    for (category, bundles) in buckets {
        if bundles.is_empty() {
            continue;
        }

        let playlist_id = targets
            .iter()
            .find(|t| t.category == category)
            .and_then(|t| t.playlist_id.clone());
        let Some(playlist_id) = playlist_id else {
            warning!(
                "No playlist configured for {}, dropping {} releases",
                category,
                bundles.len()
            );
            continue;
        };

        let routed = bundles
            .into_iter()
            .map(|bundle| RoutedBundle { category, bundle });
        match batches.iter_mut().find(|b| b.playlist_id == playlist_id) {
            Some(batch) => {
                batch.categories.push(category);
                batch.bundles.extend(routed);
            }
            None => batches.push(WriteBatch {
                playlist_id,
                categories: vec![category],
                bundles: routed.collect(),
            }),
        }
    }

    for batch in batches.iter_mut() {
        batch.bundles.sort_by_key(|b| std::cmp::Reverse(b.bundle.release.parsed_release_date()));
    }

    batches
}
