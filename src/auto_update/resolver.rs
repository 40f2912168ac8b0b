// Update Resolver
// Picks the single release this installation should move to, if any

use rand::Rng;

use crate::auto_update::channel::DistributionChannel;
use crate::auto_update::release::validate_release;
use crate::auto_update::types::{CanonicalRelease, ReleaseHistoryDocument, SelectedUpdatePacket};
use crate::auto_update::version;

/// Inputs describing the running installation
#[derive(Debug, Clone, Copy)]
pub struct ResolveContext<'a> {
    /// Version of the running app
    pub current_version: &'a str,
    /// Where the history came from (logging only)
    pub history_url: &'a str,
    /// Key into each release's `files` map
    pub platform: &'a str,
    pub channel: DistributionChannel,
}

/// Select the applicable update from a release history
///
/// Regular installs take the newest release. Store and protected installs
/// cannot replace their binaries at will, so they only take the newest
/// mandatory release. Every rejection is a plain `None`.
pub fn resolve_update<R: Rng>(
    document: &ReleaseHistoryDocument,
    ctx: &ResolveContext<'_>,
    rng: &mut R,
) -> Option<SelectedUpdatePacket> {
    if !version::validate(ctx.current_version) {
        log::warn!(
            "[Resolver] Running version {:?} is not a semantic version",
            ctx.current_version
        );
        return None;
    }

    let mut releases: Vec<CanonicalRelease> = document
        .history
        .iter()
        .filter_map(|entry| validate_release(entry, rng))
        .collect();

    // Stable: among equal versions the later document entry sorts last and wins
    releases.sort_by(|a, b| version::compare(&a.version, &b.version));

    let latest_release = releases.last()?;
    let latest_mandatory_release = releases.iter().rev().find(|r| r.is_mandatory);

    let is_update = ctx.channel.is_updateable()
        && version::is_newer(&latest_release.version, ctx.current_version);

    let is_mandatory_update = ctx.channel.store
        && latest_mandatory_release
            .is_some_and(|r| version::is_newer(&r.version, ctx.current_version));

    let candidate = if is_update {
        latest_release
    } else if is_mandatory_update {
        latest_mandatory_release?
    } else {
        log::info!(
            "[Resolver] No update for {} from {} (latest {}, store={}, portable={})",
            ctx.current_version,
            ctx.history_url,
            latest_release.version,
            ctx.channel.store,
            ctx.channel.portable
        );
        return None;
    };

    if candidate.skip_update {
        log::info!(
            "[Resolver] {} is outside this run's rollout ({}%)",
            candidate.version,
            candidate.staggering
        );
        return None;
    }

    // TODO: offer a prerelease channel opt-in in UpdateConfig
    if candidate.is_prerelease {
        log::info!("[Resolver] {} is a prerelease, ignoring", candidate.version);
        return None;
    }

    let Some(target_file) = candidate.files.get(ctx.platform) else {
        log::info!(
            "[Resolver] {} has no installer for platform {}",
            candidate.version,
            ctx.platform
        );
        return None;
    };

    log::info!(
        "[Resolver] Selected {} (mandatory={}) for {}",
        candidate.version,
        candidate.is_mandatory,
        ctx.platform
    );

    Some(SelectedUpdatePacket {
        release: candidate.clone(),
        app_name: document.name.clone(),
        target_file: target_file.clone(),
    })
}
