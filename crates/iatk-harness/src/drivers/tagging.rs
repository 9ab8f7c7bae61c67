//! Harness discovery through the tagging API.

use iatk_cloud::CallContext;
use iatk_cloud::tagging::{ResourceTagMapping, TagFilter, TaggingApi};

use super::DriverError;
use crate::dedup::dedup;
use crate::tags::SystemTagKey;

/// Returns the single target value recorded on the resources of harness
/// `id`.
///
/// # Errors
///
/// Returns [`DriverError::NoHarnessResources`] when nothing carries the id,
/// [`DriverError::NoTarget`] when no resource records a target and
/// [`DriverError::MultipleTargets`] when resources disagree.
pub fn target_by_harness_id(
    api: &dyn TaggingApi,
    ctx: &CallContext,
    id: &str,
) -> Result<String, DriverError> {
    let filters = [TagFilter::new(SystemTagKey::Id.as_str(), vec![id.to_owned()])];
    let resources = all_resources(api, ctx, &filters)?;
    if resources.is_empty() {
        return Err(DriverError::NoHarnessResources { id: id.to_owned() });
    }
    let targets: Vec<String> = resources
        .iter()
        .filter_map(|mapping| mapping.tags.get(SystemTagKey::Target.as_str()).cloned())
        .collect();
    let mut distinct = dedup(&targets);
    match distinct.len() {
        0 => Err(DriverError::NoTarget { id: id.to_owned() }),
        1 => Ok(distinct.remove(0)),
        _ => Err(DriverError::MultipleTargets {
            id: id.to_owned(),
            targets: distinct,
        }),
    }
}

/// Returns the distinct harness ids of resources matching `filters`.
///
/// When `filters` names no reserved key, a filter on the harness-id key is
/// appended so only harness-owned resources are considered.
///
/// # Errors
///
/// Returns [`DriverError`] when a page cannot be read.
pub fn harness_ids_with_tag_filters(
    api: &dyn TaggingApi,
    ctx: &CallContext,
    filters: &[TagFilter],
) -> Result<Vec<String>, DriverError> {
    let mut effective = filters.to_vec();
    if !effective
        .iter()
        .any(|filter| SystemTagKey::from_key(&filter.key).is_some())
    {
        effective.push(TagFilter::new(SystemTagKey::Id.as_str(), Vec::new()));
    }
    let ids: Vec<String> = all_resources(api, ctx, &effective)?
        .into_iter()
        .filter_map(|mapping| mapping.tags.get(SystemTagKey::Id.as_str()).cloned())
        .collect();
    Ok(dedup(&ids))
}

fn all_resources(
    api: &dyn TaggingApi,
    ctx: &CallContext,
    filters: &[TagFilter],
) -> Result<Vec<ResourceTagMapping>, DriverError> {
    let mut resources = Vec::new();
    let mut token: Option<String> = None;
    loop {
        let page = api
            .get_resources(ctx, filters, token.as_deref())
            .map_err(|source| DriverError::call("failed to get resources", source))?;
        resources.extend(page.mappings);
        match page.pagination_token {
            Some(next) => token = Some(next),
            None => return Ok(resources),
        }
    }
}
