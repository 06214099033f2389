/// Split an `apiVersion` string into group and version.
/// Core-group versions such as `v1` have an empty group.
pub fn split_api_version(api_version: &str) -> (&str, &str) {
    match api_version.rsplit_once('/') {
        Some((group, version)) => (group, version),
        None => ("", api_version),
    }
}

/// Kind of the items held by a list kind (`PodList` -> `Pod`).
pub fn list_item_kind(list_kind: &str) -> &str {
    list_kind.strip_suffix("List").unwrap_or(list_kind)
}
