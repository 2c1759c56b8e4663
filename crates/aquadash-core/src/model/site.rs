use std::collections::BTreeMap;
use std::fmt::Write as _;

use url::Url;

/// One endpoint polled in aggregated mode and the fields kept from it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UrlGroup {
    pub url: Url,
    pub fields: Vec<String>,
}

impl UrlGroup {
    pub fn new(url: Url, fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            url,
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }
}

/// The normalized group set for one site: one entry per distinct URL,
/// fields sorted and deduplicated, groups ordered by URL.
///
/// Normalizing first means two widgets that list the same groups in a
/// different order still land on the same cache entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteGroups {
    groups: Vec<UrlGroup>,
}

impl SiteGroups {
    pub fn new(groups: impl IntoIterator<Item = UrlGroup>) -> Self {
        let mut by_url: BTreeMap<String, (Url, Vec<String>)> = BTreeMap::new();
        for group in groups {
            let slot = by_url
                .entry(group.url.as_str().to_owned())
                .or_insert_with(|| (group.url.clone(), Vec::new()));
            slot.1.extend(group.fields);
        }

        let groups = by_url
            .into_values()
            .filter_map(|(url, mut fields)| {
                fields.sort();
                fields.dedup();
                (!fields.is_empty()).then_some(UrlGroup { url, fields })
            })
            .collect();
        Self { groups }
    }

    pub fn groups(&self) -> &[UrlGroup] {
        &self.groups
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Composite cache key: `url[f1,f2]|url2[f3]`.
    pub fn cache_key(&self) -> String {
        let mut key = String::new();
        for (i, group) in self.groups.iter().enumerate() {
            if i > 0 {
                key.push('|');
            }
            let _ = write!(key, "{}[{}]", group.url, group.fields.join(","));
        }
        key
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn key_ignores_declaration_order() {
        let a = SiteGroups::new([
            UrlGroup::new(url("https://db.example/b.json"), ["Y"]),
            UrlGroup::new(url("https://db.example/a.json"), ["X", "W"]),
        ]);
        let b = SiteGroups::new([
            UrlGroup::new(url("https://db.example/a.json"), ["W", "X"]),
            UrlGroup::new(url("https://db.example/b.json"), ["Y"]),
        ]);
        assert_eq!(a.cache_key(), b.cache_key());
        assert_eq!(
            a.cache_key(),
            "https://db.example/a.json[W,X]|https://db.example/b.json[Y]"
        );
    }

    #[test]
    fn same_url_groups_merge() {
        let groups = SiteGroups::new([
            UrlGroup::new(url("https://db.example/a.json"), ["X"]),
            UrlGroup::new(url("https://db.example/a.json"), ["Y", "X"]),
        ]);
        assert_eq!(groups.groups().len(), 1);
        assert_eq!(groups.groups()[0].fields, vec!["X", "Y"]);
    }

    #[test]
    fn groups_without_fields_are_dropped() {
        let groups = SiteGroups::new([UrlGroup::new(
            url("https://db.example/a.json"),
            Vec::<String>::new(),
        )]);
        assert!(groups.is_empty());
        assert_eq!(groups.cache_key(), "");
    }
}
