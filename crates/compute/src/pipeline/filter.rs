use tabgroup_core::Tab;

/// URL prefixes of browser-internal pages that are never grouped.
pub const INTERNAL_PREFIXES: [&str; 4] = [
    "chrome://",
    "chrome-extension://",
    "moz-extension://",
    "about:",
];

/// Whether `tab` points at a real page worth grouping.
pub fn is_groupable(tab: &Tab) -> bool {
    !tab.url.is_empty() && !INTERNAL_PREFIXES.iter().any(|p| tab.url.starts_with(p))
}

/// Groupable tabs, in their original order.
pub fn filter_tabs(tabs: &[Tab]) -> Vec<Tab> {
    tabs.iter().filter(|t| is_groupable(t)).cloned().collect()
}
