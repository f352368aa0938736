//! Navigation shell: sidebar items, drawer/collapse state and breadcrumbs.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NavItem {
    pub href: &'static str,
    pub label: &'static str,
}

/// Sidebar entries, in display order.
pub const NAV_ITEMS: [NavItem; 5] = [
    NavItem { href: "/dashboard", label: "Dashboard" },
    NavItem { href: "/sessions", label: "Sessions" },
    NavItem { href: "/users", label: "Users" },
    NavItem { href: "/seats", label: "Seats" },
    NavItem { href: "/settings", label: "Settings" },
];

const HOME: NavItem = NAV_ITEMS[0];

impl NavItem {
    /// Exact match, or a sub-path of any item other than the dashboard.
    pub fn is_active(&self, path: &str) -> bool {
        if path == self.href {
            return true;
        }
        self.href != HOME.href
            && path
                .strip_prefix(self.href)
                .is_some_and(|rest| rest.starts_with('/'))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavEntry {
    #[serde(flatten)]
    pub item: NavItem,
    pub active: bool,
}

pub fn nav_entries(path: &str) -> Vec<NavEntry> {
    NAV_ITEMS
        .iter()
        .map(|item| NavEntry {
            item: *item,
            active: item.is_active(path),
        })
        .collect()
}

/// Desktop sidebar collapse flag and mobile drawer flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShellState {
    pub collapsed: bool,
    pub mobile_open: bool,
}

impl ShellState {
    pub fn toggle_collapsed(&mut self) {
        self.collapsed = !self.collapsed;
    }

    pub fn open_mobile(&mut self) {
        self.mobile_open = true;
    }

    pub fn close_mobile(&mut self) {
        self.mobile_open = false;
    }

    /// Following a link closes the drawer; the collapse flag is kept.
    pub fn navigate(&mut self) {
        self.close_mobile();
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Crumb {
    pub label: String,
    pub href: String,
    /// The last crumb is the current page and is not rendered as a link.
    pub current: bool,
}

fn route_label(href: &str) -> Option<&'static str> {
    NAV_ITEMS.iter().find(|i| i.href == href).map(|i| i.label)
}

fn capitalize(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Breadcrumb trail for `path`.
///
/// Always starts at Dashboard. The first path segment is the section and is
/// skipped; every later segment adds a crumb for its cumulative path.
pub fn breadcrumbs(path: &str) -> Vec<Crumb> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    let mut crumbs = vec![Crumb {
        label: HOME.label.to_string(),
        href: HOME.href.to_string(),
        current: false,
    }];

    let tail = segments.len().saturating_sub(1);
    for (index, segment) in segments.iter().skip(1).enumerate() {
        let href = format!("/{}", segments[..index + 2].join("/"));
        let label = route_label(&href)
            .map(str::to_string)
            .unwrap_or_else(|| capitalize(segment));
        crumbs.push(Crumb {
            label,
            href,
            current: index + 1 == tail,
        });
    }

    crumbs
}
