//! Top-level navigation state: which tab is open and what was typed in the
//! search box.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

use crate::inventory::InventoryQuery;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, EnumIter, Serialize,
    Deserialize,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum Tab {
    #[default]
    Dashboard,
    Inventory,
    AddItem,
    Reports,
    Settings,
}

impl Tab {
    /// Parses a tab name; anything unknown opens the dashboard.
    pub fn from_name(name: &str) -> Self {
        name.trim().parse().unwrap_or_default()
    }

    pub fn all() -> impl Iterator<Item = Tab> {
        Tab::iter()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ViewShell {
    tab: Tab,
    search: String,
}

impl ViewShell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tab(&self) -> Tab {
        self.tab
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn select(&mut self, tab: Tab) {
        self.tab = tab;
    }

    pub fn select_by_name(&mut self, name: &str) -> Tab {
        self.tab = Tab::from_name(name);
        self.tab
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into();
    }

    /// The inventory criteria with the current search text routed in.
    pub fn inventory_query(&self, base: InventoryQuery) -> InventoryQuery {
        base.with_text(self.search.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::{filter_and_sort, seed_items, SortKey};

    #[test]
    fn unknown_tabs_fall_back_to_dashboard() {
        let mut shell = ViewShell::new();
        assert_eq!(shell.select_by_name("reports"), Tab::Reports);
        assert_eq!(shell.select_by_name("Add-Item"), Tab::AddItem);
        assert_eq!(shell.select_by_name("billing"), Tab::Dashboard);
        assert_eq!(shell.select_by_name(""), Tab::Dashboard);
    }

    #[test]
    fn tab_names_are_kebab_case() {
        let names: Vec<String> = Tab::all().map(|t| t.to_string()).collect();
        assert_eq!(
            names,
            ["dashboard", "inventory", "add-item", "reports", "settings"]
        );
    }

    #[test]
    fn search_text_reaches_the_engine() {
        let mut shell = ViewShell::new();
        shell.set_search("sala b");
        let query = shell.inventory_query(InventoryQuery::default().sorted_by(SortKey::Quantity));

        let items = seed_items();
        let shown = filter_and_sort(&items, &query);
        let names: Vec<&str> = shown.iter().map(|r| r.item.name.as_str()).collect();
        assert_eq!(names, ["Travesseiros Ortopédicos", "Lençóis Queen Size"]);
    }
}
