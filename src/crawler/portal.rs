//! Element locators of the registry search portal

/// Selectors the coordinator uses to drive the portal UI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalLocators {
    /// Radio selecting a search by business name
    pub search_type_radio: String,
    /// Radio selecting "contains" name matching
    pub name_mode_radio: String,
    pub query_field: String,
    pub search_button: String,
    pub results_table: String,
    /// Control inside a result row that opens its detail view
    pub select_control: String,
    /// Element present only on a detail view
    pub detail_marker: String,
    /// Control on a detail view that goes back to the result list
    pub return_control: String,
}

impl Default for PortalLocators {
    fn default() -> Self {
        Self {
            search_type_radio: "#MainContent_rblSearchType_0".to_string(),
            name_mode_radio: "#MainContent_rblNameSearchType_0".to_string(),
            query_field: "#MainContent_txtSearchEntityName".to_string(),
            search_button: "#MainContent_btnSearchEntity".to_string(),
            results_table: "table.gvResults".to_string(),
            select_control: "input[value='Select Business']".to_string(),
            detail_marker: "#MainContent_lblEntityID".to_string(),
            return_control: "#MainContent_btnReturnToSearchResults".to_string(),
        }
    }
}
