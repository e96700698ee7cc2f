/// Crawl phase and per-term state definitions
///
/// This module defines every phase the coordinator can be in and the
/// transitions allowed between them.
use std::fmt;

/// Represents the current phase of a crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    // ===== Bootstrap =====
    /// Nothing has been loaded yet
    Init,

    /// Loading the portal landing page to establish a session
    HomeNav,

    /// Loading the search form
    SearchNav,

    // ===== Per Term =====
    /// Selecting search modes and entering the term
    SetupQuery,

    /// Activating the search control
    Submit,

    /// Reading the result rows
    ResultList,

    /// Opening one row's detail view
    DetailNav,

    /// Running the field extractor on a detail view
    Extract,

    /// Validating and writing the record
    Persist,

    /// Going back from a detail view to the result list
    ReturnToList,

    /// Finished with the current term
    NextTerm,

    // ===== Terminal =====
    /// Every term was processed
    Done,

    /// The search page could not be reached at all
    Aborted,
}

impl CrawlPhase {
    /// Returns true if no further transitions are possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Aborted)
    }

    /// Phases reachable from this one
    pub fn successors(&self) -> &'static [CrawlPhase] {
        use CrawlPhase::*;
        match self {
            Init => &[HomeNav],
            HomeNav => &[SearchNav, Aborted],
            // SearchNav retries itself when the homepage route fails late
            SearchNav => &[SearchNav, SetupQuery, NextTerm, Aborted],
            SetupQuery => &[Submit, NextTerm],
            Submit => &[ResultList, NextTerm],
            ResultList => &[DetailNav, NextTerm],
            DetailNav => &[Extract, ReturnToList, NextTerm],
            Extract => &[Persist],
            Persist => &[ReturnToList, NextTerm],
            ReturnToList => &[DetailNav, NextTerm],
            NextTerm => &[SearchNav, Done],
            Done | Aborted => &[],
        }
    }

    pub fn can_transition_to(&self, next: CrawlPhase) -> bool {
        self.successors().contains(&next)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::HomeNav => "home_nav",
            Self::SearchNav => "search_nav",
            Self::SetupQuery => "setup_query",
            Self::Submit => "submit",
            Self::ResultList => "result_list",
            Self::DetailNav => "detail_nav",
            Self::Extract => "extract",
            Self::Persist => "persist",
            Self::ReturnToList => "return_to_list",
            Self::NextTerm => "next_term",
            Self::Done => "done",
            Self::Aborted => "aborted",
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A selectable row of the result list
///
/// Only valid while the result page it was read from is displayed; the
/// position index is used to re-resolve the live row before every use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRow {
    pub display_name: String,
    pub external_id: String,
    /// Index among the table's `tr` elements, header included
    pub position_index: usize,
}

/// State of the term being crawled; replaced at the start of each term
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlState {
    pub term: String,
    pub rows: Vec<ResultRow>,
    /// Index into `rows` of the row being processed
    pub cursor: usize,
    pub successes: usize,
}

impl CrawlState {
    pub fn new(term: &str) -> Self {
        Self {
            term: term.to_string(),
            ..Self::default()
        }
    }

    pub fn current_row(&self) -> Option<&ResultRow> {
        self.rows.get(self.cursor)
    }
}
