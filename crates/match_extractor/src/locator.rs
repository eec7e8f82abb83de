//! Finds match rows in a listing document and the league heading each belongs to.
//!
//! Primary tier: sport sections → flagged rows, league via preceding siblings,
//! then up to [`PRIMARY_ANCESTOR_DEPTH`] ancestors.
//! Fallback tier (only when the primary tier finds no rows at all): every flagged
//! row in the document, league via up to [`FALLBACK_ANCESTOR_DEPTH`] ancestors.

use scraper::{ElementRef, Html};
use serde::Serialize;

use crate::dialect::{Intent, MarkupDialect};
use crate::record::LeagueContext;

// The two tiers walk different depths. Unifying them would move league
// attribution for rows that sit between 5 and 10 levels below a header.
pub const PRIMARY_ANCESTOR_DEPTH: usize = 5;
pub const FALLBACK_ANCESTOR_DEPTH: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LocatorTier {
    Primary,
    Fallback,
}

impl LocatorTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocatorTier::Primary => "primary",
            LocatorTier::Fallback => "fallback",
        }
    }
}

/// Where a row's league context came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeagueSource {
    Sibling,
    /// Found under the ancestor this many levels up (1 = parent).
    Ancestor(usize),
    Unresolved,
}

#[derive(Debug, Clone)]
pub struct Candidate<'a> {
    pub row: ElementRef<'a>,
    pub league: LeagueContext,
    pub league_source: LeagueSource,
}

#[derive(Debug, Clone)]
pub struct LocatedRows<'a> {
    pub tier: LocatorTier,
    pub candidates: Vec<Candidate<'a>>,
}

pub struct TreeLocator<'d> {
    dialect: &'d MarkupDialect,
}

impl<'d> TreeLocator<'d> {
    pub fn new(dialect: &'d MarkupDialect) -> Self {
        Self { dialect }
    }

    pub fn locate<'a>(&self, doc: &'a Html) -> LocatedRows<'a> {
        let primary = self.primary_rows(doc);
        if !primary.is_empty() {
            return LocatedRows {
                tier: LocatorTier::Primary,
                candidates: primary,
            };
        }

        let fallback = self.fallback_rows(doc);
        if !fallback.is_empty() {
            tracing::info!(
                "primary section/row markers matched nothing; fallback found {} rows",
                fallback.len()
            );
        }
        LocatedRows {
            tier: LocatorTier::Fallback,
            candidates: fallback,
        }
    }

    pub fn primary_rows<'a>(&self, doc: &'a Html) -> Vec<Candidate<'a>> {
        let root = doc.root_element();
        let mut out = Vec::new();

        for section in self.dialect.locate_all(root, Intent::SportSection) {
            for row in self.dialect.locate_all(section, Intent::MatchRow) {
                let (league, league_source) = match self.league_from_siblings(row) {
                    Some(league) => (league, LeagueSource::Sibling),
                    None => self.league_from_ancestors(row, PRIMARY_ANCESTOR_DEPTH),
                };
                out.push(Candidate { row, league, league_source });
            }
        }
        out
    }

    pub fn fallback_rows<'a>(&self, doc: &'a Html) -> Vec<Candidate<'a>> {
        self.dialect
            .locate_all(doc.root_element(), Intent::MatchRow)
            .into_iter()
            .map(|row| {
                let (league, league_source) = self.league_from_ancestors(row, FALLBACK_ANCESTOR_DEPTH);
                Candidate { row, league, league_source }
            })
            .collect()
    }

    /// Walk preceding siblings, nearest first, stopping at the first one that is
    /// or contains a league header. A header without a name does not count.
    pub fn league_from_siblings(&self, row: ElementRef<'_>) -> Option<LeagueContext> {
        row.prev_siblings()
            .filter_map(ElementRef::wrap)
            .find_map(|sib| self.header_at_or_below(sib))
            .map(|header| self.league_context(header))
            .filter(LeagueContext::is_resolved)
    }

    /// Search the descendants of each ancestor, parent first, at most `max_depth`
    /// levels up. Headers without a name are passed over. Returns an all-null
    /// context when nothing is found.
    pub fn league_from_ancestors(
        &self,
        row: ElementRef<'_>,
        max_depth: usize,
    ) -> (LeagueContext, LeagueSource) {
        row.ancestors()
            .filter_map(ElementRef::wrap)
            .take(max_depth)
            .enumerate()
            .find_map(|(i, ancestor)| {
                self.dialect
                    .locate_all(ancestor, Intent::LeagueHeader)
                    .into_iter()
                    .map(|header| self.league_context(header))
                    .find(LeagueContext::is_resolved)
                    .map(|league| (league, LeagueSource::Ancestor(i + 1)))
            })
            .unwrap_or((LeagueContext::default(), LeagueSource::Unresolved))
    }

    fn header_at_or_below<'a>(&self, el: ElementRef<'a>) -> Option<ElementRef<'a>> {
        if self.dialect.is(&el, Intent::LeagueHeader) {
            return Some(el);
        }
        self.dialect.locate(el, Intent::LeagueHeader)
    }

    pub fn league_context(&self, header: ElementRef<'_>) -> LeagueContext {
        let league_name = self.dialect.text_of(header, Intent::LeagueTitle);
        let league_country = self.dialect.text_of(header, Intent::LeagueCategory);
        let league_flag_class = self
            .dialect
            .locate(header, Intent::LeagueFlag)
            .and_then(|flag| {
                let classes: Vec<&str> = flag
                    .value()
                    .attr("class")
                    .unwrap_or_default()
                    .split_whitespace()
                    .filter(|c| c.contains("fl_") || c.contains("flag"))
                    .collect();
                (!classes.is_empty()).then(|| classes.join(" "))
            });

        LeagueContext {
            league_name,
            league_country,
            league_flag_class,
        }
    }
}
