//! Markup dialect: where each piece of a listing lives in the page.
//!
//! Every element the locator and builder need is addressed by an [`Intent`].
//! A dialect maps an intent to a [`LookupChain`], a priority list of lookup
//! strategies tried in order; the first strategy that finds something wins.
//! Call sites never hold selectors themselves.

use anyhow::{anyhow, Result};
use scraper::{ElementRef, Selector};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    SportSection,
    MatchRow,
    RowLink,
    Time,
    Stage,
    StageBlock,
    HomeParticipant,
    AwayParticipant,
    ParticipantName,
    ParticipantLogo,
    HomeScore,
    AwayScore,
    TvIcon,
    AudioIcon,
    InfoIcon,
    RedCard,
    LeagueHeader,
    LeagueTitle,
    LeagueCategory,
    LeagueFlag,
}

/// One way of finding an element below a scope.
#[derive(Debug, Clone)]
pub enum Lookup {
    Css(Selector),
    /// Tag (any if `None`) carrying a class that contains `fragment`.
    /// Survives hashed suffixes like `wcl-name_3y6f5`.
    ClassFragment {
        tag: Option<&'static str>,
        fragment: &'static str,
    },
}

impl Lookup {
    pub fn css(selector: &str) -> Result<Self> {
        Selector::parse(selector)
            .map(Lookup::Css)
            .map_err(|e| anyhow!("invalid selector {:?}: {}", selector, e))
    }

    /// Does `el` itself satisfy this lookup?
    pub fn matches(&self, el: &ElementRef<'_>) -> bool {
        match self {
            Lookup::Css(sel) => sel.matches(el),
            Lookup::ClassFragment { tag, fragment } => {
                let v = el.value();
                tag.map_or(true, |t| v.name() == t) && v.classes().any(|c| c.contains(*fragment))
            }
        }
    }

    /// First descendant of `scope` (document order) satisfying the lookup.
    pub fn find<'a>(&self, scope: ElementRef<'a>) -> Option<ElementRef<'a>> {
        match self {
            Lookup::Css(sel) => scope.select(sel).next(),
            Lookup::ClassFragment { .. } => descendants(scope).find(|el| self.matches(el)),
        }
    }

    pub fn find_all<'a>(&self, scope: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        match self {
            Lookup::Css(sel) => scope.select(sel).collect(),
            Lookup::ClassFragment { .. } => descendants(scope).filter(|el| self.matches(el)).collect(),
        }
    }
}

fn descendants<'a>(scope: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    scope.descendants().skip(1).filter_map(ElementRef::wrap)
}

/// Ordered fallbacks for one intent.
#[derive(Debug, Clone)]
pub struct LookupChain {
    steps: Vec<Lookup>,
}

impl LookupChain {
    pub fn new(steps: Vec<Lookup>) -> Self {
        Self { steps }
    }

    pub fn css(selector: &str) -> Result<Self> {
        Ok(Self::new(vec![Lookup::css(selector)?]))
    }

    pub fn locate<'a>(&self, scope: ElementRef<'a>) -> Option<ElementRef<'a>> {
        self.steps.iter().find_map(|step| step.find(scope))
    }

    /// All matches of the first strategy that matches anything.
    pub fn locate_all<'a>(&self, scope: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        self.steps
            .iter()
            .map(|step| step.find_all(scope))
            .find(|found| !found.is_empty())
            .unwrap_or_default()
    }

    pub fn matches(&self, el: &ElementRef<'_>) -> bool {
        self.steps.iter().any(|step| step.matches(el))
    }
}

/// Intent → lookup chain table for one source site.
#[derive(Debug, Clone)]
pub struct MarkupDialect {
    chains: HashMap<Intent, LookupChain>,
}

impl MarkupDialect {
    /// Flashscore listing markup, restricted to one sport section class
    /// (`soccer`, `tennis`, ...).
    pub fn flashscore(sport: &str) -> Result<Self> {
        let sport = sport.trim();
        if sport.is_empty() || !sport.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
            return Err(anyhow!("invalid sport class {:?}", sport));
        }

        let mut chains = HashMap::new();
        let mut css = |intent: Intent, selector: &str| -> Result<()> {
            chains.insert(intent, LookupChain::css(selector)?);
            Ok(())
        };

        css(Intent::SportSection, format!("div.sportName.{sport}").as_str())?;
        // rows are recognised by the data attribute, not by styling classes alone
        css(Intent::MatchRow, r#"div.event__match[data-event-row="true"]"#)?;
        css(Intent::RowLink, "a.eventRowLink")?;
        css(Intent::Time, "div.event__time")?;
        css(Intent::Stage, "div.event__stage")?;
        css(Intent::StageBlock, "div.event__stage--block")?;
        css(Intent::HomeParticipant, "div.event__homeParticipant")?;
        css(Intent::AwayParticipant, "div.event__awayParticipant")?;
        css(Intent::ParticipantLogo, r#"img[data-testid="wcl-participantLogo"]"#)?;
        css(Intent::HomeScore, "span.event__score--home")?;
        css(Intent::AwayScore, "span.event__score--away")?;
        css(Intent::TvIcon, "a.event__icon--tv")?;
        css(Intent::AudioIcon, "a.event__icon--audio")?;
        css(Intent::InfoIcon, "svg.event__icon--info")?;
        css(Intent::LeagueHeader, "div.headerLeague")?;
        css(Intent::LeagueTitle, "a.headerLeague__title strong")?;
        css(Intent::LeagueCategory, "span.headerLeague__category-text")?;

        chains.insert(
            Intent::ParticipantName,
            LookupChain::new(vec![
                Lookup::ClassFragment { tag: Some("span"), fragment: "wcl-name" },
                Lookup::ClassFragment { tag: Some("span"), fragment: "simpleText" },
            ]),
        );
        chains.insert(
            Intent::LeagueFlag,
            LookupChain::new(vec![
                Lookup::ClassFragment { tag: Some("span"), fragment: "headerLeague__flag" },
                Lookup::ClassFragment { tag: Some("span"), fragment: "icon--flag" },
            ]),
        );
        chains.insert(
            Intent::RedCard,
            LookupChain::new(vec![
                Lookup::css(".icon--redCard")?,
                Lookup::ClassFragment { tag: None, fragment: "redCard" },
            ]),
        );

        Ok(Self { chains })
    }

    pub fn with_chain(mut self, intent: Intent, chain: LookupChain) -> Self {
        self.chains.insert(intent, chain);
        self
    }

    pub fn chain(&self, intent: Intent) -> Option<&LookupChain> {
        self.chains.get(&intent)
    }

    pub fn locate<'a>(&self, scope: ElementRef<'a>, intent: Intent) -> Option<ElementRef<'a>> {
        self.chain(intent)?.locate(scope)
    }

    pub fn locate_all<'a>(&self, scope: ElementRef<'a>, intent: Intent) -> Vec<ElementRef<'a>> {
        self.chain(intent)
            .map(|chain| chain.locate_all(scope))
            .unwrap_or_default()
    }

    pub fn exists(&self, scope: ElementRef<'_>, intent: Intent) -> bool {
        self.locate(scope, intent).is_some()
    }

    pub fn is(&self, el: &ElementRef<'_>, intent: Intent) -> bool {
        self.chain(intent).is_some_and(|chain| chain.matches(el))
    }

    /// Trimmed text of the located element, `None` if missing or blank.
    pub fn text_of(&self, scope: ElementRef<'_>, intent: Intent) -> Option<String> {
        self.locate(scope, intent)
            .map(element_text)
            .filter(|t| !t.is_empty())
    }
}

/// Text content with each fragment trimmed and concatenated.
pub fn element_text(el: ElementRef<'_>) -> String {
    el.text().map(str::trim).collect::<String>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    #[test]
    fn chain_falls_through_to_next_strategy() {
        let html = Html::parse_fragment(
            r#"<div id="p"><span class="participant__simpleText">Benfica</span></div>"#,
        );
        let dialect = MarkupDialect::flashscore("soccer").unwrap();
        let root = html.root_element();
        let name = dialect.text_of(root, Intent::ParticipantName);
        assert_eq!(name.as_deref(), Some("Benfica"));
    }

    #[test]
    fn earlier_strategy_wins_over_document_order() {
        let html = Html::parse_fragment(
            r#"<div><span class="simpleText">Late</span><span class="wcl-name_x1">First</span></div>"#,
        );
        let dialect = MarkupDialect::flashscore("soccer").unwrap();
        let name = dialect.text_of(html.root_element(), Intent::ParticipantName);
        assert_eq!(name.as_deref(), Some("First"));
    }

    #[test]
    fn rejects_sport_that_would_break_the_selector() {
        assert!(MarkupDialect::flashscore("soccer, div").is_err());
        assert!(MarkupDialect::flashscore("").is_err());
        assert!(MarkupDialect::flashscore("ice-hockey").is_ok());
    }

    #[test]
    fn blank_text_counts_as_missing() {
        let html = Html::parse_fragment(r#"<div><div class="event__time">  </div></div>"#);
        let dialect = MarkupDialect::flashscore("soccer").unwrap();
        assert!(dialect.exists(html.root_element(), Intent::Time));
        assert_eq!(dialect.text_of(html.root_element(), Intent::Time), None);
    }
}
