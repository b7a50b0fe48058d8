use std::sync::LazyLock;

use compact_str::CompactString;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

static SEL_CARD_TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h5.card-title.mb-4").unwrap());
static SEL_CARD_TEXT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1.card-text").unwrap());
static SEL_OPTION: LazyLock<Selector> = LazyLock::new(|| Selector::parse("option[value]").unwrap());
static CENTER_VALUE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Z]{2,}-").unwrap());

const COUNT_SUFFIX: &str = " VPS";

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("found {titles} zone titles but {values} counts")]
    Mismatch { titles: usize, values: usize },
}

/// Region code to variant labels, both in first-seen document order.
///
/// A key only exists together with at least one label, and keys are never empty.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RegionMap {
    entries: Vec<(CompactString, Vec<String>)>,
}

impl RegionMap {
    pub const fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Appends `label` under `region`, creating the region on first sight.
    /// Returns `false` (and stores nothing) for an empty region.
    pub fn push(&mut self, region: &str, label: String) -> bool {
        if region.is_empty() {
            return false;
        }
        if let Some((_, labels)) = self.entries.iter_mut().find(|(r, _)| *r == region) {
            labels.push(label);
        } else {
            self.entries.push((region.into(), vec![label]));
        }
        true
    }

    #[cfg(test)]
    pub fn get(&self, region: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(r, _)| *r == region)
            .map(|(_, labels)| &**labels)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(r, l)| (r.as_str(), &**l))
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One zone card on the data-center page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatCard {
    pub zone: String,
    pub count: String,
}

impl StatCard {
    /// Splits the zone on its first `-`: `"./US-East"` + `"12 VPS"` gives
    /// `("US", "East(12♝)")`, while a zone without a dash keeps the raw count.
    pub fn region_variant(&self) -> (&str, String) {
        match self.zone.split_once('-') {
            Some((region, variant)) => {
                let count = self.count.strip_suffix(COUNT_SUFFIX).unwrap_or(&self.count);
                (strip_region(region), format!("{variant}({count}♝)"))
            }
            None => (strip_region(&self.zone), self.count.clone()),
        }
    }
}

fn strip_region(region: &str) -> &str {
    region.trim_start_matches(['.', '/'])
}

fn text_of(elem: ElementRef) -> String {
    elem.text().collect::<String>().trim().to_owned()
}

/// Pairs every zone title with the count card at the same position.
pub fn stat_cards(html: &Html) -> Result<Vec<StatCard>, ParseError> {
    let titles = html.select(&SEL_CARD_TITLE).map(text_of).collect::<Vec<_>>();
    let values = html.select(&SEL_CARD_TEXT).map(text_of).collect::<Vec<_>>();

    if titles.len() != values.len() {
        return Err(ParseError::Mismatch {
            titles: titles.len(),
            values: values.len(),
        });
    }

    Ok(titles
        .into_iter()
        .zip(values)
        .map(|(zone, count)| StatCard { zone, count })
        .collect())
}

pub fn parse_stats(html_text: &str) -> Result<RegionMap, ParseError> {
    let html = Html::parse_document(html_text);
    let mut map = RegionMap::new();
    for card in stat_cards(&html)? {
        let (region, variant) = card.region_variant();
        if !map.push(region, variant) {
            tracing::warn!(target: "parse", "zone {:?} has no region code, dropped", card.zone);
        }
    }
    Ok(map)
}

/// Visible text of every `<option>` whose value looks like `XX-...`.
pub fn center_labels(html_text: &str) -> Vec<String> {
    let html = Html::parse_document(html_text);
    html.select(&SEL_OPTION)
        .filter(|opt| opt.attr("value").is_some_and(|v| CENTER_VALUE.is_match(v)))
        .map(|opt| opt.text().collect())
        .collect()
}

/// Groups `"Los Angeles (US-LAX)"` style labels by the code in their last
/// parenthesized group. Labels without ` (` are dropped.
pub fn group_centers<S: AsRef<str>>(labels: &[S]) -> RegionMap {
    let mut map = RegionMap::new();
    for label in labels {
        let label = label.as_ref();
        let (Some((name, _)), Some((_, code))) = (label.split_once(" ("), label.rsplit_once(" ("))
        else {
            continue;
        };
        if !map.push(code.trim_end_matches(')'), name.to_owned()) {
            tracing::warn!(target: "parse", "center {label:?} has an empty code, dropped");
        }
    }
    map
}
