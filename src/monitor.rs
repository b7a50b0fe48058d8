//! Snapshot change detection: fetch, parse, render, compare, notify, persist.

use reqwest::Client;

use crate::{
    notify::Notifier,
    parse::{center_labels, group_centers, parse_stats},
    report::{
        URL_HAX_CREATE_VPS, URL_HAX_DATA_CENTER, URL_WOIDEN_CREATE_VPS, availability_report,
        centers_block, raw_block, stats_block,
    },
    scrape::fetch,
    store::StateStore,
};

pub const STATS_KEY: &str = "HAX_STATS";
pub const AVAILABLE_KEY: &str = "HAX_AVAILABLE";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing worth comparing was scraped; the store was not touched.
    Skipped,
    NoPriorData,
    Unchanged,
    Changed,
}

/// A monitored snapshot: where it is cached and how changes are announced.
#[derive(Debug, Clone, Copy)]
pub struct Source {
    pub key: &'static str,
    pub created: &'static str,
    pub updated: &'static str,
}

pub const STATS: Source = Source {
    key: STATS_KEY,
    created: "[🛰 Hax Stats] 数据已缓存！",
    updated: "[🛰 Hax Stats] 数据已更新！",
};

pub const AVAILABLE: Source = Source {
    key: AVAILABLE_KEY,
    created: "🌐【数据中心信息更新】",
    updated: "🌐【数据中心信息更新】",
};

/// Compares `current` with the cached snapshot of `source`.
///
/// An unreadable cache counts as a first run. Store and notifier failures are
/// logged and never abort the run.
pub async fn reconcile<S, N>(store: &S, notifier: &N, source: &Source, current: &str) -> Outcome
where
    S: StateStore,
    N: Notifier,
{
    let key = source.key;
    let cached = match store.get(key).await {
        Ok(cached) => cached,
        Err(e) => {
            tracing::error!(target: "monitor", "reading {key} failed, treating as absent: {e}");
            None
        }
    };

    let (outcome, title) = match cached {
        None => {
            tracing::info!(target: "monitor", "🆕 {key} not cached yet, creating");
            (Outcome::NoPriorData, source.created)
        }
        Some(cached) if cached == current => {
            tracing::info!(target: "monitor", "🔵 {key} unchanged");
            return Outcome::Unchanged;
        }
        Some(_) => {
            tracing::info!(target: "monitor", "🔄 {key} changed, updating");
            (Outcome::Changed, source.updated)
        }
    };

    if let Err(e) = store.set(key, current).await {
        tracing::error!(target: "monitor", "\x1b[31mwriting {key} failed: {e}\x1b[0m");
    }
    if let Err(e) = notifier.notify(title, current).await {
        tracing::error!(target: "monitor", "\x1b[31mnotifying {key} failed: {e}\x1b[0m");
    }
    outcome
}

/// Stats block of a data-center page; empty when the cards do not pair up.
pub fn stats_from_page(html: &str) -> String {
    if html.is_empty() {
        return String::new();
    }
    match parse_stats(html) {
        Ok(map) => stats_block(&map),
        Err(e) => {
            tracing::warn!(target: "monitor", "{URL_HAX_DATA_CENTER}: {e}");
            String::new()
        }
    }
}

pub async fn stats_snapshot(client: &Client) -> String {
    stats_from_page(&fetch(client, URL_HAX_DATA_CENTER).await)
}

pub async fn check_stats<S, N>(client: &Client, store: &S, notifier: &N) -> Outcome
where
    S: StateStore,
    N: Notifier,
{
    let current = stats_snapshot(client).await;
    reconcile(store, notifier, &STATS, &current).await
}

/// Both create-vps pages, rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Availability {
    /// Hax centers grouped by code.
    pub hax: String,
    /// Woiden options, one per line.
    pub woiden: String,
}

impl Availability {
    pub fn from_pages(hax_html: &str, woiden_html: &str) -> Self {
        Self {
            hax: centers_block(&group_centers(&center_labels(hax_html))),
            woiden: raw_block(&center_labels(woiden_html)),
        }
    }

    pub async fn collect(client: &Client) -> Self {
        let hax = fetch(client, URL_HAX_CREATE_VPS).await;
        let woiden = fetch(client, URL_WOIDEN_CREATE_VPS).await;
        Self::from_pages(&hax, &woiden)
    }

    /// No center on either page. The report template alone is not data.
    pub fn is_blank(&self) -> bool {
        self.hax.trim().is_empty() && self.woiden.trim().is_empty()
    }

    pub fn report(&self) -> String {
        availability_report(&self.hax, &self.woiden)
    }
}

pub async fn reconcile_available<S, N>(store: &S, notifier: &N, availability: &Availability) -> Outcome
where
    S: StateStore,
    N: Notifier,
{
    if availability.is_blank() {
        tracing::info!(target: "monitor", "❌ no center available, skipping");
        return Outcome::Skipped;
    }
    reconcile(store, notifier, &AVAILABLE, &availability.report()).await
}

pub async fn check_available<S, N>(client: &Client, store: &S, notifier: &N) -> Outcome
where
    S: StateStore,
    N: Notifier,
{
    let availability = Availability::collect(client).await;
    reconcile_available(store, notifier, &availability).await
}
