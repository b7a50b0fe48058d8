//! Snapshot rendering.
//!
//! The output is compared byte-for-byte against the cached copy, so every
//! template here is part of the cache format. Rendering is one-directional:
//! nothing parses these strings back.

use core::fmt::Write;

use crate::parse::RegionMap;

pub const URL_HAX_DATA_CENTER: &str = "https://hax.co.id/data-center";
pub const URL_HAX_CREATE_VPS: &str = "https://hax.co.id/create-vps";
pub const URL_WOIDEN_CREATE_VPS: &str = "https://woiden.id/create-vps";

pub const STATS_HEADER: &str = "[🛰Hax Stats / Hax 开通数据]";
pub const CENTERS_HEADER: &str = "[🚩Available Centers / 可开通区域]";

fn render(map: &RegionMap, mut line: impl FnMut(&mut String, &str, &str)) -> String {
    let mut out = String::new();
    for (key, labels) in map.iter() {
        line(&mut out, key, &labels.join(", "));
        out.push('\n');
    }
    out
}

/// `>>US-East(12♝), West(3♝)` per region.
pub fn stats_block(map: &RegionMap) -> String {
    render(map, |out, region, labels| {
        let _ = write!(out, ">>{region}-{labels}");
    })
}

/// `★US-LAX★ Los Angeles` per center code.
pub fn centers_block(map: &RegionMap) -> String {
    render(map, |out, code, names| {
        let _ = write!(out, "★{code}★ {names}");
    })
}

pub fn raw_block<S: AsRef<str>>(labels: &[S]) -> String {
    let mut out = String::new();
    for (i, label) in labels.iter().enumerate() {
        if i != 0 {
            out.push('\n');
        }
        out.push_str(label.as_ref());
    }
    out
}

pub fn stats_report(stats: &str) -> String {
    format!("{STATS_HEADER}\n{stats}\n")
}

pub fn availability_report(hax: &str, woiden: &str) -> String {
    format!(
        "{CENTERS_HEADER}\n\
         ---------- <a href=\"{URL_HAX_CREATE_VPS}\">Hax</a> ----------\n\
         {hax}\
         ---------- <a href=\"{URL_WOIDEN_CREATE_VPS}\">Woiden</a> ----------\n\
         {woiden}\n"
    )
}
