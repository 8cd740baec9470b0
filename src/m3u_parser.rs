//! M3U playlist parser and generator
//!
//! Parsing is line oriented: an `#EXTINF:` descriptor opens a pending entry
//! and the next non-comment line supplies its URL. Large playlists can be
//! parsed on a background thread with [`spawn_parse`], which streams coarse
//! progress back over a channel.

use indexmap::IndexMap;
use std::borrow::Cow;
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::thread;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::models::{well_known_key, Entry, DEFAULT_GROUP, GROUP_TITLE, TVG_ID, TVG_LOGO};

pub const HEADER: &str = "#EXTM3U";
const EXTINF: &str = "#EXTINF:";
const UNNAMED: &str = "Unnamed Stream";

/// Progress is reported every this many lines
const PROGRESS_INTERVAL: usize = 5000;

/// Does the text start with the `#EXTM3U` marker (ignoring BOM and leading whitespace)?
pub fn has_header(content: &str) -> bool {
    content
        .trim_start_matches('\u{feff}')
        .trim_start()
        .starts_with(HEADER)
}

/// Parse a whole playlist on the calling thread
pub fn parse(content: &str) -> Result<Vec<Entry>> {
    parse_with_progress(content, |_| true)?
        .ok_or_else(|| Error::Format("parse was cancelled".to_string()))
}

/// Parse, reporting percentage of lines consumed. The callback returns
/// `false` to abandon the parse, in which case `Ok(None)` is returned.
pub fn parse_with_progress<F>(content: &str, mut progress: F) -> Result<Option<Vec<Entry>>>
where
    F: FnMut(u8) -> bool,
{
    if !has_header(content) {
        return Err(Error::Format("missing #EXTM3U header".to_string()));
    }

    let total_lines = content.lines().count().max(1);
    let mut entries = Vec::new();
    let mut pending: Option<(IndexMap<String, String>, String)> = None;

    for (i, line) in content.lines().enumerate() {
        if i % PROGRESS_INTERVAL == 0 && !progress(percent(i, total_lines)) {
            debug!("Parse abandoned at line {}", i);
            return Ok(None);
        }

        // A stray CR inside a line would not survive export
        let line: Cow<str> = if line.contains('\r') {
            Cow::Owned(line.replace('\r', " "))
        } else {
            Cow::Borrowed(line)
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(info_part) = line.strip_prefix(EXTINF) {
            // A descriptor without a URL line is dropped when the next one starts
            pending = Some(parse_descriptor(info_part));
        } else if !line.starts_with('#') {
            if let Some((attrs, name)) = pending.take() {
                entries.push(build_entry(attrs, name, line));
            }
        }
    }

    if !progress(100) {
        return Ok(None);
    }

    info!("Parsed {} entries from {} lines", entries.len(), total_lines);
    Ok(Some(entries))
}

fn percent(line: usize, total: usize) -> u8 {
    ((line * 100 + total / 2) / total).min(100) as u8
}

fn build_entry(mut attrs: IndexMap<String, String>, name: String, url: &str) -> Entry {
    let group = attrs
        .get(GROUP_TITLE)
        .filter(|g| !g.is_empty())
        .cloned()
        .unwrap_or_else(|| DEFAULT_GROUP.to_string());
    let logo = attrs.get(TVG_LOGO).cloned().unwrap_or_default();
    let tvg_id = attrs.get(TVG_ID).cloned().unwrap_or_default();
    attrs.insert(GROUP_TITLE.to_string(), group.clone());

    Entry::new(name, url.to_string(), group, logo, tvg_id, attrs)
}

/// Split an EXTINF payload (after `#EXTINF:`) into its attributes and display name.
///
/// The name starts after the first comma that is not inside a quoted value.
fn parse_descriptor(info: &str) -> (IndexMap<String, String>, String) {
    let mut attrs = IndexMap::new();
    let mut chars = info.char_indices().peekable();

    // Duration token ("-1", "10.000000"), ignored
    while let Some(&(_, c)) = chars.peek() {
        if c.is_whitespace() || c == ',' {
            break;
        }
        chars.next();
    }

    loop {
        while let Some(&(_, c)) = chars.peek() {
            // Stray quotes between attributes show up in real-world files
            if c.is_whitespace() || c == '"' {
                chars.next();
            } else {
                break;
            }
        }

        let Some(&(pos, c)) = chars.peek() else {
            return (attrs, UNNAMED.to_string());
        };

        if c == ',' {
            let name = info[pos + 1..].trim();
            return (attrs, name.to_string());
        }

        let mut key = String::new();
        let mut has_value = false;
        while let Some(&(_, c)) = chars.peek() {
            if c == '=' {
                chars.next();
                has_value = true;
                break;
            }
            if c.is_whitespace() || c == ',' || c == '"' {
                break;
            }
            key.push(c);
            chars.next();
        }

        if !has_value {
            continue;
        }

        let mut value = String::new();
        if let Some(&(_, '"')) = chars.peek() {
            chars.next();
            for (_, c) in chars.by_ref() {
                if c == '"' {
                    break;
                }
                value.push(c);
            }
        } else {
            while let Some(&(_, c)) = chars.peek() {
                if c.is_whitespace() || c == ',' || c == '"' {
                    break;
                }
                value.push(c);
                chars.next();
            }
        }

        if !key.is_empty() {
            // Only the keys we read ourselves are normalized; the rest export as written
            let key = well_known_key(&key).map(str::to_string).unwrap_or(key);
            attrs.insert(key, value);
        }
    }
}

/// Serialize entries back to M3U text.
///
/// The three well-known attributes always come from the entry's own fields;
/// any other attribute seen at parse time follows them unchanged.
pub fn generate(entries: &[Entry]) -> String {
    let mut out = String::with_capacity(entries.len() * 160 + HEADER.len() + 1);
    out.push_str(HEADER);
    out.push('\n');

    for entry in entries {
        out.push_str(&format!(
            "{}-1 {}=\"{}\" {}=\"{}\" {}=\"{}\"",
            EXTINF,
            TVG_ID,
            attr_value(&entry.tvg_id),
            TVG_LOGO,
            attr_value(&entry.logo),
            GROUP_TITLE,
            attr_value(entry.group()),
        ));
        for (key, value) in entry.raw_attributes() {
            if well_known_key(key).is_some() {
                continue;
            }
            out.push_str(&format!(" {}=\"{}\"", key, attr_value(value)));
        }
        out.push(',');
        out.push_str(&single_line(&entry.name));
        out.push('\n');
        out.push_str(entry.url.trim());
        out.push('\n');
    }

    out
}

/// Attribute values are always double-quoted, so an embedded quote cannot survive
fn attr_value(value: &str) -> String {
    single_line(value).replace('"', "'")
}

fn single_line(value: &str) -> String {
    value.replace(['\r', '\n'], " ")
}

/// Message sent from a background parse
#[derive(Debug)]
pub enum ParseEvent {
    /// Percentage of lines consumed so far
    Progress(u8),
    Finished(Result<Vec<Entry>>),
}

/// Handle to a parse running on a worker thread.
///
/// Dropping the handle abandons the parse; the worker stops at its next
/// progress report.
pub struct ParseTask {
    receiver: Receiver<ParseEvent>,
}

/// Parse `content` on a background thread
pub fn spawn_parse(content: String) -> ParseTask {
    let (sender, receiver) = channel();

    thread::spawn(move || {
        let progress_sender = sender.clone();
        let result = parse_with_progress(&content, |p| {
            progress_sender.send(ParseEvent::Progress(p)).is_ok()
        });

        match result {
            Ok(Some(entries)) => {
                let _ = sender.send(ParseEvent::Finished(Ok(entries)));
            }
            Ok(None) => debug!("Background parse cancelled"),
            Err(e) => {
                let _ = sender.send(ParseEvent::Finished(Err(e)));
            }
        }
    });

    ParseTask { receiver }
}

impl ParseTask {
    /// Next event if one is ready, without blocking
    pub fn poll(&self) -> Option<ParseEvent> {
        match self.receiver.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(ParseEvent::Finished(Err(Error::Format(
                "Failed to parse playlist content.".to_string(),
            )))),
        }
    }

    /// Block until the parse finishes, forwarding progress to `on_progress`
    pub fn wait_with_progress<F: FnMut(u8)>(self, mut on_progress: F) -> Result<Vec<Entry>> {
        for event in self.receiver.iter() {
            match event {
                ParseEvent::Progress(p) => on_progress(p),
                ParseEvent::Finished(result) => return result,
            }
        }
        Err(Error::Format("Failed to parse playlist content.".to_string()))
    }

    pub fn wait(self) -> Result<Vec<Entry>> {
        self.wait_with_progress(|_| {})
    }
}

#[cfg(test)]
#[path = "m3u_parser_tests.rs"]
mod tests;
