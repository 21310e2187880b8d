//! Source watching for the `watch` task.
//!
//! The source and config trees are polled at the configured interval. Every
//! changed path is classified into the task that rebuilds it:
//!
//! | Changed path | Action |
//! |---|---|
//! | anything under `static/css-src/` | [`WatchAction::Styles`] |
//! | `.js` / `.jsx` / `.json` under `static/plugins/` | [`WatchAction::Plugins`] |
//! | any `.yml` | [`WatchAction::Regen`] |
//! | `.js` under `static/js/`, `.css` under `static/css/` | [`WatchAction::Regen`] |
//! | `.html` under `_layouts/` or `_includes/` | [`WatchAction::Regen`] |
//! | `.html` / `.md` outside `docs/` | [`WatchAction::Regen`] |
//! | `.html` / `.md` under `docs/en/dev/` | [`WatchAction::Regen`] |
//!
//! Only the English in-progress docs are watched; released versions rarely
//! change and the tree is large. Paths inside the build output directories
//! never trigger anything.
//!
//! Changes that arrive within one poll interval of each other are batched, and
//! each action in a batch runs once.

use crate::layout::{DEV_VERSION, Layout};
use notify::{Config, Event, EventKind, PollWatcher, RecursiveMode, Watcher};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Watch error: {0}")]
    Notify(#[from] notify::Error),
}

/// What to re-run after a change. Ordered the way a batch runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WatchAction {
    Styles,
    Plugins,
    Regen,
}

fn has_ext(path: &Path, exts: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| exts.contains(&e))
}

/// Classify one changed path.
pub fn classify(path: &Path, layout: &Layout) -> Option<WatchAction> {
    if path.starts_with(&layout.dev_dir) || path.starts_with(&layout.prod_dir) {
        return None;
    }
    if path.starts_with(layout.css_src_dir()) {
        return Some(WatchAction::Styles);
    }
    if path.starts_with(layout.plugins_src_dir()) {
        return has_ext(path, &["js", "jsx", "json"]).then_some(WatchAction::Plugins);
    }

    let docs = layout.docs_dir();
    let regen = has_ext(path, &["yml"])
        || (path.starts_with(layout.js_dir()) && has_ext(path, &["js"]))
        || (path.starts_with(layout.css_out_dir()) && has_ext(path, &["css"]))
        || (path.starts_with(layout.source_dir.join("_layouts")) && has_ext(path, &["html"]))
        || (path.starts_with(layout.source_dir.join("_includes")) && has_ext(path, &["html"]))
        || (path.starts_with(&layout.source_dir)
            && !path.starts_with(&docs)
            && has_ext(path, &["html", "md"]))
        || (path.starts_with(docs.join("en").join(DEV_VERSION)) && has_ext(path, &["html", "md"]));
    regen.then_some(WatchAction::Regen)
}

/// Classify a batch of changed paths into the set of actions to run.
pub fn classify_all<'a>(
    paths: impl IntoIterator<Item = &'a PathBuf>,
    layout: &Layout,
) -> BTreeSet<WatchAction> {
    paths
        .into_iter()
        .filter_map(|p| classify(p, layout))
        .collect()
}

fn changed_paths(result: notify::Result<Event>) -> Vec<PathBuf> {
    match result {
        Ok(event) => match event.kind {
            EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) => event.paths,
            _ => Vec::new(),
        },
        Err(err) => {
            tracing::warn!("watch error: {err}");
            Vec::new()
        }
    }
}

/// Poll the source and config trees until the process is stopped, calling
/// `on_change` with each batch of actions.
pub fn watch_changes<F>(layout: &Layout, interval: Duration, mut on_change: F) -> Result<(), WatchError>
where
    F: FnMut(&BTreeSet<WatchAction>),
{
    let (tx, rx) = mpsc::channel::<notify::Result<Event>>();
    let mut watcher = PollWatcher::new(tx, Config::default().with_poll_interval(interval))?;
    for dir in [&layout.source_dir, &layout.config_dir] {
        if dir.is_dir() {
            watcher.watch(dir, RecursiveMode::Recursive)?;
        }
    }
    tracing::info!(interval_ms = interval.as_millis() as u64, "watching for changes");

    while let Ok(first) = rx.recv() {
        let mut paths = changed_paths(first);
        while let Ok(next) = rx.recv_timeout(interval) {
            paths.extend(changed_paths(next));
        }
        let actions = classify_all(&paths, layout);
        if !actions.is_empty() {
            tracing::debug!(?actions, changed = paths.len(), "sources changed");
            on_change(&actions);
        }
    }
    Ok(())
}
