//! Selector resolution: turn `--id` / `--name` into a resource id

use anyhow::{anyhow, Result};
use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;

use crate::api::KdClient;
use crate::cli::{Selector, TextSelector};
use crate::error::ResolveError;
use crate::models::Resource;

const MAX_SUGGESTIONS: usize = 3;

/// Something that selects a resource either by id or by name
pub trait Select {
    fn id(&self) -> Option<String>;
    fn name(&self) -> Option<&str>;
}

impl Select for Selector {
    fn id(&self) -> Option<String> {
        self.id.map(|id| id.to_string())
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl Select for TextSelector {
    fn id(&self) -> Option<String> {
        self.id.clone()
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// Resolve a selector to an id; `--name` costs one list request
pub async fn resolve<R: Resource>(client: &KdClient, selector: &impl Select) -> Result<String> {
    if let Some(id) = selector.id() {
        return Ok(id);
    }

    let name = selector
        .name()
        .ok_or_else(|| anyhow!("Either --id or --name must be provided"))?;

    let items: Vec<R> = client.list().await?;
    let id = find_by_name(&items, name)?;
    log::debug!("Resolved {} '{}' to id {}", R::KIND, name, id);
    Ok(id)
}

/// Pick the single item whose name equals `name`
pub fn find_by_name<R: Resource>(items: &[R], name: &str) -> Result<String, ResolveError> {
    let matches: Vec<&R> = items.iter().filter(|item| item.name() == name).collect();

    match matches.as_slice() {
        [item] => Ok(item.id()),
        [] => Err(ResolveError::NotFound {
            kind: R::KIND,
            name: name.to_string(),
            suggestions: suggest(items.iter().map(|item| item.name()), name),
        }),
        many => Err(ResolveError::Ambiguous {
            kind: R::KIND,
            name: name.to_string(),
            ids: many.iter().map(|item| item.id()).collect(),
        }),
    }
}

/// Closest names by fuzzy score, best first
fn suggest<'a>(names: impl Iterator<Item = &'a str>, input: &str) -> Vec<String> {
    let matcher = SkimMatcherV2::default().ignore_case();

    let mut scored: Vec<(i64, &str)> = names
        .filter_map(|name| {
            matcher
                .fuzzy_match(name, input)
                .or_else(|| matcher.fuzzy_match(input, name))
                .map(|score| (score, name))
        })
        .collect();

    scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1)));
    scored.dedup_by(|a, b| a.1 == b.1);
    scored
        .into_iter()
        .take(MAX_SUGGESTIONS)
        .map(|(_, name)| name.to_string())
        .collect()
}
