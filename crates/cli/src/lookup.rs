//! Read-only commands: discovery, actor and collection lookups.

use litepub_common::collection::{fetch_following, fetch_notes};
use litepub_common::fetch::ObjectFetcher;
use litepub_common::http_client::HttpClient;
use litepub_common::models::Actor;
use litepub_common::webfinger::resolve_identifier;
use serde::Serialize;

use crate::error::CliError;

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn actor<C: HttpClient>(fetcher: &ObjectFetcher<C>, target: &str) -> Result<Actor, CliError> {
    Ok(fetcher.fetch_actor_any(target)?)
}

/// Print the actor URL webfinger advertises for `identifier`.
pub fn resolve<C: HttpClient>(client: &C, identifier: &str) -> Result<(), CliError> {
    println!("{}", resolve_identifier(client, identifier)?);
    Ok(())
}

/// Print an actor document.
pub fn show_actor<C: HttpClient>(fetcher: &ObjectFetcher<C>, target: &str) -> Result<(), CliError> {
    print_json(&actor(fetcher, target)?)
}

/// Print a note.
pub fn show_note<C: HttpClient>(fetcher: &ObjectFetcher<C>, url: &str) -> Result<(), CliError> {
    print_json(&fetcher.fetch_note(url)?)
}

/// Print the ids an actor follows, one per line.
pub fn following<C: HttpClient>(fetcher: &ObjectFetcher<C>, target: &str) -> Result<(), CliError> {
    let actor = actor(fetcher, target)?;
    if actor.following.is_empty() {
        return Err(CliError::Federation(format!(
            "{} has no following collection",
            actor.base.id
        )));
    }

    for id in fetch_following(fetcher, &actor.following)? {
        println!("{}", id);
    }
    Ok(())
}

/// Print an actor's recent notes as a JSON array.
pub fn notes<C: HttpClient>(fetcher: &ObjectFetcher<C>, target: &str) -> Result<(), CliError> {
    let actor = actor(fetcher, target)?;
    if actor.outbox.is_empty() {
        return Err(CliError::Federation(format!(
            "{} has no outbox",
            actor.base.id
        )));
    }

    print_json(&fetch_notes(fetcher, &actor.outbox)?)
}
