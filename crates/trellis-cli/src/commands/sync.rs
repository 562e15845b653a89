//! Tracker reconciliation command.

use std::path::Path;

use color_eyre::eyre::{bail, Result};
use indicatif::{ProgressBar, ProgressStyle};

use trellis_core::config::Config;
use trellis_core::storage::{FileStorage, Storage};
use trellis_core::sync::{
    ExternalSource, JsonExportSource, MergePolicy, RestSource, SyncRunner,
};

pub async fn run(
    storage: &FileStorage,
    config: &Config,
    from: Option<&Path>,
    url: Option<&str>,
    policy: Option<&str>,
    dry_run: bool,
) -> Result<()> {
    let policy: MergePolicy = policy.unwrap_or(&config.sync.policy).parse()?;

    let source: Box<dyn ExternalSource> = match (from, url.or(config.sync.base_url.as_deref())) {
        (Some(path), _) => Box::new(JsonExportSource::new(path)),
        (None, Some(base_url)) => Box::new(
            RestSource::new(base_url, config.sync.api_token_or_env())
                .with_page_size(config.sync.page_size),
        ),
        (None, None) => bail!("no sync source: pass --from/--url or configure [sync] base_url"),
    };

    if policy == MergePolicy::ExternalPriority && !dry_run {
        eprintln!("Warning: external_priority overwrites local edits on non-authoritative fields.");
    }

    let mut catalog = storage.load()?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
    spinner.set_message(format!("Syncing from {}...", source.name()));
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));

    let report = SyncRunner::new(source.as_ref(), policy)
        .run(&mut catalog)
        .await?;
    spinner.finish_and_clear();

    println!("Sync report: {report}");

    for (external_id, reason) in &report.failed {
        println!("  failed {external_id}: {reason}");
    }
    for (entity_id, conflicts) in &report.conflicts {
        println!("  conflicts on {entity_id}:");
        for (field, (local, external)) in conflicts {
            println!("    {field}: local={local:?} external={external:?}");
        }
    }

    if dry_run {
        println!("Dry run: catalog not saved.");
    } else {
        storage.save(&catalog)?;
        println!("Catalog saved to {}", storage.path().display());
    }
    Ok(())
}
