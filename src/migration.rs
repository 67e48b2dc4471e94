use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context};
use sqlx::{Pool, Postgres};

/// Applies every `NNN_name.sql` file in `dir`, in numeric order. Scripts are
/// written to be re-runnable, so this runs on every start.
pub async fn migrate(p: &Pool<Postgres>, dir: impl AsRef<Path>) -> anyhow::Result<()> {
    let migration_files = collect(dir.as_ref())?;

    log::info!("starting migration ({} files)", migration_files.len());
    for (_, path) in &migration_files {
        let content =
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        log::debug!("migrating {}", path.display());
        sqlx::raw_sql(&content)
            .execute(p)
            .await
            .with_context(|| format!("applying {}", path.display()))?;
    }
    log::info!("migration end");

    Ok(())
}

fn collect(dir: &Path) -> anyhow::Result<Vec<(usize, PathBuf)>> {
    let mut migration_files: Vec<(usize, PathBuf)> = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("reading {}", dir.display()))? {
        let entry = entry?;
        if !entry.metadata()?.is_file() {
            continue;
        }

        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("sql") {
            continue;
        }

        migration_files.push((migration_number(&path)?, path));
    }

    migration_files.sort_by_key(|v| v.0);
    Ok(migration_files)
}

fn migration_number(path: &Path) -> anyhow::Result<usize> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow!("invalid migration file name: {}", path.display()))?;
    let prefix = name
        .get(..3)
        .ok_or_else(|| anyhow!("migration name too short: {name}"))?;
    prefix
        .parse()
        .with_context(|| format!("migration {name} must start with a 3-digit number"))
}
