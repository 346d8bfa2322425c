use anyhow::{bail, Context};
use moneta_core::ImportId;
use moneta_ingest::run_import;
use moneta_storage::{DbPool, SqliteStore};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

pub async fn ingest(pool: &DbPool, csv_file: &Path, account_name: &str) -> anyhow::Result<()> {
    let account = moneta_storage::get_account_by_name(pool, account_name)
        .await?
        .with_context(|| {
            format!("account '{account_name}' not found; see `moneta accounts list`")
        })?;

    let file = File::open(csv_file).with_context(|| format!("opening {}", csv_file.display()))?;
    let filename = csv_file.file_name().and_then(|n| n.to_str());

    tracing::info!(
        account = %account.name,
        institution = %account.institution,
        file = %csv_file.display(),
        "starting import"
    );

    let store = SqliteStore::new(pool.clone());
    let summary = run_import(
        &store,
        BufReader::new(file),
        account.id,
        &account.institution,
        filename,
    )
    .await?;

    println!(
        "{} row(s) read, {} inserted, {} duplicate(s) skipped",
        summary.total, summary.inserted, summary.skipped
    );
    Ok(())
}

pub async fn accounts_add(
    pool: &DbPool,
    name: &str,
    institution: &str,
    description: &str,
) -> anyhow::Result<()> {
    // Reject typo'd keys before they produce an account nothing can ingest into.
    if moneta_ingest::lookup(institution).is_err() {
        bail!(
            "unknown institution '{institution}'; known keys: {}",
            moneta_ingest::available().collect::<Vec<_>>().join(", ")
        );
    }

    let account = moneta_storage::create_account(pool, name, institution, description).await?;
    println!("Created account '{}' (id {})", account.name, account.id);
    Ok(())
}

pub async fn accounts_list(pool: &DbPool) -> anyhow::Result<()> {
    let accounts = moneta_storage::get_all_accounts(pool).await?;
    if accounts.is_empty() {
        println!("No accounts. Add one with `moneta accounts add`.");
        return Ok(());
    }
    for account in accounts {
        println!(
            "{:>4}  {:<24} {:<10} {}",
            account.id, account.name, account.institution, account.description
        );
    }
    Ok(())
}

pub fn institutions() {
    for key in moneta_ingest::available() {
        println!("{key}");
    }
}

pub async fn imports_list(pool: &DbPool, account_name: &str) -> anyhow::Result<()> {
    let account = moneta_storage::get_account_by_name(pool, account_name)
        .await?
        .with_context(|| format!("account '{account_name}' not found"))?;

    let imports = moneta_storage::get_data_imports_for_account(pool, account.id).await?;
    if imports.is_empty() {
        println!("No imports for '{account_name}'.");
        return Ok(());
    }
    for import in imports {
        println!(
            "{:>4}  {}  {}",
            import.id,
            import.created_at,
            import.filename.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

pub async fn imports_delete(pool: &DbPool, id: i64) -> anyhow::Result<()> {
    let deleted = moneta_storage::delete_data_import(pool, ImportId(id)).await?;
    if deleted == 0 {
        bail!("import batch {id} not found");
    }
    println!("Deleted import batch {id} and its transactions");
    Ok(())
}
