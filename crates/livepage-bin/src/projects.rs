//! Project subcommands.

use anyhow::{Context, Result, bail};
use core_store::{DEFAULT_TITLE, DocumentStore, Project, User};
use std::path::Path;
use tracing::info;

pub async fn find<S: DocumentStore>(store: &S, owner: &User, id: &str) -> Result<Project> {
    let projects = store.list(&owner.id).await?;
    match projects.into_iter().find(|p| p.id == id) {
        Some(project) => Ok(project),
        None => bail!("no project `{id}` for {}", owner.email),
    }
}

pub async fn create<S: DocumentStore>(
    store: &S,
    owner: &User,
    title: Option<String>,
) -> Result<()> {
    let title = title.unwrap_or_else(|| DEFAULT_TITLE.to_string());
    let project = store.create(&owner.id, &title).await?;
    println!("{}\t{}", project.id, project.path);
    Ok(())
}

pub async fn list<S: DocumentStore>(store: &S, owner: &User) -> Result<()> {
    let projects = store.list(&owner.id).await?;
    if projects.is_empty() {
        eprintln!("No projects yet for {}", owner.display_name());
    }
    for p in projects {
        println!("{}\t{}\t{}", p.id, p.updated_at, p.title);
    }
    Ok(())
}

pub async fn delete<S: DocumentStore>(store: &S, owner: &User, id: &str) -> Result<()> {
    let project = find(store, owner, id).await?;
    store.delete(&project.id, &project.path).await?;
    println!("Deleted {}", project.title);
    Ok(())
}

pub async fn checkout<S: DocumentStore>(
    store: &S,
    owner: &User,
    id: &str,
    dest: &Path,
) -> Result<()> {
    let project = find(store, owner, id).await?;
    let text = store.load(&project.path).await?;
    tokio::fs::write(dest, &text)
        .await
        .with_context(|| format!("writing {}", dest.display()))?;
    info!(
        target: "store",
        project_id = project.id.as_str(),
        size_bytes = text.len(),
        "checked_out"
    );
    println!("{} -> {}", project.title, dest.display());
    Ok(())
}
