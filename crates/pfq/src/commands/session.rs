//! Catalog and query loading shared by the engine commands.

use std::fs;
use std::path::{Path, PathBuf};

use property_filter::{Catalog, CatalogError, FilterEngine, Query};

use super::config::Config;
use super::{CommandContext, CommandError, Result};
use crate::cli::Cli;
use crate::output::format_token_list_table;

/// An engine built from a catalog plus the query the command starts from.
pub struct Session {
    pub engine: FilterEngine,
    pub query: Query,
    query_path: Option<PathBuf>,
}

impl Session {
    /// Opens the catalog named by `--catalog` (or `PFQ_CATALOG`), falling
    /// back to the config's `catalog` entry.
    pub fn open(cli: &Cli, config: Config) -> Result<Self> {
        let catalog_path = cli.catalog.clone().or(config.catalog).ok_or_else(|| {
            CommandError::Config(
                "No catalog given. Pass --catalog, set PFQ_CATALOG, or set catalog in the config file"
                    .to_string(),
            )
        })?;

        let catalog = load_catalog(&catalog_path)?;
        let query = match &cli.query {
            Some(path) => load_query(path)?,
            None => catalog.query.clone().unwrap_or_default(),
        };

        let engine = FilterEngine::from_catalog(&catalog, config.filter);
        tracing::debug!(
            catalog = %catalog_path.display(),
            properties = engine.registry().len(),
            options = engine.catalog().len(),
            tokens = query.token_count(),
            "session opened"
        );

        Ok(Self {
            engine,
            query,
            query_path: cli.query.clone(),
        })
    }

    /// Reports an edited query, writing it back to the `--query` file when
    /// `write` is set.
    pub fn finish(&self, ctx: &CommandContext, query: &Query, write: bool) -> Result<()> {
        if write {
            let path = self.query_path.as_deref().ok_or_else(|| {
                CommandError::Input("--write requires a --query file".to_string())
            })?;
            save_query(path, query)?;
            tracing::debug!(path = %path.display(), "query written");
        }

        if ctx.json_output {
            println!("{}", serde_json::to_string_pretty(query)?);
        } else if !ctx.quiet {
            let view = self.engine.view(query, true);
            print!("{}", format_token_list_table(&view, ctx.use_colors));
        }
        Ok(())
    }
}

/// Loads a catalog document. `.toml` files are read as TOML, anything else
/// as JSON.
pub fn load_catalog(path: &Path) -> Result<Catalog> {
    let content = fs::read_to_string(path)?;
    let is_toml = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

    let catalog = if is_toml {
        toml::from_str(&content).map_err(CatalogError::invalid)?
    } else {
        Catalog::from_json_str(&content)?
    };
    Ok(catalog)
}

/// Reads a query from a JSON file.
pub fn load_query(path: &Path) -> Result<Query> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn save_query(path: &Path, query: &Query) -> Result<()> {
    let content = serde_json::to_string_pretty(query)?;
    fs::write(path, content + "\n")?;
    Ok(())
}
