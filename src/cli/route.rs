//! CLI route: single route table and run context. Dispatches to domain services and presentation.

use crate::cli::help::command_name;
use crate::cli::parse::{Commands, MappingArgs};
use crate::cli::presentation::{
    format_diff_json, format_diff_text, format_rewrite_report_json, format_rewrite_report_text,
    format_status_text, format_translations_json, format_translations_text, to_pretty_json,
    TranslationRow,
};
use crate::config::{ConfigLoader, TreesyncConfig};
use crate::fingerprint::PropertyFingerprint;
use crate::namespace::NamespaceMapping;
use crate::rewrite::ReferenceRewriter;
use crate::snapshot::{diff, ParsedSnapshot, Snapshot, SnapshotCollector};
use crate::status::{ProcessRecord, StatusSummary};
use crate::tree::{ContentWrite, MemoryStore, TreeDump};
use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Runtime context for CLI execution: workspace and effective configuration.
/// Built from workspace path and optional config path using ConfigLoader only.
pub struct RunContext {
    workspace_root: PathBuf,
    config: TreesyncConfig,
}

impl RunContext {
    /// Create run context from workspace root and optional config path.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self> {
        let config = match &config_path {
            Some(path) => ConfigLoader::load_from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => ConfigLoader::load(&workspace_root).with_context(|| {
                format!("Failed to load config for workspace {}", workspace_root.display())
            })?,
        };
        Ok(Self::with_config(workspace_root, config.validated()?))
    }

    /// Create run context from an already loaded configuration.
    pub fn with_config(workspace_root: PathBuf, config: TreesyncConfig) -> Self {
        Self {
            workspace_root,
            config,
        }
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    pub fn config(&self) -> &TreesyncConfig {
        &self.config
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<String> {
        debug!(command = command_name(command), "Executing command");
        let output = match command {
            Commands::Translate {
                paths,
                mapping,
                inverse,
                staging,
                format,
            } => self.handle_translate(paths, mapping, *inverse, staging.as_deref(), format),
            Commands::Snapshot {
                content,
                roots,
                relative_to,
                stop_at_versioned,
                output,
            } => self.handle_snapshot(
                content,
                roots,
                relative_to.as_deref(),
                *stop_at_versioned,
                output.as_deref(),
            ),
            Commands::Diff {
                foreign,
                foreign_prefix,
                local,
                content,
                roots,
                local_prefix,
                scope,
                format,
            } => self.handle_diff(
                foreign,
                foreign_prefix.as_deref(),
                LocalSource::from_args(local.as_deref(), content.as_deref(), roots)?,
                local_prefix.as_deref(),
                scope.as_deref(),
                format,
            ),
            Commands::Fingerprint {
                content,
                path,
                strip_prefix,
            } => self.handle_fingerprint(content, path, strip_prefix.as_deref()),
            Commands::Rewrite {
                content,
                path,
                source,
                dest,
                output,
                format,
            } => self.handle_rewrite(content, path, source, dest, output.as_deref(), format),
            Commands::Status {
                state,
                stage,
                format,
            } => self.handle_status(state, stage, format),
            Commands::Config => Ok(self.config.to_toml()?),
        }?;
        info!(command = command_name(command), "Command completed");
        Ok(output)
    }

    fn mapping(&self, args: &MappingArgs) -> Result<NamespaceMapping> {
        if let Some(id) = &args.process {
            let replication = self.config.replication(id)?;
            return replication
                .mapping()
                .with_context(|| format!("Invalid mapping for replication process {}", id));
        }
        let Some(root) = args.source_root.as_deref() else {
            bail!("Either --process or --source-root is required");
        };
        NamespaceMapping::new(
            root,
            args.source_scope.as_deref(),
            args.target_root.as_deref(),
        )
        .context("Invalid namespace mapping")
    }

    fn handle_translate(
        &self,
        paths: &[String],
        mapping_args: &MappingArgs,
        inverse: bool,
        staging: Option<&str>,
        format: &str,
    ) -> Result<String> {
        let mapping = self.mapping(mapping_args)?;
        let prefix = staging
            .or(mapping.external_prefix())
            .unwrap_or("")
            .to_string();
        debug!(mapping = %mapping, inverse, "Translating paths");

        let rows: Vec<TranslationRow> = if inverse {
            let translate = mapping.inverse_translate_mapping(&prefix);
            paths
                .iter()
                .map(|p| TranslationRow {
                    input: p.clone(),
                    output: translate(p),
                })
                .collect()
        } else {
            let translate = mapping.translate_mapping(&prefix);
            paths
                .iter()
                .map(|p| TranslationRow {
                    input: p.clone(),
                    output: translate(p),
                })
                .collect()
        };

        match format {
            "json" => Ok(format_translations_json(&rows)?),
            _ => Ok(format_translations_text(&rows)),
        }
    }

    fn handle_snapshot(
        &self,
        content: &Path,
        roots: &[String],
        relative_to: Option<&str>,
        stop_at_versioned: bool,
        output: Option<&Path>,
    ) -> Result<String> {
        let (store, dump_root) = load_content(content)?;
        let snapshot = self.collect(&store, roots, &dump_root, relative_to, stop_at_versioned)?;
        let json = snapshot.to_json()?;
        match output {
            Some(path) => {
                std::fs::write(path, &json)
                    .with_context(|| format!("Failed to write snapshot {}", path.display()))?;
                Ok(format!(
                    "Wrote {} entries to {}",
                    snapshot.len(),
                    path.display()
                ))
            }
            None => Ok(json),
        }
    }

    fn collect(
        &self,
        store: &MemoryStore,
        roots: &[String],
        dump_root: &str,
        relative_to: Option<&str>,
        stop_at_versioned: bool,
    ) -> Result<Snapshot> {
        let roots: Vec<&str> = if roots.is_empty() {
            vec![dump_root]
        } else {
            roots.iter().map(String::as_str).collect()
        };
        let collector = SnapshotCollector::new(roots)
            .relative_to(relative_to)
            .stop_at_versioned(stop_at_versioned || self.config.snapshot.stop_at_versioned);
        Ok(collector.collect(store)?)
    }

    fn handle_diff(
        &self,
        foreign: &Path,
        foreign_prefix: Option<&str>,
        local: LocalSource<'_>,
        local_prefix: Option<&str>,
        scope: Option<&str>,
        format: &str,
    ) -> Result<String> {
        let ParsedSnapshot {
            snapshot: foreign_snapshot,
            rejected,
        } = read_snapshot(foreign)?;

        let local_snapshot = match local {
            LocalSource::Snapshot(path) => {
                let parsed = read_snapshot(path)?;
                if !parsed.rejected.is_empty() {
                    bail!(
                        "Local snapshot {} has {} malformed entries",
                        path.display(),
                        parsed.rejected.len()
                    );
                }
                parsed.snapshot
            }
            LocalSource::Content { dump, roots } => {
                let (store, dump_root) = load_content(dump)?;
                self.collect(&store, roots, &dump_root, None, false)?
            }
        };

        let result = diff(
            &foreign_snapshot,
            foreign_prefix,
            &local_snapshot,
            local_prefix,
            scope,
        );
        match format {
            "json" => Ok(format_diff_json(&result, &rejected)?),
            _ => Ok(format_diff_text(&result, &rejected)),
        }
    }

    fn handle_fingerprint(
        &self,
        content: &Path,
        path: &str,
        strip_prefix: Option<&str>,
    ) -> Result<String> {
        let (store, _) = load_content(content)?;
        let fingerprint =
            PropertyFingerprint::of(&store, path, strip_prefix, &self.config.fingerprint)
                .with_context(|| format!("Failed to fingerprint {}", path))?;
        Ok(to_pretty_json(&fingerprint)?)
    }

    fn handle_rewrite(
        &self,
        content: &Path,
        path: &str,
        source: &str,
        dest: &str,
        output: Option<&Path>,
        format: &str,
    ) -> Result<String> {
        let (store, _) = load_content(content)?;
        let mut staging = MemoryStore::staging_copy(&store, path)?;
        let rewriter = ReferenceRewriter::new(source, dest)?;
        let report = rewriter
            .rewrite(&mut staging, path)
            .with_context(|| format!("Failed to rewrite references below {}", path))?;
        staging.commit()?;

        if let Some(out_path) = output {
            let json = staging.to_json_string(path)?;
            std::fs::write(out_path, json)
                .with_context(|| format!("Failed to write content dump {}", out_path.display()))?;
        }
        match format {
            "json" => Ok(format_rewrite_report_json(&report)?),
            _ => Ok(format_rewrite_report_text(&report)),
        }
    }

    fn handle_status(&self, state: &Path, stage: &str, format: &str) -> Result<String> {
        let text = std::fs::read_to_string(state)
            .with_context(|| format!("Failed to read status records {}", state.display()))?;
        let records = ProcessRecord::parse_all(&text)
            .with_context(|| format!("Invalid status records in {}", state.display()))?;
        let summary = StatusSummary::build(stage, &self.config.replications, &records);
        match format {
            "json" => Ok(summary.to_json()?),
            _ => Ok(format_status_text(&summary)),
        }
    }
}

/// Where the local side of a diff comes from
enum LocalSource<'a> {
    Snapshot(&'a Path),
    Content { dump: &'a Path, roots: &'a [String] },
}

impl<'a> LocalSource<'a> {
    fn from_args(
        local: Option<&'a Path>,
        content: Option<&'a Path>,
        roots: &'a [String],
    ) -> Result<Self> {
        match (local, content) {
            (Some(path), None) => Ok(LocalSource::Snapshot(path)),
            (None, Some(dump)) => Ok(LocalSource::Content { dump, roots }),
            _ => bail!("Exactly one of --local or --content is required"),
        }
    }
}

/// Load a content dump; returns the store and the dump root
fn load_content(path: &Path) -> Result<(MemoryStore, String)> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read content dump {}", path.display()))?;
    let dump: TreeDump = serde_json::from_str(&text)
        .with_context(|| format!("Invalid content dump {}", path.display()))?;
    let store = MemoryStore::from_dump(&dump)
        .with_context(|| format!("Invalid content dump {}", path.display()))?;
    Ok((store, dump.root))
}

fn read_snapshot(path: &Path) -> Result<ParsedSnapshot> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
    Snapshot::from_json(&text).with_context(|| format!("Invalid snapshot {}", path.display()))
}
