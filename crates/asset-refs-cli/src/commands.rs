use anyhow::{Context, Result};
use asset_refs_config::{AssetManifest, Config, read_ledger, write_ledger};
use asset_refs_engine::{
    InMemoryAssetStore, Mode, PictureTagRenderer, ReferenceProcessor, RewriteContext,
};
use std::io::Read;
use std::path::Path;

use crate::cli::Commands;

/// Runs `command`, returning the rewritten content to print (if any).
pub fn execute(command: &Commands, config: &Config) -> Result<Option<String>> {
    let input = command.input();
    let store = load_store(input.store.as_deref(), config)?;
    let content = read_input(&input.input)?;

    let renderer = PictureTagRenderer::new(config.render.clone())
        .with_marker(config.markers.internal.clone());
    let processor = ReferenceProcessor::new(&store, &renderer)
        .with_markers(config.markers.clone())
        .with_scope(config.scope.clone());

    match command {
        Commands::Render { .. } => Ok(Some(processor.render_references(&content)?)),
        Commands::Export { ledger, .. } => {
            let mut context = RewriteContext::default();
            let output = processor.rewrite_markup(&content, Mode::Export, &mut context)?;
            log::info!("Exported {} asset reference(s)", context.ledger.len());

            if let Some(path) = ledger {
                write_ledger(path, &context.ledger)
                    .with_context(|| format!("Failed to write ledger to {}", path.display()))?;
            }
            Ok(Some(output))
        }
        Commands::Import { references, .. } => {
            let ledger = read_ledger(references)?;
            let mut context = RewriteContext::for_import(ledger.to_reference_set());
            let output = processor.rewrite_markup(&content, Mode::Import, &mut context)?;
            Ok(Some(output))
        }
        Commands::Validate { .. } => {
            processor.validate_references(&content)?;
            log::info!("All asset references resolve");
            Ok(None)
        }
    }
}

fn load_store(explicit: Option<&Path>, config: &Config) -> Result<InMemoryAssetStore> {
    let manifest = explicit
        .map(Path::to_path_buf)
        .or_else(|| config.store_manifest.clone())
        .context("No asset manifest given; pass --store or set store_manifest in the config")?;

    let store = AssetManifest::load_from_path(&manifest)?.into_store();
    log::debug!("Loaded {} asset(s) from {}", store.len(), manifest.display());
    Ok(store)
}

fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut content = String::new();
        std::io::stdin()
            .read_to_string(&mut content)
            .context("Failed to read content from stdin")?;
        return Ok(content);
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::InputArgs;
    use asset_refs_engine::RewriteError;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;
    use tempfile::TempDir;

    const MANIFEST: &str = r#"
[[assets]]
id = 42
title = "image.png"
mime_type = "image/png"
"#;

    fn workspace(content: &str) -> (TempDir, InputArgs) {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("manifest.toml"), MANIFEST).unwrap();
        std::fs::write(dir.path().join("article.html"), content).unwrap();
        let input = InputArgs {
            store: Some(dir.path().join("manifest.toml")),
            input: dir.path().join("article.html"),
        };
        (dir, input)
    }

    #[test]
    fn export_then_import_through_ledger_file() {
        // Given an article referencing a known asset
        let original = r#"<p><img data-fileEntryId="42" src="x"/></p>"#;
        let (dir, input) = workspace(original);
        let ledger = dir.path().join("out").join("ledger.toml");
        let config = Config::default();

        // When exporting with a ledger
        let exported = execute(
            &Commands::Export {
                input: input.clone(),
                ledger: Some(ledger.clone()),
            },
            &config,
        )
        .unwrap()
        .unwrap();
        assert_eq!(
            exported,
            r#"<p><img export-import-path="/documents/42/image.png" src="x"/></p>"#
        );

        // Then importing the exported article with that ledger restores it
        std::fs::write(&input.input, &exported).unwrap();
        let imported = execute(
            &Commands::Import {
                input,
                references: ledger,
            },
            &config,
        )
        .unwrap()
        .unwrap();
        assert_eq!(imported, original);
    }

    #[test]
    fn validate_reports_missing_assets() {
        let (_dir, input) = workspace(r#"<img data-fileEntryId="404">"#);

        let err = execute(&Commands::Validate { input }, &Config::default()).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<RewriteError>(),
            Some(RewriteError::AssetNotFound(_))
        ));
    }

    #[test]
    fn validate_prints_nothing_on_success() {
        let (_dir, input) = workspace(r#"<img data-fileEntryId="42">"#);
        let output = execute(&Commands::Validate { input }, &Config::default()).unwrap();
        assert_eq!(output, None);
    }

    #[test]
    fn render_wraps_known_images() {
        let (_dir, input) = workspace(r#"<img data-fileEntryId="42" src="x">"#);
        let output = execute(&Commands::Render { input }, &Config::default())
            .unwrap()
            .unwrap();
        assert_eq!(
            output,
            r#"<picture data-fileEntryId="42"><img data-fileEntryId="42" src="x"></picture>"#
        );
    }

    #[test]
    fn store_falls_back_to_config() {
        let (dir, mut input) = workspace(r#"<img data-fileEntryId="42">"#);
        input.store = None;
        let config = Config {
            store_manifest: Some(dir.path().join("manifest.toml")),
            ..Config::default()
        };

        assert!(execute(&Commands::Validate { input }, &config).is_ok());
    }

    #[test]
    fn missing_store_is_an_error() {
        let (_dir, mut input) = workspace("<p></p>");
        input.store = None;

        let err = execute(&Commands::Validate { input }, &Config::default()).unwrap_err();
        assert!(err.to_string().contains("No asset manifest"));
    }

    #[test]
    fn missing_input_file_is_an_error() {
        let (_dir, mut input) = workspace("<p></p>");
        input.input = PathBuf::from("/nonexistent/article.html");

        let err = execute(&Commands::Render { input }, &Config::default()).unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }
}
