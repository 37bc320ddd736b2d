use anyhow::{Context, Result};
use ide_glue::config::GlueConfig;
use ide_glue::open::{OpenRequest, OpenRouter};
use ide_glue::toolbar::{ButtonCommand, ManifestLoader, MenuSource};

const USAGE: &str = "usage: ide-glue classify <path>... | ide-glue buttons";

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some((command, rest)) = args.split_first() else {
        anyhow::bail!(USAGE);
    };

    let config = GlueConfig::load().context("Failed to load configuration")?;

    match command.as_str() {
        "classify" => classify(&config, rest),
        "buttons" => buttons(&config),
        other => anyhow::bail!("Unknown command {:?}\n{}", other, USAGE),
    }
}

fn classify(config: &GlueConfig, uris: &[String]) -> Result<()> {
    if uris.is_empty() {
        anyhow::bail!(USAGE);
    }

    let router = OpenRouter::from_config(&config.open, None);
    for uri in uris {
        let resolved = OpenRequest::new(uri.as_str()).resolve(&config.open.preview_extensions);
        let target = router.route(&resolved);
        let line = resolved.line.map(|l| l.to_string()).unwrap_or_else(|| "-".to_string());
        println!("{}\t{}\tline={}\tview={}", resolved.uri, target, line, resolved.view_type);
    }
    Ok(())
}

fn buttons(config: &GlueConfig) -> Result<()> {
    let dir = config.toolbar.effective_manifest_dir()?;
    let specs = ManifestLoader::load_from_dir(&dir)?;

    for spec in &specs {
        let command = match &spec.command {
            Some(ButtonCommand::Named(name)) => name.as_str(),
            Some(ButtonCommand::Callback(_)) => "<callback>",
            None => "-",
        };
        let menu = match &spec.menu {
            Some(MenuSource::Static(entries)) => format!("{} entries", entries.len()),
            Some(MenuSource::External(id)) => format!("external {}", id),
            Some(MenuSource::Callback(_)) => "callback".to_string(),
            None => "none".to_string(),
        };
        println!(
            "{}\t{:?}\tgroup={}\tcommand={}\tmenu={}",
            spec.resolved_id()?,
            spec.label,
            spec.group.as_deref().unwrap_or("-"),
            command,
            menu
        );
    }
    Ok(())
}
