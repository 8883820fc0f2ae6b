use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use dust_helpers_rs::{register_helpers, Config, Level, Registry, Template};
use serde_json::Value;

#[derive(Parser, Debug)]
#[command(name = "dust-render")]
#[command(about = "Render a dust-style template with the control-flow helpers")]
struct CliOptions {
    /// Template file to render
    #[arg(long = "template", short = 't')]
    template: PathBuf,

    /// JSON or YAML context file (use '-' for stdin)
    #[arg(long = "context", short = 'c')]
    context: Option<String>,

    /// TOML configuration file
    #[arg(long = "config")]
    config: Option<PathBuf>,

    /// Diagnostics threshold (debug, info, warn, error)
    #[arg(long = "log-level")]
    log_level: Option<Level>,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let opts = CliOptions::parse();

    let mut config = match &opts.config {
        Some(path) => {
            let mut config = Config::load(path)?;
            config.apply_env()?;
            config
        }
        None => Config::from_env()?,
    };
    if let Some(level) = opts.log_level {
        config.log_level = level;
    }

    let registry = Registry::new();
    registry.set_logger(config.logger());
    register_helpers(&registry);

    let source = fs::read_to_string(&opts.template)
        .with_context(|| format!("unable to read template {}", opts.template.display()))?;
    let template = Template::parse(&source)
        .with_context(|| format!("invalid template {}", opts.template.display()))?;
    let data = match opts.context.as_deref() {
        Some(spec) => load_context(spec)?,
        None => Value::Object(Default::default()),
    };

    let rendered = template.render(&registry.context(data))?;
    let mut stdout = io::stdout();
    stdout.write_all(rendered.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

fn load_context(spec: &str) -> Result<Value> {
    if spec == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        return serde_yaml::from_str(&buffer)
            .map_err(|err| anyhow!("invalid context on stdin: {err}"));
    }
    let path = Path::new(spec);
    let content = fs::read_to_string(path)
        .with_context(|| format!("unable to read context {}", path.display()))?;
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        serde_json::from_str(&content)
            .with_context(|| format!("invalid JSON context {}", path.display()))
    } else {
        serde_yaml::from_str(&content)
            .with_context(|| format!("invalid YAML context {}", path.display()))
    }
}
