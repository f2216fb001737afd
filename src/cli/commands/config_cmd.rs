//! Configuration display command.

use crate::cli::icons::arrow;
use crate::config::Config;

/// Print the effective configuration (file, defaults, and env overrides merged).
pub fn cmd_config_show(config: &Config, format: &str) -> anyhow::Result<()> {
    let source = config
        .source_path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "defaults".to_string());
    eprintln!("  {} Source: {}", arrow(), source);

    let rendered = render(config, format)?;
    println!("{}", rendered.trim_end());
    Ok(())
}

fn render(config: &Config, format: &str) -> anyhow::Result<String> {
    match format {
        "toml" => Ok(toml::to_string_pretty(config)?),
        "json" => Ok(serde_json::to_string_pretty(config)?),
        "yaml" | "yml" => Ok(serde_yaml::to_string(config)?),
        other => anyhow::bail!("Unknown format '{}'. Use toml, json or yaml.", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_every_format() {
        let config = Config::default();

        let toml_out = render(&config, "toml").unwrap();
        assert!(toml_out.contains("max_pages = 1000"));

        let json_out = render(&config, "json").unwrap();
        let parsed: Config = serde_json::from_str(&json_out).unwrap();
        assert_eq!(parsed, config);

        let yaml_out = render(&config, "yaml").unwrap();
        assert!(yaml_out.contains("https://jiji.ng/cars"));

        assert!(render(&config, "ini").is_err());
    }
}
