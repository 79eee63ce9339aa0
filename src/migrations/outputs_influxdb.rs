use crate::document::{Block, Category};
use crate::rules::helpers::{remove_option, rename_option, replace, to_string_list};
use crate::rules::{Decline, MigrationContext, MigrationOutcome, Registry, Rule, SchemaVersion};
use toml::Value;

pub fn register(registry: &mut Registry) {
    registry.register(
        Category::Output,
        "influxdb",
        Rule::new("url_to_urls", migrate_url).since(SchemaVersion::new(1, 3, 0)),
    );
}

/// `url` became the `urls` list; `precision` is ignored by the output.
fn migrate_url(block: &Block, _ctx: &MigrationContext<'_>) -> Result<MigrationOutcome, Decline> {
    if block.option("url").is_none() && block.option("precision").is_none() {
        return Ok(MigrationOutcome::Unchanged);
    }

    let mut options = block.options().clone();
    remove_option(&mut options, "precision");

    if let Some(url) = block.option("url") {
        let url = url
            .as_str()
            .ok_or_else(|| Decline::new(format!("url: {} is not a string", url)))?;

        match options.get("urls") {
            None => {
                rename_option(&mut options, "url", "urls")?;
                options.insert("urls".to_string(), Value::from(vec![url]));
            }
            Some(existing) => {
                let mut urls = to_string_list("urls", existing)?;
                if !urls.iter().any(|u| u == url) {
                    urls.push(url.to_string());
                }
                remove_option(&mut options, "url");
                options.insert("urls".to_string(), Value::from(urls));
            }
        }
    }

    Ok(replace(Block::new(Category::Output, "influxdb", options)))
}
