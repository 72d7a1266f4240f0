//! Command-line surface and dispatch onto the category repository.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use serde_json::{Value, json};

use crate::config::Config;
use category_domain::{CategoryDraft, CategoryId, CategoryStyle, NameQuery};
use category_persistence::CategoryRepository;

#[derive(Parser, Debug)]
#[command(name = "categoryctl")]
#[command(about = "Manage stored categories", version)]
pub struct Cli {
    /// Redis URL, overrides REDIS_URL
    #[arg(long, global = true)]
    pub redis_url: Option<String>,

    /// Key namespace, overrides CATEGORY_KEY_PREFIX
    #[arg(long, global = true)]
    pub key_prefix: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Apply command-line overrides on top of the environment configuration
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(url) = &self.redis_url {
            config.redis.url.clone_from(url);
        }
        if let Some(prefix) = &self.key_prefix {
            config.redis.key_prefix.clone_from(prefix);
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a category
    Add(AddArgs),
    /// Replace name, description and style of a category, creating it if missing
    Update(UpdateArgs),
    /// Delete a category
    Delete {
        #[arg(long)]
        id: CategoryId,
    },
    /// List every category
    List,
    /// Show one category
    Get {
        #[arg(long)]
        id: CategoryId,
    },
    /// Find categories by name
    Search(SearchArgs),
}

/// Card style flags; unset flags keep the default style
#[derive(Args, Debug, Default)]
pub struct StyleArgs {
    #[arg(long)]
    pub bg_color: Option<String>,
    #[arg(long)]
    pub bg_class: Option<String>,
    #[arg(long)]
    pub fg_color: Option<String>,
    #[arg(long)]
    pub fg_class: Option<String>,
    #[arg(long)]
    pub font_name: Option<String>,
    #[arg(long)]
    pub font_size: Option<f64>,
}

impl StyleArgs {
    fn into_style(self) -> CategoryStyle {
        let defaults = CategoryStyle::default();
        CategoryStyle {
            card_background_color: self.bg_color.unwrap_or(defaults.card_background_color),
            card_background_color_class: self
                .bg_class
                .unwrap_or(defaults.card_background_color_class),
            card_foreground_color: self.fg_color.unwrap_or(defaults.card_foreground_color),
            card_foreground_color_class: self
                .fg_class
                .unwrap_or(defaults.card_foreground_color_class),
            card_font_name: self.font_name.unwrap_or(defaults.card_font_name),
            card_font_size: self.font_size.unwrap_or(defaults.card_font_size),
        }
    }
}

#[derive(Args, Debug)]
pub struct AddArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long, default_value = "")]
    pub description: String,
    #[arg(long, default_value = "0")]
    pub checked: i32,
    /// Explicit id; assigned by the store when omitted
    #[arg(long)]
    pub id: Option<CategoryId>,
    #[command(flatten)]
    pub style: StyleArgs,
}

impl AddArgs {
    fn into_draft(self) -> CategoryDraft {
        let mut draft = CategoryDraft::new(self.name)
            .with_description(self.description)
            .with_checked(self.checked)
            .with_style(self.style.into_style());
        draft.id = self.id;
        draft
    }
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    #[arg(long)]
    pub id: CategoryId,
    #[arg(long)]
    pub name: String,
    #[arg(long, default_value = "")]
    pub description: String,
    #[command(flatten)]
    pub style: StyleArgs,
}

impl UpdateArgs {
    fn into_draft(self) -> CategoryDraft {
        CategoryDraft::new(self.name)
            .with_id(self.id)
            .with_description(self.description)
            .with_style(self.style.into_style())
    }
}

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Text to look for in category names
    pub text: String,
    /// Ignore case
    #[arg(long, conflicts_with = "pattern")]
    pub ignore_case: bool,
    /// Treat the text as a regular expression
    #[arg(long)]
    pub pattern: bool,
}

impl SearchArgs {
    fn into_query(self) -> NameQuery {
        if self.pattern {
            NameQuery::pattern(self.text)
        } else if self.ignore_case {
            NameQuery::case_insensitive(self.text)
        } else {
            NameQuery::literal(self.text)
        }
    }
}

/// Run one command against the repository, returning the JSON to print
pub async fn execute(store: &dyn CategoryRepository, command: Command) -> Result<Value> {
    let output = match command {
        Command::Add(args) => {
            let saved = store.add_category(args.into_draft().validate()?).await?;
            tracing::info!(id = saved.id, "Category added");
            serde_json::to_value(saved)?
        }
        Command::Update(args) => {
            let outcome = store.update_category(args.into_draft().validate()?).await?;
            tracing::info!(
                id = outcome.category().id,
                inserted = outcome.was_inserted(),
                "Category updated"
            );
            json!({
                "inserted": outcome.was_inserted(),
                "category": outcome.into_category(),
            })
        }
        Command::Delete { id } => {
            let removed = store.delete_category(id).await?;
            if removed == 0 {
                tracing::warn!(id, "No category with this id");
            }
            json!({ "removed": removed })
        }
        Command::List => serde_json::to_value(store.find_all().await?)?,
        Command::Get { id } => serde_json::to_value(store.find_by_id(id).await?)?,
        Command::Search(args) => serde_json::to_value(store.search(&args.into_query()).await?)?,
    };
    Ok(output)
}
