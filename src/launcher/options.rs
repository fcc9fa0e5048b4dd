//! Option editor over the config option registry.

use super::actions::Action;
use super::search::FuzzySearch;
use super::{Icon, Item, ItemArg, Workflow};
use crate::config::{OptionDef, OptionKind, OptionValue, OPTIONS};
use anyhow::{Context, Result};

const KEYWORD: &str = "options";

fn option_item(def: &OptionDef, current: &OptionValue, typed: Option<&str>) -> Result<Item> {
    let item = Item::new(def.key).autocomplete(format!("{} ", def.key));

    let item = match (def.kind, current) {
        (OptionKind::Bool, OptionValue::Bool(on)) => {
            let action = Action::SetOption {
                key: def.key.to_string(),
                value: OptionValue::Bool(!on),
            };
            item.subtitle(def.description)
                .icon(if *on { Icon::Checked } else { Icon::Unchecked })
                .arg(ItemArg::action(KEYWORD, &action))
        }
        (OptionKind::Integer, _) => match typed {
            Some(text) => {
                let value: i64 = text
                    .parse()
                    .with_context(|| format!("Invalid integer {:?} for {}", text, def.key))?;
                let action = Action::SetOption {
                    key: def.key.to_string(),
                    value: OptionValue::Integer(value),
                };
                item.subtitle(format!("Set to {}", value))
                    .arg(ItemArg::action(KEYWORD, &action))
            }
            None => item.subtitle(format!("{} ({})", def.description, current)),
        },
        _ => item.subtitle(current.to_string()),
    };

    Ok(item)
}

/// `name value` queries: name filters the registry, value sets an integer
pub fn items(wf: &Workflow, arg: &str) -> Result<Vec<Item>> {
    let arg = arg.trim();
    let (name, value) = match arg.split_once(char::is_whitespace) {
        Some((name, value)) => (name, Some(value.trim()).filter(|v| !v.is_empty())),
        None => (arg, None),
    };

    let mut search = FuzzySearch::new();
    OPTIONS
        .iter()
        .filter(|def| search.matches(def.key, name))
        .map(|def| option_item(def, &(def.get)(&wf.config), value))
        .collect()
}
