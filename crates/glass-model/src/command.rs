use std::fmt;

use serde::{
    Deserialize, Deserializer, Serialize,
    de::{MapAccess, Visitor},
};

/// A pre-approved diagnostic command.
///
/// `template` is the command line without the target, e.g. `"ping -c 4"`. The target is
/// appended at execution time unless `ignore_target` is set.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommandTemplate {
    pub name: String,
    pub template: String,
    pub description: String,
    pub ignore_target: bool,
    /// Advisory only; surfaced to clients, not enforced.
    pub max_queue: Option<u32>,
}

impl CommandTemplate {
    pub fn new(name: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            template: template.into(),
            description: String::new(),
            ignore_target: false,
            max_queue: None,
        }
    }

    pub fn ignoring_target(mut self) -> Self {
        self.ignore_target = true;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Public view of a template returned to clients.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct CommandInfo {
    pub name: String,
    pub template: String,
    pub description: String,
    pub ignore_target: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_queue: Option<u32>,
}

impl From<&CommandTemplate> for CommandInfo {
    fn from(t: &CommandTemplate) -> Self {
        Self {
            name: t.name.clone(),
            template: t.template.clone(),
            description: t.description.clone(),
            ignore_target: t.ignore_target,
            max_queue: t.max_queue,
        }
    }
}

/// Read-only set of templates, kept in declaration order.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CommandCatalog {
    templates: Vec<CommandTemplate>,
}

impl CommandCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a template, replacing an earlier one with the same name in place.
    pub fn insert(&mut self, template: CommandTemplate) {
        match self.templates.iter_mut().find(|t| t.name == template.name) {
            Some(slot) => *slot = template,
            None => self.templates.push(template),
        }
    }

    pub fn with(mut self, template: CommandTemplate) -> Self {
        self.insert(template);
        self
    }

    pub fn get(&self, name: &str) -> Option<&CommandTemplate> {
        self.templates.iter().find(|t| t.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommandTemplate> {
        self.templates.iter()
    }

    pub fn infos(&self) -> Vec<CommandInfo> {
        self.templates.iter().map(CommandInfo::from).collect()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl FromIterator<CommandTemplate> for CommandCatalog {
    fn from_iter<I: IntoIterator<Item = CommandTemplate>>(iter: I) -> Self {
        let mut catalog = CommandCatalog::new();
        for t in iter {
            catalog.insert(t);
        }
        catalog
    }
}

/// Body of one entry under `commands:` in the configuration file.
#[derive(Deserialize)]
struct TemplateBody {
    template: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    ignore_target: bool,
    #[serde(default, alias = "maxmium_queue", alias = "maximum_queue")]
    max_queue: Option<u32>,
}

struct CatalogVisitor;

impl<'de> Visitor<'de> for CatalogVisitor {
    type Value = CommandCatalog;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of command name to command template")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut catalog = CommandCatalog::new();
        while let Some((name, body)) = map.next_entry::<String, TemplateBody>()? {
            catalog.insert(CommandTemplate {
                name,
                template: body.template,
                description: body.description,
                ignore_target: body.ignore_target,
                max_queue: body.max_queue,
            });
        }
        Ok(catalog)
    }
}

impl<'de> Deserialize<'de> for CommandCatalog {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(CatalogVisitor)
    }
}
