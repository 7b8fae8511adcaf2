//! Reply templates and mention facet generation.
//!
//! Templates come from a JSON array loaded once at startup. Each record
//! carries message text with a `$reciever` placeholder (spelling is part of
//! the template file format) and the byte offset where the substitution is
//! anchored. Which template a reply uses is an explicit, injectable policy.

use crate::error::{Error, Result};
use crate::xrpc::Facet;
use rand::seq::SliceRandom;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

/// Placeholder token substituted with the recipient's handle
pub const PLACEHOLDER: &str = "$reciever";

/// One reply template as stored in the templates file
#[derive(Debug, Clone, Deserialize)]
pub struct Template {
    pub value: String,
    pub entities: Vec<Entity>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Entity {
    pub index: EntityIndex,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EntityIndex {
    /// Byte offset of the substitution anchor within `value`
    pub start: usize,
}

/// Template selection policy.
///
/// `First` reproduces the deployed behavior (always template 0); `Random`
/// picks uniformly across the set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selector {
    #[default]
    First,
    Random,
}

impl Selector {
    fn pick<'a>(&self, templates: &'a [Template]) -> &'a Template {
        match self {
            Selector::First => &templates[0],
            Selector::Random => templates
                .choose(&mut rand::thread_rng())
                .unwrap_or(&templates[0]),
        }
    }
}

impl FromStr for Selector {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "first" => Ok(Selector::First),
            "random" => Ok(Selector::Random),
            other => Err(Error::Other(format!(
                "Unknown template selection policy: {other} (expected \"first\" or \"random\")"
            ))),
        }
    }
}

/// The loaded-once, read-only template collection
#[derive(Debug, Clone)]
pub struct TemplateSet {
    templates: Vec<Template>,
}

impl TemplateSet {
    /// Load and validate the templates file
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let templates: Vec<Template> = serde_json::from_str(&raw)?;
        Self::from_templates(templates)
    }

    /// Validate an in-memory template collection
    pub fn from_templates(templates: Vec<Template>) -> Result<Self> {
        if templates.is_empty() {
            return Err(Error::NoTemplates);
        }
        for (index, template) in templates.iter().enumerate() {
            if !template.value.contains(PLACEHOLDER) {
                return Err(Error::MalformedTemplate {
                    index,
                    reason: format!("text has no {PLACEHOLDER} placeholder"),
                });
            }
            if template.entities.is_empty() {
                return Err(Error::MalformedTemplate {
                    index,
                    reason: "no substitution anchor".to_string(),
                });
            }
        }
        Ok(Self { templates })
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Render a reply to `handle`, mentioning `did`.
    ///
    /// Substitutes the placeholder and tags the substituted byte range
    /// `[start, start + handle.len())` as a mention. Pure aside from the
    /// log line.
    pub fn generate(&self, selector: Selector, handle: &str, did: &str) -> (String, Vec<Facet>) {
        info!("Sending hug to: {}", handle);
        let template = selector.pick(&self.templates);
        let text = template.value.replace(PLACEHOLDER, handle);
        let start = template.entities[0].index.start;
        let end = start + handle.len();
        (text, vec![Facet::mention(did, start, end)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xrpc::FacetFeature;
    use tempfile::tempdir;

    fn template(value: &str, start: usize) -> Template {
        Template {
            value: value.to_string(),
            entities: vec![Entity {
                index: EntityIndex { start },
            }],
        }
    }

    #[test]
    fn test_generate_substitutes_and_tags_mention() {
        let set =
            TemplateSet::from_templates(vec![template("Hug for $reciever!", 9)]).unwrap();

        let (text, facets) = set.generate(Selector::First, "alice", "did:x");

        assert_eq!(text, "Hug for alice!");
        assert_eq!(facets.len(), 1);
        assert_eq!(facets[0].index.byte_start, 9);
        assert_eq!(facets[0].index.byte_end, 14);
        assert_eq!(
            facets[0].features,
            vec![FacetFeature::Mention {
                did: "did:x".to_string()
            }]
        );
    }

    #[test]
    fn test_first_selector_always_picks_template_zero() {
        let set = TemplateSet::from_templates(vec![
            template("A $reciever", 2),
            template("B $reciever", 2),
        ])
        .unwrap();

        for _ in 0..10 {
            let (text, _) = set.generate(Selector::First, "x", "did:x");
            assert_eq!(text, "A x");
        }
    }

    #[test]
    fn test_random_selector_stays_within_set() {
        let set = TemplateSet::from_templates(vec![
            template("A $reciever", 2),
            template("B $reciever", 2),
        ])
        .unwrap();

        for _ in 0..20 {
            let (text, _) = set.generate(Selector::Random, "x", "did:x");
            assert!(text == "A x" || text == "B x");
        }
    }

    #[test]
    fn test_empty_set_rejected() {
        assert!(matches!(
            TemplateSet::from_templates(vec![]),
            Err(Error::NoTemplates)
        ));
    }

    #[test]
    fn test_missing_placeholder_rejected() {
        let result = TemplateSet::from_templates(vec![template("no placeholder", 0)]);
        assert!(matches!(
            result,
            Err(Error::MalformedTemplate { index: 0, .. })
        ));
    }

    #[test]
    fn test_missing_anchor_rejected() {
        let result = TemplateSet::from_templates(vec![Template {
            value: "Hi $reciever".to_string(),
            entities: vec![],
        }]);
        assert!(matches!(
            result,
            Err(Error::MalformedTemplate { index: 0, .. })
        ));
    }

    #[test]
    fn test_load_from_file() {
        let temp = tempdir().expect("Failed to create temp dir");
        let path = temp.path().join("templates.json");
        std::fs::write(
            &path,
            r#"[{"value": "Hug for $reciever!", "entities": [{"index": {"start": 9}}]}]"#,
        )
        .unwrap();

        let set = TemplateSet::load(&path).unwrap();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_selector_from_str() {
        assert_eq!(Selector::from_str("first").unwrap(), Selector::First);
        assert_eq!(Selector::from_str("random").unwrap(), Selector::Random);
        assert!(Selector::from_str("fancy").is_err());
    }
}
