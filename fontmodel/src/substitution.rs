//! Substitution rules indexed by the glyph they produce

use std::collections::{BTreeSet, HashMap};

use write_fonts::types::Tag;

use crate::{source::SubstitutionRule, types::GlyphName};

/// One way of producing a glyph: these inputs, under these features.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RuleInputs {
    pub features: BTreeSet<Tag>,
    pub inputs: Vec<GlyphName>,
}

/// Adjacency from a produced glyph to every rule that produces it.
#[derive(Clone, Debug, Default)]
pub struct SubstitutionGraph {
    producers: HashMap<GlyphName, Vec<RuleInputs>>,
}

impl SubstitutionGraph {
    pub fn new(rules: impl IntoIterator<Item = SubstitutionRule>) -> Self {
        let mut producers = HashMap::<_, Vec<_>>::new();
        for rule in rules {
            producers.entry(rule.output).or_default().push(RuleInputs {
                features: rule.features,
                inputs: rule.inputs,
            });
        }
        for rules in producers.values_mut() {
            rules.sort();
            rules.dedup();
        }
        SubstitutionGraph { producers }
    }

    /// Rules producing `glyph`, ordered by features and then inputs.
    pub fn producers_of(&self, glyph: &str) -> &[RuleInputs] {
        self.producers
            .get(glyph)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(inputs: &[&str], output: &str, features: &[&[u8; 4]]) -> SubstitutionRule {
        SubstitutionRule {
            inputs: inputs.iter().copied().map(GlyphName::new).collect(),
            output: output.into(),
            features: features.iter().map(|tag| Tag::new(tag)).collect(),
        }
    }

    #[test]
    fn order_independent() {
        let rules = vec![
            rule(&["f", "i"], "f_i", &[b"liga"]),
            rule(&["f", "i"], "f_i", &[b"dlig"]),
            rule(&["f", "f", "i"], "f_i", &[b"liga"]),
        ];
        let forward = SubstitutionGraph::new(rules.clone());
        let backward = SubstitutionGraph::new(rules.into_iter().rev());
        assert_eq!(forward.producers_of("f_i"), backward.producers_of("f_i"));
        assert_eq!(
            forward.producers_of("f_i")[0].features,
            BTreeSet::from([Tag::new(b"dlig")])
        );
    }

    #[test]
    fn duplicates_collapse() {
        let graph = SubstitutionGraph::new(vec![
            rule(&["a"], "a.alt", &[b"salt"]),
            rule(&["a"], "a.alt", &[b"salt"]),
        ]);
        assert_eq!(graph.producers_of("a.alt").len(), 1);
        assert!(graph.producers_of("a").is_empty());
    }
}
