//! Finding a shaping input for every glyph

use std::collections::{BTreeSet, HashMap, HashSet};

use write_fonts::types::Tag;

use crate::{
    glyph_input::GlyphInput,
    source::{FontSource, RawGlyphMetrics},
    substitution::{RuleInputs, SubstitutionGraph},
    types::{GlyphName, SnapshotId},
};

/// Sorted feature tags and the text they apply to.
///
/// The derived ordering is the selection order: features compared tag by tag
/// (a prefix sorts first), then text.
type Candidate = (Vec<Tag>, String);

/// Per-glyph search for the simplest input that produces each glyph.
///
/// A resolver is bound to one font snapshot; everything it caches is only
/// meaningful for that snapshot.
#[derive(Debug)]
pub struct InputResolver {
    snapshot: SnapshotId,
    glyph_order: Vec<GlyphName>,
    codepoints: HashMap<GlyphName, BTreeSet<u32>>,
    graph: SubstitutionGraph,
    /// (advance, visual width)
    widths: HashMap<GlyphName, (i32, i32)>,
    space_width: i32,
    memo: HashMap<(SnapshotId, GlyphName), Option<Candidate>>,
    /// Frames pushed over the resolver's lifetime.
    expansions: usize,
}

/// One glyph being resolved: its candidates so far and the rule being tried.
struct Frame<'a> {
    glyph: GlyphName,
    candidates: Vec<Candidate>,
    rules: &'a [RuleInputs],
    rule_ix: usize,
    component_ix: usize,
    /// Resolved inputs of the current rule, in order.
    parts: Vec<Candidate>,
    /// Some branch of this search ended at a glyph already on the stack.
    tainted: bool,
}

impl<'a> Frame<'a> {
    fn new(
        glyph: GlyphName,
        graph: &'a SubstitutionGraph,
        codepoints: &HashMap<GlyphName, BTreeSet<u32>>,
    ) -> Self {
        let candidates = codepoints
            .get(&glyph)
            .into_iter()
            .flatten()
            .filter(|cp| **cp != 0)
            .filter_map(|cp| char::from_u32(*cp))
            .map(|c| (Vec::new(), c.to_string()))
            .collect();
        Frame {
            rules: graph.producers_of(glyph.as_str()),
            glyph,
            candidates,
            rule_ix: 0,
            component_ix: 0,
            parts: Vec::new(),
            tainted: false,
        }
    }

    /// The next input glyph that needs resolving, or `None` once every rule
    /// has been tried.
    fn next_component(&mut self) -> Option<&'a GlyphName> {
        let rules = self.rules;
        loop {
            let rule = rules.get(self.rule_ix)?;
            if rule.inputs.is_empty() {
                self.next_rule();
                continue;
            }
            if let Some(component) = rule.inputs.get(self.component_ix) {
                return Some(component);
            }
            let mut features = rule.features.clone();
            let mut text = String::new();
            for (part_features, part_text) in self.parts.drain(..) {
                features.extend(part_features);
                text.push_str(&part_text);
            }
            self.candidates.push((features.into_iter().collect(), text));
            self.next_rule();
        }
    }

    fn component_resolved(&mut self, part: Candidate) {
        self.parts.push(part);
        self.component_ix += 1;
    }

    fn next_rule(&mut self) {
        self.rule_ix += 1;
        self.component_ix = 0;
        self.parts.clear();
    }
}

impl InputResolver {
    pub fn new(source: &impl FontSource, snapshot: SnapshotId) -> Self {
        Self::with_metrics(source, &source.glyph_metrics(), snapshot)
    }

    /// Like [`InputResolver::new`], reusing metrics already read from `source`.
    pub(crate) fn with_metrics(
        source: &impl FontSource,
        metrics: &[RawGlyphMetrics],
        snapshot: SnapshotId,
    ) -> Self {
        let codepoints = source.reverse_cmap();
        let widths: HashMap<_, _> = metrics
            .iter()
            .map(|metrics| {
                (
                    metrics.name.clone(),
                    (metrics.advance, metrics.visual_width()),
                )
            })
            .collect();
        let space_width = codepoints
            .iter()
            .filter(|(_, cps)| cps.contains(&0x20))
            .map(|(name, _)| name)
            .min()
            .and_then(|space| widths.get(space))
            .map(|(advance, _)| *advance)
            .unwrap_or_default();
        let graph = SubstitutionGraph::new(source.substitution_rules());
        log::debug!(
            "resolver for {snapshot:?}: {} encoded glyphs, space width {space_width}",
            codepoints.len()
        );
        InputResolver {
            snapshot,
            glyph_order: source.glyph_order(),
            codepoints,
            graph,
            widths,
            space_width,
            memo: HashMap::new(),
            expansions: 0,
        }
    }

    pub fn snapshot(&self) -> SnapshotId {
        self.snapshot
    }

    /// One input for every glyph, in glyph order.
    ///
    /// Zero-advance glyphs are padded with leading spaces.
    pub fn all_inputs(&mut self) -> Vec<GlyphInput> {
        let glyph_order = std::mem::take(&mut self.glyph_order);
        let inputs: Vec<_> = glyph_order
            .iter()
            .map(|name| {
                let zero_width = self
                    .widths
                    .get(name)
                    .map(|(advance, _)| *advance == 0)
                    .unwrap_or(true);
                self.input_from_name(name.as_str(), zero_width)
            })
            .collect();
        self.glyph_order = glyph_order;
        log::debug!(
            "{} glyph inputs after {} expansions",
            inputs.len(),
            self.expansions
        );
        inputs
    }

    /// The input for a single glyph.
    ///
    /// With `pad`, the text is prefixed with enough spaces to cover the
    /// glyph's visual width, provided the font has a space glyph.
    pub fn input_from_name(&mut self, name: &str, pad: bool) -> GlyphInput {
        let name = GlyphName::new(name);
        match self.resolve(&name) {
            Some((features, text)) => {
                let padding = if pad { self.padding(&name) } else { 0 };
                GlyphInput::resolved(name, features, text, padding, self.snapshot)
            }
            None => GlyphInput::unresolved(name, self.snapshot),
        }
    }

    fn padding(&self, name: &GlyphName) -> usize {
        let Some((_, visual_width)) = self.widths.get(name) else {
            return 0;
        };
        if self.space_width <= 0 || *visual_width <= 0 {
            return 0;
        }
        // ceiling division
        ((visual_width + self.space_width - 1) / self.space_width) as usize
    }

    #[cfg(test)]
    fn is_cached(&self, name: &str) -> bool {
        self.memo
            .contains_key(&(self.snapshot, GlyphName::new(name)))
    }

    /// Depth first search over the rules producing `root`.
    ///
    /// Every glyph on the stack is in `visiting`; reaching one of them again
    /// fails that branch only. A glyph whose search was cut that way is not
    /// memoized, but it is not expanded again before `root` is done.
    fn resolve(&mut self, root: &GlyphName) -> Option<Candidate> {
        let InputResolver {
            snapshot,
            codepoints,
            graph,
            memo,
            expansions,
            ..
        } = self;
        let (snapshot, codepoints, graph) = (*snapshot, &*codepoints, &*graph);
        if let Some(hit) = memo.get(&(snapshot, root.clone())) {
            return hit.clone();
        }

        let mut stack = vec![Frame::new(root.clone(), graph, codepoints)];
        let mut visiting = HashSet::from([root.clone()]);
        let mut failed_here = HashSet::new();
        *expansions += 1;
        // the outcome of the frame last popped: (result, cut by the cycle guard)
        let mut returned: Option<(Option<Candidate>, bool)> = None;

        while let Some(frame) = stack.last_mut() {
            match returned.take() {
                Some((Some(part), _)) => frame.component_resolved(part),
                Some((None, tainted)) => {
                    frame.tainted |= tainted;
                    frame.next_rule();
                }
                None => (),
            }

            if let Some(component) = frame.next_component() {
                if let Some(hit) = memo.get(&(snapshot, component.clone())) {
                    returned = Some((hit.clone(), false));
                } else if visiting.contains(component) {
                    log::trace!("cycle through '{component}' while resolving '{root}'");
                    returned = Some((None, true));
                } else if failed_here.contains(component) {
                    returned = Some((None, true));
                } else {
                    *expansions += 1;
                    visiting.insert(component.clone());
                    stack.push(Frame::new(component.clone(), graph, codepoints));
                }
                continue;
            }

            let Some(frame) = stack.pop() else {
                break;
            };
            visiting.remove(&frame.glyph);
            let result = frame.candidates.into_iter().min();
            // a failure that depends on which glyphs were on the stack may
            // succeed when reached another way
            if result.is_some() || !frame.tainted {
                memo.insert((snapshot, frame.glyph), result.clone());
            } else {
                failed_here.insert(frame.glyph);
            }
            if stack.is_empty() {
                return result;
            }
            returned = Some((result, frame.tainted));
        }
        None
    }
}
