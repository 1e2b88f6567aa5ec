use write_fonts::{
    tables::{
        gpos::{
            builders::{
                AnchorBuilder, MarkToBaseBuilder, MarkToMarkBuilder, PairPosBuilder,
                ValueRecordBuilder,
            },
            MarkBasePosFormat1, MarkMarkPosFormat1, PairPos,
        },
        layout::builders::Builder,
        variations::ivs_builder::VariationStoreBuilder,
    },
    types::GlyphId16,
};

use super::marks::AttachmentRule;

// kerning and anchors by raw gid, without value record noise
pub trait SimplePairPosBuilder {
    fn add_pair(&mut self, gid1: u16, gid2: u16, x_adv: i16);
    fn add_class(&mut self, class1: &[u16], class2: &[u16], x_adv: i16);
    fn build_subtables(self) -> Vec<PairPos>;
}

impl SimplePairPosBuilder for PairPosBuilder {
    fn add_pair(&mut self, gid1: u16, gid2: u16, x_adv: i16) {
        self.insert_pair(
            GlyphId16::new(gid1),
            ValueRecordBuilder::new().with_x_advance(x_adv),
            GlyphId16::new(gid2),
            ValueRecordBuilder::new(),
        )
    }

    fn add_class(&mut self, class1: &[u16], class2: &[u16], x_adv: i16) {
        let class1 = class1.iter().copied().map(GlyphId16::new).collect();
        let class2 = class2.iter().copied().map(GlyphId16::new).collect();
        let record1 = ValueRecordBuilder::new().with_x_advance(x_adv);
        self.insert_classes(class1, record1, class2, ValueRecordBuilder::new())
    }

    fn build_subtables(self) -> Vec<PairPos> {
        self.build(&mut VariationStoreBuilder::new(0))
    }
}

pub trait SimpleMarkBuilder {
    type Subtable;
    fn add_mark(&mut self, gid: u16, class: &str, anchor: (i16, i16));
    fn add_base(&mut self, gid: u16, class: &str, anchor: (i16, i16));
    fn build_exactly_one_subtable(self) -> Self::Subtable;
}

impl SimpleMarkBuilder for MarkToBaseBuilder {
    type Subtable = MarkBasePosFormat1;

    fn add_mark(&mut self, gid: u16, class: &str, anchor: (i16, i16)) {
        let anchor = AnchorBuilder::new(anchor.0, anchor.1);
        self.insert_mark(GlyphId16::new(gid), class, anchor).unwrap();
    }

    fn add_base(&mut self, gid: u16, class: &str, anchor: (i16, i16)) {
        let anchor = AnchorBuilder::new(anchor.0, anchor.1);
        self.insert_base(GlyphId16::new(gid), class, anchor)
    }

    fn build_exactly_one_subtable(self) -> MarkBasePosFormat1 {
        let subs = self.build(&mut VariationStoreBuilder::new(0));
        assert_eq!(subs.len(), 1);
        subs.into_iter().next().unwrap()
    }
}

impl SimpleMarkBuilder for MarkToMarkBuilder {
    type Subtable = MarkMarkPosFormat1;

    fn add_mark(&mut self, gid: u16, class: &str, anchor: (i16, i16)) {
        let anchor = AnchorBuilder::new(anchor.0, anchor.1);
        self.insert_mark1(GlyphId16::new(gid), class, anchor).unwrap();
    }

    fn add_base(&mut self, gid: u16, class: &str, anchor: (i16, i16)) {
        let anchor = AnchorBuilder::new(anchor.0, anchor.1);
        self.insert_mark2(GlyphId16::new(gid), class, anchor)
    }

    fn build_exactly_one_subtable(self) -> MarkMarkPosFormat1 {
        let subs = self.build(&mut VariationStoreBuilder::new(0));
        assert_eq!(subs.len(), 1);
        subs.into_iter().next().unwrap()
    }
}

/// (base gid, base anchor, mark gid, mark anchor), one per attached mark
pub type SimpleAnchorRule = (u16, (i32, i32), u16, (i32, i32));

pub(super) fn simple_anchor_rules(rules: &[AttachmentRule]) -> Vec<SimpleAnchorRule> {
    let mut result = rules
        .iter()
        .flat_map(|rule| {
            rule.marks.iter().map(|(mark, anchor)| {
                (
                    rule.base.to_u16(),
                    (rule.base_anchor.x, rule.base_anchor.y),
                    mark.to_u16(),
                    (anchor.x, anchor.y),
                )
            })
        })
        .collect::<Vec<_>>();
    result.sort_unstable();
    result
}
