use crate::types::{Classification, ClassifiedLine, DocumentMetadata, DocumentTree, Section};

/// Title of the synthetic section collecting body text seen before any heading.
pub const PREAMBLE_TITLE: &str = "Document";

/// Deepest active nesting (H1 > H2 > H3).
const MAX_OPEN_DEPTH: usize = 3;

/// Build the outline from classified lines in reading order.
pub fn build(lines: &[ClassifiedLine], metadata: DocumentMetadata) -> DocumentTree {
    let sections = build_sections(
        lines
            .iter()
            .map(|l| (l.classification, l.line.text.as_str())),
    );
    log::debug!(
        "built {} top-level sections from {} lines",
        sections.len(),
        lines.len()
    );
    DocumentTree { metadata, sections }
}

/// Stack-based nesting over `(level, text)` pairs.
///
/// The stack holds the active H1 > H2 > H3 chain as paths into the tree.
/// Headings attach to an open section and become the new append target;
/// body text goes to the top of the stack. Sections stay attached after they
/// leave the stack, so the attached tree can nest deeper than the stack.
pub fn build_sections<'a, I>(items: I) -> Vec<Section>
where
    I: IntoIterator<Item = (Classification, &'a str)>,
{
    let mut builder = TreeBuilder::default();
    for (classification, text) in items {
        match classification {
            Classification::H1 => builder.open_h1(text),
            Classification::H2 => builder.open_h2(text),
            Classification::H3 => builder.open_h3(text),
            Classification::Body => builder.append_body(text),
        }
    }
    builder.finish()
}

/// Index path from the top-level list down to a section.
type SectionPath = Vec<usize>;

#[derive(Default)]
struct TreeBuilder {
    sections: Vec<Section>,
    stack: Vec<SectionPath>,
    preamble: Option<Section>,
}

impl TreeBuilder {
    fn open_h1(&mut self, title: &str) {
        let path = self.push_top_level(title);
        self.stack = vec![path];
    }

    fn open_h2(&mut self, title: &str) {
        if self.stack.is_empty() {
            return self.open_h1(title);
        }
        self.stack.truncate(1);
        let path = self.attach_to_top(title);
        self.stack.push(path);
    }

    fn open_h3(&mut self, title: &str) {
        if self.stack.is_empty() {
            return self.open_h1(title);
        }
        let path = self.attach_to_top(title);
        self.stack.truncate(MAX_OPEN_DEPTH - 1);
        self.stack.push(path);
    }

    fn append_body(&mut self, text: &str) {
        let target = match self.stack.last() {
            Some(path) => section_at_mut(&mut self.sections, path),
            None => None,
        };
        match target {
            Some(section) => section.content.push(text.to_string()),
            None => self
                .preamble
                .get_or_insert_with(|| Section::new(PREAMBLE_TITLE))
                .content
                .push(text.to_string()),
        }
    }

    fn push_top_level(&mut self, title: &str) -> SectionPath {
        self.sections.push(Section::new(title));
        vec![self.sections.len() - 1]
    }

    /// Attach a new child to the stack top and return its path.
    fn attach_to_top(&mut self, title: &str) -> SectionPath {
        let Some(parent_path) = self.stack.last().cloned() else {
            return self.push_top_level(title);
        };
        match section_at_mut(&mut self.sections, &parent_path) {
            Some(parent) => {
                parent.children.push(Section::new(title));
                let mut path = parent_path;
                path.push(parent.children.len() - 1);
                path
            }
            None => self.push_top_level(title),
        }
    }

    fn finish(self) -> Vec<Section> {
        let mut sections = self.sections;
        if let Some(preamble) = self.preamble.filter(|p| !p.content.is_empty()) {
            sections.insert(0, preamble);
        }
        sections
    }
}

fn section_at_mut<'a>(sections: &'a mut [Section], path: &[usize]) -> Option<&'a mut Section> {
    let (first, rest) = path.split_first()?;
    let mut section = sections.get_mut(*first)?;
    for &i in rest {
        section = section.children.get_mut(i)?;
    }
    Some(section)
}

/// Section counts for a finished tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SectionStats {
    pub top_level: usize,
    /// All sections at any depth, including the synthetic preamble.
    pub total: usize,
}

impl SectionStats {
    pub fn of(tree: &DocumentTree) -> Self {
        fn count(sections: &[Section]) -> usize {
            sections.iter().map(|s| 1 + count(&s.children)).sum()
        }
        SectionStats {
            top_level: tree.sections.len(),
            total: count(&tree.sections),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Classification::{Body, H1, H2, H3};

    fn section(title: &str, content: &[&str], children: Vec<Section>) -> Section {
        Section {
            title: title.to_string(),
            content: content.iter().map(|s| s.to_string()).collect(),
            children,
        }
    }

    fn titles(sections: &[Section]) -> Vec<&str> {
        sections.iter().map(|s| s.title.as_str()).collect()
    }

    // --- stack discipline ---

    #[test]
    fn test_stack_discipline() {
        let sections = build_sections(vec![
            (H1, "A"),
            (H2, "B"),
            (Body, "b1"),
            (H3, "C"),
            (Body, "c1"),
            (H2, "D"),
            (Body, "d1"),
        ]);

        let expected = vec![section(
            "A",
            &[],
            vec![
                section("B", &["b1"], vec![section("C", &["c1"], vec![])]),
                section("D", &["d1"], vec![]),
            ],
        )];
        assert_eq!(sections, expected);
    }

    #[test]
    fn test_h1_resets_the_stack() {
        let sections = build_sections(vec![
            (H1, "First"),
            (H2, "Sub"),
            (H3, "Deep"),
            (H1, "Second"),
            (Body, "text"),
        ]);
        assert_eq!(titles(&sections), vec!["First", "Second"]);
        assert_eq!(sections[1].content, vec!["text"]);
        assert!(sections[0].children[0].children[0].content.is_empty());
    }

    #[test]
    fn test_h3_directly_under_h1() {
        let sections = build_sections(vec![(H1, "A"), (H3, "a.1"), (Body, "x")]);
        assert_eq!(titles(&sections[0].children), vec!["a.1"]);
        assert_eq!(sections[0].children[0].content, vec!["x"]);
    }

    #[test]
    fn test_consecutive_h3_nest_under_previous_h3() {
        let sections = build_sections(vec![
            (H1, "A"),
            (H2, "B"),
            (H3, "C1"),
            (H3, "C2"),
            (Body, "c2 text"),
            (H3, "C3"),
        ]);
        let b = &sections[0].children[0];
        assert_eq!(titles(&b.children), vec!["C1"]);
        let c1 = &b.children[0];
        assert_eq!(titles(&c1.children), vec!["C2"]);
        let c2 = &c1.children[0];
        assert_eq!(c2.content, vec!["c2 text"]);
        assert_eq!(titles(&c2.children), vec!["C3"]);
    }

    #[test]
    fn test_second_h2_stops_feeding_previous_h3() {
        let sections = build_sections(vec![
            (H1, "A"),
            (H2, "B"),
            (H3, "C"),
            (H2, "D"),
            (Body, "for D"),
        ]);
        let a = &sections[0];
        assert!(a.children[0].children[0].content.is_empty());
        assert_eq!(a.children[1].content, vec!["for D"]);
    }

    // --- fallbacks ---

    #[test]
    fn test_h2_without_h1_is_top_level() {
        let sections = build_sections(vec![(H2, "Orphan"), (H3, "Child"), (Body, "x")]);
        assert_eq!(titles(&sections), vec!["Orphan"]);
        assert_eq!(titles(&sections[0].children), vec!["Child"]);
        assert_eq!(sections[0].children[0].content, vec!["x"]);
    }

    #[test]
    fn test_h3_without_h1_is_top_level() {
        let sections = build_sections(vec![(H3, "Orphan"), (Body, "x")]);
        assert_eq!(sections, vec![section("Orphan", &["x"], vec![])]);
    }

    // --- preamble ---

    #[test]
    fn test_leading_body_becomes_document_section() {
        let sections = build_sections(vec![(Body, "intro"), (H1, "A")]);
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0], section(PREAMBLE_TITLE, &["intro"], vec![]));
        assert_eq!(sections[1].title, "A");
    }

    #[test]
    fn test_no_document_section_without_leading_body() {
        let sections = build_sections(vec![(H1, "A"), (Body, "x")]);
        assert_eq!(sections, vec![section("A", &["x"], vec![])]);
    }

    #[test]
    fn test_only_body_text() {
        let sections = build_sections(vec![(Body, "one"), (Body, "two")]);
        assert_eq!(sections, vec![section(PREAMBLE_TITLE, &["one", "two"], vec![])]);
    }

    #[test]
    fn test_empty_input() {
        assert!(build_sections(Vec::new()).is_empty());
    }

    // --- build / stats ---

    #[test]
    fn test_build_keeps_metadata_and_round_trips() {
        use crate::types::{BBox, FeatureSet, NumberingPattern, TextLine};

        let features = FeatureSet {
            font_rank: 1,
            relative_size: 1.0,
            is_bold: false,
            is_italic: false,
            font_family: String::new(),
            word_count: 1,
            char_count: 1,
            is_short: true,
            is_very_short: true,
            is_all_caps: false,
            is_title_case: false,
            uppercase_ratio: 0.0,
            has_numbering: false,
            numbering_pattern: NumberingPattern::None,
            text_width_ratio: 0.1,
            is_left_aligned: true,
            is_centered: false,
            is_indented: false,
            indent_level: 0,
            left_margin: 50.0,
        };
        let line = |text: &str, classification| ClassifiedLine {
            line: TextLine {
                text: text.to_string(),
                page: 1,
                font_size: Some(12.0),
                font_family: String::new(),
                is_bold: false,
                is_italic: false,
                bbox: BBox::default(),
            },
            features: features.clone(),
            heading_score: 0.0,
            classification,
        };

        let lines = vec![
            line("preface", Body),
            line("Intro", H1),
            line("Scope", H2),
            line("text", Body),
        ];
        let metadata = DocumentMetadata::new("report.pdf", lines.len(), 1);
        let tree = build(&lines, metadata.clone());

        assert_eq!(tree.metadata, metadata);
        assert_eq!(titles(&tree.sections), vec![PREAMBLE_TITLE, "Intro"]);

        let json = serde_json::to_string(&tree).unwrap();
        assert_eq!(DocumentTree::from_json(&json).unwrap(), tree);
    }

    #[test]
    fn test_long_h3_run_round_trips() {
        let rows: Vec<String> = (1..=80).map(|i| format!("Row {i}")).collect();
        let items = std::iter::once((H1, "Top"))
            .chain(rows.iter().map(|t| (H3, t.as_str())));
        let tree = DocumentTree {
            metadata: DocumentMetadata::new("table.pdf", 81, 1),
            sections: build_sections(items),
        };

        let mut depth = 0;
        let mut level = &tree.sections;
        while let Some(section) = level.first() {
            depth += 1;
            level = &section.children;
        }
        assert_eq!(depth, 81);

        let json = serde_json::to_string_pretty(&tree).unwrap();
        assert_eq!(DocumentTree::from_json(&json).unwrap(), tree);
    }

    #[test]
    fn test_section_stats() {
        let tree = DocumentTree {
            metadata: DocumentMetadata::default(),
            sections: build_sections(vec![
                (Body, "intro"),
                (H1, "A"),
                (H2, "B"),
                (H3, "C"),
                (H1, "D"),
            ]),
        };
        let stats = SectionStats::of(&tree);
        assert_eq!(stats.top_level, 3);
        assert_eq!(stats.total, 5);
    }
}
