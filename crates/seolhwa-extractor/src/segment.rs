//! Positional section segmentation
//!
//! A folklore page carries numbered headers (`① 개요`, `② 내용`, ...).
//! Each configured marker is searched once; the located markers are sorted
//! by start offset and every section runs from the end of its marker to the
//! start of the next located marker, or to the end of the text. Text before
//! the first located marker belongs to no section.
//!
//! Markers that appear out of document order are not corrected: the sort by
//! start offset is the only ordering applied.

use std::collections::HashSet;
use std::ops::Range;

use regex::Regex;

use seolhwa_core::{Result, Section, SectionedText, SeolhwaError};

use crate::rules::{compile, ExtractionRules, SectionMarker};

/// One located section in the source text (byte offsets)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionSpan {
    pub section: Section,
    /// Where the marker match begins
    pub marker_start: usize,
    /// Where the section body begins (end of the marker match)
    pub content_start: usize,
    /// Where the section body ends (next marker or end of text)
    pub end: usize,
}

impl SectionSpan {
    pub fn marker(&self) -> Range<usize> {
        self.marker_start..self.content_start
    }

    /// Body range; empty when the next marker overlaps this one
    pub fn content(&self) -> Range<usize> {
        self.content_start..self.end.max(self.content_start)
    }
}

/// Splits raw text into named sections using ordered marker patterns
#[derive(Debug, Clone)]
pub struct SectionSegmenter {
    markers: Vec<(Section, Regex)>,
    keyword_delimiters: Regex,
}

impl SectionSegmenter {
    /// Build from marker patterns; each section may be configured once
    pub fn new(markers: &[SectionMarker], keyword_delimiters: &str) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut compiled = Vec::with_capacity(markers.len());

        for marker in markers {
            if !seen.insert(marker.section) {
                return Err(SeolhwaError::Validation(format!(
                    "section `{}` has more than one marker",
                    marker.section
                )));
            }
            compiled.push((marker.section, compile(&marker.pattern)?));
        }

        Ok(Self {
            markers: compiled,
            keyword_delimiters: compile(keyword_delimiters)?,
        })
    }

    pub fn from_rules(rules: &ExtractionRules) -> Result<Self> {
        Self::new(&rules.section_markers, &rules.keyword_delimiters)
    }

    /// Locate every marker's first match, ordered by start offset
    pub fn locate(&self, text: &str) -> Vec<SectionSpan> {
        let mut found: Vec<(usize, Section, usize)> = self
            .markers
            .iter()
            .filter_map(|(section, regex)| {
                regex
                    .find(text)
                    .map(|mat| (mat.start(), *section, mat.end()))
            })
            .collect();

        // Stable, so equal offsets keep configuration order
        found.sort_by_key(|(start, _, _)| *start);

        let ends: Vec<usize> = found
            .iter()
            .skip(1)
            .map(|(start, _, _)| *start)
            .chain(std::iter::once(text.len()))
            .collect();

        found
            .into_iter()
            .zip(ends)
            .map(|((marker_start, section, content_start), end)| SectionSpan {
                section,
                marker_start,
                content_start,
                end,
            })
            .collect()
    }

    /// Segment text into trimmed sections; the keyword section is split into terms
    pub fn segment(&self, text: &str) -> SectionedText {
        let mut sections = SectionedText::default();

        for span in self.locate(text) {
            let body = text[span.content()].trim();
            let slot = match span.section {
                Section::Summary => &mut sections.summary,
                Section::Content => &mut sections.content,
                Section::Features => &mut sections.features,
                Section::Source => &mut sections.source,
                Section::Related => &mut sections.related,
                Section::Keywords => {
                    sections.keywords = Some(self.split_keywords(body));
                    continue;
                }
            };
            *slot = Some(body.to_string());
        }

        sections
    }

    fn split_keywords(&self, body: &str) -> Vec<String> {
        self.keyword_delimiters
            .split(body)
            .map(str::trim)
            .filter(|kw| !kw.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn segmenter() -> SectionSegmenter {
        SectionSegmenter::from_rules(&ExtractionRules::default()).unwrap()
    }

    const PAGE: &str = "제주설화 12쪽\n① 개요\n한라산이 생긴 이야기.\n② 내용\n옛날에 설문대할망이 살았다.\n\
                        ③ 특징\n창조 신화의 성격.\n④ 핵심어\n설문대할망, 한라산，창조. 오름\n\
                        ⑤ 원전 서지사항\n제주설화집성\n⑥ 관련 자료\n없음";

    #[test]
    fn test_segment_all_sections() {
        let sections = segmenter().segment(PAGE);

        assert_eq!(sections.text(Section::Summary), "한라산이 생긴 이야기.");
        assert_eq!(sections.text(Section::Content), "옛날에 설문대할망이 살았다.");
        assert_eq!(sections.text(Section::Features), "창조 신화의 성격.");
        assert_eq!(
            sections.keywords(),
            &["설문대할망", "한라산", "창조", "오름"]
        );
        assert_eq!(sections.text(Section::Source), "제주설화집성");
        assert_eq!(sections.text(Section::Related), "없음");
    }

    #[test]
    fn test_prefix_before_first_marker_is_discarded() {
        let sections = segmenter().segment(PAGE);
        let all: Vec<&str> = Section::ALL
            .iter()
            .map(|s| sections.text(*s))
            .collect();
        assert!(all.iter().all(|t| !t.contains("12쪽")));
    }

    #[test]
    fn test_digit_markers() {
        let sections = segmenter().segment("1 개요 짧은 요약 2내용 본문");
        assert_eq!(sections.text(Section::Summary), "짧은 요약");
        assert_eq!(sections.text(Section::Content), "본문");
        assert!(!sections.is_present(Section::Features));
    }

    #[test]
    fn test_no_markers_yields_empty_sections() {
        let sections = segmenter().segment("표지만 있는 페이지");
        assert!(sections.is_empty());
        assert_eq!(sections.text(Section::Content), "");
        assert!(sections.keywords().is_empty());
    }

    #[test]
    fn test_only_first_occurrence_is_used() {
        let sections = segmenter().segment("① 개요 첫째 ② 내용 본문 ① 개요 둘째");
        assert_eq!(sections.text(Section::Summary), "첫째");
        assert_eq!(sections.text(Section::Content), "본문 ① 개요 둘째");
    }

    #[test]
    fn test_out_of_order_markers_follow_offsets() {
        let sections = segmenter().segment("② 내용 본문 ① 개요 요약");
        assert_eq!(sections.text(Section::Content), "본문");
        assert_eq!(sections.text(Section::Summary), "요약");
    }

    #[test]
    fn test_last_section_runs_to_end() {
        let spans = segmenter().locate("머리말 ③ 특징 끝까지");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].section, Section::Features);
        assert_eq!(spans[0].end, "머리말 ③ 특징 끝까지".len());
    }

    #[test]
    fn test_empty_keyword_fragments_dropped() {
        let sections = segmenter().segment("④ 핵심어 ,, 도깨비 ,。\n 장닭 .");
        assert_eq!(sections.keywords(), &["도깨비", "장닭"]);
    }

    #[test]
    fn test_overlapping_markers_do_not_panic() {
        let markers = vec![
            SectionMarker::new(Section::Summary, "개요 본문"),
            SectionMarker::new(Section::Content, "본문"),
        ];
        let segmenter = SectionSegmenter::new(&markers, r"[,]").unwrap();
        let sections = segmenter.segment("개요 본문 나머지");
        assert_eq!(sections.text(Section::Summary), "");
        assert_eq!(sections.text(Section::Content), "나머지");
    }

    #[test]
    fn test_duplicate_section_rejected() {
        let markers = vec![
            SectionMarker::new(Section::Summary, "개요"),
            SectionMarker::new(Section::Summary, "요약"),
        ];
        assert!(SectionSegmenter::new(&markers, r"[,]").is_err());
    }

    #[test]
    fn test_invalid_marker_pattern() {
        let markers = vec![SectionMarker::new(Section::Summary, "[개요")];
        let err = SectionSegmenter::new(&markers, r"[,]").unwrap_err();
        assert!(matches!(err, SeolhwaError::InvalidPattern { .. }));
    }

    fn header(section: Section) -> &'static str {
        match section {
            Section::Summary => "① 개요",
            Section::Content => "② 내용",
            Section::Features => "③ 특징",
            Section::Keywords => "④ 핵심어",
            Section::Source => "⑤ 원전 서지사항",
            Section::Related => "⑥ 관련 자료",
        }
    }

    // Bodies drawn from characters that can never form a marker
    fn body() -> impl Strategy<Value = String> {
        "[가-하a-z ,\n]{0,24}"
    }

    proptest! {
        #[test]
        fn prop_spans_reassemble_suffix(
            prefix in body(),
            parts in proptest::collection::vec((any::<bool>(), body()), 6),
        ) {
            let mut text = prefix.clone();
            for (section, (present, part)) in Section::ALL.iter().zip(&parts) {
                if *present {
                    text.push_str(header(*section));
                    text.push_str(part);
                }
            }

            let spans = segmenter().locate(&text);
            let expected = parts.iter().filter(|(present, _)| *present).count();
            prop_assert_eq!(spans.len(), expected);

            let rebuilt: String = spans
                .iter()
                .map(|s| format!("{}{}", &text[s.marker()], &text[s.content()]))
                .collect();
            let suffix = spans.first().map(|s| &text[s.marker_start..]).unwrap_or("");
            prop_assert_eq!(rebuilt.as_str(), suffix);
        }

        #[test]
        fn prop_no_markers_all_empty(text in body()) {
            let sections = segmenter().segment(&text);
            prop_assert!(sections.is_empty());
        }
    }
}
