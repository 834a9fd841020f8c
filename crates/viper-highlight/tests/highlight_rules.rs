use pretty_assertions::assert_eq;
use proptest::prelude::*;
use viper_highlight::{ColorCategory, HighlightDriver, HighlightInfo, highlight_text};

fn assert_sorted_disjoint(spans: &[HighlightInfo]) {
    for pair in spans.windows(2) {
        assert!(
            pair[0].end <= pair[1].start,
            "overlapping spans: {:?} and {:?}",
            pair[0],
            pair[1]
        );
    }
    for span in spans {
        assert!(span.start < span.end, "empty span: {span:?}");
    }
}

#[test]
fn test_comment_swallows_keywords_and_strings() {
    let line = r#"// int x = "keyword inside string";"#;
    let spans = highlight_text(line, 0, "java");
    assert_eq!(
        spans,
        vec![HighlightInfo::new(0, line.chars().count(), ColorCategory::Comment)]
    );
}

#[test]
fn test_keyword_inside_string_is_string() {
    let text = r#"s = "return";"#;
    let spans = highlight_text(text, 0, "java");
    assert!(spans.iter().all(|s| s.category != ColorCategory::Keyword));
    assert!(spans.contains(&HighlightInfo::new(4, 12, ColorCategory::String)));
}

#[test]
fn test_html_document() {
    let text = "<!-- hi -->\n<p class=\"x\">text</p>";
    let spans = HighlightDriver::new("html").highlight_text(text, 0);
    assert_sorted_disjoint(&spans);

    let categories: Vec<_> = spans.iter().map(|s| s.category).collect();
    assert_eq!(
        categories,
        vec![
            ColorCategory::Comment,
            ColorCategory::Tag,
            ColorCategory::Attribute,
            ColorCategory::String,
            ColorCategory::Tag,
            ColorCategory::Tag,
            ColorCategory::Tag,
        ]
    );
}

#[test]
fn test_css_block_comment_and_selector_hash() {
    let text = "/* a: b; */\n#id { margin: 0; }";
    let spans = highlight_text(text, 0, "css");
    assert_sorted_disjoint(&spans);
    assert_eq!(spans[0], HighlightInfo::new(0, 11, ColorCategory::Comment));
    assert!(spans.iter().any(|s| s.category == ColorCategory::Attribute));
    assert!(spans.iter().any(|s| s.category == ColorCategory::AttributeValue));
    assert!(
        spans
            .iter()
            .filter(|s| s.category == ColorCategory::Comment)
            .count()
            == 1
    );
}

#[test]
fn test_properties_file_keeps_slashes() {
    let text = "path=//server/share # remote";
    let spans = highlight_text(text, 0, "prop");
    let comments: Vec<_> = spans
        .iter()
        .filter(|s| s.category == ColorCategory::Comment)
        .collect();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].start, 20);
}

#[test]
fn test_unknown_extension_uses_plain_rules() {
    let spans = highlight_text("if 42", 5, "unknownext");
    assert_eq!(
        spans,
        vec![
            HighlightInfo::new(5, 7, ColorCategory::Keyword),
            HighlightInfo::new(8, 10, ColorCategory::Number),
        ]
    );
}

proptest! {
    #[test]
    fn prop_spans_never_overlap(
        text in r#"[a-z0-9 "'/*#<>=:;{}\n.-]{0,120}"#,
        ext in prop::sample::select(vec!["java", "py", "php", "html", "css", "sql", "md", "txt", "lua"]),
        offset in 0usize..1000,
    ) {
        let spans = highlight_text(&text, offset, ext);
        let char_len = text.chars().count();
        for pair in spans.windows(2) {
            prop_assert!(pair[0].end <= pair[1].start);
        }
        for span in &spans {
            prop_assert!(span.start >= offset);
            prop_assert!(span.end <= offset + char_len);
            prop_assert!(span.start < span.end);
        }
    }
}
