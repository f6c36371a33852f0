use chanview_core::layout::Document;
use chanview_core::markup::plain_text;

const CORPUS: &[&str] = &[
    "",
    "hello world",
    "A<br>B<br><br>C",
    "<strong>Bold</strong> and plain",
    "Post with a <a href=\"/b/res/123.html#124\" class=\"post-reply-link\" data-thread=\"123\" data-num=\"124\">&gt;&gt;124</a> reply",
    "Quote:<br><span class=\"unkfunc\">&gt;implying</span><br>end",
    "tabs\tand  double  spaces",
    "wide 漢字テキスト mixed with ascii words",
    "unknown <em>tags</em> <!-- comment --> are <u>ignored</u>",
    "<strong>outer <a href=\"https://example.org\">bold link</a> tail</strong> after",
    "entities: &amp; &lt;tag&gt; &quot;q&quot; &#1055;&#x440;&#1080;&#1074;&#1077;&#1090;",
    "newline\nin text\n\nkeeps breaks",
    "a 1 < 2 comparison and a lone & sign",
    "trailing space before break <br>next",
    "Supercalifragilisticexpialidocious is long",
];

const WIDTHS: &[u16] = &[1, 3, 8, 10, 17, 40, 200];

fn non_whitespace(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

#[test]
fn build_is_deterministic() {
    for markup in CORPUS {
        for &w in WIDTHS {
            let a = Document::build(markup, w).unwrap();
            let b = Document::build(markup, w).unwrap();
            assert_eq!(a, b, "markup={markup:?} width={w}");
        }
    }
}

#[test]
fn lines_fit_unless_a_single_block_is_too_wide() {
    for markup in CORPUS {
        for &w in WIDTHS {
            let doc = Document::build(markup, w).unwrap();
            for line in doc.lines() {
                let sum: usize = line.blocks().iter().map(|b| b.width).sum();
                assert_eq!(sum, line.width());
                assert!(
                    line.width() <= w as usize || line.blocks().len() == 1,
                    "markup={markup:?} width={w} line={:?}",
                    line.plain()
                );
            }
        }
    }
}

#[test]
fn no_characters_are_lost_when_nothing_wraps() {
    for markup in CORPUS {
        let doc = Document::build(markup, 200).unwrap();
        assert_eq!(
            doc.plain_lines().join("\n"),
            plain_text(markup).unwrap(),
            "markup={markup:?}"
        );
    }
}

#[test]
fn wrapping_only_drops_whitespace() {
    for markup in CORPUS {
        let expected = non_whitespace(&plain_text(markup).unwrap());
        for &w in WIDTHS {
            let doc = Document::build(markup, w).unwrap();
            assert_eq!(
                non_whitespace(&doc.plain_lines().concat()),
                expected,
                "markup={markup:?} width={w}"
            );
        }
    }
}

#[test]
fn every_break_starts_a_new_line() {
    for markup in CORPUS {
        let breaks = plain_text(markup).unwrap().matches('\n').count();
        for &w in WIDTHS {
            let doc = Document::build(markup, w).unwrap();
            assert!(doc.line_count() > breaks, "markup={markup:?} width={w}");
        }
        assert_eq!(Document::build(markup, 200).unwrap().line_count(), breaks + 1);
    }
}

#[test]
fn bold_and_link_attributes_stay_inside_their_tags() {
    let markup = CORPUS[9];
    for &w in WIDTHS {
        let doc = Document::build(markup, w).unwrap();
        for block in doc.lines().iter().flat_map(|l| l.blocks()) {
            if block.is_whitespace() {
                continue;
            }
            match block.text.as_str() {
                "outer" | "tail" => {
                    assert!(block.style.bold);
                    assert!(block.style.link.is_none());
                }
                "bold" | "link" => {
                    assert!(block.style.bold);
                    assert!(block.style.link.is_some());
                }
                "after" => assert!(block.style.is_plain()),
                // Words are never split, whatever the width.
                other => panic!("unexpected block {other:?} at width {w}"),
            }
        }
    }
}

#[test]
fn link_metadata_survives_layout() {
    let doc = Document::build(CORPUS[4], 12).unwrap();
    assert_eq!(doc.links().len(), 1);
    let (id, link) = doc.links().iter().next().unwrap();
    assert_eq!(link.target, "/b/res/123.html#124");
    assert_eq!(link.text, ">>124");
    assert_eq!(link.attr("data-num"), Some("124"));
    assert_eq!(link.attr("data-thread"), Some("123"));
    assert!(doc.line_of_link(id).is_some());
}

#[test]
fn resizing_is_a_fresh_build() {
    for markup in CORPUS {
        let narrow = Document::build(markup, 8).unwrap();
        let wide = Document::build(markup, 40).unwrap();
        assert_eq!(wide, Document::build(markup, 40).unwrap());
        assert_eq!(narrow.links(), wide.links());
    }
}
