// src/extractors/row.rs

use once_cell::sync::Lazy;
use scraper::{node::Node, ElementRef, Selector};

static ROW_HEADER_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("th").expect("Failed to compile ROW_HEADER_SELECTOR")
});

static TIP_IN_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("a.tip_in").expect("Failed to compile TIP_IN_SELECTOR")
});

static TXT_ACD_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("span.txt_acd").expect("Failed to compile TXT_ACD_SELECTOR")
});

static LABEL_CONTAINER_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("div").expect("Failed to compile LABEL_CONTAINER_SELECTOR")
});

/// Classes left out of container labels: the inline unit annotation
/// (e.g. `(%)`, `(억원)`) and screen-reader text of expand buttons.
const HIDDEN_LABEL_CLASSES: [&str; 2] = ["csize", "blind"];

/// Collapses runs of regular and non-breaking whitespace into one space and trims.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Extracts the indicator label of a table row, normalized.
///
/// Returns an empty string when the row has no usable label; callers skip such rows.
pub fn extract_row_label(row: ElementRef) -> String {
    normalize_whitespace(&raw_row_label(row))
}

/// Same strategies as [`extract_row_label`] but keeps the text untouched,
/// including the leading non-breaking spaces some tables use for indentation.
pub fn raw_row_label(row: ElementRef) -> String {
    let Some(header) = row.select(&ROW_HEADER_SELECTOR).next() else {
        return String::new();
    };

    let strategies: [fn(ElementRef) -> Option<String>; 3] = [tooltip_label, container_label, plain_label];
    strategies
        .iter()
        .filter_map(|strategy| strategy(header))
        .find(|text| !text.trim().is_empty())
        .unwrap_or_default()
}

fn tooltip_label(header: ElementRef) -> Option<String> {
    let tip_in = header.select(&TIP_IN_SELECTOR).next()?;
    let source = tip_in.select(&TXT_ACD_SELECTOR).next().unwrap_or(tip_in);
    Some(source.text().collect())
}

fn container_label(header: ElementRef) -> Option<String> {
    let container = header.select(&LABEL_CONTAINER_SELECTOR).next()?;
    Some(text_without_classes(container, &HIDDEN_LABEL_CLASSES))
}

fn plain_label(header: ElementRef) -> Option<String> {
    Some(header.text().collect())
}

/// Text of `element`, leaving out every descendant element carrying one of `classes`.
fn text_without_classes(element: ElementRef, classes: &[&str]) -> String {
    let mut out = String::new();
    for node in element.descendants() {
        if let Node::Text(text_node) = node.value() {
            let hidden = node
                .ancestors()
                .take_while(|ancestor| ancestor.id() != element.id())
                .filter_map(ElementRef::wrap)
                .any(|ancestor| ancestor.value().classes().any(|c| classes.contains(&c)));
            if !hidden {
                out.push_str(&text_node.text);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn label_of(row_html: &str) -> String {
        let html = format!("<table><tbody>{}</tbody></table>", row_html);
        let doc = Html::parse_document(&html);
        let tr = Selector::parse("tr").unwrap();
        extract_row_label(doc.select(&tr).next().unwrap())
    }

    #[test]
    fn tooltip_text_span_has_priority() {
        let row = r#"<tr><th><div><a class="tip_in"><span class="txt_acd">총자산이익률(ROA)</span><span class="tip_txt">설명</span></a></div></th><td>1</td></tr>"#;
        assert_eq!(label_of(row), "총자산이익률(ROA)");
    }

    #[test]
    fn tooltip_without_text_span_uses_anchor_text() {
        let row = r#"<tr><th><a class="tip_in">EPS증가율</a></th><td>1</td></tr>"#;
        assert_eq!(label_of(row), "EPS증가율");
    }

    #[test]
    fn container_label_drops_unit_annotation() {
        let row = r#"<tr><th><div>부채비율<span class="csize">(%)</span></div></th><td>1</td></tr>"#;
        assert_eq!(label_of(row), "부채비율");
    }

    #[test]
    fn container_label_drops_expand_button_text() {
        let row = r#"<tr><th><div>영업이익<a class="btn_acdopen"><span class="blind">계산에 참여한 계정 펼치기</span></a></div></th><td>1</td></tr>"#;
        assert_eq!(label_of(row), "영업이익");
    }

    #[test]
    fn plain_header_text_is_last_resort() {
        let row = "<tr><th>\u{a0}유동비율\u{a0}\u{a0}</th><td>1</td></tr>";
        assert_eq!(label_of(row), "유동비율");
    }

    #[test]
    fn row_without_header_has_empty_label() {
        assert_eq!(label_of("<tr><td>1</td><td>2</td></tr>"), "");
    }

    #[test]
    fn raw_label_keeps_indentation() {
        let html = "<table><tbody><tr class=\"rwf\"><th><div>\u{a0}\u{a0}\u{a0}FCFF</div></th><td>1</td></tr></tbody></table>";
        let doc = Html::parse_document(html);
        let tr = Selector::parse("tr").unwrap();
        let raw = raw_row_label(doc.select(&tr).next().unwrap());
        assert!(raw.starts_with("\u{a0}\u{a0}\u{a0}F"));
    }

    #[test]
    fn whitespace_collapses_including_nbsp() {
        assert_eq!(normalize_whitespace("  순이자\u{a0}\u{a0}마진율 \n"), "순이자 마진율");
    }
}
