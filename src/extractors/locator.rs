// src/extractors/locator.rs

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

use super::row::normalize_whitespace;

static ELEMENT_WITH_ID_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("[id]").expect("Failed to compile ELEMENT_WITH_ID_SELECTOR")
});

static ROW_WITH_ID_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("tr[id]").expect("Failed to compile ROW_WITH_ID_SELECTOR")
});

static CAPTION_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("caption").expect("Failed to compile CAPTION_SELECTOR")
});

static TABLE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("table").expect("Failed to compile TABLE_SELECTOR")
});

/// Stable structural marker identifying a table inside a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionDescriptor {
    /// An element id, e.g. `highlight_D_Y` (a wrapper `div` or the table itself).
    ElementId(&'static str),
    /// A numbered row family: rows with ids `{prefix}_{n}`, e.g. `p_grid1`.
    RowFamily(&'static str),
    /// A fragment of the table caption text.
    Caption(&'static str),
}

/// Finds the smallest table matching `descriptor`. The first match in document order wins.
pub fn locate<'a>(document: &'a Html, descriptor: &SectionDescriptor) -> Option<ElementRef<'a>> {
    let table = match *descriptor {
        SectionDescriptor::ElementId(id) => document
            .select(&ELEMENT_WITH_ID_SELECTOR)
            .find(|element| element.value().id() == Some(id))
            .and_then(enclosing_table),
        SectionDescriptor::RowFamily(prefix) => document
            .select(&ROW_WITH_ID_SELECTOR)
            .find(|row| row.value().id().is_some_and(|id| is_family_member(id, prefix)))
            .and_then(nearest_table_ancestor),
        SectionDescriptor::Caption(fragment) => document
            .select(&CAPTION_SELECTOR)
            .find(|caption| normalize_whitespace(&caption.text().collect::<String>()).contains(fragment))
            .and_then(nearest_table_ancestor),
    };

    if table.is_none() {
        tracing::debug!("Section {:?} not found", descriptor);
    }
    table
}

/// `true` for ids of the form `{prefix}_{digits}`.
pub fn is_family_member(id: &str, prefix: &str) -> bool {
    id.strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('_'))
        .is_some_and(|digits| !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()))
}

fn enclosing_table(element: ElementRef) -> Option<ElementRef> {
    if element.value().name() == "table" {
        return Some(element);
    }
    element
        .select(&TABLE_SELECTOR)
        .next()
        .or_else(|| nearest_table_ancestor(element))
}

fn nearest_table_ancestor(element: ElementRef) -> Option<ElementRef> {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|ancestor| ancestor.value().name() == "table")
}
