use crate::page::{ElementKind, NodeId, Page};

const SHORTS_LABEL: &str = "Shorts";
const SHORTS_PATH: &str = "/shorts";
pub const SHORTS_BLOCKED_NOTICE: &str = "Shorts have been hidden by YouTube Focus extension";

/// Hide or restore short-form content according to `suppress`.
pub fn apply_short_form<P: Page + ?Sized>(page: &mut P, suppress: bool) {
    if suppress {
        hide_short_form(page);
    } else {
        show_short_form(page);
    }
}

pub fn hide_short_form<P: Page + ?Sized>(page: &mut P) {
    for node in page.query(ElementKind::ReelItem) {
        page.set_hidden(node, true);
    }
    for node in shorts_shelves(page) {
        page.set_hidden(node, true);
    }
    for node in shorts_nav_entries(page) {
        page.set_hidden(node, true);
    }

    if page.location_path().contains(SHORTS_PATH) {
        if !page.has_notice() {
            page.show_notice(SHORTS_BLOCKED_NOTICE);
        }
        for node in page.query(ElementKind::ShortsPlayer) {
            page.set_hidden(node, true);
        }
    }
}

pub fn show_short_form<P: Page + ?Sized>(page: &mut P) {
    for node in page.query(ElementKind::ReelItem) {
        page.set_hidden(node, false);
    }
    for node in shorts_shelves(page) {
        page.set_hidden(node, false);
    }
    for node in page.query(ElementKind::ShortsPlayer) {
        page.set_hidden(node, false);
    }
    if page.has_notice() {
        page.remove_notice();
    }
    for node in shorts_nav_entries(page) {
        page.set_hidden(node, false);
    }
}

fn shorts_shelves<P: Page + ?Sized>(page: &P) -> Vec<NodeId> {
    page.query(ElementKind::Shelf)
        .into_iter()
        .filter(|node| page.text_content(*node).contains(SHORTS_LABEL))
        .collect()
}

fn shorts_nav_entries<P: Page + ?Sized>(page: &P) -> Vec<NodeId> {
    [ElementKind::GuideEntry, ElementKind::PivotBarItem]
        .into_iter()
        .flat_map(|kind| page.query(kind))
        .filter(|node| page.text_content(*node).contains(SHORTS_LABEL))
        .collect()
}
