use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::page::{ElementKind, NodeId, Page};
use crate::similarity::{Classifier, ClassifierConfig, Verdict};

use super::shorts::apply_short_form;
use super::state::{OperatingState, PassContext};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

/// A video tile with extractable title text, rebuilt every pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateItem {
    pub node: NodeId,
    pub title: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemVerdict {
    pub node: NodeId,
    pub title: String,
    #[serde(flatten)]
    pub verdict: Verdict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum PassOutcome {
    /// Suppression was lifted from every item
    Cleared { unmarked: usize },
    Classified { allowed: usize, suppressed: usize },
    /// No titled items on the page yet; markers were left untouched
    NoCandidates,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PassReport {
    pub state: OperatingState,
    pub outcome: PassOutcome,
    pub verdicts: Vec<ItemVerdict>,
    pub completed_at: DateTime<Utc>,
}

/// Video tiles whose title resolves to non-empty text, lowercased and trimmed.
/// Tiles without a title are left out and keep whatever marker they have.
pub fn collect_candidates<P: Page + ?Sized>(page: &P) -> Vec<CandidateItem> {
    page.query(ElementKind::VideoItem)
        .into_iter()
        .filter_map(|node| {
            let title = page.title_text(node)?.trim().to_lowercase();
            (!title.is_empty()).then_some(CandidateItem { node, title })
        })
        .collect()
}

/// Remove the suppression marker from every node. Returns how many were marked.
pub fn clear_suppression<P: Page + ?Sized>(page: &mut P) -> usize {
    let marked = page.marked();
    for node in &marked {
        page.set_marker(*node, false);
    }
    marked.len()
}

/// One full scan-classify-apply cycle. Running it twice with no page change in
/// between leaves the page exactly as the first run did.
pub fn reconcile<P: Page + ?Sized>(page: &mut P, ctx: &PassContext) -> PassReport {
    let state = OperatingState::derive(ctx);

    let (outcome, verdicts) = match state {
        OperatingState::Disabled | OperatingState::BreakIdle => {
            let unmarked = clear_suppression(page);
            apply_short_form(page, ctx.suppress_short_form);
            (PassOutcome::Cleared { unmarked }, Vec::new())
        }
        OperatingState::Active => {
            apply_short_form(page, ctx.suppress_short_form);
            classify_candidates(page, ctx)
        }
    };

    page.render_status_badge(&ctx.badge());

    PassReport {
        state,
        outcome,
        verdicts,
        completed_at: Utc::now(),
    }
}

fn classify_candidates<P: Page + ?Sized>(
    page: &mut P,
    ctx: &PassContext,
) -> (PassOutcome, Vec<ItemVerdict>) {
    let candidates = collect_candidates(page);
    if candidates.is_empty() {
        log_warn!("No video titles found yet, waiting...");
        return (PassOutcome::NoCandidates, Vec::new());
    }

    let titles: Vec<&str> = candidates.iter().map(|item| item.title.as_str()).collect();
    let classifier = Classifier::new(
        &titles,
        &ctx.query_text(),
        ClassifierConfig::with_threshold(ctx.threshold),
    );

    let mut allowed = 0;
    let mut suppressed = 0;
    let mut verdicts = Vec::with_capacity(candidates.len());

    for item in candidates {
        let verdict = classifier.classify(&item.title);
        page.set_marker(item.node, verdict.suppressed());
        if verdict.allowed {
            allowed += 1;
        } else {
            suppressed += 1;
        }
        verdicts.push(ItemVerdict {
            node: item.node,
            title: item.title,
            verdict,
        });
    }

    log_info!(
        "Reconciled {} videos: {} allowed, {} suppressed (threshold {:.2})",
        verdicts.len(),
        allowed,
        suppressed,
        ctx.threshold
    );

    (PassOutcome::Classified { allowed, suppressed }, verdicts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{MemoryPage, StatusBadge};
    use crate::settings::Configuration;
    use crate::timer::TimerMode;

    fn focus_ctx(terms: &[&str]) -> PassContext {
        PassContext::from_config(&Configuration {
            allow_list_terms: terms.iter().map(|t| t.to_string()).collect(),
            ..Configuration::default()
        })
    }

    #[test]
    fn candidates_skip_untitled_tiles() {
        let mut page = MemoryPage::new("/");
        let titled = page.add_video("  Chess Opening TRICKS ");
        page.insert(ElementKind::VideoItem, None, "");
        page.insert(ElementKind::VideoItem, Some("   "), "");

        assert_eq!(
            collect_candidates(&page),
            vec![CandidateItem {
                node: titled,
                title: "chess opening tricks".into()
            }]
        );
    }

    #[test]
    fn active_pass_marks_off_topic_titles() {
        let mut page = MemoryPage::new("/");
        page.install_status_badge();
        let chess = page.add_video("chess opening tricks");
        let cats = page.add_video("funny cats compilation");

        let report = reconcile(&mut page, &focus_ctx(&["chess"]));

        assert_eq!(report.state, OperatingState::Active);
        assert_eq!(report.outcome, PassOutcome::Classified { allowed: 1, suppressed: 1 });
        assert!(!page.has_marker(chess));
        assert!(page.has_marker(cats));
        assert_eq!(page.badge, Some(StatusBadge::on()));
    }

    #[test]
    fn allowed_title_loses_stale_marker() {
        let mut page = MemoryPage::new("/");
        let chess = page.add_video("chess opening tricks");
        page.set_marker(chess, true);

        reconcile(&mut page, &focus_ctx(&["chess"]));
        assert!(!page.has_marker(chess));
    }

    #[test]
    fn empty_page_leaves_markers_untouched() {
        let mut page = MemoryPage::new("/");
        let untitled = page.insert(ElementKind::VideoItem, None, "");
        page.set_marker(untitled, true);

        let report = reconcile(&mut page, &focus_ctx(&["chess"]));
        assert_eq!(report.outcome, PassOutcome::NoCandidates);
        assert!(page.has_marker(untitled));
    }

    #[test]
    fn disabled_pass_clears_without_classifying() {
        let mut page = MemoryPage::new("/");
        page.install_status_badge();
        let cats = page.add_video("funny cats compilation");
        page.set_marker(cats, true);

        let ctx = focus_ctx(&["chess"]).with_timer(true, TimerMode::Focus, false);
        let report = reconcile(&mut page, &ctx);

        assert_eq!(report.state, OperatingState::Disabled);
        assert_eq!(report.outcome, PassOutcome::Cleared { unmarked: 1 });
        assert!(report.verdicts.is_empty());
        assert!(!page.has_marker(cats));
        assert_eq!(page.badge, Some(StatusBadge::off()));
    }

    #[test]
    fn break_idle_clears_and_still_hides_shorts() {
        let mut page = MemoryPage::new("/");
        let cats = page.add_video("funny cats compilation");
        let reel = page.insert(ElementKind::ReelItem, None, "");
        page.set_marker(cats, true);

        let ctx = focus_ctx(&["chess"]).with_timer(false, TimerMode::Break, true);
        let report = reconcile(&mut page, &ctx);

        assert_eq!(report.state, OperatingState::BreakIdle);
        assert!(!page.has_marker(cats));
        assert!(page.is_hidden(reel));
    }

    #[test]
    fn short_form_restored_when_flag_off() {
        let mut page = MemoryPage::new("/");
        page.add_video("chess opening tricks");
        let reel = page.insert(ElementKind::ReelItem, None, "");
        page.set_hidden(reel, true);

        let mut ctx = focus_ctx(&["chess"]);
        ctx.suppress_short_form = false;
        reconcile(&mut page, &ctx);
        assert!(!page.is_hidden(reel));
    }

    #[test]
    fn second_pass_is_a_no_op() {
        let mut page = MemoryPage::new("/shorts/xyz");
        page.install_status_badge();
        page.add_video("chess opening tricks");
        page.add_video("funny cats compilation");
        page.add_video("grandmaster chess blunders");
        page.insert(ElementKind::ReelItem, None, "");
        page.insert(ElementKind::ShortsPlayer, None, "");

        let ctx = focus_ctx(&["chess"]);
        reconcile(&mut page, &ctx);
        let after_first = page.clone();
        reconcile(&mut page, &ctx);
        assert_eq!(page, after_first);
    }
}
