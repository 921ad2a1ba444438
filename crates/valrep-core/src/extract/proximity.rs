//! Directional proximity search around an anchor fragment.
//!
//! Form answers sit either beside their label on the same row or directly
//! beneath it. Searching only in that direction keeps values from leaking in
//! from a neighbouring column.

use serde::{Deserialize, Serialize};

use crate::corpus::{reading_order, Corpus, TextFragment};
use crate::models::config::SearchWindow;

/// Where a field's value sits relative to its label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Same row, to the right of the label.
    #[default]
    Right,
    /// Below the label, roughly x-aligned.
    Bottom,
    /// Value is only ever inline in the label fragment.
    None,
}

/// A fragment found near an anchor, with its distance in page pixels.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub fragment: &'a TextFragment,
    pub distance: f32,
}

/// Fragments on the anchor's page satisfying the directional constraint,
/// nearest first.
pub fn search<'a>(
    corpus: &'a Corpus,
    anchor: &TextFragment,
    direction: Direction,
    window: &SearchWindow,
) -> Vec<Candidate<'a>> {
    let candidates = corpus
        .on_page(anchor.page())
        .filter(|f| *f != anchor)
        .filter_map(|f| match direction {
            Direction::Right => {
                let gap = f.x1() - anchor.x2();
                let same_row = (f.cy() - anchor.cy()).abs() < window.row_tolerance;
                (same_row && f.x1() > anchor.x1() && gap < window.right_max_gap)
                    .then_some(Candidate { fragment: f, distance: gap })
            }
            Direction::Bottom => {
                let gap = f.y1() - anchor.y2();
                let aligned = (f.cx() - anchor.cx()).abs() < window.column_tolerance;
                (f.cy() > anchor.cy() && gap < window.bottom_max_gap && aligned)
                    .then_some(Candidate { fragment: f, distance: gap })
            }
            Direction::None => None,
        })
        .collect();

    sorted(candidates)
}

/// Fragments around the anchor in any direction within the row and column
/// tolerances, nearest centroid first.
pub fn nearby<'a>(
    corpus: &'a Corpus,
    anchor: &TextFragment,
    window: &SearchWindow,
) -> Vec<Candidate<'a>> {
    let candidates = corpus
        .on_page(anchor.page())
        .filter(|f| *f != anchor)
        .filter_map(|f| {
            let dx = f.cx() - anchor.cx();
            let dy = f.cy() - anchor.cy();
            (dy.abs() < window.row_tolerance && dx.abs() < window.column_tolerance).then_some(
                Candidate {
                    fragment: f,
                    distance: (dx * dx + dy * dy).sqrt(),
                },
            )
        })
        .collect();

    sorted(candidates)
}

fn sorted(mut candidates: Vec<Candidate<'_>>) -> Vec<Candidate<'_>> {
    candidates.sort_by(|a, b| {
        a.distance
            .total_cmp(&b.distance)
            .then_with(|| reading_order(a.fragment, b.fragment))
    });
    candidates
}
