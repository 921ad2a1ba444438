//! Positioned text fragments produced by OCR for one document.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in page pixels. Always `x1 <= x2` and `y1 <= y2`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    /// Create a box from two corners in any order.
    pub fn new(xa: f32, ya: f32, xb: f32, yb: f32) -> Self {
        Self {
            x1: xa.min(xb),
            y1: ya.min(yb),
            x2: xa.max(xb),
            y2: ya.max(yb),
        }
    }

    /// Axis-aligned extremes of a detected quadrilateral.
    pub fn from_quad(quad: &[[f32; 2]; 4]) -> Self {
        let min_x = quad.iter().map(|p| p[0]).fold(f32::INFINITY, f32::min);
        let max_x = quad.iter().map(|p| p[0]).fold(f32::NEG_INFINITY, f32::max);
        let min_y = quad.iter().map(|p| p[1]).fold(f32::INFINITY, f32::min);
        let max_y = quad.iter().map(|p| p[1]).fold(f32::NEG_INFINITY, f32::max);

        Self {
            x1: min_x,
            y1: min_y,
            x2: max_x,
            y2: max_y,
        }
    }

    /// Center point of the box.
    pub fn center(&self) -> (f32, f32) {
        ((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }
}

/// One OCR-detected line of text with its page and bounding box.
///
/// Fragments are immutable; the centroid is derived once at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "FragmentRecord", into = "FragmentRecord")]
pub struct TextFragment {
    page: usize,
    text: String,
    bbox: BoundingBox,
    cx: f32,
    cy: f32,
}

impl TextFragment {
    /// Create a fragment. Surrounding whitespace of `text` is dropped.
    pub fn new(page: usize, text: impl Into<String>, bbox: BoundingBox) -> Self {
        let text = text.into().trim().to_string();
        let (cx, cy) = bbox.center();
        Self {
            page,
            text,
            bbox,
            cx,
            cy,
        }
    }

    /// Create a fragment from an OCR quadrilateral.
    pub fn from_quad(page: usize, text: impl Into<String>, quad: &[[f32; 2]; 4]) -> Self {
        Self::new(page, text, BoundingBox::from_quad(quad))
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }

    pub fn x1(&self) -> f32 {
        self.bbox.x1
    }

    pub fn y1(&self) -> f32 {
        self.bbox.y1
    }

    pub fn x2(&self) -> f32 {
        self.bbox.x2
    }

    pub fn y2(&self) -> f32 {
        self.bbox.y2
    }

    pub fn cx(&self) -> f32 {
        self.cx
    }

    pub fn cy(&self) -> f32 {
        self.cy
    }
}

/// Total order used everywhere fragments are sorted: page, top edge, then
/// left edge, with the remaining box edges and the text as final tie-breaks
/// so the result never depends on input order.
pub fn reading_order(a: &TextFragment, b: &TextFragment) -> Ordering {
    a.page
        .cmp(&b.page)
        .then_with(|| a.bbox.y1.total_cmp(&b.bbox.y1))
        .then_with(|| a.bbox.x1.total_cmp(&b.bbox.x1))
        .then_with(|| a.bbox.y2.total_cmp(&b.bbox.y2))
        .then_with(|| a.bbox.x2.total_cmp(&b.bbox.x2))
        .then_with(|| a.text.cmp(&b.text))
}

/// Flat serialized form, matching the raw OCR dump layout.
#[derive(Serialize, Deserialize)]
struct FragmentRecord {
    page: usize,
    text: String,
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
    #[serde(default, skip_deserializing)]
    cx: f32,
    #[serde(default, skip_deserializing)]
    cy: f32,
}

impl From<FragmentRecord> for TextFragment {
    fn from(record: FragmentRecord) -> Self {
        TextFragment::new(
            record.page,
            record.text,
            BoundingBox::new(record.x1, record.y1, record.x2, record.y2),
        )
    }
}

impl From<TextFragment> for FragmentRecord {
    fn from(fragment: TextFragment) -> Self {
        Self {
            page: fragment.page,
            text: fragment.text,
            x1: fragment.bbox.x1,
            x2: fragment.bbox.x2,
            y1: fragment.bbox.y1,
            y2: fragment.bbox.y2,
            cx: fragment.cx,
            cy: fragment.cy,
        }
    }
}

/// The full set of fragments for one document, held in reading order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<TextFragment>", into = "Vec<TextFragment>")]
pub struct Corpus {
    fragments: Vec<TextFragment>,
}

impl Corpus {
    /// Build a corpus. Fragments are put in reading order immediately.
    pub fn new(mut fragments: Vec<TextFragment>) -> Self {
        fragments.sort_by(reading_order);
        Self { fragments }
    }

    /// An empty corpus, used when rasterization or OCR produced nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn fragments(&self) -> &[TextFragment] {
        &self.fragments
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TextFragment> {
        self.fragments.iter()
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Highest page index plus one (0 for an empty corpus).
    pub fn page_count(&self) -> usize {
        self.fragments.last().map(|f| f.page + 1).unwrap_or(0)
    }

    /// Fragments on one page, in reading order.
    pub fn on_page(&self, page: usize) -> impl Iterator<Item = &TextFragment> {
        self.fragments.iter().filter(move |f| f.page == page)
    }

    /// All fragment texts joined by single spaces.
    pub fn full_text(&self) -> String {
        self.fragments
            .iter()
            .map(|f| f.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl From<Vec<TextFragment>> for Corpus {
    fn from(fragments: Vec<TextFragment>) -> Self {
        Corpus::new(fragments)
    }
}

impl From<Corpus> for Vec<TextFragment> {
    fn from(corpus: Corpus) -> Self {
        corpus.fragments
    }
}

impl<'a> IntoIterator for &'a Corpus {
    type Item = &'a TextFragment;
    type IntoIter = std::slice::Iter<'a, TextFragment>;

    fn into_iter(self) -> Self::IntoIter {
        self.fragments.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frag(page: usize, text: &str, x1: f32, y1: f32, x2: f32, y2: f32) -> TextFragment {
        TextFragment::new(page, text, BoundingBox::new(x1, y1, x2, y2))
    }

    #[test]
    fn test_box_normalizes_corners() {
        let bbox = BoundingBox::new(300.0, 90.0, 100.0, 40.0);
        assert_eq!(bbox.x1, 100.0);
        assert_eq!(bbox.y1, 40.0);
        assert_eq!(bbox.x2, 300.0);
        assert_eq!(bbox.y2, 90.0);
    }

    #[test]
    fn test_from_quad_takes_extremes() {
        let quad = [[10.0, 22.0], [110.0, 20.0], [112.0, 52.0], [8.0, 50.0]];
        let fragment = TextFragment::from_quad(1, "  Tenure  ", &quad);

        assert_eq!(fragment.text(), "Tenure");
        assert_eq!(fragment.page(), 1);
        assert_eq!(fragment.x1(), 8.0);
        assert_eq!(fragment.x2(), 112.0);
        assert_eq!(fragment.y1(), 20.0);
        assert_eq!(fragment.y2(), 52.0);
        assert_eq!(fragment.cx(), 60.0);
        assert_eq!(fragment.cy(), 36.0);
    }

    #[test]
    fn test_corpus_sorted_regardless_of_input_order() {
        let a = frag(0, "A", 0.0, 0.0, 10.0, 10.0);
        let b = frag(0, "B", 50.0, 0.0, 60.0, 10.0);
        let c = frag(1, "C", 0.0, 0.0, 10.0, 10.0);

        let one = Corpus::new(vec![c.clone(), b.clone(), a.clone()]);
        let two = Corpus::new(vec![b, a, c]);

        assert_eq!(one, two);
        let texts: Vec<&str> = one.iter().map(|f| f.text()).collect();
        assert_eq!(texts, vec!["A", "B", "C"]);
        assert_eq!(one.page_count(), 2);
    }

    #[test]
    fn test_serde_recomputes_centroid() {
        let json = r#"[{"page": 0, "text": "Hall 1", "x1": 0.0, "x2": 100.0, "y1": 10.0, "y2": 30.0, "cx": 999.0}]"#;
        let corpus: Corpus = serde_json::from_str(json).unwrap();
        let fragment = &corpus.fragments()[0];
        assert_eq!(fragment.cx(), 50.0);
        assert_eq!(fragment.cy(), 20.0);

        let out = serde_json::to_value(&corpus).unwrap();
        assert_eq!(out[0]["cx"], 50.0);
    }

    #[test]
    fn test_full_text() {
        let corpus = Corpus::new(vec![
            frag(0, "Tenure", 0.0, 0.0, 10.0, 10.0),
            frag(0, "Leasehold", 20.0, 0.0, 40.0, 10.0),
        ]);
        assert_eq!(corpus.full_text(), "Tenure Leasehold");
        assert_eq!(Corpus::empty().full_text(), "");
    }
}
