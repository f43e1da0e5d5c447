//! The story document and its mutation surface.

use super::location::StoryLocation;
use super::section::SectionWrite;
use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// A titled narrative unit with text and an ordered list of images.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Segment {
    pub title: String,
    #[serde(default)]
    pub text: String,
    /// Image URLs or `data:` URIs, in display order.
    #[serde(default)]
    pub images: Vec<String>,
}

impl Segment {
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
            images: Vec::new(),
        }
    }
}

/// Wire form of a [`Document`].
///
/// Citations are tracked in memory only and are not part of this form.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DocumentRecord {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub research_document: String,
    #[serde(default)]
    pub segments: Vec<Segment>,
}

impl DocumentRecord {
    /// Copy with every image list replaced by a one-line placeholder.
    ///
    /// Generated images are often inline `data:` URIs; this keeps them out of
    /// the model's context when it asks to see the story.
    pub fn with_images_elided(&self) -> Self {
        let mut record = self.clone();
        for segment in &mut record.segments {
            if !segment.images.is_empty() {
                segment.images = vec![format!(
                    "[{} images - data excluded to save tokens]",
                    segment.images.len()
                )];
            }
        }
        record
    }

    /// First image of the first segment, used as a listing thumbnail.
    pub fn thumbnail(&self) -> Option<&str> {
        self.segments
            .first()
            .and_then(|s| s.images.first())
            .map(|s| s.as_str())
    }
}

/// The mutable in-progress story.
///
/// Owned by exactly one authoring session; every change goes through the
/// methods below. Segments are addressed by title and the first match wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    location: StoryLocation,
    title: String,
    research_notes: String,
    segments: Vec<Segment>,
    citations: Vec<String>,
}

impl Document {
    pub fn new(location: StoryLocation) -> Self {
        Self {
            location,
            title: String::new(),
            research_notes: String::new(),
            segments: Vec::new(),
            citations: Vec::new(),
        }
    }

    /// Rebuild a document from its wire form. Citations start empty.
    pub fn from_record(location: StoryLocation, record: DocumentRecord) -> Self {
        Self {
            location,
            title: record.title,
            research_notes: record.research_document,
            segments: record.segments,
            citations: Vec::new(),
        }
    }

    // ==================== Accessors ====================

    pub fn location(&self) -> &StoryLocation {
        &self.location
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn research_notes(&self) -> &str {
        &self.research_notes
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn citations(&self) -> &[String] {
        &self.citations
    }

    pub fn segment_titles(&self) -> Vec<&str> {
        self.segments.iter().map(|s| s.title.as_str()).collect()
    }

    pub fn find_segment_index(&self, title: &str) -> Option<usize> {
        self.segments.iter().position(|s| s.title == title)
    }

    pub fn segment(&self, title: &str) -> Option<&Segment> {
        self.find_segment_index(title).map(|i| &self.segments[i])
    }

    pub fn has_segment(&self, title: &str) -> bool {
        self.find_segment_index(title).is_some()
    }

    /// A title with no segments is how a rejected topic is recorded.
    pub fn is_rejection(&self) -> bool {
        !self.title.is_empty() && self.segments.is_empty()
    }

    // ==================== Mutations ====================

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// Append a new segment.
    ///
    /// Returns `true` when a segment with the same title already existed; the
    /// new one is then unreachable by title lookup.
    pub fn add_segment(&mut self, title: impl Into<String>, text: impl Into<String>) -> bool {
        let segment = Segment::new(title, text);
        let shadowed = self.has_segment(&segment.title);
        self.segments.push(segment);
        shadowed
    }

    pub fn write_section(&mut self, title: &str, write: SectionWrite) -> Result<(), DomainError> {
        let idx = self
            .find_segment_index(title)
            .ok_or_else(|| DomainError::SegmentNotFound(title.to_string()))?;
        let segment = &mut self.segments[idx];

        match write {
            SectionWrite::ReplaceText(text) => segment.text = text,
            SectionWrite::AppendText(text) => segment.text.push_str(&text),
            SectionWrite::ReplaceImages(images) => segment.images = images,
            SectionWrite::AppendImages(images) => segment.images.extend(images),
        }
        Ok(())
    }

    /// Replace the research notes, or append on a new line.
    pub fn set_research(&mut self, text: &str, replace: bool) {
        if replace || self.research_notes.is_empty() {
            self.research_notes = text.to_string();
        } else {
            self.research_notes.push('\n');
            self.research_notes.push_str(text);
        }
    }

    pub fn add_citation(&mut self, source: &str) -> Result<(), DomainError> {
        let source = source.trim();
        if source.is_empty() {
            return Err(DomainError::validation("Citation must not be empty"));
        }
        self.citations.push(source.to_string());
        Ok(())
    }

    // ==================== Persistence contract ====================

    /// Minimum content required before a snapshot may be written.
    pub fn check_publishable(&self) -> Result<(), DomainError> {
        if self.title.is_empty() {
            return Err(DomainError::validation(
                "Story title is not set. Please set the story title first and then save the story.",
            ));
        }
        if self.segments.is_empty() {
            return Err(DomainError::validation(
                "Story segments are not set. Please add segments first and then save the story.",
            ));
        }
        if self.citations.is_empty() && self.research_notes.is_empty() {
            return Err(DomainError::validation(
                "Story citations or research document are not set. Please add research information first and then save the story.",
            ));
        }
        Ok(())
    }

    pub fn serialize(&self) -> DocumentRecord {
        DocumentRecord {
            title: self.title.clone(),
            research_document: self.research_notes.clone(),
            segments: self.segments.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> Document {
        Document::new(StoryLocation::new("press").unwrap())
    }

    #[test]
    fn test_append_text_concatenates() {
        let mut d = doc();
        d.add_segment("Gutenberg", "In Mainz, ");
        d.write_section("Gutenberg", SectionWrite::AppendText("a goldsmith".into()))
            .unwrap();
        assert_eq!(d.segment("Gutenberg").unwrap().text, "In Mainz, a goldsmith");
    }

    #[test]
    fn test_replace_text_overwrites() {
        let mut d = doc();
        d.add_segment("Gutenberg", "draft");
        d.write_section("Gutenberg", SectionWrite::text("final", true))
            .unwrap();
        assert_eq!(d.segment("Gutenberg").unwrap().text, "final");
    }

    #[test]
    fn test_append_images_preserves_order() {
        let mut d = doc();
        d.add_segment("Press", "");
        d.write_section("Press", SectionWrite::AppendImages(vec!["a.png".into()]))
            .unwrap();
        d.write_section(
            "Press",
            SectionWrite::AppendImages(vec!["b.png".into(), "c.png".into()]),
        )
        .unwrap();
        assert_eq!(
            d.segment("Press").unwrap().images,
            vec!["a.png", "b.png", "c.png"]
        );

        d.write_section("Press", SectionWrite::ReplaceImages(vec!["z.png".into()]))
            .unwrap();
        assert_eq!(d.segment("Press").unwrap().images, vec!["z.png"]);
    }

    #[test]
    fn test_write_missing_segment_leaves_document_unchanged() {
        let mut d = doc();
        d.set_title("The Press");
        d.add_segment("One", "text");
        let before = d.clone();

        let err = d
            .write_section("Two", SectionWrite::AppendText("x".into()))
            .unwrap_err();
        assert_eq!(err, DomainError::SegmentNotFound("Two".to_string()));
        assert_eq!(d, before);
    }

    #[test]
    fn test_duplicate_titles_resolve_to_first() {
        let mut d = doc();
        assert!(!d.add_segment("Intro", "first"));
        assert!(d.add_segment("Intro", "second"));
        d.write_section("Intro", SectionWrite::AppendText("!".into()))
            .unwrap();
        assert_eq!(d.segments()[0].text, "first!");
        assert_eq!(d.segments()[1].text, "second");
    }

    #[test]
    fn test_set_research_joins_with_newline() {
        let mut d = doc();
        d.set_research("alpha", false);
        assert_eq!(d.research_notes(), "alpha");
        d.set_research("beta", false);
        assert_eq!(d.research_notes(), "alpha\nbeta");
        d.set_research("gamma", true);
        assert_eq!(d.research_notes(), "gamma");
    }

    #[test]
    fn test_add_citation_rejects_blank() {
        let mut d = doc();
        assert!(d.add_citation("   ").is_err());
        d.add_citation(" https://example.org ").unwrap();
        assert_eq!(d.citations(), ["https://example.org"]);
    }

    #[test]
    fn test_check_publishable_preconditions() {
        let mut d = doc();
        assert!(d.check_publishable().unwrap_err().to_string().contains("title"));

        d.set_title("The Press");
        assert!(d.check_publishable().unwrap_err().to_string().contains("segments"));

        d.add_segment("One", "text");
        assert!(d.check_publishable().unwrap_err().to_string().contains("research"));

        d.add_citation("https://example.org").unwrap();
        assert!(d.check_publishable().is_ok());

        let mut d2 = doc();
        d2.set_title("T");
        d2.add_segment("One", "");
        d2.set_research("notes", false);
        assert!(d2.check_publishable().is_ok());
    }

    #[test]
    fn test_serialize_round_trip_excludes_citations() {
        let mut d = doc();
        d.set_title("The Press");
        d.set_research("notes", false);
        d.add_segment("One", "text");
        d.write_section("One", SectionWrite::AppendImages(vec!["a.png".into()]))
            .unwrap();
        d.add_citation("https://example.org").unwrap();

        let json = serde_json::to_string(&d.serialize()).unwrap();
        assert!(!json.contains("citations"));

        let record: DocumentRecord = serde_json::from_str(&json).unwrap();
        let reloaded = Document::from_record(d.location().clone(), record);
        assert_eq!(reloaded.title(), d.title());
        assert_eq!(reloaded.research_notes(), d.research_notes());
        assert_eq!(reloaded.segments(), d.segments());
        assert!(reloaded.citations().is_empty());
    }

    #[test]
    fn test_wire_field_names() {
        let mut d = doc();
        d.set_research("notes", false);
        let value = serde_json::to_value(d.serialize()).unwrap();
        assert_eq!(value["research_document"], "notes");
        assert!(value["segments"].is_array());
    }

    #[test]
    fn test_images_elided_and_thumbnail() {
        let mut d = doc();
        d.add_segment("One", "");
        d.write_section(
            "One",
            SectionWrite::AppendImages(vec!["data:image/png;base64,AAA".into(), "b".into()]),
        )
        .unwrap();
        let record = d.serialize();
        assert_eq!(record.thumbnail(), Some("data:image/png;base64,AAA"));

        let elided = record.with_images_elided();
        assert_eq!(
            elided.segments[0].images,
            vec!["[2 images - data excluded to save tokens]"]
        );
    }

    #[test]
    fn test_is_rejection() {
        let mut d = doc();
        assert!(!d.is_rejection());
        d.set_title("Unable to publish story: This topic is fictional");
        assert!(d.is_rejection());
        d.add_segment("One", "");
        assert!(!d.is_rejection());
    }
}
