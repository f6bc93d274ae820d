//! Document loading: one (path, text) pair in, one normalized [`Document`] out.

use pulldown_cmark::{
    Event as MdEvent, HeadingLevel, Parser as MdParser, Tag as MdTag, TagEnd as MdTagEnd,
};

use crate::{
    codec::{
        extract::{extract_references, ScanOptions},
        frontmatter::{split_header, Metadata},
    },
    error::NotegraphError,
    nodekey::{normalize_key, normalize_tag},
    paths::{canonicalize, file_stem},
    properties::{DocId, Document, TitleSource},
};

/// Load a document from its source path and raw text.
///
/// Fails with [`NotegraphError::MalformedMetadata`] when the header block is unterminated or a
/// recognized key has the wrong type, and with [`NotegraphError::InvalidPath`] when the path has
/// no canonical form. No reference extraction happens here; see [`load_and_scan`].
pub fn load_document(path: &str, text: &str) -> Result<Document, NotegraphError> {
    let id = DocId::new(canonicalize(path)?);
    let split = split_header(text)?;
    let metadata = match split.header {
        Some((format, header)) => Metadata::parse(format, header)?,
        None => Metadata::default(),
    };

    let declared = metadata
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| (t.to_string(), TitleSource::Header));
    let (title, title_source) = declared
        .or_else(|| first_heading(split.body).map(|t| (t, TitleSource::Heading)))
        .unwrap_or_else(|| (file_stem(id.as_str()).to_string(), TitleSource::FileStem));

    let mut document = Document::new(id, title, split.body.to_string());
    document.title_source = title_source;
    document.body_line_offset = split.body_line_offset;
    document.aliases = dedup_aliases(metadata.aliases);
    document.tags = metadata
        .tags
        .iter()
        .map(|tag| normalize_tag(tag))
        .filter(|tag| !tag.is_empty())
        .collect();
    document.created = metadata.created;
    document.updated = metadata.updated;
    document.draft = metadata.draft;
    document.extra = metadata.extra;
    Ok(document)
}

/// Load a document and extract its references. Inline tag references join the header tags.
#[tracing::instrument(skip(text, options))]
pub fn load_and_scan(
    path: &str,
    text: &str,
    options: &ScanOptions,
) -> Result<Document, NotegraphError> {
    let mut document = load_document(path, text)?;
    document.references = extract_references(&document.body, options, document.body_line_offset);
    let inline_tags = document
        .tag_references()
        .map(|reference| normalize_tag(&reference.target))
        .filter(|tag| !tag.is_empty())
        .collect::<Vec<String>>();
    document.tags.extend(inline_tags);
    tracing::debug!(
        "Loaded {} with {} references",
        document.id(),
        document.references.len()
    );
    Ok(document)
}

fn dedup_aliases(aliases: Vec<String>) -> Vec<String> {
    let mut seen = Vec::<String>::new();
    let mut kept = Vec::new();
    for alias in aliases {
        let normalized = normalize_key(&alias);
        if normalized.is_empty() || seen.contains(&normalized) {
            continue;
        }
        seen.push(normalized);
        kept.push(alias.trim().to_string());
    }
    kept
}

/// Text of the first level-one heading in `body`.
fn first_heading(body: &str) -> Option<String> {
    let mut in_heading = false;
    let mut text = String::new();
    for event in MdParser::new(body) {
        match event {
            MdEvent::Start(MdTag::Heading {
                level: HeadingLevel::H1,
                ..
            }) => in_heading = true,
            MdEvent::End(MdTagEnd::Heading(HeadingLevel::H1)) => {
                let title = text.trim().to_string();
                if !title.is_empty() {
                    return Some(title);
                }
                in_heading = false;
                text.clear();
            }
            MdEvent::Text(cow_str) | MdEvent::Code(cow_str) if in_heading => {
                text.push_str(&cow_str)
            }
            MdEvent::SoftBreak if in_heading => text.push(' '),
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::ReferenceKind;
    use test_log::test;

    #[test]
    fn test_title_precedence() {
        let header = "---\ntitle: Header Title\n---\n# Heading\n";
        let doc = load_document("notes/a.md", header).unwrap();
        assert_eq!(doc.title, "Header Title");
        assert_eq!(doc.title_source, TitleSource::Header);
        let doc = load_document("notes/a.md", "Intro\n\n# The `Heading`\n").unwrap();
        assert_eq!(doc.title, "The Heading");
        assert_eq!(doc.title_source, TitleSource::Heading);
        let doc = load_document("notes/a.md", "## Only a subheading\n").unwrap();
        assert_eq!(doc.title, "a");
        assert_eq!(doc.title_source, TitleSource::FileStem);
    }

    #[test]
    fn test_canonical_id_and_metadata() {
        let doc = load_document(
            "./notes/b.md",
            concat!(
                "---\naliases: [Bee, bee, ' BEE ']\ntags: ['#X', y]\n",
                "draft: true\nlayout: wide\n---\nbody\n"
            ),
        )
        .unwrap();
        assert_eq!(doc.id().as_str(), "notes/b.md");
        assert_eq!(doc.aliases, vec!["Bee"]);
        assert_eq!(
            doc.tags.iter().cloned().collect::<Vec<_>>(),
            vec!["x".to_string(), "y".to_string()]
        );
        assert!(doc.draft);
        assert!(doc.extra.contains_key("layout"));
        assert_eq!(doc.body, "body\n");
        assert_eq!(doc.body_line_offset, 6);
    }

    #[test]
    fn test_malformed_metadata() {
        let err = load_document("a.md", "---\ndraft: maybe\n---\n").unwrap_err();
        assert!(matches!(err, NotegraphError::MalformedMetadata(_)));
        let err = load_document("a.md", "---\ndraft: true\n").unwrap_err();
        assert!(matches!(err, NotegraphError::MalformedMetadata(_)));
    }

    #[test]
    fn test_invalid_path() {
        let err = load_document("./", "body").unwrap_err();
        assert!(matches!(err, NotegraphError::InvalidPath(_)));
    }

    #[test]
    fn test_load_and_scan_merges_inline_tags() {
        let doc = load_and_scan(
            "a.md",
            "---\ntags: [x]\n---\nsee [[b]] #Inline\n",
            &ScanOptions::default(),
        )
        .unwrap();
        assert_eq!(doc.references.len(), 2);
        assert_eq!(doc.references[0].kind, ReferenceKind::Document);
        assert_eq!(doc.references[0].location, (4, 5));
        assert!(doc.tags.contains("x"));
        assert!(doc.tags.contains("inline"));
    }
}
