use bible_core::{
    parse_marker_table, Catalog, CatalogBuilder, LookupMiss, ParseFailure, ReferenceParser,
    StaticMarkerSource, VerseLabel, VerseMarkerIndex,
};
use std::sync::Arc;

const GENESIS_49: &str = "verse,time
Intro,00:00:00:00
1,00:00:12:00
2,00:00:30:00
3-5,00:02:00:00
6,00:02:30:00
31-33,00:05:10.5
";

fn catalog() -> Catalog {
    CatalogBuilder::canonical()
        .enable_chapters("GEN", [1, 49])
        .enable_chapters("JHN", [1, 3])
        .enable_chapters("1JN", [1, 2])
        .enable_chapters("REV", [22])
        .verse_count("GEN", 49, 33)
        .verse_count("JHN", 3, 36)
        .verse_count("1JN", 2, 29)
        .verse_count("REV", 22, 21)
        .build()
        .unwrap()
}

fn markers() -> VerseMarkerIndex {
    let source = StaticMarkerSource::new().with_chapter(
        "GEN",
        49,
        parse_marker_table(GENESIS_49).unwrap(),
    );
    VerseMarkerIndex::new(Arc::new(source))
}

#[test]
fn test_every_catalog_verse_round_trips() {
    let catalog = catalog();
    let markers = markers();
    let parser = ReferenceParser::new(&catalog, &markers);

    let mut checked = 0;
    for book in catalog.books() {
        for chapter in catalog.enabled_chapters(book) {
            for verse in catalog.list_verses(book, chapter) {
                let input = format!("{} {}:{}", book.display_name, chapter, verse);
                let reference = parser
                    .parse(&input)
                    .unwrap_or_else(|e| panic!("{} failed: {}", input, e));
                assert_eq!(&reference.book, book);
                assert_eq!(reference.chapter, chapter);
                assert_eq!(reference.verse, Some(*verse));
                checked += 1;
            }
        }
    }
    assert_eq!(checked, 33 + 36 + 29 + 21);
}

#[test]
fn test_genesis_49_scenario() {
    let catalog = catalog();
    let markers = markers();
    let parser = ReferenceParser::new(&catalog, &markers);

    let reference = parser.parse("gen 49:32").unwrap();
    assert_eq!(reference.book.code, "GEN");
    assert_eq!(reference.chapter, 49);
    assert_eq!(reference.verse, Some(VerseLabel::single(32)));

    let canonical = markers
        .resolve_label(&reference.book, 49, VerseLabel::single(32))
        .unwrap();
    assert_eq!(canonical.to_string(), "31-33");
    assert_eq!(markers.time_for(&reference.book, 49, canonical), Ok(310.5));
}

#[test]
fn test_range_marker_covers_inner_verses() {
    let catalog = catalog();
    let markers = markers();
    let genesis = catalog.book_by_code("GEN").unwrap();

    assert_eq!(
        markers.verse_at(genesis, 49, 125.0),
        Some(VerseLabel::range(3, 5).unwrap())
    );
    assert_eq!(markers.time_for(genesis, 49, VerseLabel::single(4)), Ok(120.0));
}

#[test]
fn test_empty_chapter_differs_from_unknown_verse() {
    let catalog = catalog();
    let markers = markers();
    let genesis = catalog.book_by_code("GEN").unwrap();

    assert_eq!(
        markers.time_for(genesis, 1, VerseLabel::single(1)),
        Err(LookupMiss::EmptyChapter)
    );
    assert_eq!(
        markers.time_for(genesis, 49, VerseLabel::single(20)),
        Err(LookupMiss::UnknownVerse)
    );
}

#[test]
fn test_invalid_input_scenario() {
    let catalog = catalog();
    let markers = markers();
    let parser = ReferenceParser::new(&catalog, &markers);

    let failures: Vec<ParseFailure> = ["", "Xyz 1:1", "Gen 999:1", "Gen 1:9999"]
        .iter()
        .map(|input| parser.parse(input).unwrap_err().kind())
        .collect();

    assert_eq!(
        failures,
        vec![
            ParseFailure::EmptyInput,
            ParseFailure::BookNotFound,
            ParseFailure::ChapterUnavailable,
            ParseFailure::VerseNotFound,
        ]
    );
}

#[test]
fn test_numbered_book_disambiguation() {
    let catalog = catalog();
    let markers = markers();
    let parser = ReferenceParser::new(&catalog, &markers);

    let reference = parser.parse("1 John 2:3").unwrap();
    assert_eq!(reference.book.display_name, "1 John");
    assert_eq!(reference.chapter, 2);
    assert_eq!(reference.verse, Some(VerseLabel::single(3)));
}
