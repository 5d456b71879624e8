use super::*;
use crate::complexity::estimate;

const FOX: &str = "The quick brown fox jumps.";

fn texts(chunks: &[Chunk]) -> Vec<&str> {
    chunks.iter().map(|chunk| chunk.text.as_str()).collect()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Chunks are verbatim, ordered, non-overlapping and separated only by
/// whitespace.
fn assert_partition(source: &str, chunks: &[Chunk]) {
    let mut cursor = 0usize;
    for chunk in chunks {
        assert!(!chunk.text.is_empty());
        assert_eq!(chunk.text, chunk.text.trim());
        assert_eq!(&source[chunk.span()], chunk.text);
        assert!((0.0..=1.0).contains(&chunk.complexity));
        assert!(chunk.start >= cursor, "overlap at {}", chunk.start);
        assert!(
            source[cursor..chunk.start].trim().is_empty(),
            "gap {:?}",
            &source[cursor..chunk.start]
        );
        cursor = chunk.end;
    }
    assert!(source[cursor..].trim().is_empty(), "tail {:?}", &source[cursor..]);
    assert!(uncovered_ranges(source, chunks).is_empty());
}

#[test]
fn fills_the_gap_between_fragments() {
    let fragments = [
        Fragment::new("The quick", 0.1),
        Fragment::new("fox jumps.", 0.4),
    ];
    let chunks = merge_final(FOX, &fragments);

    assert_eq!(texts(&chunks), ["The quick", "brown", "fox jumps."]);
    assert_eq!(chunks[0].complexity, 0.1);
    assert_eq!(chunks[1].complexity, estimate("brown"));
    assert_eq!(chunks[2].complexity, 0.4);
    assert_eq!(chunks[1].span(), 10..15);
    assert_partition(FOX, &chunks);
}

#[test]
fn empty_fragment_list_yields_nothing() {
    assert!(merge_final(FOX, &[]).is_empty());
    assert!(merge_streaming(FOX, &[]).is_empty());
    assert!(merge_final("", &[Fragment::unscored("x")]).is_empty());
}

#[test]
fn coverage_law_holds_for_messy_fragments() {
    let source = "  Call me Ishmael.\n\nSome years ago - never mind how long precisely -\thaving \
                  little or no money in my purse, and nothing particular to interest me on shore, \
                  I thought I would sail about a little and see the watery part of the world.  ";
    let fragments = [
        Fragment::new("Call me Ishmael.", 0.3),
        Fragment::new("   ", 0.9),
        Fragment::new("never mind", "0.5"),
        Fragment::new("a paraphrase the model invented", 0.2),
        Fragment::new("in my purse,", f64::NAN),
        Fragment::new("Call me", 0.1),
        Fragment::new("particular to", RawComplexity::Missing),
        Fragment::new("the watery part", 2.0),
    ];
    let chunks = merge_final(source, &fragments);

    assert_partition(source, &chunks);
    assert_eq!(
        collapse_whitespace(&texts(&chunks).join(" ")),
        collapse_whitespace(source),
        "chunks must rebuild the source"
    );
    assert!(texts(&chunks).contains(&"never mind"));
    assert!(!texts(&chunks).contains(&"Call me"));
    let watery = chunks.iter().find(|c| c.text == "the watery part").unwrap();
    assert_eq!(watery.complexity, 1.0);
}

#[test]
fn coverage_law_holds_when_fragments_split_words() {
    let chunks = merge_final(FOX, &[Fragment::unscored("he qu"), Fragment::unscored("ox")]);
    assert_partition(FOX, &chunks);
    let rebuilt: String = chunks
        .windows(2)
        .fold(chunks[0].text.clone(), |mut out, pair| {
            if pair[1].start > pair[0].end {
                out.push(' ');
            }
            out.push_str(&pair[1].text);
            out
        });
    assert_eq!(rebuilt, FOX);
}

#[test]
fn repeated_fragments_match_in_order() {
    let source = "no no no, yet again no";
    let fragments = [
        Fragment::new("no", 0.1),
        Fragment::new("no", 0.2),
        Fragment::new("no,", 0.3),
        Fragment::new("no", 0.4),
    ];
    let chunks = merge_final(source, &fragments);

    assert_eq!(texts(&chunks), ["no", "no", "no,", "yet again", "no"]);
    assert_eq!(
        chunks.iter().map(|c| c.start).collect::<Vec<_>>(),
        [0, 3, 6, 10, 20]
    );
    assert_eq!(chunks[4].complexity, 0.4);
    assert_partition(source, &chunks);
}

#[test]
fn fragment_behind_the_cursor_is_dropped() {
    let chunks = merge_final(FOX, &[Fragment::unscored("fox"), Fragment::unscored("quick")]);
    assert_eq!(texts(&chunks), ["The quick brown", "fox", "jumps."]);
    assert_partition(FOX, &chunks);
}

#[test]
fn merge_is_deterministic() {
    let fragments = [
        Fragment::new("quick brown", "0.7"),
        Fragment::new("jumps", 0.2),
    ];
    assert_eq!(merge_final(FOX, &fragments), merge_final(FOX, &fragments));
}

#[test]
fn streaming_holds_back_early_gaps() {
    let source = "alpha beta gamma delta epsilon zeta eta theta iota kappa";
    let early = [
        Fragment::new("alpha beta", 0.2),
        Fragment::new("epsilon zeta", 0.3),
    ];

    let chunks = merge_streaming(source, &early);
    assert_eq!(texts(&chunks), ["alpha beta", "epsilon zeta"]);
    let gaps = uncovered_ranges(source, &chunks);
    assert_eq!(
        gaps.iter().map(|gap| &source[gap.clone()]).collect::<Vec<_>>(),
        ["gamma delta", "eta theta iota kappa"]
    );

    let done = merge_final(source, &early);
    assert_eq!(
        texts(&done),
        ["alpha beta", "gamma delta", "epsilon zeta", "eta theta iota", "kappa"]
    );
}

#[test]
fn streaming_fills_once_coverage_is_high() {
    let source = "alpha beta gamma delta epsilon zeta eta theta iota kappa";
    let late = [
        Fragment::unscored("alpha beta gamma delta epsilon"),
        Fragment::unscored("eta theta"),
    ];

    let chunks = merge_streaming(source, &late);
    // Interior gap sits past half the text; the tail starts past 80%.
    assert_eq!(
        texts(&chunks),
        ["alpha beta gamma delta epsilon", "zeta", "eta theta", "iota kappa"]
    );
    assert_partition(source, &chunks);
}

#[test]
fn streaming_drops_oversized_fills() {
    let head = "head ".repeat(20);
    let tail = "word ".repeat(100);
    let source = format!("{head}anchor {tail}");
    let options = ReconcileOptions::default();

    let fragments = [Fragment::unscored(head.trim()), Fragment::unscored("anchor")];
    let chunks = merge(&source, &fragments, MergeMode::Streaming, &options);
    assert_eq!(chunks.len(), 2);

    let tight = ReconcileOptions {
        throttle: ThrottlePolicy {
            trailing_min_coverage: 0.0,
            trailing_max_chunks: 33,
            ..ThrottlePolicy::default()
        },
        ..options
    };
    let chunks = merge(&source, &fragments, MergeMode::Streaming, &tight);
    assert_eq!(chunks.len(), 2);

    let roomy = ReconcileOptions {
        throttle: ThrottlePolicy {
            trailing_min_coverage: 0.0,
            trailing_max_chunks: 34,
            ..ThrottlePolicy::default()
        },
        ..options
    };
    let chunks = merge(&source, &fragments, MergeMode::Streaming, &roomy);
    assert_eq!(chunks.len(), 2 + 34);
    assert_partition(&source, &chunks);
}

#[test]
fn streaming_interior_fill_is_capped_at_twenty_chunks() {
    let head = "head ".repeat(100);
    let policy = ThrottlePolicy::default();
    assert_eq!(policy.interior_max_chunks, 20);

    for (gap_words, admitted) in [(60, 20), (61, 0)] {
        let gap = "word ".repeat(gap_words);
        let source = format!("{head}{gap}anchor");
        let fragments = [Fragment::unscored(head.trim()), Fragment::unscored("anchor")];
        assert!(head.trim().len() as f32 / source.len() as f32 > policy.interior_min_coverage);

        let chunks = merge_streaming(&source, &fragments);
        assert_eq!(chunks.len(), 2 + admitted, "{gap_words} gap words");
        assert_eq!(chunks.last().unwrap().text, "anchor");
        assert_eq!(uncovered_ranges(&source, &chunks).is_empty(), admitted > 0);

        let done = merge_final(&source, &fragments);
        assert_eq!(done.len(), 2 + gap_words.div_ceil(DEFAULT_WORDS_PER_CHUNK));
        assert_partition(&source, &done);
    }
}

#[test]
fn filler_groups_words_and_skips_whitespace() {
    let source = "  one two\nthree   four five six seven  ";
    let chunks = filler_chunks(source, 0, source.len(), 3);
    assert_eq!(texts(&chunks), ["one two\nthree", "four five six", "seven"]);
    for chunk in &chunks {
        assert_eq!(chunk.complexity, estimate(&chunk.text));
    }

    let singles = filler_chunks(source, 0, source.len(), 0);
    assert_eq!(singles.len(), 7);
}

#[test]
fn filler_clamps_ranges() {
    let source = "año nuevo";
    assert!(filler_chunks(source, 5, 2, 3).is_empty());
    assert_eq!(texts(&filler_chunks(source, 0, 999, 3)), ["año nuevo"]);
    // Start inside the two-byte `ñ` snaps forward.
    assert_eq!(texts(&filler_chunks(source, 2, source.len(), 3)), ["o nuevo"]);
}

#[test]
fn fragments_deserialize_from_model_json() {
    let json = r#"[
        {"text": "The quick", "complexity": 0.1},
        {"text": "brown", "complexity": "0.35"},
        {"text": "fox", "complexity": null},
        {"text": "jumps."},
        {"text": "over", "complexity": true},
        {"text": "it", "complexity": {"score": 1}},
        {"complexity": 3}
    ]"#;
    let fragments: Vec<Fragment> = serde_json::from_str(json).unwrap();

    assert_eq!(fragments[0].complexity, RawComplexity::Number(0.1));
    assert_eq!(fragments[1].complexity, RawComplexity::Text("0.35".into()));
    assert_eq!(fragments[2].complexity, RawComplexity::Missing);
    assert_eq!(fragments[3].complexity, RawComplexity::Missing);
    assert_eq!(fragments[4].complexity, RawComplexity::Missing);
    assert_eq!(fragments[5].complexity, RawComplexity::Missing);
    assert_eq!(fragments[6].text, "");
    assert_eq!(fragments[6].complexity, RawComplexity::Number(3.0));

    let chunks = merge_final(FOX, &fragments);
    assert_eq!(texts(&chunks), ["The quick", "brown", "fox", "jumps."]);
    assert_eq!(chunks[1].complexity, 0.35);
}

#[test]
fn sections_cover_the_document_in_order() {
    let document = "First sentence here. Second one follows.\n\nNew paragraph starts. \
                    It keeps going for a while. And then ends!";
    let sections = split_sections(document, 48);

    assert!(sections.len() > 1);
    let mut cursor = 0usize;
    for (index, section) in sections.iter().enumerate() {
        assert_eq!(section.index, index);
        assert!(section.text.len() <= 48, "{:?}", section.text);
        assert_eq!(&document[section.start..section.end], section.text);
        assert!(document[cursor..section.start].trim().is_empty());
        cursor = section.end;
    }
    assert!(document[cursor..].trim().is_empty());

    let rebuilt: Vec<&str> = sections.iter().map(|s| s.text.as_str()).collect();
    assert_eq!(collapse_whitespace(&rebuilt.join(" ")), collapse_whitespace(document));
}

#[test]
fn sections_prefer_paragraph_then_sentence_breaks() {
    let document = "One. Two three.\n\nFour five six seven.";
    let sections = split_sections(document, 30);
    assert_eq!(sections[0].text, "One. Two three.");
    assert_eq!(sections[1].text, "Four five six seven.");

    let document = "Alpha beta. Gamma delta epsilon zeta";
    let sections = split_sections(document, 24);
    assert_eq!(sections[0].text, "Alpha beta.");
    assert_eq!(sections[1].text, "Gamma delta epsilon zeta");
}

#[test]
fn oversized_word_becomes_its_own_section() {
    let document = "tiny supercalifragilisticexpialidocious end";
    let sections = split_sections(document, 8);
    let texts: Vec<&str> = sections.iter().map(|s| s.text.as_str()).collect();
    assert_eq!(texts, ["tiny", "supercalifragilisticexpialidocious", "end"]);
    assert_eq!(sections[1].label().as_str(), texts[1]);
}

#[test]
fn blank_document_has_no_sections() {
    assert!(split_sections("", 100).is_empty());
    assert!(split_sections(" \n\t ", 100).is_empty());
    assert_eq!(split_sections("short", 0)[0].text, "short");
}
