use std::{collections::BTreeMap, fs, path::Path};

use anyhow::{Context, Result};
use flow_core::segment::{Fragment, Section};
use log::{debug, warn};
use serde::Deserialize;

/// Model output recorded on disk.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum FragmentsFile {
    /// One fragment list for the whole document.
    Shared(Vec<Fragment>),
    /// Fragment lists keyed by section index.
    PerSection(BTreeMap<usize, Vec<Fragment>>),
}

impl FragmentsFile {
    pub(super) fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read fragments file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("fragments file {} is not valid JSON", path.display()))
    }

    /// Fragment list for each section, in section order.
    ///
    /// Shared fragments go to the section where they are found, searching the
    /// document in order. Fragments not found anywhere are dropped here since
    /// reconciliation would drop them too.
    pub(super) fn assign(&self, document: &str, sections: &[Section]) -> Vec<Vec<Fragment>> {
        let mut per_section = vec![Vec::new(); sections.len()];

        match self {
            Self::PerSection(map) => {
                for (&index, fragments) in map {
                    match per_section.get_mut(index) {
                        Some(slot) => slot.extend(fragments.iter().cloned()),
                        None => warn!(
                            "fragments for section {index} ignored, document has {} sections",
                            sections.len()
                        ),
                    }
                }
            }
            Self::Shared(fragments) => {
                let mut cursor = 0usize;
                let mut dropped = 0usize;
                for fragment in fragments {
                    let needle = fragment.text.trim();
                    if needle.is_empty() {
                        dropped += 1;
                        continue;
                    }
                    let Some(found) = document[cursor..].find(needle).map(|at| cursor + at) else {
                        dropped += 1;
                        continue;
                    };
                    cursor = found + needle.len();

                    match sections
                        .iter()
                        .position(|section| found >= section.start && found < section.end)
                    {
                        Some(index) => per_section[index].push(fragment.clone()),
                        None => dropped += 1,
                    }
                }
                if dropped > 0 {
                    debug!("{dropped} shared fragments not located in any section");
                }
            }
        }

        per_section
    }
}

#[cfg(test)]
mod tests {
    use flow_core::segment::split_sections;

    use super::*;

    const DOCUMENT: &str = "First part of the text.\n\nSecond part follows here.";

    #[test]
    fn shared_fragments_follow_their_sections() {
        let sections = split_sections(DOCUMENT, 30);
        assert_eq!(sections.len(), 2);

        let file: FragmentsFile = serde_json::from_str(
            r#"[
                {"text": "First part", "complexity": 0.2},
                {"text": "invented words"},
                {"text": "Second part", "complexity": "0.4"},
                {"text": "here."}
            ]"#,
        )
        .unwrap();
        let per_section = file.assign(DOCUMENT, &sections);

        assert_eq!(per_section[0], [Fragment::new("First part", 0.2)]);
        assert_eq!(
            per_section[1],
            [Fragment::new("Second part", "0.4"), Fragment::unscored("here.")]
        );
    }

    #[test]
    fn keyed_fragments_ignore_unknown_sections() {
        let sections = split_sections(DOCUMENT, 30);
        let file: FragmentsFile = serde_json::from_str(
            r#"{"1": [{"text": "follows"}], "7": [{"text": "lost"}]}"#,
        )
        .unwrap();
        let per_section = file.assign(DOCUMENT, &sections);

        assert!(per_section[0].is_empty());
        assert_eq!(per_section[1], [Fragment::unscored("follows")]);
    }
}
