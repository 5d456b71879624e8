impl PlaybackSession {
    /// Makes `section` the span being read and drops chunks of the previous
    /// one. A running session keeps running and shows the first chunk once
    /// fragments arrive.
    pub fn load_section(&mut self, section: Section) {
        debug!(
            "session: load section {} ({} bytes) \"{}\"",
            section.index,
            section.text.len(),
            section.label()
        );
        self.section = Some(section);
        self.fragments_complete = false;
        self.chunks.clear();
        self.active = None;
        self.pending_seek = None;
        self.reschedule = false;
        self.clear_backfill();
        self.played_from = 0;
        self.displayed.clear();
        self.on_screen = None;
        self.pending_redraw = true;
        self.state = match self.state {
            PlayState::Playing { .. } | PlayState::Finished => {
                PlayState::Playing { next_chunk_ms: 0 }
            }
            other => other,
        };
    }

    /// Re-runs reconciliation for the loaded section from the latest fragment
    /// list and returns the resulting chunk count.
    ///
    /// The active chunk is kept by source offset. Chunks inserted before it
    /// that were never displayed, such as filler for a gap held back while
    /// streaming, play on the next advances before reading continues past
    /// the active chunk.
    pub fn apply_fragments(&mut self, fragments: &[Fragment], complete: bool) -> usize {
        let Some(section) = self.section.as_ref() else {
            debug!("session: fragments ignored, no section loaded");
            return 0;
        };

        let chunks = merge(
            &section.text,
            fragments,
            MergeMode::from_complete(complete),
            &self.reconcile,
        );
        let anchor = self
            .pending_seek
            .or_else(|| self.current_chunk().map(|chunk| chunk.start));
        let previous_text = self.current_chunk().map(|chunk| chunk.text.clone());

        self.chunks = chunks;
        self.fragments_complete = complete;

        if let Some(offset) = self.pending_seek {
            if let Some(index) = chunk_index_at(&self.chunks, offset) {
                self.active = Some(index);
                self.pending_seek = None;
                self.reschedule = true;
            }
        } else if let Some(offset) = anchor {
            self.active = realign(&self.chunks, offset);
        }
        self.schedule_backfill();

        let current_text = self.current_chunk().map(|chunk| chunk.text.as_str());
        if previous_text.as_deref() != current_text {
            self.pending_redraw = true;
        }

        debug!(
            "session: section {} reconciled {} fragments into {} chunks (complete={})",
            section_index(&self.section),
            fragments.len(),
            self.chunks.len(),
            complete
        );
        self.chunks.len()
    }

    /// Moves to the chunk covering `offset` in the section text, or the first
    /// chunk after it. Applied once chunks exist if none do yet.
    pub fn seek_offset(&mut self, offset: usize) {
        self.played_from = offset;
        self.clear_backfill();
        match chunk_index_at(&self.chunks, offset) {
            Some(index) => {
                self.active = Some(index);
                self.pending_seek = None;
                self.reschedule = true;
            }
            None => self.pending_seek = Some(offset),
        }
        self.pending_redraw = true;
    }

    /// Seeks to a stored resume position when it belongs to the loaded
    /// section.
    pub fn restore(&mut self, resume: ResumeState) -> bool {
        match &self.section {
            Some(section) if section.index == resume.section_index => {
                self.seek_offset(resume.source_offset);
                true
            }
            _ => false,
        }
    }

    /// Steps one chunk while not playing. Returns whether the position moved.
    pub fn step(&mut self, forward: bool) -> bool {
        if self.is_playing() || self.chunks.is_empty() {
            return false;
        }

        let next = match (self.active, forward) {
            (None, true) => Some(0),
            (None, false) => None,
            (Some(index), true) if index + 1 < self.chunks.len() => Some(index + 1),
            (Some(index), false) if index > 0 => Some(index - 1),
            (Some(_), _) => None,
        };

        match next {
            Some(index) => {
                self.active = Some(index);
                self.clear_backfill();
                let span = self.chunks[index].span();
                self.record_displayed(span);
                self.pending_redraw = true;
                true
            }
            None => false,
        }
    }

    pub fn request_key(&self) -> Option<RequestKey> {
        self.section
            .as_ref()
            .map(|section| RequestKey::new(section, self.config.words_per_chunk))
    }

    /// Whether the host should ask the model to segment the loaded section.
    /// Repeated calls for an unchanged request answer `false`.
    pub fn should_request_segmentation(&mut self) -> bool {
        match self.request_key() {
            Some(key) => self.guard.should_submit(key),
            None => false,
        }
    }

    /// Allows the same request again after the model call for it failed.
    pub fn segmentation_failed(&mut self) {
        self.guard.reset();
    }
}

impl PlaybackSession {
    /// Points the next advance at the earliest chunk up to the active one
    /// that was skipped because it did not exist when playback passed it.
    fn schedule_backfill(&mut self) {
        self.next = None;
        if self.reschedule {
            return;
        }
        let Some(active) = self.active.filter(|&index| index < self.chunks.len()) else {
            return;
        };

        let played_from = self.played_from;
        let skipped = self.chunks[..=active]
            .iter()
            .position(|chunk| chunk.end > played_from && !self.was_displayed(&chunk.span()));
        if let Some(index) = skipped {
            debug!(
                "session: backfilling from chunk {} of section {}",
                index,
                section_index(&self.section)
            );
            let reached = self
                .on_screen
                .as_ref()
                .map_or(self.chunks[active].end, |span| span.end.max(self.chunks[active].end));
            self.next = Some(index);
            self.backfill_until = Some(self.backfill_until.map_or(reached, |limit| limit.max(reached)));
        }
    }

    fn clear_backfill(&mut self) {
        self.next = None;
        self.backfill_until = None;
    }
}

fn section_index(section: &Option<Section>) -> usize {
    section.as_ref().map_or(0, |section| section.index)
}

/// Chunk covering `offset`, else the first chunk starting after it.
fn chunk_index_at(chunks: &[Chunk], offset: usize) -> Option<usize> {
    chunks.iter().position(|chunk| offset < chunk.end)
}

/// Chunk covering `offset`, else the last chunk ending before it so the next
/// advance lands after `offset`.
fn realign(chunks: &[Chunk], offset: usize) -> Option<usize> {
    chunks
        .iter()
        .position(|chunk| chunk.start <= offset && offset < chunk.end)
        .or_else(|| chunks.iter().rposition(|chunk| chunk.end <= offset))
}
