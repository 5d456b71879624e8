impl PlaybackSession {
    pub fn tick(&mut self, now_ms: u64) -> TickResult {
        let next_chunk_ms = match self.state {
            PlayState::Playing { next_chunk_ms } => next_chunk_ms,
            PlayState::Stopped | PlayState::Paused | PlayState::Finished => {
                return self.take_redraw();
            }
        };

        if self.reschedule && self.active.is_some() {
            self.reschedule = false;
            self.schedule_current(now_ms);
            self.pending_redraw = false;
            self.mark_displayed();
            return TickResult::RenderRequested;
        }

        if self.active.is_some() && now_ms < next_chunk_ms {
            return self.take_redraw();
        }

        match self.advance_chunk() {
            AdvanceResult::Advanced => {
                self.schedule_current(now_ms);
                self.pending_redraw = false;
                self.mark_displayed();
                TickResult::RenderRequested
            }
            AdvanceResult::AwaitingFragments => {
                self.state = PlayState::Playing {
                    next_chunk_ms: now_ms + FRAGMENT_POLL_MS,
                };
                if self.pending_redraw {
                    self.pending_redraw = false;
                    return TickResult::RenderRequested;
                }
                TickResult::AwaitingFragments
            }
            AdvanceResult::EndOfSection => {
                info!(
                    "session: section {} finished after {} chunks",
                    self.section.as_ref().map_or(0, |section| section.index),
                    self.chunks.len()
                );
                self.state = PlayState::Finished;
                self.pending_redraw = false;
                TickResult::SectionFinished
            }
        }
    }

    /// Starts or resumes playback. The active chunk, if any, gets a full
    /// duration from `now_ms` under the current settings.
    pub fn play(&mut self, now_ms: u64) {
        match self.state {
            PlayState::Playing { .. } | PlayState::Finished => {}
            PlayState::Stopped | PlayState::Paused => {
                if self.active.is_some() {
                    self.reschedule = false;
                    self.schedule_current(now_ms);
                    self.mark_displayed();
                } else {
                    self.state = PlayState::Playing {
                        next_chunk_ms: now_ms,
                    };
                }
                self.pending_redraw = true;
            }
        }
    }

    /// Pauses playback, cancelling the pending advance.
    pub fn pause(&mut self) {
        if let PlayState::Playing { .. } = self.state {
            self.state = PlayState::Paused;
            self.pending_redraw = true;
        }
    }

    pub fn toggle_pause(&mut self, now_ms: u64) {
        if self.is_playing() {
            self.pause();
        } else {
            self.play(now_ms);
        }
    }

    /// Milliseconds until the pending advance, `None` when nothing is
    /// scheduled.
    pub fn time_to_next_ms(&self, now_ms: u64) -> Option<u64> {
        match self.state {
            PlayState::Playing { next_chunk_ms } => Some(next_chunk_ms.saturating_sub(now_ms)),
            _ => None,
        }
    }

    fn take_redraw(&mut self) -> TickResult {
        if self.pending_redraw {
            self.pending_redraw = false;
            TickResult::RenderRequested
        } else {
            TickResult::NoRender
        }
    }

    fn schedule_current(&mut self, now_ms: u64) {
        let delay_ms = self
            .current_pacing()
            .map_or(FRAGMENT_POLL_MS, |pacing| u64::from(pacing.display_ms()));
        self.state = PlayState::Playing {
            next_chunk_ms: now_ms + delay_ms,
        };
    }

    /// Counts the active chunk as shown unless it is already on screen.
    fn mark_displayed(&mut self) {
        let Some(span) = self.current_chunk().map(Chunk::span) else {
            return;
        };
        if self.on_screen.as_ref() == Some(&span) {
            return;
        }

        self.chunks_shown = self.chunks_shown.saturating_add(1);
        self.record_displayed(span);
    }

    fn record_displayed(&mut self, span: Range<usize>) {
        if !self.was_displayed(&span) {
            self.displayed.push(span.clone());
        }
        self.on_screen = Some(span);
    }

    fn was_displayed(&self, span: &Range<usize>) -> bool {
        self.displayed
            .iter()
            .any(|shown| shown.start < span.end && span.start < shown.end)
    }

    fn advance_chunk(&mut self) -> AdvanceResult {
        if let Some(index) = self.next.take() {
            if index < self.chunks.len() {
                self.active = Some(index);
                return AdvanceResult::Advanced;
            }
        }

        let mut next = self.active.map_or(0, |index| index + 1);
        if let Some(limit) = self.backfill_until {
            while next < self.chunks.len()
                && self.chunks[next].end <= limit
                && self.was_displayed(&self.chunks[next].span())
            {
                next += 1;
            }
            if next < self.chunks.len() && self.chunks[next].end > limit {
                self.backfill_until = None;
            }
        }

        if next < self.chunks.len() {
            self.active = Some(next);
            AdvanceResult::Advanced
        } else if !self.fragments_complete {
            AdvanceResult::AwaitingFragments
        } else {
            AdvanceResult::EndOfSection
        }
    }
}
