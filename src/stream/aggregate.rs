use crate::types::{ChatCompletionChunk, StreamFrame, TokenUsage};

/// What a single frame did to the aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// A non-empty delta was appended.
    Appended,
    /// Chunk carried no delta text (role-only, finish-only or usage-only).
    NoContent,
    /// The terminal sentinel was seen.
    Terminated,
    /// Frame arrived after the sentinel and was dropped.
    IgnoredAfterTerminal,
}

/// Folds incremental chat chunks into accumulated text and the latest usage block.
///
/// Usage is last-write-wins in frame order. Nothing after the terminal sentinel is processed.
#[derive(Debug, Clone, Default)]
pub struct ChunkAggregator {
    text: String,
    usage: Option<TokenUsage>,
    chunk_count: usize,
    delta_count: usize,
    terminated: bool,
}

impl ChunkAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Aggregate an already fully received frame sequence.
    pub fn from_frames<'a>(frames: impl IntoIterator<Item = &'a StreamFrame>) -> Self {
        let mut agg = Self::new();
        for frame in frames {
            if agg.push(frame) == FrameOutcome::Terminated {
                break;
            }
        }
        agg
    }

    pub fn push(&mut self, frame: &StreamFrame) -> FrameOutcome {
        match frame {
            StreamFrame::Chunk(chunk) => self.push_chunk(chunk),
            StreamFrame::Done => {
                if self.terminated {
                    return FrameOutcome::IgnoredAfterTerminal;
                }
                self.terminated = true;
                FrameOutcome::Terminated
            }
        }
    }

    pub fn push_chunk(&mut self, chunk: &ChatCompletionChunk) -> FrameOutcome {
        if self.terminated {
            return FrameOutcome::IgnoredAfterTerminal;
        }
        self.chunk_count += 1;
        if let Some(usage) = chunk.usage {
            self.usage = Some(usage);
        }
        match chunk.delta_text() {
            Some(delta) => {
                self.text.push_str(delta);
                self.delta_count += 1;
                FrameOutcome::Appended
            }
            None => FrameOutcome::NoContent,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }

    pub fn usage(&self) -> Option<TokenUsage> {
        self.usage
    }

    pub fn chunk_count(&self) -> usize {
        self.chunk_count
    }

    /// Number of chunks that carried a non-empty delta.
    pub fn delta_count(&self) -> usize {
        self.delta_count
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frames(deltas: &[&str]) -> Vec<StreamFrame> {
        deltas
            .iter()
            .map(|d| StreamFrame::Chunk(ChatCompletionChunk::delta(*d)))
            .collect()
    }

    #[test]
    fn test_concatenation_matches_deltas_in_order() {
        let deltas = ["", "Hel", "", "lo", " world!", ""];
        let agg = ChunkAggregator::from_frames(&frames(&deltas));
        assert_eq!(agg.text(), deltas.concat());
        assert_eq!(agg.delta_count(), 3);
        assert_eq!(agg.chunk_count(), 6);
    }

    #[test]
    fn test_usage_is_last_write_wins() {
        let mut input = frames(&["a"]);
        input.push(StreamFrame::Chunk(
            ChatCompletionChunk::delta("b").with_usage(TokenUsage::new(1, 1, 2)),
        ));
        input.push(StreamFrame::Chunk(ChatCompletionChunk::usage_only(
            TokenUsage::new(5, 3, 8),
        )));
        let agg = ChunkAggregator::from_frames(&input);
        assert_eq!(agg.usage(), Some(TokenUsage::new(5, 3, 8)));
        assert_eq!(agg.text(), "ab");
    }

    #[test]
    fn test_frames_after_sentinel_are_ignored() {
        let mut input = frames(&["kept"]);
        input.push(StreamFrame::Done);
        input.push(StreamFrame::Chunk(
            ChatCompletionChunk::delta("dropped").with_usage(TokenUsage::new(9, 9, 18)),
        ));

        let agg = ChunkAggregator::from_frames(&input);
        assert_eq!(agg.text(), "kept");
        assert!(agg.usage().is_none());
        assert!(agg.is_terminated());

        let mut live = ChunkAggregator::new();
        for frame in &input[..2] {
            live.push(frame);
        }
        assert_eq!(live.push(&input[2]), FrameOutcome::IgnoredAfterTerminal);
        assert_eq!(live.push(&StreamFrame::Done), FrameOutcome::IgnoredAfterTerminal);
        assert_eq!(live.text(), "kept");
    }

    #[test]
    fn test_only_first_choice_contributes() {
        let mut chunk = ChatCompletionChunk::delta("first");
        let mut second = chunk.choices[0].clone();
        second.index = 1;
        second.delta.content = Some("second".into());
        chunk.choices.push(second);

        let mut agg = ChunkAggregator::new();
        assert_eq!(agg.push_chunk(&chunk), FrameOutcome::Appended);
        assert_eq!(agg.text(), "first");
    }

    #[test]
    fn test_no_deltas_leaves_empty_text() {
        let agg = ChunkAggregator::from_frames(&frames(&["", ""]));
        assert!(agg.is_empty());
        assert!(!agg.is_terminated());
    }
}
