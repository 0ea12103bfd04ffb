//! Scan context - the keyword search buffer for one scan.

use std::collections::HashMap;

use lore_model::ChatMessage;

/// Lowercased search buffers built from the history tail plus the current
/// user message, cached per scan depth.
#[derive(Debug)]
pub struct ScanContext<'a> {
    history: &'a [ChatMessage],
    user_message: &'a str,
    global_depth: usize,
    buffers: HashMap<usize, String>,
}

impl<'a> ScanContext<'a> {
    pub fn new(history: &'a [ChatMessage], user_message: &'a str, global_depth: usize) -> Self {
        Self {
            history,
            user_message,
            global_depth,
            buffers: HashMap::new(),
        }
    }

    /// Buffer for an entry's depth override, or the global depth.
    pub fn buffer(&mut self, depth_override: Option<usize>) -> &str {
        let depth = depth_override.unwrap_or(self.global_depth);
        let history = self.history;
        let user_message = self.user_message;

        self.buffers.entry(depth).or_insert_with(|| {
            let start = history.len().saturating_sub(depth);
            let mut text = history[start..]
                .iter()
                .map(|m| m.text.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            text.push(' ');
            text.push_str(user_message);
            text.to_lowercase()
        })
    }
}
