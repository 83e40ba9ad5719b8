// stream.rs — The coordinator's streaming event contract.
//
// Event order is guaranteed: zero or more ToolStatus events while agents
// run, then TextChunk events during synthesis in generation order, then
// exactly one terminal Message carrying the authoritative full content
// and the tool-call log.

use serde::Serialize;

use sp_agents::ToolCallRecord;

/// One event in a streamed coordinator turn.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEvent {
    /// An agent started or finished; surfaced so UIs can show progress.
    ToolStatus {
        agent: String,
        status: String,
    },
    /// A synthesis text fragment.
    TextChunk {
        text: String,
    },
    /// Terminal event: the full assistant message.
    Message {
        content: String,
        tool_calls: Vec<ToolCallRecord>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_tagged() {
        let event = ChatEvent::TextChunk {
            text: "hi".to_string(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "text_chunk");

        let event = ChatEvent::Message {
            content: "done".to_string(),
            tool_calls: Vec::new(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "message");
        assert_eq!(value["content"], "done");
    }
}
