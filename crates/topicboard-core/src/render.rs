//! Pure render planning: topic list in, display text and reaction set out.
//! No I/O happens here; the gateway applies the plan to live messages.

use std::collections::BTreeSet;

use crate::config;
use crate::models::Topic;

/// Content produced for one board message, plus the reactions it should
/// carry. The emoji sequence parallels the rendered lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedTopics {
    pub content: String,
    pub emojis: Vec<String>,
}

fn format_topic_entry(topic: &Topic) -> String {
    format!("- {} — **{}**", topic.emoji, topic.text)
}

/// Plan the content and reaction set for one board message.
///
/// With a target, only topics assigned to that slot are included; without
/// one, all topics are. Insertion order is display order.
pub fn render_slot(topics: &[Topic], target_message_id: Option<&str>) -> RenderedTopics {
    let mut lines = Vec::new();
    let mut emojis = Vec::new();

    for topic in topics {
        if let Some(target) = target_message_id {
            if topic.message_id != target {
                continue;
            }
        }
        emojis.push(topic.emoji.clone());
        lines.push(format_topic_entry(topic));
    }

    let content = if lines.is_empty() {
        config::TOPICS_EMPTY_MESSAGE.to_string()
    } else {
        lines.join("\n")
    };
    RenderedTopics { content, emojis }
}

/// Content for the dedicated contributors message: header plus a sorted
/// mention list of distinct authors.
pub fn render_contributors(topics: &[Topic]) -> String {
    let contributors: BTreeSet<&str> = topics
        .iter()
        .filter(|t| !t.author_id.is_empty())
        .map(|t| t.author_id.as_str())
        .collect();

    let body = if contributors.is_empty() {
        config::CONTRIBUTORS_EMPTY_STATE.to_string()
    } else {
        contributors
            .iter()
            .map(|id| format!("<@{id}>"))
            .collect::<Vec<_>>()
            .join(" ")
    };
    format!("{}\n{}", config::CONTRIBUTORS_HEADER, body)
}

/// One-line announcement for a freshly added topic.
pub fn notification_line(user_id: &str, emoji: &str, text: &str) -> String {
    format!("🔔 <@{user_id}> додав нову тему — {emoji} **{text}**!")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topic(id: &str, emoji: &str, text: &str, message_id: &str) -> Topic {
        Topic {
            id: id.to_string(),
            emoji: emoji.to_string(),
            text: text.to_string(),
            author_id: format!("author-{id}"),
            author_name: format!("Author {id}"),
            message_id: message_id.to_string(),
        }
    }

    #[test]
    fn test_render_empty_slot() {
        let rendered = render_slot(&[], Some("m1"));
        assert_eq!(rendered.content, config::TOPICS_EMPTY_MESSAGE);
        assert!(rendered.emojis.is_empty());
    }

    #[test]
    fn test_render_preserves_insertion_order() {
        let topics = vec![
            topic("a", "🔥", "first", "m1"),
            topic("b", "🎯", "second", "m1"),
            topic("c", "🌊", "third", "m1"),
        ];
        let rendered = render_slot(&topics, Some("m1"));
        let lines: Vec<&str> = rendered.content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "- 🔥 — **first**");
        assert_eq!(lines[2], "- 🌊 — **third**");
        assert_eq!(rendered.emojis, vec!["🔥", "🎯", "🌊"]);
    }

    #[test]
    fn test_render_filters_by_target_slot() {
        let topics = vec![
            topic("a", "🔥", "first", "m1"),
            topic("b", "🎯", "second", "m2"),
        ];
        let rendered = render_slot(&topics, Some("m2"));
        assert_eq!(rendered.emojis, vec!["🎯"]);
        assert_eq!(rendered.content, "- 🎯 — **second**");

        let all = render_slot(&topics, None);
        assert_eq!(all.emojis.len(), 2);
    }

    #[test]
    fn test_contributors_deduped_and_sorted() {
        let mut topics = vec![
            topic("a", "🔥", "first", "m1"),
            topic("b", "🎯", "second", "m1"),
        ];
        topics[1].author_id = "author-a".to_string();
        let content = render_contributors(&topics);
        assert_eq!(
            content,
            format!("{}\n<@author-a>", config::CONTRIBUTORS_HEADER)
        );
    }

    #[test]
    fn test_contributors_empty_state() {
        let content = render_contributors(&[]);
        assert!(content.ends_with(config::CONTRIBUTORS_EMPTY_STATE));
    }
}
