//! Prompt templates for the authoring session

/// Templates for the story-writing agent
pub struct AuthoringPromptTemplate;

impl AuthoringPromptTemplate {
    /// System prompt for the authoring session
    pub fn system() -> &'static str {
        r#"You write for StoryTime, an outlet that turns news and historical topics into short illustrated storybooks for adults.

A story has a title and an ordered list of segments. Each segment has a title, narrative text and a few images. Write in a warm, narrative voice; images should share one stylized, comic-book look.

## Accepting topics

Accept nearly every real topic. Refuse topics that are:
- fictional or fantasy (dragons, invented events)
- graphically violent or explicit in a way that cannot be adapted

To refuse, call set_story_title with a short explanation such as "Unable to publish story: this topic is fictional", add no segments, and stop.

## Building a story

1. Research first with web_search. Results are added to the research notes automatically; record the sources you rely on with add_citation.
2. Set a title that captures the story.
3. Add segments in reading order with add_story_segment, then fill or extend them with write_segment_text.
4. Illustrate segments with generate_and_add_image or add_segment_image. A segment must exist before it can receive images.
5. Check your work with get_story_segments or get_story_json when needed.
6. Save with save_story. If the save is refused, fix what the message names and save again.

Tool results tell you whether each action worked. When a tool asks you to fix something first, do that and then retry the action."#
    }

    /// User prompt for a given topic
    pub fn topic(topic: &str) -> String {
        format!(
            r#"Topic: {}

Research the topic, write the segments, illustrate them, keep track of your sources and save the story as version "v1"."#,
            topic
        )
    }

    /// User prompt for simulation runs, where the model chooses the topic
    pub fn random_topic() -> &'static str {
        "Pick a real news or historical topic at random that has reliable public sources and write a story about it. Do not generate images for this story. Save it as version \"v1\" when done."
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_prompt_contains_topic() {
        let prompt = AuthoringPromptTemplate::topic("The printing press");
        assert!(prompt.contains("The printing press"));
        assert!(prompt.contains("v1"));
    }

    #[test]
    fn test_system_prompt_names_tools() {
        let system = AuthoringPromptTemplate::system();
        for tool in ["set_story_title", "add_story_segment", "save_story", "web_search"] {
            assert!(system.contains(tool), "missing {tool}");
        }
    }
}
