use serde::{Deserialize, Serialize};

/// OneBot v11 message segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum Segment {
    At { qq: String },
    Text { text: String },
    Image { file: String },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageChain(pub Vec<Segment>);

impl MessageChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(mut self, user_id: i64) -> Self {
        self.0.push(Segment::At {
            qq: user_id.to_string(),
        });
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.0.push(Segment::Text { text: text.into() });
        self
    }

    pub fn image(mut self, url: impl Into<String>) -> Self {
        self.0.push(Segment::Image { file: url.into() });
        self
    }

    pub fn has_image(&self) -> bool {
        self.0.iter().any(|s| matches!(s, Segment::Image { .. }))
    }

    /// Same chain with image segments dropped.
    pub fn without_images(&self) -> Self {
        MessageChain(
            self.0
                .iter()
                .filter(|s| !matches!(s, Segment::Image { .. }))
                .cloned()
                .collect(),
        )
    }
}
