use director_contracts::{ChatTurn, Mode};

use crate::frame::Frame;

/// One inbound guidance request. Built per call and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct GuidanceRequest {
    pub image: Option<Frame>,
    pub context_label: String,
    pub mode: Mode,
    pub history: Vec<ChatTurn>,
}

impl GuidanceRequest {
    pub fn new(context_label: impl Into<String>, mode: Mode) -> Self {
        Self {
            image: None,
            context_label: context_label.into(),
            mode,
            history: Vec::new(),
        }
    }

    pub fn with_image(mut self, frame: Frame) -> Self {
        self.image = Some(frame);
        self
    }

    pub fn with_history(mut self, history: Vec<ChatTurn>) -> Self {
        self.history = history;
        self
    }
}
