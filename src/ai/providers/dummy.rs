use rand::seq::SliceRandom;
use std::time::Duration;

pub const DUMMY_RESPONSES: [&str; 5] = [
    "That's an interesting question! Let me think about it.",
    "Cool, tell me more!",
    "I'm processing that... Here's a thought: What do you think about this?",
    "Nice one! How can I assist you further?",
    "Hmm, that's a good point! What's next?",
];

/// Offline stand-in that answers with a canned reply after a short pause
pub struct DummyClient {
    delay: Duration,
}

impl DummyClient {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub async fn complete(&self, _prompt: &str) -> String {
        let reply = DUMMY_RESPONSES
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(DUMMY_RESPONSES[0]);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        reply.to_string()
    }
}
