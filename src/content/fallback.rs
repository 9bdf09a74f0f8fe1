//! Static fallback content used when every source fails

use rand::seq::SliceRandom;

/// The `source_used` tag recorded when fallback content is posted
pub const FALLBACK_SOURCE: &str = "fallback";

/// Fallback message pool
const FALLBACK_MESSAGES: &[&str] = &[
    "The only way to do great work is to love what you do. 💪",
    "Success is not final, failure is not fatal: it is the courage to continue that counts. 🚀",
    "The future belongs to those who believe in the beauty of their dreams. 🌈",
    "Sometimes the best content is the simplest content. Have a great day! 🌟",
    "The journey of a thousand miles begins with one step. 🚶",
    "Happiness is not something ready-made. It comes from your own actions. 😊",
    "Don't wait for the perfect moment, take the moment and make it perfect. ⏰",
    "Every day is a new beginning. Take a deep breath and start again. 🌅",
    "Coffee: because adulting is hard. ☕",
    "Nature does not hurry, yet everything is accomplished. 🌿",
    "Creativity is intelligence having fun. 🎨",
    "Learning never exhausts the mind. 🧠",
];

/// Pick a fallback message at random
pub fn pick() -> &'static str {
    FALLBACK_MESSAGES
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(FALLBACK_MESSAGES[0])
}
