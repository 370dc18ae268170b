//! The conversational handler capability.

use chrono::Local;

/// Opaque message handler: text in, text out.
///
/// Invoked serially from the listen loop's worker thread; implementations
/// must not assume any other threading context and should avoid unbounded
/// blocking, since a hanging handler stalls the whole loop unless a
/// handler timeout is configured.
pub trait Handler: Send + Sync {
    fn process(&self, text: &str) -> String;
}

impl<F> Handler for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn process(&self, text: &str) -> String {
        self(text)
    }
}

/// Example handler: answers a handful of small-talk intents and echoes
/// everything else. Stands in for a real conversational backend.
#[derive(Debug, Default)]
pub struct SmallTalkHandler;

impl Handler for SmallTalkHandler {
    fn process(&self, text: &str) -> String {
        let lowered = text.to_lowercase();
        if lowered.contains("time") {
            return Local::now().format("It is %H:%M.").to_string();
        }
        if lowered.contains("date") || lowered.contains("day") {
            return Local::now().format("Today is %A, %B %d.").to_string();
        }
        if lowered.contains("hello") || lowered.contains("hi ") || lowered == "hi" {
            return "Hello! How can I help?".to_string();
        }
        if lowered.contains("your name") {
            return "I'm Parley.".to_string();
        }
        format!("You said: {}", text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_are_handlers() {
        let echo = |text: &str| format!("ECHO:{}", text);
        assert_eq!(echo.process("hi"), "ECHO:hi");
    }

    #[test]
    fn small_talk_time() {
        let response = SmallTalkHandler.process("what time is it");
        assert!(response.starts_with("It is "));
    }

    #[test]
    fn small_talk_name() {
        assert_eq!(SmallTalkHandler.process("what is your name"), "I'm Parley.");
    }

    #[test]
    fn small_talk_falls_back_to_echo() {
        assert_eq!(
            SmallTalkHandler.process("tell me a story"),
            "You said: tell me a story"
        );
    }
}
