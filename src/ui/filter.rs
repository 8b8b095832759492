use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

/// Turns raw keystrokes into debounced, validated search terms.
///
/// Each raw value is trimmed, then dropped unless it is empty or at least
/// three characters long. Qualifying values propagate after the debounce
/// window of quiescence; a newer qualifying value arriving inside the window
/// resets the timer and discards the older one. Dropped values sit before
/// the debounce, so they neither propagate nor touch the timer. A propagated
/// term is never repeated twice in a row.
pub struct FilterPipeline {
    input: mpsc::UnboundedSender<String>,
    terms: watch::Receiver<String>,
    worker: JoinHandle<()>,
}

impl FilterPipeline {
    pub fn spawn(debounce: Duration) -> Self {
        let (input, raw_values) = mpsc::unbounded_channel();
        let (propagated, terms) = watch::channel(String::new());
        let worker = tokio::spawn(run(raw_values, propagated, debounce));
        Self {
            input,
            terms,
            worker,
        }
    }

    /// Feed one raw input value, exactly as typed. Never blocks.
    pub fn push(&self, raw: &str) {
        let _ = self.input.send(raw.to_string());
    }

    /// Sequence of propagated terms. Starts with the empty term before any
    /// input arrives.
    pub fn terms(&self) -> watch::Receiver<String> {
        self.terms.clone()
    }

    /// Stop the worker. Also happens on drop.
    pub fn abort(&self) {
        self.worker.abort();
    }
}

impl Drop for FilterPipeline {
    fn drop(&mut self) {
        self.worker.abort();
    }
}

async fn run(
    mut raw_values: mpsc::UnboundedReceiver<String>,
    propagated: watch::Sender<String>,
    debounce: Duration,
) {
    let mut pending: Option<String> = None;
    let mut deadline = Instant::now();
    let mut last: Option<String> = None;

    loop {
        tokio::select! {
            raw = raw_values.recv() => {
                match raw {
                    Some(raw) => {
                        let text = raw.trim();
                        let length = text.chars().count();
                        if length == 0 || length > 2 {
                            pending = Some(text.to_string());
                            deadline = Instant::now() + debounce;
                        }
                    }
                    None => {
                        // Input closed: flush anything still waiting.
                        if let Some(text) = pending.take() {
                            emit(&propagated, &mut last, text);
                        }
                        break;
                    }
                }
            }
            _ = tokio::time::sleep_until(deadline), if pending.is_some() => {
                if let Some(text) = pending.take() {
                    emit(&propagated, &mut last, text);
                }
            }
        }
    }
}

fn emit(propagated: &watch::Sender<String>, last: &mut Option<String>, text: String) {
    if last.as_deref() == Some(text.as_str()) {
        return;
    }
    debug!(term = %text, "filter term propagated");
    *last = Some(text.clone());
    let _ = propagated.send(text);
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    const DEBOUNCE: Duration = Duration::from_millis(500);

    async fn next_term(terms: &mut watch::Receiver<String>) -> Option<String> {
        let wait = tokio::time::timeout(Duration::from_secs(5), terms.changed()).await;
        match wait {
            Ok(Ok(())) => Some(terms.borrow_and_update().clone()),
            _ => None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_term_is_empty() {
        let pipeline = FilterPipeline::spawn(DEBOUNCE);
        assert_eq!(*pipeline.terms().borrow(), "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_valid_term_propagates_after_quiescence() {
        let pipeline = FilterPipeline::spawn(DEBOUNCE);
        let mut terms = pipeline.terms();

        pipeline.push("apple");
        assert_eq!(next_term(&mut terms).await.as_deref(), Some("apple"));
    }

    #[rstest]
    #[case::one_char("a")]
    #[case::two_chars("ab")]
    #[case::one_char_padded("  a  ")]
    #[case::two_chars_padded("ab   ")]
    #[tokio::test(start_paused = true)]
    async fn test_short_values_never_propagate(#[case] raw: &str) {
        let pipeline = FilterPipeline::spawn(DEBOUNCE);
        let mut terms = pipeline.terms();

        pipeline.push(raw);
        assert!(next_term(&mut terms).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_terms_are_trimmed() {
        let pipeline = FilterPipeline::spawn(DEBOUNCE);
        let mut terms = pipeline.terms();

        pipeline.push("  apple  ");
        assert_eq!(next_term(&mut terms).await.as_deref(), Some("apple"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_newer_value_resets_the_timer_and_wins() {
        let pipeline = FilterPipeline::spawn(DEBOUNCE);
        let mut terms = pipeline.terms();

        pipeline.push("apple");
        tokio::time::sleep(Duration::from_millis(300)).await;
        pipeline.push("apricot");

        assert_eq!(next_term(&mut terms).await.as_deref(), Some("apricot"));
        assert!(next_term(&mut terms).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_term_is_suppressed() {
        let pipeline = FilterPipeline::spawn(DEBOUNCE);
        let mut terms = pipeline.terms();

        pipeline.push("apple");
        assert_eq!(next_term(&mut terms).await.as_deref(), Some("apple"));

        pipeline.push("apple");
        assert!(next_term(&mut terms).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_clearing_the_input_propagates_the_empty_term() {
        let pipeline = FilterPipeline::spawn(DEBOUNCE);
        let mut terms = pipeline.terms();

        pipeline.push("apple");
        assert_eq!(next_term(&mut terms).await.as_deref(), Some("apple"));

        pipeline.push("");
        assert_eq!(next_term(&mut terms).await.as_deref(), Some(""));
    }

    #[tokio::test(start_paused = true)]
    async fn test_closing_the_input_flushes_the_pending_term() {
        let (input, raw_values) = mpsc::unbounded_channel();
        let (propagated, mut terms) = watch::channel(String::new());
        let worker = tokio::spawn(run(raw_values, propagated, DEBOUNCE));

        input.send("apple".to_string()).unwrap();
        drop(input);

        worker.await.unwrap();
        assert_eq!(*terms.borrow_and_update(), "apple");
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_values_do_not_reset_the_timer() {
        let pipeline = FilterPipeline::spawn(DEBOUNCE);
        let mut terms = pipeline.terms();

        pipeline.push("apple");
        tokio::time::sleep(Duration::from_millis(400)).await;
        // Arrives inside the window but is length-gated out before the
        // debounce, so "apple" still fires at the original deadline.
        pipeline.push("ap");

        let started = Instant::now();
        assert_eq!(next_term(&mut terms).await.as_deref(), Some("apple"));
        assert!(started.elapsed() <= Duration::from_millis(200));
    }
}
