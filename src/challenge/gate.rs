//! Challenge gate state machine
//!
//! `Clear → AwaitingClearance` when a verification indicator is present;
//! back to `Clear` after the operator signals and the settle delay elapses.

use crate::challenge::ClearanceSignal;
use crate::config::TimingConfig;
use crate::driver::PageDriver;
use std::fmt;
use std::time::Duration;

/// Structural markers of a verification challenge
pub const CHALLENGE_SELECTORS: &[&str] = &[".g-recaptcha", "iframe[src*='recaptcha']"];

/// Prompt text of a verification challenge, matched case-insensitively
pub const CHALLENGE_TEXT: &[&str] = &["captcha", "recaptcha", "verify you are human"];

/// Current state of the gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Clear,
    AwaitingClearance,
}

/// Result of passing through the gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    /// No challenge on the page
    Clear,
    /// A challenge was present and the operator cleared it
    Cleared,
    /// A challenge was present and the bounded wait ran out
    TimedOut,
}

impl GateOutcome {
    /// True when the crawl may proceed on this page
    pub fn is_passable(&self) -> bool {
        !matches!(self, Self::TimedOut)
    }
}

impl fmt::Display for GateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clear => write!(f, "clear"),
            Self::AwaitingClearance => write!(f, "awaiting_clearance"),
        }
    }
}

/// Blocks the crawl while a human-verification challenge is on screen
pub struct ChallengeGate {
    state: GateState,
    signal: Box<dyn ClearanceSignal>,
    settle: Duration,
    timeout: Option<Duration>,
    challenges_seen: usize,
}

impl ChallengeGate {
    pub fn new(signal: Box<dyn ClearanceSignal>, timing: &TimingConfig) -> Self {
        Self {
            state: GateState::Clear,
            signal,
            settle: timing.challenge_settle(),
            timeout: timing.challenge_timeout(),
            challenges_seen: 0,
        }
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    /// Number of challenges detected so far
    pub fn challenges_seen(&self) -> usize {
        self.challenges_seen
    }

    /// Probes the current page for any known verification indicator
    ///
    /// Probe failures count as "not present"; a page the driver cannot read
    /// is a navigation problem, not a challenge.
    pub async fn detect<D: PageDriver + ?Sized>(driver: &D) -> bool {
        for selector in CHALLENGE_SELECTORS {
            match driver.query_one(selector).await {
                Ok(Some(_)) => return true,
                Ok(None) => {}
                Err(e) => tracing::debug!(selector, error = %e, "Challenge probe failed"),
            }
        }

        let text = match driver.visible_text().await {
            Ok(text) => text.to_lowercase(),
            Err(e) => {
                tracing::debug!(error = %e, "Challenge text probe failed");
                return false;
            }
        };
        CHALLENGE_TEXT.iter().any(|needle| text.contains(needle))
    }

    /// Passes through the gate, waiting for the operator when challenged
    pub async fn check<D: PageDriver + ?Sized>(&mut self, driver: &D) -> GateOutcome {
        if !Self::detect(driver).await {
            self.state = GateState::Clear;
            return GateOutcome::Clear;
        }

        let url = driver.current_url();
        self.state = GateState::AwaitingClearance;
        self.challenges_seen += 1;
        tracing::warn!(url = %url, "Human verification detected; waiting for operator");

        let waited = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.signal.wait_for_clearance(&url))
                .await
                .is_ok(),
            None => {
                self.signal.wait_for_clearance(&url).await;
                true
            }
        };

        if !waited {
            tracing::error!(url = %url, timeout = ?self.timeout, "Human verification not cleared in time");
            return GateOutcome::TimedOut;
        }

        tracing::info!(url = %url, "Human verification cleared; continuing");
        tokio::time::sleep(self.settle).await;
        self.state = GateState::Clear;
        GateOutcome::Cleared
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::challenge::ChannelSignal;
    use crate::driver::scripted::ScriptedDriver;

    const PLAIN: &str = "<html><body><h1>Business Search</h1></body></html>";
    const RECAPTCHA: &str =
        "<html><body><div class='g-recaptcha' data-sitekey='x'></div></body></html>";
    const FRAME: &str =
        "<html><body><iframe src='https://www.google.com/recaptcha/api2/anchor'></iframe></body></html>";
    const PROMPT: &str = "<html><body><p>Please Verify You Are Human</p></body></html>";
    const SCRIPT_ONLY: &str = "<html><body><h1>Business Entity Search</h1>\
        <script>var recaptchaSiteKey = 'x'; function onCaptchaLoad() {}</script>\
        <style>.captcha-badge { display: none; }</style>\
        <noscript>Enable JavaScript to pass the captcha</noscript></body></html>";

    async fn driver_on(html: &str) -> ScriptedDriver {
        let mut driver = ScriptedDriver::new().page("https://registry.example/", html);
        driver.navigate("https://registry.example/").await.unwrap();
        driver
    }

    fn timing(timeout_secs: u64) -> TimingConfig {
        TimingConfig {
            challenge_timeout_secs: timeout_secs,
            ..TimingConfig::immediate()
        }
    }

    #[tokio::test]
    async fn test_detects_each_indicator_kind() {
        assert!(!ChallengeGate::detect(&driver_on(PLAIN).await).await);
        assert!(ChallengeGate::detect(&driver_on(RECAPTCHA).await).await);
        assert!(ChallengeGate::detect(&driver_on(FRAME).await).await);
        assert!(ChallengeGate::detect(&driver_on(PROMPT).await).await);
    }

    #[tokio::test]
    async fn test_script_and_style_mentions_are_not_challenges() {
        assert!(!ChallengeGate::detect(&driver_on(SCRIPT_ONLY).await).await);

        let (_sender, signal) = ChannelSignal::new();
        let mut gate = ChallengeGate::new(Box::new(signal), &timing(1));
        let outcome = gate.check(&driver_on(SCRIPT_ONLY).await).await;
        assert_eq!(outcome, GateOutcome::Clear);
        assert_eq!(gate.challenges_seen(), 0);
    }

    #[tokio::test]
    async fn test_clear_page_passes_without_waiting() {
        let (_sender, signal) = ChannelSignal::new();
        let mut gate = ChallengeGate::new(Box::new(signal), &timing(0));

        let outcome = gate.check(&driver_on(PLAIN).await).await;
        assert_eq!(outcome, GateOutcome::Clear);
        assert_eq!(gate.state(), GateState::Clear);
        assert_eq!(gate.challenges_seen(), 0);
    }

    #[tokio::test]
    async fn test_operator_signal_clears_gate() {
        let (sender, signal) = ChannelSignal::new();
        let mut gate = ChallengeGate::new(Box::new(signal), &timing(0));
        sender.send(()).await.unwrap();

        let outcome = gate.check(&driver_on(RECAPTCHA).await).await;
        assert_eq!(outcome, GateOutcome::Cleared);
        assert_eq!(gate.state(), GateState::Clear);
        assert_eq!(gate.challenges_seen(), 1);
    }

    #[tokio::test]
    async fn test_bounded_wait_reports_timeout() {
        let (_sender, signal) = ChannelSignal::new();
        let mut gate = ChallengeGate::new(Box::new(signal), &timing(1));

        let outcome = gate.check(&driver_on(PROMPT).await).await;
        assert_eq!(outcome, GateOutcome::TimedOut);
        assert!(!outcome.is_passable());
        assert_eq!(gate.state(), GateState::AwaitingClearance);
    }
}
