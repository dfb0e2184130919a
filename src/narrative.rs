//! The seam to the external narrative-text collaborator.
//!
//! The numeric pipeline never depends on this service being reachable: every call goes through
//! a bounded timeout and any failure falls back to a deterministic string built from the risk
//! factor labels alone.
use anyhow::Result;
use chrono::NaiveDate;
use log::warn;
use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

/// Narrative returned when no risk factors are present
const NORMAL_OPERATIONS: &str = "Normal operations";

/// Narrative returned when risk is elevated but no labelled factor explains it
const ELEVATED_RISK: &str = "Elevated risk detected";

/// A surge multiplier above this produces a narrative even without labelled risk factors
const NARRATIVE_MULTIPLIER_FLOOR: f64 = 1.1;

/// The structured summary handed to the collaborator
#[derive(Debug, Clone, PartialEq)]
pub struct NarrativeRequest {
    /// The forecast date
    pub date: NaiveDate,
    /// Risk factor labels, in the order they were raised
    pub risk_factors: Vec<String>,
    /// The surge multiplier
    pub multiplier: f64,
}

/// A collaborator that turns a structured surge summary into a short advisory string.
///
/// Implementations may block on I/O; callers always wrap invocations in
/// [`generate_with_timeout`].
pub trait NarrativeGenerator: Send + Sync {
    /// Generate a short (roughly ten-word) narrative for the request
    fn generate(&self, request: &NarrativeRequest) -> Result<String>;
}

/// Invoke the generator on a worker thread, abandoning it after `timeout`.
///
/// Returns `None` on timeout, error or empty output. The worker is left to finish in the
/// background; generator calls are idempotent so an abandoned call has no side effects worth
/// waiting for.
pub fn generate_with_timeout(
    generator: Arc<dyn NarrativeGenerator>,
    request: NarrativeRequest,
    timeout: Duration,
) -> Option<String> {
    let (sender, receiver) = mpsc::channel();
    thread::spawn(move || {
        // The receiver may already be gone if the caller timed out
        let _ = sender.send(generator.generate(&request));
    });

    match receiver.recv_timeout(timeout) {
        Ok(Ok(text)) => {
            let text = text.trim();
            if text.is_empty() {
                warn!("Narrative generator returned empty output; using fallback");
                None
            } else {
                Some(text.to_string())
            }
        }
        Ok(Err(err)) => {
            warn!("Narrative generator failed: {err}");
            None
        }
        Err(_) => {
            warn!("Narrative generator timed out after {timeout:?}");
            None
        }
    }
}

/// The deterministic narrative built only from already-computed risk factor labels
pub fn fallback_narrative(risk_factors: &[String], multiplier: f64) -> String {
    if !risk_factors.is_empty() {
        risk_factors.join(", ")
    } else if multiplier > NARRATIVE_MULTIPLIER_FLOOR {
        ELEVATED_RISK.to_string()
    } else {
        NORMAL_OPERATIONS.to_string()
    }
}

/// Produce the narrative for a surge assessment.
///
/// # Arguments
///
/// * `generator` - The external collaborator, if configured
/// * `request` - The structured summary to narrate
/// * `timeout` - Upper bound on how long the collaborator may take
pub fn resolve(
    generator: Option<&Arc<dyn NarrativeGenerator>>,
    request: &NarrativeRequest,
    timeout: Duration,
) -> String {
    let needs_narrative =
        request.multiplier > NARRATIVE_MULTIPLIER_FLOOR || !request.risk_factors.is_empty();

    if needs_narrative {
        if let Some(generator) = generator {
            if let Some(text) = generate_with_timeout(Arc::clone(generator), request.clone(), timeout)
            {
                return text;
            }
        }
    }

    fallback_narrative(&request.risk_factors, request.multiplier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;

    fn request(risk_factors: &[&str], multiplier: f64) -> NarrativeRequest {
        NarrativeRequest {
            date: "2024-11-02".parse().unwrap(),
            risk_factors: risk_factors.iter().map(ToString::to_string).collect(),
            multiplier,
        }
    }

    struct FixedGenerator(&'static str);

    impl NarrativeGenerator for FixedGenerator {
        fn generate(&self, _request: &NarrativeRequest) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct FailingGenerator;

    impl NarrativeGenerator for FailingGenerator {
        fn generate(&self, _request: &NarrativeRequest) -> Result<String> {
            bail!("service unreachable")
        }
    }

    struct SlowGenerator;

    impl NarrativeGenerator for SlowGenerator {
        fn generate(&self, _request: &NarrativeRequest) -> Result<String> {
            thread::sleep(Duration::from_secs(5));
            Ok("too late".to_string())
        }
    }

    #[test]
    fn test_fallback_narrative() {
        assert_eq!(fallback_narrative(&[], 1.0), NORMAL_OPERATIONS);
        assert_eq!(fallback_narrative(&[], 1.25), ELEVATED_RISK);
        assert_eq!(
            fallback_narrative(
                &["Severe AQI (450)".to_string(), "Extreme Heat (38.0C)".to_string()],
                1.7
            ),
            "Severe AQI (450), Extreme Heat (38.0C)"
        );
    }

    #[test]
    fn test_resolve_uses_generator() {
        let generator: Arc<dyn NarrativeGenerator> =
            Arc::new(FixedGenerator("High respiratory load due to severe smog"));
        let text = resolve(
            Some(&generator),
            &request(&["Severe AQI (450)"], 1.5),
            Duration::from_secs(1),
        );
        assert_eq!(text, "High respiratory load due to severe smog");
    }

    #[test]
    fn test_resolve_falls_back_on_error() {
        let generator: Arc<dyn NarrativeGenerator> = Arc::new(FailingGenerator);
        let text = resolve(
            Some(&generator),
            &request(&["Severe AQI (450)"], 1.5),
            Duration::from_secs(1),
        );
        assert_eq!(text, "Severe AQI (450)");
    }

    #[test]
    fn test_resolve_falls_back_on_timeout() {
        let generator: Arc<dyn NarrativeGenerator> = Arc::new(SlowGenerator);
        let text = resolve(
            Some(&generator),
            &request(&["Heavy Rainfall (80.0mm)"], 1.3),
            Duration::from_millis(50),
        );
        assert_eq!(text, "Heavy Rainfall (80.0mm)");
    }

    #[test]
    fn test_resolve_normal_operations_skips_generator() {
        let generator: Arc<dyn NarrativeGenerator> = Arc::new(FixedGenerator("should not be used"));
        let text = resolve(Some(&generator), &request(&[], 1.0), Duration::from_secs(1));
        assert_eq!(text, NORMAL_OPERATIONS);
    }

    #[test]
    fn test_resolve_empty_output_falls_back() {
        let generator: Arc<dyn NarrativeGenerator> = Arc::new(FixedGenerator("   "));
        let text = resolve(
            Some(&generator),
            &request(&["Extreme Heat (38.0C)"], 1.2),
            Duration::from_secs(1),
        );
        assert_eq!(text, "Extreme Heat (38.0C)");
    }
}
