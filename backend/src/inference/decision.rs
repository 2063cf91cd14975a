use std::fmt;

/// Probabilities at or above this value are reported as a detected tumor.
pub const DECISION_THRESHOLD: f32 = 0.5;

const DETECTED_RECOMMENDATION: &str = "Consult a neurologist or oncologist immediately.\n\
Carry this MRI scan report for detailed evaluation.\n\
Further advanced imaging (e.g., contrast MRI or biopsy) may be required.";

const NOT_DETECTED_RECOMMENDATION: &str = "No signs of tumor detected.\n\
Maintain a healthy lifestyle and attend periodic check-ups.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    TumorDetected,
    TumorNotDetected,
}

impl Verdict {
    pub fn label(&self) -> &'static str {
        match self {
            Verdict::TumorDetected => "Tumor Detected",
            Verdict::TumorNotDetected => "Tumor Not Detected",
        }
    }

    pub fn recommendation(&self) -> &'static str {
        match self {
            Verdict::TumorDetected => DETECTED_RECOMMENDATION,
            Verdict::TumorNotDetected => NOT_DETECTED_RECOMMENDATION,
        }
    }

    pub fn is_detected(&self) -> bool {
        matches!(self, Verdict::TumorDetected)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub fn decide(probability: f32) -> Verdict {
    if probability >= DECISION_THRESHOLD {
        Verdict::TumorDetected
    } else {
        Verdict::TumorNotDetected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn below_threshold_is_not_detected() {
        for p in [0.0, 0.1, 0.25, 0.4999, 0.5 - f32::EPSILON] {
            assert_eq!(decide(p), Verdict::TumorNotDetected, "p = {p}");
        }
    }

    #[test]
    fn threshold_and_above_is_detected() {
        for p in [0.5, 0.5001, 0.82, 0.99, 1.0] {
            assert_eq!(decide(p), Verdict::TumorDetected, "p = {p}");
        }
    }

    #[test]
    fn every_verdict_carries_guidance() {
        for verdict in [Verdict::TumorDetected, Verdict::TumorNotDetected] {
            assert!(!verdict.recommendation().is_empty());
        }
        assert!(
            Verdict::TumorDetected
                .recommendation()
                .starts_with("Consult a neurologist")
        );
        assert!(
            Verdict::TumorNotDetected
                .recommendation()
                .starts_with("No signs of tumor detected.")
        );
        assert_eq!(Verdict::TumorNotDetected.to_string(), "Tumor Not Detected");
    }
}
