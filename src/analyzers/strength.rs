use serde::Serialize;

/// How strongly distance and reflectance move together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CorrelationStrength {
    Strong,
    Moderate,
    Weak,
}

impl CorrelationStrength {
    pub fn label(&self) -> &'static str {
        match self {
            CorrelationStrength::Strong => "strong",
            CorrelationStrength::Moderate => "moderate",
            CorrelationStrength::Weak => "weak",
        }
    }
}

/// Converts a correlation coefficient into a strength band by magnitude.
///
/// | Range        | Strength |
/// |--------------|----------|
/// | \|r\| > 0.7  | strong   |
/// | \|r\| > 0.3  | moderate |
/// | otherwise    | weak     |
pub fn classify(r: f64) -> CorrelationStrength {
    match r.abs() {
        a if a > 0.7 => CorrelationStrength::Strong,
        a if a > 0.3 => CorrelationStrength::Moderate,
        _ => CorrelationStrength::Weak,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_bands() {
        assert_eq!(classify(0.75), CorrelationStrength::Strong);
        assert_eq!(classify(0.5), CorrelationStrength::Moderate);
        assert_eq!(classify(0.1), CorrelationStrength::Weak);
        assert_eq!(classify(-0.8), CorrelationStrength::Strong);
    }

    #[test]
    fn test_classify_boundaries_are_exclusive() {
        assert_eq!(classify(0.7), CorrelationStrength::Moderate);
        assert_eq!(classify(0.3), CorrelationStrength::Weak);
        assert_eq!(classify(-0.31), CorrelationStrength::Moderate);
        assert_eq!(classify(f64::NAN), CorrelationStrength::Weak);
    }

    #[test]
    fn test_labels() {
        assert_eq!(classify(1.0).label(), "strong");
        assert_eq!(classify(0.0).label(), "weak");
    }
}
