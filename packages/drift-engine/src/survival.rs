//! survival.rs — Cold-water survival assessment
//!
//! Piecewise factor model over victim age, water temperature, immersion
//! time, flotation, and clothing. It drives search urgency triage, not
//! medical prognosis.

use drift_types::{Clothing, HypothermiaStage, SurvivalEstimate, Urgency, VictimProfile};

/// Assumed age when the profile omits one.
const DEFAULT_AGE: u32 = 40;

fn base_rate(age: Option<u32>) -> f64 {
    match age.unwrap_or(DEFAULT_AGE) {
        a if a < 18 => 0.85,
        a if a < 30 => 0.90,
        a if a < 50 => 0.88,
        a if a < 65 => 0.80,
        _ => 0.70,
    }
}

fn temp_factor(water_temp_f: f64) -> f64 {
    match water_temp_f {
        t if t > 80.0 => 1.0,
        t if t > 70.0 => 0.95,
        t if t > 60.0 => 0.85,
        t if t > 50.0 => 0.65,
        t if t > 40.0 => 0.40,
        _ => 0.20,
    }
}

fn time_factor(elapsed_hours: f64) -> f64 {
    match elapsed_hours {
        h if h < 1.0 => 1.0,
        h if h < 3.0 => 0.95,
        h if h < 6.0 => 0.85,
        h if h < 12.0 => 0.70,
        h if h < 24.0 => 0.50,
        _ => 0.30,
    }
}

fn clothing_bonus(clothing: Option<Clothing>) -> f64 {
    match clothing {
        Some(Clothing::None) => -0.1,
        Some(Clothing::Light) => 0.0,
        Some(Clothing::Normal) => 0.05,
        Some(Clothing::Heavy) => 0.10,
        Some(Clothing::Wetsuit) => 0.20,
        Some(Clothing::Drysuit) => 0.30,
        None => 0.0,
    }
}

/// Nominal survivable immersion time by water temperature, hours.
pub fn base_time_hours(water_temp_f: f64) -> f64 {
    match water_temp_f {
        t if t > 80.0 => 48.0,
        t if t > 70.0 => 24.0,
        t if t > 60.0 => 12.0,
        t if t > 50.0 => 6.0,
        t if t > 40.0 => 3.0,
        _ => 1.5,
    }
}

fn urgency(probability: f64) -> Urgency {
    match probability {
        p if p < 0.30 => Urgency::Critical,
        p if p < 0.50 => Urgency::Urgent,
        p if p < 0.75 => Urgency::High,
        _ => Urgency::Moderate,
    }
}

/// Expected hypothermia progression after `elapsed_hours` of immersion.
/// Warm water (> 60 °F) buys an hour before swim failure; cold water half
/// that.
pub fn hypothermia_stage(water_temp_f: f64, elapsed_hours: f64) -> HypothermiaStage {
    if elapsed_hours < 0.05 {
        return HypothermiaStage::ColdShock;
    }
    let swim_failure_h = if water_temp_f > 60.0 { 1.0 } else { 0.5 };
    if elapsed_hours < swim_failure_h {
        return HypothermiaStage::SwimFailure;
    }
    if elapsed_hours < base_time_hours(water_temp_f) * 0.5 {
        return HypothermiaStage::MildHypothermia;
    }
    HypothermiaStage::SevereHypothermia
}

/// Full survival assessment for a victim after `elapsed_hours` in water at
/// `water_temp_f`.
pub fn estimate(
    profile: &VictimProfile,
    water_temp_f: f64,
    elapsed_hours: f64,
) -> SurvivalEstimate {
    let pfd_bonus = if profile.has_pfd { 0.2 } else { 0.0 };
    let probability = (base_rate(profile.age) * temp_factor(water_temp_f) * time_factor(elapsed_hours)
        + pfd_bonus
        + clothing_bonus(profile.clothing))
    .clamp(0.0, 1.0);

    SurvivalEstimate {
        probability,
        time_remaining_hours: base_time_hours(water_temp_f) * probability,
        urgency: urgency(probability),
        hypothermia_stage: hypothermia_stage(water_temp_f, elapsed_hours),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(age: u32, has_pfd: bool, clothing: Clothing) -> VictimProfile {
        VictimProfile {
            age: Some(age),
            gender: None,
            has_pfd,
            clothing: Some(clothing),
        }
    }

    #[test]
    fn reference_case_four_hours_in_55f() {
        // age 40, no PFD, light clothing, 55 °F, 4 h
        let est = estimate(&profile(40, false, Clothing::Light), 55.0, 4.0);
        let expected = 0.88 * 0.65 * 0.85;
        assert!((est.probability - expected).abs() < 1e-9);
        assert_eq!(est.urgency, Urgency::Urgent);
        assert!((est.time_remaining_hours - 6.0 * expected).abs() < 1e-9);
    }

    #[test]
    fn probability_stays_in_unit_interval() {
        // Best case clamps at 1
        let best = estimate(&profile(25, true, Clothing::Drysuit), 85.0, 0.5);
        assert!(best.probability <= 1.0);
        // Worst case clamps at 0 or above
        let worst = estimate(&profile(80, false, Clothing::None), 35.0, 30.0);
        assert!(worst.probability >= 0.0);
        assert_eq!(worst.urgency, Urgency::Critical);
    }

    #[test]
    fn missing_age_behaves_like_forty() {
        let anon = VictimProfile { age: None, gender: None, has_pfd: false, clothing: None };
        let known = VictimProfile {
            age: Some(40),
            gender: None,
            has_pfd: false,
            clothing: None,
        };
        let a = estimate(&anon, 55.0, 4.0);
        let b = estimate(&known, 55.0, 4.0);
        assert_eq!(a.probability, b.probability);
    }

    #[test]
    fn urgency_steps_down_with_probability() {
        for (p, expected) in [
            (0.1, Urgency::Critical),
            (0.4, Urgency::Urgent),
            (0.6, Urgency::High),
            (0.9, Urgency::Moderate),
        ] {
            assert_eq!(urgency(p), expected);
        }
    }

    #[test]
    fn hypothermia_progression() {
        assert_eq!(hypothermia_stage(55.0, 0.01), HypothermiaStage::ColdShock);
        assert_eq!(hypothermia_stage(55.0, 0.4), HypothermiaStage::SwimFailure);
        assert_eq!(hypothermia_stage(55.0, 2.0), HypothermiaStage::MildHypothermia);
        assert_eq!(hypothermia_stage(55.0, 5.0), HypothermiaStage::SevereHypothermia);
        // Warm water delays swim failure past the half-hour mark
        assert_eq!(hypothermia_stage(70.0, 0.75), HypothermiaStage::SwimFailure);
    }
}
